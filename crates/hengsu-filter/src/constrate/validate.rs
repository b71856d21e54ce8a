//! 创建过滤器时的码流检查.
//!
//! 跳帧不携带 POC 相关字段, 也不参与参考帧管理,
//! 因此只接受逐行、隐式 POC (poc_type=2)、最多一个参考帧的码流.

use hengsu_codec::CodecParameters;
use hengsu_codec::CodecId;
use hengsu_codec::parsers::h264::{NalFraming, ParameterSets};
use hengsu_core::rational::rescale_q;
use hengsu_core::{HengsuError, HengsuResult, Rational};

use super::skip_frame::SkipFrameBuilder;
use super::skip_slice_table::SkipSliceTable;

/// 检查通过的码流配置
#[derive(Debug)]
pub(crate) struct ValidatedStream {
    pub params: ParameterSets,
    pub builder: SkipFrameBuilder,
    /// 一帧的理想时长, 单位为输入时间基
    pub duration: i64,
}

/// 按顺序检查编解码器参数、参数集与帧率
pub(crate) fn validate(
    codec: &CodecParameters,
    time_base: Rational,
    frame_rate: Rational,
    templates: &SkipSliceTable,
) -> HengsuResult<ValidatedStream> {
    let video = match (codec.codec_id, codec.video_params()) {
        (CodecId::H264, Some(video)) => video,
        _ => {
            return Err(HengsuError::Unsupported(format!(
                "h264_constrate: 仅支持 H.264 视频流, 实际为 {}",
                codec.codec_id
            )));
        }
    };

    if codec.extra_data.is_empty() {
        return Err(HengsuError::Unsupported(
            "h264_constrate: 缺少 extradata (SPS/PPS)".into(),
        ));
    }
    let params = ParameterSets::from_extradata(&codec.extra_data)?;

    if let NalFraming::LengthPrefixed(n @ (1 | 3)) = params.framing() {
        return Err(HengsuError::Unsupported(format!(
            "h264_constrate: 不支持 {} 字节的 NAL 长度前缀",
            n
        )));
    }

    let (pps, sps) = params.active(0)?;
    if !sps.frame_mbs_only {
        return Err(HengsuError::Unsupported(
            "h264_constrate: 不支持隔行 (frame_mbs_only_flag=0)".into(),
        ));
    }
    if sps.poc_type != 2 {
        return Err(HengsuError::Unsupported(format!(
            "h264_constrate: 仅支持 poc_type=2, 实际为 {}",
            sps.poc_type
        )));
    }
    if pps.slice_group_count > 1 && (3..=5).contains(&pps.slice_group_map_type) {
        return Err(HengsuError::Unsupported(format!(
            "h264_constrate: 不支持 slice group map type {}",
            pps.slice_group_map_type
        )));
    }
    if sps.max_num_ref_frames > 1 {
        return Err(HengsuError::Unsupported(format!(
            "h264_constrate: 仅支持单参考帧, 实际为 {}",
            sps.max_num_ref_frames
        )));
    }

    let slice_data = if pps.cabac {
        templates
            .get(video.width, video.height)
            .cloned()
            .ok_or_else(|| {
                HengsuError::Unsupported(format!(
                    "h264_constrate: CABAC 码流缺少 {}x{} 的跳帧模板",
                    video.width, video.height
                ))
            })?
    } else {
        bytes::Bytes::new()
    };

    if !frame_rate.is_non_zero() {
        return Err(HengsuError::InvalidArgument(format!(
            "h264_constrate: 无效帧率 {}",
            frame_rate
        )));
    }
    let duration = rescale_q(1, frame_rate.invert(), time_base)
        .filter(|&d| d > 0)
        .ok_or_else(|| {
            HengsuError::InvalidArgument(format!(
                "h264_constrate: 帧率 {} 在时间基 {} 下的帧时长为 0",
                frame_rate, time_base
            ))
        })?;

    let builder = SkipFrameBuilder::new(sps.clone(), pps.clone(), params.framing(), slice_data);
    Ok(ValidatedStream {
        params,
        builder,
        duration,
    })
}
