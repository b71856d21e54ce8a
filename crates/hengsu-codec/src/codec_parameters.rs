//! 流级别的编码参数 (对标 `AVCodecParameters`).
//!
//! 由上游解封装得到, 过滤器创建时据此确认编码类型并读取 SPS/PPS.

use hengsu_core::Rational;

use crate::codec_id::CodecId;

#[derive(Debug, Clone)]
pub struct CodecParameters {
    pub codec_id: CodecId,
    /// H.264 时为 avcC 记录或 Annex-B 形式的 SPS/PPS
    pub extra_data: Vec<u8>,
    /// bits/s, 0 表示未知
    pub bit_rate: u64,
    /// 非视频流为 `None`
    pub video: Option<VideoCodecParams>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoCodecParams {
    pub width: u32,
    pub height: u32,
    /// 容器声明的帧率, 可能未设置
    pub frame_rate: Rational,
}

impl CodecParameters {
    /// 只有编码类型, 没有视频参数
    pub fn new(codec_id: CodecId) -> Self {
        Self {
            codec_id,
            extra_data: Vec::new(),
            bit_rate: 0,
            video: None,
        }
    }

    pub fn video(codec_id: CodecId, width: u32, height: u32, extra_data: Vec<u8>) -> Self {
        Self {
            extra_data,
            video: Some(VideoCodecParams {
                width,
                height,
                frame_rate: Rational::UNDEFINED,
            }),
            ..Self::new(codec_id)
        }
    }

    pub fn video_params(&self) -> Option<&VideoCodecParams> {
        self.video.as_ref()
    }
}
