//! H.264 slice header 中 frame_num 字段的读取与原地改写.
//!
//! 只解析 frame_num 之前的三个字段:
//! ```text
//! first_mb_in_slice  ue(v)
//! slice_type         ue(v)
//! pic_parameter_set_id ue(v)
//! frame_num          u(log2_max_frame_num)
//! ```
//! 位偏移基于 NAL 载荷的原始字节 (未去除 emulation prevention),
//! 因此前缀中出现 `00 00 03` 时拒绝处理.

use hengsu_core::bitreader::BitReader;
use hengsu_core::bitwriter::replace_bits;
use hengsu_core::{HengsuError, HengsuResult};

use super::nal::{NalSpan, has_emulation_prevention, scan_nal_units};
use super::param_sets::ParameterSets;

/// slice header 中的 frame_num 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameNumField {
    /// 字段值
    pub value: u32,
    /// 字段在 NAL 载荷中的起始位偏移
    pub bit_offset: usize,
    /// 字段位宽 (log2_max_frame_num)
    pub bit_width: u32,
}

impl FrameNumField {
    /// 加上 `adjustment` 后按 2^bit_width 取模的新值
    pub fn adjusted(&self, adjustment: u32) -> u32 {
        let modulus = 1u64 << self.bit_width;
        ((u64::from(self.value) + u64::from(adjustment)) % modulus) as u32
    }
}

/// frame_num 改写结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// 已改写, 携带最后一个 slice 的新 frame_num
    Patched(u32),
    /// 数据包是 GOP 边界 (含 IDR 或不含任何 slice), 未做修改
    EndOfGop,
}

/// 定位并读取一个 slice NAL 载荷 (NAL 头字节之后) 中的 frame_num
pub fn parse_frame_num_field(payload: &[u8], params: &ParameterSets) -> HengsuResult<FrameNumField> {
    let mut br = BitReader::new(payload);
    br.read_ue()?; // first_mb_in_slice
    br.read_ue()?; // slice_type
    let pps_id = br.read_ue()?;
    if pps_id > 255 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: slice header pps_id 超出范围, pps_id={}",
            pps_id
        )));
    }
    let (_, sps) = params.active(pps_id)?;

    let bit_offset = br.bits_read();
    let bit_width = sps.log2_max_frame_num;
    let value = br.read_bits(bit_width)?;

    let covered = (bit_offset + bit_width as usize).div_ceil(8);
    if has_emulation_prevention(&payload[..covered]) {
        return Err(HengsuError::InvalidData(
            "H.264: slice header 前缀含 emulation prevention 字节, 无法定位 frame_num".into(),
        ));
    }

    Ok(FrameNumField {
        value,
        bit_offset,
        bit_width,
    })
}

/// 读取数据包的 frame_num
///
/// IDR slice 记为 0, 多个 slice 时返回最后一个的值, 不含 slice 时返回 0.
pub fn parse_frame_num(data: &[u8], params: &ParameterSets) -> HengsuResult<u32> {
    let mut frame_num = 0;
    for span in slice_spans(data, params)? {
        frame_num = if span.nal_type.is_idr() {
            0
        } else {
            parse_frame_num_field(span.payload(data), params)?.value
        };
    }
    Ok(frame_num)
}

/// 将数据包内所有非 IDR slice 的 frame_num 加上 `adjustment` (模 2^log2_max_frame_num)
///
/// 含 IDR 或不含 slice 时返回 [`PatchOutcome::EndOfGop`], 缓冲区保持不变.
/// 中途出错时, 已改写的 slice 不回滚.
pub fn patch_frame_num(
    data: &mut [u8],
    params: &ParameterSets,
    adjustment: u32,
) -> HengsuResult<PatchOutcome> {
    let spans = slice_spans(data, params)?;
    if spans.is_empty() || spans.iter().any(|s| s.nal_type.is_idr()) {
        return Ok(PatchOutcome::EndOfGop);
    }

    let mut last = 0;
    for span in &spans {
        let payload = span.payload_mut(data);
        let field = parse_frame_num_field(payload, params)?;
        let new_value = field.adjusted(adjustment);
        replace_bits(payload, field.bit_offset, field.bit_width, new_value)?;
        log::debug!(
            "H.264: slice frame_num 改写 {} => {} (+{})",
            field.value,
            new_value,
            adjustment
        );
        last = new_value;
    }
    Ok(PatchOutcome::Patched(last))
}

/// 数据包内所有携带 frame_num 的 slice NAL
fn slice_spans(data: &[u8], params: &ParameterSets) -> HengsuResult<Vec<NalSpan>> {
    let mut spans = scan_nal_units(data, params.framing())?;
    spans.retain(|s| s.nal_type.is_slice());
    Ok(spans)
}
