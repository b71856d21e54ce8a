//! NAL 单元定位.
//!
//! 两种封装:
//! - Annex B: `00 00 01` 或 `00 00 00 01` 起始码分隔
//! - AVCC: 每个 NAL 前是 N 字节大端长度 (N 取 1..=4, 由 avcC 记录声明)
//!
//! NAL 头 1 字节: `forbidden_zero_bit(1) | nal_ref_idc(2) | nal_unit_type(5)`.
//!
//! [`scan_nal_units`] 只给出位置 ([`NalSpan`]), 调用方可在原缓冲区上读或改写载荷.
//! [`NalUnit`] 是带数据副本的形式, 用于 extradata 这类一次性解析.

use std::ops::Range;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use hengsu_core::{HengsuError, HengsuResult};

/// 单个数据包最多识别的 NAL 数, 超出的部分忽略
pub const MAX_NALS_PER_PACKET: usize = 128;

/// 写出 Annex B 数据时使用的 4 字节起始码
pub const START_CODE: [u8; 4] = [0, 0, 0, 1];

/// `nal_unit_type`, 只区分过滤器关心的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NalUnitType {
    /// 1: 非 IDR 图像的 slice
    Slice,
    /// 2..=4: 数据分区 A/B/C, 携带原始类型号
    SlicePartition(u8),
    /// 5: IDR slice
    SliceIdr,
    Sei,
    Sps,
    Pps,
    /// 9: 访问单元分隔符
    Aud,
    EndOfSequence,
    EndOfStream,
    FillerData,
    Unknown(u8),
}

impl From<u8> for NalUnitType {
    fn from(id: u8) -> Self {
        use NalUnitType::*;
        match id & 0x1F {
            1 => Slice,
            id @ 2..=4 => SlicePartition(id),
            5 => SliceIdr,
            6 => Sei,
            7 => Sps,
            8 => Pps,
            9 => Aud,
            10 => EndOfSequence,
            11 => EndOfStream,
            12 => FillerData,
            id => Unknown(id),
        }
    }
}

impl From<NalUnitType> for u8 {
    fn from(t: NalUnitType) -> u8 {
        use NalUnitType::*;
        match t {
            Slice => 1,
            SlicePartition(id) | Unknown(id) => id,
            SliceIdr => 5,
            Sei => 6,
            Sps => 7,
            Pps => 8,
            Aud => 9,
            EndOfSequence => 10,
            EndOfStream => 11,
            FillerData => 12,
        }
    }
}

impl NalUnitType {
    /// 带完整 slice header 的 NAL (类型 1 或 5)
    pub fn is_slice(&self) -> bool {
        matches!(self, Self::Slice | Self::SliceIdr)
    }

    pub fn is_idr(&self) -> bool {
        *self == Self::SliceIdr
    }
}

impl std::fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Slice => "Slice",
            Self::SlicePartition(_) => "SlicePartition",
            Self::SliceIdr => "IDR",
            Self::Sei => "SEI",
            Self::Sps => "SPS",
            Self::Pps => "PPS",
            Self::Aud => "AUD",
            Self::EndOfSequence => "EOSeq",
            Self::EndOfStream => "EOStream",
            Self::FillerData => "Filler",
            Self::Unknown(_) => "Unknown",
        };
        write!(f, "{name}({})", u8::from(*self))
    }
}

/// NAL 单元封装方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalFraming {
    /// 起始码分隔
    AnnexB,
    /// N 字节大端长度前缀 (N 取 1..=4)
    LengthPrefixed(u8),
}

impl NalFraming {
    /// 创建长度前缀封装, `length_size` 必须在 1..=4 之间
    pub fn length_prefixed(length_size: usize) -> HengsuResult<Self> {
        match length_size {
            1..=4 => Ok(Self::LengthPrefixed(length_size as u8)),
            _ => Err(HengsuError::InvalidArgument(format!(
                "H.264: NAL 长度前缀大小非法, length_size={}",
                length_size
            ))),
        }
    }

    /// 是否为 Annex B 起始码封装
    pub fn is_annex_b(&self) -> bool {
        matches!(self, Self::AnnexB)
    }

    /// 每个 NAL 单元前的封装头字节数 (Annex B 固定写 4 字节起始码)
    pub fn header_size(&self) -> usize {
        match self {
            Self::AnnexB => START_CODE.len(),
            Self::LengthPrefixed(n) => *n as usize,
        }
    }

    /// 向 `out` (长度为 [`header_size`](Self::header_size)) 写入封装头
    ///
    /// 长度前缀封装写入 `payload_len` 的大端表示, 长度放不下时返回错误.
    pub fn write_header(&self, out: &mut [u8], payload_len: usize) -> HengsuResult<()> {
        if out.len() != self.header_size() {
            return Err(HengsuError::InvalidArgument(format!(
                "H.264: 封装头缓冲区大小不匹配, expected={}, actual={}",
                self.header_size(),
                out.len()
            )));
        }
        match self {
            Self::AnnexB => out.copy_from_slice(&START_CODE),
            Self::LengthPrefixed(n) => {
                let max = (1u64 << (8 * u32::from(*n))) - 1;
                if payload_len as u64 > max {
                    return Err(HengsuError::InvalidData(format!(
                        "H.264: NAL 长度 {} 超出 {} 字节长度前缀",
                        payload_len, n
                    )));
                }
                BigEndian::write_uint(out, payload_len as u64, *n as usize);
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for NalFraming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnnexB => write!(f, "AnnexB"),
            Self::LengthPrefixed(n) => write!(f, "AVCC({n})"),
        }
    }
}

/// NAL 单元在数据包中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalSpan {
    /// NAL 单元类型
    pub nal_type: NalUnitType,
    /// nal_ref_idc (参考重要性, 0-3)
    pub ref_idc: u8,
    /// NAL 头字节在数据包中的偏移
    pub offset: usize,
    /// NAL 大小 (含头字节, 不含起始码或长度前缀)
    pub size: usize,
}

impl NalSpan {
    /// 载荷 (NAL 头字节之后) 在数据包中的区间
    pub fn payload_range(&self) -> Range<usize> {
        self.offset + 1..self.offset + self.size
    }

    /// NAL 完整数据 (含头字节)
    pub fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.offset..self.offset + self.size]
    }

    /// NAL 载荷
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.payload_range()]
    }

    /// 可写 NAL 载荷
    pub fn payload_mut<'a>(&self, data: &'a mut [u8]) -> &'a mut [u8] {
        &mut data[self.payload_range()]
    }
}

/// 定位数据包内的所有 NAL 单元
///
/// - forbidden_zero_bit 置位的 NAL 被跳过
/// - 超过 [`MAX_NALS_PER_PACKET`] 的部分被忽略
/// - Annex B 中两个起始码之间没有数据, 或长度前缀为 0 / 超出剩余数据时返回错误
pub fn scan_nal_units(data: &[u8], framing: NalFraming) -> HengsuResult<Vec<NalSpan>> {
    let mut spans = Vec::new();
    let mut push = |offset: usize, size: usize| -> bool {
        if spans.len() >= MAX_NALS_PER_PACKET {
            log::debug!(
                "H.264: 数据包 NAL 数超过 {}, 忽略剩余部分",
                MAX_NALS_PER_PACKET
            );
            return false;
        }
        let header = data[offset];
        if header & 0x80 == 0 {
            spans.push(NalSpan {
                nal_type: NalUnitType::from(header),
                ref_idc: (header >> 5) & 0x03,
                offset,
                size,
            });
        }
        true
    };

    match framing {
        NalFraming::AnnexB => {
            let end = data.len();
            let mut nal_start = find_start_code(data, 0);
            loop {
                // 跳过起始码 (含多余的前导零)
                while nal_start < end && data[nal_start] == 0 {
                    nal_start += 1;
                }
                nal_start += 1;
                if nal_start >= end {
                    break;
                }
                let nal_end = find_start_code(data, nal_start);
                if nal_end == nal_start {
                    return Err(HengsuError::InvalidData(format!(
                        "H.264: 起始码之间缺少 NAL 数据, offset={}",
                        nal_start
                    )));
                }
                if !push(nal_start, nal_end - nal_start) {
                    break;
                }
                nal_start = nal_end;
            }
        }
        NalFraming::LengthPrefixed(n) => {
            let n = n as usize;
            let mut pos = 0;
            while data.len() - pos > n {
                let nal_len = BigEndian::read_uint(&data[pos..pos + n], n) as usize;
                pos += n;
                let remaining = data.len() - pos;
                if nal_len == 0 || nal_len > remaining {
                    return Err(HengsuError::InvalidData(format!(
                        "H.264: NAL 长度前缀非法, len={}, remain={}",
                        nal_len, remaining
                    )));
                }
                if !push(pos, nal_len) {
                    break;
                }
                pos += nal_len;
            }
        }
    }

    Ok(spans)
}

/// 从 `from` 开始查找下一个起始码, 返回其首字节位置, 未找到时返回 `data.len()`
///
/// 起始码前紧邻的 0 字节视为 4 字节起始码的一部分.
fn find_start_code(data: &[u8], from: usize) -> usize {
    let end = data.len();
    let found = find_start_code_raw(data, from);
    if found > from && found < end && data[found - 1] == 0 {
        found - 1
    } else {
        found
    }
}

/// 查找 `00 00 01`, 按 4 字节字长快速跳过不含 0 字节的区域
fn find_start_code_raw(data: &[u8], from: usize) -> usize {
    let end = data.len();
    let is_start_code = |i: usize| data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1;

    let mut i = from;
    while i + 4 <= end {
        let word = LittleEndian::read_u32(&data[i..i + 4]);
        if word.wrapping_sub(0x0101_0101) & !word & 0x8080_8080 != 0 {
            // 字内有 0 字节, 逐字节确认
            for j in i..i + 4 {
                if j + 3 <= end && is_start_code(j) {
                    return j;
                }
            }
        }
        i += 4;
    }
    while i + 3 <= end {
        if is_start_code(i) {
            return i;
        }
        i += 1;
    }
    end
}

/// 独立持有数据的 NAL 单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalUnit {
    pub nal_type: NalUnitType,
    pub ref_idc: u8,
    /// 头字节 + 载荷, 不含起始码或长度前缀
    pub data: Vec<u8>,
}

impl NalUnit {
    pub fn parse(data: &[u8]) -> HengsuResult<Self> {
        match data.first() {
            None => Err(HengsuError::InvalidData("H.264: 空 NAL".into())),
            Some(&header) if header & 0x80 != 0 => Err(HengsuError::InvalidData(format!(
                "H.264: forbidden_zero_bit 置位, header=0x{header:02X}"
            ))),
            Some(&header) => Ok(Self {
                nal_type: NalUnitType::from(header),
                ref_idc: (header >> 5) & 0x03,
                data: data.to_vec(),
            }),
        }
    }

    /// 去掉头字节与防竞争字节后的 RBSP
    pub fn rbsp(&self) -> Vec<u8> {
        remove_emulation_prevention(&self.data[1..])
    }
}

/// 拆分 Annex B 字节流
pub fn split_annex_b(data: &[u8]) -> HengsuResult<Vec<NalUnit>> {
    collect_units(data, NalFraming::AnnexB)
}

/// 拆分 `length_size` 字节长度前缀的数据
pub fn split_avcc(data: &[u8], length_size: usize) -> HengsuResult<Vec<NalUnit>> {
    collect_units(data, NalFraming::length_prefixed(length_size)?)
}

fn collect_units(data: &[u8], framing: NalFraming) -> HengsuResult<Vec<NalUnit>> {
    let spans = scan_nal_units(data, framing)?;
    spans.iter().map(|span| NalUnit::parse(span.bytes(data))).collect()
}

/// `00 00 03 xx` -> `00 00 xx`
pub fn remove_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut zeros = 0usize;
    for &b in data {
        if zeros >= 2 && b == 0x03 {
            zeros = 0;
            continue;
        }
        out.push(b);
        zeros = if b == 0 { zeros + 1 } else { 0 };
    }
    out
}

/// RBSP 中 `00 00` 之后出现 0..=3 时插入 0x03
pub fn add_emulation_prevention(rbsp: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rbsp.len() + rbsp.len() / 64);
    let mut zeros = 0usize;
    for &b in rbsp {
        if zeros >= 2 && b <= 0x03 {
            out.push(0x03);
            zeros = 0;
        }
        out.push(b);
        zeros = if b == 0 { zeros + 1 } else { 0 };
    }
    out
}

/// 是否含 `00 00 03`
pub fn has_emulation_prevention(data: &[u8]) -> bool {
    data.windows(3).any(|w| w == [0, 0, 3])
}
