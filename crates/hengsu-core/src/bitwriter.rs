//! MSB first 位写入, 以及已编码缓冲区上的位区间改写.
//!
//! [`BitWriter`] 用于生成新的 NAL (跳帧 slice、测试码流),
//! [`replace_bits`] 是修改现有码流的唯一入口.

use crate::{HengsuError, HengsuResult};

/// 追加式位写入器, 与 [`BitReader`](crate::bitreader::BitReader) 对称
///
/// ```
/// use hengsu_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b1011, 4);
/// bw.write_ue(0);
/// bw.write_ue(1);
/// assert_eq!(bw.finish(), vec![0b1011_1010]);
/// ```
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// 尚未凑满一个字节的位, 低 `pending` 位有效
    acc: u8,
    pending: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.pending as usize
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.pending == 0
    }

    pub fn write_bit(&mut self, bit: u32) {
        self.acc = (self.acc << 1) | (bit & 1) as u8;
        self.pending += 1;
        if self.pending == 8 {
            self.bytes.push(self.acc);
            self.acc = 0;
            self.pending = 0;
        }
    }

    pub fn write_flag(&mut self, flag: bool) {
        self.write_bit(u32::from(flag));
    }

    /// 写 `value` 的低 `n` 位 (n <= 32)
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits 最多 32 位, 收到 {n}");
        for i in (0..n).rev() {
            self.write_bit(value >> i);
        }
    }

    /// ue(v): 若干个 0 后接 `value + 1` 的二进制, 0 的个数为其位宽减 1
    pub fn write_ue(&mut self, value: u32) {
        let code = u64::from(value) + 1;
        let width = 64 - code.leading_zeros();
        self.write_bits(0, width - 1);
        for i in (0..width).rev() {
            self.write_bit((code >> i) as u32);
        }
    }

    /// se(v)
    pub fn write_se(&mut self, value: i32) {
        let value = i64::from(value);
        let code = if value > 0 { 2 * value - 1 } else { -2 * value };
        self.write_ue(code as u32);
    }

    /// 补 0 到字节边界
    pub fn align_to_byte(&mut self) {
        while !self.is_byte_aligned() {
            self.write_bit(0);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.is_byte_aligned() {
            self.bytes.extend_from_slice(bytes);
            return;
        }
        for &b in bytes {
            self.write_bits(u32::from(b), 8);
        }
    }

    /// 补齐最后一个字节并取出结果
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.bytes
    }
}

/// 原地覆写 `data` 中从 `bit_offset` 开始的 `width` 个位
///
/// 按大端位序写入 `value` 的低 `width` 位, 可跨越字节边界, 区间外的位保持不变.
/// `width` 最多 32 位, 且区间必须完全位于缓冲区内.
pub fn replace_bits(data: &mut [u8], bit_offset: usize, width: u32, value: u32) -> HengsuResult<()> {
    if width > 32 {
        return Err(HengsuError::InvalidArgument(format!(
            "replace_bits: width={} 超过 32 位",
            width,
        )));
    }
    let total_bits = data.len() * 8;
    let end = bit_offset
        .checked_add(width as usize)
        .filter(|&end| end <= total_bits)
        .ok_or_else(|| {
            HengsuError::InvalidArgument(format!(
                "replace_bits: 位区间 [{}, +{}) 超出缓冲区 ({} 位)",
                bit_offset, width, total_bits,
            ))
        })?;

    for (i, pos) in (bit_offset..end).enumerate() {
        let bit = ((value >> (width as usize - 1 - i)) & 1) as u8;
        let shift = 7 - (pos % 8);
        let byte = &mut data[pos / 8];
        *byte = (*byte & !(1 << shift)) | (bit << shift);
    }
    Ok(())
}
