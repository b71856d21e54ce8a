//! MSB first 位读取, 支持定长字段与 Exp-Golomb.
//!
//! H.264 参数集与 slice header 的解析都建立在它之上.
//! 位偏移 [`BitReader::bits_read`] 可直接用于之后的原地改写.

use crate::{HengsuError, HengsuResult};

/// 字节切片上的位游标
///
/// ```
/// use hengsu_core::bitreader::BitReader;
///
/// // 1 | 010 | 011 => ue: 0, 1, 2
/// let mut br = BitReader::new(&[0b1010_0110]);
/// assert_eq!(br.read_ue().unwrap(), 0);
/// assert_eq!(br.read_ue().unwrap(), 1);
/// assert_eq!(br.read_ue().unwrap(), 2);
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    /// 下一个待读位的偏移
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 已消耗的位数
    pub fn bits_read(&self) -> usize {
        self.pos
    }

    pub fn bits_left(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    pub fn read_bit(&mut self) -> HengsuResult<u32> {
        let byte = *self.data.get(self.pos / 8).ok_or(HengsuError::Eof)?;
        let bit = (byte >> (7 - self.pos % 8)) & 1;
        self.pos += 1;
        Ok(u32::from(bit))
    }

    pub fn read_flag(&mut self) -> HengsuResult<bool> {
        self.read_bit().map(|bit| bit != 0)
    }

    /// 读 `n` 位 (n <= 32), 不足时返回 `Eof` 且游标不动
    pub fn read_bits(&mut self, n: u32) -> HengsuResult<u32> {
        if n > 32 {
            return Err(HengsuError::InvalidArgument(format!(
                "read_bits 最多 32 位, 收到 {n}"
            )));
        }
        if n as usize > self.bits_left() {
            return Err(HengsuError::Eof);
        }
        let mut value = 0u64;
        let mut remaining = n as usize;
        while remaining > 0 {
            let offset = self.pos % 8;
            let take = remaining.min(8 - offset);
            let chunk = (self.data[self.pos / 8] >> (8 - offset - take)) & (0xFF >> (8 - take));
            value = (value << take) | u64::from(chunk);
            self.pos += take;
            remaining -= take;
        }
        Ok(value as u32)
    }

    /// ue(v)
    pub fn read_ue(&mut self) -> HengsuResult<u32> {
        let mut zeros = 0u32;
        while self.read_bit()? == 0 {
            zeros += 1;
            if zeros > 31 {
                return Err(HengsuError::InvalidData(
                    "Exp-Golomb 码字前导零超过 31 个".into(),
                ));
            }
        }
        let suffix = self.read_bits(zeros)?;
        Ok(((1u64 << zeros) - 1 + u64::from(suffix)) as u32)
    }

    /// se(v): 码字 k 映射为 (-1)^(k+1) * ceil(k/2)
    pub fn read_se(&mut self) -> HengsuResult<i32> {
        let k = i64::from(self.read_ue()?);
        let magnitude = (k + 1) / 2;
        let value = if k % 2 == 1 { magnitude } else { -magnitude };
        Ok(value as i32)
    }

    pub fn skip_bits(&mut self, n: usize) -> HengsuResult<()> {
        if n > self.bits_left() {
            return Err(HengsuError::Eof);
        }
        self.pos += n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_basic() {
        let data = [0b10110001, 0b01010101];
        let mut br = BitReader::new(&data);

        assert_eq!(br.read_bits(1).unwrap(), 1);
        assert_eq!(br.read_bits(1).unwrap(), 0);
        assert_eq!(br.read_bits(2).unwrap(), 0b11);
        assert_eq!(br.read_bits(4).unwrap(), 0b0001);
        assert_eq!(br.read_bits(8).unwrap(), 0b01010101);
        assert!(br.is_eof());
    }

    #[test]
    fn test_read_bits_32_bit() {
        let data = [0xFF, 0x00, 0xFF, 0x00];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_bits(32).unwrap(), 0xFF00FF00);
    }

    #[test]
    fn test_read_bits_unaligned_cross_byte() {
        let data = [0b0001_1111, 0b1110_0000];
        let mut br = BitReader::new(&data);
        br.skip_bits(3).unwrap();
        assert_eq!(br.read_bits(8).unwrap(), 0xFF);
        assert_eq!(br.bits_read(), 11);
    }

    #[test]
    fn test_read_ue_values() {
        // 1 | 010 | 011 | 00100 | 00101 | 0001000
        // => 0, 1, 2, 3, 4, 7
        let data = [0b1010_0110, 0b0100_0010, 0b1000_1000];
        let mut br = BitReader::new(&data);
        for expected in [0, 1, 2, 3, 4, 7] {
            assert_eq!(br.read_ue().unwrap(), expected);
        }
        assert_eq!(br.bits_left(), 0);
    }

    #[test]
    fn test_read_se_values() {
        // ue 码字 1,2,3,4 => se +1,-1,+2,-2
        let data = [0b0100_1100, 0b1000_0101];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_se().unwrap(), 1);
        assert_eq!(br.read_se().unwrap(), -1);
        assert_eq!(br.read_se().unwrap(), 2);
        assert_eq!(br.read_se().unwrap(), -2);
    }

    #[test]
    fn test_read_ue_前导零过多() {
        let data = [0u8; 8];
        let mut br = BitReader::new(&data);
        assert!(matches!(br.read_ue(), Err(HengsuError::InvalidData(_))));
    }

    #[test]
    fn test_read_ue_截断返回eof() {
        // 000 之后数据结束
        let data = [0b0001_0000];
        let mut br = BitReader::new(&data);
        br.skip_bits(5).unwrap();
        assert!(matches!(br.read_ue(), Err(HengsuError::Eof)));
    }

    #[test]
    fn test_skip_bits() {
        let data = [0b10110001, 0b01010101];
        let mut br = BitReader::new(&data);

        br.read_bits(3).unwrap();
        br.skip_bits(5).unwrap();
        assert_eq!(br.bits_read(), 8);
        assert_eq!(br.read_bits(8).unwrap(), 0b01010101);
        assert!(br.skip_bits(1).is_err());
    }

    #[test]
    fn test_eof_error() {
        let data = [0x00];
        let mut br = BitReader::new(&data);

        br.read_bits(8).unwrap();
        assert!(br.read_bit().is_err());
    }
}
