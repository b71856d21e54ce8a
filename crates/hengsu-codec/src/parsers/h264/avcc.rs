//! AVCDecoderConfigurationRecord (MP4 `avcC` box).
//!
//! ```text
//! version(8)=1 | profile(8) | compat(8) | level(8)
//! 111111 | lengthSizeMinusOne(2)
//! 111 | numOfSPS(5) | { len(16) | SPS NAL } * numOfSPS
//! numOfPPS(8)     | { len(16) | PPS NAL } * numOfPPS
//! ```

use bytes::{Buf, BufMut};
use hengsu_core::{HengsuError, HengsuResult};

use super::nal::NalFraming;

/// `avcC` 中的参数集与长度前缀大小
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvccConfig {
    pub sps_list: Vec<Vec<u8>>,
    pub pps_list: Vec<Vec<u8>>,
    /// 1..=4
    pub length_size: usize,
}

impl AvccConfig {
    pub fn framing(&self) -> HengsuResult<NalFraming> {
        NalFraming::length_prefixed(self.length_size)
    }
}

pub fn parse_avcc_config(data: &[u8]) -> HengsuResult<AvccConfig> {
    if data.len() < 7 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: avcC 至少 7 字节, 实际 {}",
            data.len()
        )));
    }
    let mut buf = data;
    let version = buf.get_u8();
    if version != 1 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: 不支持的 avcC 版本 {version}"
        )));
    }
    buf.advance(3); // profile / compat / level
    let length_size = usize::from(buf.get_u8() & 0x03) + 1;

    let sps_count = usize::from(buf.get_u8() & 0x1F);
    let sps_list = take_parameter_sets(&mut buf, sps_count, "SPS")?;

    if !buf.has_remaining() {
        return Err(HengsuError::InvalidData(
            "H.264: avcC 在 numOfPictureParameterSets 之前结束".into(),
        ));
    }
    let pps_count = usize::from(buf.get_u8());
    let pps_list = take_parameter_sets(&mut buf, pps_count, "PPS")?;

    Ok(AvccConfig {
        sps_list,
        pps_list,
        length_size,
    })
}

fn take_parameter_sets(buf: &mut &[u8], count: usize, kind: &str) -> HengsuResult<Vec<Vec<u8>>> {
    (0..count)
        .map(|index| {
            if buf.remaining() < 2 {
                return Err(HengsuError::InvalidData(format!(
                    "H.264: avcC 第 {index} 个 {kind} 长度字段截断"
                )));
            }
            let len = usize::from(buf.get_u16());
            if len == 0 || len > buf.remaining() {
                return Err(HengsuError::InvalidData(format!(
                    "H.264: avcC 第 {index} 个 {kind} 数据截断, len={len}, remain={}",
                    buf.remaining()
                )));
            }
            let nal = buf[..len].to_vec();
            buf.advance(len);
            Ok(nal)
        })
        .collect()
}

/// 由参数集生成 `avcC`, profile/level 取自第一个 SPS
pub fn build_avcc_config(
    sps_list: &[Vec<u8>],
    pps_list: &[Vec<u8>],
    length_size: usize,
) -> HengsuResult<Vec<u8>> {
    let framing = NalFraming::length_prefixed(length_size)?;
    let profile = match sps_list.first() {
        Some(sps) if sps.len() >= 4 => &sps[1..4],
        Some(_) => return Err(HengsuError::InvalidData("H.264: SPS 不足 4 字节".into())),
        None => {
            return Err(HengsuError::InvalidData(
                "H.264: avcC 至少需要一个 SPS".into(),
            ));
        }
    };
    if sps_list.len() > 31 || pps_list.len() > 255 {
        return Err(HengsuError::InvalidArgument(format!(
            "H.264: avcC 参数集过多, sps={}, pps={}",
            sps_list.len(),
            pps_list.len()
        )));
    }

    let body: usize = sps_list.iter().chain(pps_list).map(|n| n.len() + 2).sum();
    let mut out = Vec::with_capacity(7 + body);
    out.put_u8(1);
    out.put_slice(profile);
    out.put_u8(0xFC | (framing.header_size() as u8 - 1));
    out.put_u8(0xE0 | sps_list.len() as u8);
    put_parameter_sets(&mut out, sps_list)?;
    out.put_u8(pps_list.len() as u8);
    put_parameter_sets(&mut out, pps_list)?;
    Ok(out)
}

fn put_parameter_sets(out: &mut Vec<u8>, list: &[Vec<u8>]) -> HengsuResult<()> {
    for nal in list {
        let len = u16::try_from(nal.len()).map_err(|_| {
            HengsuError::InvalidArgument(format!("H.264: 参数集超过 65535 字节, len={}", nal.len()))
        })?;
        out.put_u16(len);
        out.put_slice(nal);
    }
    Ok(())
}
