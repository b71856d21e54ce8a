//! H.264 参数集表.
//!
//! 从 extradata (avcC 记录或 Annex B 字节流) 中解析出全部 SPS / PPS,
//! 同时确定码流的 NAL 封装方式.

use std::collections::HashMap;

use hengsu_core::{HengsuError, HengsuResult};

use super::avcc::parse_avcc_config;
use super::nal::{NalFraming, NalUnit, NalUnitType, split_annex_b};
use super::pps::{Pps, parse_pps};
use super::sps::{Sps, parse_sps};

/// SPS / PPS 表, 按 id 索引
#[derive(Debug, Clone)]
pub struct ParameterSets {
    sps_map: HashMap<u32, Sps>,
    pps_map: HashMap<u32, Pps>,
    framing: NalFraming,
}

impl ParameterSets {
    /// 创建空参数集表
    pub fn new(framing: NalFraming) -> Self {
        Self {
            sps_map: HashMap::new(),
            pps_map: HashMap::new(),
            framing,
        }
    }

    /// 从 extradata 解析参数集
    ///
    /// 首字节为 1 时按 AVCDecoderConfigurationRecord 解析, 封装方式为其声明的长度前缀;
    /// 否则按 Annex B 字节流解析.
    pub fn from_extradata(extradata: &[u8]) -> HengsuResult<Self> {
        let Some(&first) = extradata.first() else {
            return Err(HengsuError::InvalidData("H.264: extradata 为空".into()));
        };

        let mut sets;
        if first == 1 {
            let config = parse_avcc_config(extradata)?;
            sets = Self::new(config.framing()?);
            for nal in config.sps_list.iter().chain(config.pps_list.iter()) {
                sets.add_nal(&NalUnit::parse(nal)?)?;
            }
        } else {
            sets = Self::new(NalFraming::AnnexB);
            for nal in split_annex_b(extradata)? {
                sets.add_nal(&nal)?;
            }
        }

        log::debug!(
            "H.264: extradata 解析完成, framing={}, sps={}, pps={}",
            sets.framing,
            sets.sps_map.len(),
            sets.pps_map.len()
        );
        Ok(sets)
    }

    /// 记录一个参数集 NAL, 其它类型的 NAL 被忽略
    pub fn add_nal(&mut self, nal: &NalUnit) -> HengsuResult<()> {
        match nal.nal_type {
            NalUnitType::Sps => self.insert_sps(parse_sps(&nal.rbsp())?),
            NalUnitType::Pps => self.insert_pps(parse_pps(&nal.rbsp())?),
            _ => {}
        }
        Ok(())
    }

    /// 插入或替换 SPS
    pub fn insert_sps(&mut self, sps: Sps) {
        self.sps_map.insert(sps.sps_id, sps);
    }

    /// 插入或替换 PPS
    pub fn insert_pps(&mut self, pps: Pps) {
        self.pps_map.insert(pps.pps_id, pps);
    }

    /// 按 id 查找 SPS
    pub fn sps(&self, id: u32) -> Option<&Sps> {
        self.sps_map.get(&id)
    }

    /// 按 id 查找 PPS
    pub fn pps(&self, id: u32) -> Option<&Pps> {
        self.pps_map.get(&id)
    }

    /// 查找 PPS 及其引用的 SPS
    pub fn active(&self, pps_id: u32) -> HengsuResult<(&Pps, &Sps)> {
        let pps = self.pps(pps_id).ok_or_else(|| {
            HengsuError::InvalidData(format!("H.264: 未找到 PPS, pps_id={}", pps_id))
        })?;
        let sps = self.sps(pps.sps_id).ok_or_else(|| {
            HengsuError::InvalidData(format!(
                "H.264: 未找到 SPS, pps_id={}, sps_id={}",
                pps_id, pps.sps_id
            ))
        })?;
        Ok((pps, sps))
    }

    /// NAL 封装方式
    pub fn framing(&self) -> NalFraming {
        self.framing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::h264::avcc::build_avcc_config;
    use hengsu_core::bitwriter::BitWriter;

    /// Baseline SPS NAL: 176x144, log2_max_frame_num=4, poc_type=2
    fn sps_nal(sps_id: u32) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.write_bits(0x67, 8);
        bw.write_bits(66, 8);
        bw.write_bits(0, 8);
        bw.write_bits(30, 8);
        bw.write_ue(sps_id);
        bw.write_ue(0); // log2_max_frame_num_minus4
        bw.write_ue(2); // poc_type
        bw.write_ue(1); // max_num_ref_frames
        bw.write_flag(false);
        bw.write_ue(10); // 11 MB
        bw.write_ue(8); // 9 MB
        bw.write_flag(true);
        bw.write_flag(true);
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_bit(1);
        bw.finish()
    }

    fn pps_nal(pps_id: u32, sps_id: u32) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.write_bits(0x68, 8);
        bw.write_ue(pps_id);
        bw.write_ue(sps_id);
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_ue(0);
        bw.write_ue(0);
        bw.write_ue(0);
        bw.write_flag(false);
        bw.write_bits(0, 2);
        bw.write_se(0);
        bw.write_se(0);
        bw.write_se(0);
        bw.write_flag(true);
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_bit(1);
        bw.finish()
    }

    #[test]
    fn test_from_extradata_annex_b() {
        let mut extra = vec![0x00, 0x00, 0x00, 0x01];
        extra.extend_from_slice(&sps_nal(0));
        extra.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
        extra.extend_from_slice(&pps_nal(0, 0));

        let sets = ParameterSets::from_extradata(&extra).unwrap();
        assert_eq!(sets.framing(), NalFraming::AnnexB);
        let (pps, sps) = sets.active(0).unwrap();
        assert_eq!(pps.pps_id, 0);
        assert_eq!(sps.log2_max_frame_num, 4);
        assert_eq!((sps.width, sps.height), (176, 144));
    }

    #[test]
    fn test_from_extradata_avcc() {
        let extra = build_avcc_config(&[sps_nal(1)], &[pps_nal(2, 1)], 4).unwrap();
        let sets = ParameterSets::from_extradata(&extra).unwrap();
        assert_eq!(sets.framing(), NalFraming::LengthPrefixed(4));
        assert!(sets.pps(0).is_none());
        let (pps, sps) = sets.active(2).unwrap();
        assert_eq!(pps.sps_id, 1);
        assert_eq!(sps.sps_id, 1);
    }

    #[test]
    fn test_active_缺少参数集() {
        let mut sets = ParameterSets::new(NalFraming::AnnexB);
        let err = sets.active(0).expect_err("空表应返回错误");
        assert!(format!("{err}").contains("未找到 PPS"));

        sets.add_nal(&NalUnit::parse(&pps_nal(0, 3)).unwrap()).unwrap();
        let err = sets.active(0).expect_err("缺少 SPS 应返回错误");
        assert!(format!("{err}").contains("未找到 SPS"));
    }

    #[test]
    fn test_from_extradata_非法输入() {
        assert!(ParameterSets::from_extradata(&[]).is_err());
        // avcC 中的 SPS 损坏
        let extra = build_avcc_config(&[vec![0x67, 0x42, 0x00, 0x1E]], &[], 4).unwrap();
        assert!(ParameterSets::from_extradata(&extra).is_err());
    }
}
