//! 测试用码流构造工具: 参数集、slice NAL 与数据包.

use hengsu_codec::parsers::h264::{NalFraming, build_avcc_config};
use hengsu_codec::{CodecId, CodecParameters, Packet};
use hengsu_core::bitwriter::BitWriter;
use hengsu_core::{NOPTS_VALUE, Rational};

/// 码流参数
#[derive(Debug, Clone)]
pub(crate) struct TestStream {
    pub log2_max_frame_num: u32,
    pub poc_type: u32,
    pub ref_frames: u32,
    pub frame_mbs_only: bool,
    pub mbs: (u32, u32),
    pub cabac: bool,
    pub weighted_pred: bool,
    pub slice_groups: Option<(u32, u32)>,
    pub ref_l0: u32,
    pub init_qp: i32,
    pub deblocking: bool,
    pub redundant: bool,
}

impl Default for TestStream {
    fn default() -> Self {
        Self {
            log2_max_frame_num: 4,
            poc_type: 2,
            ref_frames: 1,
            frame_mbs_only: true,
            mbs: (2, 2),
            cabac: false,
            weighted_pred: false,
            slice_groups: None,
            ref_l0: 1,
            init_qp: 26,
            deblocking: true,
            redundant: false,
        }
    }
}

impl TestStream {
    pub fn width(&self) -> u32 {
        self.mbs.0 * 16
    }

    pub fn height(&self) -> u32 {
        self.mbs.1 * 16
    }

    /// Baseline SPS NAL (含头字节)
    pub fn sps_nal(&self) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.write_bits(0x67, 8);
        bw.write_bits(66, 8);
        bw.write_bits(0xC0, 8);
        bw.write_bits(30, 8);
        bw.write_ue(0);
        bw.write_ue(self.log2_max_frame_num - 4);
        bw.write_ue(self.poc_type);
        if self.poc_type == 0 {
            bw.write_ue(2);
        }
        bw.write_ue(self.ref_frames);
        bw.write_flag(false);
        bw.write_ue(self.mbs.0 - 1);
        let map_units = if self.frame_mbs_only {
            self.mbs.1
        } else {
            self.mbs.1 / 2
        };
        bw.write_ue(map_units - 1);
        bw.write_flag(self.frame_mbs_only);
        if !self.frame_mbs_only {
            bw.write_flag(false);
        }
        bw.write_flag(true);
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_bit(1);
        bw.finish()
    }

    /// PPS NAL (含头字节), pps_id=0
    pub fn pps_nal(&self) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.write_bits(0x68, 8);
        bw.write_ue(0);
        bw.write_ue(0);
        bw.write_flag(self.cabac);
        bw.write_flag(false);
        match self.slice_groups {
            None => bw.write_ue(0),
            Some((count, map_type)) => {
                bw.write_ue(count - 1);
                bw.write_ue(map_type);
                match map_type {
                    0 => (0..count).for_each(|_| bw.write_ue(1)),
                    3..=5 => {
                        bw.write_flag(false);
                        bw.write_ue(0);
                    }
                    _ => {}
                }
            }
        }
        bw.write_ue(self.ref_l0 - 1);
        bw.write_ue(0);
        bw.write_flag(self.weighted_pred);
        bw.write_bits(0, 2);
        bw.write_se(self.init_qp - 26);
        bw.write_se(0);
        bw.write_se(0);
        bw.write_flag(self.deblocking);
        bw.write_flag(false);
        bw.write_flag(self.redundant);
        bw.write_bit(1);
        bw.finish()
    }

    /// Annex B 或 avcC 形式的 extradata
    pub fn extradata(&self, framing: NalFraming) -> Vec<u8> {
        match framing {
            NalFraming::AnnexB => frame(framing, &[self.sps_nal(), self.pps_nal()]),
            NalFraming::LengthPrefixed(n) => {
                build_avcc_config(&[self.sps_nal()], &[self.pps_nal()], n as usize)
                    .unwrap_or_else(|e| panic!("构建 avcC 失败: {e}"))
            }
        }
    }

    pub fn codec_params(&self, framing: NalFraming) -> CodecParameters {
        CodecParameters::video(
            CodecId::H264,
            self.width(),
            self.height(),
            self.extradata(framing),
        )
    }

    /// 非 IDR P slice NAL
    pub fn p_slice(&self, frame_num: u32) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.write_bits(0x41, 8);
        bw.write_ue(0);
        bw.write_ue(5);
        bw.write_ue(0);
        bw.write_bits(frame_num, self.log2_max_frame_num);
        bw.write_bits(0b1101_0111, 8);
        bw.write_bit(1);
        bw.finish()
    }

    /// IDR slice NAL (frame_num 字段为 0)
    pub fn idr_slice(&self) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.write_bits(0x65, 8);
        bw.write_ue(0);
        bw.write_ue(7);
        bw.write_ue(0);
        bw.write_bits(0, self.log2_max_frame_num);
        bw.write_ue(0); // idr_pic_id
        bw.write_bits(0b1011_1001, 8);
        bw.write_bit(1);
        bw.finish()
    }
}

/// 按封装方式拼接 NAL
pub(crate) fn frame(framing: NalFraming, nals: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for nal in nals {
        match framing {
            NalFraming::AnnexB => out.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]),
            NalFraming::LengthPrefixed(n) => {
                let len = (nal.len() as u32).to_be_bytes();
                out.extend_from_slice(&len[4 - n as usize..]);
            }
        }
        out.extend_from_slice(nal);
    }
    out
}

/// 构造输入数据包
pub(crate) fn packet(data: Vec<u8>, dts: i64, key: bool) -> Packet {
    let mut pkt = Packet::from_data(data).with_timestamps(dts, dts);
    pkt.time_base = Rational::new(1, 90000);
    pkt.stream_index = 1;
    pkt.set_keyframe(key);
    pkt
}

/// dts 未定义的数据包
pub(crate) fn packet_nopts(data: Vec<u8>) -> Packet {
    packet(data, NOPTS_VALUE, false)
}
