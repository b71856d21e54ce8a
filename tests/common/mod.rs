//! 集成测试公共工具: 构造最小的 H.264 码流与数据包.

#![allow(dead_code)]

use hengsu::codec::parsers::h264::{NalFraming, build_avcc_config};
use hengsu::codec::{CodecId, CodecParameters, Packet};
use hengsu::core::Rational;
use hengsu::core::bitwriter::BitWriter;

/// 90kHz 时间基
pub const TIME_BASE: Rational = Rational::new(1, 90000);

/// 25fps 下一帧的时长
pub const FRAME: i64 = 3600;

/// 初始化测试日志, 重复调用无副作用
pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// 测试码流: 宽高按宏块计
pub struct TestStream {
    pub mbs: (u32, u32),
    pub log2_max_frame_num: u32,
    pub cabac: bool,
    pub framing: NalFraming,
}

impl TestStream {
    pub fn cavlc(framing: NalFraming) -> Self {
        Self {
            mbs: (2, 2),
            log2_max_frame_num: 4,
            cabac: false,
            framing,
        }
    }

    pub fn width(&self) -> u32 {
        self.mbs.0 * 16
    }

    pub fn height(&self) -> u32 {
        self.mbs.1 * 16
    }

    /// Baseline SPS: poc_type=2, 单参考帧, 逐行
    pub fn sps(&self) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.write_bits(0x67, 8);
        bw.write_bits(66, 8);
        bw.write_bits(0xC0, 8);
        bw.write_bits(30, 8);
        bw.write_ue(0); // sps_id
        bw.write_ue(self.log2_max_frame_num - 4);
        bw.write_ue(2); // poc_type
        bw.write_ue(1); // max_num_ref_frames
        bw.write_flag(false);
        bw.write_ue(self.mbs.0 - 1);
        bw.write_ue(self.mbs.1 - 1);
        bw.write_flag(true); // frame_mbs_only_flag
        bw.write_flag(true); // direct_8x8_inference_flag
        bw.write_flag(false); // frame_cropping_flag
        bw.write_flag(false); // vui_parameters_present_flag
        bw.write_bit(1);
        bw.finish()
    }

    /// PPS 0, init_qp=26, 带去块参数
    pub fn pps(&self) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.write_bits(0x68, 8);
        bw.write_ue(0); // pps_id
        bw.write_ue(0); // sps_id
        bw.write_flag(self.cabac);
        bw.write_flag(false);
        bw.write_ue(0); // num_slice_groups_minus1
        bw.write_ue(0);
        bw.write_ue(0);
        bw.write_flag(false); // weighted_pred_flag
        bw.write_bits(0, 2);
        bw.write_se(0);
        bw.write_se(0);
        bw.write_se(0);
        bw.write_flag(true); // deblocking_filter_control_present_flag
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_bit(1);
        bw.finish()
    }

    pub fn codec_params(&self) -> CodecParameters {
        let extradata = match self.framing {
            NalFraming::AnnexB => self.frame(&[self.sps(), self.pps()]),
            NalFraming::LengthPrefixed(n) => {
                build_avcc_config(&[self.sps()], &[self.pps()], n as usize).unwrap()
            }
        };
        CodecParameters::video(CodecId::H264, self.width(), self.height(), extradata)
    }

    /// 按封装方式拼接 NAL
    pub fn frame(&self, nals: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        for nal in nals {
            match self.framing {
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

    /// 非 IDR P slice
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

    /// IDR slice
    pub fn idr_slice(&self) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.write_bits(0x65, 8);
        bw.write_ue(0);
        bw.write_ue(7);
        bw.write_ue(0);
        bw.write_bits(0, self.log2_max_frame_num);
        bw.write_ue(0);
        bw.write_bits(0b1011_1001, 8);
        bw.write_bit(1);
        bw.finish()
    }

    /// 关键帧数据包 (携带参数集)
    pub fn key_packet(&self, dts: i64) -> Packet {
        let data = self.frame(&[self.sps(), self.pps(), self.idr_slice()]);
        make_packet(data, dts, true)
    }

    /// P 帧数据包
    pub fn p_packet(&self, frame_num: u32, dts: i64) -> Packet {
        make_packet(self.frame(&[self.p_slice(frame_num)]), dts, false)
    }
}

pub fn make_packet(data: Vec<u8>, dts: i64, key: bool) -> Packet {
    let mut pkt = Packet::from_data(data).with_timestamps(dts, dts);
    pkt.time_base = TIME_BASE;
    pkt.duration = FRAME;
    pkt.set_keyframe(key);
    pkt
}
