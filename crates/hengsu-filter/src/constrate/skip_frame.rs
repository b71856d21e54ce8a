//! 跳帧 (skip frame) 构造.
//!
//! 跳帧是一个引用 PPS 0 的非 IDR P slice, 所有宏块均为 skip, 解码结果与参考帧相同.
//! slice header 逐位生成, slice data 部分:
//! - CAVLC: 一个覆盖整幅图像的 mb_skip_run, 直接写在 header 之后
//! - CABAC: 追加该分辨率的预生成模板字节
//!
//! 生成的位流不做 emulation prevention, 也不写 rbsp_stop_one_bit.

use bytes::{BufMut, Bytes, BytesMut};
use hengsu_codec::Packet;
use hengsu_codec::parsers::h264::{NalFraming, Pps, Sps};
use hengsu_core::bitwriter::BitWriter;
use hengsu_core::{HengsuResult, Rational};

/// 跳帧使用的 slice QP
pub const DUMMY_SLICE_QP: i32 = 11;

/// 非 IDR slice, nal_ref_idc=0
const SKIP_NAL_HEADER: u32 = 0x01;

/// P slice, 且同一图像的其余 slice 类型相同
const SLICE_TYPE_P_ALL: u32 = 5;

/// 跳帧构造器, 持有构造所需的全部参数
#[derive(Debug, Clone)]
pub struct SkipFrameBuilder {
    sps: Sps,
    pps: Pps,
    framing: NalFraming,
    slice_data: Bytes,
}

impl SkipFrameBuilder {
    /// 创建构造器, CAVLC 码流的 `slice_data` 应为空
    pub fn new(sps: Sps, pps: Pps, framing: NalFraming, slice_data: Bytes) -> Self {
        Self {
            sps,
            pps,
            framing,
            slice_data,
        }
    }

    /// 输出封装方式
    pub fn framing(&self) -> NalFraming {
        self.framing
    }

    /// 生成字节对齐的 NAL 头与 slice header (CAVLC 时包含 slice data)
    pub fn slice_header(&self, frame_num: u32) -> Vec<u8> {
        let sps = &self.sps;
        let pps = &self.pps;
        let has_chroma = sps.chroma_format_idc != 0;

        let mut bw = BitWriter::with_capacity(16);
        bw.write_bits(SKIP_NAL_HEADER, 8);
        bw.write_ue(0); // first_mb_in_slice
        bw.write_ue(SLICE_TYPE_P_ALL);
        bw.write_ue(0); // pic_parameter_set_id
        bw.write_bits(
            frame_num & (sps.max_frame_num() - 1),
            sps.log2_max_frame_num,
        );
        if pps.redundant_pic_cnt_present {
            bw.write_ue(0);
        }
        bw.write_flag(false); // num_ref_idx_active_override_flag
        bw.write_flag(false); // ref_pic_list_modification_flag_l0

        if pps.weighted_pred {
            bw.write_ue(0); // luma_log2_weight_denom
            if has_chroma {
                bw.write_ue(0); // chroma_log2_weight_denom
            }
            for _ in 0..pps.num_ref_idx_l0_default_active {
                bw.write_flag(false); // luma_weight_l0_flag
                if has_chroma {
                    bw.write_flag(false); // chroma_weight_l0_flag
                }
            }
        }

        if pps.cabac {
            bw.write_ue(0); // cabac_init_idc
        }
        bw.write_se(DUMMY_SLICE_QP - pps.pic_init_qp);

        if pps.deblocking_filter_control {
            bw.write_ue(0); // disable_deblocking_filter_idc
            bw.write_se(0); // slice_alpha_c0_offset_div2
            bw.write_se(0); // slice_beta_offset_div2
        }

        if !pps.cabac {
            bw.write_ue(sps.mb_width() * sps.mb_height()); // mb_skip_run
        }

        bw.finish()
    }

    /// 生成带封装头的完整跳帧数据
    pub fn build_data(&self, frame_num: u32) -> HengsuResult<Bytes> {
        let header_size = self.framing.header_size();
        let nal = self.slice_header(frame_num);
        let payload_len = nal.len() + self.slice_data.len();

        let mut buf = BytesMut::with_capacity(header_size + payload_len);
        buf.put_bytes(0, header_size);
        buf.extend_from_slice(&nal);
        buf.extend_from_slice(&self.slice_data);
        self.framing
            .write_header(&mut buf[..header_size], payload_len)?;
        Ok(buf.freeze())
    }

    /// 生成跳帧数据包, pts 与 dts 相同, 不带任何标志
    pub fn build_packet(
        &self,
        frame_num: u32,
        dts: i64,
        duration: i64,
        time_base: Rational,
        stream_index: usize,
    ) -> HengsuResult<Packet> {
        let mut packet = Packet::from_data(self.build_data(frame_num)?).with_timestamps(dts, dts);
        packet.duration = duration;
        packet.time_base = time_base;
        packet.stream_index = stream_index;
        Ok(packet)
    }
}
