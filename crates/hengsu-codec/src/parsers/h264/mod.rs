//! H.264/AVC 码流解析器.
//!
//! 提供对 H.264 Annex B 和 AVCC 格式码流的解析能力:
//! - NAL 单元定位与类型识别, avcC 记录读写
//! - SPS / PPS 解析与参数集表
//! - slice header 中 frame_num 字段的定位、读取与原地改写

pub mod avcc;
pub mod nal;
pub mod param_sets;
pub mod pps;
pub mod slice_header;
pub mod sps;

pub use avcc::{AvccConfig, build_avcc_config, parse_avcc_config};
pub use nal::{
    MAX_NALS_PER_PACKET, NalFraming, NalSpan, NalUnit, NalUnitType, scan_nal_units, split_annex_b,
    split_avcc,
};
pub use param_sets::ParameterSets;
pub use pps::{Pps, parse_pps};
pub use slice_header::{FrameNumField, PatchOutcome, parse_frame_num, patch_frame_num};
pub use sps::{Sps, parse_sps};
