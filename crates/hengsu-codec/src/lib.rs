//! # hengsu-codec
//!
//! 恒速码流层基础库, 提供压缩数据包、编解码器参数和 H.264 码流解析.
//!
//! 本 crate 对标 FFmpeg 的 libavcodec 中与码流过滤相关的部分:
//! 不做任何解码, 只在比特层面识别和读取 NAL 单元、参数集与 slice header.
//!
//! ## 使用示例
//!
//! ```rust
//! use hengsu_codec::parsers::h264::{NalFraming, NalUnitType, scan_nal_units};
//!
//! let data = [0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84];
//! let nals = scan_nal_units(&data, NalFraming::AnnexB).unwrap();
//! assert_eq!(nals.len(), 1);
//! assert_eq!(nals[0].nal_type, NalUnitType::SliceIdr);
//! ```

pub mod codec_id;
pub mod codec_parameters;
pub mod packet;
pub mod parsers;

// 重导出常用类型
pub use codec_id::CodecId;
pub use codec_parameters::{CodecParameters, VideoCodecParams};
pub use packet::{Packet, PacketFlags};
