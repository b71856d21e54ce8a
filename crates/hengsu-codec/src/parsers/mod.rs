//! 码流解析器.
//!
//! 只在比特层面识别码流结构, 不做解码.

pub mod h264;
