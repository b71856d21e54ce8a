//! 编解码器标识符.
//!
//! 过滤器只处理 H.264, 其余取值用于拒绝不支持的输入流.

use std::fmt;

/// 编解码器标识符 (对标 `AVCodecID`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum CodecId {
    #[default]
    None,
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
}

impl CodecId {
    /// FFmpeg 风格的短名称
    pub const fn name(self) -> &'static str {
        match self {
            CodecId::None => "none",
            CodecId::H264 => "h264",
            CodecId::H265 => "hevc",
        }
    }

    /// 是否为视频编解码器
    pub const fn is_video(self) -> bool {
        !matches!(self, CodecId::None)
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
