//! 已编码数据包 (对标 `AVPacket`).

use bitflags::bitflags;
use bytes::Bytes;
use hengsu_core::{NOPTS_VALUE, Rational};

bitflags! {
    /// `AV_PKT_FLAG_*`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PacketFlags: u32 {
        /// 关键帧, H.264 中即含 IDR 的访问单元
        const KEY = 1 << 0;
        const CORRUPT = 1 << 1;
    }
}

/// 一个访问单元的压缩数据及其时间信息
///
/// 负载是引用计数的 [`Bytes`], 克隆不会复制数据.
#[derive(Debug, Clone)]
pub struct Packet {
    pub data: Bytes,
    pub pts: i64,
    /// 解码时间戳, 恒定帧率按它检测空洞
    pub dts: i64,
    /// 时长, 单位为 `time_base`
    pub duration: i64,
    pub time_base: Rational,
    pub stream_index: usize,
    pub flags: PacketFlags,
}

impl Default for Packet {
    fn default() -> Self {
        Self {
            data: Bytes::new(),
            pts: NOPTS_VALUE,
            dts: NOPTS_VALUE,
            duration: 0,
            time_base: Rational::UNDEFINED,
            stream_index: 0,
            flags: PacketFlags::empty(),
        }
    }
}

impl Packet {
    /// 无负载, 时间戳未设置
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn with_timestamps(self, pts: i64, dts: i64) -> Self {
        Self { pts, dts, ..self }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(PacketFlags::KEY)
    }

    pub fn set_keyframe(&mut self, key: bool) {
        self.flags.set(PacketFlags::KEY, key);
    }
}
