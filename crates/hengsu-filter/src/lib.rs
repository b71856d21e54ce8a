//! # hengsu-filter
//!
//! 恒速码流过滤器库, 在压缩数据包层面工作, 不做解码.
//!
//! 本 crate 对标 FFmpeg 的 bitstream filter (`av_bsf_*`) 接口:
//! 调用方每送入一个数据包, 就反复取出输出, 直到返回 [`HengsuError::NeedMoreData`].
//!
//! ## 支持的过滤器
//!
//! - **h264_constrate**: H.264 恒定帧率, 在时间戳空洞处插入跳帧并修正 frame_num
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use hengsu_codec::{CodecParameters, Packet};
//! use hengsu_core::Rational;
//! use hengsu_filter::{BitstreamFilter, ConstRateFilter, drain_packets};
//!
//! # fn run(params: &CodecParameters, input: Vec<Packet>) -> hengsu_core::HengsuResult<()> {
//! let mut filter = ConstRateFilter::new(params, Rational::new(1, 90000), Rational::new(25, 1))?;
//! for packet in input {
//!     for out in drain_packets(&mut filter, packet)? {
//!         // 写入封装器
//!         let _ = out;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod constrate;

use hengsu_codec::Packet;
use hengsu_core::{HengsuError, HengsuResult};

pub use constrate::{ConstRateFilter, SkipSliceTable};

/// 码流过滤器 trait
///
/// 送入一个数据包后, 需要反复调用 [`receive_packet`](Self::receive_packet)
/// 直到返回 [`HengsuError::NeedMoreData`], 才能送入下一个数据包.
pub trait BitstreamFilter: Send {
    /// 获取过滤器名称
    fn name(&self) -> &str;

    /// 送入一个数据包
    fn send_packet(&mut self, packet: Packet) -> HengsuResult<()>;

    /// 取出一个输出数据包, 没有更多输出时返回 [`HengsuError::NeedMoreData`]
    fn receive_packet(&mut self) -> HengsuResult<Packet>;
}

/// 送入一个数据包并取出全部输出
pub fn drain_packets(
    filter: &mut dyn BitstreamFilter,
    packet: Packet,
) -> HengsuResult<Vec<Packet>> {
    filter.send_packet(packet)?;
    let mut output = Vec::new();
    loop {
        match filter.receive_packet() {
            Ok(packet) => output.push(packet),
            Err(HengsuError::NeedMoreData) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 把每个输入包原样输出两次的测试过滤器
    struct Duplicate {
        pending: Vec<Packet>,
    }

    impl BitstreamFilter for Duplicate {
        fn name(&self) -> &str {
            "duplicate"
        }

        fn send_packet(&mut self, packet: Packet) -> HengsuResult<()> {
            if !self.pending.is_empty() {
                return Err(HengsuError::InvalidState("未取空".into()));
            }
            self.pending = vec![packet.clone(), packet];
            Ok(())
        }

        fn receive_packet(&mut self) -> HengsuResult<Packet> {
            self.pending.pop().ok_or(HengsuError::NeedMoreData)
        }
    }

    #[test]
    fn test_drain_packets() {
        let mut filter = Duplicate { pending: vec![] };
        let out = drain_packets(&mut filter, Packet::from_data(vec![1u8, 2, 3])).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(&out[0].data[..], &[1, 2, 3]);
        assert_eq!(filter.name(), "duplicate");
        // 已取空, 可以继续送入
        assert_eq!(drain_packets(&mut filter, Packet::empty()).unwrap().len(), 2);
    }
}
