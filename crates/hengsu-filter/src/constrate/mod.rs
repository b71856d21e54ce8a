//! H.264 恒定帧率过滤器 (h264_constrate).
//!
//! 对标 FFmpeg 风格的 bitstream filter, 不解码任何像素数据.
//! 输入数据包的 DTS 出现空洞时, 在空洞处插入跳帧 (全 skip 的 P slice),
//! 并把同一 GOP 内后续真实帧的 frame_num 依次后移, 使 frame_num 保持连续.
//!
//! # 状态
//! - `Idle`: 没有缓存的数据包
//! - `Holding`: 缓存一个数据包, 可能还有待输出的跳帧
//! - `Adjusting`: 缓存的数据包需要先改写 frame_num
//! - `Releasing`: 缓存的数据包原样输出
//!
//! # 参数
//! - `time_base`: 输入数据包的时间基
//! - `frame_rate`: 目标帧率, 决定一帧的理想时长

mod skip_frame;
mod skip_slice_table;
mod validate;

#[cfg(test)]
pub(crate) mod test_support;

use std::mem;

use bytes::Bytes;
use hengsu_codec::parsers::h264::{
    NalFraming, ParameterSets, PatchOutcome, parse_frame_num, patch_frame_num,
};
use hengsu_codec::{CodecParameters, Packet};
use hengsu_core::{HengsuError, HengsuResult, NOPTS_VALUE, Rational, Timestamp};

use crate::BitstreamFilter;

pub use skip_frame::{DUMMY_SLICE_QP, SkipFrameBuilder};
pub use skip_slice_table::{SkipSliceTable, global, install_global};

/// 日志 target
pub const LOG_TARGET: &str = "hengsu::constrate";

/// 单次最多插入的跳帧数, 超过视为流中断
pub const MAX_GAP_FRAMES: i64 = 1000;

/// 待输出的一串跳帧
#[derive(Debug, Clone, Copy, Default)]
struct SkipRun {
    remaining: i64,
    next_dts: i64,
    next_frame_num: u32,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Holding {
        packet: Packet,
        skips: SkipRun,
    },
    Adjusting {
        packet: Packet,
    },
    Releasing {
        packet: Packet,
    },
}

/// 一次状态转移的结果
enum Transition {
    /// 继续处理, 不产生输出
    Next(State),
    /// 产生一个输出数据包
    Emit(State, Packet),
}

/// H.264 恒定帧率过滤器
#[derive(Debug)]
pub struct ConstRateFilter {
    params: ParameterSets,
    builder: SkipFrameBuilder,
    time_base: Rational,
    /// 一帧的理想时长 (time_base 单位)
    duration: i64,
    label: String,
    state: State,
    last_dts: i64,
    last_frame_num: u32,
    /// 当前 GOP 内真实帧 frame_num 需要后移的量
    frame_num_adj: u32,
}

impl ConstRateFilter {
    /// 创建过滤器, CABAC 码流的跳帧模板取自进程级全局表
    pub fn new(
        codec: &CodecParameters,
        time_base: Rational,
        frame_rate: Rational,
    ) -> HengsuResult<Self> {
        Self::with_templates(codec, time_base, frame_rate, global())
    }

    /// 使用指定的跳帧模板表创建过滤器
    pub fn with_templates(
        codec: &CodecParameters,
        time_base: Rational,
        frame_rate: Rational,
        templates: &SkipSliceTable,
    ) -> HengsuResult<Self> {
        let stream = validate::validate(codec, time_base, frame_rate, templates)?;
        let filter = Self {
            params: stream.params,
            builder: stream.builder,
            time_base,
            duration: stream.duration,
            label: "h264_constrate".into(),
            state: State::Idle,
            last_dts: NOPTS_VALUE,
            last_frame_num: 0,
            frame_num_adj: 0,
        };
        log::info!(
            target: LOG_TARGET,
            "[{}] 创建: 帧率 {}, 时间基 {}, 帧时长 {}, 封装 {}",
            filter.label,
            frame_rate,
            time_base,
            filter.duration,
            filter.params.framing()
        );
        Ok(filter)
    }

    /// 设置日志中使用的实例标签
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// 实例标签
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 一帧的理想时长 (time_base 单位)
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// 输入输出的 NAL 封装方式
    pub fn framing(&self) -> NalFraming {
        self.params.framing()
    }

    /// 当前的 frame_num 后移量
    pub fn frame_num_adjustment(&self) -> u32 {
        self.frame_num_adj
    }

    /// 是否没有缓存的数据包
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// 送入一个数据包, 上一个数据包的输出未取空时返回 [`HengsuError::InvalidState`]
    pub fn send_packet(&mut self, packet: Packet) -> HengsuResult<()> {
        if !self.is_idle() {
            return Err(HengsuError::InvalidState(format!(
                "[{}] 上一个数据包的输出尚未取空",
                self.label
            )));
        }

        let mut skips = SkipRun::default();
        if self.last_dts != NOPTS_VALUE && packet.dts != NOPTS_VALUE {
            let expected = self.last_dts.saturating_add(self.duration);
            let gap = packet
                .dts
                .saturating_sub(expected)
                .saturating_add(self.duration / 2)
                / self.duration;
            if gap > MAX_GAP_FRAMES {
                log::warn!(
                    target: LOG_TARGET,
                    "[{}] 时间戳跳变 {} 帧 ({} -> {}), 视为流中断, 不插入跳帧",
                    self.label,
                    gap,
                    Timestamp::new(expected, self.time_base),
                    Timestamp::new(packet.dts, self.time_base)
                );
            } else if gap > 0 {
                skips = SkipRun {
                    remaining: gap,
                    next_dts: expected,
                    next_frame_num: self.last_frame_num.wrapping_add(1),
                };
                self.frame_num_adj = self.frame_num_adj.wrapping_add(gap as u32);
                log::debug!(
                    target: LOG_TARGET,
                    "[{}] 缺失 {} 帧, 从 dts={} frame_num={} 开始插入跳帧, 后移量 {}",
                    self.label,
                    gap,
                    expected,
                    skips.next_frame_num,
                    self.frame_num_adj
                );
            }
        }

        self.last_dts = packet.dts;
        self.state = State::Holding { packet, skips };
        Ok(())
    }

    /// 取出一个输出数据包, 没有更多输出时返回 [`HengsuError::NeedMoreData`]
    ///
    /// 出错时缓存的数据包被丢弃, 过滤器回到空闲状态.
    pub fn receive_packet(&mut self) -> HengsuResult<Packet> {
        let mut state = mem::take(&mut self.state);
        loop {
            match self.step(state)? {
                Transition::Next(next) => state = next,
                Transition::Emit(next, packet) => {
                    self.state = next;
                    return Ok(packet);
                }
            }
        }
    }

    fn step(&mut self, state: State) -> HengsuResult<Transition> {
        match state {
            State::Idle => Err(HengsuError::NeedMoreData),
            State::Holding { packet, mut skips } if skips.remaining > 0 => {
                let skip = self.builder.build_packet(
                    skips.next_frame_num,
                    skips.next_dts,
                    self.duration,
                    self.time_base,
                    packet.stream_index,
                )?;
                log::debug!(
                    target: LOG_TARGET,
                    "[{}] 输出跳帧 dts={} frame_num={}",
                    self.label,
                    skips.next_dts,
                    skips.next_frame_num
                );
                skips.remaining -= 1;
                skips.next_dts = skips.next_dts.saturating_add(self.duration);
                skips.next_frame_num = skips.next_frame_num.wrapping_add(1);
                Ok(Transition::Emit(State::Holding { packet, skips }, skip))
            }
            State::Holding { packet, .. } => Ok(Transition::Next(if self.frame_num_adj > 0 {
                State::Adjusting { packet }
            } else {
                State::Releasing { packet }
            })),
            State::Adjusting { packet } => self.adjust(packet),
            State::Releasing { packet } => {
                self.last_frame_num = if packet.is_keyframe() {
                    0
                } else {
                    parse_frame_num(&packet.data, &self.params)?
                };
                Ok(Transition::Emit(State::Idle, packet))
            }
        }
    }

    /// 改写 frame_num, 遇到 GOP 边界时清零后移量
    fn adjust(&mut self, mut packet: Packet) -> HengsuResult<Transition> {
        if packet.is_keyframe() {
            self.reset_adjustment();
            return Ok(Transition::Next(State::Releasing { packet }));
        }

        let mut data = packet.data.to_vec();
        match patch_frame_num(&mut data, &self.params, self.frame_num_adj)? {
            PatchOutcome::EndOfGop => {
                log::debug!(
                    target: LOG_TARGET,
                    "[{}] 未标记关键帧的 IDR, 结束 frame_num 改写",
                    self.label
                );
                self.reset_adjustment();
            }
            PatchOutcome::Patched(frame_num) => {
                self.last_frame_num = frame_num;
                packet.data = Bytes::from(data);
            }
        }
        Ok(Transition::Emit(State::Idle, packet))
    }

    fn reset_adjustment(&mut self) {
        self.frame_num_adj = 0;
        self.last_frame_num = 0;
    }
}

impl Drop for ConstRateFilter {
    fn drop(&mut self) {
        log::debug!(
            target: LOG_TARGET,
            "[{}] 释放, 剩余后移量 {}",
            self.label,
            self.frame_num_adj
        );
    }
}

impl BitstreamFilter for ConstRateFilter {
    fn name(&self) -> &str {
        "h264_constrate"
    }

    fn send_packet(&mut self, packet: Packet) -> HengsuResult<()> {
        ConstRateFilter::send_packet(self, packet)
    }

    fn receive_packet(&mut self) -> HengsuResult<Packet> {
        ConstRateFilter::receive_packet(self)
    }
}
