//! 帧率/事件速率计数器.
//!
//! 在环形缓冲区中记录最近 N 个事件的微秒时间戳, 据此计算每秒事件数.
//! 计数器可在多个线程间共享, 内部用一把互斥锁保护缓冲区,
//! 锁只在一次入队或一次读取期间持有.

use crate::HengsuResult;
use crate::circular_buffer::CircularBuffer;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// 事件速率计数器
#[derive(Debug)]
pub struct RateCounter {
    ticks: Mutex<CircularBuffer>,
}

impl RateCounter {
    /// 创建窗口大小为 `window_size` 个事件的计数器
    pub fn new(window_size: usize) -> HengsuResult<Self> {
        Ok(Self {
            ticks: Mutex::new(CircularBuffer::new(window_size)?),
        })
    }

    /// 记录一个事件, `tick` 为微秒时间戳
    pub fn add_tick(&self, tick: i64) {
        self.lock().enqueue(tick);
    }

    /// 以当前系统时间记录一个事件
    pub fn add_tick_now(&self) {
        self.add_tick(now_micros());
    }

    /// 窗口内全部事件的平均速率 (次/秒)
    pub fn rate(&self) -> f64 {
        window_rate(&self.lock())
    }

    /// 最近 `interval` 微秒内的平均速率 (次/秒)
    ///
    /// 窗口覆盖的时间短于 `interval` 时退化为 [`rate`](Self::rate).
    pub fn rate_over(&self, interval: u64) -> f64 {
        let ticks = self.lock();
        let (Some(head), Some(tail)) = (ticks.head(), ticks.tail()) else {
            return 0.0;
        };
        let span = tail - head;
        if interval == 0 || span < 0 {
            return 0.0;
        }
        let interval = i64::try_from(interval).unwrap_or(i64::MAX);
        if span < interval {
            return window_rate(&ticks);
        }

        let threshold = tail - interval;
        let found = (0..ticks.len())
            .rev()
            .find_map(|pos| ticks.at(pos).filter(|&v| v <= threshold).map(|v| (pos, v)));
        match found {
            Some((pos, value)) => {
                let count = (ticks.len() - 1 - pos) as f64;
                let delta = (tail - value) as f64 / 1_000_000.0;
                if count == 0.0 || delta == 0.0 {
                    0.0
                } else {
                    count / delta
                }
            }
            None => 0.0,
        }
    }

    /// 清空已记录的事件
    pub fn reset(&self) {
        self.lock().reset();
    }

    fn lock(&self) -> MutexGuard<'_, CircularBuffer> {
        self.ticks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn window_rate(ticks: &CircularBuffer) -> f64 {
    let (Some(head), Some(tail)) = (ticks.head(), ticks.tail()) else {
        return 0.0;
    };
    let delta = (tail - head) as f64 / 1_000_000.0;
    if delta == 0.0 {
        return 0.0;
    }
    (ticks.len() - 1) as f64 / delta
}

/// 当前系统时间 (微秒)
pub fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}
