//! 滑动窗口码率计算.
//!
//! 记录最近 [`WINDOW_ENTRIES`] 个数据块的大小与间隔, 用窗口内总字节数
//! 除以窗口时长 (再加上距最后一个数据块的时间) 估算当前码率.

/// 窗口保存的数据块个数
pub const WINDOW_ENTRIES: usize = 200;

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    size: u64,
    time_diff_ms: i64,
}

/// 码率计算器
#[derive(Debug, Clone)]
pub struct BitrateCalculator {
    entries: Vec<Entry>,
    index: usize,
    overflowed: bool,
    total_size: u64,
    window_ms: i64,
    prev_time: Option<i64>,
}

impl BitrateCalculator {
    pub fn new() -> Self {
        Self {
            entries: vec![Entry::default(); WINDOW_ENTRIES],
            index: 0,
            overflowed: false,
            total_size: 0,
            window_ms: 0,
            prev_time: None,
        }
    }

    /// 记录一个 `size` 字节的数据块, `now` 为微秒时间戳
    ///
    /// 第一次调用只记录起始时间, 不计入数据量.
    pub fn record(&mut self, size: usize, now: i64) {
        if let Some(prev) = self.prev_time {
            let time_diff_ms = (now - prev) / 1000;
            if self.overflowed {
                let oldest = self.entries[self.index];
                self.total_size -= oldest.size;
                self.window_ms -= oldest.time_diff_ms;
            }
            self.total_size += size as u64;
            self.window_ms += time_diff_ms;
            self.entries[self.index] = Entry {
                size: size as u64,
                time_diff_ms,
            };
            self.index += 1;
            if self.index >= WINDOW_ENTRIES {
                self.index = 0;
                self.overflowed = true;
            }
        }
        self.prev_time = Some(now);
    }

    /// 截至 `now` (微秒) 的码率 (bit/s)
    pub fn bitrate(&self, now: i64) -> u64 {
        let Some(prev) = self.prev_time else {
            return 0;
        };
        if self.total_size == 0 {
            return 0;
        }
        let elapsed_ms = (now - prev) / 1000 + self.window_ms;
        if elapsed_ms <= 0 {
            return 0;
        }
        self.total_size * 1000 * 8 / elapsed_ms as u64
    }

    /// 窗口内的总字节数
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// 窗口覆盖的时长 (毫秒)
    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// 窗口是否已经回绕
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }
}

impl Default for BitrateCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_US: i64 = 100_000;

    #[test]
    fn test_首次记录只设置起点() {
        let mut calc = BitrateCalculator::new();
        assert_eq!(calc.bitrate(0), 0);
        calc.record(5000, 1_000);
        assert_eq!(calc.total_size(), 0);
        assert_eq!(calc.window_ms(), 0);
        assert!(!calc.is_overflowed());
        assert_eq!(calc.bitrate(2_000), 0);
    }

    #[test]
    fn test_单次间隔() {
        let mut calc = BitrateCalculator::new();
        calc.record(0, 0);
        calc.record(1000, STEP_US);
        assert_eq!(calc.window_ms(), 100);
        assert_eq!(calc.total_size(), 1000);
    }

    #[test]
    fn test_码率计算() {
        let mut calc = BitrateCalculator::new();
        let mut now = 1_700_000_000_000_000;
        calc.record(0, now);
        for _ in 0..10 {
            now += STEP_US;
            calc.record(1000, now);
        }
        // 10000 字节 / 1 秒
        assert_eq!(calc.bitrate(now), 80_000);
        // 空闲 1 秒后码率减半
        assert_eq!(calc.bitrate(now + 1_000_000), 40_000);
    }

    #[test]
    fn test_窗口回绕() {
        let mut calc = BitrateCalculator::new();
        let mut now = 0;
        calc.record(0, now);
        for _ in 0..WINDOW_ENTRIES + 50 {
            now += STEP_US / 100;
            calc.record(1000, now);
        }
        assert!(calc.is_overflowed());
        assert_eq!(calc.total_size(), WINDOW_ENTRIES as u64 * 1000);
        assert_eq!(calc.window_ms(), WINDOW_ENTRIES as i64);
        assert_eq!(calc.bitrate(now), 8_000_000);
    }
}
