//! 带时间基的时间戳, 主要用于日志中显示 DTS/PTS.

use std::fmt;

use crate::rational::Rational;

/// 未设置的时间戳 (对标 `AV_NOPTS_VALUE`)
pub const NOPTS_VALUE: i64 = i64::MIN;

/// 时间点 = `value * time_base` 秒
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub value: i64,
    pub time_base: Rational,
}

impl Timestamp {
    pub const fn new(value: i64, time_base: Rational) -> Self {
        Self { value, time_base }
    }

    /// 值已设置且时间基可用
    pub const fn is_valid(&self) -> bool {
        self.value != NOPTS_VALUE && self.time_base.is_valid()
    }

    /// 秒数; 无效时为 NaN
    pub fn seconds(&self) -> f64 {
        match self.is_valid() {
            true => self.value as f64 * self.time_base.to_f64(),
            false => f64::NAN,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{} ({:.3}s)", self.value, self.seconds())
        } else {
            f.write_str("NOPTS")
        }
    }
}
