//! 时间基与帧率使用的有理数 (对标 `AVRational`).

use std::fmt;
use std::str::FromStr;

use crate::{HengsuError, HengsuResult};

/// `num / den`, 如时间基 1/90000, 帧率 30000/1001
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// 分母为 0, 表示未设置
    pub const UNDEFINED: Self = Self::new(0, 0);
    /// 毫秒时间基
    pub const MILLI: Self = Self::new(1, 1_000);

    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    pub const fn is_valid(&self) -> bool {
        self.den != 0
    }

    /// 帧率可用: 分子分母都非零
    pub const fn is_non_zero(&self) -> bool {
        self.num != 0 && self.den != 0
    }

    /// 分母为 0 时得 NaN
    pub fn to_f64(self) -> f64 {
        match self.den {
            0 => f64::NAN,
            den => f64::from(self.num) / f64::from(den),
        }
    }

    /// 倒数: 帧率 -> 帧间隔
    pub const fn invert(self) -> Self {
        Self::new(self.den, self.num)
    }
}

/// 将 `a` 从时间基 `bq` 换算到时间基 `cq`, 结果四舍五入 (0.5 远离零)
///
/// 计算 `a * bq / cq`, 中间值使用 i128 避免溢出. 任一时间基无效时返回 `None`.
pub fn rescale_q(a: i64, bq: Rational, cq: Rational) -> Option<i64> {
    let num = i128::from(a) * i128::from(bq.num) * i128::from(cq.den);
    let den = i128::from(bq.den) * i128::from(cq.num);
    if den == 0 {
        return None;
    }
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let half = den / 2;
    let rounded = if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    };
    i64::try_from(rounded).ok()
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Rational {
    type Err = HengsuError;

    /// 解析 `"30000/1001"` 或整数形式 `"25"`
    fn from_str(s: &str) -> HengsuResult<Self> {
        let parse = |part: &str| {
            part.trim().parse::<i32>().map_err(|_| {
                HengsuError::InvalidArgument(format!("无法解析有理数: \"{}\"", s))
            })
        };
        match s.split_once('/') {
            Some((num, den)) => Ok(Self::new(parse(num)?, parse(den)?)),
            None => Ok(Self::new(parse(s)?, 1)),
        }
    }
}
