//! 有理数, 用于流时间基与帧率.

use std::fmt;

/// 有理数 `num / den`
///
/// 时间基 1/90000 表示 90kHz 时钟, 帧率 30000/1001 表示 29.97fps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// 分子
    pub num: i32,
    /// 分母
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 零值
    pub const ZERO: Self = Self { num: 0, den: 1 };

    /// 未定义 (分母为 0)
    pub const UNDEFINED: Self = Self { num: 0, den: 0 };

    /// 纳秒时间基 (1/1_000_000_000), 视频帧时长统一用它表达
    pub const NANO: Self = Self {
        num: 1,
        den: 1_000_000_000,
    };

    /// 以采样率为刻度的时间基 `1/sample_rate`
    ///
    /// 采样率超出 `i32` 范围时返回 [`Rational::UNDEFINED`].
    pub fn per_sample(sample_rate: u32) -> Self {
        match i32::try_from(sample_rate) {
            Ok(den) if den > 0 => Self { num: 1, den },
            _ => Self::UNDEFINED,
        }
    }

    /// 分母不为 0
    pub const fn is_valid(&self) -> bool {
        self.den != 0
    }

    /// 转换为 f64, 分母为 0 时返回 `f64::NAN`
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return f64::NAN;
        }
        f64::from(self.num) / f64::from(self.den)
    }

    /// 求倒数 (帧率 <-> 帧周期)
    pub const fn invert(self) -> Self {
        Self {
            num: self.den,
            den: self.num,
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self { num, den }
    }
}
