//! 基于时间基的时间戳.
//!
//! 输出缓冲的呈现时间与时长都以 `Timestamp` 表达, 保持有理数精度,
//! 由接收方决定何时转换为浮点秒.

use crate::rational::Rational;
use std::fmt;

/// 表示"未定义"的时间戳值
pub const NOPTS_VALUE: i64 = i64::MIN;

/// 时间戳: 实际秒数 = pts * time_base.num / time_base.den
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// 刻度值, `NOPTS_VALUE` 表示未定义
    pub pts: i64,
    /// 时间基
    pub time_base: Rational,
}

impl Timestamp {
    pub const fn new(pts: i64, time_base: Rational) -> Self {
        Self { pts, time_base }
    }

    /// 未定义的时间戳
    pub const fn none() -> Self {
        Self {
            pts: NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
        }
    }

    /// pts 已定义且时间基有效
    pub const fn is_valid(&self) -> bool {
        self.pts != NOPTS_VALUE && self.time_base.is_valid()
    }

    /// 转换为秒, 无效时间戳返回 `f64::NAN`
    pub fn to_seconds(&self) -> f64 {
        if !self.is_valid() {
            return f64::NAN;
        }
        self.pts as f64 * self.time_base.to_f64()
    }

    /// 截断方式重缩放到新的时间基
    ///
    /// new_pts = pts * old.num * new.den / (old.den * new.num), 全程 i128 运算.
    pub fn rescale(&self, new_time_base: Rational) -> Self {
        self.rescale_with(new_time_base, |num, den| num / den)
    }

    /// 四舍五入 (远离零) 方式重缩放到新的时间基
    pub fn rescale_rounded(&self, new_time_base: Rational) -> Self {
        self.rescale_with(new_time_base, |num, den| {
            let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
            if num >= 0 {
                (num + den / 2) / den
            } else {
                (num - den / 2) / den
            }
        })
    }

    fn rescale_with(&self, new_time_base: Rational, div: impl Fn(i128, i128) -> i128) -> Self {
        if !self.is_valid() || !new_time_base.is_valid() {
            return Self::none();
        }
        let num = self.pts as i128 * i128::from(self.time_base.num) * i128::from(new_time_base.den);
        let den = i128::from(self.time_base.den) * i128::from(new_time_base.num);
        if den == 0 {
            return Self::none();
        }
        match i64::try_from(div(num, den)) {
            Ok(pts) if pts != NOPTS_VALUE => Self {
                pts,
                time_base: new_time_base,
            },
            _ => Self::none(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            write!(f, "NOPTS")
        } else {
            write!(f, "{:.6}s", self.to_seconds())
        }
    }
}
