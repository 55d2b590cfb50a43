//! 视频时间戳纪律.
//!
//! 硬件表面显示队列要求呈现时间单调不减. 出现回退视为流不连续
//! (例如插入的片段结束后编码参数切换), 由调用方终止本次运行.

use liu_core::{LiuError, LiuResult};

/// 单调时间戳守卫
#[derive(Debug, Clone)]
pub struct PtsGuard {
    last_pts: i64,
}

impl PtsGuard {
    pub fn new() -> Self {
        Self { last_pts: i64::MIN }
    }

    /// 检查并接受一个 pts
    ///
    /// `pts < last_pts` 时返回 `StreamDiscontinuity`, 且不更新状态;
    /// 相等的 pts 视为合法.
    pub fn check(&mut self, pts: i64) -> LiuResult<()> {
        if pts < self.last_pts {
            return Err(LiuError::StreamDiscontinuity {
                previous: self.last_pts,
                current: pts,
            });
        }
        self.last_pts = pts;
        Ok(())
    }

    /// 最近一次接受的 pts, 尚未接受任何帧时为 `None`
    pub fn last_pts(&self) -> Option<i64> {
        (self.last_pts != i64::MIN).then_some(self.last_pts)
    }

    pub fn reset(&mut self) {
        self.last_pts = i64::MIN;
    }
}

impl Default for PtsGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_单调序列全部接受() {
        let mut guard = PtsGuard::new();
        for pts in [-3000, 0, 0, 3000, 6000] {
            assert!(guard.check(pts).is_ok());
        }
        assert_eq!(guard.last_pts(), Some(6000));
    }

    #[test]
    fn test_回退触发不连续() {
        let mut guard = PtsGuard::new();
        guard.check(9000).unwrap();
        let err = guard.check(3000).unwrap_err();
        assert!(matches!(
            err,
            LiuError::StreamDiscontinuity {
                previous: 9000,
                current: 3000
            }
        ));
        // 被拒绝的 pts 不会覆盖状态
        assert_eq!(guard.last_pts(), Some(9000));
    }

    #[test]
    fn test_重置后重新开始() {
        let mut guard = PtsGuard::new();
        guard.check(100).unwrap();
        guard.reset();
        assert_eq!(guard.last_pts(), None);
        assert!(guard.check(1).is_ok());
    }
}
