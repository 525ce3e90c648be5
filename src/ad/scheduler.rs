// src/ad/scheduler.rs

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{AdError, AdResult};

pub const DEFAULT_AUTO_REFRESH_INTERVAL: f64 = 30.0;
pub const MINIMUM_AUTO_REFRESH_INTERVAL: f64 = 15.0;

/// 自动刷新间隔（秒），0 表示关闭
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshInterval(f64);

impl RefreshInterval {
    pub const DISABLED: RefreshInterval = RefreshInterval(0.0);

    /// 0 关闭刷新；(0, 15) 提升到 15；负数和非有限值直接拒绝
    pub fn new(seconds: f64) -> AdResult<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(AdError::InvalidRefreshInterval(seconds));
        }
        if seconds == 0.0 {
            return Ok(Self::DISABLED);
        }
        if seconds < MINIMUM_AUTO_REFRESH_INTERVAL {
            warn!(
                requested = seconds,
                minimum = MINIMUM_AUTO_REFRESH_INTERVAL,
                "auto refresh interval below minimum, clamping"
            );
            return Ok(Self(MINIMUM_AUTO_REFRESH_INTERVAL));
        }
        Ok(Self(seconds))
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }

    pub fn is_disabled(&self) -> bool {
        self.0 == 0.0
    }

    pub fn as_duration(&self) -> Option<Duration> {
        if self.is_disabled() {
            None
        } else {
            Some(Duration::from_secs_f64(self.0))
        }
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        Self(DEFAULT_AUTO_REFRESH_INTERVAL)
    }
}

/// 已经布置好的单次定时器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTimer {
    pub token: u64,
    pub delay: Duration,
}

/// **自动刷新调度器**
///
/// 只负责决定 "什么时候" 刷新，真正的计时由运行时完成。
/// 同一时间最多只有一个待触发的定时器，被取消或被替换的定时器触发时会被忽略。
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    interval: RefreshInterval,
    pending: Option<u64>,
    next_token: u64,
}

impl RefreshScheduler {
    pub fn new(interval: RefreshInterval) -> Self {
        Self {
            interval,
            pending: None,
            next_token: 0,
        }
    }

    pub fn interval(&self) -> RefreshInterval {
        self.interval
    }

    /// 只影响下一次 `arm`，已经布置的定时器保持不变
    pub fn set_interval(&mut self, seconds: f64) -> AdResult<RefreshInterval> {
        self.interval = RefreshInterval::new(seconds)?;
        Ok(self.interval)
    }

    pub fn arm(&mut self) -> Option<RefreshTimer> {
        let delay = self.interval.as_duration()?;
        self.next_token += 1;
        self.pending = Some(self.next_token);
        debug!(token = self.next_token, delay_secs = delay.as_secs_f64(), "auto refresh armed");
        Some(RefreshTimer {
            token: self.next_token,
            delay,
        })
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// 定时器触发：只有当前待触发的那个才算数
    pub fn take_fired(&mut self, token: u64) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            debug!(token, "ignoring stale refresh timer");
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_interval_is_thirty_seconds() {
        let scheduler = RefreshScheduler::default();
        assert_eq!(scheduler.interval().as_secs_f64(), DEFAULT_AUTO_REFRESH_INTERVAL);
    }

    #[test]
    fn zero_disables_arming() {
        let mut scheduler = RefreshScheduler::new(RefreshInterval::new(0.0).unwrap());
        assert!(scheduler.arm().is_none());
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn rejected_interval_keeps_previous_value() {
        let mut scheduler = RefreshScheduler::default();
        scheduler.set_interval(45.0).unwrap();
        assert_eq!(scheduler.set_interval(-1.0), Err(AdError::InvalidRefreshInterval(-1.0)));
        assert!(scheduler.set_interval(f64::INFINITY).is_err());
        assert_eq!(scheduler.interval().as_secs_f64(), 45.0);
    }

    #[test]
    fn rearming_fences_older_timer() {
        let mut scheduler = RefreshScheduler::default();
        let first = scheduler.arm().unwrap();
        let second = scheduler.arm().unwrap();
        assert!(!scheduler.take_fired(first.token));
        assert!(scheduler.take_fired(second.token));
        assert!(!scheduler.take_fired(second.token));
    }

    #[test]
    fn interval_change_does_not_touch_pending_timer() {
        let mut scheduler = RefreshScheduler::default();
        let timer = scheduler.arm().unwrap();
        scheduler.set_interval(60.0).unwrap();
        assert!(scheduler.is_armed());
        assert_eq!(timer.delay, Duration::from_secs(30));
        assert!(scheduler.take_fired(timer.token));
        assert_eq!(scheduler.arm().unwrap().delay, Duration::from_secs(60));
    }

    proptest! {
        #[test]
        fn values_below_minimum_clamp_to_minimum(seconds in 0.0001f64..15.0) {
            let interval = RefreshInterval::new(seconds).unwrap();
            prop_assert_eq!(interval.as_secs_f64(), MINIMUM_AUTO_REFRESH_INTERVAL);
        }

        #[test]
        fn values_at_or_above_minimum_are_kept(seconds in 15.0f64..86_400.0) {
            prop_assert_eq!(RefreshInterval::new(seconds).unwrap().as_secs_f64(), seconds);
        }

        #[test]
        fn negative_values_are_rejected(seconds in -86_400.0f64..-0.0001) {
            prop_assert!(RefreshInterval::new(seconds).is_err());
        }
    }
}
