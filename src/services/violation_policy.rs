//! 违规判定 - 业务能力层
//!
//! 纯状态机：把原始违规事件转换为去抖后的计数和"是否终止"的决定，
//! 不依赖计时器和线程

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::ProctoringConfig;
use crate::models::ViolationReason;

/// 单次违规的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViolationDecision {
    /// 是否计入违规次数（冷却期内的不计入）
    pub counted: bool,
    /// 本次计入后是否达到上限
    pub threshold_reached: bool,
    /// 当前累计次数
    pub count: u32,
}

/// 违规判定策略
#[derive(Debug, Clone)]
pub struct ViolationPolicy {
    cooldown: Duration,
    max_violations: u32,
    count: u32,
    last_counted_at: Option<Instant>,
}

impl ViolationPolicy {
    pub fn new(cooldown: Duration, max_violations: u32) -> Self {
        Self {
            cooldown,
            max_violations,
            count: 0,
            last_counted_at: None,
        }
    }

    pub fn from_config(config: &ProctoringConfig) -> Self {
        Self::new(config.violation_cooldown, config.max_violations)
    }

    /// 记录一次违规
    ///
    /// 距上次计入不足冷却时间时只观察不计数
    pub fn record(&mut self, reason: ViolationReason, now: Instant) -> ViolationDecision {
        if let Some(last) = self.last_counted_at {
            if now.saturating_duration_since(last) < self.cooldown {
                debug!("违规处于冷却期内，不计数: {}", reason);
                return ViolationDecision {
                    counted: false,
                    threshold_reached: false,
                    count: self.count,
                };
            }
        }

        self.count += 1;
        self.last_counted_at = Some(now);

        ViolationDecision {
            counted: true,
            threshold_reached: self.count >= self.max_violations,
            count: self.count,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_violations(&self) -> u32 {
        self.max_violations
    }

    pub fn last_counted_at(&self) -> Option<Instant> {
        self.last_counted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(10);

    #[test]
    fn two_records_within_cooldown_count_once() {
        let mut policy = ViolationPolicy::new(COOLDOWN, 5);
        let t0 = Instant::now();

        let first = policy.record(ViolationReason::LookingAway, t0);
        let second = policy.record(ViolationReason::LookingAway, t0 + Duration::from_secs(3));

        assert!(first.counted);
        assert!(!second.counted);
        assert_eq!(policy.count(), 1);
        assert_eq!(policy.last_counted_at(), Some(t0));
    }

    #[test]
    fn records_spaced_beyond_cooldown_count_twice() {
        let mut policy = ViolationPolicy::new(COOLDOWN, 5);
        let t0 = Instant::now();

        policy.record(ViolationReason::ExitedFullscreen, t0);
        let second = policy.record(ViolationReason::ExitedFullscreen, t0 + Duration::from_secs(11));

        assert!(second.counted);
        assert_eq!(second.count, 2);
    }

    #[test]
    fn exactly_one_cooldown_apart_counts() {
        let mut policy = ViolationPolicy::new(COOLDOWN, 5);
        let t0 = Instant::now();

        policy.record(ViolationReason::LookingAway, t0);
        assert!(policy.record(ViolationReason::LookingAway, t0 + COOLDOWN).counted);
    }

    #[test]
    fn threshold_is_reached_on_the_last_counted_call_only() {
        let mut policy = ViolationPolicy::new(COOLDOWN, 5);
        let t0 = Instant::now();

        for i in 0..5u64 {
            let decision = policy.record(
                ViolationReason::LookingAway,
                t0 + Duration::from_secs(11 * i),
            );
            assert!(decision.counted);
            assert_eq!(decision.threshold_reached, i == 4, "call {}", i + 1);
        }
    }

    #[test]
    fn suppressed_record_never_reports_threshold() {
        let mut policy = ViolationPolicy::new(COOLDOWN, 1);
        let t0 = Instant::now();

        assert!(policy.record(ViolationReason::LookingAway, t0).threshold_reached);
        let repeat = policy.record(ViolationReason::LookingAway, t0 + Duration::from_secs(1));
        assert!(!repeat.counted);
        assert!(!repeat.threshold_reached);
    }
}
