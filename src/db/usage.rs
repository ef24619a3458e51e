use crate::models::UsageStats;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// OCR 调用量计数器
#[derive(Debug, Clone)]
pub struct UsageTracker {
    stats: Arc<Mutex<UsageStats>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(UsageStats::new(Utc::now()))),
        }
    }

    /// 当前统计 (先按时间清零过期计数)
    pub fn stats(&self) -> UsageStats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> UsageStats {
        let mut stats = self.stats.lock();
        stats.roll_over(now);
        stats.clone()
    }

    /// 记录一次 OCR 调用
    pub fn increment(&self) -> UsageStats {
        self.increment_at(Utc::now())
    }

    pub fn increment_at(&self, now: DateTime<Utc>) -> UsageStats {
        let mut stats = self.stats.lock();
        stats.roll_over(now);
        stats.record_call();
        if stats.is_exhausted() {
            tracing::warn!(
                "OCR free quota exhausted: daily {}/{}, monthly {}/{}, yearly {}/{}",
                stats.daily_count, stats.daily_limit,
                stats.monthly_count, stats.monthly_limit,
                stats.yearly_count, stats.yearly_limit
            );
        }
        stats.clone()
    }

    pub fn reset(&self) -> UsageStats {
        let mut stats = self.stats.lock();
        *stats = UsageStats::new(Utc::now());
        stats.clone()
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn increment_counts_every_period() {
        let tracker = UsageTracker::new();
        tracker.increment();
        let stats = tracker.increment();
        assert_eq!(stats.daily_count, 2);
        assert_eq!(stats.monthly_count, 2);
        assert_eq!(stats.yearly_count, 2);
        assert_eq!(stats.total_count, 2);
    }

    #[test]
    fn next_day_starts_from_zero() {
        let tracker = UsageTracker::new();
        tracker.increment();
        let tomorrow = Utc::now() + Duration::days(1);
        let stats = tracker.increment_at(tomorrow);
        assert_eq!(stats.daily_count, 1);
        assert_eq!(stats.total_count, 2);
    }

    #[test]
    fn reset_clears_counts() {
        let tracker = UsageTracker::new();
        tracker.increment();
        let stats = tracker.reset();
        assert_eq!(stats.total_count, 0);
        assert_eq!(tracker.stats().daily_count, 0);
    }
}
