use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// OCR.space 免费额度
pub const DAILY_LIMIT: u64 = 500;
pub const MONTHLY_LIMIT: u64 = 25_000;
pub const YEARLY_LIMIT: u64 = 300_000;

/// OCR 调用量统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub daily_count: u64,
    pub monthly_count: u64,
    pub yearly_count: u64,
    pub total_count: u64,
    pub daily_limit: u64,
    pub monthly_limit: u64,
    pub yearly_limit: u64,
    pub last_daily_reset: DateTime<Utc>,
    pub last_monthly_reset: DateTime<Utc>,
    pub last_yearly_reset: DateTime<Utc>,
}

impl UsageStats {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            daily_count: 0,
            monthly_count: 0,
            yearly_count: 0,
            total_count: 0,
            daily_limit: DAILY_LIMIT,
            monthly_limit: MONTHLY_LIMIT,
            yearly_limit: YEARLY_LIMIT,
            last_daily_reset: now,
            last_monthly_reset: now,
            last_yearly_reset: now,
        }
    }

    /// 跨日/跨月/跨年时清零对应计数 (total 不清零)
    pub fn roll_over(&mut self, now: DateTime<Utc>) {
        if now.date_naive() != self.last_daily_reset.date_naive() {
            self.daily_count = 0;
            self.last_daily_reset = now;
        }
        if now.month() != self.last_monthly_reset.month() || now.year() != self.last_monthly_reset.year() {
            self.monthly_count = 0;
            self.last_monthly_reset = now;
        }
        if now.year() != self.last_yearly_reset.year() {
            self.yearly_count = 0;
            self.last_yearly_reset = now;
        }
    }

    pub fn record_call(&mut self) {
        self.daily_count += 1;
        self.monthly_count += 1;
        self.yearly_count += 1;
        self.total_count += 1;
    }

    /// 任一额度用尽
    pub fn is_exhausted(&self) -> bool {
        self.daily_count >= self.daily_limit
            || self.monthly_count >= self.monthly_limit
            || self.yearly_count >= self.yearly_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn roll_over_resets_only_changed_periods() {
        let mut stats = UsageStats::new(at(2024, 3, 10));
        stats.record_call();
        stats.record_call();

        stats.roll_over(at(2024, 3, 11));
        assert_eq!(stats.daily_count, 0);
        assert_eq!(stats.monthly_count, 2);
        assert_eq!(stats.yearly_count, 2);

        stats.roll_over(at(2024, 4, 1));
        assert_eq!(stats.monthly_count, 0);
        assert_eq!(stats.yearly_count, 2);

        stats.roll_over(at(2025, 1, 1));
        assert_eq!(stats.yearly_count, 0);
        assert_eq!(stats.total_count, 2);
    }

    #[test]
    fn same_month_in_another_year_resets_monthly() {
        let mut stats = UsageStats::new(at(2024, 5, 1));
        stats.record_call();
        stats.roll_over(at(2025, 5, 1));
        assert_eq!(stats.monthly_count, 0);
    }

    #[test]
    fn exhausted_when_daily_limit_reached() {
        let mut stats = UsageStats::new(at(2024, 3, 10));
        stats.daily_count = DAILY_LIMIT - 1;
        assert!(!stats.is_exhausted());
        stats.record_call();
        assert!(stats.is_exhausted());
    }
}
