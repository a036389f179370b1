use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Inclusive calendar window `[end - days, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn ending_on(end: NaiveDate, days: u32) -> anyhow::Result<Self> {
        anyhow::ensure!(days >= 1, "lookback window must be at least 1 day (got {days})");
        Ok(Self {
            start: end - Duration::days(i64::from(days)),
            end,
        })
    }

    pub fn ending_today(days: u32) -> anyhow::Result<Self> {
        Self::ending_on(chrono::Local::now().date_naive(), days)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }

    /// Unix seconds of the window start at 00:00 UTC.
    pub fn period1(&self) -> i64 {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
    }

    /// Unix seconds of the window end, capped at `now` so the provider never sees a future bound.
    pub fn period2(&self, now: DateTime<Utc>) -> i64 {
        let end_of_day = self
            .end
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_else(|| now.timestamp());
        end_of_day.min(now.timestamp()).max(self.period1())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn window_spans_days_back_from_end() {
        let w = FetchWindow::ending_on(d(2026, 3, 10), 10).unwrap();
        assert_eq!(w.start, d(2026, 2, 28));
        assert!(w.contains(d(2026, 2, 28)));
        assert!(w.contains(d(2026, 3, 10)));
        assert!(!w.contains(d(2026, 3, 11)));
        assert!(!w.contains(d(2026, 2, 27)));
    }

    #[test]
    fn rejects_zero_days() {
        assert!(FetchWindow::ending_on(d(2026, 3, 10), 0).is_err());
    }

    #[test]
    fn period_bounds_are_utc_seconds() {
        let w = FetchWindow::ending_on(d(2026, 1, 5), 1).unwrap();
        assert_eq!(w.period1(), Utc.with_ymd_and_hms(2026, 1, 4, 0, 0, 0).unwrap().timestamp());

        let now = Utc.with_ymd_and_hms(2026, 1, 5, 15, 0, 0).unwrap();
        assert_eq!(w.period2(now), now.timestamp());

        let later = Utc.with_ymd_and_hms(2026, 1, 7, 0, 0, 0).unwrap();
        assert_eq!(
            w.period2(later),
            Utc.with_ymd_and_hms(2026, 1, 5, 23, 59, 59).unwrap().timestamp()
        );
    }
}
