//! Daily-limit aggregation
//!
//! A wallet may move at most a configured amount per calendar day per
//! outflow kind, counting only SUCCESS entries. The window is the UTC
//! calendar day: inclusive at 00:00, exclusive at the next 00:00. The
//! aggregation query itself runs inside the same commit scope as the
//! mutation it gates (see `StoreTx::sum_success_amount`), so two
//! concurrent outflows cannot both read a stale total and both pass.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::EntryKind;

/// One UTC calendar day: `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The window containing the current instant
    pub fn current() -> Self {
        Self::containing(Utc::now())
    }

    /// The window containing `at`
    pub fn containing(at: DateTime<Utc>) -> Self {
        let start = at
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time")
            .and_utc();
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// Human label for the limit that tripped, surfaced in the error message
pub fn limit_label(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Withdraw => "withdraw",
        EntryKind::TransferOut => "transfer",
        EntryKind::Deposit | EntryKind::TransferIn => "outflow",
    }
}

/// Reject the operation if `daily_total + amount` would exceed the
/// ceiling. Equality is allowed: the ceiling itself may be reached.
pub fn check_daily_ceiling(
    kind: EntryKind,
    daily_total: Decimal,
    amount: Decimal,
    ceiling: Decimal,
) -> Result<()> {
    if daily_total + amount > ceiling {
        return Err(Error::DailyLimitExceeded(limit_label(kind)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_is_inclusive_start_exclusive_end() {
        let noon = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let window = DayWindow::containing(noon);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap());

        assert!(window.contains(window.start));
        assert!(window.contains(window.end - Duration::microseconds(1)));
        assert!(!window.contains(window.end));
        assert!(!window.contains(window.start - Duration::microseconds(1)));
    }

    #[test]
    fn test_ceiling_allows_exact_limit() {
        let ceiling = Decimal::new(10000, 2); // 100.00
        let total = Decimal::new(8000, 2); // 80.00

        // 80 + 20 == 100: allowed
        assert!(check_daily_ceiling(
            EntryKind::Withdraw,
            total,
            Decimal::new(2000, 2),
            ceiling
        )
        .is_ok());

        // 80 + 20.01 > 100: rejected
        let err = check_daily_ceiling(
            EntryKind::Withdraw,
            total,
            Decimal::new(2001, 2),
            ceiling,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DailyLimitExceeded("withdraw")));
    }

    #[test]
    fn test_transfer_limit_label() {
        let err = check_daily_ceiling(
            EntryKind::TransferOut,
            Decimal::new(8000, 2),
            Decimal::new(2100, 2),
            Decimal::new(10000, 2),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Daily transfer limit exceeded");
    }
}
