//! Clock utilities

use chrono::{Local, NaiveDate};

/// Today's date on the caller's local clock
///
/// Reporting periods follow the wall calendar of whoever fills in the
/// questionnaire, not UTC.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Convert seconds to duration
pub fn secs_to_duration(secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use std::time::Duration;

    #[tokio::test]
    async fn test_local_today_is_stable_across_short_sleep() {
        let before = local_today();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let after = local_today();
        // Equal unless the test straddles midnight
        assert!(after >= before);
    }

    #[test]
    fn test_local_today_is_plausible() {
        let today = local_today();
        assert!(today.year() >= 2000);
        assert!((1..=12).contains(&today.month()));
    }

    #[test]
    fn test_secs_to_duration() {
        assert_eq!(secs_to_duration(0), Duration::ZERO);
        assert_eq!(secs_to_duration(30), Duration::from_millis(30_000));
        assert_eq!(secs_to_duration(3600).as_secs(), 3600);
    }
}
