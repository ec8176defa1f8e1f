//! Reporting period keys
//!
//! A performa snapshot is keyed by its reporting period: `YYYY-MM` under a
//! monthly cadence, `YYYY` under a yearly one. Keys are pure values; the only
//! clock access is [`PeriodKey::current`].

use crate::error::{PerformaError, Result};
use chrono::{Datelike, NaiveDate};
use kop_common::Cadence;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Canonical reporting-period identifier
///
/// Ordering is chronological within one cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    year: u16,
    /// Present exactly when the cadence is monthly
    month: Option<u8>,
}

impl PeriodKey {
    /// Build a key from numeric parts
    ///
    /// Under [`Cadence::Monthly`] the month is required and must be 1-12.
    /// Under [`Cadence::Yearly`] any month argument is ignored.
    pub fn new(year: i32, month: Option<u32>, cadence: Cadence) -> Result<Self> {
        let year = u16::try_from(year)
            .ok()
            .filter(|y| *y <= 9999)
            .ok_or_else(|| {
                PerformaError::InvalidPeriod(format!("year {} is not a four-digit year", year))
            })?;

        match cadence {
            Cadence::Yearly => Ok(Self { year, month: None }),
            Cadence::Monthly => {
                let month = month.ok_or_else(|| {
                    PerformaError::InvalidPeriod("monthly period requires a month".to_string())
                })?;
                if !(1..=12).contains(&month) {
                    return Err(PerformaError::InvalidPeriod(format!(
                        "month {} is outside 1-12",
                        month
                    )));
                }
                Ok(Self {
                    year,
                    month: Some(month as u8),
                })
            }
        }
    }

    /// Parse a key that must match the cadence's pattern exactly
    ///
    /// Monthly keys are `YYYY-MM`, yearly keys are `YYYY`. Surrounding
    /// whitespace, other separators, and dates with a day part are rejected.
    pub fn parse(raw: &str, cadence: Cadence) -> Result<Self> {
        let invalid = || {
            PerformaError::InvalidPeriod(format!(
                "'{}' does not match the {} pattern {}",
                raw,
                cadence,
                pattern(cadence)
            ))
        };

        match cadence {
            Cadence::Yearly => {
                let year = parse_digits(raw, 4).ok_or_else(invalid)?;
                Self::new(year as i32, None, cadence)
            }
            Cadence::Monthly => {
                if raw.len() != 7 || raw.as_bytes()[4] != b'-' {
                    return Err(invalid());
                }
                let year = raw.get(..4).and_then(|s| parse_digits(s, 4)).ok_or_else(invalid)?;
                let month = raw.get(5..).and_then(|s| parse_digits(s, 2)).ok_or_else(invalid)?;
                Self::new(year as i32, Some(month), cadence)
            }
        }
    }

    /// Parse a key whose cadence is inferred from its shape
    pub fn parse_any(raw: &str) -> Result<Self> {
        match raw.len() {
            4 => Self::parse(raw, Cadence::Yearly),
            _ => Self::parse(raw, Cadence::Monthly),
        }
    }

    /// Parse a period as the backend stores it
    ///
    /// The backend may return `periode` as the bare key, as a date
    /// (`2024-05-01`) or as a timestamp (`2024-05-01T00:00:00.000000Z`).
    /// The leading key-shaped prefix is kept and the rest dropped.
    pub fn from_backend(raw: &str, cadence: Cadence) -> Result<Self> {
        let raw = raw.trim();
        let prefix_len = match cadence {
            Cadence::Monthly => 7,
            Cadence::Yearly => 4,
        };

        let prefix = raw.get(..prefix_len).ok_or_else(|| {
            PerformaError::InvalidPeriod(format!("'{}' is too short for a {} period", raw, cadence))
        })?;

        let rest = &raw[prefix_len..];
        if !rest.is_empty() && !rest.starts_with('-') && !rest.starts_with('T') {
            return Err(PerformaError::InvalidPeriod(format!(
                "'{}' does not start with a {} period",
                raw, cadence
            )));
        }

        Self::parse(prefix, cadence)
    }

    /// Key for "now" on the caller's local clock
    pub fn current(cadence: Cadence) -> Self {
        Self::current_at(kop_common::time::local_today(), cadence)
    }

    /// Key containing `date`
    pub fn current_at(date: NaiveDate, cadence: Cadence) -> Self {
        Self {
            year: date.year().clamp(0, 9999) as u16,
            month: match cadence {
                Cadence::Monthly => Some(date.month() as u8),
                Cadence::Yearly => None,
            },
        }
    }

    pub fn year(&self) -> i32 {
        i32::from(self.year)
    }

    /// Month 1-12 for monthly keys, `None` for yearly keys
    pub fn month(&self) -> Option<u32> {
        self.month.map(u32::from)
    }

    pub fn cadence(&self) -> Cadence {
        if self.month.is_some() {
            Cadence::Monthly
        } else {
            Cadence::Yearly
        }
    }

    /// Indonesian display label: `Mei 2024`, or `2024` for yearly keys
    pub fn label(&self) -> String {
        match self.month {
            Some(m) => format!("{} {}", MONTH_NAMES[usize::from(m) - 1], self.year),
            None => self.year.to_string(),
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(m) => write!(f, "{:04}-{:02}", self.year, m),
            None => write!(f, "{:04}", self.year),
        }
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PeriodKey::parse_any(&raw).map_err(serde::de::Error::custom)
    }
}

/// Format numeric parts as a period string
pub fn format_period(year: i32, month: Option<u32>, cadence: Cadence) -> Result<String> {
    PeriodKey::new(year, month, cadence).map(|key| key.to_string())
}

/// Periods a user may pick, newest first
///
/// Covers the year of `today` plus `years_back` earlier years. Under a monthly
/// cadence, months after `today` in the current year are skipped.
pub fn recent_periods(cadence: Cadence, today: NaiveDate, years_back: u32) -> Vec<PeriodKey> {
    let current = PeriodKey::current_at(today, cadence);
    let first_year = current.year().saturating_sub(years_back as i32).max(0);

    let mut periods = Vec::new();
    for year in (first_year..=current.year()).rev() {
        match cadence {
            Cadence::Yearly => periods.push(PeriodKey {
                year: year as u16,
                month: None,
            }),
            Cadence::Monthly => {
                let last_month = if year == current.year() {
                    today.month()
                } else {
                    12
                };
                for month in (1..=last_month).rev() {
                    periods.push(PeriodKey {
                        year: year as u16,
                        month: Some(month as u8),
                    });
                }
            }
        }
    }
    periods
}

fn pattern(cadence: Cadence) -> &'static str {
    match cadence {
        Cadence::Monthly => "YYYY-MM",
        Cadence::Yearly => "YYYY",
    }
}

/// Parse exactly `width` ASCII digits
fn parse_digits(s: &str, width: usize) -> Option<u32> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_round_trip() {
        for year in [1999, 2024, 2100] {
            for month in 1..=12 {
                let formatted = format_period(year, Some(month), Cadence::Monthly).unwrap();
                let key = PeriodKey::parse(&formatted, Cadence::Monthly).unwrap();
                assert_eq!((key.year(), key.month()), (year, Some(month)));
            }
        }
    }

    #[test]
    fn test_format_pads_month() {
        assert_eq!(format_period(2024, Some(5), Cadence::Monthly).unwrap(), "2024-05");
        assert_eq!(format_period(2024, Some(12), Cadence::Monthly).unwrap(), "2024-12");
    }

    #[test]
    fn test_format_rejects_month_out_of_range() {
        for month in [0, 13] {
            let result = format_period(2024, Some(month), Cadence::Monthly);
            assert!(matches!(result, Err(PerformaError::InvalidPeriod(_))));
        }
        assert!(matches!(
            format_period(2024, None, Cadence::Monthly),
            Err(PerformaError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_yearly_format_ignores_month() {
        assert_eq!(format_period(2024, Some(7), Cadence::Yearly).unwrap(), "2024");
        assert_eq!(format_period(2024, None, Cadence::Yearly).unwrap(), "2024");
    }

    #[test]
    fn test_year_out_of_range() {
        assert!(format_period(10_000, None, Cadence::Yearly).is_err());
        assert!(format_period(-1, Some(1), Cadence::Monthly).is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_monthly() {
        for raw in [
            "2024-5", "24-05", "2024/05", "2024-00", "2024-13", "abcd-01", " 2024-05", "2024-05-01",
            "2024", "", "２０２４-05",
        ] {
            assert!(
                matches!(PeriodKey::parse(raw, Cadence::Monthly), Err(PerformaError::InvalidPeriod(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_parse_rejects_malformed_yearly() {
        for raw in ["24", "20245", "2024-05", "20a4", ""] {
            assert!(PeriodKey::parse(raw, Cadence::Yearly).is_err(), "{:?}", raw);
        }
        let key = PeriodKey::parse("2023", Cadence::Yearly).unwrap();
        assert_eq!((key.year(), key.month()), (2023, None));
    }

    #[test]
    fn test_from_backend_truncates() {
        let key = PeriodKey::from_backend("2024-05-01T00:00:00.000000Z", Cadence::Monthly).unwrap();
        assert_eq!(key.to_string(), "2024-05");

        let key = PeriodKey::from_backend("2024-05-01", Cadence::Yearly).unwrap();
        assert_eq!(key.to_string(), "2024");

        let key = PeriodKey::from_backend("2024-05", Cadence::Monthly).unwrap();
        assert_eq!(key.to_string(), "2024-05");

        assert!(PeriodKey::from_backend("2024", Cadence::Monthly).is_err());
        assert!(PeriodKey::from_backend("20245", Cadence::Yearly).is_err());
    }

    #[test]
    fn test_current_at() {
        let key = PeriodKey::current_at(date(2024, 3, 31), Cadence::Monthly);
        assert_eq!(key.to_string(), "2024-03");

        let key = PeriodKey::current_at(date(2024, 3, 31), Cadence::Yearly);
        assert_eq!(key.to_string(), "2024");
        assert_eq!(key.cadence(), Cadence::Yearly);
    }

    #[test]
    fn test_current_matches_cadence() {
        assert_eq!(PeriodKey::current(Cadence::Monthly).cadence(), Cadence::Monthly);
        assert_eq!(PeriodKey::current(Cadence::Yearly).month(), None);
    }

    #[test]
    fn test_labels() {
        let key = PeriodKey::parse("2024-05", Cadence::Monthly).unwrap();
        assert_eq!(key.label(), "Mei 2024");
        let key = PeriodKey::parse("2024", Cadence::Yearly).unwrap();
        assert_eq!(key.label(), "2024");
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = PeriodKey::parse("2023-12", Cadence::Monthly).unwrap();
        let b = PeriodKey::parse("2024-01", Cadence::Monthly).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_serde_uses_string_form() {
        let key = PeriodKey::parse("2024-05", Cadence::Monthly).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2024-05\"");

        let back: PeriodKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<PeriodKey>("\"2024-5\"").is_err());
    }

    #[test]
    fn test_recent_periods_monthly() {
        let periods = recent_periods(Cadence::Monthly, date(2024, 3, 15), 2);

        // 3 months of 2024 + 12 of 2023 + 12 of 2022
        assert_eq!(periods.len(), 27);
        assert_eq!(periods.first().unwrap().to_string(), "2024-03");
        assert_eq!(periods[3].to_string(), "2023-12");
        assert_eq!(periods.last().unwrap().to_string(), "2022-01");
    }

    #[test]
    fn test_recent_periods_yearly() {
        let periods = recent_periods(Cadence::Yearly, date(2024, 3, 15), 2);
        let keys: Vec<String> = periods.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["2024", "2023", "2022"]);
    }
}
