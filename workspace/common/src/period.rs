use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies which month, quarter or year a tax return belongs to.
///
/// The textual form is the label stored alongside every tax return:
/// `"2025-03"` for a month, `"2025-Q1"` for a quarter and `"2025"` for a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year { year: i32 },
}

/// Error returned when a period label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsePeriodError {
    #[error("invalid period label '{0}'")]
    Malformed(String),
    #[error("month {0} is out of range 1-12")]
    MonthOutOfRange(u32),
    #[error("quarter {0} is out of range 1-4")]
    QuarterOutOfRange(u32),
}

impl Period {
    pub fn month(year: i32, month: u32) -> Self {
        Period::Month { year, month }
    }

    pub fn quarter(year: i32, quarter: u32) -> Self {
        Period::Quarter { year, quarter }
    }

    pub fn year(year: i32) -> Self {
        Period::Year { year }
    }

    /// Calendar year the period belongs to.
    pub fn calendar_year(&self) -> i32 {
        match *self {
            Period::Month { year, .. } | Period::Quarter { year, .. } | Period::Year { year } => {
                year
            }
        }
    }

    /// First day covered by the period.
    pub fn start_date(&self) -> Option<NaiveDate> {
        match *self {
            Period::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
            Period::Quarter { year, quarter } => {
                NaiveDate::from_ymd_opt(year, quarter.checked_sub(1)? * 3 + 1, 1)
            }
            Period::Year { year } => NaiveDate::from_ymd_opt(year, 1, 1),
        }
    }

    /// Last day covered by the period.
    pub fn end_date(&self) -> Option<NaiveDate> {
        let (year, last_month) = match *self {
            Period::Month { year, month } => (year, month),
            Period::Quarter { year, quarter } => (year, quarter * 3),
            Period::Year { year } => (year, 12),
        };
        let first_of_next = if last_month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, last_month + 1, 1)?
        };
        first_of_next.pred_opt()
    }

    /// Whether the period contains the given date.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match (self.start_date(), self.end_date()) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => false,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Period::Quarter { year, quarter } => write!(f, "{:04}-Q{}", year, quarter),
            Period::Year { year } => write!(f, "{:04}", year),
        }
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParsePeriodError::Malformed(s.to_string());

        let (year_part, rest) = match s.split_once('-') {
            Some((year, rest)) => (year, Some(rest)),
            None => (s, None),
        };
        if year_part.len() != 4 {
            return Err(malformed());
        }
        let year: i32 = year_part.parse().map_err(|_| malformed())?;

        match rest {
            None => Ok(Period::Year { year }),
            Some(rest) => {
                if let Some(quarter) = rest.strip_prefix('Q') {
                    let quarter: u32 = quarter.parse().map_err(|_| malformed())?;
                    if !(1..=4).contains(&quarter) {
                        return Err(ParsePeriodError::QuarterOutOfRange(quarter));
                    }
                    Ok(Period::Quarter { year, quarter })
                } else {
                    if rest.len() != 2 {
                        return Err(malformed());
                    }
                    let month: u32 = rest.parse().map_err(|_| malformed())?;
                    if !(1..=12).contains(&month) {
                        return Err(ParsePeriodError::MonthOutOfRange(month));
                    }
                    Ok(Period::Month { year, month })
                }
            }
        }
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_the_stored_format() {
        assert_eq!(Period::month(2025, 3).to_string(), "2025-03");
        assert_eq!(Period::quarter(2025, 1).to_string(), "2025-Q1");
        assert_eq!(Period::year(2025).to_string(), "2025");
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!("2025-12".parse::<Period>(), Ok(Period::month(2025, 12)));
        assert_eq!("2024-Q4".parse::<Period>(), Ok(Period::quarter(2024, 4)));
        assert_eq!("2023".parse::<Period>(), Ok(Period::year(2023)));
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert_eq!(
            "2025-13".parse::<Period>(),
            Err(ParsePeriodError::MonthOutOfRange(13))
        );
        assert_eq!(
            "2025-Q5".parse::<Period>(),
            Err(ParsePeriodError::QuarterOutOfRange(5))
        );
        assert!("25-01".parse::<Period>().is_err());
        assert!("2025-1".parse::<Period>().is_err());
        assert!("2025-Qx".parse::<Period>().is_err());
    }

    #[test]
    fn quarter_bounds() {
        let q1 = Period::quarter(2024, 1);
        assert_eq!(q1.start_date(), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(q1.end_date(), NaiveDate::from_ymd_opt(2024, 3, 31));

        let q4 = Period::quarter(2024, 4);
        assert_eq!(q4.end_date(), NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn february_end_respects_leap_years() {
        assert_eq!(
            Period::month(2024, 2).end_date(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            Period::month(2025, 2).end_date(),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Period::quarter(2025, 2)).unwrap();
        assert_eq!(json, "\"2025-Q2\"");

        let parsed: Period = serde_json::from_str("\"2025-07\"").unwrap();
        assert_eq!(parsed, Period::month(2025, 7));
        assert!(Period::month(2025, 7).contains(NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()));
    }
}
