//! Expansion of declaration settings into dated tax return drafts.
//!
//! The calculator is pure: it performs no I/O, and expanding the same
//! schedules for the same year always yields the same drafts.

use chrono::{NaiveDate, NaiveDateTime};
use common::Period;
use model::entities::{declaration_setting, declaration_type};
use std::str::FromStr;
use tracing::{debug, instrument, trace};

use crate::error::{ComputeError, Result};

/// Default number of months between quarter end and the quarterly deadline.
pub const DEFAULT_QUARTER_OFFSET: u32 = 1;

/// Default number of quarterly filings per year.
pub const DEFAULT_YEARLY_COUNT: u32 = 4;

/// How often a declaration recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(format!("Invalid frequency: {}", s)),
        }
    }
}

impl From<declaration_type::Frequency> for Frequency {
    fn from(frequency: declaration_type::Frequency) -> Self {
        match frequency {
            declaration_type::Frequency::Monthly => Frequency::Monthly,
            declaration_type::Frequency::Quarterly => Frequency::Quarterly,
            declaration_type::Frequency::Yearly => Frequency::Yearly,
        }
    }
}

impl From<Frequency> for declaration_type::Frequency {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::Monthly => declaration_type::Frequency::Monthly,
            Frequency::Quarterly => declaration_type::Frequency::Quarterly,
            Frequency::Yearly => declaration_type::Frequency::Yearly,
        }
    }
}

/// What to do when the due day does not exist in the due month
/// (e.g. day 31 in April).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayOverflow {
    /// Move the deadline to the last day of the month.
    #[default]
    Clamp,
    /// Fail with [`ComputeError::InvalidDueDay`].
    Reject,
}

impl FromStr for DayOverflow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clamp" => Ok(DayOverflow::Clamp),
            "reject" => Ok(DayOverflow::Reject),
            _ => Err(format!("Invalid due day overflow policy: {}", s)),
        }
    }
}

/// When and how often one declaration type is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationSchedule {
    pub declaration_type: String,
    pub frequency: Frequency,
    pub due_day: u32,
    pub due_hour: u32,
    pub due_minute: u32,
    /// Month of a yearly deadline. Has no built-in default.
    pub due_month: Option<u32>,
    /// Months after quarter end; defaults to [`DEFAULT_QUARTER_OFFSET`].
    pub quarter_offset: Option<u32>,
    /// Quarters filed per year; defaults to [`DEFAULT_YEARLY_COUNT`].
    pub yearly_count: Option<u32>,
    /// Quarter that is never filed.
    pub skip_quarter: Option<u32>,
}

/// A tax return that has been computed but not stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxReturnDraft {
    pub customer_id: i32,
    pub declaration_type: String,
    pub period: Period,
    pub due_date: NaiveDateTime,
}

fn to_u32(declaration_type: &str, field: &str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| ComputeError::InvalidSchedule {
        declaration_type: declaration_type.to_string(),
        reason: format!("{} must not be negative, got {}", field, value),
    })
}

fn opt_to_u32(declaration_type: &str, field: &str, value: Option<i32>) -> Result<Option<u32>> {
    value.map(|v| to_u32(declaration_type, field, v)).transpose()
}

impl DeclarationSchedule {
    /// Builds the schedule stored on a customer's declaration setting.
    pub fn from_setting(setting: &declaration_setting::Model) -> Result<Self> {
        let name = setting.declaration_type.as_str();
        let schedule = Self {
            declaration_type: setting.declaration_type.clone(),
            frequency: setting.frequency.into(),
            due_day: to_u32(name, "due_day", setting.due_day)?,
            due_hour: to_u32(name, "due_hour", setting.due_hour)?,
            due_minute: to_u32(name, "due_minute", setting.due_minute)?,
            due_month: opt_to_u32(name, "due_month", setting.due_month)?,
            quarter_offset: opt_to_u32(name, "quarter_offset", setting.quarter_offset)?,
            yearly_count: opt_to_u32(name, "yearly_count", setting.yearly_count)?,
            skip_quarter: opt_to_u32(name, "skip_quarter", setting.skip_quarter)?,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Builds the default schedule of a catalog entry.
    pub fn from_catalog(entry: &declaration_type::Model) -> Result<Self> {
        let name = entry.name.as_str();
        let schedule = Self {
            declaration_type: entry.name.clone(),
            frequency: entry.frequency.into(),
            due_day: to_u32(name, "due_day", entry.due_day)?,
            due_hour: to_u32(name, "due_hour", entry.due_hour)?,
            due_minute: to_u32(name, "due_minute", entry.due_minute)?,
            due_month: opt_to_u32(name, "due_month", entry.due_month)?,
            quarter_offset: opt_to_u32(name, "quarter_offset", entry.quarter_offset)?,
            yearly_count: opt_to_u32(name, "yearly_count", entry.yearly_count)?,
            skip_quarter: opt_to_u32(name, "skip_quarter", entry.skip_quarter)?,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ComputeError::InvalidSchedule {
            declaration_type: self.declaration_type.clone(),
            reason,
        };

        if self.declaration_type.trim().is_empty() {
            return Err(invalid("declaration type must not be empty".to_string()));
        }
        if !(1..=31).contains(&self.due_day) {
            return Err(invalid(format!("due_day {} is out of range 1-31", self.due_day)));
        }
        if self.due_hour > 23 {
            return Err(invalid(format!("due_hour {} is out of range 0-23", self.due_hour)));
        }
        if self.due_minute > 59 {
            return Err(invalid(format!(
                "due_minute {} is out of range 0-59",
                self.due_minute
            )));
        }
        if let Some(month) = self.due_month {
            if !(1..=12).contains(&month) {
                return Err(invalid(format!("due_month {} is out of range 1-12", month)));
            }
        }
        if let Some(offset) = self.quarter_offset {
            if offset > 12 {
                return Err(invalid(format!(
                    "quarter_offset {} is out of range 0-12",
                    offset
                )));
            }
        }
        if let Some(count) = self.yearly_count {
            if !(1..=4).contains(&count) {
                return Err(invalid(format!("yearly_count {} is out of range 1-4", count)));
            }
        }
        if let Some(quarter) = self.skip_quarter {
            if !(1..=4).contains(&quarter) {
                return Err(invalid(format!(
                    "skip_quarter {} is out of range 1-4",
                    quarter
                )));
            }
        }
        Ok(())
    }
}

/// Expands declaration schedules into the drafts due for one year.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleCalculator {
    year: i32,
    day_overflow: DayOverflow,
    established_on: Option<NaiveDate>,
}

impl ScheduleCalculator {
    /// Creates a calculator for `year` that clamps overflowing due days.
    pub fn new(year: i32) -> Self {
        Self {
            year,
            day_overflow: DayOverflow::default(),
            established_on: None,
        }
    }

    pub fn with_day_overflow(mut self, day_overflow: DayOverflow) -> Self {
        self.day_overflow = day_overflow;
        self
    }

    /// Omits periods that end before the company was established.
    pub fn with_establishment(mut self, established_on: Option<NaiveDate>) -> Self {
        self.established_on = established_on;
        self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Expands one schedule into the drafts due in the calculator's year.
    #[instrument(skip(self, schedule), fields(year = self.year, declaration_type = %schedule.declaration_type))]
    pub fn expand(&self, customer_id: i32, schedule: &DeclarationSchedule) -> Result<Vec<TaxReturnDraft>> {
        schedule.validate()?;
        let year = self.year;
        let mut drafts = Vec::new();

        match schedule.frequency {
            Frequency::Monthly => {
                for month in 1..=12 {
                    let period = Period::month(year, month);
                    let due_date = self.due_date(schedule, period, year, month)?;
                    self.push(&mut drafts, customer_id, schedule, period, due_date);
                }
            }
            Frequency::Quarterly => {
                let count = schedule.yearly_count.unwrap_or(DEFAULT_YEARLY_COUNT);
                let offset = schedule.quarter_offset.unwrap_or(DEFAULT_QUARTER_OFFSET);
                for quarter in 1..=count {
                    if schedule.skip_quarter == Some(quarter) {
                        trace!("Skipping quarter {} of {}", quarter, schedule.declaration_type);
                        continue;
                    }
                    // Months past December roll into the following year.
                    let raw_month = quarter * 3 + offset;
                    let due_year = year + ((raw_month - 1) / 12) as i32;
                    let due_month = (raw_month - 1) % 12 + 1;
                    let period = Period::quarter(year, quarter);
                    let due_date = self.due_date(schedule, period, due_year, due_month)?;
                    self.push(&mut drafts, customer_id, schedule, period, due_date);
                }
            }
            Frequency::Yearly => {
                let due_month = schedule
                    .due_month
                    .ok_or_else(|| ComputeError::MissingDueMonth(schedule.declaration_type.clone()))?;
                let period = Period::year(year);
                let due_date = self.due_date(schedule, period, year, due_month)?;
                self.push(&mut drafts, customer_id, schedule, period, due_date);
            }
        }

        debug!("Expanded {} into {} drafts", schedule.declaration_type, drafts.len());
        Ok(drafts)
    }

    /// Expands every schedule and concatenates the drafts.
    pub fn expand_all<'a, I>(&self, customer_id: i32, schedules: I) -> Result<Vec<TaxReturnDraft>>
    where
        I: IntoIterator<Item = &'a DeclarationSchedule>,
    {
        let mut drafts = Vec::new();
        for schedule in schedules {
            drafts.extend(self.expand(customer_id, schedule)?);
        }
        Ok(drafts)
    }

    fn push(
        &self,
        drafts: &mut Vec<TaxReturnDraft>,
        customer_id: i32,
        schedule: &DeclarationSchedule,
        period: Period,
        due_date: NaiveDateTime,
    ) {
        if let (Some(established_on), Some(period_end)) = (self.established_on, period.end_date()) {
            if period_end < established_on {
                trace!("Period {} ends before establishment on {}", period, established_on);
                return;
            }
        }
        drafts.push(TaxReturnDraft {
            customer_id,
            declaration_type: schedule.declaration_type.clone(),
            period,
            due_date,
        });
    }

    fn due_date(
        &self,
        schedule: &DeclarationSchedule,
        period: Period,
        due_year: i32,
        due_month: u32,
    ) -> Result<NaiveDateTime> {
        let last_day = Period::month(due_year, due_month)
            .end_date()
            .map(|date| chrono::Datelike::day(&date))
            .ok_or_else(|| ComputeError::InvalidSchedule {
                declaration_type: schedule.declaration_type.clone(),
                reason: format!("{}-{:02} is not a valid month", due_year, due_month),
            })?;

        let day = if schedule.due_day <= last_day {
            schedule.due_day
        } else {
            match self.day_overflow {
                DayOverflow::Clamp => last_day,
                DayOverflow::Reject => {
                    return Err(ComputeError::InvalidDueDay {
                        declaration_type: schedule.declaration_type.clone(),
                        day: schedule.due_day,
                        year: due_year,
                        month: due_month,
                    });
                }
            }
        };

        let due_date = NaiveDate::from_ymd_opt(due_year, due_month, day)
            .and_then(|date| date.and_hms_opt(schedule.due_hour, schedule.due_minute, 0))
            .ok_or_else(|| ComputeError::InvalidSchedule {
                declaration_type: schedule.declaration_type.clone(),
                reason: format!(
                    "{}-{:02}-{:02} {:02}:{:02} is not a valid deadline",
                    due_year, due_month, day, schedule.due_hour, schedule.due_minute
                ),
            })?;

        // Deadlines may spill into January of the next year, never further.
        let window_end = NaiveDate::from_ymd_opt(self.year + 1, 1, 31)
            .and_then(|date| date.and_hms_opt(23, 59, 59));
        if window_end.is_some_and(|end| due_date > end) {
            return Err(ComputeError::OutsideSchedulingWindow {
                declaration_type: schedule.declaration_type.clone(),
                period: period.to_string(),
                due_date,
            });
        }

        Ok(due_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn monthly(name: &str, due_day: u32) -> DeclarationSchedule {
        DeclarationSchedule {
            declaration_type: name.to_string(),
            frequency: Frequency::Monthly,
            due_day,
            due_hour: 23,
            due_minute: 59,
            due_month: None,
            quarter_offset: None,
            yearly_count: None,
            skip_quarter: None,
        }
    }

    fn quarterly(offset: Option<u32>, count: Option<u32>, skip: Option<u32>) -> DeclarationSchedule {
        DeclarationSchedule {
            declaration_type: "Gelir Geçici Vergi Beyannamesi".to_string(),
            frequency: Frequency::Quarterly,
            due_day: 17,
            due_hour: 23,
            due_minute: 59,
            due_month: None,
            quarter_offset: offset,
            yearly_count: count,
            skip_quarter: skip,
        }
    }

    fn yearly(due_month: Option<u32>, due_day: u32) -> DeclarationSchedule {
        DeclarationSchedule {
            declaration_type: "Kurumlar Vergisi Beyannamesi".to_string(),
            frequency: Frequency::Yearly,
            due_day,
            due_hour: 23,
            due_minute: 59,
            due_month,
            quarter_offset: None,
            yearly_count: None,
            skip_quarter: None,
        }
    }

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn labels(drafts: &[TaxReturnDraft]) -> Vec<String> {
        drafts.iter().map(|draft| draft.period.to_string()).collect()
    }

    #[test]
    fn monthly_yields_one_draft_per_month() {
        let drafts = ScheduleCalculator::new(2025)
            .expand(7, &monthly("KDV1 Beyannamesi", 28))
            .unwrap();

        assert_eq!(drafts.len(), 12);
        let expected: Vec<String> = (1..=12).map(|m| format!("2025-{:02}", m)).collect();
        assert_eq!(labels(&drafts), expected);

        let unique: HashSet<_> = drafts.iter().map(|draft| draft.period).collect();
        assert_eq!(unique.len(), 12);

        assert!(drafts.iter().all(|draft| draft.customer_id == 7));
        assert_eq!(drafts[0].due_date, at(2025, 1, 28, 23, 59));
        assert_eq!(drafts[11].due_date, at(2025, 12, 28, 23, 59));
    }

    #[test]
    fn quarterly_skip_omits_the_quarter() {
        let drafts = ScheduleCalculator::new(2025)
            .expand(1, &quarterly(Some(2), Some(3), Some(4)))
            .unwrap();

        assert_eq!(labels(&drafts), vec!["2025-Q1", "2025-Q2", "2025-Q3"]);
    }

    #[test]
    fn skip_quarter_applies_inside_the_yearly_count() {
        let drafts = ScheduleCalculator::new(2025)
            .expand(1, &quarterly(Some(1), None, Some(2)))
            .unwrap();

        assert_eq!(labels(&drafts), vec!["2025-Q1", "2025-Q3", "2025-Q4"]);
    }

    #[test]
    fn quarterly_offset_moves_the_due_month() {
        let drafts = ScheduleCalculator::new(2025)
            .expand(1, &quarterly(Some(2), Some(1), None))
            .unwrap();

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].period, Period::quarter(2025, 1));
        assert_eq!(drafts[0].due_date, at(2025, 5, 17, 23, 59));
    }

    #[test]
    fn quarterly_defaults_to_four_quarters_due_the_following_month() {
        let drafts = ScheduleCalculator::new(2025)
            .expand(1, &quarterly(None, None, None))
            .unwrap();

        let due: Vec<_> = drafts.iter().map(|draft| draft.due_date).collect();
        assert_eq!(
            due,
            vec![
                at(2025, 4, 17, 23, 59),
                at(2025, 7, 17, 23, 59),
                at(2025, 10, 17, 23, 59),
                at(2026, 1, 17, 23, 59),
            ]
        );
    }

    #[test]
    fn fourth_quarter_beyond_january_is_rejected() {
        let err = ScheduleCalculator::new(2025)
            .expand(1, &quarterly(Some(2), None, None))
            .unwrap_err();

        match err {
            ComputeError::OutsideSchedulingWindow { period, due_date, .. } => {
                assert_eq!(period, "2025-Q4");
                assert_eq!(due_date, at(2026, 2, 17, 23, 59));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn yearly_yields_a_single_draft() {
        let drafts = ScheduleCalculator::new(2025)
            .expand(3, &yearly(Some(4), 30))
            .unwrap();

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].period, Period::year(2025));
        assert_eq!(drafts[0].period.to_string(), "2025");
        assert_eq!(drafts[0].due_date, at(2025, 4, 30, 23, 59));
    }

    #[test]
    fn yearly_without_due_month_is_an_error() {
        let err = ScheduleCalculator::new(2025)
            .expand(3, &yearly(None, 30))
            .unwrap_err();

        assert!(matches!(err, ComputeError::MissingDueMonth(name) if name == "Kurumlar Vergisi Beyannamesi"));
    }

    #[test]
    fn expansion_is_idempotent() {
        let schedules = vec![
            monthly("KDV1 Beyannamesi", 28),
            quarterly(Some(2), Some(3), Some(4)),
            yearly(Some(4), 30),
        ];
        let calculator = ScheduleCalculator::new(2025);

        let first = calculator.expand_all(5, &schedules).unwrap();
        let second = calculator.expand_all(5, &schedules).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 12 + 3 + 1);
    }

    #[test]
    fn day_31_is_clamped_to_the_last_day_of_the_month() {
        let drafts = ScheduleCalculator::new(2025)
            .expand(1, &yearly(Some(4), 31))
            .unwrap();
        assert_eq!(drafts[0].due_date, at(2025, 4, 30, 23, 59));

        let monthly = ScheduleCalculator::new(2024)
            .expand(1, &monthly("Ba-Bs Formu", 31))
            .unwrap();
        assert_eq!(monthly[1].due_date, at(2024, 2, 29, 23, 59));
        assert_eq!(monthly[3].due_date, at(2024, 4, 30, 23, 59));
        assert_eq!(monthly[4].due_date, at(2024, 5, 31, 23, 59));
    }

    #[test]
    fn day_31_is_rejected_when_overflow_is_rejected() {
        let err = ScheduleCalculator::new(2025)
            .with_day_overflow(DayOverflow::Reject)
            .expand(1, &yearly(Some(4), 31))
            .unwrap_err();

        assert!(matches!(
            err,
            ComputeError::InvalidDueDay { day: 31, year: 2025, month: 4, .. }
        ));
    }

    #[test]
    fn gelir_gecici_end_to_end() {
        let schedule = quarterly(Some(2), Some(3), Some(4));
        let drafts = ScheduleCalculator::new(2025).expand(42, &schedule).unwrap();

        let summary: Vec<_> = drafts
            .iter()
            .map(|draft| (draft.period.to_string(), draft.due_date))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("2025-Q1".to_string(), at(2025, 5, 17, 23, 59)),
                ("2025-Q2".to_string(), at(2025, 8, 17, 23, 59)),
                ("2025-Q3".to_string(), at(2025, 11, 17, 23, 59)),
            ]
        );
    }

    #[test]
    fn periods_before_establishment_are_omitted() {
        let established = NaiveDate::from_ymd_opt(2025, 6, 10);
        let calculator = ScheduleCalculator::new(2025).with_establishment(established);

        let months = calculator.expand(1, &monthly("KDV1 Beyannamesi", 28)).unwrap();
        assert_eq!(months.first().map(|d| d.period), Some(Period::month(2025, 6)));
        assert_eq!(months.len(), 7);

        let quarters = calculator.expand(1, &quarterly(None, None, None)).unwrap();
        assert_eq!(labels(&quarters), vec!["2025-Q2", "2025-Q3", "2025-Q4"]);

        let later = ScheduleCalculator::new(2024).with_establishment(established);
        assert!(later.expand(1, &yearly(Some(4), 30)).unwrap().is_empty());
    }

    #[test]
    fn validation_rejects_out_of_range_fields() {
        let mut schedule = monthly("KDV1 Beyannamesi", 0);
        assert!(schedule.validate().is_err());

        schedule.due_day = 28;
        schedule.due_hour = 24;
        assert!(schedule.validate().is_err());

        schedule.due_hour = 23;
        assert!(schedule.validate().is_ok());

        let mut q = quarterly(None, Some(5), None);
        assert!(q.validate().is_err());
        q.yearly_count = Some(4);
        q.skip_quarter = Some(0);
        assert!(q.validate().is_err());
    }

    #[test]
    fn parses_policy_and_frequency_names() {
        assert_eq!("clamp".parse::<DayOverflow>(), Ok(DayOverflow::Clamp));
        assert_eq!("Reject".parse::<DayOverflow>(), Ok(DayOverflow::Reject));
        assert!("wrap".parse::<DayOverflow>().is_err());
        assert_eq!("quarterly".parse::<Frequency>(), Ok(Frequency::Quarterly));
        assert_eq!(Frequency::Yearly.as_str(), "yearly");
    }
}
