//! Recurrence rule evaluation.
//!
//! Expands a start date and repeat option into the bounded sequence of
//! occurrence dates. Occurrences never pass the term horizon and never
//! exceed the requested count.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

/// Default bound on how many occurrences a rule may produce.
pub const DEFAULT_MAX_COUNT: u32 = 40;

/// How often an event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatOption {
    None,
    Weekly,
    EveryTwoWeeks,
}

impl RepeatOption {
    /// Parse an optional wire value. A missing option is read as weekly.
    pub fn parse_optional(value: Option<&str>) -> PlannerResult<Self> {
        match value {
            Some(v) => v.parse(),
            None => {
                tracing::warn!("No repeat option supplied, defaulting to weekly");
                Ok(RepeatOption::Weekly)
            }
        }
    }

    /// Week interval for repeating options, `None` for a one-off.
    fn interval_weeks(self) -> Option<u32> {
        match self {
            RepeatOption::None => None,
            RepeatOption::Weekly => Some(1),
            RepeatOption::EveryTwoWeeks => Some(2),
        }
    }

    pub fn repeats(self) -> bool {
        self.interval_weeks().is_some()
    }
}

impl FromStr for RepeatOption {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(RepeatOption::None),
            "weekly" => Ok(RepeatOption::Weekly),
            "everyTwoWeeks" => Ok(RepeatOption::EveryTwoWeeks),
            other => Err(PlannerError::Validation(format!(
                "Unrecognized repeat option '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for RepeatOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatOption::None => write!(f, "none"),
            RepeatOption::Weekly => write!(f, "weekly"),
            RepeatOption::EveryTwoWeeks => write!(f, "everyTwoWeeks"),
        }
    }
}

/// Month and day of the academic term boundary that caps every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermBoundary {
    month: u32,
    day: u32,
}

impl Default for TermBoundary {
    /// January 15
    fn default() -> Self {
        TermBoundary { month: 1, day: 15 }
    }
}

impl TermBoundary {
    /// The boundary must exist in every year, so February 29 is rejected.
    pub fn new(month: u32, day: u32) -> PlannerResult<Self> {
        NaiveDate::from_ymd_opt(2001, month, day).ok_or_else(|| {
            PlannerError::Config(format!("Invalid term boundary {:02}-{:02}", month, day))
        })?;
        Ok(TermBoundary { month, day })
    }

    /// The horizon for a rule starting on `start`: the boundary in the start's
    /// year, or in the following year once the start is past it.
    pub fn horizon_for(&self, start: NaiveDate) -> PlannerResult<NaiveDate> {
        let this_year = self.in_year(start.year())?;
        if start <= this_year {
            return Ok(this_year);
        }
        self.in_year(start.year() + 1)
    }

    fn in_year(&self, year: i32) -> PlannerResult<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).ok_or_else(|| {
            PlannerError::Recurrence(format!("No term boundary in year {}", year))
        })
    }
}

/// A transient recurrence request. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub start_date: NaiveDate,
    pub repeat_option: RepeatOption,
    pub max_count: u32,
}

impl RecurrenceRule {
    pub fn new(start_date: NaiveDate, repeat_option: RepeatOption) -> Self {
        RecurrenceRule {
            start_date,
            repeat_option,
            max_count: DEFAULT_MAX_COUNT,
        }
    }

    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn occurrences(&self, boundary: TermBoundary) -> PlannerResult<Vec<NaiveDate>> {
        evaluate_until(self.start_date, self.repeat_option, self.max_count, boundary)
    }
}

/// Evaluate a rule against the default January 15 term boundary.
pub fn evaluate(
    start_date: NaiveDate,
    repeat_option: RepeatOption,
    max_count: u32,
) -> PlannerResult<Vec<NaiveDate>> {
    evaluate_until(start_date, repeat_option, max_count, TermBoundary::default())
}

/// Evaluate a rule: dates strictly increasing, each at or before the horizon,
/// at most `max_count` of them.
pub fn evaluate_until(
    start_date: NaiveDate,
    repeat_option: RepeatOption,
    max_count: u32,
    boundary: TermBoundary,
) -> PlannerResult<Vec<NaiveDate>> {
    if max_count == 0 {
        return Ok(Vec::new());
    }

    let horizon = boundary.horizon_for(start_date)?;

    let Some(interval) = repeat_option.interval_weeks() else {
        return Ok(vec![start_date]);
    };

    let rrule_str = format!(
        "DTSTART:{}T000000Z\nRRULE:FREQ=WEEKLY;INTERVAL={}",
        start_date.format("%Y%m%d"),
        interval
    );
    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        PlannerError::Recurrence(format!(
            "Failed to build {} rule from {}: {}",
            repeat_option, start_date, e
        ))
    })?;

    // Occurrences sit at midnight, so noon on the horizon keeps the horizon
    // itself in range whether the bound is inclusive or not.
    let tz: rrule::Tz = Utc.into();
    let before = horizon
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| PlannerError::Recurrence(format!("Invalid horizon {}", horizon)))?
        .and_utc()
        .with_timezone(&tz);

    let limit = u16::try_from(max_count).unwrap_or(u16::MAX);
    let result = rrule_set.before(before).all(limit);

    let dates: Vec<NaiveDate> = result
        .dates
        .iter()
        .map(|dt| dt.date_naive())
        .filter(|d| *d <= horizon)
        .take(max_count as usize)
        .collect();

    tracing::debug!(
        start = %start_date,
        option = %repeat_option,
        %horizon,
        count = dates.len(),
        "Evaluated recurrence rule"
    );

    Ok(dates)
}
