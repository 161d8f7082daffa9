use super::ValidationError;
use chrono::{Days, NaiveDate};
use std::fmt;

/// Inclusive span of calendar days to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting an end date that precedes the start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The `days` days ending on (and including) `end`.
    pub fn ending_on(end: NaiveDate, days: u64) -> Result<Self, ValidationError> {
        let span = days.max(1) - 1;
        let start = end
            .checked_sub_days(Days::new(span))
            .ok_or_else(|| ValidationError::InvalidDate {
                input: end.to_string(),
                reason: format!("cannot step back {} days", span),
            })?;
        Self::new(start, end)
    }

    /// Parses two ISO-8601 dates (`YYYY-MM-DD`).
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_iso_date(start)?, parse_iso_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range, both ends included.
    pub fn len_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    /// Iterates over every day in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + Clone + Send + 'static {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Parses an ISO-8601 calendar date.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| {
        ValidationError::InvalidDate {
            input: input.to_string(),
            reason: e.to_string(),
        }
    })
}
