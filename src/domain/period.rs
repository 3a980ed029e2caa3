use crate::error::{DATE_RANGE_REQUIRED, LedgerError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Inclusive range of calendar days used to filter payment history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Builds a range from optional query parameters.
    ///
    /// Both bounds absent means no filtering. A single bound, or a bound that
    /// is not an ISO-8601 date or date-time, is rejected. Time of day is
    /// discarded.
    pub fn from_params(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Ok(Some(Self::new(parse_day(start)?, parse_day(end)?))),
            _ => Err(LedgerError::validation(DATE_RANGE_REQUIRED)),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.start <= day && day <= self.end
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    // Date-times without an offset are read as UTC.
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(at.date());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc).date_naive())
        .map_err(|_| LedgerError::validation(DATE_RANGE_REQUIRED))
}
