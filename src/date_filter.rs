//! Date bounds applied to source file timestamps.
//!
//! A `YYYYMMDD` bound stands for local midnight at the start of that day.

use crate::error::InvalidDateFilter;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use tracing::warn;

/// Format accepted on the command line for date bounds
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Which side of the bound a filter keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Keep timestamps at or after the bound (`--exclude-before`)
    Lower,
    /// Keep timestamps at or before the bound (`--exclude-after`)
    Upper,
}

/// A single validated date predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    at: DateTime<Local>,
    bound: Bound,
}

impl DateFilter {
    /// Parse a `YYYYMMDD` string into a filter.
    pub fn build(input: &str, bound: Bound) -> Result<Self, InvalidDateFilter> {
        if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidDateFilter {
                input: input.to_string(),
                reason: "expected 8 digits in YYYYMMDD form".to_string(),
            });
        }

        let date = NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|e| InvalidDateFilter {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            at: local_midnight(date),
            bound,
        })
    }

    /// Compares the full `timestamp` against the bound's local midnight.
    pub fn keeps<Tz: TimeZone>(&self, timestamp: &DateTime<Tz>) -> bool {
        let ts = timestamp.naive_utc();
        let at = self.at.naive_utc();
        match self.bound {
            Bound::Lower => ts >= at,
            Bound::Upper => ts <= at,
        }
    }
}

/// Start of `date` in local time.
///
/// Where a DST gap swallows midnight, the wall-clock midnight is read as UTC.
fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}

/// All active filters, combined with AND semantics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFilters {
    filters: Vec<DateFilter>,
}

impl DateFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build filters from the optional command-line bounds.
    ///
    /// Malformed bounds are logged and dropped; they are also returned so
    /// callers can surface them.
    pub fn from_bounds(
        exclude_before: Option<&str>,
        exclude_after: Option<&str>,
    ) -> (Self, Vec<InvalidDateFilter>) {
        let mut filters = Self::new();
        let mut rejected = Vec::new();

        let bounds = [(exclude_before, Bound::Lower), (exclude_after, Bound::Upper)];
        for (input, bound) in bounds {
            let Some(input) = input else { continue };
            match DateFilter::build(input, bound) {
                Ok(filter) => filters.push(filter),
                Err(invalid) => {
                    warn!("{} - skipped using it to filter", invalid);
                    rejected.push(invalid);
                }
            }
        }

        (filters, rejected)
    }

    pub fn push(&mut self, filter: DateFilter) {
        self.filters.push(filter);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True when `timestamp` passes every filter
    pub fn keeps<Tz: TimeZone>(&self, timestamp: &DateTime<Tz>) -> bool {
        self.filters.iter().all(|f| f.keeps(timestamp))
    }
}
