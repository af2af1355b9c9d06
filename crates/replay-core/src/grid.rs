//! Fixed calendar bucket grids.
//!
//! A grid defines the full set of time buckets a dataset is folded into:
//! one bucket per year and one per month over a configured, contiguous
//! calendar range. The bucket set is fixed at construction; listens outside
//! the range are dropped by the fold, never clamped into an edge bucket.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Granularity, ValidationError};

/// Errors constructing or parsing grid values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The range start is after the range end.
    #[error("bucket range start {start} is after end {end}")]
    StartAfterEnd { start: YearMonth, end: YearMonth },

    /// A year/month pair failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A `"M/YYYY"` string could not be parsed.
    #[error("invalid month/year: {value}")]
    InvalidMonthYear { value: String },
}

/// A calendar month, `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a year/month pair, validating the month.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::MonthOutOfRange { value: month });
        }
        Ok(Self { year, month })
    }

    /// The calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// The calendar month, 1-12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The next calendar month.
    #[must_use]
    pub const fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

/// Formats as `"M/YYYY"` with the month unzero-padded, the store's key form.
impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GridError::InvalidMonthYear {
            value: s.to_string(),
        };
        let (month, year) = s.split_once('/').ok_or_else(invalid)?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        Ok(Self::new(year, month)?)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(ym: YearMonth) -> Self {
        ym.to_string()
    }
}

/// One slot in a bucket accumulator, keyed by calendar period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKey {
    /// A whole calendar year.
    Year(i32),
    /// A single calendar month.
    Month(YearMonth),
}

impl BucketKey {
    /// Chronological sort key. Year buckets sort before any month of the
    /// same year, but grids never mix the two variants.
    const fn sort_key(self) -> (i32, u32) {
        match self {
            Self::Year(year) => (year, 0),
            Self::Month(ym) => (ym.year, ym.month),
        }
    }
}

impl Ord for BucketKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for BucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::Month(ym) => write!(f, "{ym}"),
        }
    }
}

/// A contiguous, inclusive calendar range supplied at construction.
///
/// Membership is month-precision for both granularities: a listen before
/// the starting month is excluded even when its year has a year bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRange {
    start: YearMonth,
    end: YearMonth,
}

impl BucketRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: YearMonth, end: YearMonth) -> Result<Self, GridError> {
        if start > end {
            return Err(GridError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// Convenience constructor covering whole years, January through December.
    pub fn years(first: i32, last: i32) -> Result<Self, GridError> {
        Self::new(YearMonth::new(first, 1)?, YearMonth::new(last, 12)?)
    }

    /// The first month in the range.
    #[must_use]
    pub const fn start(self) -> YearMonth {
        self.start
    }

    /// The last month in the range.
    #[must_use]
    pub const fn end(self) -> YearMonth {
        self.end
    }

    /// Whether the given year/month falls inside the range. Returns false
    /// for invalid months rather than erroring, so malformed listens are
    /// dropped instead of failing a recompute.
    #[must_use]
    pub fn contains(self, year: i32, month: u32) -> bool {
        YearMonth::new(year, month).is_ok_and(|ym| self.start <= ym && ym <= self.end)
    }
}

/// The fixed bucket set for one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketGrid {
    range: BucketRange,
}

impl BucketGrid {
    /// Creates a grid over the configured range.
    #[must_use]
    pub const fn new(range: BucketRange) -> Self {
        Self { range }
    }

    /// The configured range.
    #[must_use]
    pub const fn range(&self) -> BucketRange {
        self.range
    }

    /// All bucket keys for a granularity, chronological ascending. This
    /// ordering governs both the chart x-axis and maximum-bucket ties.
    #[must_use]
    pub fn keys(&self, granularity: Granularity) -> Vec<BucketKey> {
        match granularity {
            Granularity::Year => (self.range.start.year..=self.range.end.year)
                .map(BucketKey::Year)
                .collect(),
            Granularity::Month => {
                let mut keys = Vec::new();
                let mut ym = self.range.start;
                while ym <= self.range.end {
                    keys.push(BucketKey::Month(ym));
                    ym = ym.succ();
                }
                keys
            }
        }
    }

    /// The bucket key a listen at `year`/`month` falls into, or `None` if
    /// it lies outside the configured range.
    #[must_use]
    pub fn key_for(&self, granularity: Granularity, year: i32, month: u32) -> Option<BucketKey> {
        if !self.range.contains(year, month) {
            return None;
        }
        match granularity {
            Granularity::Year => Some(BucketKey::Year(year)),
            Granularity::Month => YearMonth::new(year, month).ok().map(BucketKey::Month),
        }
    }

    /// A zero-initialized accumulator with every bucket key present.
    /// No key may be added or removed after this.
    #[must_use]
    pub fn zeroed<V: Default>(&self, granularity: Granularity) -> BTreeMap<BucketKey, V> {
        self.keys(granularity)
            .into_iter()
            .map(|key| (key, V::default()))
            .collect()
    }
}
