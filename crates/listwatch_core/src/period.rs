use std::fmt;

use chrono::{DateTime, Datelike, Utc};

use crate::locale::{english_month, Locale};

/// One addressable month of the archive.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    /// Always in `1..=12`.
    month: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("month must be in 1..=12, got {0}")]
    MonthOutOfRange(u32),
    #[error("unknown month name {0:?}")]
    UnknownMonth(String),
    #[error("invalid year {0:?}")]
    InvalidYear(String),
    #[error("expected at most two arguments, got {0}")]
    TooManyArguments(usize),
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, InputError> {
        if !(1..=12).contains(&month) {
            return Err(InputError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub fn of<Tz: chrono::TimeZone>(ts: &DateTime<Tz>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn month_name(&self) -> &'static str {
        english_month(self.month)
    }

    /// Linear month index: `year * 12 + (month - 1)`.
    pub fn index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month - 1)
    }

    pub fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Directory name of this month in a pipermail archive, e.g. `2017-June`.
    pub fn archive_segment(&self) -> String {
        format!("{}-{}", self.year, self.month_name())
    }

    /// Resolves listing arguments into a period.
    ///
    /// - no arguments: the month of `today`
    /// - one numeric argument: that year, month of `today`
    /// - one other argument: year of `today`, that month
    /// - two arguments: `year month` or `month year`
    pub fn resolve(args: &[&str], today: DateTime<Utc>, locale: &Locale) -> Result<Self, InputError> {
        let month_of = |token: &str| {
            locale
                .month_number(token)
                .ok_or_else(|| InputError::UnknownMonth(token.to_string()))
        };
        let current = Self::of(&today);
        match args {
            [] => Ok(current),
            [single] if is_numeric(single) => Self::new(parse_year(single)?, current.month),
            [single] => Self::new(current.year, month_of(*single)?),
            [first, second] if is_numeric(first) => Self::new(parse_year(first)?, month_of(*second)?),
            [first, second] if is_numeric(second) => {
                Self::new(parse_year(second)?, month_of(*first)?)
            }
            [first, _] => Err(InputError::UnknownMonth(first.to_string())),
            more => Err(InputError::TooManyArguments(more.len())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn parse_year(token: &str) -> Result<i32, InputError> {
    token
        .parse::<i32>()
        .ok()
        .filter(|year| (1970..=9999).contains(year))
        .ok_or_else(|| InputError::InvalidYear(token.to_string()))
}

/// Chronological months from the checkpoint's month through the current
/// month, both inclusive.
#[derive(Debug, Clone)]
pub struct Periods {
    next: i64,
    last: i64,
}

impl Iterator for Periods {
    type Item = Period;

    fn next(&mut self) -> Option<Period> {
        if self.next > self.last {
            return None;
        }
        let period = Period::from_index(self.next);
        self.next += 1;
        Some(period)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.last - self.next + 1).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Periods {}

/// Months to scan for a cycle that started from `checkpoint` at `now`.
///
/// Empty when the checkpoint lies in a later month than `now`.
pub fn enumerate(checkpoint: DateTime<Utc>, now: DateTime<Utc>) -> Periods {
    Periods {
        next: Period::of(&checkpoint).index(),
        last: Period::of(&now).index(),
    }
}
