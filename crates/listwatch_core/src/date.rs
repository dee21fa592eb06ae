//! Date parsing for archive footers and user input.
//!
//! Parsing walks an ordered list of strategies and takes the first one that
//! accepts the whole input. Archive footers and free-text checkpoint input go
//! through the same list, so a date copied from the archive is always
//! accepted back.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::locale::Locale;

/// Absolute instant every parsed date is normalized to.
pub type Timestamp = DateTime<Utc>;

/// Which name tables a parse may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocaleHint {
    /// The archive's own locale, plus English.
    #[default]
    Source,
    /// English names only.
    None,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unrecognized date {raw:?}")]
pub struct ParseFailure {
    pub raw: String,
}

pub trait DateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns `None` unless the strategy accounts for every token of `raw`.
    fn parse(&self, raw: &str, locale: &Locale) -> Option<Timestamp>;
}

/// Pipermail footer: `<weekday> <day> <month> <year> <HH:MM:SS> <tz>`.
///
/// The weekday is optional and stripped by position before the month is
/// read: in Italian `Mar` is both Tuesday and March, so
/// `Mar 17 Mar 2015 14:59:58 CET` is only unambiguous positionally.
#[derive(Debug, Default, Clone, Copy)]
pub struct FooterFormat;

impl DateStrategy for FooterFormat {
    fn name(&self) -> &'static str {
        "footer"
    }

    fn parse(&self, raw: &str, locale: &Locale) -> Option<Timestamp> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let rest = match tokens.as_slice() {
            [weekday, rest @ ..] if rest.len() == 5 && locale.is_weekday(weekday) => rest,
            rest if rest.len() == 5 => rest,
            _ => return None,
        };
        let [day, month, year, time, zone] = rest else {
            return None;
        };
        let day = day.parse::<u32>().ok()?;
        let month = locale.month_number(month)?;
        let year = year.parse::<i32>().ok()?;
        let time = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
        let offset = zone_offset(zone)?;
        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_time(time);
        in_zone(naive, offset)
    }
}

/// C `asctime` order, as on pipermail index pages:
/// `[<weekday>] <month> <day> <HH:MM:SS> [<tz>] <year>`. No zone means UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct Asctime;

impl DateStrategy for Asctime {
    fn name(&self) -> &'static str {
        "asctime"
    }

    fn parse(&self, raw: &str, locale: &Locale) -> Option<Timestamp> {
        let mut tokens: Vec<&str> = raw.split_whitespace().collect();
        let year = tokens.pop()?;
        if year.len() != 4 {
            return None;
        }
        let year = year.parse::<i32>().ok()?;
        let mut offset = FixedOffset::east_opt(0)?;
        if let Some(zone) = tokens.last().and_then(|t| zone_offset(t)) {
            offset = zone;
            tokens.pop();
        }
        let time = NaiveTime::parse_from_str(tokens.pop()?, "%H:%M:%S").ok()?;
        // Positional, like the footer: three tokens left means a weekday leads.
        let (month, day) = match tokens.as_slice() {
            [weekday, month, day] if locale.is_weekday(weekday) => (month, day),
            [month, day] => (month, day),
            _ => return None,
        };
        let month = locale.month_number(month)?;
        let day = day.parse::<u32>().ok()?;
        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_time(time);
        in_zone(naive, offset)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Rfc3339;

impl DateStrategy for Rfc3339 {
    fn name(&self) -> &'static str {
        "rfc3339"
    }

    fn parse(&self, raw: &str, _locale: &Locale) -> Option<Timestamp> {
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Rfc2822;

impl DateStrategy for Rfc2822 {
    fn name(&self) -> &'static str {
        "rfc2822"
    }

    fn parse(&self, raw: &str, _locale: &Locale) -> Option<Timestamp> {
        DateTime::parse_from_rfc2822(raw.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// All-digit dates such as `2017-05-01` or `2017-05-01 10:30:00`, read as UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericDate;

const NUMERIC_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const NUMERIC_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

impl DateStrategy for NumericDate {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn parse(&self, raw: &str, _locale: &Locale) -> Option<Timestamp> {
        let raw = raw.trim();
        let naive = NUMERIC_DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                NUMERIC_DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                    .map(|date| date.and_time(NaiveTime::MIN))
            })?;
        Some(Utc.from_utc_datetime(&naive))
    }
}

/// Dates with a month name: `1 maggio 2017`, `May 1, 2017`, optionally
/// preceded by a weekday and followed by `HH:MM[:SS]` and a zone. Read as
/// UTC when no zone is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextualDate;

impl DateStrategy for TextualDate {
    fn name(&self) -> &'static str {
        "textual"
    }

    fn parse(&self, raw: &str, locale: &Locale) -> Option<Timestamp> {
        let mut tokens: Vec<&str> = raw
            .split_whitespace()
            .map(|t| t.trim_end_matches(','))
            .filter(|t| !t.is_empty())
            .collect();

        let mut offset = FixedOffset::east_opt(0)?;
        // A zone only counts right after a time.
        let n = tokens.len();
        if n >= 2 && tokens[n - 2].contains(':') {
            if let Some(zone) = zone_offset(tokens[n - 1]) {
                offset = zone;
                tokens.pop();
            }
        }

        let mut time = NaiveTime::MIN;
        if let Some(last) = tokens.last().filter(|t| t.contains(':')) {
            time = NaiveTime::parse_from_str(last, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(last, "%H:%M"))
                .ok()?;
            tokens.pop();
        }
        if tokens.len() == 4 && locale.is_weekday(tokens[0]) {
            tokens.remove(0);
        }

        let [first, second, year] = tokens.as_slice() else {
            return None;
        };
        let year = year.parse::<i32>().ok()?;
        let (day, month) = match (first.parse::<u32>(), second.parse::<u32>()) {
            (Ok(day), Err(_)) => (day, locale.month_number(second)?),
            (Err(_), Ok(day)) => (day, locale.month_number(first)?),
            _ => return None,
        };
        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_time(time);
        in_zone(naive, offset)
    }
}

fn in_zone(naive: NaiveDateTime, offset: FixedOffset) -> Option<Timestamp> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Offset for a zone abbreviation or a numeric `+HHMM` / `+HH:MM` offset.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    let hours = match zone.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "UT" | "Z" | "WET" => Some(0),
        "CET" | "WEST" | "BST" => Some(1),
        "CEST" | "EET" => Some(2),
        "EEST" => Some(3),
        "EDT" => Some(-4),
        "EST" | "CDT" => Some(-5),
        "CST" | "MDT" => Some(-6),
        "MST" | "PDT" => Some(-7),
        "PST" => Some(-8),
        _ => None,
    };
    if let Some(hours) = hours {
        return FixedOffset::east_opt(hours * 3600);
    }

    let (sign, digits) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hh: i32 = digits[..2].parse().ok()?;
    let mm: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hh * 3600 + mm * 60))
}

pub struct DateParser {
    strategies: Vec<Box<dyn DateStrategy>>,
    source_locale: Locale,
}

impl DateParser {
    pub fn new() -> Self {
        Self::with_locale(Locale::italian())
    }

    pub fn with_locale(source_locale: Locale) -> Self {
        Self {
            strategies: vec![
                Box::new(FooterFormat),
                Box::new(Asctime),
                Box::new(Rfc3339),
                Box::new(Rfc2822),
                Box::new(NumericDate),
                Box::new(TextualDate),
            ],
            source_locale,
        }
    }

    /// Strategy names in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First strategy that accepts all of `raw` wins; surrounding whitespace
    /// is ignored.
    pub fn parse(&self, raw: &str, hint: LocaleHint) -> Result<Timestamp, ParseFailure> {
        let locale = match hint {
            LocaleHint::Source => self.source_locale.clone(),
            LocaleHint::None => Locale::english(),
        };
        let trimmed = raw.trim();
        self.strategies
            .iter()
            .find_map(|strategy| strategy.parse(trimmed, &locale))
            .ok_or_else(|| ParseFailure {
                raw: raw.to_string(),
            })
    }
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new()
    }
}
