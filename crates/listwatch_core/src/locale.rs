//! Month and weekday name tables.
//!
//! The archive itself is addressed with English month names, while message
//! footers are written in the list's own locale (Italian).

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const ENGLISH_WEEKDAYS: [&str; 14] = [
    "mon", "tue", "wed", "thu", "fri", "sat", "sun", "monday", "tuesday", "wednesday", "thursday",
    "friday", "saturday", "sunday",
];

const ITALIAN_MONTHS: [&str; 12] = [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre",
];

const ITALIAN_MONTH_ABBREVS: [&str; 12] = [
    "gen", "feb", "mar", "apr", "mag", "giu", "lug", "ago", "set", "ott", "nov", "dic",
];

const ITALIAN_WEEKDAYS: [&str; 14] = [
    "lun", "mar", "mer", "gio", "ven", "sab", "dom", "lunedì", "martedì", "mercoledì", "giovedì",
    "venerdì", "sabato", "domenica",
];

/// Name of an already validated month (1-based).
pub(crate) fn english_month(month: u32) -> &'static str {
    ENGLISH_MONTHS[month as usize - 1]
}

/// Full English name of `month` (1-based), as used in archive directory names.
pub fn english_month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| ENGLISH_MONTHS.get(idx as usize))
        .copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    English,
    Italian,
}

/// A set of calendar name tables. English names are always accepted; the
/// source locale adds the list's own names on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    languages: Vec<Language>,
}

impl Locale {
    pub fn english() -> Self {
        Self {
            languages: vec![Language::English],
        }
    }

    /// The locale the archive's message footers are written in.
    pub fn italian() -> Self {
        Self {
            languages: vec![Language::Italian, Language::English],
        }
    }

    /// Month number (1-based) for a full or abbreviated month name.
    ///
    /// Matching is case-insensitive and ignores a trailing `.` and `,`.
    pub fn month_number(&self, token: &str) -> Option<u32> {
        let token = normalize(token);
        if token.is_empty() {
            return None;
        }
        self.languages.iter().find_map(|lang| match lang {
            Language::English => position(&token, ENGLISH_MONTHS.iter().map(|m| {
                // English abbreviations are the first three letters.
                (m.to_ascii_lowercase(), m[..3].to_ascii_lowercase())
            })),
            Language::Italian => position(
                &token,
                ITALIAN_MONTHS
                    .iter()
                    .zip(ITALIAN_MONTH_ABBREVS.iter())
                    .map(|(full, abbr)| (full.to_string(), abbr.to_string())),
            ),
        })
    }

    pub fn is_weekday(&self, token: &str) -> bool {
        let token = normalize(token);
        self.languages.iter().any(|lang| {
            let table: &[&str] = match lang {
                Language::English => &ENGLISH_WEEKDAYS,
                Language::Italian => &ITALIAN_WEEKDAYS,
            };
            table.contains(&token.as_str())
        })
    }
}

fn normalize(token: &str) -> String {
    token
        .trim()
        .trim_end_matches(['.', ','])
        .to_lowercase()
}

fn position(token: &str, names: impl Iterator<Item = (String, String)>) -> Option<u32> {
    names
        .enumerate()
        .find(|(_, (full, abbr))| token == full || token == abbr)
        .map(|(idx, _)| idx as u32 + 1)
}
