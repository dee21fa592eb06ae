use crate::date::Timestamp;

const ELLIPSIS: char = '…';

/// How a message body is rendered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formatting {
    PlainText,
    /// HTML subset with bold text and links.
    #[default]
    RichText,
}

/// Renders one archive entry as a single bounded line.
#[derive(Debug, Clone)]
pub struct RowFormatter {
    max_row_len: usize,
    formatting: Formatting,
}

impl RowFormatter {
    pub fn new(max_row_len: usize, formatting: Formatting) -> Self {
        Self {
            max_row_len,
            formatting,
        }
    }

    pub fn formatting(&self) -> Formatting {
        self.formatting
    }

    pub fn max_row_len(&self) -> usize {
        self.max_row_len
    }

    /// Formats ` - <title> <date>` linking to `url`.
    ///
    /// Only the title is shortened; the URL and date are always kept whole,
    /// so a row may exceed `max_row_len` when they alone do.
    pub fn format(&self, timestamp: Timestamp, title: &str, url: &str) -> String {
        let date = timestamp.to_rfc2822();
        let title = clean_title(title);
        let escape = self.formatting == Formatting::RichText;

        let (prefix, suffix) = match self.formatting {
            Formatting::PlainText => (" - ".to_string(), format!("{date} {url}")),
            Formatting::RichText => (
                format!(" - <a href=\"{}\">", escape_html(url, true)),
                format!("{date}</a>"),
            ),
        };
        // One extra for the space between title and date.
        let overhead = prefix.chars().count() + suffix.chars().count() + 1;
        let fitted = fit_title(&title, self.max_row_len.saturating_sub(overhead), escape);

        if fitted.is_empty() {
            format!("{prefix}{suffix}")
        } else {
            format!("{prefix}{fitted} {suffix}")
        }
    }

    /// Header line, bold in rich text.
    pub fn header(&self, text: &str) -> String {
        match self.formatting {
            Formatting::PlainText => clean_title(text),
            Formatting::RichText => format!("<b>{}</b>", escape_html(&clean_title(text), false)),
        }
    }
}

/// Collapses whitespace and control characters so the row stays on one line.
fn clean_title(title: &str) -> String {
    title
        .split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes and truncates `title` to at most `budget` rendered characters,
/// never cutting an escape sequence in half.
fn fit_title(title: &str, budget: usize, escape: bool) -> String {
    let rendered: Vec<String> = title
        .chars()
        .map(|c| {
            if escape {
                escape_char(c, false)
            } else {
                c.to_string()
            }
        })
        .collect();
    let total: usize = rendered.iter().map(|r| r.chars().count()).sum();
    if total <= budget {
        return rendered.concat();
    }
    if budget < 2 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for piece in &rendered {
        let width = piece.chars().count();
        if used + width > budget - 1 {
            break;
        }
        out.push_str(piece);
        used += width;
    }
    let mut out = out.trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

fn escape_char(c: char, attribute: bool) -> String {
    match c {
        '&' => "&amp;".to_string(),
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '"' if attribute => "&quot;".to_string(),
        other => other.to_string(),
    }
}

fn escape_html(text: &str, attribute: bool) -> String {
    text.chars().map(|c| escape_char(c, attribute)).collect()
}
