use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use listwatch_logging::watch_warn;

/// How far into the page a `<meta charset>` declaration is looked for.
const META_PRESCAN_BYTES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding_label: String,
    /// Some bytes were invalid and replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode an archive page into UTF-8.
///
/// Encoding is taken from the BOM, then the Content-Type charset, then a
/// `<meta>` charset declaration, then chardetng's guess. Old archive pages
/// mix encodings, so invalid bytes are replaced rather than rejected.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    let declared = content_type
        .and_then(charset_param)
        .or_else(|| sniff_meta_charset(bytes))
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    if let Some(enc) = declared {
        return decode_with(bytes, enc);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim_matches([' ', '"', '\''].as_ref()).to_string())
    })
}

/// Finds `charset=<label>` in the head of the document, covering both
/// `<meta charset="...">` and `<meta http-equiv content="...; charset=...">`.
fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_BYTES)];
    let lower = head.to_ascii_lowercase();
    let needle = b"charset=";
    let start = lower.windows(needle.len()).position(|w| w == needle)? + needle.len();
    let label: String = lower[start..]
        .iter()
        .skip_while(|b| matches!(b, b'"' | b'\'' | b' '))
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
        .map(|b| char::from(*b))
        .collect();
    (!label.is_empty()).then_some(label)
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedPage {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        watch_warn!("page is not valid {}; invalid bytes replaced", enc.name());
    }
    DecodedPage {
        html: text.into_owned(),
        encoding_label: enc.name().to_string(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::{charset_param, sniff_meta_charset};

    #[test]
    fn charset_param_is_case_insensitive() {
        assert_eq!(
            charset_param("text/html; Charset=\"ISO-8859-1\""),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(charset_param("text/html"), None);
    }

    #[test]
    fn sniffs_pipermail_meta_tag() {
        let html = br#"<HTML><HEAD><META http-equiv="Content-Type" content="text/html; charset=us-ascii"></HEAD>"#;
        assert_eq!(sniff_meta_charset(html), Some("us-ascii".to_string()));
        assert_eq!(sniff_meta_charset(b"<meta charset='utf-8'>"), Some("utf-8".to_string()));
        assert_eq!(sniff_meta_charset(b"<html></html>"), None);
    }
}
