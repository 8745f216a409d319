//! Character references: decoding while tokenizing, escaping while serializing.
//!
//! The decoder understands the handful of references editors emit. The encoder only
//! produces `&amp;`, `&lt;`, `&gt;`, `&quot;` and `&nbsp;`.

use memchr::memchr;

/// Escape text content for serialization. Non-breaking spaces are written as
/// `&nbsp;` so that editor padding survives a round trip visibly.
pub fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Escape an attribute value for a double-quoted serialization.
pub fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

const NAMED: &[(&str, char)] = &[
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&apos;", '\''),
    ("&nbsp;", '\u{00A0}'),
];

// Enough digits for U+10FFFF; longer runs are never decoded.
const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

/// Outcome of reading one reference starting at `&`.
enum Reference<'a> {
    Char(char, usize),
    /// Copied through unchanged.
    Verbatim(&'a str),
}

/// Index of the `;` ending a run of 1..=`max` digits starting at `start`.
fn numeric_end(bytes: &[u8], start: usize, max: usize, hex: bool) -> Option<usize> {
    let digits = bytes[start..]
        .iter()
        .take(max + 1)
        .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
        .count();
    if digits == 0 || digits > max {
        return None;
    }
    (bytes.get(start + digits) == Some(&b';')).then_some(start + digits)
}

/// A malformed numeric reference runs to its `;` (inclusive) or stops before the
/// next `&` or whitespace.
fn malformed_span(s: &str) -> &str {
    let bytes = s.as_bytes();
    for (j, b) in bytes.iter().enumerate().skip(1) {
        match b {
            b';' => return &s[..=j],
            b'&' => return &s[..j],
            b if b.is_ascii_whitespace() => return &s[..j],
            _ => {}
        }
    }
    s
}

fn read_reference(s: &str) -> Reference<'_> {
    for (name, ch) in NAMED {
        if s.starts_with(*name) {
            return Reference::Char(*ch, name.len());
        }
    }
    let bytes = s.as_bytes();
    let (digits_start, hex) = match bytes.get(1..3) {
        Some(b"#x" | b"#X") => (3, true),
        _ if bytes.get(1) == Some(&b'#') => (2, false),
        _ => return Reference::Verbatim("&"),
    };
    let max = if hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };
    let Some(end) = numeric_end(bytes, digits_start, max, hex) else {
        return Reference::Verbatim(malformed_span(s));
    };
    let radix = if hex { 16 } else { 10 };
    match u32::from_str_radix(&s[digits_start..end], radix)
        .ok()
        .and_then(char::from_u32)
    {
        Some(ch) => Reference::Char(ch, end + 1),
        None => Reference::Verbatim(&s[..=end]),
    }
}

/// Decode a minimal, explicitly limited subset of HTML entities.
///
/// - Named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// - Numeric, only when semicolon-terminated: `&#123;` and `&#x1F4A9;`. Values
///   that are not Unicode scalars stay as written.
/// - Anything else, including overlong digit runs, is left unchanged.
pub fn decode_entities(s: &str) -> String {
    let Some(first) = memchr(b'&', s.as_bytes()) else {
        return s.to_string();
    };
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut rest = &s[first..];
    while !rest.is_empty() {
        let consumed = match read_reference(rest) {
            Reference::Char(ch, len) => {
                out.push(ch);
                len
            }
            Reference::Verbatim(span) => {
                out.push_str(span);
                span.len()
            }
        };
        rest = &rest[consumed..];
        let next = memchr(b'&', rest.as_bytes()).unwrap_or(rest.len());
        out.push_str(&rest[..next]);
        rest = &rest[next..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped_text(s: &str) -> String {
        let mut out = String::new();
        escape_text(s, &mut out);
        out
    }

    fn escaped_attribute(s: &str) -> String {
        let mut out = String::new();
        escape_attribute(s, &mut out);
        out
    }

    #[test]
    fn decode_entities_decodes_common_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(decode_entities("&apos;x&apos;"), "'x'");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{00A0}b");
        assert_eq!(decode_entities("&#215;&#xD7;"), "××");
    }

    #[test]
    fn decode_entities_passes_through_malformed_references() {
        assert_eq!(decode_entities("&notanentity; &amp"), "&notanentity; &amp");
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("&#x110000;"), "&#x110000;");
        assert_eq!(decode_entities("&#xZZ;&amp;"), "&#xZZ;&");
    }

    #[test]
    fn escape_text_round_trips_through_decode() {
        let samples = ["plain", "a < b && c > d", "x\u{00A0}\u{00A0}y", "quote \" stays"];
        for s in samples {
            assert_eq!(decode_entities(&escaped_text(s)), s);
        }
        assert_eq!(escaped_text("a\u{00A0}<"), "a&nbsp;&lt;");
    }

    #[test]
    fn escape_attribute_quotes_double_quotes_only() {
        assert_eq!(escaped_attribute(r#"say "hi" & 'bye'"#), "say &quot;hi&quot; &amp; 'bye'");
    }
}
