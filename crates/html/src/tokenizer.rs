//! Small HTML tokenizer for editable fragments.
//!
//! Tag and attribute names are limited to ASCII `[A-Za-z0-9:_-]` and are lowercased.
//! Attribute order is preserved so markup survives a parse/serialize round trip.
//!
//! Known limitations:
//! - No HTML5 parse-error recovery; malformed markup degrades to text or is skipped.
//! - A `<script>`/`<style>` body ends at the first matching close tag followed by
//!   optional ASCII whitespace and `>`.
use crate::entities::decode_entities;
use crate::types::{Attribute, Token};
use memchr::memchr;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':')
}

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_rawtext_element(name: &str) -> bool {
    name == "script" || name == "style"
}

/// Byte cursor over the input. Every position it stops at is a UTF-8 char
/// boundary because it only ever steps over ASCII bytes or jumps to one.
struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    out: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            out: Vec::new(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn rest_starts_with_ignore_case(&self, needle: &[u8]) -> bool {
        self.bytes
            .get(self.pos..self.pos + needle.len())
            .is_some_and(|window| window.eq_ignore_ascii_case(needle))
    }

    fn bump_char(&mut self) {
        self.pos += self.rest().chars().next().map_or(1, char::len_utf8);
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.skip_while(|b| b.is_ascii_whitespace());
    }

    fn run(mut self) -> Vec<Token> {
        while !self.at_end() {
            let keep_going = if self.peek() != Some(b'<') {
                self.text();
                true
            } else if self.rest().starts_with(COMMENT_OPEN) {
                self.comment()
            } else if self.rest_starts_with_ignore_case(b"<!doctype") {
                self.doctype()
            } else if self.bytes.get(self.pos + 1) == Some(&b'/') {
                self.end_tag();
                true
            } else {
                self.start_tag()
            };
            if !keep_going {
                break;
            }
        }
        self.out
    }

    fn text(&mut self) {
        let raw = self.skip_while(|b| b != b'<');
        let decoded = decode_entities(raw);
        if !decoded.is_empty() {
            self.out.push(Token::Text(decoded));
        }
    }

    /// False when the comment runs to the end of the input.
    fn comment(&mut self) -> bool {
        let body = &self.rest()[COMMENT_OPEN.len()..];
        match body.find(COMMENT_CLOSE) {
            Some(end) => {
                self.out.push(Token::Comment(body[..end].to_string()));
                self.pos += COMMENT_OPEN.len() + end + COMMENT_CLOSE.len();
                true
            }
            None => {
                self.out.push(Token::Comment(body.to_string()));
                false
            }
        }
    }

    /// False when the doctype is unterminated; the remainder is dropped.
    fn doctype(&mut self) -> bool {
        let body = &self.rest()[2..];
        let Some(end) = body.find('>') else {
            return false;
        };
        self.out.push(Token::Doctype(body[..end].trim().to_string()));
        self.pos += 2 + end + 1;
        true
    }

    fn end_tag(&mut self) {
        self.pos += 2;
        let name = self.skip_while(is_name_byte).to_ascii_lowercase();
        self.skip_while(|b| b != b'>');
        if !self.at_end() {
            self.pos += 1;
        }
        self.out.push(Token::EndTag(name));
    }

    /// False when a rawtext element consumed the rest of the input.
    fn start_tag(&mut self) -> bool {
        self.pos += 1;
        let name = self.skip_while(is_name_byte).to_ascii_lowercase();
        if name.is_empty() {
            // A bare '<' that does not open a tag is text.
            self.out.push(Token::Text("<".to_string()));
            return true;
        }
        let (attributes, explicit_close) = self.attributes();
        let self_closing = explicit_close || is_void_element(&name);
        let rawtext = is_rawtext_element(&name) && !self_closing;
        self.out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        if rawtext {
            return self.rawtext_body(name);
        }
        true
    }

    /// Reads attributes up to and including the closing `>`. The flag reports a
    /// trailing `/>`.
    fn attributes(&mut self) -> (Vec<Attribute>, bool) {
        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return (attributes, false),
                Some(b'>') => {
                    self.pos += 1;
                    return (attributes, false);
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.peek() == Some(b'>') {
                        self.pos += 1;
                        return (attributes, true);
                    }
                    continue;
                }
                Some(_) => {}
            }
            let name = self.skip_while(is_name_byte);
            if name.is_empty() {
                // Junk inside a tag may be any character, not just one byte.
                self.bump_char();
                continue;
            }
            let name = name.to_ascii_lowercase();
            self.skip_whitespace();
            let value = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.skip_whitespace();
                Some(self.attribute_value())
            } else {
                None
            };
            attributes.push((name, value));
        }
    }

    fn attribute_value(&mut self) -> String {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let raw = self.skip_while(|b| b != quote);
                if !self.at_end() {
                    self.pos += 1;
                }
                decode_entities(raw)
            }
            _ => {
                let start = self.pos;
                while let Some(b) = self.peek() {
                    let closes = b == b'/' && self.bytes.get(self.pos + 1) == Some(&b'>');
                    if b.is_ascii_whitespace() || b == b'>' || closes {
                        break;
                    }
                    self.pos += 1;
                }
                decode_entities(&self.input[start..self.pos])
            }
        }
    }

    /// Emits the raw body of a `<script>`/`<style>` element and its end tag. A
    /// missing close tag ends the element at the end of the input.
    fn rawtext_body(&mut self, name: String) -> bool {
        let close = format!("</{name}");
        let body = self.rest();
        let found = find_close_tag(body.as_bytes(), close.as_bytes());
        let (raw, consumed) = match found {
            Some((start, end)) => (&body[..start], Some(end)),
            None => (body, None),
        };
        if !raw.is_empty() {
            self.out.push(Token::Text(raw.to_string()));
        }
        self.out.push(Token::EndTag(name));
        match consumed {
            Some(end) => {
                self.pos += end;
                true
            }
            None => false,
        }
    }
}

/// Finds `close` (an ASCII `</name`) case-insensitively, followed by optional
/// whitespace and `>`. Returns the byte span of the whole tag.
fn find_close_tag(hay: &[u8], close: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + close.len() <= hay.len() {
        i += memchr(b'<', &hay[i..])?;
        let candidate = hay.get(i..i + close.len())?;
        if candidate.eq_ignore_ascii_case(close) {
            let mut k = i + close.len();
            while k < hay.len() && hay[k].is_ascii_whitespace() {
                k += 1;
            }
            if hay.get(k) == Some(&b'>') {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

/// Tokenizes `input` into start/end tags, text, comments and doctypes.
pub fn tokenize(input: &str) -> Vec<Token> {
    Scanner::new(input).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_tag(name: &str, attributes: &[(&str, Option<&str>)]) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
            self_closing: false,
        }
    }

    #[test]
    fn tokenize_preserves_utf8_text_nodes() {
        let tokens = tokenize("<p>120×32</p>");
        assert!(
            tokens
                .iter()
                .any(|t| matches!(t, Token::Text(s) if s == "120×32")),
            "expected UTF-8 text token, got: {tokens:?}"
        );
    }

    #[test]
    fn tokenize_keeps_change_attributes_in_source_order() {
        let tokens = tokenize(r#"<SPAN class="ins" data-cid="1" data-userid='4' title=x>ab</span>"#);
        assert_eq!(
            tokens,
            vec![
                start_tag(
                    "span",
                    &[
                        ("class", Some("ins")),
                        ("data-cid", Some("1")),
                        ("data-userid", Some("4")),
                        ("title", Some("x")),
                    ],
                ),
                Token::Text("ab".to_string()),
                Token::EndTag("span".to_string()),
            ]
        );
    }

    #[test]
    fn tokenize_marks_void_elements_self_closing() {
        let tokens = tokenize("a<br>b<img src=x.png>");
        assert!(matches!(
            &tokens[1],
            Token::StartTag { name, self_closing: true, .. } if name == "br"
        ));
        assert!(matches!(
            &tokens[3],
            Token::StartTag { name, self_closing: true, .. } if name == "img"
        ));
    }

    #[test]
    fn tokenize_decodes_entities_in_text_and_attributes() {
        let tokens = tokenize(r#"<p title="a &amp; b">x&nbsp;y</p>"#);
        assert_eq!(tokens[0], start_tag("p", &[("title", Some("a & b"))]));
        assert_eq!(tokens[1], Token::Text("x\u{00A0}y".to_string()));
    }

    #[test]
    fn tokenize_handles_boolean_attributes() {
        let tokens = tokenize("<input disabled>");
        assert!(matches!(
            &tokens[0],
            Token::StartTag { attributes, .. } if attributes == &vec![("disabled".to_string(), None)]
        ));
    }

    #[test]
    fn tokenize_handles_uppercase_doctype() {
        let tokens = tokenize("<!DOCTYPE html>");
        assert_eq!(tokens, vec![Token::Doctype("DOCTYPE html".to_string())]);
    }

    #[test]
    fn tokenize_finds_script_end_tag_case_insensitive() {
        let tokens = tokenize("<script>let x = 1 < 2;</ScRiPt >");
        assert_eq!(
            tokens,
            vec![
                start_tag("script", &[]),
                Token::Text("let x = 1 < 2;".to_string()),
                Token::EndTag("script".to_string()),
            ]
        );
    }

    #[test]
    fn rawtext_close_tag_does_not_accept_near_matches() {
        let tokens = tokenize("<style>ok</stylex >no</style>");
        assert_eq!(tokens[1], Token::Text("ok</stylex >no".to_string()));
    }

    #[test]
    fn tokenize_keeps_unterminated_comment() {
        let tokens = tokenize("a<!-- open");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a".to_string()),
                Token::Comment(" open".to_string())
            ]
        );
    }

    #[test]
    fn tokenize_treats_stray_angle_bracket_as_text() {
        let tokens = tokenize("1 < 2");
        assert_eq!(
            tokens,
            vec![
                Token::Text("1 ".to_string()),
                Token::Text("<".to_string()),
                Token::Text(" 2".to_string()),
            ]
        );
    }

    #[test]
    fn tokenize_skips_non_ascii_junk_inside_tags() {
        assert_eq!(
            tokenize("<a\u{e9}>x</a>"),
            vec![
                start_tag("a", &[]),
                Token::Text("x".to_string()),
                Token::EndTag("a".to_string()),
            ]
        );
        let tokens = tokenize("<p title=\u{201c}a b\u{201d}>hi</p>");
        assert_eq!(
            tokens[0],
            start_tag("p", &[("title", Some("\u{201c}a")), ("b", None)])
        );
        assert_eq!(tokens[1], Token::Text("hi".to_string()));
    }

    #[test]
    fn tokenize_handles_tons_of_angle_brackets() {
        let input = "<".repeat(20_000);
        let tokens = tokenize(&input);
        assert!(tokens.len() <= input.len());
    }
}
