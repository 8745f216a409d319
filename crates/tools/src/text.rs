//! Char-boundary arithmetic for caret positions inside text nodes.
//!
//! Text offsets are byte offsets that always sit on UTF-8 character boundaries;
//! caret movement is counted in characters.

/// Clamp an arbitrary byte index to a valid UTF-8 character boundary.
///
/// If `index` is beyond the string length, it is clamped to `s.len()`.
/// If `index` falls in the middle of a multi-byte character, it is
/// adjusted backwards to the start of that character.
///
/// ```
/// use tools::text::clamp_to_char_boundary;
///
/// let s = "a€b"; // '€' is 3 bytes
/// assert_eq!(clamp_to_char_boundary(s, 2), 1);
/// assert_eq!(clamp_to_char_boundary(s, 4), 4);
/// assert_eq!(clamp_to_char_boundary(s, 100), 5);
/// ```
#[inline]
pub fn clamp_to_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Byte offset of the character boundary before `i`, or 0 at the start.
pub fn prev_cursor_boundary(s: &str, i: usize) -> usize {
    let i = clamp_to_char_boundary(s, i);
    s[..i].char_indices().last().map(|(idx, _)| idx).unwrap_or(0)
}

/// Byte offset of the character boundary after `i`, or `s.len()` at the end.
pub fn next_cursor_boundary(s: &str, i: usize) -> usize {
    let i = clamp_to_char_boundary(s, i);
    if i >= s.len() {
        return s.len();
    }
    let mut it = s[i..].char_indices();
    let _ = it.next();
    it.next().map(|(idx, _)| i + idx).unwrap_or(s.len())
}

/// Number of characters in `s`.
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Number of characters before byte offset `i`.
pub fn chars_before(s: &str, i: usize) -> usize {
    char_len(&s[..clamp_to_char_boundary(s, i)])
}

/// Byte offset reached by moving `chars` characters forward from byte `from`.
///
/// Returns `None` when fewer than `chars` characters follow `from`.
///
/// ```
/// use tools::text::advance_chars;
///
/// assert_eq!(advance_chars("a€b", 0, 2), Some(4));
/// assert_eq!(advance_chars("a€b", 1, 2), Some(5));
/// assert_eq!(advance_chars("a€b", 1, 3), None);
/// ```
pub fn advance_chars(s: &str, from: usize, chars: usize) -> Option<usize> {
    let from = clamp_to_char_boundary(s, from);
    if chars == 0 {
        return Some(from);
    }
    let tail = &s[from..];
    match tail.char_indices().nth(chars) {
        Some((idx, _)) => Some(from + idx),
        None if char_len(tail) == chars => Some(s.len()),
        None => None,
    }
}

/// Byte offset reached by moving `chars` characters backward from byte `from`.
///
/// Returns `None` when fewer than `chars` characters precede `from`.
pub fn retreat_chars(s: &str, from: usize, chars: usize) -> Option<usize> {
    let from = clamp_to_char_boundary(s, from);
    if chars == 0 {
        return Some(from);
    }
    s[..from]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(idx, _)| idx)
}
