//! Incremental UTF-8 decoding for documents read from files or pipes.
//!
//! Multi-byte characters split across chunks are carried over; invalid byte
//! sequences become U+FFFD and decoding continues.

use std::io::{self, Read};

const REPLACEMENT: char = '\u{FFFD}';

/// Decodes a byte stream chunk by chunk into a growing `String`.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    /// Incomplete UTF-8 suffix of the previous chunk; never longer than 3 bytes.
    carry: Vec<u8>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held back waiting for the rest of a character.
    pub fn pending(&self) -> &[u8] {
        &self.carry
    }

    pub fn push(&mut self, text: &mut String, mut bytes: &[u8]) {
        while !self.carry.is_empty() && !bytes.is_empty() {
            let expected = sequence_len(self.carry[0]);
            if expected == 0 {
                text.push(REPLACEMENT);
                self.carry.clear();
                break;
            }
            let needed = expected.saturating_sub(self.carry.len());
            if bytes.len() < needed {
                self.carry.extend_from_slice(bytes);
                return;
            }
            // Complete the held-back character in a small scratch buffer so the
            // rest of the chunk is decoded in place.
            let mut scratch = [0u8; 4];
            let held = self.carry.len();
            scratch[..held].copy_from_slice(&self.carry);
            scratch[held..held + needed].copy_from_slice(&bytes[..needed]);
            self.carry.clear();
            self.decode(text, &scratch[..held + needed]);
            bytes = &bytes[needed..];
        }
        if !bytes.is_empty() {
            self.decode(text, bytes);
        }
    }

    /// Flushes held-back bytes lossily so a truncated stream is never silently
    /// shortened.
    pub fn finish(&mut self, text: &mut String) {
        if !self.carry.is_empty() {
            text.push_str(&String::from_utf8_lossy(&self.carry));
            self.carry.clear();
        }
    }

    fn decode(&mut self, text: &mut String, mut bytes: &[u8]) {
        loop {
            match std::str::from_utf8(bytes) {
                Ok(valid) => {
                    text.push_str(valid);
                    return;
                }
                Err(err) => {
                    let (valid, after) = bytes.split_at(err.valid_up_to());
                    // `valid` was just checked by `from_utf8`.
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(REPLACEMENT);
                            bytes = &after[len..];
                        }
                        None => {
                            self.carry.extend_from_slice(after);
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn sequence_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Reads `reader` to the end in `chunk_size` pieces, decoding lossily.
pub fn read_utf8_lossy<R: Read>(reader: &mut R, chunk_size: usize) -> io::Result<String> {
    let mut text = String::new();
    let mut decoder = ChunkDecoder::new();
    let mut buf = vec![0u8; chunk_size.max(4)];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        decoder.push(&mut text, &buf[..n]);
    }
    decoder.finish(&mut text);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(chunks: &[&[u8]]) -> (String, ChunkDecoder) {
        let mut text = String::new();
        let mut decoder = ChunkDecoder::new();
        for chunk in chunks {
            decoder.push(&mut text, chunk);
        }
        (text, decoder)
    }

    #[test]
    fn character_split_across_chunks_is_reassembled() {
        let (text, decoder) = feed(&[&[0xC3]]);
        assert_eq!(text, "");
        assert_eq!(decoder.pending(), &[0xC3]);

        let (text, decoder) = feed(&[&[0xC3], &[0x97]]);
        assert_eq!(text, "\u{D7}");
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn completed_carry_is_followed_by_the_rest_of_the_chunk() {
        // U+1F600 is F0 9F 98 80.
        let (text, decoder) = feed(&[&[0xF0, 0x9F], &[0x98, 0x80, b'!']]);
        assert_eq!(text, "\u{1F600}!");
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn a_chunk_can_leave_a_new_carry_behind() {
        // U+20AC is E2 82 AC.
        let (text, decoder) = feed(&[&[0xE2], &[0x82, 0xAC, 0xE2]]);
        assert_eq!(text, "\u{20AC}");
        assert_eq!(decoder.pending(), &[0xE2]);
    }

    #[test]
    fn carry_grows_over_one_byte_chunks() {
        let (text, decoder) = feed(&[&[0xF0], &[0x9F], &[0x98]]);
        assert_eq!(text, "");
        assert_eq!(decoder.pending(), &[0xF0, 0x9F, 0x98]);
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let (text, decoder) = feed(&[&[0xFF, b'f', 0xC0, b'g']]);
        assert_eq!(text, "\u{FFFD}f\u{FFFD}g");
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn truncated_stream_is_flushed() {
        let (mut text, mut decoder) = feed(&[&[b'a', 0xE2, 0x82]]);
        assert_eq!(text, "a");
        decoder.finish(&mut text);
        assert_eq!(text, "a\u{FFFD}");
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn read_utf8_lossy_reassembles_tiny_chunks() {
        let source = "<p>caf\u{e9} \u{20ac}</p>".as_bytes().to_vec();
        let mut reader = std::io::Cursor::new(source);
        let text = read_utf8_lossy(&mut reader, 1).unwrap();
        assert_eq!(text, "<p>caf\u{e9} \u{20ac}</p>");
    }
}
