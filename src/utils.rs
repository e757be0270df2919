use chrono::NaiveDate;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::prelude::*;

pub const CODE_LEN: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const TG_MESSAGE_LIMIT: usize = 4096;

/// Generate an opaque redemption code. Unpredictability is a correctness
/// requirement here (a guessable code is a forgeable code), so the RNG is
/// seeded from the OS and `random_range` keeps the draw uniform.
/// Uniqueness is NOT guaranteed: the storage layer's unique index is the
/// authority, and callers regenerate on the rare constraint violation.
pub fn generate_code(len: usize) -> String {
  let mut rng = StdRng::from_os_rng();
  (0..len)
    .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
    .collect()
}

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

/// Parse a `DD.MM.YYYY` string into a timestamp at the start of that day.
pub fn parse_date(input: &str) -> Option<DateTime> {
  NaiveDate::parse_from_str(input.trim(), "%d.%m.%Y")
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Split a message into chunks below the Telegram size limit, preferring
/// line boundaries. `reserve` shrinks the limit (e.g. for a suffix).
pub fn chunk_message(text: &str, reserve: usize) -> Vec<String> {
  let limit = TG_MESSAGE_LIMIT.saturating_sub(reserve).max(1);

  let mut chunks: Vec<String> = Vec::new();
  let mut current = String::new();
  let mut current_chars = 0;

  for line in text.split_inclusive('\n') {
    for piece in split_chars(line, limit) {
      let piece_chars = piece.chars().count();
      if current_chars + piece_chars > limit && current_chars > 0 {
        chunks.push(std::mem::take(&mut current));
        current_chars = 0;
      }
      current.push_str(&piece);
      current_chars += piece_chars;
    }
  }

  if !current.is_empty() || chunks.is_empty() {
    chunks.push(current);
  }
  chunks
}

fn split_chars(line: &str, limit: usize) -> Vec<String> {
  if line.chars().count() <= limit {
    return vec![line.to_string()];
  }

  let mut pieces = Vec::new();
  let mut buf = String::new();
  let mut len = 0;
  for ch in line.chars() {
    if len == limit {
      pieces.push(std::mem::take(&mut buf));
      len = 0;
    }
    buf.push(ch);
    len += 1;
  }
  if !buf.is_empty() {
    pieces.push(buf);
  }
  pieces
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn code_has_expected_shape() {
    let code = generate_code(CODE_LEN);
    assert_eq!(code.len(), CODE_LEN);
    assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
  }

  #[test]
  fn codes_are_not_repeating() {
    let codes: HashSet<_> = (0..64).map(|_| generate_code(CODE_LEN)).collect();
    assert_eq!(codes.len(), 64);
  }

  #[test]
  fn parse_date_accepts_dotted_format() {
    let date = parse_date("31.12.2030").unwrap();
    assert_eq!(format_date(date), "31.12.2030 00:00");
  }

  #[test]
  fn parse_date_rejects_garbage() {
    assert!(parse_date("2030-12-31").is_none());
    assert!(parse_date("tomorrow").is_none());
    assert!(parse_date("32.13.2030").is_none());
  }

  #[test]
  fn short_messages_stay_whole() {
    let chunks = chunk_message("hello\nworld", 0);
    assert_eq!(chunks, vec!["hello\nworld".to_string()]);
  }

  #[test]
  fn long_messages_split_on_lines() {
    let line = "x".repeat(3000);
    let text = format!("{line}\n{line}\n{line}");
    let chunks = chunk_message(&text, 0);
    assert!(chunks.len() >= 2);
    assert!(chunks.iter().all(|c| c.chars().count() <= TG_MESSAGE_LIMIT));
    assert_eq!(chunks.concat(), text);
  }
}
