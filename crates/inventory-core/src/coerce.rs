//! Loose text-to-number coercion used by ordering predicates on fact values.
//!
//! The rules match Ruby's `String#to_f`, which existing inventory clients
//! depend on: the longest leading numeric prefix is parsed and anything that
//! does not start like a number is `0.0`. `"abc"`, `""` and `"0x1A"` are all
//! zero, `"12abc"` is twelve.

/// Coerce `s` to a float the way `String#to_f` does.
pub fn loose_float(s: &str) -> f64 {
  let prefix = numeric_prefix(s.trim_start());
  if prefix.is_empty() {
    return 0.0;
  }
  prefix.replace('_', "").parse().unwrap_or(0.0)
}

/// The longest prefix of `s` shaped like `[+-]digits[.digits][e[+-]digits]`,
/// where digit runs may contain single underscores between digits.
fn numeric_prefix(s: &str) -> &str {
  let bytes = s.as_bytes();
  let mut i = 0;

  if matches!(bytes.first(), Some(b'+' | b'-')) {
    i += 1;
  }

  let int_end = scan_digits(bytes, i);
  let has_int = int_end > i;
  let mut end = int_end;

  if bytes.get(end) == Some(&b'.') {
    let frac_end = scan_digits(bytes, end + 1);
    if frac_end > end + 1 {
      end = frac_end;
    }
  }

  if !has_int && end == int_end {
    return "";
  }

  if matches!(bytes.get(end), Some(b'e' | b'E')) {
    let mut j = end + 1;
    if matches!(bytes.get(j), Some(b'+' | b'-')) {
      j += 1;
    }
    let exp_end = scan_digits(bytes, j);
    if exp_end > j {
      end = exp_end;
    }
  }

  &s[..end]
}

/// Index just past a run of ASCII digits starting at `start`. An underscore
/// is accepted only when it sits between two digits.
fn scan_digits(bytes: &[u8], start: usize) -> usize {
  let mut i = start;
  while i < bytes.len() {
    match bytes[i] {
      b'0'..=b'9' => i += 1,
      b'_'
        if i > start
          && bytes[i - 1].is_ascii_digit()
          && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) =>
      {
        i += 1
      }
      _ => break,
    }
  }
  i
}
