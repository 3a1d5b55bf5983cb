//! Small utility helpers used across modules.

/// Log-safe truncation for large strings (on a char boundary).
/// Avoids spamming logs with long URLs or CSV bodies.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncates_on_char_boundary() {
    assert_eq!(trunc_for_log("abc", 5), "abc");
    // each kana is 3 bytes; a cut at 4 must back off to 3
    assert_eq!(trunc_for_log("あいう", 4), "あ… (9 bytes total)");
  }
}
