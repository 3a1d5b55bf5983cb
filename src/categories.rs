//! Category list shown to the player, derived from the active dataset.

use crate::domain::Topic;

/// Distinct non-empty categories. Those named in `priority` come first (in
/// priority order, only if present); the rest follow in first-occurrence order.
pub fn derive_categories(topics: &[Topic], priority: &[String]) -> Vec<String> {
  let mut seen: Vec<String> = Vec::new();
  for t in topics {
    if !t.category.is_empty() && !seen.contains(&t.category) {
      seen.push(t.category.clone());
    }
  }

  let mut out: Vec<String> = priority
    .iter()
    .filter(|p| seen.contains(p))
    .fold(Vec::new(), |mut acc, p| {
      if !acc.contains(p) {
        acc.push(p.clone());
      }
      acc
    });
  out.extend(seen.into_iter().filter(|c| !priority.contains(c)));
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::GachaConfig;
  use crate::seeds::fallback_topics;

  fn s(v: &[&str]) -> Vec<String> {
    v.iter().map(|x| x.to_string()).collect()
  }

  #[test]
  fn fallback_categories_priority_first() {
    let cats = derive_categories(&fallback_topics(), &GachaConfig::default().category_priority);
    assert_eq!(cats, s(&["貯める", "稼ぐ", "増やす", "守る", "使う", "軽い雑談", "リベネタ"]));
  }

  #[test]
  fn without_priority_first_occurrence_wins() {
    let cats = derive_categories(&fallback_topics(), &[]);
    assert_eq!(cats, s(&["貯める", "軽い雑談", "増やす", "稼ぐ", "守る", "使う", "リベネタ"]));
  }

  #[test]
  fn absent_priority_entries_and_blanks_skipped() {
    let mut topics = fallback_topics();
    topics.retain(|t| t.category == "軽い雑談" || t.category == "使う");
    topics[0].category = String::new();
    let cats = derive_categories(&topics, &s(&["貯める", "使う"]));
    assert_eq!(cats, s(&["使う", "軽い雑談"]));
  }
}
