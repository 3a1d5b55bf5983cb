//! Domain models: topics, category filters and where a dataset came from.

use serde::{Deserialize, Serialize};

/// Wire value of the "no filter" sentinel.
pub const ALL_CATEGORIES: &str = "all";

/// One selectable prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
  pub id: String,
  pub category: String,
  pub text: String,
  pub enabled: bool,
  /// Display counter from the sheet; never touched by the selector.
  #[serde(default, rename = "selectionCount", skip_serializing_if = "Option::is_none")]
  pub selection_count: Option<u32>,
}

impl Topic {
  pub fn new(id: &str, category: &str, text: &str, selection_count: u32) -> Self {
    Self {
      id: id.into(),
      category: category.into(),
      text: text.into(),
      enabled: true,
      selection_count: Some(selection_count),
    }
  }
}

/// Which topics a draw may consider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryFilter {
  All,
  Only(String),
}

impl CategoryFilter {
  /// Absent, blank and `"all"` all mean "no filter".
  pub fn from_param(raw: Option<&str>) -> Self {
    match raw.map(str::trim) {
      None | Some("") | Some(ALL_CATEGORIES) => CategoryFilter::All,
      Some(cat) => CategoryFilter::Only(cat.to_string()),
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      CategoryFilter::All => ALL_CATEGORIES,
      CategoryFilter::Only(cat) => cat,
    }
  }
}

impl std::fmt::Display for CategoryFilter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Where did the active dataset come from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
  Sheet,    // fetched and parsed from the spreadsheet export
  Fallback, // built-in topics (source missing, failed or empty)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn filter_sentinel_variants() {
    assert_eq!(CategoryFilter::from_param(None), CategoryFilter::All);
    assert_eq!(CategoryFilter::from_param(Some("  ")), CategoryFilter::All);
    assert_eq!(CategoryFilter::from_param(Some("all")), CategoryFilter::All);
    assert_eq!(
      CategoryFilter::from_param(Some(" 稼ぐ ")),
      CategoryFilter::Only("稼ぐ".into())
    );
  }

  #[test]
  fn topic_serializes_selection_count_in_camel_case() {
    let t = Topic::new("1", "貯める", "最近節約できたことは？", 5);
    let v = serde_json::to_value(&t).unwrap();
    assert_eq!(v["selectionCount"], 5);
    assert_eq!(v["enabled"], true);
  }
}
