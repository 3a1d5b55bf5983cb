//! Loading service configuration from TOML plus a few env overrides.
//!
//! See `GachaConfig` and `Aliases` for the expected schema. Every key is
//! optional; missing keys fall back to the defaults below.

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_SHEET_PREFIX: &str = "https://docs.google.com/spreadsheets/";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GachaConfig {
  /// Display title handed to the UI.
  pub title: String,
  /// Default spreadsheet CSV export URL (SHEET_CSV_URL overrides).
  pub sheet_url: Option<String>,
  /// User-supplied URLs are honored only when they start with this.
  pub allowed_url_prefix: String,
  /// Capacity of the recently-shown id window.
  pub history_limit: usize,
  /// How many recent results are kept for display.
  pub recent_limit: usize,
  /// Topics per spin when the request does not say.
  pub default_count: usize,
  /// Artificial pause between "drawing" and the result. 0 disables it.
  pub spin_delay_ms: u64,
  pub fetch_timeout_secs: u64,
  pub missing_enabled: MissingEnabled,
  pub category_match: CategoryMatch,
  pub category_priority: Vec<String>,
  /// Label for rows without a category.
  pub default_category: String,
  /// JSON file for liked topic ids. In-memory only when unset.
  pub likes_path: Option<String>,
  /// Fixed RNG seed for reproducible draws.
  pub rng_seed: Option<u64>,
  pub aliases: Aliases,
}

impl Default for GachaConfig {
  fn default() -> Self {
    Self {
      title: "雑談ガチャ".into(),
      sheet_url: None,
      allowed_url_prefix: DEFAULT_SHEET_PREFIX.into(),
      history_limit: 5,
      recent_limit: 5,
      default_count: 1,
      spin_delay_ms: 600,
      fetch_timeout_secs: 10,
      missing_enabled: MissingEnabled::Disabled,
      category_match: CategoryMatch::Exact,
      category_priority: ["貯める", "稼ぐ", "増やす", "守る", "使う"]
        .iter()
        .map(|s| s.to_string())
        .collect(),
      default_category: "未分類".into(),
      likes_path: None,
      rng_seed: None,
      aliases: Aliases::default(),
    }
  }
}

/// What a row without any `enabled` value means.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingEnabled {
  Enabled,
  Disabled,
}

/// How a category filter is compared against a topic's category.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryMatch {
  Exact,
  /// Substring containment, kept for sheets built against the older UI.
  Contains,
}

impl CategoryMatch {
  pub fn matches(self, category: &str, filter: &str) -> bool {
    match self {
      CategoryMatch::Exact => category == filter,
      CategoryMatch::Contains => category.contains(filter),
    }
  }
}

/// Header names tried in order for each topic field.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Aliases {
  pub id: Vec<String>,
  pub category: Vec<String>,
  pub text: Vec<String>,
  pub enabled: Vec<String>,
  pub selection_count: Vec<String>,
}

fn owned(keys: &[&str]) -> Vec<String> {
  keys.iter().map(|k| k.to_string()).collect()
}

impl Default for Aliases {
  fn default() -> Self {
    Self {
      id: owned(&["ID", "id", "ネタID"]),
      category: owned(&["Category", "category", "カテゴリ"]),
      text: owned(&["Text", "text", "ネタ内容"]),
      enabled: owned(&["Enabled", "enabled", "有効"]),
      selection_count: owned(&[
        "SelectionCount",
        "selectionCount",
        "selection_count",
        "Count",
        "count",
        "選択回数",
      ]),
    }
  }
}

impl GachaConfig {
  /// Apply SHEET_CSV_URL / APP_TITLE on top of whatever the file said.
  pub fn with_env_overrides(mut self) -> Self {
    if let Ok(url) = std::env::var("SHEET_CSV_URL") {
      if !url.trim().is_empty() {
        self.sheet_url = Some(url.trim().to_string());
      }
    }
    if let Ok(title) = std::env::var("APP_TITLE") {
      if !title.trim().is_empty() {
        self.title = title.trim().to_string();
      }
    }
    self
  }
}

/// Attempt to load `GachaConfig` from GACHA_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<GachaConfig> {
  let path = std::env::var("GACHA_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<GachaConfig>(&s) {
      Ok(cfg) => {
        info!(target: "topic_gacha", %path, "Loaded gacha config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "topic_gacha", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "topic_gacha", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// File config (or defaults) plus env overrides.
pub fn resolve_config() -> GachaConfig {
  load_config_from_env().unwrap_or_default().with_env_overrides()
}
