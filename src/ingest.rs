//! Turning spreadsheet CSV into topics.
//!
//! Sheets are edited by hand, so headers vary (English, camelCase, Japanese).
//! Each field is looked up through an ordered alias list and the first
//! non-empty value wins.

use std::collections::{HashMap, HashSet};

use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::config::{Aliases, GachaConfig, MissingEnabled};
use crate::domain::Topic;
use crate::error::SourceError;

/// One CSV data row keyed by (trimmed) header name.
pub type Row = HashMap<String, String>;

/// Everything normalization needs from the config.
#[derive(Clone, Debug)]
pub struct IngestOptions {
  pub aliases: Aliases,
  pub missing_enabled: MissingEnabled,
  pub default_category: String,
}

impl From<&GachaConfig> for IngestOptions {
  fn from(cfg: &GachaConfig) -> Self {
    Self {
      aliases: cfg.aliases.clone(),
      missing_enabled: cfg.missing_enabled,
      default_category: cfg.default_category.clone(),
    }
  }
}

impl Default for IngestOptions {
  fn default() -> Self {
    Self::from(&GachaConfig::default())
  }
}

/// Header-driven parse. Blank lines are skipped and short/long rows tolerated.
pub fn parse_csv(text: &str) -> Result<Vec<Row>, SourceError> {
  let mut rdr = ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .trim(csv::Trim::Headers)
    .from_reader(text.as_bytes());

  let headers = rdr.headers()?.clone();
  let mut rows = Vec::new();
  for record in rdr.records() {
    // Rows of blank cells (",,,") still count toward `auto-N` positions;
    // only truly empty lines are skipped, by the reader itself.
    let record = record?;
    let row: Row = headers
      .iter()
      .zip(record.iter())
      .map(|(h, v)| (h.to_string(), v.to_string()))
      .collect();
    rows.push(row);
  }
  Ok(rows)
}

/// First non-empty (trimmed) value among `keys`.
fn pick<'a>(row: &'a Row, keys: &[String]) -> Option<&'a str> {
  keys
    .iter()
    .filter_map(|k| row.get(k))
    .map(|v| v.trim())
    .find(|v| !v.is_empty())
}

/// Normalize rows into topics. `auto-N` ids use the 1-based row position.
/// Rows without text are dropped; later rows reusing an id are dropped too.
pub fn normalize_rows(rows: &[Row], opts: &IngestOptions) -> Vec<Topic> {
  let a = &opts.aliases;
  let mut seen_ids = HashSet::new();
  let mut out = Vec::with_capacity(rows.len());

  for (index, row) in rows.iter().enumerate() {
    let text = match pick(row, &a.text) {
      Some(t) => t.to_string(),
      None => continue,
    };
    let id = pick(row, &a.id)
      .map(str::to_string)
      .unwrap_or_else(|| format!("auto-{}", index + 1));
    if !seen_ids.insert(id.clone()) {
      warn!(target: "gacha", %id, row = index + 1, "Duplicate topic id; keeping first occurrence");
      continue;
    }
    let category = pick(row, &a.category)
      .map(str::to_string)
      .unwrap_or_else(|| opts.default_category.clone());
    let enabled = match pick(row, &a.enabled) {
      Some(v) => v.to_uppercase() == "TRUE",
      None => opts.missing_enabled == MissingEnabled::Enabled,
    };
    let selection_count = pick(row, &a.selection_count).and_then(|v| v.parse::<u32>().ok());

    out.push(Topic { id, category, text, enabled, selection_count });
  }

  debug!(target: "gacha", rows = rows.len(), topics = out.len(), "Normalized sheet rows");
  out
}

/// Parse + normalize. A sheet with zero usable rows is an error so callers fall back.
pub fn dataset_from_csv(text: &str, opts: &IngestOptions) -> Result<Vec<Topic>, SourceError> {
  let rows = parse_csv(text)?;
  let topics = normalize_rows(&rows, opts);
  if topics.is_empty() {
    return Err(SourceError::Empty);
  }
  Ok(topics)
}
