//! Error kinds for loading datasets and drawing topics.

use thiserror::Error;

/// The spreadsheet could not provide a usable dataset.
/// Reload recovers from every variant by switching to the built-in topics.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("no sheet URL configured")]
  NotConfigured,
  #[error("sheet request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("sheet responded with status {0}")]
  Status(u16),
  #[error("CSV parse error: {0}")]
  Csv(#[from] csv::Error),
  #[error("sheet has no valid rows")]
  Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
  /// No enabled topic exists for the filter, even ignoring history.
  #[error("no enabled topic for category '{filter}'")]
  NoCandidates { filter: String },
  #[error("count must be at least 1")]
  InvalidCount,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpinError {
  #[error("dataset is still loading")]
  Loading,
  #[error("a draw is already in progress")]
  Busy,
  #[error(transparent)]
  Draw(#[from] DrawError),
}

impl SpinError {
  /// Message shown to the player.
  pub fn user_message(&self) -> String {
    match self {
      SpinError::Draw(DrawError::NoCandidates { .. }) => "このカテゴリのネタはまだありません！".into(),
      other => other.to_string(),
    }
  }
}
