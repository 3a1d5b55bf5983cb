//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Spinning and shaping the result for the UI (like flags, history)
//!   - Status / history snapshots
//!   - Error codes for failed spins

use tracing::instrument;

use crate::domain::{CategoryFilter, Topic};
use crate::error::{DrawError, SpinError};
use crate::protocol::{to_out, HistoryOut, SpinOut, StatusOut, TopicOut};
use crate::state::AppState;

async fn annotate(state: &AppState, topics: &[Topic]) -> Vec<TopicOut> {
  let mut out = Vec::with_capacity(topics.len());
  for t in topics {
    out.push(to_out(t, state.likes.is_liked(&t.id).await));
  }
  out
}

#[instrument(level = "info", skip(state))]
pub async fn do_spin(state: &AppState, category: Option<&str>, count: Option<usize>) -> Result<SpinOut, SpinError> {
  let filter = CategoryFilter::from_param(category);
  let draw = state.spin(&filter, count).await?;
  Ok(SpinOut {
    topics: annotate(state, &draw.topics).await,
    tier: draw.tier,
    history: state.history_ids().await,
  })
}

pub async fn status_out(state: &AppState) -> StatusOut {
  let info = state.dataset_info().await;
  StatusOut {
    title: state.config.title.clone(),
    loading: info.is_none(),
    origin: info.as_ref().map(|i| i.origin),
    source_url: info.as_ref().and_then(|i| i.source_url.clone()),
    topic_count: info.map(|i| i.topic_count).unwrap_or(0),
    history_limit: state.config.history_limit,
  }
}

pub async fn history_out(state: &AppState) -> HistoryOut {
  let recent = state.recent_topics().await;
  HistoryOut {
    recent: annotate(state, &recent).await,
    history: state.history_ids().await,
  }
}

/// Stable machine-readable code for a failed spin.
pub fn spin_error_code(e: &SpinError) -> &'static str {
  match e {
    SpinError::Loading => "loading",
    SpinError::Busy => "busy",
    SpinError::Draw(DrawError::NoCandidates { .. }) => "no_candidates",
    SpinError::Draw(DrawError::InvalidCount) => "invalid_count",
  }
}
