//! Topic selection: candidate pools, the recent-history window and random draws.
//!
//! A draw walks these tiers until one yields candidates:
//!   1. enabled topics matching the filter that are not in history
//!   2. (fewer than `count`) the same pool ignoring history; history is cleared
//!   3. (that pool is empty) `DrawError::NoCandidates`, history untouched
//!
//! The selector never performs I/O and never mutates the dataset.

use std::collections::VecDeque;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::CategoryMatch;
use crate::domain::{CategoryFilter, Topic};
use crate::error::DrawError;

/// Bounded FIFO of recently shown topic ids.
#[derive(Clone, Debug)]
pub struct History {
  ids: VecDeque<String>,
  capacity: usize,
}

impl History {
  pub fn new(capacity: usize) -> Self {
    Self { ids: VecDeque::with_capacity(capacity), capacity }
  }

  /// Append an id, evicting the oldest entries beyond capacity.
  pub fn push(&mut self, id: String) {
    self.ids.push_back(id);
    while self.ids.len() > self.capacity {
      self.ids.pop_front();
    }
  }

  pub fn contains(&self, id: &str) -> bool {
    self.ids.iter().any(|h| h == id)
  }

  pub fn clear(&mut self) {
    self.ids.clear();
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  /// Oldest first.
  pub fn ids(&self) -> Vec<String> {
    self.ids.iter().cloned().collect()
  }
}

/// Which fallback tier produced a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawTier {
  /// Enough unseen candidates.
  Fresh,
  /// History was cleared and the full filtered pool used.
  HistoryReset,
  /// History was cleared and the whole pool was still smaller than requested.
  Partial,
}

impl DrawTier {
  pub fn as_str(self) -> &'static str {
    match self {
      DrawTier::Fresh => "fresh",
      DrawTier::HistoryReset => "history_reset",
      DrawTier::Partial => "partial",
    }
  }
}

#[derive(Clone, Debug)]
pub struct Draw {
  /// Selected topics in draw order.
  pub topics: Vec<Topic>,
  pub tier: DrawTier,
}

pub struct TopicSelector {
  dataset: Vec<Topic>,
  history: History,
  category_match: CategoryMatch,
  rng: StdRng,
}

impl TopicSelector {
  /// `seed` pins the random stream; `None` seeds from OS entropy.
  pub fn new(dataset: Vec<Topic>, history_limit: usize, category_match: CategoryMatch, seed: Option<u64>) -> Self {
    let rng = match seed {
      Some(s) => StdRng::seed_from_u64(s),
      None => StdRng::from_entropy(),
    };
    Self { dataset, history: History::new(history_limit), category_match, rng }
  }

  pub fn dataset(&self) -> &[Topic] {
    &self.dataset
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  /// Swap in a freshly loaded dataset. History is kept; ids that no longer exist never match.
  pub fn replace_dataset(&mut self, dataset: Vec<Topic>) {
    self.dataset = dataset;
  }

  fn matches_filter(&self, topic: &Topic, filter: &CategoryFilter) -> bool {
    match filter {
      CategoryFilter::All => true,
      CategoryFilter::Only(cat) => self.category_match.matches(&topic.category, cat),
    }
  }

  /// Dataset indices of enabled topics passing the filter (and history, if asked).
  fn pool(&self, filter: &CategoryFilter, exclude_history: bool) -> Vec<usize> {
    self.dataset
      .iter()
      .enumerate()
      .filter(|(_, t)| t.enabled)
      .filter(|(_, t)| !exclude_history || !self.history.contains(&t.id))
      .filter(|(_, t)| self.matches_filter(t, filter))
      .map(|(i, _)| i)
      .collect()
  }

  /// Draw up to `count` distinct topics. See the module docs for the fallback tiers.
  #[instrument(level = "debug", skip(self, filter), fields(%filter, history_len = self.history.len()))]
  pub fn draw(&mut self, filter: &CategoryFilter, count: usize) -> Result<Draw, DrawError> {
    if count == 0 {
      return Err(DrawError::InvalidCount);
    }

    let mut tier = DrawTier::Fresh;
    let mut candidates = self.pool(filter, true);

    if candidates.len() < count {
      let broader = self.pool(filter, false);
      if broader.is_empty() {
        warn!(target: "gacha", %filter, "No enabled topic for filter");
        return Err(DrawError::NoCandidates { filter: filter.to_string() });
      }
      tier = if broader.len() >= count { DrawTier::HistoryReset } else { DrawTier::Partial };
      info!(target: "gacha", %filter, unseen = candidates.len(), pool = broader.len(), count, tier = tier.as_str(), "Clearing history to widen pool");
      self.history.clear();
      candidates = broader;
    }

    // Uniform Fisher–Yates over the whole pool, then keep the head.
    candidates.shuffle(&mut self.rng);
    candidates.truncate(count);

    let topics: Vec<Topic> = candidates.into_iter().map(|i| self.dataset[i].clone()).collect();
    for t in &topics {
      self.history.push(t.id.clone());
    }

    debug!(target: "gacha", %filter, picked = ?topics.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), tier = tier.as_str(), "Draw complete");
    Ok(Draw { topics, tier })
  }
}
