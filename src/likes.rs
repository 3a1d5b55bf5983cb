//! Liked topic ids, optionally mirrored to a JSON file so they survive restarts.

use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::{error, info, instrument};

pub struct LikeBook {
  ids: RwLock<Vec<String>>,
  path: Option<PathBuf>,
}

impl LikeBook {
  pub fn in_memory() -> Self {
    Self { ids: RwLock::new(Vec::new()), path: None }
  }

  /// Load ids from `path` if it exists. Unreadable or malformed files start empty.
  pub fn open(path: Option<PathBuf>) -> Self {
    let Some(path) = path else { return Self::in_memory() };
    let ids = match std::fs::read_to_string(&path) {
      Ok(s) => match serde_json::from_str::<Vec<String>>(&s) {
        Ok(ids) => {
          info!(target: "topic_gacha", path = %path.display(), count = ids.len(), "Loaded likes");
          ids
        }
        Err(e) => {
          error!(target: "topic_gacha", path = %path.display(), error = %e, "Failed to parse likes file");
          Vec::new()
        }
      },
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
      Err(e) => {
        error!(target: "topic_gacha", path = %path.display(), error = %e, "Failed to read likes file");
        Vec::new()
      }
    };
    Self { ids: RwLock::new(ids), path: Some(path) }
  }

  /// Flip the like state of `id`; returns the new state.
  #[instrument(level = "debug", skip(self))]
  pub async fn toggle(&self, id: &str) -> bool {
    let mut ids = self.ids.write().await;
    let liked = match ids.iter().position(|l| l == id) {
      Some(pos) => {
        ids.remove(pos);
        false
      }
      None => {
        ids.push(id.to_string());
        true
      }
    };
    self.persist(&ids).await;
    liked
  }

  pub async fn is_liked(&self, id: &str) -> bool {
    self.ids.read().await.iter().any(|l| l == id)
  }

  pub async fn ids(&self) -> Vec<String> {
    self.ids.read().await.clone()
  }

  /// Write to a sibling temp file, then rename over the real one.
  /// Called with the write guard held so saves land in toggle order.
  async fn persist(&self, ids: &[String]) {
    let Some(path) = &self.path else { return };
    let tmp = temp_path(path);
    let result = match serde_json::to_string(ids) {
      Ok(json) => match tokio::fs::write(&tmp, json).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
      },
      Err(e) => Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
    };
    if let Err(e) = result {
      error!(target: "topic_gacha", path = %path.display(), error = %e, "Failed to write likes file");
    }
  }
}

fn temp_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".tmp");
  path.with_file_name(name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn toggle_flips_state() {
    let book = LikeBook::in_memory();
    assert!(book.toggle("3").await);
    assert!(book.is_liked("3").await);
    assert!(book.toggle("7").await);
    assert!(!book.toggle("3").await);
    assert_eq!(book.ids().await, vec!["7".to_string()]);
  }

  #[tokio::test]
  async fn likes_survive_reopen() {
    let path = std::env::temp_dir().join(format!("topic-gacha-likes-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let book = LikeBook::open(Some(path.clone()));
    book.toggle("1").await;
    book.toggle("10").await;

    let reopened = LikeBook::open(Some(path.clone()));
    assert_eq!(reopened.ids().await, vec!["1".to_string(), "10".to_string()]);
    assert!(!temp_path(&path).exists());

    reopened.toggle("1").await;
    let on_disk: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, vec!["10".to_string()]);
    let _ = std::fs::remove_file(&path);
  }
}
