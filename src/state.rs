//! Application state: the selector, dataset load status, recent results and likes.
//!
//! This module owns:
//!   - the topic selector (dataset + history + RNG), behind one mutex
//!   - whether a dataset is loaded yet, and where it came from
//!   - the recent-results list for display (newest first)
//!   - the like book and the sheet client
//!
//! Loading policy: try the spreadsheet; on any failure (no URL, HTTP error,
//! bad CSV, zero valid rows) install the built-in fallback topics instead.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

use crate::categories::derive_categories;
use crate::config::GachaConfig;
use crate::domain::{CategoryFilter, DataOrigin, Topic};
use crate::error::{SourceError, SpinError};
use crate::ingest::{dataset_from_csv, IngestOptions};
use crate::likes::LikeBook;
use crate::seeds::fallback_topics;
use crate::selector::{Draw, TopicSelector};
use crate::sheet::SheetClient;

/// Summary of the active dataset.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DatasetInfo {
    pub origin: DataOrigin,
    pub source_url: Option<String>,
    pub topic_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready(DatasetInfo),
}

pub struct AppState {
    pub config: GachaConfig,
    pub selector: Mutex<TopicSelector>,
    pub load: RwLock<LoadState>,
    pub recent: Mutex<VecDeque<Topic>>,
    pub likes: LikeBook,
    pub sheet: SheetClient,
    spinning: AtomicBool,
    /// Bumped by every load; only the newest one may install its dataset.
    load_generation: AtomicU64,
}

/// Clears the "drawing" flag however the spin ends.
struct SpinGuard<'a>(&'a AtomicBool);

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AppState {
    /// Build state from config. The dataset starts empty and `Loading` until `reload` runs.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: GachaConfig) -> Self {
        let selector = TopicSelector::new(
            Vec::new(),
            config.history_limit,
            config.category_match,
            config.rng_seed,
        );
        let likes = LikeBook::open(config.likes_path.as_ref().map(PathBuf::from));
        let sheet = SheetClient::from_config(&config);

        match &sheet.default_url {
            Some(_) => info!(target: "topic_gacha", title = %config.title, history_limit = config.history_limit, "Sheet source configured."),
            None => warn!(target: "topic_gacha", title = %config.title, "SHEET_CSV_URL not set. Built-in topics will be used unless a custom URL is supplied."),
        }

        Self {
            selector: Mutex::new(selector),
            load: RwLock::new(LoadState::Loading),
            recent: Mutex::new(VecDeque::new()),
            likes,
            sheet,
            spinning: AtomicBool::new(false),
            load_generation: AtomicU64::new(0),
            config,
        }
    }

    async fn fetch_dataset(&self, custom_url: Option<&str>) -> Result<(Vec<Topic>, String), SourceError> {
        let url = self.sheet.resolve_url(custom_url)?;
        let csv = self.sheet.fetch_csv(&url).await?;
        let topics = dataset_from_csv(&csv, &IngestOptions::from(&self.config))?;
        Ok((topics, url))
    }

    /// Fetch and ingest the sheet, falling back to built-in topics on any failure.
    /// Draws are refused while this runs. Returns `None` when a newer reload
    /// started meanwhile; its result replaces this one.
    #[instrument(level = "info", skip(self))]
    pub async fn reload(&self, custom_url: Option<&str>) -> Option<DatasetInfo> {
        let generation = {
            let mut load = self.load.write().await;
            *load = LoadState::Loading;
            self.load_generation.fetch_add(1, Ordering::AcqRel) + 1
        };

        let (topics, origin, source_url) = match self.fetch_dataset(custom_url).await {
            Ok((topics, url)) => (topics, DataOrigin::Sheet, Some(url)),
            Err(e) => {
                error!(target: "gacha", error = %e, "Sheet unavailable; using built-in topics");
                (fallback_topics(), DataOrigin::Fallback, None)
            }
        };
        self.install(generation, topics, origin, source_url).await
    }

    /// Replace the dataset wholesale and mark it ready, superseding any reload in flight.
    pub async fn install_dataset(&self, topics: Vec<Topic>, origin: DataOrigin, source_url: Option<String>) -> Option<DatasetInfo> {
        let generation = self.load_generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.install(generation, topics, origin, source_url).await
    }

    async fn install(&self, generation: u64, topics: Vec<Topic>, origin: DataOrigin, source_url: Option<String>) -> Option<DatasetInfo> {
        // The write guard orders the generation check against other installs.
        let mut load = self.load.write().await;
        let current = self.load_generation.load(Ordering::Acquire);
        if current != generation {
            info!(target: "gacha", generation, current, origin = ?origin, "Discarding superseded dataset load");
            return None;
        }

        let summary = DatasetInfo { origin, source_url, topic_count: topics.len() };
        let enabled = topics.iter().filter(|t| t.enabled).count();
        self.selector.lock().await.replace_dataset(topics);
        *load = LoadState::Ready(summary.clone());
        info!(target: "gacha", origin = ?summary.origin, topics = summary.topic_count, enabled, generation, "Dataset installed");
        Some(summary)
    }

    pub async fn dataset_info(&self) -> Option<DatasetInfo> {
        match &*self.load.read().await {
            LoadState::Loading => None,
            LoadState::Ready(summary) => Some(summary.clone()),
        }
    }

    async fn is_loading(&self) -> bool {
        matches!(*self.load.read().await, LoadState::Loading)
    }

    /// One spin: idle -> drawing -> idle.
    /// `count` defaults to the configured result arity.
    #[instrument(level = "info", skip(self, filter), fields(%filter))]
    pub async fn spin(&self, filter: &CategoryFilter, count: Option<usize>) -> Result<Draw, SpinError> {
        if self.is_loading().await {
            return Err(SpinError::Loading);
        }
        if self
            .spinning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SpinError::Busy);
        }
        let _guard = SpinGuard(&self.spinning);

        if self.config.spin_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.spin_delay_ms)).await;
        }
        // A reload may have started during the pause. Holding the read guard
        // keeps an install from swapping the dataset mid-draw.
        let load = self.load.read().await;
        if matches!(*load, LoadState::Loading) {
            return Err(SpinError::Loading);
        }

        let count = count.unwrap_or(self.config.default_count);
        let draw = self.selector.lock().await.draw(filter, count)?;
        drop(load);

        let mut recent = self.recent.lock().await;
        for t in &draw.topics {
            recent.push_front(t.clone());
        }
        recent.truncate(self.config.recent_limit);

        info!(target: "gacha", %filter, count, picked = draw.topics.len(), tier = draw.tier.as_str(), "Spin served");
        Ok(draw)
    }

    pub async fn categories(&self) -> Vec<String> {
        let selector = self.selector.lock().await;
        derive_categories(selector.dataset(), &self.config.category_priority)
    }

    /// Recent results, newest first.
    pub async fn recent_topics(&self) -> Vec<Topic> {
        self.recent.lock().await.iter().cloned().collect()
    }

    /// Ids currently excluded from fresh draws, oldest first.
    pub async fn history_ids(&self) -> Vec<String> {
        self.selector.lock().await.history().ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DrawError;

    fn test_config() -> GachaConfig {
        GachaConfig {
            spin_delay_ms: 0,
            rng_seed: Some(7),
            history_limit: 50,
            ..GachaConfig::default()
        }
    }

    fn only(cat: &str) -> CategoryFilter {
        CategoryFilter::Only(cat.into())
    }

    #[tokio::test]
    async fn spin_is_refused_while_loading() {
        let state = AppState::new(test_config());
        assert_eq!(state.spin(&CategoryFilter::All, Some(1)).await.unwrap_err(), SpinError::Loading);
        assert!(state.history_ids().await.is_empty());
    }

    #[tokio::test]
    async fn missing_sheet_falls_back() {
        let state = AppState::new(test_config());
        let summary = state.reload(None).await.unwrap();
        assert_eq!(summary.origin, DataOrigin::Fallback);
        assert_eq!(summary.topic_count, 10);
        assert_eq!(state.dataset_info().await, Some(summary));
        assert_eq!(state.categories().await.len(), 7);
    }

    #[tokio::test]
    async fn single_category_spin_records_history() {
        let state = AppState::new(test_config());
        state.reload(None).await;
        let draw = state.spin(&only("貯める"), Some(1)).await.unwrap();
        assert_eq!(draw.topics[0].id, "1");
        assert_eq!(state.history_ids().await, vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn no_candidates_leaves_history_and_returns_idle() {
        let state = AppState::new(test_config());
        state.reload(None).await;
        state.spin(&only("守る"), Some(1)).await.unwrap();

        let err = state.spin(&only("存在しないカテゴリ"), Some(1)).await.unwrap_err();
        assert!(matches!(err, SpinError::Draw(DrawError::NoCandidates { .. })));
        assert_eq!(err.user_message(), "このカテゴリのネタはまだありません！");
        assert_eq!(state.history_ids().await, vec!["5".to_string()]);

        // still accepts further draws
        assert!(state.spin(&CategoryFilter::All, None).await.is_ok());
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_bounded() {
        let state = AppState::new(test_config());
        state.reload(None).await;
        let mut last = String::new();
        for _ in 0..4 {
            let draw = state.spin(&CategoryFilter::All, Some(2)).await.unwrap();
            last = draw.topics[1].id.clone();
        }
        let recent = state.recent_topics().await;
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, last);
    }

    #[tokio::test]
    async fn overlapping_spin_is_busy() {
        let cfg = GachaConfig { spin_delay_ms: 30, ..test_config() };
        let state = AppState::new(cfg);
        state.reload(None).await;
        let (a, b) = tokio::join!(
            state.spin(&CategoryFilter::All, Some(1)),
            state.spin(&CategoryFilter::All, Some(1))
        );
        assert!(a.is_ok());
        assert_eq!(b.unwrap_err(), SpinError::Busy);
        // flag is released afterwards
        assert!(state.spin(&CategoryFilter::All, Some(1)).await.is_ok());
    }

    #[tokio::test]
    async fn reload_during_spin_delay_refuses_draw() {
        let cfg = GachaConfig { spin_delay_ms: 50, ..test_config() };
        let state = AppState::new(cfg);
        state.reload(None).await;

        let (spun, _) = tokio::join!(state.spin(&CategoryFilter::All, Some(1)), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            *state.load.write().await = LoadState::Loading;
        });
        assert_eq!(spun.unwrap_err(), SpinError::Loading);
        assert!(state.history_ids().await.is_empty());
        assert!(state.recent_topics().await.is_empty());
    }

    /// Serves `/slow...` after 400ms and anything else at once, each with its own CSV.
    async fn serve_sheets(slow_csv: &'static str, fast_csv: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else { break };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 2048];
                    let n = sock.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let body = if request.starts_with("GET /slow") {
                        tokio::time::sleep(Duration::from_millis(400)).await;
                        slow_csv
                    } else {
                        fast_csv
                    };
                    let res = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: text/csv\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = sock.write_all(res.as_bytes()).await;
                    let _ = sock.shutdown().await;
                });
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn newest_reload_wins_and_gates_draws() {
        let base = serve_sheets(
            "ID,Category,Text,Enabled\nold,c,old topic,TRUE\n",
            "ID,Category,Text,Enabled\nnew,c,new topic,TRUE\n",
        )
        .await;
        let cfg = GachaConfig { allowed_url_prefix: base.clone(), ..test_config() };
        let state = std::sync::Arc::new(AppState::new(cfg));
        state.reload(None).await;

        let older = {
            let state = state.clone();
            let url = format!("{}/slow", base);
            tokio::spawn(async move { state.reload(Some(&url)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(state.spin(&CategoryFilter::All, Some(1)).await.unwrap_err(), SpinError::Loading);

        let newer = state.reload(Some(&format!("{}/fast", base))).await.unwrap();
        assert_eq!(newer.origin, DataOrigin::Sheet);

        // the superseded load must not install when it finally lands
        assert_eq!(older.await.unwrap(), None);
        let draw = state.spin(&CategoryFilter::All, Some(1)).await.unwrap();
        assert_eq!(draw.topics[0].id, "new");
        assert_eq!(state.dataset_info().await.unwrap().source_url, Some(format!("{}/fast", base)));
    }

    #[tokio::test]
    async fn installed_sheet_dataset_is_used() {
        let state = AppState::new(test_config());
        let csv = "ID,Category,Text,Enabled\ns1,稼ぐ,副業してる？,TRUE\ns2,稼ぐ,昇給交渉した？,FALSE\n";
        let topics = dataset_from_csv(csv, &IngestOptions::from(&state.config)).unwrap();
        state.install_dataset(topics, DataOrigin::Sheet, Some("https://docs.google.com/spreadsheets/x".into())).await;

        assert_eq!(state.categories().await, vec!["稼ぐ".to_string()]);
        let draw = state.spin(&only("稼ぐ"), Some(2)).await.unwrap();
        let ids: Vec<_> = draw.topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["s1"]);
    }
}
