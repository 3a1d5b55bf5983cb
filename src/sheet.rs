//! Minimal spreadsheet CSV client.
//!
//! Fetches the published CSV export of a sheet. Custom URLs supplied by the
//! player are only honored when they point at the allowlisted prefix.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::USER_AGENT;
use tracing::{info, instrument, warn};

use crate::config::GachaConfig;
use crate::error::SourceError;
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct SheetClient {
  pub client: reqwest::Client,
  pub default_url: Option<String>,
  pub allowed_prefix: String,
}

impl SheetClient {
  pub fn from_config(cfg: &GachaConfig) -> Self {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
      .build()
      .unwrap_or_else(|e| {
        warn!(target: "topic_gacha", error = %e, "Falling back to default HTTP client");
        reqwest::Client::new()
      });
    Self {
      client,
      default_url: cfg.sheet_url.clone(),
      allowed_prefix: cfg.allowed_url_prefix.clone(),
    }
  }

  /// A custom URL wins when it passes the prefix check; otherwise the default.
  pub fn resolve_url(&self, custom: Option<&str>) -> Result<String, SourceError> {
    if let Some(url) = custom.map(str::trim).filter(|u| !u.is_empty()) {
      if url.starts_with(&self.allowed_prefix) {
        return Ok(url.to_string());
      }
      warn!(target: "gacha", url = %trunc_for_log(url, 120), prefix = %self.allowed_prefix, "Ignoring custom sheet URL outside allowlist");
    }
    self.default_url.clone().ok_or(SourceError::NotConfigured)
  }

  /// GET the CSV body, with a cache buster so proxies never serve a stale export.
  #[instrument(level = "info", skip(self, url), fields(url = %trunc_for_log(url, 120)))]
  pub async fn fetch_csv(&self, url: &str) -> Result<String, SourceError> {
    let millis = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_millis())
      .unwrap_or_default();
    let fetch_url = with_cache_buster(url, millis);

    let res = self.client.get(&fetch_url)
      .header(USER_AGENT, "topic-gacha-backend/0.1")
      .send().await?;

    let status = res.status();
    if !status.is_success() {
      return Err(SourceError::Status(status.as_u16()));
    }
    let body = res.text().await?;
    info!(target: "gacha", bytes = body.len(), "Fetched sheet CSV");
    Ok(body)
  }
}

/// Append `t=<millis>`, using `&` when the URL already carries a query.
pub fn with_cache_buster(url: &str, millis: u128) -> String {
  let sep = if url.contains('?') { '&' } else { '?' };
  format!("{}{}t={}", url, sep, millis)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(default_url: Option<&str>) -> SheetClient {
    let cfg = GachaConfig { sheet_url: default_url.map(str::to_string), ..GachaConfig::default() };
    SheetClient::from_config(&cfg)
  }

  #[test]
  fn cache_buster_separator() {
    assert_eq!(with_cache_buster("https://x/a", 7), "https://x/a?t=7");
    assert_eq!(with_cache_buster("https://x/a?output=csv", 7), "https://x/a?output=csv&t=7");
  }

  #[test]
  fn custom_url_must_match_prefix() {
    let c = client(Some("https://default.example/sheet.csv"));
    let good = "https://docs.google.com/spreadsheets/d/abc/export?format=csv";
    assert_eq!(c.resolve_url(Some(good)).unwrap(), good);
    assert_eq!(
      c.resolve_url(Some("https://evil.example/x.csv")).unwrap(),
      "https://default.example/sheet.csv"
    );
    assert_eq!(c.resolve_url(None).unwrap(), "https://default.example/sheet.csv");
  }

  #[test]
  fn no_url_is_not_configured() {
    let c = client(None);
    assert!(matches!(c.resolve_url(Some("ftp://nope")), Err(SourceError::NotConfigured)));
  }
}
