//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::{header, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument};

use crate::error::{DrawError, SourceError, SpinError};
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

fn error_json(status: StatusCode, code: &str, error: String) -> Response {
  (status, Json(ErrorOut { code: code.into(), error })).into_response()
}

fn spin_error_response(e: &SpinError) -> Response {
  let status = match e {
    SpinError::Loading => StatusCode::SERVICE_UNAVAILABLE,
    SpinError::Busy => StatusCode::CONFLICT,
    SpinError::Draw(DrawError::NoCandidates { .. }) => StatusCode::NOT_FOUND,
    SpinError::Draw(DrawError::InvalidCount) => StatusCode::BAD_REQUEST,
  };
  error_json(status, spin_error_code(e), e.user_message())
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(status_out(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(CategoriesOut { categories: state.categories().await })
}

#[instrument(level = "info", skip(state, body), fields(category = ?body.category, count = ?body.count))]
pub async fn http_post_spin(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SpinIn>,
) -> Response {
  match do_spin(&state, body.category.as_deref(), body.count).await {
    Ok(out) => {
      info!(target: "gacha", picked = out.topics.len(), tier = ?out.tier, "HTTP spin served");
      Json(out).into_response()
    }
    Err(e) => {
      info!(target: "gacha", code = spin_error_code(&e), "HTTP spin refused");
      spin_error_response(&e)
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(history_out(&state).await)
}

#[instrument(level = "info", skip(state, body), fields(custom_url = body.url.is_some()))]
pub async fn http_post_reload(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ReloadIn>,
) -> impl IntoResponse {
  match state.reload(body.url.as_deref()).await {
    Some(summary) => info!(target: "gacha", origin = ?summary.origin, topics = summary.topic_count, "HTTP reload done"),
    None => info!(target: "gacha", "HTTP reload superseded by a newer one"),
  }
  Json(status_out(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_likes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(LikesOut { ids: state.likes.ids().await })
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_toggle_like(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  let liked = state.likes.toggle(&id).await;
  Json(LikeOut { id, liked })
}

/// Relay the sheet CSV as-is, for UIs that parse it themselves.
#[instrument(level = "info", skip(state, q), fields(custom_url = q.url.is_some()))]
pub async fn http_get_sheet(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SheetQuery>,
) -> Response {
  let url = match state.sheet.resolve_url(q.url.as_deref()) {
    Ok(u) => u,
    Err(SourceError::NotConfigured) => {
      return error_json(StatusCode::INTERNAL_SERVER_ERROR, "not_configured", "Sheet URL is not set".into());
    }
    Err(e) => {
      return error_json(StatusCode::INTERNAL_SERVER_ERROR, "fetch_failed", e.to_string());
    }
  };
  match state.sheet.fetch_csv(&url).await {
    Ok(csv) => (
      [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
        (header::CACHE_CONTROL, "s-maxage=60, stale-while-revalidate"),
      ],
      csv,
    )
      .into_response(),
    Err(e) => {
      error!(target: "gacha", error = %e, "Sheet relay failed");
      error_json(StatusCode::INTERNAL_SERVER_ERROR, "fetch_failed", "Failed to fetch data".into())
    }
  }
}
