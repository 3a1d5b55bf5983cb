//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, LikeOut, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "topic_gacha", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "topic_gacha", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "topic_gacha", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { code: "invalid_json".into(), message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "code": "internal", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "topic_gacha", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "topic_gacha", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Spin { category, count } => match do_spin(state, category.as_deref(), count).await {
      Ok(result) => {
        info!(target: "gacha", picked = result.topics.len(), tier = ?result.tier, "WS spin served");
        ServerWsMessage::Spin { result }
      }
      Err(e) => ServerWsMessage::Error { code: spin_error_code(&e).into(), message: e.user_message() },
    },

    ClientWsMessage::Reload { url } => {
      state.reload(url.as_deref()).await;
      ServerWsMessage::Status { status: status_out(state).await }
    }

    ClientWsMessage::ToggleLike { id } => {
      let liked = state.likes.toggle(&id).await;
      ServerWsMessage::Like { like: LikeOut { id, liked } }
    }

    ClientWsMessage::Categories => ServerWsMessage::Categories { categories: state.categories().await },

    ClientWsMessage::Status => ServerWsMessage::Status { status: status_out(state).await },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::GachaConfig;

  async fn ready_state() -> AppState {
    let state = AppState::new(GachaConfig { spin_delay_ms: 0, rng_seed: Some(1), ..GachaConfig::default() });
    state.reload(None).await;
    state
  }

  #[tokio::test]
  async fn ws_spin_and_unknown_category() {
    let state = ready_state().await;
    let ok = handle_client_ws(ClientWsMessage::Spin { category: Some("貯める".into()), count: Some(1) }, &state).await;
    match ok {
      ServerWsMessage::Spin { result } => assert_eq!(result.topics[0].id, "1"),
      other => panic!("unexpected reply: {:?}", other),
    }

    let err = handle_client_ws(ClientWsMessage::Spin { category: Some("存在しないカテゴリ".into()), count: None }, &state).await;
    assert!(matches!(err, ServerWsMessage::Error { ref code, .. } if code == "no_candidates"));
  }

  #[tokio::test]
  async fn ws_toggle_like_marks_spin_results() {
    let state = ready_state().await;
    handle_client_ws(ClientWsMessage::ToggleLike { id: "1".into() }, &state).await;
    match handle_client_ws(ClientWsMessage::Spin { category: Some("貯める".into()), count: None }, &state).await {
      ServerWsMessage::Spin { result } => assert!(result.topics[0].liked),
      other => panic!("unexpected reply: {:?}", other),
    }
  }
}
