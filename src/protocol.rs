//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{DataOrigin, Topic};
use crate::selector::DrawTier;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Spin {
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        count: Option<usize>,
    },
    Reload {
        #[serde(default)]
        url: Option<String>,
    },
    ToggleLike {
        id: String,
    },
    Categories,
    Status,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Spin {
        #[serde(flatten)]
        result: SpinOut,
    },
    Status {
        status: StatusOut,
    },
    Categories {
        categories: Vec<String>,
    },
    Like {
        #[serde(flatten)]
        like: LikeOut,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Topic as delivered to the UI, annotated with the like state.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TopicOut {
    pub id: String,
    pub category: String,
    pub text: String,
    #[serde(rename = "selectionCount", skip_serializing_if = "Option::is_none")]
    pub selection_count: Option<u32>,
    pub liked: bool,
}

pub fn to_out(t: &Topic, liked: bool) -> TopicOut {
    TopicOut {
        id: t.id.clone(),
        category: t.category.clone(),
        text: t.text.clone(),
        selection_count: t.selection_count,
        liked,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize, Default)]
pub struct SpinIn {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
}
#[derive(Debug, Serialize)]
pub struct SpinOut {
    pub topics: Vec<TopicOut>,
    pub tier: DrawTier,
    pub history: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReloadIn {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusOut {
    pub title: String,
    pub loading: bool,
    pub origin: Option<DataOrigin>,
    #[serde(rename = "sourceUrl")]
    pub source_url: Option<String>,
    #[serde(rename = "topicCount")]
    pub topic_count: usize,
    #[serde(rename = "historyLimit")]
    pub history_limit: usize,
}

#[derive(Serialize)]
pub struct CategoriesOut {
    pub categories: Vec<String>,
}

#[derive(Serialize)]
pub struct HistoryOut {
    /// Newest first.
    pub recent: Vec<TopicOut>,
    /// Ids excluded from fresh draws, oldest first.
    pub history: Vec<String>,
}

#[derive(Serialize)]
pub struct LikesOut {
    pub ids: Vec<String>,
}
#[derive(Debug, Serialize)]
pub struct LikeOut {
    pub id: String,
    pub liked: bool,
}

#[derive(Debug, Deserialize)]
pub struct SheetQuery {
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub code: String,
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_spin_message_defaults() {
        let msg: ClientWsMessage = serde_json::from_str(r#"{"type":"spin"}"#).unwrap();
        assert!(matches!(msg, ClientWsMessage::Spin { category: None, count: None }));

        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"toggle_like","id":"4"}"#).unwrap();
        assert!(matches!(msg, ClientWsMessage::ToggleLike { id } if id == "4"));
    }

    #[test]
    fn ws_error_shape() {
        let out = ServerWsMessage::Error { code: "busy".into(), message: "x".into() };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["code"], "busy");
    }

    #[test]
    fn ws_like_is_flattened() {
        let out = ServerWsMessage::Like { like: LikeOut { id: "2".into(), liked: true } };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["type"], "like");
        assert_eq!(v["id"], "2");
        assert_eq!(v["liked"], true);
    }
}
