//! API Client

use serde::{Deserialize, Serialize};

/// One rendered chat entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Position in the transcript; stable list key
    #[serde(default)]
    pub id: usize,
    /// `user`, `assistant` or `error`
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub checkout_url: Option<String>,
    /// PNG data URL
    #[serde(default)]
    pub qr_code: Option<String>,
}

/// Turn as returned by the server
#[derive(Debug, Deserialize)]
struct TurnView {
    role: String,
    content: String,
    #[serde(default)]
    failed: bool,
    #[serde(default)]
    checkout_url: Option<String>,
    #[serde(default)]
    qr_code: Option<String>,
}

impl TurnView {
    fn into_message(self, id: usize) -> ChatMessage {
        ChatMessage {
            id,
            role: if self.failed { "error".into() } else { self.role },
            content: self.content,
            checkout_url: self.checkout_url,
            qr_code: self.qr_code,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    session_id: String,
    turn: TurnView,
}

/// Assistant reply plus the session it belongs to
pub struct ChatReply {
    pub session_id: String,
    pub message: ChatMessage,
}

// reqwest on wasm needs absolute URLs
fn endpoint(path: &str) -> String {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into());
    format!("{origin}{path}")
}

/// Send one user turn; `id` becomes the reply's list key
pub async fn send_chat(
    message: &str,
    session_id: Option<&str>,
    id: usize,
) -> Result<ChatReply, String> {
    let mut body = serde_json::json!({ "message": message });
    if let Some(session_id) = session_id {
        body["session_id"] = serde_json::json!(session_id);
    }

    let response = reqwest::Client::new()
        .post(endpoint("/api/chat"))
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        let data: ChatResponse = response.json().await.map_err(|e| e.to_string())?;
        Ok(ChatReply {
            session_id: data.session_id,
            message: data.turn.into_message(id),
        })
    } else {
        let data: serde_json::Value = response.json().await.unwrap_or_default();
        Err(data["error"].as_str().unwrap_or("Request failed").to_string())
    }
}
