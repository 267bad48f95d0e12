use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

/// One prior turn of the conversation as the frontend replays it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryTurn {
    pub content: String,
    pub is_user: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
}

#[derive(Serialize)]
pub struct TestResponse {
    pub success: bool,
    pub response: String,
}

#[derive(Serialize)]
pub struct TestErrorResponse {
    pub success: bool,
    pub error: String,
}
