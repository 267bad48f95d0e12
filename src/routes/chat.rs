use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ApiError;
use crate::gemini;
use crate::models::ChatMessage;
use crate::prompts::Prompts;
use crate::types::{ChatRequest, ChatResponse, TestErrorResponse, TestResponse};
use crate::AppState;

#[post("")]
pub async fn chat(
    app_state: web::Data<Arc<AppState>>,
    req_body: web::Json<ChatRequest>,
) -> Result<web::Json<ChatResponse>, ApiError> {
    let req = req_body.into_inner();

    let message = match req.message.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => return Err(ApiError::BadRequest("Message is required".to_string())),
    };

    let user_id = match req.user_id.as_deref().map(str::trim) {
        Some(u) if !u.is_empty() => u.to_string(),
        _ => return Err(ApiError::Unauthorized("User ID is required".to_string())),
    };

    let session_id = req
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(mint_session_id);

    info!(
        "chat request for session {} ({} history turns)",
        session_id,
        req.history.len()
    );

    ChatMessage::insert(&app_state.pool, &session_id, Some(&user_id), &message, true).await?;

    let contents = gemini::build_contents(&message, &req.history);
    let text = app_state.gemini.generate(contents).await.map_err(|e| {
        error!("model call failed for session {}: {:?}", session_id, e);
        ApiError::Upstream(e)
    })?;

    let reply =
        ChatMessage::insert(&app_state.pool, &session_id, Some(&user_id), &text, false).await?;

    Ok(web::Json(ChatResponse {
        response: reply.content,
        timestamp: reply.created_at,
        session_id: reply.session_id,
    }))
}

#[get("/test")]
pub async fn test_connection(app_state: web::Data<Arc<AppState>>) -> HttpResponse {
    let contents = gemini::build_contents(Prompts::CONNECTION_TEST, &[]);

    match app_state.gemini.generate(contents).await {
        Ok(response) => HttpResponse::Ok().json(TestResponse {
            success: true,
            response,
        }),
        Err(e) => {
            error!("connection test failed: {:?}", e);
            HttpResponse::InternalServerError().json(TestErrorResponse {
                success: false,
                error: e.to_string(),
            })
        }
    }
}

/// Mints `session_<unix millis>_<8 random alphanumerics>`; the suffix keeps
/// ids minted in the same millisecond distinct.
fn mint_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();

    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_session_ids_have_the_expected_shape() {
        let id = mint_session_id();
        let parts: Vec<&str> = id.splitn(3, '_').collect();

        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn minted_session_ids_are_unique() {
        // Back-to-back mints land in the same millisecond often enough to
        // exercise the random suffix.
        let ids: Vec<String> = (0..100).map(|_| mint_session_id()).collect();
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
