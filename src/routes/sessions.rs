use actix_web::{get, web};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::message::{SessionSummary, UserSession};
use crate::models::ChatMessage;
use crate::AppState;

#[get("/sessions-admin")]
pub async fn admin_sessions(
    app_state: web::Data<Arc<AppState>>,
) -> Result<web::Json<Vec<SessionSummary>>, ApiError> {
    let sessions = ChatMessage::sessions_overview(&app_state.pool).await?;
    Ok(web::Json(sessions))
}

#[get("/sessions/{session_id}")]
pub async fn session_messages(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<web::Json<Vec<ChatMessage>>, ApiError> {
    let messages = ChatMessage::for_session(&app_state.pool, &path.into_inner()).await?;
    Ok(web::Json(messages))
}

#[get("/user-sessions/{user_id}")]
pub async fn user_sessions(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<web::Json<Vec<UserSession>>, ApiError> {
    let sessions = ChatMessage::sessions_for_user(&app_state.pool, &path.into_inner()).await?;
    Ok(web::Json(sessions))
}
