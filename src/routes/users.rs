use actix_web::{delete, get, post, web};
use std::sync::Arc;
use tracing::info;

use crate::error::{is_unique_violation, ApiError};
use crate::models::User;
use crate::types::{CreateUserRequest, DeleteUserResponse, LoginRequest, LoginResponse};
use crate::AppState;

fn nonempty(field: Option<String>) -> Option<String> {
    field.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[post("/login")]
pub async fn login(
    app_state: web::Data<Arc<AppState>>,
    req_body: web::Json<LoginRequest>,
) -> Result<web::Json<LoginResponse>, ApiError> {
    let req = req_body.into_inner();

    let (username, password) = match (nonempty(req.username), nonempty(req.password)) {
        (Some(username), Some(password)) => (username, password),
        _ => {
            return Err(ApiError::BadRequest(
                "Username and password are required".to_string(),
            ))
        }
    };

    let user = User::authenticate(&app_state.pool, &username, &password)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    info!("user {} logged in", user.id);

    Ok(web::Json(LoginResponse {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
    }))
}

#[get("/users")]
pub async fn list_users(app_state: web::Data<Arc<AppState>>) -> Result<web::Json<Vec<User>>, ApiError> {
    let users = User::list(&app_state.pool).await?;
    Ok(web::Json(users))
}

#[post("/users")]
pub async fn create_user(
    app_state: web::Data<Arc<AppState>>,
    req_body: web::Json<CreateUserRequest>,
) -> Result<web::Json<User>, ApiError> {
    let req = req_body.into_inner();

    let (username, display_name, password) = match (
        nonempty(req.username),
        nonempty(req.display_name),
        nonempty(req.password),
    ) {
        (Some(username), Some(display_name), Some(password)) => (username, display_name, password),
        _ => {
            return Err(ApiError::BadRequest(
                "Username, display name, and password are required".to_string(),
            ))
        }
    };

    if User::find_by_username(&app_state.pool, &username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    // The unique index catches the race where two signups pass the check
    // with the same username.
    let user = User::create(&app_state.pool, &username, &display_name, &password)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Username already exists".to_string())
            } else {
                ApiError::Storage(e)
            }
        })?;

    info!("created user {} ({})", user.username, user.id);

    Ok(web::Json(user))
}

#[delete("/users/{id}")]
pub async fn delete_user(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<web::Json<DeleteUserResponse>, ApiError> {
    let id = path.into_inner();
    User::delete(&app_state.pool, &id).await?;

    info!("deleted user {}", id);

    Ok(web::Json(DeleteUserResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonempty_rejects_missing_and_blank_fields() {
        assert_eq!(nonempty(None), None);
        assert_eq!(nonempty(Some("".to_string())), None);
        assert_eq!(nonempty(Some("   ".to_string())), None);
        assert_eq!(nonempty(Some(" bob ".to_string())), Some("bob".to_string()));
    }
}
