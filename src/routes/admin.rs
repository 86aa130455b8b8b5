use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    admin_log::{AdminLogError, RequestContext},
    AppState,
};

const ROLES: [&str; 2] = ["USER", "ADMIN"];

/// Interceptor failure outside, handler outcome inside.
pub type AdminResult<T> = Result<Result<Json<T>, StatusCode>, AdminLogError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersParams {
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<User>,
    pub page: u32,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeUserRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRoleChanged {
    pub user_id: i64,
    pub role: String,
    pub changed_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentDeleted {
    pub comment_id: i64,
    pub deleted_at: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<ListUsersParams>,
) -> AdminResult<UserList> {
    let outcome = state
        .admin_log
        .around(&ctx, (params,), |(params,)| async move {
            // TODO: Read from the user store once this service owns one
            let users = vec![
                User {
                    id: 1,
                    email: "john@example.com".to_string(),
                    role: "ADMIN".to_string(),
                },
                User {
                    id: 2,
                    email: "jane@example.com".to_string(),
                    role: "USER".to_string(),
                },
            ];

            Ok::<_, StatusCode>(UserList {
                total: users.len(),
                page: params.page.unwrap_or(1),
                users,
            })
        })
        .await?;

    Ok(outcome.map(Json))
}

pub async fn change_user_role(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<i64>,
    Json(payload): Json<ChangeUserRoleRequest>,
) -> AdminResult<UserRoleChanged> {
    let outcome = state
        .admin_log
        .around(&ctx, (user_id, payload), |(user_id, payload)| async move {
            let role = payload.role.trim().to_uppercase();
            if !ROLES.contains(&role.as_str()) {
                warn!(user_id, role = %payload.role, "Rejected unknown user role");
                return Err(StatusCode::BAD_REQUEST);
            }

            info!(user_id, role = %role, "User role changed");
            Ok(UserRoleChanged {
                user_id,
                role,
                changed_at: chrono::Utc::now().to_rfc3339(),
            })
        })
        .await?;

    Ok(outcome.map(Json))
}

// Reads the request context bound by `request_context_middleware` instead of
// extracting it.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
) -> AdminResult<CommentDeleted> {
    let outcome = state
        .admin_log
        .around_current((comment_id,), |(comment_id,)| async move {
            if comment_id <= 0 {
                return Err(StatusCode::NOT_FOUND);
            }

            info!(comment_id, "Comment deleted");
            Ok(CommentDeleted {
                comment_id,
                deleted_at: chrono::Utc::now().to_rfc3339(),
            })
        })
        .await?;

    Ok(outcome.map(Json))
}
