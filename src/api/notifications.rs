//! Notification endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{error::AppResult, models::notification::Notification};

use super::AuthenticatedUser;

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notifications", body = Vec<Notification>),
        (status = 204, description = "No notifications"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_notifications(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Response> {
    let notifications = state.services.notifications.list(&claims.caller()).await?;

    if notifications.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(notifications).into_response())
}

/// Get a notification
#[utoipa::path(
    get,
    path = "/notifications/{id}",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification", body = Notification),
        (status = 403, description = "Addressed to another user"),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn get_notification(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Notification>> {
    let notification = state.services.notifications.get(&claims.caller(), id).await?;
    Ok(Json(notification))
}
