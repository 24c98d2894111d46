use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::notificationdb::NotificationExt,
    dtos::notificationdtos::{NotificationQuery, UnreadCountDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn notifications_handler() -> Router {
    Router::new()
        .route("/", get(get_notifications).delete(clear_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", put(mark_all_read))
        .route(
            "/:notification_id",
            get(get_notification).delete(delete_notification),
        )
        .route("/:notification_id/read", put(mark_read))
}

pub async fn get_notifications(
    Query(query): Query<NotificationQuery>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()?;

    let notifications = app_state
        .db_client
        .get_notifications(user.user.id, query.unread_only, query.limit(), query.offset())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "results": notifications.len(),
        "data": notifications
    })))
}

pub async fn get_notification(
    Path(notification_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state
        .db_client
        .get_notification(notification_id, user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Notification not found"))?;

    Ok(Json(json!({ "status": "success", "data": notification })))
}

pub async fn mark_read(
    Path(notification_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state
        .db_client
        .mark_notification_read(notification_id, user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Notification not found"))?;

    Ok(Json(json!({ "status": "success", "data": notification })))
}

pub async fn mark_all_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let updated = app_state
        .db_client
        .mark_all_notifications_read(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "updated": updated })))
}

pub async fn unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let unread_count = app_state
        .db_client
        .get_unread_count(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": UnreadCountDto { unread_count }
    })))
}

pub async fn delete_notification(
    Path(notification_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state
        .db_client
        .delete_notification(notification_id, user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if deleted == 0 {
        return Err(HttpError::not_found("Notification not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state
        .db_client
        .clear_notifications(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "deleted": deleted })))
}
