use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::NotificationResponse;
use crate::services::{notification, parse_object_id};
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Notification")]
#[get("/notifications")]
pub async fn get_notifications(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let notifications: Vec<NotificationResponse> =
        notification::my_notifications(db.inner().as_ref(), &auth.actor)
            .await?
            .into_iter()
            .map(NotificationResponse::from)
            .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "notifications": notifications
    }))))
}

#[openapi(tag = "Notification")]
#[get("/notifications/unread-count")]
pub async fn unread_count(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let count = notification::unread_count(db.inner().as_ref(), &auth.actor).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "unread": count
    }))))
}

#[openapi(tag = "Notification")]
#[put("/notifications/<notification_id>/read")]
pub async fn mark_read(
    db: &State<DbConn>,
    auth: AuthGuard,
    notification_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let notification_id = parse_object_id(&notification_id, "notification")?;
    notification::mark_read(db.inner().as_ref(), &auth.actor, &notification_id).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Notification marked as read".to_string(),
        serde_json::json!({}),
    )))
}
