use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::{DbConn, Store};
use crate::guards::AuthGuard;
use crate::models::UserResponse;
use crate::services::ServiceError;
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "User")]
#[get("/user/me")]
pub async fn get_me(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user = db
        .find_user(&auth.actor.uid)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "user": UserResponse::from(user)
    }))))
}
