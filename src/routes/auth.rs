use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::{DbConn, Store};
use crate::models::UserResponse;
use crate::services::identity::{self, SignInDto};
use crate::services::JwtService;
use crate::utils::{ApiResponse, ApiError};

/// --------------------
/// Sign in with a provider-asserted identity
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/sign-in", data = "<dto>")]
pub async fn sign_in(
    db: &State<DbConn>,
    dto: Json<SignInDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let (user, is_new_user) = identity::sign_in(db.inner().as_ref(), &dto).await?;

    let access_token = JwtService::generate_access_token(&user)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    let refresh_token = JwtService::generate_refresh_token(&user)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": if is_new_user { "Registration successful" } else { "Login successful" },
        "isNewUser": is_new_user,
        "user": UserResponse::from(user),
        "accessToken": access_token,
        "refreshToken": refresh_token
    }))))
}

/// --------------------
/// Silent Refresh Token
/// --------------------
#[derive(serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct RefreshTokenDto {
    pub refresh_token: String,
}

#[openapi(tag = "Auth")]
#[post("/auth/refresh", data = "<dto>")]
pub async fn refresh_token(
    db: &State<DbConn>,
    dto: Json<RefreshTokenDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let claims = JwtService::verify_token(&dto.refresh_token, true)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    // Re-read so the new token carries the stored role.
    let user = db
        .find_user(&claims.sub)
        .await
        .map_err(crate::services::ServiceError::from)?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    let access = JwtService::generate_access_token(&user)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "accessToken": access
    }))))
}
