use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::DeveloperGuard;
use crate::models::{DeveloperProfileResponse, UpdateDeveloperProfileDto};
use crate::services::{profile, GithubService};
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Developer")]
#[get("/developer/profile")]
pub async fn get_developer_profile(
    db: &State<DbConn>,
    developer: DeveloperGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let profile = profile::get_profile(db.inner().as_ref(), &developer.auth.actor).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "profile": DeveloperProfileResponse::from(profile)
    }))))
}

#[openapi(tag = "Developer")]
#[put("/developer/profile", data = "<dto>")]
pub async fn update_developer_profile(
    db: &State<DbConn>,
    developer: DeveloperGuard,
    dto: Json<UpdateDeveloperProfileDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let profile =
        profile::save_profile(db.inner().as_ref(), &developer.auth.actor, dto.into_inner()).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Profile saved successfully".to_string(),
        serde_json::json!({
            "profile": DeveloperProfileResponse::from(profile)
        }),
    )))
}

/// Public GitHub numbers; no sign-in needed.
#[openapi(tag = "Developer")]
#[get("/github/<username>")]
pub async fn github_stats(
    username: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let stats = GithubService::stats(&username).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "stats": stats
    }))))
}
