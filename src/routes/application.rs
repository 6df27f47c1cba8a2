use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::{DeveloperGuard, FounderGuard};
use crate::models::{ApplicationResponse, SubmitApplicationDto};
use crate::services::{parse_object_id, workflow};
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Application")]
#[post("/listings/<listing_id>/applications", data = "<dto>")]
pub async fn submit_application(
    db: &State<DbConn>,
    developer: DeveloperGuard,
    listing_id: String,
    dto: Json<SubmitApplicationDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let listing_id = parse_object_id(&listing_id, "listing")?;
    let application =
        workflow::submit_application(db.inner().as_ref(), &developer.auth.actor, &listing_id, &dto)
            .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Application submitted successfully".to_string(),
        serde_json::json!({
            "application": ApplicationResponse::from(application)
        }),
    )))
}

/// Every application on one of the founder's listings.
#[openapi(tag = "Application")]
#[get("/listings/<listing_id>/applications")]
pub async fn listing_applications(
    db: &State<DbConn>,
    founder: FounderGuard,
    listing_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let listing_id = parse_object_id(&listing_id, "listing")?;
    let applications: Vec<ApplicationResponse> =
        workflow::listing_applications(db.inner().as_ref(), &founder.auth.actor, &listing_id)
            .await?
            .into_iter()
            .map(ApplicationResponse::from)
            .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "applications": applications
    }))))
}

#[openapi(tag = "Application")]
#[post("/listings/<listing_id>/applications/<application_id>/approve")]
pub async fn approve_application(
    db: &State<DbConn>,
    founder: FounderGuard,
    listing_id: String,
    application_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let listing_id = parse_object_id(&listing_id, "listing")?;
    let application_id = parse_object_id(&application_id, "application")?;

    let outcome =
        workflow::approve(db.inner().as_ref(), &founder.auth.actor, &listing_id, &application_id)
            .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Application approved; listing filled".to_string(),
        serde_json::json!({
            "application": ApplicationResponse::from(outcome.application),
            "rejectedOthers": outcome.rejected_siblings
        }),
    )))
}

#[openapi(tag = "Application")]
#[post("/listings/<listing_id>/applications/<application_id>/reject")]
pub async fn reject_application(
    db: &State<DbConn>,
    founder: FounderGuard,
    listing_id: String,
    application_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let listing_id = parse_object_id(&listing_id, "listing")?;
    let application_id = parse_object_id(&application_id, "application")?;

    let outcome =
        workflow::reject(db.inner().as_ref(), &founder.auth.actor, &listing_id, &application_id)
            .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Application rejected".to_string(),
        serde_json::json!({
            "application": ApplicationResponse::from(outcome.application)
        }),
    )))
}

#[openapi(tag = "Application")]
#[delete("/listings/<listing_id>/applications/<application_id>")]
pub async fn delete_application(
    db: &State<DbConn>,
    developer: DeveloperGuard,
    listing_id: String,
    application_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let listing_id = parse_object_id(&listing_id, "listing")?;
    let application_id = parse_object_id(&application_id, "application")?;

    workflow::delete_application(
        db.inner().as_ref(),
        &developer.auth.actor,
        &listing_id,
        &application_id,
    )
    .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Application deleted successfully".to_string(),
        serde_json::json!({}),
    )))
}

#[openapi(tag = "Application")]
#[get("/applications/mine")]
pub async fn my_applications(
    db: &State<DbConn>,
    developer: DeveloperGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let applications = workflow::my_applications(db.inner().as_ref(), &developer.auth.actor).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "applications": applications
    }))))
}
