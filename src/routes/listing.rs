use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::FounderGuard;
use crate::models::{CreateListingDto, ListingResponse};
use crate::services::{listing, parse_object_id};
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Listing")]
#[post("/listings", data = "<dto>")]
pub async fn create_listing(
    db: &State<DbConn>,
    founder: FounderGuard,
    dto: Json<CreateListingDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let listing = listing::create_listing(db.inner().as_ref(), &founder.auth.actor, &dto).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Listing posted successfully".to_string(),
        serde_json::json!({
            "listing": ListingResponse::from(listing)
        }),
    )))
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct BrowseListingsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Active listings, newest first.
#[openapi(tag = "Listing")]
#[get("/listings?<query..>")]
pub async fn browse_listings(
    db: &State<DbConn>,
    query: BrowseListingsQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = listing::browse(db.inner().as_ref(), query.page, query.limit).await?;
    let pages = page.pages();

    let listings: Vec<ListingResponse> = page.listings.into_iter().map(ListingResponse::from).collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "listings": listings,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": page.total,
            "pages": pages,
        }
    }))))
}

#[openapi(tag = "Listing")]
#[get("/listings/<listing_id>")]
pub async fn get_listing(
    db: &State<DbConn>,
    listing_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let listing_id = parse_object_id(&listing_id, "listing")?;
    let listing = listing::get_listing(db.inner().as_ref(), &listing_id).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "listing": ListingResponse::from(listing)
    }))))
}

#[openapi(tag = "Founder")]
#[get("/founder/listings")]
pub async fn founder_listings(
    db: &State<DbConn>,
    founder: FounderGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let listings: Vec<ListingResponse> =
        listing::founder_listings(db.inner().as_ref(), &founder.auth.actor)
            .await?
            .into_iter()
            .map(ListingResponse::from)
            .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "listings": listings
    }))))
}

#[openapi(tag = "Founder")]
#[get("/founder/dashboard")]
pub async fn founder_dashboard(
    db: &State<DbConn>,
    founder: FounderGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let dashboard = listing::dashboard(db.inner().as_ref(), &founder.auth.actor).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "dashboard": dashboard
    }))))
}
