use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

use crate::utils::{format_datetime, not_blank, validate_tech_stack, validate_whatsapp_number};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Filled,
}

/// The `listing` marker: flips to `success` when a co-founder is found.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingMarker {
    Unfilled,
    Success,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkType {
    Remote,
    Hybrid,
    Onsite,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Commitment {
    FullTime,
    PartTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StartupListing {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub equity: i32, // 0-100
    pub location: String,
    pub tech_stack: Vec<String>,
    pub work_type: WorkType,
    pub commitment: Commitment,
    pub whatsapp_number: String,

    // Owner
    pub founder_id: String,
    pub founder_name: String,
    pub founder_email: Option<String>,

    pub applicants: i32,
    pub status: ListingStatus,
    pub listing: ListingMarker,
    pub filled_by: Option<String>,
    pub filled_by_name: Option<String>,
    pub filled_at: Option<DateTime>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreateListingDto {
    #[validate(custom = "not_blank")]
    pub title: String,
    #[validate(custom = "not_blank")]
    pub description: String,
    #[validate(range(min = 0, max = 100, message = "Equity must be between 0 and 100"))]
    pub equity: i32,
    #[validate(custom = "not_blank")]
    pub location: String,
    /// Comma separated, e.g. "React, Node.js, AWS"
    #[validate(custom = "validate_tech_stack")]
    pub tech_stack: String,
    pub work_type: WorkType,
    pub commitment: Commitment,
    #[validate(custom = "validate_whatsapp_number")]
    pub whatsapp_number: String,
}

/// Public view of a listing; never carries contact details.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListingResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub equity: i32,
    pub location: String,
    pub tech_stack: Vec<String>,
    pub work_type: WorkType,
    pub commitment: Commitment,
    pub founder_id: String,
    pub founder_name: String,
    pub applicants: i32,
    pub status: ListingStatus,
    pub listing: ListingMarker,
    pub filled_by_name: Option<String>,
    pub filled_at: Option<String>,
    pub created_at: String,
}

impl From<StartupListing> for ListingResponse {
    fn from(listing: StartupListing) -> Self {
        ListingResponse {
            id: listing.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: listing.title,
            description: listing.description,
            equity: listing.equity,
            location: listing.location,
            tech_stack: listing.tech_stack,
            work_type: listing.work_type,
            commitment: listing.commitment,
            founder_id: listing.founder_id,
            founder_name: listing.founder_name,
            applicants: listing.applicants,
            status: listing.status,
            listing: listing.listing,
            filled_by_name: listing.filled_by_name,
            filled_at: listing.filled_at.map(format_datetime),
            created_at: format_datetime(listing.created_at),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FounderDashboard {
    pub total_listings: usize,
    pub active_listings: usize,
    pub filled_listings: usize,
    pub total_applicants: i64,
}
