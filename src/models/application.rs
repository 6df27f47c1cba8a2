use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

use crate::models::ContactDetails;
use crate::utils::{format_datetime, not_blank, validate_country_code, validate_phone_number};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Application {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub listing_id: ObjectId,
    pub founder_id: String,

    // Applicant
    pub user_id: String,
    pub applicant_name: String,
    pub applicant_email: Option<String>,
    pub github_profile: String,
    pub phone: String, // country code + number
    pub linkedin: String,
    pub experience: String,
    pub motivation: String,

    pub status: ApplicationStatus,
    pub submitted_at: DateTime,
    pub reviewed_at: Option<DateTime>,
    pub reviewed_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct SubmitApplicationDto {
    #[validate(custom = "validate_country_code")]
    pub country_code: String,
    #[validate(custom = "validate_phone_number")]
    pub phone: String,
    #[validate(custom = "not_blank")]
    pub linkedin: String,
    #[validate(custom = "not_blank")]
    pub github_username: String,
    #[validate(custom = "not_blank")]
    pub experience: String,
    #[validate(custom = "not_blank")]
    pub motivation: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ApplicationResponse {
    pub id: String,
    pub listing_id: String,
    pub user_id: String,
    pub applicant_name: String,
    pub applicant_email: Option<String>,
    pub github_profile: String,
    pub phone: String,
    pub linkedin: String,
    pub experience: String,
    pub motivation: String,
    pub status: ApplicationStatus,
    pub submitted_at: String,
    pub reviewed_at: Option<String>,
}

impl From<Application> for ApplicationResponse {
    fn from(application: Application) -> Self {
        ApplicationResponse {
            id: application.id.map(|id| id.to_hex()).unwrap_or_default(),
            listing_id: application.listing_id.to_hex(),
            user_id: application.user_id,
            applicant_name: application.applicant_name,
            applicant_email: application.applicant_email,
            github_profile: application.github_profile,
            phone: application.phone,
            linkedin: application.linkedin,
            experience: application.experience,
            motivation: application.motivation,
            status: application.status,
            submitted_at: format_datetime(application.submitted_at),
            reviewed_at: application.reviewed_at.map(format_datetime),
        }
    }
}

/// A developer's application as shown in "my applications".
/// `contact` is only ever present for an approved application.
#[derive(Debug, Serialize, JsonSchema)]
pub struct MyApplicationResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub listing_title: String,
    pub contact: Option<ContactDetails>,
}
