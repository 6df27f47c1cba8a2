use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::models::{Commitment, WorkType};
use crate::utils::format_datetime;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeveloperProfile {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub github_username: Option<String>,
    pub email: Option<String>,

    pub bio: String,
    pub experience: String,
    pub preferred_roles: Vec<String>,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    pub availability: Commitment,
    pub preferred_work_type: WorkType,
    pub tech_stack: Vec<String>,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateDeveloperProfileDto {
    pub github_username: Option<String>,
    pub bio: Option<String>,
    pub experience: Option<String>,
    pub preferred_roles: Option<Vec<String>>,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    pub availability: Option<Commitment>,
    pub preferred_work_type: Option<WorkType>,
    /// Comma separated
    pub tech_stack: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeveloperProfileResponse {
    pub user_id: String,
    pub github_username: Option<String>,
    pub email: Option<String>,
    pub bio: String,
    pub experience: String,
    pub preferred_roles: Vec<String>,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    pub availability: Commitment,
    pub preferred_work_type: WorkType,
    pub tech_stack: Vec<String>,
    pub updated_at: String,
}

impl From<DeveloperProfile> for DeveloperProfileResponse {
    fn from(profile: DeveloperProfile) -> Self {
        DeveloperProfileResponse {
            user_id: profile.user_id,
            github_username: profile.github_username,
            email: profile.email,
            bio: profile.bio,
            experience: profile.experience,
            preferred_roles: profile.preferred_roles,
            portfolio_url: profile.portfolio_url,
            github_url: profile.github_url,
            availability: profile.availability,
            preferred_work_type: profile.preferred_work_type,
            tech_stack: profile.tech_stack,
            updated_at: format_datetime(profile.updated_at),
        }
    }
}
