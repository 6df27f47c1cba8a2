use mongodb::bson::DateTime;

use crate::db::Store;
use crate::models::{Actor, Commitment, DeveloperProfile, Role, UpdateDeveloperProfileDto, WorkType};
use crate::services::{require_role, ServiceError, ServiceResult};
use crate::utils::parse_tech_stack;

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn blank_profile(developer: &Actor, now: DateTime) -> DeveloperProfile {
    DeveloperProfile {
        user_id: developer.uid.clone(),
        github_username: None,
        email: developer.email.clone(),
        bio: String::new(),
        experience: String::new(),
        preferred_roles: Vec::new(),
        portfolio_url: None,
        github_url: None,
        availability: Commitment::FullTime,
        preferred_work_type: WorkType::Remote,
        tech_stack: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub async fn get_profile(store: &dyn Store, developer: &Actor) -> ServiceResult<DeveloperProfile> {
    require_role(developer, Role::Developer)?;
    store
        .find_developer_profile(&developer.uid)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Profile not found".to_string()))
}

/// Creates the profile on first save; later saves only touch the fields sent.
pub async fn save_profile(
    store: &dyn Store,
    developer: &Actor,
    dto: UpdateDeveloperProfileDto,
) -> ServiceResult<DeveloperProfile> {
    require_role(developer, Role::Developer)?;
    let now = DateTime::now();
    let mut profile = store
        .find_developer_profile(&developer.uid)
        .await?
        .unwrap_or_else(|| blank_profile(developer, now));

    if let Some(username) = trimmed(dto.github_username) {
        profile.github_username = Some(username);
    }
    if let Some(bio) = dto.bio {
        profile.bio = bio.trim().to_string();
    }
    if let Some(experience) = dto.experience {
        profile.experience = experience.trim().to_string();
    }
    if let Some(roles) = dto.preferred_roles {
        profile.preferred_roles = roles
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
    }
    if dto.portfolio_url.is_some() {
        profile.portfolio_url = trimmed(dto.portfolio_url);
    }
    if dto.github_url.is_some() {
        profile.github_url = trimmed(dto.github_url);
    }
    if let Some(availability) = dto.availability {
        profile.availability = availability;
    }
    if let Some(work_type) = dto.preferred_work_type {
        profile.preferred_work_type = work_type;
    }
    if let Some(raw) = dto.tech_stack {
        profile.tech_stack = parse_tech_stack(&raw);
    }

    if profile.github_url.is_none() {
        profile.github_url = profile
            .github_username
            .as_ref()
            .map(|username| format!("https://github.com/{}", username));
    }
    profile.updated_at = now;

    store.save_developer_profile(&profile).await?;
    Ok(profile)
}
