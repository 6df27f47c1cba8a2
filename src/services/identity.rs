use hmac::{Hmac, Mac};
use log::{info, warn};
use mongodb::bson::DateTime;
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Deserialize;
use sha2::Sha256;

use crate::config::Config;
use crate::db::Store;
use crate::models::{Role, User};
use crate::services::{ServiceError, ServiceResult};
use crate::utils::validate_email;

type HmacSha256 = Hmac<Sha256>;

/// Identity asserted by the federated provider, signed by the identity broker.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SignInDto {
    pub uid: String,
    pub display_name: String,
    pub email: Option<String>,
    /// e.g. "github.com" or "google.com"
    pub provider_id: String,
    /// Hex HMAC-SHA256 of `uid|provider_id`
    pub signature: String,
}

/// Maps the provider a user authenticated with onto their role.
pub fn role_for_provider(provider_id: &str) -> Option<Role> {
    if provider_id == Config::founder_provider() {
        Some(Role::Founder)
    } else if provider_id == Config::developer_provider() {
        Some(Role::Developer)
    } else {
        None
    }
}

fn mac_for(uid: &str, provider_id: &str, secret: &str) -> ServiceResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| ServiceError::Unauthenticated("Invalid identity key".to_string()))?;
    mac.update(format!("{}|{}", uid, provider_id).as_bytes());
    Ok(mac)
}

pub fn sign_identity(uid: &str, provider_id: &str, secret: &str) -> ServiceResult<String> {
    let mac = mac_for(uid, provider_id, secret)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_identity(dto: &SignInDto, secret: &str) -> ServiceResult<()> {
    let signature = hex::decode(&dto.signature)
        .map_err(|_| ServiceError::Unauthenticated("Malformed identity signature".to_string()))?;

    mac_for(&dto.uid, &dto.provider_id, secret)?
        .verify_slice(&signature)
        .map_err(|_| ServiceError::Unauthenticated("Invalid identity signature".to_string()))
}

/// Verifies the identity, resolves the role once and makes sure a user record
/// exists. Returns the stored user and whether this was the first sign-in.
pub async fn sign_in(store: &dyn Store, dto: &SignInDto) -> ServiceResult<(User, bool)> {
    if dto.uid.trim().is_empty() {
        return Err(ServiceError::Unauthenticated("Missing user id".to_string()));
    }
    verify_identity(dto, &Config::identity_secret())?;

    let role = role_for_provider(&dto.provider_id).ok_or_else(|| {
        ServiceError::Unauthenticated(format!("Unsupported identity provider '{}'", dto.provider_id))
    })?;

    let email = dto.email.clone().filter(|email| validate_email(email));

    let candidate = User {
        uid: dto.uid.clone(),
        display_name: dto.display_name.trim().to_string(),
        email,
        provider: dto.provider_id.clone(),
        role,
        created_at: DateTime::now(),
    };

    let (user, created) = store.ensure_user(candidate).await?;
    if created {
        info!("New {} signed up: {}", user.role.as_str(), user.uid);
    } else if user.role != role {
        warn!(
            "User {} signed in via {} but is stored as {}; keeping stored role",
            user.uid,
            dto.provider_id,
            user.role.as_str()
        );
    }

    Ok((user, created))
}
