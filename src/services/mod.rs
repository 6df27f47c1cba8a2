pub mod error;
#[cfg(test)]
pub mod fixtures;
pub mod github;
pub mod identity;
pub mod jwt;
pub mod listing;
pub mod notification;
pub mod profile;
pub mod workflow;

use mongodb::bson::oid::ObjectId;

use crate::models::{Actor, Role};

pub use error::{ServiceError, ServiceResult};
pub use github::GithubService;
pub use jwt::JwtService;

pub fn parse_object_id(raw: &str, what: &str) -> ServiceResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| ServiceError::Validation(format!("Invalid {} ID", what)))
}

/// Role gates answer as unauthenticated: the caller signed in with the wrong provider.
pub fn require_role(actor: &Actor, role: Role) -> ServiceResult<()> {
    if actor.role != role {
        return Err(ServiceError::Unauthenticated(format!(
            "Please sign in as a {} to continue",
            role.as_str()
        )));
    }
    Ok(())
}
