use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::utils::format_datetime;

/// Resolved once at sign-in from the identity provider and stored on the user.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Founder,
    Developer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Founder => "founder",
            Role::Developer => "developer",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub uid: String,
    pub display_name: String,
    pub email: Option<String>,
    pub provider: String,
    pub role: Role,
    pub created_at: DateTime,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UserResponse {
    pub uid: String,
    pub display_name: String,
    pub email: Option<String>,
    pub provider: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            uid: user.uid,
            display_name: user.display_name,
            email: user.email,
            provider: user.provider,
            role: user.role,
            created_at: format_datetime(user.created_at),
        }
    }
}

/// The signed-in caller, as carried by a verified access token.
#[derive(Debug, Clone)]
pub struct Actor {
    pub uid: String,
    pub role: Role,
    pub display_name: String,
    pub email: Option<String>,
}
