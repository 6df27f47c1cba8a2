use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::Config as RocketConfig;
use std::env;

pub struct Config;

impl Config {
    fn figment() -> Figment {
        // Get the current profile
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_").split("_"))
    }

    pub fn jwt_secret() -> String {
        Self::figment()
            .extract_inner("jwt_secret")
            .unwrap_or_else(|_| "default-secret".to_string())
    }

    pub fn jwt_refresh_secret() -> String {
        Self::figment()
            .extract_inner("jwt_refresh_secret")
            .unwrap_or_else(|_| "default-refresh-secret".to_string())
    }

    pub fn jwt_expiry() -> i64 {
        Self::figment()
            .extract_inner("jwt_expiry")
            .unwrap_or(900)
    }

    pub fn jwt_refresh_expiry() -> i64 {
        Self::figment()
            .extract_inner("jwt_refresh_expiry")
            .unwrap_or(604800)
    }

    /// Shared secret the identity broker signs `uid|provider_id` with.
    pub fn identity_secret() -> String {
        Self::figment()
            .extract_inner("identity_secret")
            .unwrap_or_else(|_| "default-identity-secret".to_string())
    }

    pub fn founder_provider() -> String {
        Self::figment()
            .extract_inner("founder_provider")
            .unwrap_or_else(|_| "google.com".to_string())
    }

    pub fn developer_provider() -> String {
        Self::figment()
            .extract_inner("developer_provider")
            .unwrap_or_else(|_| "github.com".to_string())
    }

    pub fn mongodb_uri() -> String {
        Self::figment()
            .extract_inner("mongodb_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017/?replicaSet=rs0".to_string())
    }

    pub fn mongodb_database() -> String {
        Self::figment()
            .extract_inner("mongodb_database")
            .unwrap_or_else(|_| "futureco".to_string())
    }

    pub fn github_api_base() -> String {
        Self::figment()
            .extract_inner("github_api_base")
            .unwrap_or_else(|_| "https://api.github.com".to_string())
    }

    pub fn github_token() -> Option<String> {
        Self::figment()
            .extract_inner::<String>("github_token")
            .ok()
            .filter(|token| !token.is_empty())
    }

    pub fn is_development() -> bool {
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());
        profile == "development"
    }
}
