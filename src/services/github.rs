use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::services::{ServiceError, ServiceResult};

const TOP_LANGUAGES: usize = 5;
const RECENT_REPOS: usize = 3;
const NO_DESCRIPTION: &str = "No description available";

#[derive(Debug, Deserialize)]
pub struct GithubUser {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub public_repos: u32,
    pub followers: u32,
}

#[derive(Debug, Deserialize)]
pub struct GithubRepo {
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub language: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema, PartialEq)]
pub struct RecentRepo {
    pub name: String,
    pub description: String,
    pub stars: u32,
    pub forks: u32,
    pub language: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct GithubStats {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: String,
    pub html_url: String,
    pub public_repos: u32,
    pub followers: u32,
    pub total_stars: u64,
    pub top_languages: Vec<String>,
    pub recent_repos: Vec<RecentRepo>,
}

/// `repos` is expected in most-recently-updated order.
pub fn summarize(user: GithubUser, repos: Vec<GithubRepo>) -> GithubStats {
    let total_stars = repos.iter().map(|r| r.stargazers_count as u64).sum();

    let mut top_languages: Vec<String> = Vec::new();
    for language in repos.iter().filter_map(|r| r.language.as_ref()) {
        if top_languages.len() == TOP_LANGUAGES {
            break;
        }
        if !top_languages.contains(language) {
            top_languages.push(language.clone());
        }
    }

    let recent_repos = repos
        .into_iter()
        .take(RECENT_REPOS)
        .map(|repo| RecentRepo {
            name: repo.name,
            description: repo
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            language: repo.language,
            url: repo.html_url,
        })
        .collect();

    GithubStats {
        login: user.login,
        name: user.name,
        bio: user.bio,
        avatar_url: user.avatar_url,
        html_url: user.html_url,
        public_repos: user.public_repos,
        followers: user.followers,
        total_stars,
        top_languages,
        recent_repos,
    }
}

pub struct GithubService;

impl GithubService {
    fn client() -> Client {
        Client::new()
    }

    fn is_valid_username(username: &str) -> bool {
        !username.is_empty()
            && username.len() <= 39
            && !username.starts_with('-')
            && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    }

    async fn get<T: serde::de::DeserializeOwned>(path: &str) -> ServiceResult<T> {
        let url = format!("{}{}", Config::github_api_base().trim_end_matches('/'), path);

        let mut request = Self::client()
            .get(&url)
            .header(USER_AGENT, "futureco-server")
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = Config::github_token() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let res = request
            .send()
            .await
            .map_err(|e| ServiceError::Remote(format!("GitHub request failed: {}", e)))?;

        match res.status() {
            status if status.is_success() => res
                .json::<T>()
                .await
                .map_err(|e| ServiceError::Remote(format!("Unexpected GitHub response: {}", e))),
            StatusCode::NOT_FOUND => Err(ServiceError::NotFound("GitHub user not found".to_string())),
            status => Err(ServiceError::Remote(format!("GitHub returned {}", status))),
        }
    }

    /// Public profile numbers for the given GitHub user.
    pub async fn stats(username: &str) -> ServiceResult<GithubStats> {
        let username = username.trim();
        if !Self::is_valid_username(username) {
            return Err(ServiceError::Validation("Invalid GitHub username".to_string()));
        }

        let user: GithubUser = Self::get(&format!("/users/{}", username)).await?;
        let repos: Vec<GithubRepo> =
            Self::get(&format!("/users/{}/repos?sort=updated&per_page=100", username)).await?;

        Ok(summarize(user, repos))
    }
}
