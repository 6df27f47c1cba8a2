pub mod auth;

pub use auth::{AuthGuard, DeveloperGuard, FounderGuard};
