pub mod application;
pub mod auth;
pub mod developer;
pub mod listing;
pub mod notification;
pub mod stream;
pub mod user;
