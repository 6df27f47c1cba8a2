//! Shared builders for service and route tests.

use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::Store;
use crate::models::{
    Actor, Commitment, ListingMarker, ListingStatus, Role, StartupListing, SubmitApplicationDto,
    WorkType,
};

pub fn founder() -> Actor {
    Actor {
        uid: "google-founder".to_string(),
        role: Role::Founder,
        display_name: "Grace Founder".to_string(),
        email: Some("grace@futureco.dev".to_string()),
    }
}

pub fn other_founder() -> Actor {
    Actor {
        uid: "google-other".to_string(),
        role: Role::Founder,
        display_name: "Olive Other".to_string(),
        email: None,
    }
}

pub fn developer(n: u32) -> Actor {
    Actor {
        uid: format!("github-dev-{}", n),
        role: Role::Developer,
        display_name: format!("Dev {}", n),
        email: Some(format!("dev{}@futureco.dev", n)),
    }
}

pub fn listing_for(founder: &Actor) -> StartupListing {
    StartupListing {
        id: None,
        title: "Climate Ledger".to_string(),
        description: "Carbon accounting for small factories".to_string(),
        equity: 20,
        location: "Bengaluru".to_string(),
        tech_stack: vec!["Rust".to_string(), "React".to_string()],
        work_type: WorkType::Hybrid,
        commitment: Commitment::FullTime,
        whatsapp_number: "9876543210".to_string(),
        founder_id: founder.uid.clone(),
        founder_name: founder.display_name.clone(),
        founder_email: founder.email.clone(),
        applicants: 0,
        status: ListingStatus::Active,
        listing: ListingMarker::Unfilled,
        filled_by: None,
        filled_by_name: None,
        filled_at: None,
        created_at: DateTime::now(),
    }
}

pub async fn seed_listing(store: &dyn Store, founder: &Actor) -> ObjectId {
    store.insert_listing(&listing_for(founder)).await.unwrap()
}

pub fn application_dto() -> SubmitApplicationDto {
    SubmitApplicationDto {
        country_code: "+91".to_string(),
        phone: "9123456780".to_string(),
        linkedin: "https://linkedin.com/in/dev".to_string(),
        github_username: "octodev".to_string(),
        experience: "Five years building payment systems in Rust and Go.".to_string(),
        motivation: "I care about climate tooling.".to_string(),
    }
}
