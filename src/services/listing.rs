use log::info;
use mongodb::bson::{oid::ObjectId, DateTime};
use validator::Validate;

use crate::db::Store;
use crate::models::{
    Actor, CreateListingDto, FounderDashboard, ListingMarker, ListingStatus, Role, StartupListing,
};
use crate::services::{require_role, ServiceError, ServiceResult};
use crate::utils::parse_tech_stack;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug)]
pub struct ListingPage {
    pub listings: Vec<StartupListing>,
    pub page: i64,
    pub limit: i64,
    pub total: u64,
}

impl ListingPage {
    pub fn pages(&self) -> i64 {
        (self.total as f64 / self.limit as f64).ceil() as i64
    }
}

pub async fn create_listing(
    store: &dyn Store,
    founder: &Actor,
    dto: &CreateListingDto,
) -> ServiceResult<StartupListing> {
    require_role(founder, Role::Founder)?;
    dto.validate()?;

    let mut listing = StartupListing {
        id: None,
        title: dto.title.trim().to_string(),
        description: dto.description.trim().to_string(),
        equity: dto.equity,
        location: dto.location.trim().to_string(),
        tech_stack: parse_tech_stack(&dto.tech_stack),
        work_type: dto.work_type,
        commitment: dto.commitment,
        whatsapp_number: dto.whatsapp_number.trim().to_string(),
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
    };

    let id = store.insert_listing(&listing).await?;
    listing.id = Some(id);
    info!("Founder {} posted listing {}", founder.uid, id.to_hex());
    Ok(listing)
}

pub async fn get_listing(store: &dyn Store, listing_id: &ObjectId) -> ServiceResult<StartupListing> {
    store
        .find_listing(listing_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Listing not found".to_string()))
}

/// Active listings for the public board.
pub async fn browse(store: &dyn Store, page: Option<i64>, limit: Option<i64>) -> ServiceResult<ListingPage> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let skip = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| ServiceError::Validation("Page is out of range".to_string()))?
        as u64;

    let (listings, total) = store.active_listings(skip, limit).await?;
    Ok(ListingPage { listings, page, limit, total })
}

pub async fn founder_listings(store: &dyn Store, founder: &Actor) -> ServiceResult<Vec<StartupListing>> {
    require_role(founder, Role::Founder)?;
    Ok(store.listings_by_founder(&founder.uid).await?)
}

pub fn summarize(listings: &[StartupListing]) -> FounderDashboard {
    let active_listings = listings
        .iter()
        .filter(|l| l.status == ListingStatus::Active)
        .count();
    FounderDashboard {
        total_listings: listings.len(),
        active_listings,
        filled_listings: listings.len() - active_listings,
        total_applicants: listings.iter().map(|l| l.applicants as i64).sum(),
    }
}

pub async fn dashboard(store: &dyn Store, founder: &Actor) -> ServiceResult<FounderDashboard> {
    let listings = founder_listings(store, founder).await?;
    Ok(summarize(&listings))
}
