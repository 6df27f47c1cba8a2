pub mod feed;
#[cfg(test)]
pub mod memory;
pub mod mongo;

use std::sync::Arc;

use log::{error, info};
use mongodb::bson::{oid::ObjectId, DateTime};
use rocket::fairing::AdHoc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::models::{
    Application, ApplicationStatus, DeveloperProfile, Notification, StartupListing, User,
};
pub use feed::{ChangeEvent, ChangeFeed};
pub use mongo::MongoStore;

pub const USERS: &str = "users";
pub const DEVELOPER_PROFILES: &str = "developer_profiles";
pub const LISTINGS: &str = "startup_listings";
pub const APPLICATIONS: &str = "applications";
pub const NOTIFICATIONS: &str = "notifications";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A batch precondition did not hold; nothing was written.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("database error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which side of a notification to match on.
#[derive(Debug, Clone)]
pub enum NotificationFilter {
    Recipient(String),
    Founder(String),
}

/// One write inside an atomic batch. Conditional ops fail the whole batch
/// with `StoreError::Conflict` when their expected prior state is gone.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Fails if the developer already applied to the listing.
    InsertApplication(Application),
    InsertNotification(Notification),
    /// `applicants += 1` while the listing is still active.
    CountApplicant { listing_id: ObjectId, founder_id: String },
    /// `pending -> status`, stamped with the reviewer.
    ReviewApplication {
        listing_id: ObjectId,
        application_id: ObjectId,
        user_id: String,
        status: ApplicationStatus,
        reviewed_by: String,
        reviewed_at: DateTime,
    },
    /// `active -> filled`, marks the listing a success. Fails if the applicant
    /// count moved since the siblings were read.
    FillListing {
        listing_id: ObjectId,
        founder_id: String,
        expected_applicants: i32,
        filled_by: String,
        filled_by_name: String,
        filled_at: DateTime,
    },
}

#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Change events to publish once the batch has committed.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.ops
            .iter()
            .map(|op| match op {
                WriteOp::InsertApplication(application) => ChangeEvent::Application {
                    listing_id: application.listing_id,
                    user_id: application.user_id.clone(),
                },
                WriteOp::InsertNotification(notification) => ChangeEvent::Notification {
                    recipient_id: notification.recipient_id.clone(),
                    founder_id: notification.founder_id.clone(),
                },
                WriteOp::CountApplicant { listing_id, founder_id }
                | WriteOp::FillListing { listing_id, founder_id, .. } => ChangeEvent::Listing {
                    listing_id: *listing_id,
                    founder_id: founder_id.clone(),
                },
                WriteOp::ReviewApplication { listing_id, user_id, .. } => {
                    ChangeEvent::Application {
                        listing_id: *listing_id,
                        user_id: user_id.clone(),
                    }
                }
            })
            .collect()
    }
}

/// Persistence boundary. Every multi-document mutation goes through `commit`.
#[rocket::async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, uid: &str) -> StoreResult<Option<User>>;

    /// Inserts `user` unless the uid already exists. Returns the stored record
    /// and whether it was created by this call.
    async fn ensure_user(&self, user: User) -> StoreResult<(User, bool)>;

    async fn find_developer_profile(&self, user_id: &str) -> StoreResult<Option<DeveloperProfile>>;
    async fn save_developer_profile(&self, profile: &DeveloperProfile) -> StoreResult<()>;

    async fn insert_listing(&self, listing: &StartupListing) -> StoreResult<ObjectId>;
    async fn find_listing(&self, id: &ObjectId) -> StoreResult<Option<StartupListing>>;
    async fn find_listings(&self, ids: &[ObjectId]) -> StoreResult<Vec<StartupListing>>;
    /// Newest first.
    async fn listings_by_founder(&self, founder_id: &str) -> StoreResult<Vec<StartupListing>>;
    /// Active listings, newest first, with the total active count.
    async fn active_listings(&self, skip: u64, limit: i64) -> StoreResult<(Vec<StartupListing>, u64)>;

    async fn find_application(
        &self,
        listing_id: &ObjectId,
        application_id: &ObjectId,
    ) -> StoreResult<Option<Application>>;
    async fn find_user_application(
        &self,
        listing_id: &ObjectId,
        user_id: &str,
    ) -> StoreResult<Option<Application>>;
    async fn applications_for_listing(&self, listing_id: &ObjectId) -> StoreResult<Vec<Application>>;
    /// Newest first.
    async fn applications_by_user(&self, user_id: &str) -> StoreResult<Vec<Application>>;
    /// Removes the application only if it belongs to `user_id` and was rejected.
    async fn delete_rejected_application(
        &self,
        listing_id: &ObjectId,
        application_id: &ObjectId,
        user_id: &str,
    ) -> StoreResult<bool>;

    /// Newest first.
    async fn notifications(&self, filter: &NotificationFilter) -> StoreResult<Vec<Notification>>;
    async fn unread_count(&self, recipient_id: &str) -> StoreResult<u64>;
    /// Only the recipient may flip `read`; returns false when nothing matched.
    async fn mark_notification_read(&self, id: &ObjectId, recipient_id: &str) -> StoreResult<bool>;

    /// Applies every op or none of them.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

pub type DbConn = Arc<dyn Store>;

pub fn init() -> AdHoc {
    AdHoc::try_on_ignite("MongoDB", |rocket| async {
        let uri = crate::config::Config::mongodb_uri();
        let database = crate::config::Config::mongodb_database();

        match MongoStore::connect(&uri, &database).await {
            Ok(store) => {
                info!("✓ MongoDB connected successfully");
                let conn: DbConn = Arc::new(store);
                Ok(rocket.manage(conn))
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                Err(rocket)
            }
        }
    })
}
