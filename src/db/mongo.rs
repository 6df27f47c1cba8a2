use log::{info, warn};
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{
    FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument, UpdateOptions,
};
use mongodb::{Client, ClientSession, Collection, Database, IndexModel};
use rocket::futures::TryStreamExt;
use tokio::sync::broadcast;

use super::{
    ChangeEvent, ChangeFeed, NotificationFilter, Store, StoreError, StoreResult, WriteBatch,
    WriteOp, APPLICATIONS, DEVELOPER_PROFILES, LISTINGS, NOTIFICATIONS, USERS,
};
use crate::models::{Application, DeveloperProfile, Notification, StartupListing, User};

const DUPLICATE_KEY: i32 = 11000;

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        match *e.kind {
            ErrorKind::BsonDeserialization(ref inner) => StoreError::Malformed(inner.to_string()),
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(e: bson::ser::Error) -> Self {
        StoreError::Malformed(e.to_string())
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match *e.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref we)) => we.code == DUPLICATE_KEY,
        ErrorKind::Command(ref ce) => ce.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// MongoDB-backed store. Batches run as multi-document transactions, which
/// needs a replica set (a single-node `rs0` is enough).
pub struct MongoStore {
    client: Client,
    db: Database,
    feed: ChangeFeed,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;

        // Test connection
        client
            .database("admin")
            .run_command(doc! {"ping": 1}, None)
            .await?;

        let store = MongoStore {
            db: client.database(database),
            client,
            feed: ChangeFeed::default(),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), mongodb::error::Error> {
        let unique = IndexOptions::builder().unique(true).build();

        self.applications()
            .create_indexes(
                vec![
                    IndexModel::builder()
                        .keys(doc! { "listing_id": 1, "user_id": 1 })
                        .options(unique)
                        .build(),
                    IndexModel::builder()
                        .keys(doc! { "user_id": 1, "submitted_at": -1 })
                        .build(),
                ],
                None,
            )
            .await?;

        self.listings()
            .create_indexes(
                vec![
                    IndexModel::builder()
                        .keys(doc! { "founder_id": 1, "created_at": -1 })
                        .build(),
                    IndexModel::builder()
                        .keys(doc! { "status": 1, "created_at": -1 })
                        .build(),
                ],
                None,
            )
            .await?;

        self.notification_collection()
            .create_indexes(
                vec![
                    IndexModel::builder()
                        .keys(doc! { "recipient_id": 1, "timestamp": -1 })
                        .build(),
                    IndexModel::builder()
                        .keys(doc! { "founder_id": 1, "timestamp": -1 })
                        .build(),
                ],
                None,
            )
            .await?;

        info!("✓ MongoDB indexes ensured");
        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn profiles(&self) -> Collection<DeveloperProfile> {
        self.db.collection(DEVELOPER_PROFILES)
    }

    fn listings(&self) -> Collection<StartupListing> {
        self.db.collection(LISTINGS)
    }

    fn applications(&self) -> Collection<Application> {
        self.db.collection(APPLICATIONS)
    }

    fn notification_collection(&self) -> Collection<Notification> {
        self.db.collection(NOTIFICATIONS)
    }

    async fn apply(&self, batch: &WriteBatch, session: &mut ClientSession) -> StoreResult<()> {
        for op in batch.ops() {
            match op {
                WriteOp::InsertApplication(application) => {
                    self.applications()
                        .insert_one_with_session(application, None, session)
                        .await
                        .map_err(|e| {
                            if is_duplicate_key(&e) {
                                StoreError::Conflict("application already submitted".to_string())
                            } else {
                                StoreError::from(e)
                            }
                        })?;
                }
                WriteOp::InsertNotification(notification) => {
                    self.notification_collection()
                        .insert_one_with_session(notification, None, session)
                        .await?;
                }
                WriteOp::CountApplicant { listing_id, .. } => {
                    let result = self
                        .listings()
                        .update_one_with_session(
                            doc! { "_id": listing_id, "status": "active" },
                            doc! { "$inc": { "applicants": 1 } },
                            None,
                            session,
                        )
                        .await?;
                    if result.matched_count == 0 {
                        return Err(StoreError::Conflict(format!(
                            "listing {} is no longer active",
                            listing_id.to_hex()
                        )));
                    }
                }
                WriteOp::ReviewApplication {
                    listing_id,
                    application_id,
                    status,
                    reviewed_by,
                    reviewed_at,
                    ..
                } => {
                    let result = self
                        .applications()
                        .update_one_with_session(
                            doc! {
                                "_id": application_id,
                                "listing_id": listing_id,
                                "status": "pending"
                            },
                            doc! {
                                "$set": {
                                    "status": status.as_str(),
                                    "reviewed_by": reviewed_by.as_str(),
                                    "reviewed_at": *reviewed_at
                                }
                            },
                            None,
                            session,
                        )
                        .await?;
                    if result.matched_count == 0 {
                        return Err(StoreError::Conflict(format!(
                            "application {} is no longer pending",
                            application_id.to_hex()
                        )));
                    }
                }
                WriteOp::FillListing {
                    listing_id,
                    expected_applicants,
                    filled_by,
                    filled_by_name,
                    filled_at,
                    ..
                } => {
                    let result = self
                        .listings()
                        .update_one_with_session(
                            doc! {
                                "_id": listing_id,
                                "status": "active",
                                "applicants": *expected_applicants
                            },
                            doc! {
                                "$set": {
                                    "status": "filled",
                                    "listing": "success",
                                    "filled_by": filled_by.as_str(),
                                    "filled_by_name": filled_by_name.as_str(),
                                    "filled_at": *filled_at
                                }
                            },
                            None,
                            session,
                        )
                        .await?;
                    if result.matched_count == 0 {
                        return Err(StoreError::Conflict(format!(
                            "listing {} is filled or has new applicants",
                            listing_id.to_hex()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    async fn find_many<T>(
        collection: Collection<T>,
        filter: Document,
        options: Option<FindOptions>,
    ) -> StoreResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Unpin + Send + Sync,
    {
        let cursor = collection.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }
}

fn newest_first(field: &str) -> FindOptions {
    FindOptions::builder().sort(doc! { field: -1 }).build()
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn find_user(&self, uid: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": uid }, None).await?)
    }

    async fn ensure_user(&self, user: User) -> StoreResult<(User, bool)> {
        let mut fields = bson::to_document(&user)?;
        fields.remove("_id");

        let result = self
            .users()
            .update_one(
                doc! { "_id": &user.uid },
                doc! { "$setOnInsert": fields },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await?;

        if result.upserted_id.is_some() {
            return Ok((user, true));
        }

        let existing = self
            .find_user(&user.uid)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("user {} vanished after upsert", user.uid)))?;
        Ok((existing, false))
    }

    async fn find_developer_profile(&self, user_id: &str) -> StoreResult<Option<DeveloperProfile>> {
        Ok(self.profiles().find_one(doc! { "_id": user_id }, None).await?)
    }

    async fn save_developer_profile(&self, profile: &DeveloperProfile) -> StoreResult<()> {
        let mut fields = bson::to_document(profile)?;
        fields.remove("_id");

        self.profiles()
            .update_one(
                doc! { "_id": &profile.user_id },
                doc! { "$set": fields },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn insert_listing(&self, listing: &StartupListing) -> StoreResult<ObjectId> {
        let result = self.listings().insert_one(listing, None).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Malformed("listing id is not an ObjectId".to_string()))?;

        self.feed.publish(vec![ChangeEvent::Listing {
            listing_id: id,
            founder_id: listing.founder_id.clone(),
        }]);
        Ok(id)
    }

    async fn find_listing(&self, id: &ObjectId) -> StoreResult<Option<StartupListing>> {
        Ok(self.listings().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_listings(&self, ids: &[ObjectId]) -> StoreResult<Vec<StartupListing>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Self::find_many(self.listings(), doc! { "_id": { "$in": ids.to_vec() } }, None).await
    }

    async fn listings_by_founder(&self, founder_id: &str) -> StoreResult<Vec<StartupListing>> {
        Self::find_many(
            self.listings(),
            doc! { "founder_id": founder_id },
            Some(newest_first("created_at")),
        )
        .await
    }

    async fn active_listings(&self, skip: u64, limit: i64) -> StoreResult<(Vec<StartupListing>, u64)> {
        let filter = doc! { "status": "active" };
        let options = FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .sort(doc! { "created_at": -1 })
            .build();

        let listings = Self::find_many(self.listings(), filter.clone(), Some(options)).await?;
        let total = self.listings().count_documents(filter, None).await?;
        Ok((listings, total))
    }

    async fn find_application(
        &self,
        listing_id: &ObjectId,
        application_id: &ObjectId,
    ) -> StoreResult<Option<Application>> {
        Ok(self
            .applications()
            .find_one(doc! { "_id": application_id, "listing_id": listing_id }, None)
            .await?)
    }

    async fn find_user_application(
        &self,
        listing_id: &ObjectId,
        user_id: &str,
    ) -> StoreResult<Option<Application>> {
        Ok(self
            .applications()
            .find_one(doc! { "listing_id": listing_id, "user_id": user_id }, None)
            .await?)
    }

    async fn applications_for_listing(&self, listing_id: &ObjectId) -> StoreResult<Vec<Application>> {
        Self::find_many(
            self.applications(),
            doc! { "listing_id": listing_id },
            Some(newest_first("submitted_at")),
        )
        .await
    }

    async fn applications_by_user(&self, user_id: &str) -> StoreResult<Vec<Application>> {
        Self::find_many(
            self.applications(),
            doc! { "user_id": user_id },
            Some(newest_first("submitted_at")),
        )
        .await
    }

    async fn delete_rejected_application(
        &self,
        listing_id: &ObjectId,
        application_id: &ObjectId,
        user_id: &str,
    ) -> StoreResult<bool> {
        let result = self
            .applications()
            .delete_one(
                doc! {
                    "_id": application_id,
                    "listing_id": listing_id,
                    "user_id": user_id,
                    "status": "rejected"
                },
                None,
            )
            .await?;

        let deleted = result.deleted_count > 0;
        if deleted {
            self.feed.publish(vec![ChangeEvent::Application {
                listing_id: *listing_id,
                user_id: user_id.to_string(),
            }]);
        }
        Ok(deleted)
    }

    async fn notifications(&self, filter: &NotificationFilter) -> StoreResult<Vec<Notification>> {
        let filter = match filter {
            NotificationFilter::Recipient(uid) => doc! { "recipient_id": uid },
            NotificationFilter::Founder(uid) => doc! { "founder_id": uid },
        };
        Self::find_many(
            self.notification_collection(),
            filter,
            Some(newest_first("timestamp")),
        )
        .await
    }

    async fn unread_count(&self, recipient_id: &str) -> StoreResult<u64> {
        Ok(self
            .notification_collection()
            .count_documents(doc! { "recipient_id": recipient_id, "read": false }, None)
            .await?)
    }

    async fn mark_notification_read(&self, id: &ObjectId, recipient_id: &str) -> StoreResult<bool> {
        let updated = self
            .notification_collection()
            .find_one_and_update(
                doc! { "_id": id, "recipient_id": recipient_id },
                doc! { "$set": { "read": true } },
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?;

        match updated {
            Some(notification) => {
                self.feed.publish(vec![ChangeEvent::Notification {
                    recipient_id: notification.recipient_id,
                    founder_id: notification.founder_id,
                }]);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        if let Err(e) = self.apply(&batch, &mut session).await {
            if let Err(abort) = session.abort_transaction().await {
                warn!("Failed to abort transaction: {}", abort);
            }
            return Err(e);
        }

        session.commit_transaction().await?;
        self.feed.publish(batch.events());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
