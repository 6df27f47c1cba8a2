use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mongodb::bson::oid::ObjectId;
use tokio::sync::broadcast;

use super::{
    ChangeEvent, ChangeFeed, NotificationFilter, Store, StoreError, StoreResult, WriteBatch,
    WriteOp,
};
use crate::models::{
    Application, ApplicationStatus, DeveloperProfile, ListingMarker, ListingStatus, Notification,
    StartupListing, User,
};

#[derive(Debug, Clone, Default)]
struct Collections {
    users: HashMap<String, User>,
    profiles: HashMap<String, DeveloperProfile>,
    listings: HashMap<ObjectId, StartupListing>,
    applications: HashMap<ObjectId, Application>,
    notifications: HashMap<ObjectId, Notification>,
}

impl Collections {
    fn apply(&mut self, op: &WriteOp) -> StoreResult<()> {
        match op {
            WriteOp::InsertApplication(application) => {
                let duplicate = self.applications.values().any(|existing| {
                    existing.listing_id == application.listing_id
                        && existing.user_id == application.user_id
                });
                if duplicate {
                    return Err(StoreError::Conflict("application already submitted".to_string()));
                }
                let mut application = application.clone();
                let id = *application.id.get_or_insert_with(ObjectId::new);
                self.applications.insert(id, application);
            }
            WriteOp::InsertNotification(notification) => {
                let mut notification = notification.clone();
                let id = *notification.id.get_or_insert_with(ObjectId::new);
                self.notifications.insert(id, notification);
            }
            WriteOp::CountApplicant { listing_id, .. } => {
                let listing = self
                    .listings
                    .get_mut(listing_id)
                    .filter(|listing| listing.status == ListingStatus::Active)
                    .ok_or_else(|| {
                        StoreError::Conflict(format!(
                            "listing {} is no longer active",
                            listing_id.to_hex()
                        ))
                    })?;
                listing.applicants += 1;
            }
            WriteOp::ReviewApplication {
                listing_id,
                application_id,
                status,
                reviewed_by,
                reviewed_at,
                ..
            } => {
                let application = self
                    .applications
                    .get_mut(application_id)
                    .filter(|a| {
                        a.listing_id == *listing_id && a.status == ApplicationStatus::Pending
                    })
                    .ok_or_else(|| {
                        StoreError::Conflict(format!(
                            "application {} is no longer pending",
                            application_id.to_hex()
                        ))
                    })?;
                application.status = *status;
                application.reviewed_by = Some(reviewed_by.clone());
                application.reviewed_at = Some(*reviewed_at);
            }
            WriteOp::FillListing {
                listing_id,
                expected_applicants,
                filled_by,
                filled_by_name,
                filled_at,
                ..
            } => {
                let listing = self
                    .listings
                    .get_mut(listing_id)
                    .filter(|listing| {
                        listing.status == ListingStatus::Active
                            && listing.applicants == *expected_applicants
                    })
                    .ok_or_else(|| {
                        StoreError::Conflict(format!(
                            "listing {} is filled or has new applicants",
                            listing_id.to_hex()
                        ))
                    })?;
                listing.status = ListingStatus::Filled;
                listing.listing = ListingMarker::Success;
                listing.filled_by = Some(filled_by.clone());
                listing.filled_by_name = Some(filled_by_name.clone());
                listing.filled_at = Some(*filled_at);
            }
        }
        Ok(())
    }
}

/// Process-local store used by the test suite.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Collections>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn all_applications(&self) -> Vec<Application> {
        self.lock().applications.values().cloned().collect()
    }

    pub fn all_notifications(&self) -> Vec<Notification> {
        self.lock().notifications.values().cloned().collect()
    }
}

fn sort_newest<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, uid: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(uid).cloned())
    }

    async fn ensure_user(&self, user: User) -> StoreResult<(User, bool)> {
        let mut data = self.lock();
        if let Some(existing) = data.users.get(&user.uid) {
            return Ok((existing.clone(), false));
        }
        data.users.insert(user.uid.clone(), user.clone());
        Ok((user, true))
    }

    async fn find_developer_profile(&self, user_id: &str) -> StoreResult<Option<DeveloperProfile>> {
        Ok(self.lock().profiles.get(user_id).cloned())
    }

    async fn save_developer_profile(&self, profile: &DeveloperProfile) -> StoreResult<()> {
        self.lock()
            .profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn insert_listing(&self, listing: &StartupListing) -> StoreResult<ObjectId> {
        let mut listing = listing.clone();
        let id = *listing.id.get_or_insert_with(ObjectId::new);
        let founder_id = listing.founder_id.clone();
        self.lock().listings.insert(id, listing);

        self.feed.publish(vec![ChangeEvent::Listing {
            listing_id: id,
            founder_id,
        }]);
        Ok(id)
    }

    async fn find_listing(&self, id: &ObjectId) -> StoreResult<Option<StartupListing>> {
        Ok(self.lock().listings.get(id).cloned())
    }

    async fn find_listings(&self, ids: &[ObjectId]) -> StoreResult<Vec<StartupListing>> {
        let data = self.lock();
        Ok(ids.iter().filter_map(|id| data.listings.get(id).cloned()).collect())
    }

    async fn listings_by_founder(&self, founder_id: &str) -> StoreResult<Vec<StartupListing>> {
        let mut listings: Vec<StartupListing> = self
            .lock()
            .listings
            .values()
            .filter(|listing| listing.founder_id == founder_id)
            .cloned()
            .collect();
        sort_newest(&mut listings, |l| (l.created_at, l.id));
        Ok(listings)
    }

    async fn active_listings(&self, skip: u64, limit: i64) -> StoreResult<(Vec<StartupListing>, u64)> {
        let mut listings: Vec<StartupListing> = self
            .lock()
            .listings
            .values()
            .filter(|listing| listing.status == ListingStatus::Active)
            .cloned()
            .collect();
        sort_newest(&mut listings, |l| (l.created_at, l.id));

        let total = listings.len() as u64;
        let page = listings
            .into_iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_application(
        &self,
        listing_id: &ObjectId,
        application_id: &ObjectId,
    ) -> StoreResult<Option<Application>> {
        Ok(self
            .lock()
            .applications
            .get(application_id)
            .filter(|a| a.listing_id == *listing_id)
            .cloned())
    }

    async fn find_user_application(
        &self,
        listing_id: &ObjectId,
        user_id: &str,
    ) -> StoreResult<Option<Application>> {
        Ok(self
            .lock()
            .applications
            .values()
            .find(|a| a.listing_id == *listing_id && a.user_id == user_id)
            .cloned())
    }

    async fn applications_for_listing(&self, listing_id: &ObjectId) -> StoreResult<Vec<Application>> {
        let mut applications: Vec<Application> = self
            .lock()
            .applications
            .values()
            .filter(|a| a.listing_id == *listing_id)
            .cloned()
            .collect();
        sort_newest(&mut applications, |a| (a.submitted_at, a.id));
        Ok(applications)
    }

    async fn applications_by_user(&self, user_id: &str) -> StoreResult<Vec<Application>> {
        let mut applications: Vec<Application> = self
            .lock()
            .applications
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        sort_newest(&mut applications, |a| (a.submitted_at, a.id));
        Ok(applications)
    }

    async fn delete_rejected_application(
        &self,
        listing_id: &ObjectId,
        application_id: &ObjectId,
        user_id: &str,
    ) -> StoreResult<bool> {
        let removed = {
            let mut data = self.lock();
            let deletable = data.applications.get(application_id).is_some_and(|a| {
                a.listing_id == *listing_id
                    && a.user_id == user_id
                    && a.status == ApplicationStatus::Rejected
            });
            deletable && data.applications.remove(application_id).is_some()
        };

        if removed {
            self.feed.publish(vec![ChangeEvent::Application {
                listing_id: *listing_id,
                user_id: user_id.to_string(),
            }]);
        }
        Ok(removed)
    }

    async fn notifications(&self, filter: &NotificationFilter) -> StoreResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .lock()
            .notifications
            .values()
            .filter(|n| match filter {
                NotificationFilter::Recipient(uid) => &n.recipient_id == uid,
                NotificationFilter::Founder(uid) => &n.founder_id == uid,
            })
            .cloned()
            .collect();
        sort_newest(&mut notifications, |n| (n.timestamp, n.id));
        Ok(notifications)
    }

    async fn unread_count(&self, recipient_id: &str) -> StoreResult<u64> {
        Ok(self
            .lock()
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient_id && !n.read)
            .count() as u64)
    }

    async fn mark_notification_read(&self, id: &ObjectId, recipient_id: &str) -> StoreResult<bool> {
        let event = {
            let mut data = self.lock();
            match data.notifications.get_mut(id) {
                Some(n) if n.recipient_id == recipient_id => {
                    n.read = true;
                    Some(ChangeEvent::Notification {
                        recipient_id: n.recipient_id.clone(),
                        founder_id: n.founder_id.clone(),
                    })
                }
                _ => None,
            }
        };

        match event {
            Some(event) => {
                self.feed.publish(vec![event]);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        {
            let mut data = self.lock();
            // Stage on a copy so a failing op leaves nothing behind
            let mut staged = data.clone();
            for op in batch.ops() {
                staged.apply(op)?;
            }
            *data = staged;
        }
        self.feed.publish(batch.events());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Commitment, WorkType};
    use mongodb::bson::DateTime;

    fn listing(founder: &str) -> StartupListing {
        StartupListing {
            id: None,
            title: "Orbital".to_string(),
            description: "Satellite scheduling".to_string(),
            equity: 20,
            location: "Berlin".to_string(),
            tech_stack: vec!["Rust".to_string()],
            work_type: WorkType::Remote,
            commitment: Commitment::FullTime,
            whatsapp_number: "9876543210".to_string(),
            founder_id: founder.to_string(),
            founder_name: "Grace".to_string(),
            founder_email: None,
            applicants: 0,
            status: ListingStatus::Active,
            listing: ListingMarker::Unfilled,
            filled_by: None,
            filled_by_name: None,
            filled_at: None,
            created_at: DateTime::now(),
        }
    }

    #[tokio::test]
    async fn failed_batch_leaves_no_trace() {
        let store = MemoryStore::new();
        let listing_id = store.insert_listing(&listing("f1")).await.unwrap();

        let mut batch = WriteBatch::new();
        batch
            .push(WriteOp::CountApplicant {
                listing_id,
                founder_id: "f1".to_string(),
            })
            .push(WriteOp::ReviewApplication {
                listing_id,
                application_id: ObjectId::new(),
                user_id: "ghost".to_string(),
                status: ApplicationStatus::Approved,
                reviewed_by: "f1".to_string(),
                reviewed_at: DateTime::now(),
            });

        let result = store.commit(batch).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let stored = store.find_listing(&listing_id).await.unwrap().unwrap();
        assert_eq!(stored.applicants, 0, "counter must not move on a failed batch");
    }

    #[tokio::test]
    async fn fill_listing_twice_conflicts() {
        let store = MemoryStore::new();
        let listing_id = store.insert_listing(&listing("f1")).await.unwrap();
        let fill = WriteOp::FillListing {
            listing_id,
            founder_id: "f1".to_string(),
            expected_applicants: 0,
            filled_by: "dev".to_string(),
            filled_by_name: "Ada".to_string(),
            filled_at: DateTime::now(),
        };

        let mut first = WriteBatch::new();
        first.push(fill.clone());
        store.commit(first).await.unwrap();

        let mut second = WriteBatch::new();
        second.push(fill);
        assert!(matches!(store.commit(second).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let store = MemoryStore::new();
        let user = User {
            uid: "u1".to_string(),
            display_name: "Ada".to_string(),
            email: None,
            provider: "github.com".to_string(),
            role: crate::models::Role::Developer,
            created_at: DateTime::now(),
        };

        let (_, created) = store.ensure_user(user.clone()).await.unwrap();
        assert!(created);

        let mut renamed = user;
        renamed.display_name = "Someone else".to_string();
        let (stored, created) = store.ensure_user(renamed).await.unwrap();
        assert!(!created);
        assert_eq!(stored.display_name, "Ada");
    }

    #[tokio::test]
    async fn commit_publishes_change_events() {
        let store = MemoryStore::new();
        let listing_id = store.insert_listing(&listing("f1")).await.unwrap();
        let mut rx = store.subscribe();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::CountApplicant {
            listing_id,
            founder_id: "f1".to_string(),
        });
        store.commit(batch).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert!(event.touches_listings_of("f1"));
    }
}
