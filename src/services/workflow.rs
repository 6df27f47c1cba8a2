//! Application lifecycle: submit, approve, reject, withdraw.
//!
//! Every transition is built as one `WriteBatch` so the application, the
//! listing and the notifications it fans out to change together or not at all.

use std::collections::HashMap;

use log::info;
use mongodb::bson::{oid::ObjectId, DateTime};
use validator::Validate;

use crate::db::{Store, WriteBatch, WriteOp};
use crate::models::{
    Actor, Application, ApplicationResponse, ApplicationStatus, ListingStatus,
    MyApplicationResponse, Role, StartupListing, SubmitApplicationDto,
};
use crate::services::notification::{self as notify, contact_details};
use crate::services::{require_role, ServiceError, ServiceResult};

/// What a review decision changed.
#[derive(Debug)]
pub struct ReviewOutcome {
    pub application: Application,
    /// Other pending applications closed by an approval.
    pub rejected_siblings: usize,
}

async fn load_listing(store: &dyn Store, listing_id: &ObjectId) -> ServiceResult<StartupListing> {
    store
        .find_listing(listing_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Listing not found".to_string()))
}

async fn load_application(
    store: &dyn Store,
    listing_id: &ObjectId,
    application_id: &ObjectId,
) -> ServiceResult<Application> {
    store
        .find_application(listing_id, application_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Application not found".to_string()))
}

/// Listing owned by `founder`, or `Unauthorized`.
async fn owned_listing(
    store: &dyn Store,
    founder: &Actor,
    listing_id: &ObjectId,
) -> ServiceResult<StartupListing> {
    require_role(founder, Role::Founder)?;
    let listing = load_listing(store, listing_id).await?;
    if listing.founder_id != founder.uid {
        return Err(ServiceError::Unauthorized(
            "Only the listing owner can manage its applications".to_string(),
        ));
    }
    Ok(listing)
}

fn ensure_pending(application: &Application) -> ServiceResult<()> {
    if application.status != ApplicationStatus::Pending {
        return Err(ServiceError::Conflict(format!(
            "Application has already been {}",
            application.status.as_str()
        )));
    }
    Ok(())
}

fn ensure_active(listing: &StartupListing) -> ServiceResult<()> {
    if listing.status != ListingStatus::Active {
        return Err(ServiceError::Conflict("This listing has already been filled".to_string()));
    }
    Ok(())
}

fn review_op(
    application: &Application,
    listing_id: ObjectId,
    application_id: ObjectId,
    status: ApplicationStatus,
    reviewer: &str,
    at: DateTime,
) -> WriteOp {
    WriteOp::ReviewApplication {
        listing_id,
        application_id,
        user_id: application.user_id.clone(),
        status,
        reviewed_by: reviewer.to_string(),
        reviewed_at: at,
    }
}

fn reviewed(mut application: Application, status: ApplicationStatus, reviewer: &str, at: DateTime) -> Application {
    application.status = status;
    application.reviewed_by = Some(reviewer.to_string());
    application.reviewed_at = Some(at);
    application
}

pub async fn submit_application(
    store: &dyn Store,
    developer: &Actor,
    listing_id: &ObjectId,
    dto: &SubmitApplicationDto,
) -> ServiceResult<Application> {
    require_role(developer, Role::Developer)?;
    dto.validate()?;

    let listing = load_listing(store, listing_id).await?;
    ensure_active(&listing)?;

    if store.find_user_application(listing_id, &developer.uid).await?.is_some() {
        return Err(ServiceError::Conflict(
            "You have already applied to this listing".to_string(),
        ));
    }

    let application = Application {
        id: Some(ObjectId::new()),
        listing_id: *listing_id,
        founder_id: listing.founder_id.clone(),
        user_id: developer.uid.clone(),
        applicant_name: developer.display_name.clone(),
        applicant_email: developer.email.clone(),
        github_profile: dto.github_username.trim().to_string(),
        phone: format!("{}{}", dto.country_code, dto.phone.trim()),
        linkedin: dto.linkedin.trim().to_string(),
        experience: dto.experience.trim().to_string(),
        motivation: dto.motivation.trim().to_string(),
        status: ApplicationStatus::Pending,
        submitted_at: DateTime::now(),
        reviewed_at: None,
        reviewed_by: None,
    };

    let mut batch = WriteBatch::new();
    batch
        .push(WriteOp::CountApplicant {
            listing_id: *listing_id,
            founder_id: listing.founder_id.clone(),
        })
        .push(WriteOp::InsertApplication(application.clone()))
        .push(WriteOp::InsertNotification(notify::new_application(
            &listing,
            *listing_id,
            &application,
        )));
    store.commit(batch).await?;

    info!(
        "{} applied to listing {}",
        developer.uid,
        listing_id.to_hex()
    );
    Ok(application)
}

/// Approves `target` and closes every other pending application on the listing.
fn approval_batch(
    listing: &StartupListing,
    listing_id: ObjectId,
    target: &Application,
    target_id: ObjectId,
    siblings: &[Application],
    reviewer: &str,
    at: DateTime,
) -> WriteBatch {
    let mut batch = WriteBatch::new();
    batch
        .push(review_op(target, listing_id, target_id, ApplicationStatus::Approved, reviewer, at))
        .push(WriteOp::FillListing {
            listing_id,
            founder_id: listing.founder_id.clone(),
            expected_applicants: listing.applicants,
            filled_by: target.user_id.clone(),
            filled_by_name: target.applicant_name.clone(),
            filled_at: at,
        })
        .push(WriteOp::InsertNotification(notify::approved(listing, listing_id, target, at)));

    for sibling in siblings {
        let Some(sibling_id) = sibling.id else { continue };
        batch.push(review_op(
            sibling,
            listing_id,
            sibling_id,
            ApplicationStatus::Rejected,
            reviewer,
            at,
        ));
        if !sibling.user_id.is_empty() {
            batch.push(WriteOp::InsertNotification(notify::rejected(
                listing, listing_id, sibling, at,
            )));
        }
    }
    batch
}

pub async fn approve(
    store: &dyn Store,
    founder: &Actor,
    listing_id: &ObjectId,
    application_id: &ObjectId,
) -> ServiceResult<ReviewOutcome> {
    let listing = owned_listing(store, founder, listing_id).await?;
    let target = load_application(store, listing_id, application_id).await?;
    ensure_pending(&target)?;
    ensure_active(&listing)?;

    // Siblings are read after the listing so the batch's applicant-count
    // check catches any submission that lands in between.
    let siblings: Vec<Application> = store
        .applications_for_listing(listing_id)
        .await?
        .into_iter()
        .filter(|a| a.id != Some(*application_id) && a.status == ApplicationStatus::Pending)
        .collect();

    let now = DateTime::now();
    let batch = approval_batch(
        &listing,
        *listing_id,
        &target,
        *application_id,
        &siblings,
        &founder.uid,
        now,
    );
    store.commit(batch).await?;

    info!(
        "Listing {} filled by {}; {} other applications closed",
        listing_id.to_hex(),
        target.user_id,
        siblings.len()
    );
    Ok(ReviewOutcome {
        application: reviewed(target, ApplicationStatus::Approved, &founder.uid, now),
        rejected_siblings: siblings.len(),
    })
}

pub async fn reject(
    store: &dyn Store,
    founder: &Actor,
    listing_id: &ObjectId,
    application_id: &ObjectId,
) -> ServiceResult<ReviewOutcome> {
    let listing = owned_listing(store, founder, listing_id).await?;
    let target = load_application(store, listing_id, application_id).await?;
    ensure_pending(&target)?;

    let now = DateTime::now();
    let mut batch = WriteBatch::new();
    batch.push(review_op(
        &target,
        *listing_id,
        *application_id,
        ApplicationStatus::Rejected,
        &founder.uid,
        now,
    ));
    if !target.user_id.is_empty() {
        batch.push(WriteOp::InsertNotification(notify::rejected(
            &listing,
            *listing_id,
            &target,
            now,
        )));
    }
    store.commit(batch).await?;

    info!(
        "Application {} on listing {} rejected",
        application_id.to_hex(),
        listing_id.to_hex()
    );
    Ok(ReviewOutcome {
        application: reviewed(target, ApplicationStatus::Rejected, &founder.uid, now),
        rejected_siblings: 0,
    })
}

/// A developer removes one of their own rejected applications.
pub async fn delete_application(
    store: &dyn Store,
    developer: &Actor,
    listing_id: &ObjectId,
    application_id: &ObjectId,
) -> ServiceResult<()> {
    require_role(developer, Role::Developer)?;
    let application = load_application(store, listing_id, application_id).await?;

    if application.user_id != developer.uid {
        return Err(ServiceError::Unauthorized(
            "You can only delete your own applications".to_string(),
        ));
    }
    if application.status != ApplicationStatus::Rejected {
        return Err(ServiceError::Conflict(
            "Only rejected applications can be deleted".to_string(),
        ));
    }

    if !store
        .delete_rejected_application(listing_id, application_id, &developer.uid)
        .await?
    {
        return Err(ServiceError::Conflict("Application changed; please refresh".to_string()));
    }
    Ok(())
}

/// Applications on a listing, for its owner.
pub async fn listing_applications(
    store: &dyn Store,
    founder: &Actor,
    listing_id: &ObjectId,
) -> ServiceResult<Vec<Application>> {
    owned_listing(store, founder, listing_id).await?;
    Ok(store.applications_for_listing(listing_id).await?)
}

/// The developer's applications with listing titles. Founder contact details
/// ride along only on the approved one.
pub async fn my_applications(
    store: &dyn Store,
    developer: &Actor,
) -> ServiceResult<Vec<MyApplicationResponse>> {
    require_role(developer, Role::Developer)?;
    let applications = store.applications_by_user(&developer.uid).await?;

    let mut ids: Vec<ObjectId> = applications.iter().map(|a| a.listing_id).collect();
    ids.sort();
    ids.dedup();
    let listings: HashMap<ObjectId, StartupListing> = store
        .find_listings(&ids)
        .await?
        .into_iter()
        .filter_map(|listing| listing.id.map(|id| (id, listing)))
        .collect();

    Ok(applications
        .into_iter()
        .map(|application| {
            let listing = listings.get(&application.listing_id);
            let contact = listing
                .filter(|_| application.status == ApplicationStatus::Approved)
                .map(contact_details);
            MyApplicationResponse {
                listing_title: listing
                    .map(|l| l.title.clone())
                    .unwrap_or_else(|| "Listing unavailable".to_string()),
                contact,
                application: ApplicationResponse::from(application),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::{ListingMarker, NotificationType};
    use crate::services::fixtures::{application_dto, developer, founder, other_founder, seed_listing};

    async fn listing_with_applicants(store: &MemoryStore, n: u32) -> (ObjectId, Vec<ObjectId>) {
        let listing_id = seed_listing(store, &founder()).await;
        let mut ids = Vec::new();
        for i in 1..=n {
            let application = submit_application(store, &developer(i), &listing_id, &application_dto())
                .await
                .unwrap();
            ids.push(application.id.unwrap());
        }
        (listing_id, ids)
    }

    fn notifications_of(store: &MemoryStore, kind: NotificationType) -> Vec<crate::models::Notification> {
        store
            .all_notifications()
            .into_iter()
            .filter(|n| n.kind == kind)
            .collect()
    }

    #[tokio::test]
    async fn submit_counts_applicant_and_notifies_founder() {
        let store = MemoryStore::new();
        let (listing_id, _) = listing_with_applicants(&store, 1).await;

        let listing = store.find_listing(&listing_id).await.unwrap().unwrap();
        assert_eq!(listing.applicants, 1);

        let sent = notifications_of(&store, NotificationType::NewApplication);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, founder().uid);
        assert_eq!(sent[0].message, "Dev 1 has applied as a technical co-founder for Climate Ledger");
        let preview = sent[0].preview.as_ref().unwrap();
        assert_eq!(preview.applicant_github, "octodev");
        assert_eq!(preview.equity, 20);
    }

    #[tokio::test]
    async fn submit_rejects_bad_input_without_writing() {
        let store = MemoryStore::new();
        let listing_id = seed_listing(&store, &founder()).await;
        let mut dto = application_dto();
        dto.phone = "12345".to_string();

        let result = submit_application(&store, &developer(1), &listing_id, &dto).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(store.all_applications().is_empty());
        assert!(store.all_notifications().is_empty());
    }

    #[tokio::test]
    async fn founders_cannot_apply() {
        let store = MemoryStore::new();
        let listing_id = seed_listing(&store, &other_founder()).await;
        let result = submit_application(&store, &founder(), &listing_id, &application_dto()).await;
        assert!(matches!(result, Err(ServiceError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn applying_twice_conflicts() {
        let store = MemoryStore::new();
        let (listing_id, _) = listing_with_applicants(&store, 1).await;

        let again = submit_application(&store, &developer(1), &listing_id, &application_dto()).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
        assert_eq!(store.find_listing(&listing_id).await.unwrap().unwrap().applicants, 1);
        assert_eq!(store.all_applications().len(), 1);
    }

    #[tokio::test]
    async fn approve_fills_listing_and_rejects_the_rest() {
        let store = MemoryStore::new();
        let (listing_id, ids) = listing_with_applicants(&store, 3).await;

        let outcome = approve(&store, &founder(), &listing_id, &ids[1]).await.unwrap();
        assert_eq!(outcome.application.status, ApplicationStatus::Approved);
        assert_eq!(outcome.rejected_siblings, 2);

        let listing = store.find_listing(&listing_id).await.unwrap().unwrap();
        assert_eq!(listing.status, ListingStatus::Filled);
        assert_eq!(listing.listing, ListingMarker::Success);
        assert_eq!(listing.filled_by.as_deref(), Some("github-dev-2"));
        assert_eq!(listing.filled_by_name.as_deref(), Some("Dev 2"));

        for application in store.all_applications() {
            let expected = if application.id == Some(ids[1]) {
                ApplicationStatus::Approved
            } else {
                ApplicationStatus::Rejected
            };
            assert_eq!(application.status, expected);
            assert_eq!(application.reviewed_by.as_deref(), Some("google-founder"));
        }

        let approved = notifications_of(&store, NotificationType::ApplicationApproved);
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].recipient_id, "github-dev-2");
        let contact = approved[0].contact.as_ref().unwrap();
        assert_eq!(contact.whatsapp_number, "9876543210");
        assert_eq!(contact.founder_name, "Grace Founder");

        let rejected = notifications_of(&store, NotificationType::ApplicationRejected);
        assert_eq!(rejected.len(), 2);
        assert!(rejected.iter().all(|n| n.contact.is_none()));
        assert!(rejected.iter().all(|n| n.recipient_id != "github-dev-2"));
    }

    #[tokio::test]
    async fn approving_twice_conflicts_without_new_notifications() {
        let store = MemoryStore::new();
        let (listing_id, ids) = listing_with_applicants(&store, 2).await;

        approve(&store, &founder(), &listing_id, &ids[0]).await.unwrap();
        let sent = store.all_notifications().len();

        let again = approve(&store, &founder(), &listing_id, &ids[0]).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
        let other = approve(&store, &founder(), &listing_id, &ids[1]).await;
        assert!(matches!(other, Err(ServiceError::Conflict(_))));
        assert_eq!(store.all_notifications().len(), sent);
    }

    #[tokio::test]
    async fn stale_concurrent_approval_is_refused_by_the_batch() {
        let store = MemoryStore::new();
        let (listing_id, ids) = listing_with_applicants(&store, 2).await;

        // Second founder request read the listing before the first committed.
        let listing = store.find_listing(&listing_id).await.unwrap().unwrap();
        let stale_target = store.find_application(&listing_id, &ids[1]).await.unwrap().unwrap();
        let stale_siblings = vec![store.find_application(&listing_id, &ids[0]).await.unwrap().unwrap()];

        approve(&store, &founder(), &listing_id, &ids[0]).await.unwrap();
        let sent = store.all_notifications().len();

        let batch = approval_batch(
            &listing,
            listing_id,
            &stale_target,
            ids[1],
            &stale_siblings,
            "google-founder",
            DateTime::now(),
        );
        let result: ServiceResult<()> = store.commit(batch).await.map_err(Into::into);
        assert!(matches!(result, Err(ServiceError::Conflict(_))));

        assert_eq!(store.all_notifications().len(), sent);
        let approved: Vec<_> = store
            .all_applications()
            .into_iter()
            .filter(|a| a.status == ApplicationStatus::Approved)
            .collect();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, Some(ids[0]));
    }

    #[tokio::test]
    async fn approval_racing_a_new_submission_is_refused() {
        let store = MemoryStore::new();
        let (listing_id, ids) = listing_with_applicants(&store, 1).await;

        // Approval reads its state, then another developer applies before it commits.
        let listing = store.find_listing(&listing_id).await.unwrap().unwrap();
        let target = store.find_application(&listing_id, &ids[0]).await.unwrap().unwrap();
        let late = submit_application(&store, &developer(2), &listing_id, &application_dto())
            .await
            .unwrap();
        let sent = store.all_notifications().len();

        let batch = approval_batch(
            &listing,
            listing_id,
            &target,
            ids[0],
            &[],
            "google-founder",
            DateTime::now(),
        );
        let result: ServiceResult<()> = store.commit(batch).await.map_err(Into::into);
        assert!(matches!(result, Err(ServiceError::Conflict(_))));

        let listing = store.find_listing(&listing_id).await.unwrap().unwrap();
        assert_eq!(listing.status, ListingStatus::Active);
        assert!(store
            .all_applications()
            .iter()
            .all(|a| a.status == ApplicationStatus::Pending));
        assert_eq!(store.all_notifications().len(), sent);

        // A fresh approval sees the late applicant and closes it.
        approve(&store, &founder(), &listing_id, &ids[0]).await.unwrap();
        let late = store
            .find_application(&listing_id, &late.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(late.status, ApplicationStatus::Rejected);
        let rejected = notifications_of(&store, NotificationType::ApplicationRejected);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].recipient_id, "github-dev-2");
    }

    #[tokio::test]
    async fn reject_leaves_other_applications_pending() {
        let store = MemoryStore::new();
        let (listing_id, ids) = listing_with_applicants(&store, 2).await;

        reject(&store, &founder(), &listing_id, &ids[0]).await.unwrap();

        let second = store.find_application(&listing_id, &ids[1]).await.unwrap().unwrap();
        assert_eq!(second.status, ApplicationStatus::Pending);
        let listing = store.find_listing(&listing_id).await.unwrap().unwrap();
        assert_eq!(listing.status, ListingStatus::Active);

        let rejected = notifications_of(&store, NotificationType::ApplicationRejected);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].recipient_id, "github-dev-1");
        assert_eq!(rejected[0].title, "Application Update");
    }

    #[tokio::test]
    async fn only_the_owner_reviews() {
        let store = MemoryStore::new();
        let (listing_id, ids) = listing_with_applicants(&store, 1).await;

        let approved = approve(&store, &other_founder(), &listing_id, &ids[0]).await;
        assert!(matches!(approved, Err(ServiceError::Unauthorized(_))));
        let rejected = reject(&store, &other_founder(), &listing_id, &ids[0]).await;
        assert!(matches!(rejected, Err(ServiceError::Unauthorized(_))));
        assert!(notifications_of(&store, NotificationType::ApplicationApproved).is_empty());
    }

    #[tokio::test]
    async fn cannot_apply_to_filled_listing() {
        let store = MemoryStore::new();
        let (listing_id, ids) = listing_with_applicants(&store, 1).await;
        approve(&store, &founder(), &listing_id, &ids[0]).await.unwrap();

        let late = submit_application(&store, &developer(9), &listing_id, &application_dto()).await;
        assert!(matches!(late, Err(ServiceError::Conflict(_))));
        assert_eq!(store.find_listing(&listing_id).await.unwrap().unwrap().applicants, 1);
    }

    #[tokio::test]
    async fn only_own_rejected_applications_can_be_deleted() {
        let store = MemoryStore::new();
        let (listing_id, ids) = listing_with_applicants(&store, 2).await;

        let pending = delete_application(&store, &developer(1), &listing_id, &ids[0]).await;
        assert!(matches!(pending, Err(ServiceError::Conflict(_))));

        reject(&store, &founder(), &listing_id, &ids[0]).await.unwrap();
        let not_mine = delete_application(&store, &developer(2), &listing_id, &ids[0]).await;
        assert!(matches!(not_mine, Err(ServiceError::Unauthorized(_))));

        delete_application(&store, &developer(1), &listing_id, &ids[0]).await.unwrap();
        assert!(store.find_application(&listing_id, &ids[0]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn my_applications_reveal_contact_only_when_approved() {
        let store = MemoryStore::new();
        let (listing_id, ids) = listing_with_applicants(&store, 2).await;
        approve(&store, &founder(), &listing_id, &ids[0]).await.unwrap();

        let winner = my_applications(&store, &developer(1)).await.unwrap();
        assert_eq!(winner.len(), 1);
        assert_eq!(winner[0].listing_title, "Climate Ledger");
        assert_eq!(winner[0].application.status, ApplicationStatus::Approved);
        assert!(winner[0].contact.is_some());

        let other = my_applications(&store, &developer(2)).await.unwrap();
        assert_eq!(other[0].application.status, ApplicationStatus::Rejected);
        assert!(other[0].contact.is_none());
    }

    #[tokio::test]
    async fn listing_applications_are_owner_only() {
        let store = MemoryStore::new();
        let (listing_id, _) = listing_with_applicants(&store, 2).await;

        assert_eq!(listing_applications(&store, &founder(), &listing_id).await.unwrap().len(), 2);
        let foreign = listing_applications(&store, &other_founder(), &listing_id).await;
        assert!(matches!(foreign, Err(ServiceError::Unauthorized(_))));
    }
}
