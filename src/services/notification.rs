use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::{NotificationFilter, Store};
use crate::models::{
    Actor, Application, ApplicationPreview, ContactDetails, Notification, NotificationType, Role,
    StartupListing,
};
use crate::services::{ServiceError, ServiceResult};

const PREVIEW_CHARS: usize = 150;

/// First `PREVIEW_CHARS` characters, with an ellipsis when cut.
pub fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub fn contact_details(listing: &StartupListing) -> ContactDetails {
    ContactDetails {
        founder_name: listing.founder_name.clone(),
        founder_email: listing.founder_email.clone(),
        whatsapp_number: listing.whatsapp_number.clone(),
        equity: listing.equity,
        tech_stack: listing.tech_stack.clone(),
    }
}

fn base(
    recipient_id: &str,
    listing: &StartupListing,
    listing_id: ObjectId,
    application: &Application,
    kind: NotificationType,
    timestamp: DateTime,
) -> Notification {
    Notification {
        id: Some(ObjectId::new()),
        recipient_id: recipient_id.to_string(),
        founder_id: listing.founder_id.clone(),
        listing_id,
        application_id: application.id,
        kind,
        title: String::new(),
        message: String::new(),
        description: String::new(),
        read: false,
        timestamp,
        preview: None,
        contact: None,
    }
}

/// Tells the founder someone applied.
pub fn new_application(
    listing: &StartupListing,
    listing_id: ObjectId,
    application: &Application,
) -> Notification {
    let mut notification = base(
        &listing.founder_id,
        listing,
        listing_id,
        application,
        NotificationType::NewApplication,
        application.submitted_at,
    );
    notification.title = "New Application".to_string();
    notification.message = format!(
        "{} has applied as a technical co-founder for {}",
        application.applicant_name, listing.title
    );
    notification.description = excerpt(&application.motivation);
    notification.preview = Some(ApplicationPreview {
        applicant_name: application.applicant_name.clone(),
        applicant_github: application.github_profile.clone(),
        experience: excerpt(&application.experience),
        linkedin: application.linkedin.clone(),
        tech_stack: listing.tech_stack.clone(),
        equity: listing.equity,
    });
    notification
}

/// Tells the chosen applicant they got the role, with the founder's contact details.
pub fn approved(
    listing: &StartupListing,
    listing_id: ObjectId,
    application: &Application,
    at: DateTime,
) -> Notification {
    let mut notification = base(
        &application.user_id,
        listing,
        listing_id,
        application,
        NotificationType::ApplicationApproved,
        at,
    );
    notification.title = "Application Approved".to_string();
    notification.message = format!(
        "Congratulations! Your application for {} has been approved.",
        listing.title
    );
    notification.description = format!(
        "Reach out to {} to discuss next steps.",
        listing.founder_name
    );
    notification.contact = Some(contact_details(listing));
    notification
}

pub fn rejected(
    listing: &StartupListing,
    listing_id: ObjectId,
    application: &Application,
    at: DateTime,
) -> Notification {
    let mut notification = base(
        &application.user_id,
        listing,
        listing_id,
        application,
        NotificationType::ApplicationRejected,
        at,
    );
    notification.title = "Application Update".to_string();
    notification.message = format!(
        "Your application for {} was not selected this time.",
        listing.title
    );
    notification.description = "Keep exploring other startups looking for a co-founder.".to_string();
    notification
}

/// Developers see what was sent to them; founders see everything about their listings.
/// That includes the approved/rejected notices addressed to applicants, which
/// only the applicant can mark read: a founder's feed entry is read-only
/// unless `recipient_id` is the founder.
pub fn feed_filter(actor: &Actor) -> NotificationFilter {
    match actor.role {
        Role::Developer => NotificationFilter::Recipient(actor.uid.clone()),
        Role::Founder => NotificationFilter::Founder(actor.uid.clone()),
    }
}

pub async fn my_notifications(store: &dyn Store, actor: &Actor) -> ServiceResult<Vec<Notification>> {
    Ok(store.notifications(&feed_filter(actor)).await?)
}

pub async fn unread_count(store: &dyn Store, actor: &Actor) -> ServiceResult<u64> {
    Ok(store.unread_count(&actor.uid).await?)
}

pub async fn mark_read(store: &dyn Store, actor: &Actor, notification_id: &ObjectId) -> ServiceResult<()> {
    if !store.mark_notification_read(notification_id, &actor.uid).await? {
        return Err(ServiceError::NotFound("Notification not found".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::services::fixtures::{application_dto, developer, founder, seed_listing};
    use crate::services::workflow::{approve, submit_application};

    #[test]
    fn short_text_is_not_cut() {
        assert_eq!(excerpt("Built three compilers"), "Built three compilers");
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let text = "é".repeat(200);
        let cut = excerpt(&text);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 3);
    }

    #[tokio::test]
    async fn feeds_split_by_role_and_only_recipient_marks_read() {
        let store = MemoryStore::new();
        let listing_id = seed_listing(&store, &founder()).await;
        let application = submit_application(&store, &developer(1), &listing_id, &application_dto())
            .await
            .unwrap();
        approve(&store, &founder(), &listing_id, &application.id.unwrap()).await.unwrap();

        let mine = my_notifications(&store, &developer(1)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].kind, NotificationType::ApplicationApproved);

        let founders = my_notifications(&store, &founder()).await.unwrap();
        assert_eq!(founders.len(), 2);
        assert!(founders[0].timestamp >= founders[1].timestamp);
        assert!(founders.iter().any(|n| n.id == mine[0].id && n.recipient_id != "google-founder"));

        let id = mine[0].id.unwrap();
        assert!(matches!(
            mark_read(&store, &founder(), &id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(unread_count(&store, &developer(1)).await.unwrap(), 1);

        mark_read(&store, &developer(1), &id).await.unwrap();
        assert_eq!(unread_count(&store, &developer(1)).await.unwrap(), 0);
    }
}
