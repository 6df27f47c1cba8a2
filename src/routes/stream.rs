//! Live views over server-sent events. Each relevant commit pushes a fresh
//! snapshot; the last one received is the current state.

use log::warn;
use rocket::response::stream::{Event, EventStream};
use rocket::tokio::select;
use rocket::tokio::sync::broadcast::error::RecvError;
use rocket::{Shutdown, State};

use crate::db::{ChangeEvent, DbConn};
use crate::guards::{AuthGuard, FounderGuard};
use crate::models::{ListingResponse, NotificationResponse, Role};
use crate::services::{listing, notification};

/// Waits for the next feed event, `None` once the stream should end.
async fn next_event(
    rx: &mut rocket::tokio::sync::broadcast::Receiver<ChangeEvent>,
    shutdown: &mut Shutdown,
) -> Option<Option<ChangeEvent>> {
    select! {
        event = rx.recv() => match event {
            Ok(event) => Some(Some(event)),
            // Missed events; a fresh snapshot covers them.
            Err(RecvError::Lagged(_)) => Some(None),
            Err(RecvError::Closed) => None,
        },
        _ = shutdown => None,
    }
}

#[get("/stream/notifications")]
pub fn notification_stream(
    db: &State<DbConn>,
    auth: AuthGuard,
    mut shutdown: Shutdown,
) -> EventStream![] {
    let store = db.inner().clone();
    let mut rx = store.subscribe();
    let actor = auth.actor;
    let by_founder = actor.role == Role::Founder;

    EventStream! {
        let mut refresh = true;
        loop {
            if refresh {
                match notification::my_notifications(store.as_ref(), &actor).await {
                    Ok(list) => {
                        let list: Vec<NotificationResponse> =
                            list.into_iter().map(NotificationResponse::from).collect();
                        yield Event::json(&list).event("notifications");
                    }
                    Err(e) => warn!("Notification snapshot for {} failed: {}", actor.uid, e),
                }
            }

            refresh = match next_event(&mut rx, &mut shutdown).await {
                Some(Some(event)) => event.touches_notifications_of(&actor.uid, by_founder),
                Some(None) => true,
                None => break,
            };
        }
    }
}

#[get("/stream/listings")]
pub fn listing_stream(
    db: &State<DbConn>,
    founder: FounderGuard,
    mut shutdown: Shutdown,
) -> EventStream![] {
    let store = db.inner().clone();
    let mut rx = store.subscribe();
    let actor = founder.auth.actor;

    EventStream! {
        let mut refresh = true;
        loop {
            if refresh {
                match listing::founder_listings(store.as_ref(), &actor).await {
                    Ok(list) => {
                        let list: Vec<ListingResponse> =
                            list.into_iter().map(ListingResponse::from).collect();
                        yield Event::json(&list).event("listings");
                    }
                    Err(e) => warn!("Listing snapshot for {} failed: {}", actor.uid, e),
                }
            }

            refresh = match next_event(&mut rx, &mut shutdown).await {
                Some(Some(event)) => event.touches_listings_of(&actor.uid),
                Some(None) => true,
                None => break,
            };
        }
    }
}
