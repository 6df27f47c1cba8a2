use mongodb::bson::oid::ObjectId;
use tokio::sync::broadcast;

const FEED_CAPACITY: usize = 256;

/// A committed change, fanned out to live views.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Listing { listing_id: ObjectId, founder_id: String },
    Application { listing_id: ObjectId, user_id: String },
    Notification { recipient_id: String, founder_id: String },
}

impl ChangeEvent {
    pub fn touches_listings_of(&self, founder_id: &str) -> bool {
        matches!(self, ChangeEvent::Listing { founder_id: f, .. } if f == founder_id)
    }

    pub fn touches_notifications_of(&self, uid: &str, by_founder: bool) -> bool {
        match self {
            ChangeEvent::Notification { recipient_id, founder_id } => {
                if by_founder {
                    founder_id == uid
                } else {
                    recipient_id == uid
                }
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        ChangeFeed { tx }
    }
}

impl ChangeFeed {
    pub fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.tx.send(event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}
