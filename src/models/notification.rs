use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::utils::format_datetime;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewApplication,
    ApplicationApproved,
    ApplicationRejected,
}

/// Attached to `new_application` so the founder can triage without opening the application.
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ApplicationPreview {
    pub applicant_name: String,
    pub applicant_github: String,
    pub experience: String,
    pub linkedin: String,
    pub tech_stack: Vec<String>,
    pub equity: i32,
}

/// Founder contact panel, handed only to the approved applicant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ContactDetails {
    pub founder_name: String,
    pub founder_email: Option<String>,
    pub whatsapp_number: String,
    pub equity: i32,
    pub tech_stack: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub recipient_id: String,
    pub founder_id: String,
    pub listing_id: ObjectId,
    pub application_id: Option<ObjectId>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub description: String,
    pub read: bool,
    pub timestamp: DateTime,
    pub preview: Option<ApplicationPreview>,
    pub contact: Option<ContactDetails>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct NotificationResponse {
    pub id: String,
    pub recipient_id: String,
    pub listing_id: String,
    pub application_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub description: String,
    pub read: bool,
    pub timestamp: String,
    pub preview: Option<ApplicationPreview>,
    pub contact: Option<ContactDetails>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        NotificationResponse {
            id: notification.id.map(|id| id.to_hex()).unwrap_or_default(),
            recipient_id: notification.recipient_id,
            listing_id: notification.listing_id.to_hex(),
            application_id: notification.application_id.map(|id| id.to_hex()),
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            description: notification.description,
            read: notification.read,
            timestamp: format_datetime(notification.timestamp),
            preview: notification.preview,
            contact: notification.contact,
        }
    }
}
