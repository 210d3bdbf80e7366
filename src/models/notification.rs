//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Outcome of a resolved booking request, addressed to its requester
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    #[serde(rename = "user")]
    pub user_id: i32,
    /// Title of the book at resolution time
    pub book: String,
    pub approved: bool,
    /// Empty unless approved
    pub retrieval_location: String,
    pub created_at: DateTime<Utc>,
}

/// Notification to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i32,
    pub book: String,
    pub approved: bool,
    pub retrieval_location: String,
}
