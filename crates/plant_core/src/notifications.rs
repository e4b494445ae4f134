use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::NotificationError, record::NotificationHandle};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
    /// Plant the reminder belongs to, handed back by the platform when the
    /// user taps the notification.
    pub plant_id: String,
}

/// Platform-specific notification adapters will implement this trait.
///
/// `cancel` must succeed for handles the platform no longer knows about
/// (already fired or already cancelled).
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn arm(
        &self,
        request: &NotificationRequest,
    ) -> Result<NotificationHandle, NotificationError>;
    async fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotificationError>;
    async fn cancel_all(&self) -> Result<(), NotificationError>;
}
