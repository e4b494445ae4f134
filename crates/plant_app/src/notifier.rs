use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use plant_core::{
    error::NotificationError,
    notifications::{NotificationPort, NotificationRequest},
    record::NotificationHandle,
};
use tracing::info;
use uuid::Uuid;

/// Desktop stand-in for the platform scheduler: hands out random handles
/// and logs what would be delivered.
#[derive(Default)]
pub struct LogNotificationPort {
    pending: Mutex<HashMap<NotificationHandle, NotificationRequest>>,
}

impl LogNotificationPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

#[async_trait]
impl NotificationPort for LogNotificationPort {
    async fn arm(
        &self,
        request: &NotificationRequest,
    ) -> Result<NotificationHandle, NotificationError> {
        let handle = NotificationHandle::new(Uuid::new_v4().to_string());
        info!(
            handle = %handle,
            plant_id = %request.plant_id,
            at = %request.scheduled_for,
            title = %request.title,
            body = %request.body,
            "notification scheduled"
        );
        self.pending.lock().insert(handle.clone(), request.clone());
        Ok(handle)
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotificationError> {
        if self.pending.lock().remove(handle).is_none() {
            tracing::debug!(handle = %handle, "cancel for unknown handle ignored");
        }
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), NotificationError> {
        let mut pending = self.pending.lock();
        info!(count = pending.len(), "cancelling all notifications");
        pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request() -> NotificationRequest {
        NotificationRequest {
            title: "Heeey, 🌱".into(),
            body: "It's time to take care of your Fern".into(),
            scheduled_for: Utc::now(),
            plant_id: "p1".into(),
        }
    }

    #[tokio::test]
    async fn handles_are_unique_and_cancel_tolerates_unknowns() {
        let port = LogNotificationPort::new();
        let first = port.arm(&request()).await.unwrap();
        let second = port.arm(&request()).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(port.pending(), 2);

        port.cancel(&first).await.unwrap();
        port.cancel(&first).await.unwrap();
        port.cancel(&NotificationHandle::new("never-armed")).await.unwrap();
        assert_eq!(port.pending(), 1);

        port.cancel_all().await.unwrap();
        assert_eq!(port.pending(), 0);
    }
}
