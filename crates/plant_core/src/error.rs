use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::record::NotificationHandle;

pub type Result<T, E = PlantCareError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PlantCareError {
    #[error("reminder time {requested} is not in the future (now is {now})")]
    InvalidScheduleTime {
        requested: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Failure reported by a [`crate::notifications::NotificationPort`] adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct NotificationError(pub String);

impl NotificationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("unable to arm reminder for plant `{plant_id}`: {source}")]
    Arm {
        plant_id: String,
        #[source]
        source: NotificationError,
    },
    #[error("unable to cancel reminder {handle} for plant `{plant_id}`: {source}")]
    Cancel {
        plant_id: String,
        handle: NotificationHandle,
        #[source]
        source: NotificationError,
    },
    #[error("unable to cancel pending reminders: {0}")]
    CancelAll(#[source] NotificationError),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed for key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to encode plant collection: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("stored plant collection under `{key}` is unreadable: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored plant collection has unsupported version {0}")]
    UnsupportedVersion(u32),
    #[error("plant record has an empty id")]
    MissingId,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("plant-care service needs a notification port")]
    MissingNotificationPort,
    #[error("plant-care service needs a blob store")]
    MissingBlobStore,
}
