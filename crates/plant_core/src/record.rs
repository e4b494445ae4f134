use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog plant as handed over by the caller. Everything here is display
/// data; the core only looks at `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub water_tips: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub environments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<WateringFrequency>,
}

impl Plant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepeatEvery {
    Day,
    Week,
    Month,
}

/// How often the catalog recommends watering, e.g. 2 times per week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WateringFrequency {
    pub times: u32,
    pub repeat_every: RepeatEvery,
}

/// Identifier of one armed trigger, as returned by the notification port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NotificationHandle(String);

impl NotificationHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Unscheduled,
    Armed,
    Expired,
}

/// A plant the user is tracking, together with its reminder bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlantCareRecord {
    #[serde(flatten)]
    plant: Plant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_notification_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notification_handle: Option<NotificationHandle>,
}

impl PlantCareRecord {
    pub fn new(plant: Plant) -> Self {
        Self {
            plant,
            next_notification_at: None,
            notification_handle: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.plant.id
    }

    pub fn name(&self) -> &str {
        &self.plant.name
    }

    pub fn plant(&self) -> &Plant {
        &self.plant
    }

    pub fn next_notification_at(&self) -> Option<DateTime<Utc>> {
        self.next_notification_at
    }

    pub fn notification_handle(&self) -> Option<&NotificationHandle> {
        self.notification_handle.as_ref()
    }

    /// Instant used for urgency ordering. Only a record with an armed
    /// handle has one.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.notification_handle
            .as_ref()
            .and(self.next_notification_at)
    }

    pub fn reminder_state(&self, now: DateTime<Utc>) -> ReminderState {
        match self.due_at() {
            None => ReminderState::Unscheduled,
            Some(due) if due > now => ReminderState::Armed,
            Some(_) => ReminderState::Expired,
        }
    }

    pub fn has_environment(&self, tag: &str) -> bool {
        self.plant
            .environments
            .iter()
            .any(|env| env.eq_ignore_ascii_case(tag))
    }

    /// Replaces the display fields, keeping identity and reminder state.
    pub(crate) fn merge_plant(&mut self, plant: Plant) {
        debug_assert_eq!(self.plant.id, plant.id);
        self.plant = plant;
    }

    pub(crate) fn set_reminder(&mut self, at: DateTime<Utc>, handle: NotificationHandle) {
        self.next_notification_at = Some(at);
        self.notification_handle = Some(handle);
    }

    pub(crate) fn clear_reminder(&mut self) -> Option<NotificationHandle> {
        self.next_notification_at = None;
        self.notification_handle.take()
    }
}
