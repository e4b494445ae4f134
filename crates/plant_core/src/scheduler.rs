use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{PlantCareError, SchedulingError};
use crate::notifications::{NotificationPort, NotificationRequest};
use crate::record::PlantCareRecord;

pub const REMINDER_TITLE: &str = "Heeey, 🌱";

/// Result of [`ReminderScheduler::cancel`]. The record is always cleared
/// locally; `error` carries a port failure the caller may surface.
#[derive(Debug)]
pub struct Cancellation {
    pub record: PlantCareRecord,
    pub error: Option<SchedulingError>,
}

/// Owns the decision of when a record's single reminder is armed. Talks to
/// the notification port only; persisting the returned record is up to the
/// caller.
pub struct ReminderScheduler {
    clock: Arc<dyn Clock>,
    port: Arc<dyn NotificationPort>,
}

impl ReminderScheduler {
    pub fn new(clock: Arc<dyn Clock>, port: Arc<dyn NotificationPort>) -> Self {
        Self { clock, port }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn schedule(
        &self,
        mut record: PlantCareRecord,
        requested: DateTime<Utc>,
    ) -> Result<PlantCareRecord, PlantCareError> {
        let now = self.clock.now();
        if requested <= now {
            return Err(PlantCareError::InvalidScheduleTime { requested, now });
        }

        if let Some(previous) = record.notification_handle().cloned() {
            self.port
                .cancel(&previous)
                .await
                .map_err(|source| SchedulingError::Cancel {
                    plant_id: record.id().to_string(),
                    handle: previous.clone(),
                    source,
                })?;
            info!(plant_id = record.id(), handle = %previous, "previous reminder cancelled");
        }

        let request = reminder_request(&record, requested);
        let handle = self
            .port
            .arm(&request)
            .await
            .map_err(|source| SchedulingError::Arm {
                plant_id: record.id().to_string(),
                source,
            })?;
        info!(plant_id = record.id(), handle = %handle, at = %requested, "reminder armed");
        record.set_reminder(requested, handle);
        Ok(record)
    }

    pub async fn cancel(&self, mut record: PlantCareRecord) -> Cancellation {
        let Some(handle) = record.clear_reminder() else {
            return Cancellation {
                record,
                error: None,
            };
        };
        let error = match self.port.cancel(&handle).await {
            Ok(()) => {
                info!(plant_id = record.id(), handle = %handle, "reminder cancelled");
                None
            }
            Err(source) => {
                warn!(plant_id = record.id(), handle = %handle, %source, "reminder cancellation failed");
                Some(SchedulingError::Cancel {
                    plant_id: record.id().to_string(),
                    handle,
                    source,
                })
            }
        };
        Cancellation { record, error }
    }

    /// Re-arms a record whose handle was cancelled by a `schedule` call
    /// that then failed to arm. The previous instant is reused while it is
    /// still ahead of the clock; otherwise, or if the port refuses again, the
    /// record comes back unscheduled.
    pub async fn restore(&self, mut record: PlantCareRecord) -> PlantCareRecord {
        let previous = record.next_notification_at();
        if record.clear_reminder().is_none() {
            return record;
        }
        let Some(at) = previous.filter(|at| *at > self.clock.now()) else {
            return record;
        };
        match self.port.arm(&reminder_request(&record, at)).await {
            Ok(handle) => {
                info!(plant_id = record.id(), handle = %handle, at = %at, "previous reminder re-armed");
                record.set_reminder(at, handle);
            }
            Err(source) => {
                warn!(plant_id = record.id(), %source, "previous reminder could not be re-armed");
            }
        }
        record
    }

    pub async fn cancel_all(&self) -> Result<(), SchedulingError> {
        self.port
            .cancel_all()
            .await
            .map_err(SchedulingError::CancelAll)?;
        info!("all reminders cancelled");
        Ok(())
    }
}

fn reminder_request(record: &PlantCareRecord, at: DateTime<Utc>) -> NotificationRequest {
    NotificationRequest {
        title: REMINDER_TITLE.to_string(),
        body: format!("It's time to take care of your {}", record.name()),
        scheduled_for: at,
        plant_id: record.id().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notifications::testing::{PortCall, RecordingPort};
    use crate::record::{NotificationHandle, Plant};
    use chrono::{Duration, TimeZone};

    fn setup() -> (Arc<ManualClock>, Arc<RecordingPort>, ReminderScheduler) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
        ));
        let port = Arc::new(RecordingPort::default());
        let scheduler = ReminderScheduler::new(clock.clone(), port.clone());
        (clock, port, scheduler)
    }

    #[tokio::test]
    async fn rejects_instants_that_are_not_in_the_future() {
        let (clock, port, scheduler) = setup();
        let record = PlantCareRecord::new(Plant::new("p1", "Fern"));

        for requested in [clock.now(), clock.now() - Duration::minutes(5)] {
            let err = scheduler.schedule(record.clone(), requested).await.unwrap_err();
            assert!(matches!(err, PlantCareError::InvalidScheduleTime { .. }));
        }
        assert!(port.calls().is_empty());
    }

    #[tokio::test]
    async fn arms_with_plant_content() {
        let (clock, port, scheduler) = setup();
        let due = clock.now() + Duration::hours(1);
        let record = scheduler
            .schedule(PlantCareRecord::new(Plant::new("p1", "Fern")), due)
            .await
            .unwrap();

        assert_eq!(record.next_notification_at(), Some(due));
        let armed = port.armed();
        assert_eq!(armed.len(), 1);
        assert_eq!(Some(&armed[0].0), record.notification_handle());
        assert_eq!(armed[0].1.title, REMINDER_TITLE);
        assert!(armed[0].1.body.ends_with("your Fern"));
        assert_eq!(armed[0].1.plant_id, "p1");
    }

    #[tokio::test]
    async fn rescheduling_cancels_before_arming() {
        let (clock, port, scheduler) = setup();
        let first = clock.now() + Duration::hours(1);
        let second = clock.now() + Duration::hours(2);
        let record = scheduler
            .schedule(PlantCareRecord::new(Plant::new("p1", "Fern")), first)
            .await
            .unwrap();
        let old_handle = record.notification_handle().cloned().unwrap();
        port.clear_calls();

        let record = scheduler.schedule(record, second).await.unwrap();
        assert_eq!(
            port.calls(),
            vec![PortCall::Cancel(old_handle), PortCall::Arm(second)]
        );
        assert_eq!(port.armed().len(), 1);
        assert_eq!(record.next_notification_at(), Some(second));
    }

    #[tokio::test]
    async fn failed_arm_leaves_record_untouched() {
        let (clock, port, scheduler) = setup();
        port.fail_arm(true);
        let err = scheduler
            .schedule(
                PlantCareRecord::new(Plant::new("p1", "Fern")),
                clock.now() + Duration::hours(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlantCareError::Scheduling(SchedulingError::Arm { .. })
        ));
    }

    #[tokio::test]
    async fn restore_rearms_the_previous_instant() {
        let (clock, port, scheduler) = setup();
        let due = clock.now() + Duration::hours(1);
        let mut record = PlantCareRecord::new(Plant::new("p1", "Fern"));
        record.set_reminder(due, NotificationHandle::new("cancelled"));

        let restored = scheduler.restore(record).await;
        assert_eq!(restored.next_notification_at(), Some(due));
        let armed = port.armed();
        assert_eq!(armed.len(), 1);
        assert_eq!(Some(&armed[0].0), restored.notification_handle());
    }

    #[tokio::test]
    async fn restore_leaves_elapsed_or_refused_reminders_unscheduled() {
        let (clock, port, scheduler) = setup();
        let mut elapsed = PlantCareRecord::new(Plant::new("p1", "Fern"));
        elapsed.set_reminder(clock.now() - Duration::minutes(1), NotificationHandle::new("old"));
        let restored = scheduler.restore(elapsed).await;
        assert!(restored.notification_handle().is_none());
        assert!(port.calls().is_empty());

        port.fail_arm(true);
        let mut refused = PlantCareRecord::new(Plant::new("p2", "Aloe"));
        refused.set_reminder(clock.now() + Duration::hours(1), NotificationHandle::new("old"));
        let restored = scheduler.restore(refused).await;
        assert!(restored.notification_handle().is_none());
        assert!(restored.next_notification_at().is_none());
        assert!(port.armed().is_empty());
    }

    #[tokio::test]
    async fn cancel_without_handle_is_a_no_op() {
        let (_, port, scheduler) = setup();
        let outcome = scheduler
            .cancel(PlantCareRecord::new(Plant::new("p1", "Fern")))
            .await;
        assert!(outcome.error.is_none());
        assert!(port.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_cancel_still_clears_local_state() {
        let (clock, port, scheduler) = setup();
        let mut record = PlantCareRecord::new(Plant::new("p1", "Fern"));
        record.set_reminder(clock.now() + Duration::hours(1), NotificationHandle::new("stale"));
        port.fail_cancel(true);

        let outcome = scheduler.cancel(record).await;
        assert!(matches!(outcome.error, Some(SchedulingError::Cancel { .. })));
        assert!(outcome.record.notification_handle().is_none());
        assert!(outcome.record.next_notification_at().is_none());
    }
}
