use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::{
    clock::{Clock, SystemClock},
    error::{BuildError, PersistenceError, PlantCareError, Result, SchedulingError},
    notifications::NotificationPort,
    record::{Plant, PlantCareRecord},
    scheduler::ReminderScheduler,
    storage::BlobStore,
    store::{RecordStore, DEFAULT_STORAGE_KEY},
    urgency::{self, UrgencyReport},
};

/// Outcome of [`PlantCareService::remove`]. A failed cancellation does not
/// stop the removal; it comes back as `warning`.
#[derive(Debug, Default)]
pub struct Removal {
    pub removed: bool,
    pub warning: Option<SchedulingError>,
}

/// Entry point for callers: keeps each stored record and its armed
/// notification in step.
pub struct PlantCareService {
    store: RecordStore,
    scheduler: ReminderScheduler,
    op_lock: Mutex<()>,
}

pub struct PlantCareServiceBuilder {
    clock: Arc<dyn Clock>,
    port: Option<Arc<dyn NotificationPort>>,
    blobs: Option<Arc<dyn BlobStore>>,
    storage_key: String,
}

impl PlantCareServiceBuilder {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            port: None,
            blobs: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_notification_port(mut self, port: Arc<dyn NotificationPort>) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn build(self) -> Result<PlantCareService, BuildError> {
        let port = self.port.ok_or(BuildError::MissingNotificationPort)?;
        let blobs = self.blobs.ok_or(BuildError::MissingBlobStore)?;
        Ok(PlantCareService {
            store: RecordStore::with_key(blobs, self.storage_key),
            scheduler: ReminderScheduler::new(self.clock, port),
            op_lock: Mutex::new(()),
        })
    }
}

impl Default for PlantCareServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlantCareService {
    pub fn builder() -> PlantCareServiceBuilder {
        PlantCareServiceBuilder::new()
    }

    /// Creates or updates the record for `plant` and arms its reminder at
    /// `remind_at`. The new schedule is persisted only if arming succeeded;
    /// when arming fails after the old reminder was cancelled, the stored
    /// record is re-armed at its old instant or marked unscheduled.
    #[instrument(skip(self, plant), fields(plant_id = %plant.id))]
    pub async fn save_or_update(
        &self,
        plant: Plant,
        remind_at: DateTime<Utc>,
    ) -> Result<PlantCareRecord> {
        if plant.id.trim().is_empty() {
            return Err(PersistenceError::MissingId.into());
        }
        let _guard = self.op_lock.lock().await;

        let stored = self.store.get(&plant.id).await?;
        let record = match stored.clone() {
            Some(mut existing) => {
                existing.merge_plant(plant);
                existing
            }
            None => PlantCareRecord::new(plant),
        };
        let scheduled = match self.scheduler.schedule(record, remind_at).await {
            Ok(scheduled) => scheduled,
            Err(err @ PlantCareError::Scheduling(SchedulingError::Arm { .. })) => {
                // the old handle is already cancelled; keep storage honest
                if let Some(previous) = stored.filter(|r| r.notification_handle().is_some()) {
                    self.restore_after_failed_arm(previous).await;
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        if let Err(err) = self.store.put(scheduled.clone()).await {
            let rollback = self.scheduler.cancel(scheduled).await;
            if let Some(cancel_err) = rollback.error {
                warn!(%cancel_err, "could not disarm reminder after failed save");
            }
            return Err(err.into());
        }
        info!(at = %remind_at, "plant saved");
        Ok(scheduled)
    }

    async fn restore_after_failed_arm(&self, previous: PlantCareRecord) {
        let restored = self.scheduler.restore(previous).await;
        let rearmed = restored.notification_handle().is_some();
        if let Err(err) = self.store.put(restored).await {
            warn!(%err, "could not record reminder state after failed arm");
        } else {
            info!(rearmed, "reminder state restored after failed arm");
        }
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<Removal> {
        let _guard = self.op_lock.lock().await;
        let Some(record) = self.store.get(id).await? else {
            return Ok(Removal::default());
        };

        let cancellation = self.scheduler.cancel(record).await;
        let removed = self.store.remove(id).await?;
        if let Some(warning) = &cancellation.error {
            warn!(%warning, "plant removed but its reminder may still fire");
        } else {
            info!("plant removed");
        }
        Ok(Removal {
            removed,
            warning: cancellation.error,
        })
    }

    pub async fn list_by_urgency(&self) -> Result<UrgencyReport> {
        let records = self.store.get_all().await?;
        Ok(urgency::build_report(records, self.scheduler.now()))
    }

    /// Urgency-ordered records tagged with `environment`.
    pub async fn list_by_environment(&self, environment: &str) -> Result<Vec<PlantCareRecord>> {
        let mut records: Vec<PlantCareRecord> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|record| record.has_environment(environment))
            .collect();
        urgency::sort_by_urgency(&mut records);
        Ok(records)
    }

    pub async fn is_tracked(&self, id: &str) -> Result<bool> {
        Ok(self.store.get(id).await?.is_some())
    }

    pub async fn get(&self, id: &str) -> Result<Option<PlantCareRecord>> {
        Ok(self.store.get(id).await?)
    }

    /// Disarms every reminder and forgets all plants. Records are kept if
    /// the port refuses to cancel.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        self.scheduler.cancel_all().await?;
        self.store.clear().await?;
        info!("all plants cleared");
        Ok(())
    }
}
