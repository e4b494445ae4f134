use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Utc};
use plant_core::{
    clock::{Clock, SystemClock},
    record::{RepeatEvery, WateringFrequency},
    storage::FileBlobStore,
    store::DEFAULT_STORAGE_KEY,
    Plant, PlantCareRecord, PlantCareService,
};
use tracing::{debug, info};

use crate::cli::{Command, PlantArgs, When};
use crate::notifier::LogNotificationPort;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) storage_key: String,
    pub(crate) log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("PLANT_CARE_DATA_DIR") {
            let dir = dir.trim();
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(key) = std::env::var("PLANT_CARE_STORAGE_KEY") {
            let key = key.trim();
            if !key.is_empty() {
                config.storage_key = key.to_string();
            }
        }
        if let Ok(filter) = std::env::var("PLANT_CARE_LOG") {
            if !filter.trim().is_empty() {
                config.log_filter = filter;
            }
        }
        Ok(config)
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".plant-care"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

pub fn build_service(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<PlantCareService> {
    info!(data_dir = %config.data_dir.display(), key = %config.storage_key, "opening plant store");
    PlantCareService::builder()
        .with_clock(clock)
        .with_notification_port(Arc::new(LogNotificationPort::new()))
        .with_blob_store(Arc::new(FileBlobStore::new(&config.data_dir)))
        .storage_key(config.storage_key.clone())
        .build()
        .context("failed to initialize plant-care service")
}

pub async fn run(config: AppConfig, command: Command) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = build_service(&config, clock.clone())?;
    for line in execute(&service, clock.as_ref(), command).await? {
        println!("{line}");
    }
    Ok(())
}

/// Runs one command against the service and returns the lines to print.
pub async fn execute(
    service: &PlantCareService,
    clock: &dyn Clock,
    command: Command,
) -> Result<Vec<String>> {
    match command {
        Command::Save { plant, when } => {
            let remind_at = resolve_instant(&when, clock.now())?;
            let tracked = service.is_tracked(&plant.id).await?;
            let record = service
                .save_or_update(plant_from_args(plant), remind_at)
                .await
                .context("could not save plant")?;
            let verb = if tracked { "Updated" } else { "Saved" };
            Ok(vec![format!(
                "{verb} {} ({}), next reminder at {}",
                record.name(),
                record.id(),
                format_local(remind_at)
            )])
        }
        Command::Remove { id } => {
            let removal = service.remove(&id).await.context("could not remove plant")?;
            let mut lines = Vec::new();
            if removal.removed {
                lines.push(format!("Removed {id}"));
            } else {
                lines.push(format!("{id} was not being tracked"));
            }
            if let Some(warning) = removal.warning {
                lines.push(format!("warning: {warning}"));
            }
            Ok(lines)
        }
        Command::List { environment } => {
            let now = clock.now();
            match environment {
                Some(tag) => {
                    let records = service.list_by_environment(&tag).await?;
                    Ok(records.iter().map(|record| describe(record, now)).collect())
                }
                None => {
                    let report = service.list_by_urgency().await?;
                    let mut lines = vec![report.summary.clone()];
                    lines.extend(report.records.iter().map(|record| describe(record, now)));
                    Ok(lines)
                }
            }
        }
        Command::Tracked { id } => {
            let tracked = service.is_tracked(&id).await?;
            Ok(vec![if tracked {
                format!("{id} is tracked")
            } else {
                format!("{id} is not tracked")
            }])
        }
        Command::Show { id } => {
            let record = service
                .get(&id)
                .await?
                .ok_or_else(|| anyhow!("{id} is not tracked"))?;
            debug!(?record, "showing plant");
            let plant = record.plant();
            let mut lines = vec![describe(&record, clock.now())];
            if !plant.about.is_empty() {
                lines.push(format!("  about: {}", plant.about));
            }
            if !plant.water_tips.is_empty() {
                lines.push(format!("  water tips: {}", plant.water_tips));
            }
            if !plant.environments.is_empty() {
                lines.push(format!("  environments: {}", plant.environments.join(", ")));
            }
            if let Some(freq) = plant.frequency {
                lines.push(format!(
                    "  frequency: {} time(s) per {}",
                    freq.times,
                    repeat_label(freq.repeat_every)
                ));
            }
            Ok(lines)
        }
        Command::Clear => {
            service.clear_all().await.context("could not clear plants")?;
            Ok(vec!["All plants cleared".to_string()])
        }
    }
}

pub(crate) fn resolve_instant(when: &When, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if let Some(at) = when.at {
        return Ok(at);
    }
    if let Some(minutes) = when.in_minutes {
        return Duration::try_minutes(minutes)
            .and_then(|span| now.checked_add_signed(span))
            .ok_or_else(|| anyhow!("--in {minutes} is out of range"));
    }
    if let Some(time) = &when.time {
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .with_context(|| format!("`{time}` is not a HH:MM time"))?;
        let today = now.with_timezone(&Local).date_naive();
        let local = Local
            .from_local_datetime(&today.and_time(time))
            .earliest()
            .ok_or_else(|| anyhow!("{time} does not exist today in the local time zone"))?;
        return Ok(local.with_timezone(&Utc));
    }
    Err(anyhow!("a reminder time is required (--at, --in or --time)"))
}

fn plant_from_args(args: PlantArgs) -> Plant {
    let frequency = match (args.times, args.repeat_every) {
        (Some(times), Some(repeat_every)) => Some(WateringFrequency {
            times,
            repeat_every,
        }),
        _ => None,
    };
    Plant {
        id: args.id,
        name: args.name,
        about: args.about.unwrap_or_default(),
        water_tips: args.water_tips.unwrap_or_default(),
        photo: args.photo.unwrap_or_default(),
        environments: args.environment,
        frequency,
    }
}

fn describe(record: &PlantCareRecord, now: DateTime<Utc>) -> String {
    match record.due_at() {
        Some(due) if due > now => format!(
            "{:<12} {:<20} water at {}",
            record.id(),
            record.name(),
            format_local(due)
        ),
        Some(due) => format!(
            "{:<12} {:<20} overdue since {}",
            record.id(),
            record.name(),
            format_local(due)
        ),
        None => format!("{:<12} {:<20} no reminder", record.id(), record.name()),
    }
}

fn format_local(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%a %b %d, %H:%M")
        .to_string()
}

fn repeat_label(repeat: RepeatEvery) -> &'static str {
    match repeat {
        RepeatEvery::Day => "day",
        RepeatEvery::Week => "week",
        RepeatEvery::Month => "month",
    }
}
