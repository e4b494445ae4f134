use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use plant_core::record::RepeatEvery;

#[derive(Debug, Parser)]
#[command(name = "plant_care", about = "Keep track of when to water your plants")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start tracking a plant, or change its reminder.
    Save {
        #[command(flatten)]
        plant: PlantArgs,
        #[command(flatten)]
        when: When,
    },
    /// Stop tracking a plant and cancel its reminder.
    Remove { id: String },
    /// List plants, most urgent first.
    List {
        #[arg(long)]
        environment: Option<String>,
    },
    /// Report whether a plant is already tracked.
    Tracked { id: String },
    /// Show everything stored for one plant.
    Show { id: String },
    /// Forget every plant and cancel all reminders.
    Clear,
}

#[derive(Debug, Clone, Args)]
pub struct PlantArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub about: Option<String>,
    #[arg(long)]
    pub water_tips: Option<String>,
    #[arg(long)]
    pub photo: Option<String>,
    #[arg(long = "environment")]
    pub environment: Vec<String>,
    /// Watering times per period, e.g. `--times 2 --repeat-every week`.
    #[arg(long, requires = "repeat_every")]
    pub times: Option<u32>,
    #[arg(long, value_parser = parse_repeat_every, requires = "times")]
    pub repeat_every: Option<RepeatEvery>,
}

#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct When {
    /// RFC 3339 instant, e.g. 2025-05-01T18:30:00Z.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
    /// Minutes from now.
    #[arg(long = "in", allow_negative_numbers = true)]
    pub in_minutes: Option<i64>,
    /// Local time of day today, HH:MM.
    #[arg(long)]
    pub time: Option<String>,
}

fn parse_repeat_every(raw: &str) -> Result<RepeatEvery, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "day" | "daily" => Ok(RepeatEvery::Day),
        "week" | "weekly" => Ok(RepeatEvery::Week),
        "month" | "monthly" => Ok(RepeatEvery::Month),
        other => Err(format!("unknown period `{other}` (expected day, week or month)")),
    }
}
