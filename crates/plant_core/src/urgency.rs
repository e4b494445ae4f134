use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::record::PlantCareRecord;

pub const NOTHING_PENDING: &str = "Nothing pending: no plants are waiting to be watered.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextDue {
    pub id: String,
    pub name: String,
    pub due_at: DateTime<Utc>,
    /// Negative once the reminder has fired.
    #[serde(with = "seconds")]
    pub time_until: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrgencyReport {
    pub records: Vec<PlantCareRecord>,
    pub next_due: Option<NextDue>,
    pub summary: String,
}

/// Scheduled records first by due instant, ties by id; unscheduled records
/// keep their relative order at the tail.
pub fn compare_urgency(a: &PlantCareRecord, b: &PlantCareRecord) -> Ordering {
    match (a.due_at(), b.due_at()) {
        (Some(left), Some(right)) => left.cmp(&right).then_with(|| a.id().cmp(b.id())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_by_urgency(records: &mut [PlantCareRecord]) {
    // stable: unscheduled records stay in insertion order
    records.sort_by(compare_urgency);
}

pub fn build_report(mut records: Vec<PlantCareRecord>, now: DateTime<Utc>) -> UrgencyReport {
    sort_by_urgency(&mut records);
    let next_due = records.first().and_then(|record| {
        record.due_at().map(|due_at| NextDue {
            id: record.id().to_string(),
            name: record.name().to_string(),
            due_at,
            time_until: due_at.signed_duration_since(now),
        })
    });
    let summary = summarize(records.len(), next_due.as_ref());
    UrgencyReport {
        records,
        next_due,
        summary,
    }
}

fn summarize(total: usize, next_due: Option<&NextDue>) -> String {
    match next_due {
        _ if total == 0 => NOTHING_PENDING.to_string(),
        Some(next) if next.time_until > Duration::zero() => format!(
            "Don't forget to water the {} in {}.",
            next.name,
            format_distance(next.time_until)
        ),
        Some(next) => format!(
            "Time to water the {}: the reminder fired {} ago.",
            next.name,
            format_distance(-next.time_until)
        ),
        None if total == 1 => "No reminders armed for 1 plant.".to_string(),
        None => format!("No reminders armed for {} plants.", total),
    }
}

/// Rough human distance, in the spirit of "in about 2 hours".
pub fn format_distance(span: Duration) -> String {
    let minutes = span.num_seconds().abs().saturating_add(30) / 60;
    match minutes {
        0 => "less than a minute".to_string(),
        1 => "1 minute".to_string(),
        m if m < 45 => format!("{} minutes", m),
        m if m < 90 => "about 1 hour".to_string(),
        m if m < 24 * 60 => format!("about {} hours", (m + 30) / 60),
        m if m < 42 * 60 => "1 day".to_string(),
        m => format!("{} days", (m + 12 * 60) / (24 * 60)),
    }
}

mod seconds {
    use chrono::Duration;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{NotificationHandle, Plant};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap()
    }

    fn armed(id: &str, name: &str, in_minutes: i64) -> PlantCareRecord {
        let mut record = PlantCareRecord::new(Plant::new(id, name));
        record.set_reminder(
            now() + Duration::minutes(in_minutes),
            NotificationHandle::new(format!("h-{id}")),
        );
        record
    }

    fn ids(records: &[PlantCareRecord]) -> Vec<&str> {
        records.iter().map(|record| record.id()).collect()
    }

    #[test]
    fn scheduled_ascend_and_unscheduled_trail_in_insertion_order() {
        let records = vec![
            PlantCareRecord::new(Plant::new("z", "Zamioculcas")),
            armed("b", "Basil", 120),
            PlantCareRecord::new(Plant::new("a", "Aloe")),
            armed("c", "Cactus", 30),
            armed("a2", "Aloe two", 120),
        ];
        let report = build_report(records, now());
        assert_eq!(ids(&report.records), vec!["c", "a2", "b", "z", "a"]);
    }

    #[test]
    fn next_due_reports_time_until() {
        let report = build_report(vec![armed("p1", "Fern", 60)], now());
        let next = report.next_due.expect("next due");
        assert_eq!(next.id, "p1");
        assert_eq!(next.time_until, Duration::hours(1));
        assert_eq!(report.summary, "Don't forget to water the Fern in about 1 hour.");
    }

    #[test]
    fn summaries_cover_empty_expired_and_unarmed() {
        assert_eq!(build_report(Vec::new(), now()).summary, NOTHING_PENDING);

        let fired = build_report(vec![armed("p1", "Fern", -10)], now());
        assert_eq!(
            fired.summary,
            "Time to water the Fern: the reminder fired 10 minutes ago."
        );

        let unarmed = build_report(
            vec![
                PlantCareRecord::new(Plant::new("p1", "Fern")),
                PlantCareRecord::new(Plant::new("p2", "Aloe")),
            ],
            now(),
        );
        assert!(unarmed.next_due.is_none());
        assert_eq!(unarmed.summary, "No reminders armed for 2 plants.");
    }

    #[test]
    fn distances_read_naturally() {
        assert_eq!(format_distance(Duration::seconds(20)), "less than a minute");
        assert_eq!(format_distance(Duration::seconds(70)), "1 minute");
        assert_eq!(format_distance(Duration::minutes(44)), "44 minutes");
        assert_eq!(format_distance(Duration::minutes(60)), "about 1 hour");
        assert_eq!(format_distance(Duration::hours(5)), "about 5 hours");
        assert_eq!(format_distance(Duration::hours(30)), "1 day");
        assert_eq!(format_distance(Duration::days(3)), "3 days");
        assert_eq!(format_distance(Duration::minutes(-90)), "about 2 hours");
    }
}
