//! Uploaded combat log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::taxonomy::ClassMeta;

/// The meter metric a log was scraped under (e.g. 11 = Deaths).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MeterMetric {
    pub id: Option<u32>,
    pub name: Option<String>,
}

/// One death-meter row inside a stored log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeathRow {
    /// Cleaned player name (parenthetical suffix already stripped).
    pub name: String,
    pub deaths: f64,
    pub class_id: Option<u32>,
}

/// A scraped log persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLog {
    pub id: Uuid,
    /// Viewer URL as submitted.
    pub url: String,
    /// Lowercased origin+path; the duplicate-detection key.
    pub normalized_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub metric: Option<MeterMetric>,
    /// Player count at scrape time.
    pub total: u32,
    pub rows: Vec<DeathRow>,
}

impl StoredLog {
    /// Create a stored log with a fresh id and upload timestamp.
    pub fn new(
        url: String,
        normalized_url: String,
        metric: Option<MeterMetric>,
        rows: Vec<DeathRow>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            normalized_url,
            uploaded_at: Utc::now(),
            metric,
            total: rows.len() as u32,
            rows,
        }
    }
}

/// One player in the cumulative cross-log death ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPlayer {
    pub rank: u32,
    pub name: String,
    /// Total deaths across all merged logs.
    pub deaths: f64,
    /// Number of logs the player appears in.
    pub logs: u32,
    #[serde(flatten)]
    pub class: ClassMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, deaths: f64) -> DeathRow {
        DeathRow {
            name: name.to_string(),
            deaths,
            class_id: Some(1),
        }
    }

    #[test]
    fn test_stored_log_new_sets_total() {
        let log = StoredLog::new(
            "https://turtlogs.com/viewer/123/base".to_string(),
            "https://turtlogs.com/viewer/123/base".to_string(),
            None,
            vec![row("A", 3.0), row("B", 1.0)],
        );
        assert_eq!(log.total, 2);
        assert_eq!(log.rows.len(), 2);
    }

    #[test]
    fn test_stored_log_ids_unique() {
        let a = StoredLog::new("u".into(), "n".into(), None, vec![]);
        let b = StoredLog::new("u".into(), "n".into(), None, vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_stored_log_serialization_round_trip() {
        let log = StoredLog::new(
            "https://turtlogs.com/viewer/9/base".to_string(),
            "https://turtlogs.com/viewer/9/base".to_string(),
            Some(MeterMetric {
                id: Some(11),
                name: Some("Deaths".to_string()),
            }),
            vec![row("A", 2.0)],
        );

        let json = serde_json::to_string(&log).unwrap();
        let parsed: StoredLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, log.id);
        assert_eq!(parsed.metric, log.metric);
        assert_eq!(parsed.rows, log.rows);
    }

    #[test]
    fn test_ranked_player_flattens_class_meta() {
        let player = RankedPlayer {
            rank: 1,
            name: "Kyra".to_string(),
            deaths: 12.0,
            logs: 3,
            class: ClassMeta::for_class(Some(8)),
        };

        let json = serde_json::to_value(&player).unwrap();
        assert_eq!(json["class_name"], "Mage");
        assert_eq!(json["rank"], 1);
    }
}
