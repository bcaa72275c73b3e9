//! Statistics calculation engine.
//!
//! Computes derived metrics from scraped leaderboard rows:
//! - Locale-tolerant numeric parsing and quantiles
//! - Percentile-filtered class/spec aggregation
//! - Metric scoring, ranking and tier assignment
//! - Cumulative cross-log death rankings
//!
//! Everything here is synchronous and pure over its inputs: no I/O, no
//! shared mutable state, recomputed from scratch per call.

mod aggregate;
mod deaths;
mod numeric;
mod score;

pub use aggregate::{aggregate, AggregateOptions};
pub use deaths::{is_auto_excluded, merge_deaths, AUTO_EXCLUSIONS};
pub use numeric::{average, median, normalize, orient, parse_locale_number, quantile};
pub use score::score_specs;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{resolve_rows, RawRow, ScoreOptions, SpecIcon};

    // End-to-end: scrape-shaped rows through aggregation and scoring.
    #[test]
    fn test_pipeline_aggregate_then_score() {
        let raw = vec![
            RawRow {
                rank: Some(1),
                name: "A".to_string(),
                value: 100.0,
                icons: vec![SpecIcon {
                    class_id: 1,
                    spec_id: 1,
                    icon_url: None,
                }],
            },
            RawRow {
                rank: Some(2),
                name: "B".to_string(),
                value: 50.0,
                icons: vec![SpecIcon {
                    class_id: 1,
                    spec_id: 2,
                    icon_url: None,
                }],
            },
            RawRow {
                rank: Some(3),
                name: "C".to_string(),
                value: 10.0,
                icons: vec![SpecIcon {
                    class_id: 2,
                    spec_id: 1,
                    icon_url: None,
                }],
            },
        ];

        let rows = resolve_rows(raw);
        let agg = aggregate(&rows, AggregateOptions { percentile: 1.0 });

        let warrior = agg.class_stats.iter().find(|c| c.class_id == 1).unwrap();
        assert_eq!(warrior.count, 2);
        assert_eq!(warrior.avg, 75.0);
        assert_eq!(warrior.median, 75.0);
        let paladin = agg.class_stats.iter().find(|c| c.class_id == 2).unwrap();
        assert_eq!(paladin.count, 1);
        assert_eq!(paladin.avg, 10.0);

        let ranked = score_specs(&agg.spec_stats, ScoreOptions::default());
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].rank, 1);
        // Every group carries a tier
        assert_eq!(ranked.iter().filter(|s| s.rank == 0).count(), 0);
    }
}
