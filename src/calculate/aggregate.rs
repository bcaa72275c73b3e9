//! Percentile sampling and class/spec aggregation.
//!
//! Recomputes everything from scratch on each call over already-materialized
//! rows; there is no incremental state.

use std::collections::HashMap;

use regex::Regex;

use crate::models::{Aggregation, ClassStat, ResolvedRow, SpecKey, SpecStat};

use super::numeric::{average, median, quantile};

/// Options for one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Target percentile in `(0, 1]`; `1.0` means no filtering.
    pub percentile: f64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self { percentile: 1.0 }
    }
}

struct ClassSlot {
    class_id: u32,
    class_name: String,
    values: Vec<f64>,
    icon_sample: Option<String>,
}

struct SpecSlot {
    class_id: u32,
    class_name: String,
    spec_key: SpecKey,
    spec_name: String,
    values: Vec<f64>,
    icon_url: Option<String>,
}

/// Aggregate resolved rows into class-level and spec-level statistics.
///
/// With `percentile < 1` the working sample is restricted to rows whose
/// value is at or above the interpolated quantile threshold. The boundary is
/// inclusive, so ties sitting exactly on the threshold can retain more than
/// the nominal fraction. An empty input yields empty tables and no
/// threshold.
pub fn aggregate(rows: &[ResolvedRow], opts: AggregateOptions) -> Aggregation {
    let total = rows.len() as u32;

    let (sample, threshold): (Vec<&ResolvedRow>, Option<f64>) = if opts.percentile < 1.0 {
        let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
        let t = quantile(&values, opts.percentile);
        let sample = rows.iter().filter(|r| r.value >= t).collect();
        (sample, t.is_finite().then_some(t))
    } else {
        (rows.iter().collect(), None)
    };

    // Single pass: accumulate per-group value lists. The first row seen in a
    // group donates its display icon.
    let mut by_class: HashMap<u32, ClassSlot> = HashMap::new();
    let mut by_spec: HashMap<(u32, SpecKey), SpecSlot> = HashMap::new();

    for row in &sample {
        let class_slot = by_class.entry(row.class_id).or_insert_with(|| ClassSlot {
            class_id: row.class_id,
            class_name: row.class_name.clone(),
            values: Vec::new(),
            icon_sample: row.icon_url.clone(),
        });
        class_slot.values.push(row.value);
        if class_slot.icon_sample.is_none() && row.icon_url.is_some() {
            class_slot.icon_sample = row.icon_url.clone();
        }

        let spec_slot = by_spec
            .entry((row.class_id, row.spec_key.clone()))
            .or_insert_with(|| SpecSlot {
                class_id: row.class_id,
                class_name: row.class_name.clone(),
                spec_key: row.spec_key.clone(),
                spec_name: row.spec_name.clone(),
                values: Vec::new(),
                icon_url: row.icon_url.clone(),
            });
        spec_slot.values.push(row.value);
        if spec_slot.icon_url.is_none() && row.icon_url.is_some() {
            spec_slot.icon_url = row.icon_url.clone();
        }
    }

    let mut class_stats: Vec<ClassStat> = by_class
        .into_values()
        .map(|slot| ClassStat {
            class_id: slot.class_id,
            class_name: slot.class_name,
            count: slot.values.len() as u32,
            avg: average(&slot.values),
            median: median(&slot.values),
            icon_url: slot.icon_sample.as_deref().map(class_icon_from_spec_icon),
        })
        .collect();
    class_stats.sort_by(|a, b| b.avg.total_cmp(&a.avg));

    let mut spec_stats: Vec<SpecStat> = by_spec
        .into_values()
        .map(|slot| SpecStat {
            class_id: slot.class_id,
            class_name: slot.class_name,
            spec_key: slot.spec_key,
            spec_name: slot.spec_name,
            count: slot.values.len() as u32,
            avg: average(&slot.values),
            median: median(&slot.values),
            icon_url: slot.icon_url,
        })
        .collect();
    spec_stats.sort_by(|a, b| b.avg.total_cmp(&a.avg));

    Aggregation {
        sample_size: sample.len() as u32,
        total,
        threshold,
        class_stats,
        spec_stats,
    }
}

/// Derive a class icon URL from a spec icon URL by rewriting the trailing
/// `-<spec>.png` to `-0.png`.
fn class_icon_from_spec_icon(spec_icon: &str) -> String {
    let re = Regex::new(r"(/c\d+)-\d+(\.png)$").unwrap();
    re.replace(spec_icon, "${1}-0${2}").into_owned()
}
