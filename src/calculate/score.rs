//! Spec scoring, ranking and tier assignment.

use std::cmp::Ordering;

use crate::models::{Metric, ScoreOptions, ScoredSpec, SpecStat, Tier};

use super::numeric::{normalize, orient};

/// Score spec groups under the chosen metric and return them sorted,
/// ranked and tiered.
///
/// Popularity is each group's share of the total sample count. Averages,
/// medians and popularity are min-max normalized independently (a uniform
/// vector normalizes to all ones); averages and medians are flipped when
/// lower source values are better, popularity never is. Combined mode
/// re-normalizes `w_pop * popularity + w_med * oriented median`.
///
/// Ties on score break on the better-oriented median, then average, giving
/// a strict total order whenever either differs.
pub fn score_specs(specs: &[SpecStat], opts: ScoreOptions) -> Vec<ScoredSpec> {
    if specs.is_empty() {
        return Vec::new();
    }

    let total_count: u32 = specs.iter().map(|s| s.count).sum();
    let popularity: Vec<f64> = specs
        .iter()
        .map(|s| {
            if total_count == 0 {
                0.0
            } else {
                s.count as f64 / total_count as f64
            }
        })
        .collect();

    let avg_n = normalize(&specs.iter().map(|s| s.avg).collect::<Vec<_>>());
    let med_n = normalize(&specs.iter().map(|s| s.median).collect::<Vec<_>>());
    let pop_n = normalize(&popularity);

    let score: Vec<f64> = match opts.metric {
        Metric::Popularity => pop_n,
        Metric::Avg => orient(&avg_n, opts.lower_is_better),
        Metric::Median => orient(&med_n, opts.lower_is_better),
        Metric::Combined => {
            let med_oriented = orient(&med_n, opts.lower_is_better);
            let raw: Vec<f64> = pop_n
                .iter()
                .zip(&med_oriented)
                .map(|(p, m)| opts.w_pop * p + opts.w_med * m)
                .collect();
            normalize(&raw)
        }
    };

    let mut scored: Vec<ScoredSpec> = specs
        .iter()
        .zip(popularity)
        .zip(score)
        .map(|((stat, popularity), score)| ScoredSpec {
            stat: stat.clone(),
            popularity,
            score,
            rank: 0,
            tier: Tier::D,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| oriented_cmp(a.stat.median, b.stat.median, opts.lower_is_better))
            .then_with(|| oriented_cmp(a.stat.avg, b.stat.avg, opts.lower_is_better))
    });

    let total = scored.len();
    for (i, s) in scored.iter_mut().enumerate() {
        s.rank = (i + 1) as u32;
        s.tier = Tier::from_position(i + 1, total);
    }
    scored
}

/// Order `a` before `b` when `a` is better under the orientation.
fn oriented_cmp(a: f64, b: f64, lower_is_better: bool) -> Ordering {
    if lower_is_better {
        a.total_cmp(&b)
    } else {
        b.total_cmp(&a)
    }
}
