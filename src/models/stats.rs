//! Derived statistics models.

use serde::{Deserialize, Serialize};

use super::SpecKey;

/// Tier classification by cumulative rank fraction.
///
/// S is the top 10% of ranked groups, A the next 20%, B the next 30%,
/// C the next 25%, D the rest. The cutoffs are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Tier {
    /// Tier for a 1-based rank within `total` ranked groups.
    pub fn from_position(rank: usize, total: usize) -> Self {
        let q = rank as f64 / total as f64;
        if q <= 0.10 {
            Tier::S
        } else if q <= 0.30 {
            Tier::A
        } else if q <= 0.60 {
            Tier::B
        } else if q <= 0.85 {
            Tier::C
        } else {
            Tier::D
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::S => write!(f, "S"),
            Tier::A => write!(f, "A"),
            Tier::B => write!(f, "B"),
            Tier::C => write!(f, "C"),
            Tier::D => write!(f, "D"),
        }
    }
}

/// Per-class statistics over the working sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassStat {
    pub class_id: u32,
    pub class_name: String,
    pub count: u32,
    pub avg: f64,
    pub median: f64,
    /// Class icon derived from a sampled spec icon (`-<spec>.png` → `-0.png`).
    pub icon_url: Option<String>,
}

/// Per-class+spec statistics over the working sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecStat {
    pub class_id: u32,
    pub class_name: String,
    pub spec_key: SpecKey,
    pub spec_name: String,
    pub count: u32,
    pub avg: f64,
    pub median: f64,
    pub icon_url: Option<String>,
}

/// Full aggregation output for one leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    /// Rows retained after percentile filtering.
    pub sample_size: u32,
    /// Rows in the full input.
    pub total: u32,
    /// Percentile threshold; `None` when no filtering was requested or the
    /// quantile was undefined (empty input).
    pub threshold: Option<f64>,
    pub class_stats: Vec<ClassStat>,
    pub spec_stats: Vec<SpecStat>,
}

/// Scoring metric mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Popularity,
    Avg,
    Median,
    #[default]
    Combined,
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "popularity" | "pop" => Ok(Metric::Popularity),
            "avg" | "average" => Ok(Metric::Avg),
            "median" | "med" => Ok(Metric::Median),
            "combined" | "combo" => Ok(Metric::Combined),
            other => Err(format!("unknown metric: {}", other)),
        }
    }
}

/// Options for scoring spec groups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreOptions {
    pub metric: Metric,
    /// Whether lower source values are better (deaths, damage taken).
    pub lower_is_better: bool,
    /// Popularity weight in combined mode.
    pub w_pop: f64,
    /// Median weight in combined mode.
    pub w_med: f64,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            metric: Metric::Combined,
            lower_is_better: false,
            w_pop: 0.45,
            w_med: 0.55,
        }
    }
}

/// A spec group with its computed score, rank and tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSpec {
    #[serde(flatten)]
    pub stat: SpecStat,
    /// Share of total sample count across all groups, 0..1.
    pub popularity: f64,
    /// Normalized 0..1 score under the chosen metric.
    pub score: f64,
    /// 1-based position after sorting.
    pub rank: u32,
    pub tier: Tier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_cutoffs_for_ten_groups() {
        let tiers: Vec<Tier> = (1..=10).map(|r| Tier::from_position(r, 10)).collect();
        assert_eq!(
            tiers,
            vec![
                Tier::S,
                Tier::A,
                Tier::A,
                Tier::B,
                Tier::B,
                Tier::B,
                Tier::C,
                Tier::C,
                Tier::D,
                Tier::D,
            ]
        );
    }

    #[test]
    fn test_tier_single_group_is_d() {
        // q = 1.0 falls past every cutoff
        assert_eq!(Tier::from_position(1, 1), Tier::D);
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(format!("{}", Tier::S), "S");
        assert_eq!(format!("{}", Tier::D), "D");
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("pop".parse::<Metric>().unwrap(), Metric::Popularity);
        assert_eq!("popularity".parse::<Metric>().unwrap(), Metric::Popularity);
        assert_eq!("avg".parse::<Metric>().unwrap(), Metric::Avg);
        assert_eq!("med".parse::<Metric>().unwrap(), Metric::Median);
        assert_eq!("combined".parse::<Metric>().unwrap(), Metric::Combined);
        assert!("bogus".parse::<Metric>().is_err());
    }

    #[test]
    fn test_score_options_defaults() {
        let opts = ScoreOptions::default();
        assert_eq!(opts.metric, Metric::Combined);
        assert!(!opts.lower_is_better);
        assert!((opts.w_pop - 0.45).abs() < f64::EPSILON);
        assert!((opts.w_med - 0.55).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metric_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Metric::Median).unwrap(), "\"median\"");
        let m: Metric = serde_json::from_str("\"popularity\"").unwrap();
        assert_eq!(m, Metric::Popularity);
    }
}
