//! Leaderboard row models and normalization.
//!
//! A [`RawRow`] is what the scraping layer hands over: rank, name, value,
//! and whatever spec icons were found on the bar. [`resolve_row`] turns it
//! into a [`ResolvedRow`] with class/spec names from the taxonomy, or drops
//! it when no icon resolved.

use serde::{Deserialize, Serialize};

use super::taxonomy;

/// A spec icon signature found on a leaderboard bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecIcon {
    pub class_id: u32,
    pub spec_id: u32,
    /// Full icon URL, when the asset path was present.
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// One scraped leaderboard entry, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    /// Source rank as displayed; may contain gaps or ties.
    #[serde(default)]
    pub rank: Option<u32>,

    /// Player name as displayed.
    pub name: String,

    /// Metric value, already locale-parsed.
    pub value: f64,

    /// Spec icons found on the bar, in discovery order.
    #[serde(default)]
    pub icons: Vec<SpecIcon>,
}

/// Grouping key for spec-level aggregation.
///
/// Hybrid rows (more than one spec icon) group under a `Combo` of the
/// alphabetically sorted spec names, so the same spec set always collapses
/// into one group no matter the icon discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecKey {
    Single(u32),
    Combo(Vec<String>),
}

impl SpecKey {
    /// Build a combo key from spec names, sorting for stability.
    pub fn combo(mut names: Vec<String>) -> Self {
        names.sort();
        SpecKey::Combo(names)
    }
}

/// A normalized row with resolved class/spec identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRow {
    pub rank: Option<u32>,
    pub name: String,
    pub value: f64,
    pub class_id: u32,
    pub class_name: String,
    pub spec_key: SpecKey,
    /// Display label; hybrids get the sorted `" + "`-joined spec names.
    pub spec_name: String,
    pub hybrid: bool,
    /// Display icon from the first resolved spec icon only.
    pub icon_url: Option<String>,
}

/// Resolve a raw row against the taxonomy.
///
/// Returns `None` when the row carries no spec icon at all; such rows are
/// excluded from the sample, not treated as errors. Unknown class ids keep
/// the row with fallback labels.
pub fn resolve_row(raw: RawRow) -> Option<ResolvedRow> {
    let first = raw.icons.first()?.clone();

    let class_id = first.class_id;
    let class_name = taxonomy::class_name(class_id);

    let mut spec_names: Vec<String> = raw
        .icons
        .iter()
        .map(|icon| taxonomy::spec_name(icon.class_id, icon.spec_id))
        .collect();
    spec_names.sort();

    let hybrid = spec_names.len() > 1;
    let spec_name = spec_names.join(" + ");
    let spec_key = if hybrid {
        SpecKey::Combo(spec_names)
    } else {
        SpecKey::Single(first.spec_id)
    };

    Some(ResolvedRow {
        rank: raw.rank,
        name: raw.name,
        value: raw.value,
        class_id,
        class_name,
        spec_key,
        spec_name,
        hybrid,
        icon_url: first.icon_url,
    })
}

/// Resolve a batch of rows, dropping unresolvable ones and ordering by
/// source rank (missing rank sorts last).
pub fn resolve_rows(raw: Vec<RawRow>) -> Vec<ResolvedRow> {
    let mut rows: Vec<ResolvedRow> = raw.into_iter().filter_map(resolve_row).collect();
    rows.sort_by_key(|r| r.rank.unwrap_or(u32::MAX));
    rows
}

/// Strip one trailing `" (...)"` suffix from a player name.
///
/// The viewer appends alternate identifiers in parentheses
/// (`"Yaztal (Nyxin)" -> "Yaztal"`); the cleaned name is the canonical
/// identity used for cross-log merging and exclusions.
pub fn clean_player_name(raw: &str) -> String {
    let s = raw.trim();
    if let Some(open) = s.rfind('(') {
        if s.ends_with(')') && open > 0 {
            let before = s[..open].trim_end();
            // Only strip when the parenthetical is a whitespace-separated suffix
            if before.len() < open {
                return before.to_string();
            }
        }
    }
    s.to_string()
}
