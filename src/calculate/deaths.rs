//! Cross-log death ranking.
//!
//! Merges the death rows of every stored log into one cumulative per-player
//! ranking. Pets, totems and known alt entries are filtered through a fixed
//! built-in exclusion list that user exclusions can only extend, never
//! shrink. The merge itself never deduplicates logs; duplicate uploads are
//! prevented at the persistence layer by the normalized-URL key.

use std::collections::{HashMap, HashSet};

use crate::models::taxonomy::ClassMeta;
use crate::models::{RankedPlayer, StoredLog};

/// Names that are always excluded from the ranking.
///
/// Summons, totems and a hand-curated set of known non-player entries
/// observed in uploaded logs.
pub const AUTO_EXCLUSIONS: &[&str] = &[
    "Greater Feral Spirit",
    "Spectral Deathknight",
    "Fire Nova Totem V",
    "Servant of Alexi Barov",
    "Whiskasender",
    "Wolf",
    "Cat",
    "Servant of Weldon Barov",
    "Magma Totem IV",
    "Searing Totem VI",
    "Deathknight Understudy",
    "Mana Spring Totem IV",
    "Strength of Earth Totem V",
    "Fire Nova Totem IV",
    "Flametongue Totem IV",
    "Windfury Totem",
    "Arcanite Dragonling",
    "Naxxramas Worshipper",
    "Cinder Elemental",
    "Unknown",
    "TrapticsPet",
    "Bait",
    "Tapipet",
    "Blacki",
    "Raptor",
    "csumisz",
    "Serpent",
    "Zilham",
    "Belisarius",
    "Macska",
    "Kupqua",
    "Sproutling",
    "Hyena",
    "Infernal",
    "Orban",
    "Felguard",
    "Kyra",
    "Yaztal",
    "Gobpad",
    "Whitefang",
    "Hokuszpok",
    "Kapafog",
    "KONG",
    "Mocsok",
    "NemOrban",
    "Scorpid",
    "Bizloz",
    "Cicmic",
    "Ghaadym",
    "Glyevere",
    "Grimnar",
    "Karkol",
    "Kasha",
    "Kraggak",
    "Shaahun",
    "Shpata",
    "Solarfang",
    "Thornling",
    "Traafum",
    "Glynora",
    "Rupnam",
];

/// Whether a name collides with the built-in exclusion list
/// (case-insensitive).
pub fn is_auto_excluded(name: &str) -> bool {
    let key = name.trim().to_lowercase();
    AUTO_EXCLUSIONS.iter().any(|x| x.to_lowercase() == key)
}

/// Union of built-in and user exclusions as lowercase keys.
fn effective_exclusions(user: &[String]) -> HashSet<String> {
    let mut excluded: HashSet<String> = AUTO_EXCLUSIONS
        .iter()
        .map(|x| x.trim().to_lowercase())
        .collect();
    excluded.extend(
        user.iter()
            .map(|x| x.trim().to_lowercase())
            .filter(|x| !x.is_empty()),
    );
    excluded
}

#[derive(Default)]
struct ClassTally {
    logs: u32,
    deaths: f64,
}

struct PlayerSlot {
    name: String,
    deaths: f64,
    logs: u32,
    by_class: HashMap<u32, ClassTally>,
}

/// Merge death rows across logs into a cumulative ranking.
///
/// Keyed by case-insensitive name. Deaths accumulate per row; the `logs`
/// counters (per player and per class sub-tally) count each log at most
/// once. Final order is descending deaths with ascending name as the
/// tie-break; ranks are 1-based.
pub fn merge_deaths(logs: &[StoredLog], user_exclusions: &[String]) -> Vec<RankedPlayer> {
    let excluded = effective_exclusions(user_exclusions);

    let mut players: HashMap<String, PlayerSlot> = HashMap::new();

    for log in logs {
        let mut seen_in_log: HashSet<String> = HashSet::new();
        let mut class_seen_in_log: HashSet<(String, u32)> = HashSet::new();

        for row in &log.rows {
            let name = row.name.trim();
            if name.is_empty() {
                continue;
            }
            let key = name.to_lowercase();
            if excluded.contains(&key) {
                continue;
            }

            let slot = players.entry(key.clone()).or_insert_with(|| PlayerSlot {
                name: name.to_string(),
                deaths: 0.0,
                logs: 0,
                by_class: HashMap::new(),
            });
            slot.deaths += row.deaths;
            if seen_in_log.insert(key.clone()) {
                slot.logs += 1;
            }

            if let Some(class_id) = row.class_id {
                let tally = slot.by_class.entry(class_id).or_default();
                tally.deaths += row.deaths;
                if class_seen_in_log.insert((key.clone(), class_id)) {
                    tally.logs += 1;
                }
            }
        }
    }

    let mut slots: Vec<PlayerSlot> = players.into_values().collect();
    slots.sort_by(|a, b| {
        b.deaths
            .total_cmp(&a.deaths)
            .then_with(|| a.name.cmp(&b.name))
    });

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            let primary_class = primary_class_id(&slot.by_class);
            RankedPlayer {
                rank: (i + 1) as u32,
                name: slot.name,
                deaths: slot.deaths,
                logs: slot.logs,
                class: ClassMeta::for_class(primary_class),
            }
        })
        .collect()
}

/// The class a player is shown as: most logs, ties broken by more deaths.
fn primary_class_id(by_class: &HashMap<u32, ClassTally>) -> Option<u32> {
    by_class
        .iter()
        .max_by(|(_, a), (_, b)| {
            a.logs
                .cmp(&b.logs)
                .then_with(|| a.deaths.total_cmp(&b.deaths))
        })
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeathRow;

    fn log_of(rows: Vec<(&str, f64, Option<u32>)>) -> StoredLog {
        StoredLog::new(
            "https://turtlogs.com/viewer/1/base".to_string(),
            "https://turtlogs.com/viewer/1/base".to_string(),
            None,
            rows.into_iter()
                .map(|(name, deaths, class_id)| DeathRow {
                    name: name.to_string(),
                    deaths,
                    class_id,
                })
                .collect(),
        )
    }

    #[test]
    fn test_merge_sums_deaths_and_counts_logs() {
        let logs = vec![
            log_of(vec![("Aldo", 3.0, Some(1)), ("Bren", 1.0, Some(2))]),
            log_of(vec![("Aldo", 2.0, Some(1))]),
        ];
        let ranked = merge_deaths(&logs, &[]);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "Aldo");
        assert_eq!(ranked[0].deaths, 5.0);
        assert_eq!(ranked[0].logs, 2);
        assert_eq!(ranked[1].name, "Bren");
        assert_eq!(ranked[1].logs, 1);
    }

    #[test]
    fn test_merge_case_insensitive_identity() {
        let logs = vec![
            log_of(vec![("Aldo", 3.0, Some(1))]),
            log_of(vec![("ALDO", 2.0, Some(1))]),
        ];
        let ranked = merge_deaths(&logs, &[]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].deaths, 5.0);
    }

    #[test]
    fn test_order_deaths_desc_then_name_asc() {
        let logs = vec![log_of(vec![
            ("Zed", 5.0, None),
            ("Abel", 5.0, None),
            ("Mira", 9.0, None),
        ])];
        let ranked = merge_deaths(&logs, &[]);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Mira", "Abel", "Zed"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_builtin_exclusions_always_apply() {
        let logs = vec![log_of(vec![
            ("Windfury Totem", 8.0, None),
            ("wolf", 2.0, None),
            ("Aldo", 1.0, Some(1)),
        ])];
        // Even with an empty user list the built-ins are stripped
        let ranked = merge_deaths(&logs, &[]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Aldo");

        // A user list that names a built-in changes nothing
        let ranked = merge_deaths(&logs, &["Windfury Totem".to_string()]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Aldo");
    }

    #[test]
    fn test_user_exclusions_extend_builtin() {
        let logs = vec![log_of(vec![("Aldo", 1.0, None), ("Bren", 2.0, None)])];
        let ranked = merge_deaths(&logs, &["bren".to_string()]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Aldo");
    }

    #[test]
    fn test_primary_class_by_log_majority() {
        let logs = vec![
            log_of(vec![("Aldo", 1.0, Some(1))]),
            log_of(vec![("Aldo", 1.0, Some(1))]),
            log_of(vec![("Aldo", 9.0, Some(8))]),
        ];
        let ranked = merge_deaths(&logs, &[]);
        // Two warrior logs beat one mage log despite fewer deaths
        assert_eq!(ranked[0].class.class_name, "Warrior");
    }

    #[test]
    fn test_primary_class_tie_broken_by_deaths() {
        let logs = vec![
            log_of(vec![("Aldo", 1.0, Some(1))]),
            log_of(vec![("Aldo", 9.0, Some(8))]),
        ];
        let ranked = merge_deaths(&logs, &[]);
        assert_eq!(ranked[0].class.class_name, "Mage");
    }

    #[test]
    fn test_unresolvable_class_presents_unknown() {
        let logs = vec![log_of(vec![("Aldo", 1.0, None)])];
        let ranked = merge_deaths(&logs, &[]);
        assert_eq!(ranked[0].class.class_name, "Unknown");
        assert!(ranked[0].class.class_icon.is_none());
    }

    #[test]
    fn test_identical_logs_with_distinct_ids_both_count() {
        // The merge must not deduplicate; that is the store's job
        let a = log_of(vec![("Aldo", 3.0, Some(1))]);
        let b = log_of(vec![("Aldo", 3.0, Some(1))]);
        assert_ne!(a.id, b.id);

        let ranked = merge_deaths(&[a, b], &[]);
        assert_eq!(ranked[0].deaths, 6.0);
        assert_eq!(ranked[0].logs, 2);
    }

    #[test]
    fn test_empty_logs_empty_ranking() {
        assert!(merge_deaths(&[], &[]).is_empty());
    }

    #[test]
    fn test_is_auto_excluded_case_insensitive() {
        assert!(is_auto_excluded("windfury totem"));
        assert!(is_auto_excluded("  Unknown  "));
        assert!(!is_auto_excluded("Aldo"));
    }
}
