//! Fixed class/spec taxonomy.
//!
//! The nine playable classes and their specs, keyed by the numeric ids the
//! viewer embeds in icon filenames (`c<class>-<spec>.png`). Ids 6 and 10 are
//! unused on this server. The table is static domain knowledge; nothing in
//! the pipeline ever mutates it.

use serde::{Deserialize, Serialize};

/// One class entry: id, display name, and its spec table.
#[derive(Debug, Clone, Copy)]
pub struct ClassEntry {
    pub id: u32,
    pub name: &'static str,
    /// Short lowercase key used for icon filenames.
    pub key: &'static str,
    /// Class color as used by the game UI.
    pub color: &'static str,
    pub specs: &'static [(u32, &'static str)],
}

static TAXONOMY: &[ClassEntry] = &[
    ClassEntry {
        id: 1,
        name: "Warrior",
        key: "warrior",
        color: "#C79C6E",
        specs: &[(1, "Arms"), (2, "Fury"), (3, "Protection"), (4, "Fury (2H)")],
    },
    ClassEntry {
        id: 2,
        name: "Paladin",
        key: "paladin",
        color: "#F58CBA",
        specs: &[(1, "Holy"), (2, "Protection"), (3, "SoC"), (4, "SoR")],
    },
    ClassEntry {
        id: 3,
        name: "Hunter",
        key: "hunter",
        color: "#ABD473",
        specs: &[(1, "Beast Mastery"), (2, "Marksmanship"), (3, "Survival")],
    },
    ClassEntry {
        id: 4,
        name: "Rogue",
        key: "rogue",
        color: "#FFF569",
        specs: &[(1, "Assassination"), (2, "Combat"), (3, "Subtlety")],
    },
    ClassEntry {
        id: 5,
        name: "Priest",
        key: "priest",
        color: "#FFFFFF",
        specs: &[(1, "Discipline"), (2, "Holy"), (3, "Shadow")],
    },
    ClassEntry {
        id: 7,
        name: "Shaman",
        key: "shaman",
        color: "#0070DE",
        specs: &[(1, "Elemental"), (2, "Enhancement"), (3, "Restoration")],
    },
    ClassEntry {
        id: 8,
        name: "Mage",
        key: "mage",
        color: "#69CCF0",
        specs: &[(1, "Arcane"), (2, "Fire"), (3, "Frost")],
    },
    ClassEntry {
        id: 9,
        name: "Warlock",
        key: "warlock",
        color: "#9482C9",
        specs: &[(1, "Affliction"), (2, "Demonology"), (3, "Destruction")],
    },
    ClassEntry {
        id: 11,
        name: "Druid",
        key: "druid",
        color: "#FF7D0A",
        specs: &[(1, "Balance"), (2, "Feral"), (3, "Restoration")],
    },
];

/// Neutral color for players whose class could not be resolved.
pub const UNKNOWN_CLASS_COLOR: &str = "#C0C0C0";

/// Look up a class entry by id.
pub fn class_entry(class_id: u32) -> Option<&'static ClassEntry> {
    TAXONOMY.iter().find(|c| c.id == class_id)
}

/// Class display name, falling back to `Class {id}` for unknown ids.
pub fn class_name(class_id: u32) -> String {
    match class_entry(class_id) {
        Some(c) => c.name.to_string(),
        None => format!("Class {}", class_id),
    }
}

/// Spec display name, falling back to `Unknown` for unknown pairs.
pub fn spec_name(class_id: u32, spec_id: u32) -> String {
    class_entry(class_id)
        .and_then(|c| c.specs.iter().find(|(id, _)| *id == spec_id))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// All class entries, in id order.
pub fn all_classes() -> &'static [ClassEntry] {
    TAXONOMY
}

/// Display metadata for a class, with a neutral fallback for unresolved ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassMeta {
    pub class_id: Option<u32>,
    pub class_key: Option<String>,
    pub class_name: String,
    pub class_color: String,
    pub class_icon: Option<String>,
}

impl ClassMeta {
    /// Metadata for a resolved or unresolved class id.
    pub fn for_class(class_id: Option<u32>) -> Self {
        match class_id.and_then(class_entry) {
            Some(c) => Self {
                class_id: Some(c.id),
                class_key: Some(c.key.to_string()),
                class_name: c.name.to_string(),
                class_color: c.color.to_string(),
                class_icon: Some(format!("/icons/{}.png", c.key)),
            },
            None => Self {
                class_id: None,
                class_key: None,
                class_name: "Unknown".to_string(),
                class_color: UNKNOWN_CLASS_COLOR.to_string(),
                class_icon: None,
            },
        }
    }
}
