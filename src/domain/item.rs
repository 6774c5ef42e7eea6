//! Required items and their categories.
//!
//! Classification is total: a structured category tag always wins, the
//! name heuristic only runs when no usable tag is present, and anything
//! left over is [`ItemCategory::Other`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// An item a quest asks the player to hand over or find.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredItem {
    /// Display name.
    pub name: String,
    /// Number of items required.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Structured category tag from the catalog, if any.
    #[serde(default)]
    pub category: Option<String>,
    /// Whether the item must be found in raid.
    #[serde(default, alias = "fir")]
    pub found_in_raid: bool,
}

const fn default_count() -> u32 {
    1
}

impl RequiredItem {
    /// Create an item with a count of one and no category tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 1,
            category: None,
            found_in_raid: false,
        }
    }

    /// Resolve this item's category.
    #[must_use]
    pub fn category(&self) -> ItemCategory {
        ItemCategory::classify(self.category.as_deref(), &self.name)
    }
}

/// Item category used for grouping required items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Weapon,
    WeaponPart,
    Ammo,
    Armor,
    Gear,
    Medical,
    Provisions,
    Key,
    Barter,
    Container,
    Info,
    Other,
}

impl ItemCategory {
    /// Every category, in display order.
    pub const ALL: [ItemCategory; 12] = [
        Self::Weapon,
        Self::WeaponPart,
        Self::Ammo,
        Self::Armor,
        Self::Gear,
        Self::Medical,
        Self::Provisions,
        Self::Key,
        Self::Barter,
        Self::Container,
        Self::Info,
        Self::Other,
    ];

    /// Classify from an optional structured tag, falling back to the name.
    #[must_use]
    pub fn classify(tag: Option<&str>, name: &str) -> Self {
        tag.and_then(Self::from_tag)
            .or_else(|| Self::guess_from_name(name))
            .unwrap_or(Self::Other)
    }

    /// Map a structured category tag to a category.
    ///
    /// Tags are matched case-insensitively; `-`, `_` and spaces are
    /// treated alike.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let normalized = tag.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let category = match normalized.as_str() {
            "weapon" | "weapons" => Self::Weapon,
            "weapon_part" | "weapon_parts" | "mod" | "mods" => Self::WeaponPart,
            "ammo" | "ammunition" => Self::Ammo,
            "armor" | "armour" | "body_armor" | "helmet" => Self::Armor,
            "gear" | "equipment" | "rig" | "backpack" => Self::Gear,
            "medical" | "meds" | "medicine" => Self::Medical,
            "provisions" | "food" | "drink" => Self::Provisions,
            "key" | "keys" | "keycard" => Self::Key,
            "barter" | "barter_item" | "barter_items" => Self::Barter,
            "container" | "containers" => Self::Container,
            "info" | "information" | "intel" => Self::Info,
            "other" | "misc" => Self::Other,
            _ => return None,
        };
        Some(category)
    }

    /// Name heuristic for catalog entries without a usable tag.
    ///
    /// Kept separate from [`from_tag`](Self::from_tag) so it never
    /// overrides structured metadata.
    #[must_use]
    pub fn guess_from_name(name: &str) -> Option<Self> {
        const RULES: &[(&[&str], ItemCategory)] = &[
            (&["keycard", " key "], ItemCategory::Key),
            (&["ammo", " rounds ", "mm ", "gauge"], ItemCategory::Ammo),
            (
                &["armor", "helmet", "plate carrier", "vest"],
                ItemCategory::Armor,
            ),
            (
                &["medkit", "bandage", "splint", "injector", "salewa", "ifak"],
                ItemCategory::Medical,
            ),
            (
                &["water", "juice", "ration", "crackers", "tushonka", "condensed milk"],
                ItemCategory::Provisions,
            ),
            (
                &["flash drive", "folder", "intelligence", "diary", "documents"],
                ItemCategory::Info,
            ),
            (
                &["scope", "muzzle", "suppressor", "magazine", "stock", "handguard"],
                ItemCategory::WeaponPart,
            ),
            (
                &["rifle", "pistol", "shotgun", "carbine", "smg"],
                ItemCategory::Weapon,
            ),
            (&["case", "container", "pouch"], ItemCategory::Container),
            (&["backpack", " rig ", "headset"], ItemCategory::Gear),
        ];

        let lower = format!(" {} ", name.to_ascii_lowercase());
        RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| lower.contains(needle)))
            .map(|(_, category)| *category)
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weapon => "Weapon",
            Self::WeaponPart => "Weapon part",
            Self::Ammo => "Ammo",
            Self::Armor => "Armor",
            Self::Gear => "Gear",
            Self::Medical => "Medical",
            Self::Provisions => "Provisions",
            Self::Key => "Key",
            Self::Barter => "Barter",
            Self::Container => "Container",
            Self::Info => "Info",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
