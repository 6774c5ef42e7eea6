//! Quest catalog decoding and lookup.
//!
//! Catalog records carry their list fields as JSON-encoded text. Decoding
//! is lenient per record: a field that fails to decode falls back to an
//! empty value and is reported as a [`DecodeIssue`], and the rest of the
//! batch loads normally. For prerequisites this means a malformed list
//! unlocks the quest (fail open) rather than hiding it.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::id::QuestId;
use super::item::RequiredItem;
use super::quest::{same_group, GroupBy, Objective, Quest};

/// A quest record as delivered by the catalog, before decoding.
///
/// Every field is kept as a raw JSON value and interpreted later by
/// [`QuestCatalog::decode`], so deserializing a record never fails. A value
/// that is not an object becomes a record with `unreadable` set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawQuestRecord {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub trader: Option<Value>,
    pub map: Option<Value>,
    /// Also read from `level_requirement` and `min_level`.
    pub level_required: Option<Value>,
    pub prerequisites: Option<Value>,
    pub objectives: Option<Value>,
    pub required_items: Option<Value>,
    /// Also read from `kappa_required`.
    pub goal_relevant: Option<Value>,
    #[serde(skip)]
    pub unreadable: Option<String>,
}

impl From<Value> for RawQuestRecord {
    fn from(value: Value) -> Self {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Self {
                    unreadable: Some(format!("expected an object, got {other}")),
                    ..Self::default()
                }
            }
        };
        let mut take = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| fields.remove(*key))
                .find(|value| !value.is_null())
        };
        Self {
            id: take(&["id"]),
            name: take(&["name"]),
            trader: take(&["trader"]),
            map: take(&["map"]),
            level_required: take(&["level_required", "level_requirement", "min_level"]),
            prerequisites: take(&["prerequisites"]),
            objectives: take(&["objectives"]),
            required_items: take(&["required_items"]),
            goal_relevant: take(&["goal_relevant", "kappa_required"]),
            unreadable: None,
        }
    }
}

/// A leniency applied while decoding a catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeIssue {
    /// Position of the record in the raw batch.
    pub record: usize,
    /// Id of the affected quest, when the record had one.
    pub quest_id: Option<QuestId>,
    /// Field that was replaced by its fallback.
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for DecodeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.quest_id {
            Some(id) => write!(f, "quest '{id}' field '{}': {}", self.field, self.reason),
            None => write!(f, "record #{} field '{}': {}", self.record, self.field, self.reason),
        }
    }
}

/// The loaded quest catalog, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct QuestCatalog {
    quests: Vec<Quest>,
    index: HashMap<QuestId, usize>,
}

impl QuestCatalog {
    /// Build a catalog from already-decoded quests.
    ///
    /// A duplicate id keeps the first quest.
    #[must_use]
    pub fn from_quests(quests: impl IntoIterator<Item = Quest>) -> Self {
        let mut catalog = Self::default();
        for quest in quests {
            catalog.push(quest);
        }
        catalog
    }

    /// Decode raw records into a catalog, collecting every leniency applied.
    #[must_use]
    pub fn decode(records: Vec<RawQuestRecord>) -> (Self, Vec<DecodeIssue>) {
        let mut catalog = Self::default();
        let mut issues = Vec::new();

        for (position, record) in records.into_iter().enumerate() {
            let Some(quest) = decode_record(position, record, &mut issues) else {
                continue;
            };
            if catalog.index.contains_key(&quest.id) {
                issues.push(DecodeIssue {
                    record: position,
                    quest_id: Some(quest.id.clone()),
                    field: "id",
                    reason: "duplicate id, keeping the first record".into(),
                });
                continue;
            }
            catalog.push(quest);
        }

        for issue in &issues {
            warn!(record = issue.record, field = issue.field, reason = %issue.reason, "Lenient quest decode");
        }

        (catalog, issues)
    }

    fn push(&mut self, quest: Quest) -> bool {
        if self.index.contains_key(&quest.id) {
            return false;
        }
        self.index.insert(quest.id.clone(), self.quests.len());
        self.quests.push(quest);
        true
    }

    #[must_use]
    pub fn get(&self, id: &QuestId) -> Option<&Quest> {
        self.index.get(id).map(|&i| &self.quests[i])
    }

    /// Catalog position of a quest.
    #[must_use]
    pub fn position(&self, id: &QuestId) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: &QuestId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quest> {
        self.quests.iter()
    }

    #[must_use]
    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Distinct group keys in order of first appearance.
    ///
    /// Keys that differ only in case or padding are one group, spelled as
    /// first seen.
    #[must_use]
    pub fn groups(&self, by: GroupBy) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for quest in &self.quests {
            let key = quest.group_key(by);
            if !keys.iter().any(|seen| same_group(seen, key)) {
                keys.push(key);
            }
        }
        keys
    }
}

fn decode_record(
    position: usize,
    record: RawQuestRecord,
    issues: &mut Vec<DecodeIssue>,
) -> Option<Quest> {
    let dropped = |reason: String| DecodeIssue {
        record: position,
        quest_id: None,
        field: "id",
        reason,
    };
    if let Some(reason) = record.unreadable {
        issues.push(DecodeIssue {
            field: "record",
            ..dropped(format!("{reason}, record dropped"))
        });
        return None;
    }
    let id = match decode_id(record.id.as_ref()) {
        Ok(id) => id,
        Err(reason) => {
            issues.push(dropped(format!("{reason}, record dropped")));
            return None;
        }
    };

    let mut note = |field: &'static str, reason: String| {
        issues.push(DecodeIssue {
            record: position,
            quest_id: Some(id.clone()),
            field,
            reason,
        });
    };

    let mut text = |field: &'static str, value: Option<Value>| match value {
        None => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            note(field, format!("expected text, got {other}"));
            None
        }
    };
    let name = text("name", record.name).unwrap_or_default();
    let trader = text("trader", record.trader).unwrap_or_default();
    let map = text("map", record.map).filter(|map| !map.trim().is_empty());

    let level_requirement = match decode_level(record.level_required.as_ref()) {
        Ok(level) => level,
        Err(reason) => {
            note("level_required", reason);
            1
        }
    };

    let (prerequisites, prerequisites_malformed) =
        match decode_prerequisites(record.prerequisites.as_ref()) {
            Ok(ids) => (ids, false),
            Err(reason) => {
                note("prerequisites", reason);
                (Vec::new(), true)
            }
        };

    let objectives = decode_list::<ObjectiveEntry>(record.objectives.as_ref())
        .map(|entries| entries.into_iter().map(Objective::from).collect())
        .unwrap_or_else(|reason| {
            note("objectives", reason);
            Vec::new()
        });

    let required_items = decode_list::<RequiredItem>(record.required_items.as_ref())
        .unwrap_or_else(|reason| {
            note("required_items", reason);
            Vec::new()
        });

    let goal_relevant = decode_flag(record.goal_relevant.as_ref()).unwrap_or_else(|reason| {
        note("goal_relevant", reason);
        true
    });

    Some(Quest {
        id: id.clone(),
        name,
        level_requirement,
        prerequisites,
        map,
        trader,
        goal_relevant,
        objectives,
        required_items,
        prerequisites_malformed,
    })
}

/// Ids arrive as strings or numbers.
fn decode_id(value: Option<&Value>) -> Result<QuestId, String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(QuestId::new(s.trim())),
        Some(Value::Number(n)) => Ok(QuestId::new(n.to_string())),
        None | Some(Value::String(_)) => Err("missing id".into()),
        Some(other) => Err(format!("unusable id {other}")),
    }
}

/// Absent means goal-relevant. Accepts booleans, 0/1 and their text forms.
fn decode_flag(value: Option<&Value>) -> Result<bool, String> {
    match value {
        None => Ok(true),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(format!("'{n}' is not a flag")),
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(format!("'{s}' is not a flag")),
        },
        Some(other) => Err(format!("unexpected value {other}")),
    }
}

fn decode_level(value: Option<&Value>) -> Result<u32, String> {
    let level = match value {
        None | Some(Value::Null) => return Ok(1),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| format!("'{n}' is not a non-negative integer"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("'{s}' is not a level: {e}"))?,
        Some(other) => return Err(format!("unexpected value {other}")),
    };
    match u32::try_from(level) {
        Ok(0) => Err("level 0 raised to 1".into()),
        Ok(level) => Ok(level),
        Err(_) => Err(format!("level {level} out of range")),
    }
}

fn decode_prerequisites(value: Option<&Value>) -> Result<Vec<QuestId>, String> {
    let entries: Vec<Value> = decode_list(value)?;
    entries
        .into_iter()
        .map(|entry| match entry {
            Value::String(s) if !s.trim().is_empty() => Ok(QuestId::new(s.trim())),
            Value::Number(n) => Ok(QuestId::new(n.to_string())),
            other => Err(format!("invalid prerequisite entry {other}")),
        })
        .collect()
}

/// Decode a list field that is either JSON text or an inline JSON array.
fn decode_list<T: DeserializeOwned>(value: Option<&Value>) -> Result<Vec<T>, String> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(Vec::new()),
        Some(Value::String(text)) => serde_json::from_str(text).map_err(|e| e.to_string()),
        Some(array @ Value::Array(_)) => {
            serde_json::from_value(array.clone()).map_err(|e| e.to_string())
        }
        Some(other) => Err(format!("expected a JSON array, got {other}")),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ObjectiveEntry {
    Text(String),
    Detailed(Objective),
}

impl From<ObjectiveEntry> for Objective {
    fn from(entry: ObjectiveEntry) -> Self {
        match entry {
            ObjectiveEntry::Text(description) => Objective {
                description,
                optional: false,
            },
            ObjectiveEntry::Detailed(objective) => objective,
        }
    }
}
