//! Builders for domain primitives used across tests.
//!
//! [`customs_records`] is the canonical raw catalog; [`customs_catalog`] is
//! the same catalog decoded. Quests in it:
//!
//! | id | trader | map | level | prerequisites |
//! |----|--------|-----|-------|---------------|
//! | debut | Prapor | Customs | 1 | none |
//! | shooting-cans | Prapor | Customs | 2 | debut |
//! | checking | Prapor | Customs | 5 | shooting-cans |
//! | gunsmith-1 | Mechanic | none | 2 | none |
//! | delivery | Therapist | Factory | 12 | none |
//! | ghost-hunt | Therapist | Interchange | 1 | unknown-quest |
//! | collector | Fence | none | 1 | none, not goal-relevant |

use serde_json::{json, Value};

use crate::domain::{Quest, QuestCatalog, RawQuestRecord, UserState};

/// A raw record with JSON-text list fields, as the catalog serves them.
pub fn record(id: &str, trader: &str, map: Option<&str>, level: u32, prerequisites: &[&str]) -> RawQuestRecord {
    RawQuestRecord {
        id: Some(json!(id)),
        name: Some(Value::String(title(id))),
        trader: Some(json!(trader)),
        map: map.map(Value::from),
        level_required: Some(json!(level)),
        prerequisites: Some(Value::String(json!(prerequisites).to_string())),
        objectives: Some(Value::String("[]".to_string())),
        required_items: Some(Value::String("[]".to_string())),
        goal_relevant: None,
        unreadable: None,
    }
}

pub fn customs_records() -> Vec<RawQuestRecord> {
    let mut collector = record("collector", "Fence", None, 1, &[]);
    collector.goal_relevant = Some(Value::Bool(false));

    vec![
        record("debut", "Prapor", Some("Customs"), 1, &[]),
        record("shooting-cans", "Prapor", Some("Customs"), 2, &["debut"]),
        record("checking", "Prapor", Some("Customs"), 5, &["shooting-cans"]),
        record("gunsmith-1", "Mechanic", None, 2, &[]),
        record("delivery", "Therapist", Some("Factory"), 12, &[]),
        record("ghost-hunt", "Therapist", Some("Interchange"), 1, &["unknown-quest"]),
        collector,
    ]
}

pub fn customs_catalog() -> QuestCatalog {
    QuestCatalog::decode(customs_records()).0
}

/// A level 1 quest on `map`.
pub fn quest(id: &str, map: &str) -> Quest {
    Quest::new(id, title(id)).with_map(map)
}

/// A linear chain `ids[0] -> ids[1] -> ...` on one map.
pub fn chain(map: &str, ids: &[&str]) -> QuestCatalog {
    QuestCatalog::from_quests(ids.iter().enumerate().map(|(i, id)| {
        let quest = quest(id, map);
        match i.checked_sub(1) {
            Some(prev) => quest.with_prerequisites([ids[prev]]),
            None => quest,
        }
    }))
}

/// A user at `level` with `completed` done.
pub fn user(level: u32, completed: &[&str]) -> UserState {
    UserState::with_completed(level, completed.iter().copied()).unwrap_or_default()
}

fn title(id: &str) -> String {
    id.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
