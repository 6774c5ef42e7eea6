//! Wire types for the tracker service.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{ProgressSnapshot, ProgressSummary, QuestId};

/// `GET /api/progress` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressResponse {
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default, deserialize_with = "quest_ids")]
    pub completed_quests: Vec<QuestId>,
}

const fn default_level() -> u32 {
    1
}

/// `PUT /api/progress` body.
#[derive(Debug, Clone, Serialize)]
pub struct SaveRequest<'a> {
    pub level: u32,
    pub completed_quests: &'a [QuestId],
}

impl<'a> From<&'a ProgressSnapshot> for SaveRequest<'a> {
    fn from(snapshot: &'a ProgressSnapshot) -> Self {
        Self {
            level: snapshot.level,
            completed_quests: &snapshot.completed,
        }
    }
}

/// `PUT /api/progress` response.
///
/// `completed_quests` stays `None` when the service leaves it out, so a
/// stats-only answer never reads as "nothing completed".
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaveResponse {
    #[serde(default, deserialize_with = "optional_quest_ids")]
    pub completed_quests: Option<Vec<QuestId>>,
    #[serde(default)]
    pub stats: ProgressSummary,
}

/// Quest ids as strings or numbers; other entries are skipped.
fn quest_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<QuestId>, D::Error> {
    Ok(optional_quest_ids(deserializer)?.unwrap_or_default())
}

fn optional_quest_ids<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<QuestId>>, D::Error> {
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(entries.map(|entries| {
        entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(s) if !s.trim().is_empty() => Some(QuestId::new(s.trim())),
                Value::Number(n) => Some(QuestId::new(n.to_string())),
                _ => None,
            })
            .collect()
    }))
}

/// Error body, when the service sends one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "message")]
    pub error: Option<String>,
}
