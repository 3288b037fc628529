pub mod catalog;
pub mod config;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Snapshot flag raised by the simulation while the terminal may publish.
pub const FLAG_CAN_SHARE_NOW: &str = "can-share-now";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, rename = "shareTime", skip_serializing_if = "Option::is_none")]
    pub share_time: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author: None,
            share_time: None,
        }
    }
}

/// Authoritative news feed push. Articles are addressed by position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsSnapshot {
    #[serde(default)]
    pub items: Vec<Article>,
    #[serde(default)]
    pub extra_flags: BTreeMap<String, bool>,
}

impl NewsSnapshot {
    pub fn can_share_now(&self) -> bool {
        flag_set(&self.extra_flags, FLAG_CAN_SHARE_NOW)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechnologyId(String);

impl TechnologyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TechnologyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TechnologyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TechnologyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Technology {
    pub id: TechnologyId,
    pub name: String,
    #[serde(default)]
    pub tier: u32,
    #[serde(default)]
    pub discipline: String,
    #[serde(default)]
    pub cost: i64,
}

/// Research console push, split into two independently keyed partitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchSnapshot {
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub available: Vec<TechnologyId>,
    #[serde(default)]
    pub unlocked: Vec<TechnologyId>,
    #[serde(default)]
    pub extra_flags: BTreeMap<String, bool>,
}

fn flag_set(flags: &BTreeMap<String, bool>, name: &str) -> bool {
    flags.get(name).copied().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_snapshot_reads_wire_field_names() {
        let snapshot: NewsSnapshot = serde_json::from_str(
            r#"{
                "items": [
                    {"title": "Reactor fine", "content": "Mostly.", "author": "CE"},
                    {"title": "Cargo", "content": "Crates arrived", "shareTime": "2026-02-07T21:00:00Z"}
                ],
                "extraFlags": {"can-share-now": true}
            }"#,
        )
        .expect("parse snapshot");

        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].author.as_deref(), Some("CE"));
        assert!(snapshot.items[1].share_time.is_some());
        assert!(snapshot.can_share_now());
    }

    #[test]
    fn missing_share_flag_means_sharing_unavailable() {
        let snapshot: NewsSnapshot = serde_json::from_str(r#"{"items": []}"#).expect("parse");
        assert!(!snapshot.can_share_now());
    }

    #[test]
    fn technology_ids_compare_by_value() {
        let a = TechnologyId::from("SalvageWeapons");
        let b = TechnologyId::new(String::from("SalvageWeapons"));
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).expect("encode"), "\"SalvageWeapons\"");
    }
}
