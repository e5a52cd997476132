//! Episode records: one logged event per entry, owned by an account.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::input_validator::InputValidator;
use crate::core::store::{JsonCollection, Page, Record, StoreResult};

/// Highest accepted severity rating.
pub const MAX_SEVERITY: u8 = 10;

/// Descriptive fields of an episode, stored flattened next to the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeDetails {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Time of day, `HH:MM`.
    pub time: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 1 (mild) to 10 (severe).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aura: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_time: Option<String>,
    /// Free-form fields outside the schema, carried through rewrites as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: String,
    pub timestamp: String,
    pub owner: String,
    #[serde(flatten)]
    pub details: EpisodeDetails,
}

impl EpisodeRecord {
    /// Unsaved record; the store assigns `id` and `timestamp` on append.
    pub fn draft(owner: impl Into<String>, details: EpisodeDetails) -> Self {
        Self {
            id: String::new(),
            timestamp: String::new(),
            owner: owner.into(),
            details,
        }
    }
}

impl Record for EpisodeRecord {
    const KIND: &'static str = "episode";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "timestamp",
        "owner",
        "date",
        "time",
        "duration",
        "moods",
        "location",
        "companions",
        "notes",
        "severity",
        "trigger",
        "pre_activity",
        "medication",
        "aura",
        "recovery_time",
    ];
    const IMMUTABLE_FIELDS: &'static [&'static str] = &["id", "timestamp", "owner"];

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn assign_identity(&mut self, id: String, timestamp: String) {
        self.id = id;
        self.timestamp = timestamp;
    }

    fn field(&self, name: &str) -> Option<&str> {
        let d = &self.details;
        match name {
            "id" => Some(&self.id),
            "timestamp" => Some(&self.timestamp),
            "owner" => Some(&self.owner),
            "date" => Some(&d.date),
            "time" => Some(&d.time),
            "duration" => Some(&d.duration),
            "location" => d.location.as_deref(),
            "companions" => d.companions.as_deref(),
            "notes" => d.notes.as_deref(),
            "trigger" => d.trigger.as_deref(),
            "pre_activity" => d.pre_activity.as_deref(),
            "medication" => d.medication.as_deref(),
            "recovery_time" => d.recovery_time.as_deref(),
            other => d.extra.get(other).and_then(Value::as_str),
        }
    }
}

/// Caller input for a new episode, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeDraft {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub moods: Vec<String>,
    pub location: Option<String>,
    pub companions: Option<String>,
    pub notes: Option<String>,
    pub severity: Option<i64>,
    pub trigger: Option<String>,
    pub pre_activity: Option<String>,
    pub medication: Option<String>,
    pub aura: Option<bool>,
    pub recovery_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EpisodeDraft {
    /// Check required fields and formats; returns the normalized details.
    ///
    /// Extra fields pass through untouched, except identity names, which the
    /// store owns.
    pub fn validate(
        &self,
        validator: &InputValidator,
        today: NaiveDate,
    ) -> StoreResult<EpisodeDetails> {
        let date = validator.validate_date(&self.date, today)?;
        let time = validator.validate_time(&self.time)?;
        let duration = validator.validate_text("duration", &self.duration)?;

        let severity = match self.severity {
            Some(value) => {
                validator.validate_range("severity", value, 1, i64::from(MAX_SEVERITY))?;
                u8::try_from(value).ok()
            }
            None => None,
        };

        let mut moods = Vec::with_capacity(self.moods.len());
        for mood in &self.moods {
            if let Some(tag) = validator.validate_optional_text("moods", Some(mood))? {
                if !moods.contains(&tag) {
                    moods.push(tag);
                }
            }
        }

        Ok(EpisodeDetails {
            date,
            time,
            duration,
            moods,
            location: validator.validate_optional_text("location", self.location.as_deref())?,
            companions: validator
                .validate_optional_text("companions", self.companions.as_deref())?,
            notes: validator.validate_optional_text("notes", self.notes.as_deref())?,
            severity,
            trigger: validator.validate_optional_text("trigger", self.trigger.as_deref())?,
            pre_activity: validator
                .validate_optional_text("pre_activity", self.pre_activity.as_deref())?,
            medication: validator
                .validate_optional_text("medication", self.medication.as_deref())?,
            aura: self.aura,
            recovery_time: validator
                .validate_optional_text("recovery_time", self.recovery_time.as_deref())?,
            extra: self
                .extra
                .iter()
                .filter(|(key, _)| !EpisodeRecord::IMMUTABLE_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        })
    }
}

/// Totals shown on the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeSummary {
    pub total: usize,
    pub latest: Option<EpisodeRecord>,
}

/// The episode collection.
#[derive(Debug)]
pub struct EpisodeStore {
    collection: JsonCollection<EpisodeRecord>,
}

impl EpisodeStore {
    pub const COLLECTION: &'static str = "episodes";

    pub fn open(data_dir: impl AsRef<std::path::Path>) -> Self {
        Self {
            collection: JsonCollection::open(data_dir, Self::COLLECTION),
        }
    }

    pub fn collection(&self) -> &JsonCollection<EpisodeRecord> {
        &self.collection
    }

    pub async fn append(&self, owner: &str, details: EpisodeDetails) -> StoreResult<EpisodeRecord> {
        self.collection
            .append(EpisodeRecord::draft(owner, details))
            .await
    }

    pub async fn list(&self, owner: &str, page: Page) -> Vec<EpisodeRecord> {
        self.collection.list_by_owner(owner, page).await
    }

    pub async fn delete(&self, id: &str, owner: &str) -> StoreResult<bool> {
        self.collection.delete(id, owner).await
    }

    pub async fn summary(&self, owner: &str) -> EpisodeSummary {
        let episodes = self.collection.list_by_owner(owner, Page::all()).await;
        EpisodeSummary {
            total: episodes.len(),
            latest: episodes.into_iter().next(),
        }
    }
}
