//! The record store holding profiles and completions.
//!
//! The core only depends on [`RecordStore`]; [`MemoryStore`] keeps records in
//! process and [`JsonFileStore`] writes them to a JSON file.

pub mod file;
pub mod memory;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::path::UnitId;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

pub type UserId = String;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub username: String,
    pub xp_total: u32,
}

/// A partial profile update; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub username: Option<String>,
    pub xp_total: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CompletionRecord {
    pub unit_id: UnitId,
    pub score: u8,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedProfile {
    pub user_id: UserId,
    pub username: String,
    pub xp_total: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record store data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("record store is unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Creates the profile if it does not exist yet.
    async fn upsert_profile(&self, user_id: &str, fields: ProfileFields) -> Result<(), StoreError>;

    async fn list_completed_units(&self, user_id: &str) -> Result<HashSet<UnitId>, StoreError>;

    /// At most one record is kept per user and unit; a repeat overwrites it.
    async fn record_completion(
        &self,
        user_id: &str,
        record: CompletionRecord,
    ) -> Result<(), StoreError>;

    /// Profiles by descending XP.
    async fn top_profiles(&self, limit: usize) -> Result<Vec<RankedProfile>, StoreError>;
}

/// The data behind both stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Records {
    #[serde(default)]
    pub profiles: HashMap<UserId, Profile>,
    #[serde(default)]
    pub completions: HashMap<UserId, HashMap<UnitId, CompletionRecord>>,
}

impl Records {
    pub fn profile(&self, user_id: &str) -> Option<Profile> {
        self.profiles.get(user_id).cloned()
    }

    pub fn upsert_profile(&mut self, user_id: &str, fields: ProfileFields) {
        let profile = self
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| Profile {
                username: user_id.to_string(),
                xp_total: 0,
            });
        if let Some(username) = fields.username {
            profile.username = username;
        }
        if let Some(xp_total) = fields.xp_total {
            profile.xp_total = xp_total;
        }
    }

    pub fn completed_units(&self, user_id: &str) -> HashSet<UnitId> {
        self.completions
            .get(user_id)
            .map(|units| units.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn completion(&self, user_id: &str, unit_id: &str) -> Option<&CompletionRecord> {
        self.completions.get(user_id)?.get(unit_id)
    }

    pub fn record_completion(&mut self, user_id: &str, record: CompletionRecord) {
        self.completions
            .entry(user_id.to_string())
            .or_default()
            .insert(record.unit_id.clone(), record);
    }

    pub fn top_profiles(&self, limit: usize) -> Vec<RankedProfile> {
        let mut ranked = self
            .profiles
            .iter()
            .map(|(user_id, profile)| RankedProfile {
                user_id: user_id.clone(),
                username: profile.username.clone(),
                xp_total: profile.xp_total,
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| {
            b.xp_total
                .cmp(&a.xp_total)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        ranked.truncate(limit);
        ranked
    }
}
