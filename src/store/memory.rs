use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    CompletionRecord, Profile, ProfileFields, RankedProfile, RecordStore, Records, StoreError,
};
use crate::path::UnitId;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Records) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn records(&self) -> Records {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.records.read().await.profile(user_id))
    }

    async fn upsert_profile(&self, user_id: &str, fields: ProfileFields) -> Result<(), StoreError> {
        self.records.write().await.upsert_profile(user_id, fields);
        Ok(())
    }

    async fn list_completed_units(&self, user_id: &str) -> Result<HashSet<UnitId>, StoreError> {
        Ok(self.records.read().await.completed_units(user_id))
    }

    async fn record_completion(
        &self,
        user_id: &str,
        record: CompletionRecord,
    ) -> Result<(), StoreError> {
        self.records.write().await.record_completion(user_id, record);
        Ok(())
    }

    async fn top_profiles(&self, limit: usize) -> Result<Vec<RankedProfile>, StoreError> {
        Ok(self.records.read().await.top_profiles(limit))
    }
}
