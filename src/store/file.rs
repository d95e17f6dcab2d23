use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::Mutex;

use super::{
    CompletionRecord, Profile, ProfileFields, RankedProfile, RecordStore, Records, StoreError,
};
use crate::path::UnitId;

/// Keeps every record in memory and rewrites the whole file after each write.
/// A write that fails to reach the disk leaves the in-memory records untouched.
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<Records>,
}

impl JsonFileStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No record file at {}, starting empty", path.display());
                Records::default()
            }
            Err(e) => return Err(e.into()),
        };
        info!(
            "Opened record store {} with {} profile(s)",
            path.display(),
            records.profiles.len()
        );
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    async fn write_with(&self, change: impl FnOnce(&mut Records)) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let mut updated = records.clone();
        change(&mut updated);
        self.persist(&updated).await?;
        *records = updated;
        Ok(())
    }

    async fn persist(&self, records: &Records) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Wrote records to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.records.lock().await.profile(user_id))
    }

    async fn upsert_profile(&self, user_id: &str, fields: ProfileFields) -> Result<(), StoreError> {
        self.write_with(|records| records.upsert_profile(user_id, fields))
            .await
    }

    async fn list_completed_units(&self, user_id: &str) -> Result<HashSet<UnitId>, StoreError> {
        Ok(self.records.lock().await.completed_units(user_id))
    }

    async fn record_completion(
        &self,
        user_id: &str,
        record: CompletionRecord,
    ) -> Result<(), StoreError> {
        self.write_with(|records| records.record_completion(user_id, record))
            .await
    }

    async fn top_profiles(&self, limit: usize) -> Result<Vec<RankedProfile>, StoreError> {
        Ok(self.records.lock().await.top_profiles(limit))
    }
}
