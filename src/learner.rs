//! Per-learner state shared by the bot handlers: profile, completion set and
//! the writes still owed to the record store.
//!
//! Completing a unit updates the local state first and writes second. When a
//! write fails it stays queued, the learner keeps the XP and the resume point,
//! and the write is retried before the next one goes out.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};
use tokio::sync::Mutex;

use crate::path::progress::{resolve, CompletionSet, PathBoard};
use crate::path::{LearningPath, LearningUnit, UnitId};
use crate::store::{
    CompletionRecord, Profile, ProfileFields, RankedProfile, RecordStore, StoreError, UserId,
};
use crate::xp;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingWrite {
    Completion(CompletionRecord),
    Profile(ProfileFields),
}

#[derive(Debug)]
pub struct CompletionReceipt {
    pub unit_id: UnitId,
    pub score: u8,
    pub earned_xp: u32,
    pub xp_total: u32,
    /// Set when the record store could not take the writes; they stay queued.
    pub sync_error: Option<StoreError>,
}

pub struct LearnerSession {
    user_id: UserId,
    profile: Profile,
    completed: CompletionSet,
    pending: VecDeque<PendingWrite>,
    store: Arc<dyn RecordStore>,
}

impl LearnerSession {
    /// Reads the learner's profile and completions, creating the profile on
    /// first contact.
    pub async fn load(
        store: Arc<dyn RecordStore>,
        user_id: impl Into<UserId>,
        username: &str,
    ) -> Result<Self, StoreError> {
        let user_id = user_id.into();
        let profile = match store.get_profile(&user_id).await? {
            Some(profile) => profile,
            None => {
                info!("Creating profile for user {} ({})", user_id, username);
                store
                    .upsert_profile(
                        &user_id,
                        ProfileFields {
                            username: Some(username.to_string()),
                            xp_total: Some(0),
                        },
                    )
                    .await?;
                Profile {
                    username: username.to_string(),
                    xp_total: 0,
                }
            }
        };
        let completed = CompletionSet::from_persisted(store.list_completed_units(&user_id).await?);
        info!(
            "Loaded session for user {} with {} XP and {} completed unit(s)",
            user_id,
            profile.xp_total,
            completed.len()
        );

        Ok(Self {
            user_id,
            profile,
            completed,
            pending: VecDeque::new(),
            store,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    pub fn board<'a>(&self, path: &'a LearningPath) -> PathBoard<'a> {
        resolve(path, &self.completed)
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    pub async fn rename(&mut self, username: &str) -> Result<(), StoreError> {
        self.profile.username = username.to_string();
        self.pending.push_back(PendingWrite::Profile(ProfileFields {
            username: Some(username.to_string()),
            xp_total: None,
        }));
        self.flush().await
    }

    /// Awards XP for a finished unit and records the completion. Completing a
    /// unit again awards XP again and replaces its earlier record.
    pub async fn complete_unit(
        &mut self,
        unit: &LearningUnit,
        score: u8,
        time_open: Duration,
    ) -> CompletionReceipt {
        let score = score.min(100);
        let earned_xp = xp::award(unit.xp_points, score, time_open);

        self.completed.mark_local(unit.id.clone());
        self.profile.xp_total += earned_xp;
        info!(
            "User {} completed {} with score {} for {} XP",
            self.user_id, unit.id, score, earned_xp
        );

        self.pending.push_back(PendingWrite::Completion(CompletionRecord {
            unit_id: unit.id.clone(),
            score,
            completed_at: Utc::now(),
        }));
        self.pending.push_back(PendingWrite::Profile(ProfileFields {
            username: None,
            xp_total: Some(self.profile.xp_total),
        }));

        let sync_error = self.flush().await.err();
        CompletionReceipt {
            unit_id: unit.id.clone(),
            score,
            earned_xp,
            xp_total: self.profile.xp_total,
            sync_error,
        }
    }

    pub async fn retry_pending(&mut self) -> Result<(), StoreError> {
        if !self.pending.is_empty() {
            info!(
                "Retrying {} pending write(s) for user {}",
                self.pending.len(),
                self.user_id
            );
        }
        self.flush().await
    }

    /// Re-reads completions from the store. Local completions stay put.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let persisted = self.store.list_completed_units(&self.user_id).await?;
        self.completed.merge_persisted(persisted);
        Ok(())
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<RankedProfile>, StoreError> {
        self.store.top_profiles(limit).await
    }

    async fn flush(&mut self) -> Result<(), StoreError> {
        while let Some(write) = self.pending.front() {
            let result = match write {
                PendingWrite::Completion(record) => {
                    self.store
                        .record_completion(&self.user_id, record.clone())
                        .await
                }
                PendingWrite::Profile(fields) => {
                    self.store
                        .upsert_profile(&self.user_id, fields.clone())
                        .await
                }
            };
            if let Err(e) = result {
                warn!(
                    "Record store write failed for user {} ({} pending): {}",
                    self.user_id,
                    self.pending.len(),
                    e
                );
                return Err(e);
            }
            if let Some(PendingWrite::Completion(record)) = self.pending.pop_front() {
                self.completed.mark_persisted(&record.unit_id);
            }
        }
        Ok(())
    }
}

/// One [`LearnerSession`] per user, loaded on first use.
pub struct SessionRegistry {
    store: Arc<dyn RecordStore>,
    sessions: Mutex<HashMap<UserId, Arc<Mutex<LearnerSession>>>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<Arc<Mutex<LearnerSession>>> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    pub async fn get_or_load(
        &self,
        user_id: &str,
        username: &str,
    ) -> Result<Arc<Mutex<LearnerSession>>, StoreError> {
        if let Some(session) = self.get(user_id).await {
            return Ok(session);
        }
        // The registry is not locked while the store is read. When two loads
        // for one user race, the first one inserted is kept.
        let loaded = LearnerSession::load(self.store.clone(), user_id, username).await?;
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(loaded)));
        Ok(session.clone())
    }

    pub async fn top_profiles(&self, limit: usize) -> Result<Vec<RankedProfile>, StoreError> {
        self.store.top_profiles(limit).await
    }
}
