//! File-backed stand-in for the browser's local storage.
//!
//! Holds two keys: `userId`, the opaque id of the signed-in user, and
//! `hackathons`, the last displayed recommendation list handed to the
//! detail view.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::RecsError;
use crate::model::{RecommendationRecord, UserId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredState {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hackathons: Option<Vec<RecommendationRecord>>,
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LocalStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StoredState, RecsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(StoredState::default()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredState::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, state: &StoredState) -> Result<(), RecsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(state)?).await?;
        Ok(())
    }

    /// Stored user id, if someone is signed in.
    ///
    /// A corrupt store file reads as signed out rather than failing.
    pub async fn user_id(&self) -> Option<UserId> {
        match self.read().await {
            Ok(state) => state.user_id,
            Err(e) => {
                warn!("Ignoring unreadable store {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub async fn set_user_id(&self, id: &UserId) -> Result<(), RecsError> {
        let mut state = self.read().await.unwrap_or_default();
        state.user_id = Some(id.clone());
        self.write(&state).await?;
        debug!("Stored user id {}", id);
        Ok(())
    }

    /// Forget the signed-in user and anything cached for them
    pub async fn clear(&self) -> Result<(), RecsError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save_hackathons(&self, records: &[RecommendationRecord]) -> Result<(), RecsError> {
        let mut state = self.read().await.unwrap_or_default();
        state.hackathons = Some(records.to_vec());
        self.write(&state).await
    }

    pub async fn load_hackathons(&self) -> Result<Vec<RecommendationRecord>, RecsError> {
        Ok(self.read().await?.hackathons.unwrap_or_default())
    }
}
