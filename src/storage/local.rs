//! JSON file storage backend
//!
//! The current form is kept as a single pretty-printed JSON document in the
//! platform data directory.

use super::traits::FormStorage;
use crate::error::StorageError;
use crate::state::FormData;
use async_trait::async_trait;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the saved form inside the data directory
const SAVE_FILE: &str = "current-form.json";

/// Environment variable overriding the data directory
const DATA_DIR_ENV: &str = "FORMSMITH_DATA_DIR";

/// Stores the form as `current-form.json` under a directory
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Store inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SAVE_FILE),
        }
    }

    /// Resolve the data directory: explicit override, then `FORMSMITH_DATA_DIR`,
    /// then the platform data directory
    pub fn locate(dir_override: Option<&Path>) -> Result<Self, StorageError> {
        if let Some(dir) = dir_override {
            return Ok(Self::new(dir));
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return Ok(Self::new(dir));
        }
        ProjectDirs::from("io", "formsmith", "formsmith")
            .map(|dirs| Self::new(dirs.data_dir()))
            .ok_or(StorageError::NoDataDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FormStorage for JsonFileStorage {
    async fn persist(&self, form: &FormData) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = form.to_json_pretty()?;

        // Write beside the target and rename so a crash never leaves half a file
        let tmp = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!("Saved form to {}", self.path.display());
        Ok(())
    }

    async fn load(&self) -> Result<Option<FormData>, StorageError> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        let form = FormData::from_json(&content)?;
        Ok(Some(form))
    }
}
