//! In-process storage backend

use super::traits::FormStorage;
use crate::error::StorageError;
use crate::state::FormData;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps the saved form in memory; used for ephemeral sessions and tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: Mutex<Option<FormData>>,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously saved form
    pub fn with_form(form: FormData) -> Self {
        Self {
            saved: Mutex::new(Some(form)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful `persist` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Option<FormData> {
        self.saved.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl FormStorage for MemoryStorage {
    async fn persist(&self, form: &FormData) -> Result<(), StorageError> {
        if let Ok(mut guard) = self.saved.lock() {
            *guard = Some(form.clone());
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<Option<FormData>, StorageError> {
        Ok(self.saved())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_then_load() {
        let storage = MemoryStorage::new();
        assert!(storage.load().await.unwrap().is_none());

        let form = FormData::new("Saved", Vec::new());
        storage.persist(&form).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), Some(form));
        assert_eq!(storage.save_count(), 1);
    }

    #[tokio::test]
    async fn test_with_form_does_not_count_as_save() {
        let storage = MemoryStorage::with_form(FormData::default());
        assert!(storage.load().await.unwrap().is_some());
        assert_eq!(storage.save_count(), 0);
    }
}
