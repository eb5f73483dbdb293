//! Trait abstraction for durable form storage to enable mocking in tests

use crate::error::StorageError;
use crate::state::FormData;
use async_trait::async_trait;

/// Where saved forms live between sessions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormStorage: Send + Sync {
    /// Persist the current form, replacing any previous save
    async fn persist(&self, form: &FormData) -> Result<(), StorageError>;

    /// Load the last saved form, if any
    async fn load(&self) -> Result<Option<FormData>, StorageError>;
}
