//! Form builder state: the form model, its history and the store owning both

mod form;
mod history;
mod outcome;
mod store;

pub use form::*;
pub use history::{History, Snapshot, DEFAULT_HISTORY_LIMIT};
pub use outcome::{DenyReason, Outcome};
pub use store::{FormStore, StoreEvent, StoreSettings};
