//! formsmith - headless core of a drag-and-drop form builder
//!
//! The [`state::FormStore`] owns the form being built and exposes CRUD,
//! undo/redo, JSON import/export, explicit save and debounced auto-save.
//! [`app::App`] wires it to storage, notifications and confirmation prompts.

pub mod app;
pub mod autosave;
pub mod config;
pub mod error;
pub mod notify;
pub mod shell;
pub mod state;
pub mod storage;
