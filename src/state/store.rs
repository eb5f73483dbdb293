//! The form store: owner of the form being built
//!
//! Every change to the form goes through [`FormStore`]. Mutations are
//! synchronous, return an [`Outcome`], and when applied record an undo
//! snapshot, mark the form dirty, notify subscribers and schedule an
//! auto-save.

use super::form::{
    normalize_title, submit_invariant_holds, Field, FieldUpdate, FormData, DEFAULT_FORM_TITLE,
};
use super::history::{History, Snapshot, DEFAULT_HISTORY_LIMIT};
use super::outcome::{DenyReason, Outcome};
use crate::autosave::{AutoSaveSettings, AutoSaver, SaveGate};
use crate::error::{StorageError, ValidationError};
use crate::storage::FormStorage;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Change notifications published to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Fields or title changed
    FormChanged,
    SelectionChanged(Option<String>),
    PreviewToggled(bool),
    Saved { automatic: bool },
    AutoSaveFailed(String),
    /// A saved form replaced the current one
    Loaded,
}

/// Construction-time store settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    pub history_limit: usize,
    pub auto_save_enabled: bool,
    pub auto_save: AutoSaveSettings,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            auto_save_enabled: true,
            auto_save: AutoSaveSettings::default(),
        }
    }
}

pub struct FormStore {
    fields: Vec<Field>,
    form_title: String,
    selected_field_id: Option<String>,
    is_preview_mode: bool,
    auto_save_enabled: bool,
    is_loading_form: bool,
    history: History,
    /// Bumped on every applied change; compared against the gate's saved revision
    revision: u64,
    save_gate: SaveGate,
    storage: Arc<dyn FormStorage>,
    auto_save_settings: AutoSaveSettings,
    auto_saver: Option<AutoSaver>,
    events: broadcast::Sender<StoreEvent>,
}

impl FormStore {
    pub fn new(storage: Arc<dyn FormStorage>, settings: StoreSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            fields: Vec::new(),
            form_title: DEFAULT_FORM_TITLE.to_string(),
            selected_field_id: None,
            is_preview_mode: false,
            auto_save_enabled: settings.auto_save_enabled,
            is_loading_form: false,
            history: History::new(settings.history_limit),
            revision: 0,
            save_gate: SaveGate::new(),
            storage,
            auto_save_settings: settings.auto_save,
            auto_saver: None,
            events,
        }
    }

    /// Receive a [`StoreEvent`] for every subsequent change
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn form_title(&self) -> &str {
        &self.form_title
    }

    pub fn selected_field_id(&self) -> Option<&str> {
        self.selected_field_id.as_deref()
    }

    pub fn selected_field(&self) -> Option<&Field> {
        self.selected_field_id.as_deref().and_then(|id| self.field(id))
    }

    pub fn is_preview_mode(&self) -> bool {
        self.is_preview_mode
    }

    /// Whether changes exist that have not reached storage
    pub fn is_dirty(&self) -> bool {
        self.revision != self.save_gate.saved_revision()
    }

    pub fn auto_save_enabled(&self) -> bool {
        self.auto_save_enabled
    }

    pub fn is_loading_form(&self) -> bool {
        self.is_loading_form
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Append a field, enforcing the submit button rules
    pub fn add_field(&mut self, field: Field) -> Outcome {
        if let Err(reason) = field.check() {
            return Outcome::Denied(reason);
        }
        if self.field(&field.id).is_some() {
            return Outcome::Denied(DenyReason::DuplicateId);
        }
        if field.is_submit() {
            if self.fields.iter().any(Field::is_submit) {
                return Outcome::Denied(DenyReason::DuplicateSubmit);
            }
            if self.fields.is_empty() {
                return Outcome::Denied(DenyReason::SubmitWithoutFields);
            }
        }

        tracing::debug!("Adding {} field {}", field.field_type, field.id);
        let before = self.snapshot();
        self.fields.push(field);
        self.commit(before)
    }

    pub fn update_field(&mut self, id: &str, update: &FieldUpdate) -> Outcome {
        let Some(index) = self.position(id) else {
            return Outcome::NotFound;
        };
        if update.is_empty() {
            return Outcome::Unchanged;
        }
        if let Err(reason) = update.check(&self.fields[index]) {
            return Outcome::Denied(reason);
        }

        let mut updated = self.fields[index].clone();
        if !update.apply(&mut updated) {
            return Outcome::Unchanged;
        }

        let before = self.snapshot();
        self.fields[index] = updated;
        self.commit(before)
    }

    pub fn remove_field(&mut self, id: &str) -> Outcome {
        let Some(index) = self.position(id) else {
            return Outcome::NotFound;
        };

        let mut remaining = self.fields.clone();
        remaining.remove(index);
        if !submit_invariant_holds(&remaining) {
            return Outcome::Denied(DenyReason::SubmitWouldBeOrphaned);
        }

        tracing::debug!("Removing field {id}");
        let before = self.snapshot();
        self.fields = remaining;
        if self.selected_field_id.as_deref() == Some(id) {
            self.select(None);
        }
        self.commit(before)
    }

    /// Insert a copy right after the source field and select it
    pub fn duplicate_field(&mut self, id: &str) -> Outcome {
        let Some(index) = self.position(id) else {
            return Outcome::NotFound;
        };
        if self.fields[index].is_submit() {
            return Outcome::Denied(DenyReason::CannotDuplicateSubmit);
        }

        let copy = self.fields[index].duplicate();
        let copy_id = copy.id.clone();
        let before = self.snapshot();
        self.fields.insert(index + 1, copy);
        self.select(Some(copy_id));
        self.commit(before)
    }

    /// Move a field to `to_index` on the canvas, clamped to the last position
    pub fn move_field(&mut self, id: &str, to_index: usize) -> Outcome {
        let Some(from) = self.position(id) else {
            return Outcome::NotFound;
        };
        let to = to_index.min(self.fields.len() - 1);
        if from == to {
            return Outcome::Unchanged;
        }

        let before = self.snapshot();
        let field = self.fields.remove(from);
        self.fields.insert(to, field);
        self.commit(before)
    }

    /// Change the selection; not recorded in history
    pub fn set_selected_field(&mut self, id: Option<&str>) -> Outcome {
        if let Some(id) = id {
            if self.position(id).is_none() {
                return Outcome::NotFound;
            }
        }
        if self.selected_field_id.as_deref() == id {
            return Outcome::Unchanged;
        }
        self.select(id.map(str::to_string));
        Outcome::Applied
    }

    /// Flip between editing and preview; not recorded in history
    pub fn toggle_preview_mode(&mut self) -> bool {
        self.is_preview_mode = !self.is_preview_mode;
        let _ = self
            .events
            .send(StoreEvent::PreviewToggled(self.is_preview_mode));
        self.is_preview_mode
    }

    /// Set the title, trimmed; a blank title becomes "Untitled Form"
    pub fn set_form_title(&mut self, title: &str) -> Outcome {
        let title = normalize_title(title);
        if title == self.form_title {
            return Outcome::Unchanged;
        }

        let before = self.snapshot();
        self.form_title = title;
        self.commit(before)
    }

    pub fn undo(&mut self) -> Outcome {
        let Some(previous) = self.history.undo(self.snapshot()) else {
            return Outcome::Unchanged;
        };
        self.restore(previous);
        self.changed();
        Outcome::Applied
    }

    pub fn redo(&mut self) -> Outcome {
        let Some(next) = self.history.redo(self.snapshot()) else {
            return Outcome::Unchanged;
        };
        self.restore(next);
        self.changed();
        Outcome::Applied
    }

    /// Deep copy of the current form definition
    pub fn export_form(&self) -> FormData {
        self.snapshot()
    }

    /// Replace the whole form with `data` after validating it.
    ///
    /// On error the store is left untouched.
    pub fn import_form(&mut self, mut data: FormData) -> Result<Outcome, ValidationError> {
        data.validate()?;
        data.form_title = normalize_title(&data.form_title);
        if data == self.snapshot() {
            return Ok(Outcome::Unchanged);
        }

        tracing::info!(
            "Importing form \"{}\" with {} fields",
            data.form_title,
            data.fields.len()
        );
        let before = self.snapshot();
        self.restore(data);
        Ok(self.commit(before))
    }

    /// Parse exported JSON and import it
    pub fn import_json(&mut self, json: &str) -> Result<Outcome, ValidationError> {
        let data = FormData::from_json(json)?;
        self.import_form(data)
    }

    /// Remove every field and reset the title
    pub fn clear_form(&mut self) -> Outcome {
        if self.fields.is_empty() && self.form_title == DEFAULT_FORM_TITLE {
            return Outcome::Unchanged;
        }

        let before = self.snapshot();
        self.fields.clear();
        self.form_title = DEFAULT_FORM_TITLE.to_string();
        self.select(None);
        self.commit(before)
    }

    /// Persist the current form and mark it clean.
    ///
    /// Waits for an auto-save already writing, so the newer form always lands
    /// last.
    pub async fn save_form(&mut self) -> Result<(), StorageError> {
        if let Some(saver) = &self.auto_saver {
            saver.cancel();
        }
        let form = self.export_form();
        self.save_gate
            .save(self.storage.as_ref(), self.revision, &form)
            .await?;

        tracing::info!("Saved form \"{}\"", self.form_title);
        let _ = self.events.send(StoreEvent::Saved { automatic: false });
        Ok(())
    }

    /// Replace the current form with the saved one, if storage has one.
    ///
    /// Loading is not undoable and leaves the form clean.
    pub async fn load_saved(&mut self) -> Result<bool, StorageError> {
        if let Some(saver) = &self.auto_saver {
            saver.cancel();
        }
        let gate = self.save_gate.clone();
        let _hold = gate.hold().await;

        self.is_loading_form = true;
        let loaded = self.storage.load().await;
        self.is_loading_form = false;

        let Some(form) = loaded? else {
            return Ok(false);
        };
        form.validate()?;

        self.restore(form);
        self.history.clear();
        self.revision += 1;
        gate.mark_saved(self.revision);
        tracing::info!(
            "Loaded saved form \"{}\" with {} fields",
            self.form_title,
            self.fields.len()
        );
        let _ = self.events.send(StoreEvent::Loaded);
        Ok(true)
    }

    /// Turn the auto-save policy on or off; turning it off drops a pending save
    pub fn set_auto_save_enabled(&mut self, enabled: bool) {
        if self.auto_save_enabled == enabled {
            return;
        }
        self.auto_save_enabled = enabled;
        if enabled {
            if self.is_dirty() {
                self.schedule_auto_save();
            }
        } else if let Some(saver) = &self.auto_saver {
            saver.cancel();
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == id)
    }

    fn snapshot(&self) -> Snapshot {
        FormData::new(self.form_title.clone(), self.fields.clone())
    }

    /// Swap in a snapshot, dropping a selection that no longer resolves
    fn restore(&mut self, snapshot: Snapshot) {
        self.fields = snapshot.fields;
        self.form_title = snapshot.form_title;
        let stale = self
            .selected_field_id
            .as_deref()
            .is_some_and(|id| self.position(id).is_none());
        if stale {
            self.select(None);
        }
    }

    fn select(&mut self, id: Option<String>) {
        self.selected_field_id = id.clone();
        let _ = self.events.send(StoreEvent::SelectionChanged(id));
    }

    fn commit(&mut self, before: Snapshot) -> Outcome {
        self.history.record(before);
        self.changed();
        Outcome::Applied
    }

    fn changed(&mut self) {
        self.revision += 1;
        let _ = self.events.send(StoreEvent::FormChanged);
        self.schedule_auto_save();
    }

    fn schedule_auto_save(&mut self) {
        if !self.auto_save_enabled || self.is_loading_form {
            return;
        }
        if self.auto_saver.is_none() {
            let Ok(runtime) = Handle::try_current() else {
                tracing::debug!("No async runtime, auto-save skipped");
                return;
            };
            self.auto_saver = Some(AutoSaver::spawn(
                &runtime,
                Arc::clone(&self.storage),
                self.auto_save_settings,
                self.save_gate.clone(),
                self.events.clone(),
            ));
        }
        if let Some(saver) = &self.auto_saver {
            saver.schedule(self.revision, self.snapshot());
        }
    }
}
