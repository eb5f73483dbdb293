//! Application context and command dispatch
//!
//! [`App`] threads the store and the user-facing collaborators together. It
//! owns the file boundary (import and export), turns store outcomes into
//! notifications, and gates destructive actions behind confirmation.

use crate::error::FormError;
use crate::notify::{Confirm, Notifier, Severity};
use crate::shell::{Command, HELP};
use crate::state::{export_file_name, Field, FieldUpdate, FormStore, Outcome};
use chrono::Local;
use std::path::{Path, PathBuf};

/// Whether the shell loop should keep reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub store: FormStore,
    notifier: Box<dyn Notifier>,
    confirm: Box<dyn Confirm>,
    export_dir: PathBuf,
}

impl App {
    pub fn new(
        store: FormStore,
        notifier: Box<dyn Notifier>,
        confirm: Box<dyn Confirm>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            notifier,
            confirm,
            export_dir,
        }
    }

    pub fn notify(&self, message: &str, severity: Severity) {
        self.notifier.notify(message, severity);
    }

    /// Read, validate and import a form file; state is unchanged on failure
    pub async fn import_file(&mut self, path: &Path) -> Result<Outcome, FormError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read {}: {err}", path.display());
                self.notify(
                    &format!("Could not read {}: {err}", path.display()),
                    Severity::Error,
                );
                return Err(err.into());
            }
        };

        match self.store.import_json(&content) {
            Ok(outcome) => {
                match outcome {
                    Outcome::Applied => self.notify("Form imported", Severity::Success),
                    _ => self.notify("Form is already up to date", Severity::Info),
                }
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!("Rejected import of {}: {err}", path.display());
                self.notify(&format!("Invalid form file: {err}"), Severity::Error);
                Err(err.into())
            }
        }
    }

    /// Write `form-<date>.json` into `dir` (or the configured export directory)
    pub async fn export_file(&self, dir: Option<&Path>) -> Result<PathBuf, FormError> {
        let dir = dir.unwrap_or(self.export_dir.as_path());
        let path = dir.join(export_file_name(Local::now().date_naive()));

        let result = async {
            let json = self.store.export_form().to_json_pretty()?;
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, json).await?;
            Ok::<_, FormError>(())
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!("Exported form to {}", path.display());
                self.notify(
                    &format!("Exported to {}", path.display()),
                    Severity::Success,
                );
                Ok(path)
            }
            Err(err) => {
                self.notify(&format!("Export failed: {err}"), Severity::Error);
                Err(err)
            }
        }
    }

    /// Ask before clearing; the store itself never prompts
    pub async fn clear_with_confirmation(&mut self) -> Outcome {
        if self.store.export_form().is_empty() {
            return Outcome::Unchanged;
        }
        if !self
            .confirm
            .confirm("Clear the whole form? This can be undone.")
            .await
        {
            self.notify("Clear cancelled", Severity::Info);
            return Outcome::Unchanged;
        }
        let outcome = self.store.clear_form();
        self.report(outcome, "Form cleared");
        outcome
    }

    pub async fn save(&mut self) -> Result<(), FormError> {
        match self.store.save_form().await {
            Ok(()) => {
                self.notify("Form saved", Severity::Success);
                Ok(())
            }
            Err(err) => {
                self.notify(&format!("Save failed: {err}"), Severity::Error);
                Err(err.into())
            }
        }
    }

    /// Surface denials and unknown ids; applied changes stay quiet unless
    /// `success` is non-empty
    fn report(&self, outcome: Outcome, success: &str) {
        match outcome {
            Outcome::Applied if !success.is_empty() => self.notify(success, Severity::Success),
            Outcome::Applied | Outcome::Unchanged => {}
            Outcome::NotFound => self.notify("No such field", Severity::Warning),
            Outcome::Denied(reason) => self.notify(reason.message(), Severity::Warning),
        }
    }

    /// Resolve a field reference: an id, or a 1-based canvas position
    fn resolve(&self, reference: &str) -> Option<String> {
        if let Some(field) = self.store.field(reference) {
            return Some(field.id.clone());
        }
        let position = reference.parse::<usize>().ok()?.checked_sub(1)?;
        self.store.fields().get(position).map(|f| f.id.clone())
    }

    fn update(&mut self, reference: &str, update: FieldUpdate) {
        let outcome = match self.resolve(reference) {
            Some(id) => self.store.update_field(&id, &update),
            None => Outcome::NotFound,
        };
        self.report(outcome, "");
    }

    /// Run one shell command
    pub async fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::Add { field_type, label } => {
                let field = match label {
                    Some(label) => Field::with_label(field_type, &label),
                    None => Field::new(field_type),
                };
                let label = field.label.clone();
                let outcome = self.store.add_field(field);
                self.report(outcome, &format!("Added \"{label}\""));
            }
            Command::Label { field, label } => self.update(&field, FieldUpdate::label(label)),
            Command::Placeholder { field, placeholder } => {
                self.update(&field, FieldUpdate::placeholder(placeholder))
            }
            Command::Required { field, required } => {
                self.update(&field, FieldUpdate::required(required))
            }
            Command::Options { field, options } => {
                self.update(&field, FieldUpdate::options(options))
            }
            Command::Remove(reference) => {
                let outcome = match self.resolve(&reference) {
                    Some(id) => self.store.remove_field(&id),
                    None => Outcome::NotFound,
                };
                self.report(outcome, "Field removed");
            }
            Command::Duplicate(reference) => {
                let outcome = match self.resolve(&reference) {
                    Some(id) => self.store.duplicate_field(&id),
                    None => Outcome::NotFound,
                };
                self.report(outcome, "Field duplicated");
            }
            Command::Move { field, position } => {
                let outcome = match self.resolve(&field) {
                    Some(id) => self.store.move_field(&id, position - 1),
                    None => Outcome::NotFound,
                };
                self.report(outcome, "");
            }
            Command::Select(reference) => {
                let outcome = match reference {
                    None => self.store.set_selected_field(None),
                    Some(reference) => match self.resolve(&reference) {
                        Some(id) => self.store.set_selected_field(Some(&id)),
                        None => Outcome::NotFound,
                    },
                };
                self.report(outcome, "");
            }
            Command::Title(title) => {
                if self.store.set_form_title(&title).is_applied() {
                    let message = format!("Title set to \"{}\"", self.store.form_title());
                    self.notify(&message, Severity::Info);
                }
            }
            Command::Undo => {
                if !self.store.undo().is_applied() {
                    self.notify("Nothing to undo", Severity::Info);
                }
            }
            Command::Redo => {
                if !self.store.redo().is_applied() {
                    self.notify("Nothing to redo", Severity::Info);
                }
            }
            Command::Preview => {
                let on = self.store.toggle_preview_mode();
                let mode = if on { "Preview" } else { "Edit" };
                self.notify(&format!("{mode} mode"), Severity::Info);
            }
            Command::Save => {
                let _ = self.save().await;
            }
            Command::AutoSave(enabled) => {
                self.store.set_auto_save_enabled(enabled);
                let state = if enabled { "on" } else { "off" };
                self.notify(&format!("Auto-save {state}"), Severity::Info);
            }
            Command::Export(dir) => {
                let _ = self.export_file(dir.as_deref()).await;
            }
            Command::Import(path) => {
                let _ = self.import_file(&path).await;
            }
            Command::Clear => {
                self.clear_with_confirmation().await;
            }
            Command::List => println!("{}", self.render_list()),
            Command::Show => match self.store.export_form().to_json_pretty() {
                Ok(json) => println!("{json}"),
                Err(err) => self.notify(&format!("Could not render form: {err}"), Severity::Error),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Canvas listing, or the filled-in look of the form in preview mode
    pub fn render_list(&self) -> String {
        let store = &self.store;
        let mut out = String::new();
        let dirty = if store.is_dirty() { " *" } else { "" };
        out.push_str(&format!("{}{dirty}\n", store.form_title()));

        if store.fields().is_empty() {
            out.push_str("  (no fields)");
            return out;
        }

        for (index, field) in store.fields().iter().enumerate() {
            let marker = if store.selected_field_id() == Some(field.id.as_str()) {
                '>'
            } else {
                ' '
            };
            let required = if field.required { " *" } else { "" };
            if store.is_preview_mode() {
                let hint = field
                    .placeholder
                    .as_deref()
                    .map(|p| format!(" [{p}]"))
                    .unwrap_or_default();
                let options = field
                    .options
                    .as_ref()
                    .map(|o| format!(" ({})", o.join(" / ")))
                    .unwrap_or_default();
                out.push_str(&format!("  {}{required}{hint}{options}\n", field.label));
            } else {
                out.push_str(&format!(
                    "{marker}{:>3}. {:<12} {}{required}  [{}]\n",
                    index + 1,
                    field.field_type.as_str(),
                    field.label,
                    field.id
                ));
            }
        }
        out.truncate(out.trim_end().len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{MockConfirm, MockNotifier};
    use crate::state::{FieldType, StoreSettings};
    use crate::storage::MemoryStorage;
    use mockall::predicate::{always, eq};
    use std::sync::Arc;
    use uuid::Uuid;

    fn store() -> FormStore {
        FormStore::new(
            Arc::new(MemoryStorage::new()),
            StoreSettings {
                auto_save_enabled: false,
                ..Default::default()
            },
        )
    }

    fn quiet_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().returning(|_, _| ());
        notifier
    }

    fn app_with(notifier: MockNotifier, confirm: MockConfirm) -> App {
        App::new(
            store(),
            Box::new(notifier),
            Box::new(confirm),
            scratch_dir(),
        )
    }

    fn app() -> App {
        app_with(quiet_notifier(), MockConfirm::new())
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("formsmith-app-{}", Uuid::new_v4()))
    }

    mod import {
        use super::*;

        #[tokio::test]
        async fn test_valid_file_is_imported_and_reported() {
            let dir = scratch_dir();
            std::fs::create_dir_all(&dir).unwrap();
            let path = dir.join("form.json");
            std::fs::write(
                &path,
                r#"{"formTitle": "Signup", "fields": [{"id": "f1", "type": "text", "label": "Name"}]}"#,
            )
            .unwrap();

            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .with(eq("Form imported"), eq(Severity::Success))
                .times(1)
                .returning(|_, _| ());
            let mut app = app_with(notifier, MockConfirm::new());

            let outcome = app.import_file(&path).await.unwrap();
            assert_eq!(outcome, Outcome::Applied);
            assert_eq!(app.store.form_title(), "Signup");
            assert_eq!(app.store.fields().len(), 1);

            let _ = std::fs::remove_dir_all(dir);
        }

        #[tokio::test]
        async fn test_invalid_file_is_reported_and_ignored() {
            let dir = scratch_dir();
            std::fs::create_dir_all(&dir).unwrap();
            let path = dir.join("bad.json");
            std::fs::write(&path, r#"{"fields": [{"type": "text", "label": "x"}]}"#).unwrap();

            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .withf(|message, severity| {
                    message.starts_with("Invalid form file") && *severity == Severity::Error
                })
                .times(1)
                .returning(|_, _| ());
            let mut app = app_with(notifier, MockConfirm::new());
            app.store.add_field(Field::with_label(FieldType::Text, "Keep"));

            let err = app.import_file(&path).await.unwrap_err();
            assert!(matches!(err, FormError::Validation(_)));
            assert_eq!(app.store.fields().len(), 1);
            assert_eq!(app.store.fields()[0].label, "Keep");

            let _ = std::fs::remove_dir_all(dir);
        }

        #[tokio::test]
        async fn test_unreadable_file_is_reported() {
            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .with(always(), eq(Severity::Error))
                .times(1)
                .returning(|_, _| ());
            let mut app = app_with(notifier, MockConfirm::new());

            let err = app
                .import_file(&scratch_dir().join("missing.json"))
                .await
                .unwrap_err();
            assert!(matches!(err, FormError::Io(_)));
        }
    }

    mod export {
        use super::*;

        #[tokio::test]
        async fn test_export_writes_dated_file() {
            let mut app = app();
            app.store.set_form_title("Contact");
            app.store.add_field(Field::with_label(FieldType::Email, "Email"));

            let dir = scratch_dir();
            let path = app.export_file(Some(&dir)).await.unwrap();

            let name = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("form-") && name.ends_with(".json"));
            assert_eq!(name.len(), "form-2024-01-01.json".len());

            let written = std::fs::read_to_string(&path).unwrap();
            assert!(written.contains("  \"formTitle\": \"Contact\""));
            let mut imported = store();
            imported.import_json(&written).unwrap();
            assert_eq!(imported.export_form(), app.store.export_form());

            let _ = std::fs::remove_dir_all(dir);
        }
    }

    mod clear {
        use super::*;

        #[tokio::test]
        async fn test_declined_confirmation_keeps_form() {
            let mut confirm = MockConfirm::new();
            confirm.expect_confirm().times(1).returning(|_| false);
            let mut app = app_with(quiet_notifier(), confirm);
            app.store.add_field(Field::new(FieldType::Text));

            assert_eq!(app.clear_with_confirmation().await, Outcome::Unchanged);
            assert_eq!(app.store.fields().len(), 1);
        }

        #[tokio::test]
        async fn test_accepted_confirmation_clears() {
            let mut confirm = MockConfirm::new();
            confirm.expect_confirm().times(1).returning(|_| true);
            let mut app = app_with(quiet_notifier(), confirm);
            app.store.add_field(Field::new(FieldType::Text));

            assert_eq!(app.clear_with_confirmation().await, Outcome::Applied);
            assert!(app.store.fields().is_empty());
        }

        #[tokio::test]
        async fn test_empty_form_skips_prompt() {
            let mut confirm = MockConfirm::new();
            confirm.expect_confirm().times(0);
            let mut app = app_with(quiet_notifier(), confirm);

            assert_eq!(app.clear_with_confirmation().await, Outcome::Unchanged);
        }
    }

    mod commands {
        use super::*;
        use crate::shell::parse;

        async fn run(app: &mut App, line: &str) -> Flow {
            let command = parse(line).unwrap().unwrap();
            app.execute(command).await
        }

        #[tokio::test]
        async fn test_positions_resolve_to_fields() {
            let mut app = app();
            run(&mut app, "add text Name").await;
            run(&mut app, "add email").await;
            run(&mut app, "label 2 Work email").await;
            run(&mut app, "required 1 on").await;
            run(&mut app, "move 2 1").await;

            let fields = app.store.fields();
            assert_eq!(fields[0].label, "Work email");
            assert_eq!(fields[1].label, "Name");
            assert!(fields[1].required);
        }

        #[tokio::test]
        async fn test_denied_submit_is_reported() {
            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .with(
                    eq("Add at least one field before the submit button"),
                    eq(Severity::Warning),
                )
                .times(1)
                .returning(|_, _| ());
            let mut app = app_with(notifier, MockConfirm::new());

            run(&mut app, "add submit").await;
            assert!(app.store.fields().is_empty());
        }

        #[tokio::test]
        async fn test_unknown_field_is_reported() {
            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .with(eq("No such field"), eq(Severity::Warning))
                .times(1)
                .returning(|_, _| ());
            let mut app = app_with(notifier, MockConfirm::new());

            run(&mut app, "remove 3").await;
        }

        #[tokio::test]
        async fn test_undo_redo_and_quit() {
            let mut app = app();
            run(&mut app, "add checkbox Agree").await;
            run(&mut app, "undo").await;
            assert!(app.store.fields().is_empty());
            run(&mut app, "redo").await;
            assert_eq!(app.store.fields().len(), 1);
            assert_eq!(run(&mut app, "quit").await, Flow::Quit);
        }

        #[tokio::test]
        async fn test_title_change_is_reported_once() {
            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .with(eq("Title set to \"Feedback\""), eq(Severity::Info))
                .times(1)
                .returning(|_, _| ());
            let mut app = app_with(notifier, MockConfirm::new());

            run(&mut app, "title  Feedback ").await;
            run(&mut app, "title Feedback").await;
            assert_eq!(app.store.form_title(), "Feedback");
        }

        #[tokio::test]
        async fn test_save_marks_clean() {
            let mut app = app();
            run(&mut app, "title Feedback").await;
            assert!(app.store.is_dirty());
            run(&mut app, "save").await;
            assert!(!app.store.is_dirty());
        }
    }

    mod listing {
        use super::*;

        #[test]
        fn test_empty_listing() {
            let app = app();
            assert_eq!(app.render_list(), "Untitled Form\n  (no fields)");
        }

        #[test]
        fn test_listing_marks_selection_and_required() {
            let mut app = app();
            let mut field = Field::with_label(FieldType::Text, "Name");
            field.id = "f1".to_string();
            field.required = true;
            app.store.add_field(field);
            app.store.set_selected_field(Some("f1"));

            let listing = app.render_list();
            assert!(listing.starts_with("Untitled Form *\n"));
            assert!(listing.contains(">  1. text         Name *  [f1]"));
        }

        #[test]
        fn test_preview_listing_shows_options() {
            let mut app = app();
            app.store.add_field(Field::with_label(FieldType::Radio, "Size"));
            app.store.toggle_preview_mode();

            let listing = app.render_list();
            assert!(listing.contains("Size (Option 1 / Option 2 / Option 3)"));
        }
    }
}
