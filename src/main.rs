//! formsmith - interactive form builder shell
//!
//! Builds a form definition from typed commands on stdin, auto-saving to the
//! platform data directory and exporting JSON on request.

use anyhow::Result;
use formsmith::app::{App, Flow};
use formsmith::config::BuilderConfig;
use formsmith::notify::{
    read_stdin_line, Confirm, ConsoleConfirm, ConsoleNotifier, FixedConfirm, Severity,
};
use formsmith::shell;
use formsmith::state::FormStore;
use formsmith::storage::JsonFileStorage;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formsmith=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = BuilderConfig::load()?;
    let storage = JsonFileStorage::locate(config.data_dir.as_deref())?;
    tracing::info!("Using saved form at {}", storage.path().display());

    // --yes answers every confirmation, for scripted sessions
    let confirm: Box<dyn Confirm> = if std::env::args().skip(1).any(|arg| arg == "--yes") {
        Box::new(FixedConfirm(true))
    } else {
        Box::new(ConsoleConfirm)
    };

    let store = FormStore::new(Arc::new(storage), config.store_settings());
    let mut app = App::new(
        store,
        Box::new(ConsoleNotifier),
        confirm,
        config.export_dir(),
    );

    match app.store.load_saved().await {
        Ok(true) => app.notify(
            &format!("Restored \"{}\"", app.store.form_title()),
            Severity::Info,
        ),
        Ok(false) => {}
        Err(err) => app.notify(
            &format!("Could not restore the saved form: {err}"),
            Severity::Warning,
        ),
    }

    let result = run_shell(&mut app).await;

    if app.store.is_dirty() {
        if let Err(err) = app.save().await {
            tracing::warn!("Final save failed: {err}");
        }
    }

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_shell(app: &mut App) -> Result<()> {
    println!("formsmith - type \"help\" for commands");
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = read_stdin_line().await? else {
            return Ok(());
        };

        match shell::parse(&line) {
            Ok(Some(command)) => {
                if app.execute(command).await == Flow::Quit {
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(message) => app.notify(&message, Severity::Warning),
        }
    }
}
