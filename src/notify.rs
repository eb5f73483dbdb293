//! User-facing notification and confirmation seams
//!
//! The store never talks to the user directly; the application context
//! reports outcomes through a [`Notifier`] and gates destructive actions
//! behind a [`Confirm`].

use async_trait::async_trait;
use std::fmt;
use std::io::Write;

/// How a notification should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Error => "✗",
            Self::Info => "·",
            Self::Warning => "!",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        };
        f.write_str(name)
    }
}

/// Fire-and-forget message surface
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Yes/no question asked before destructive actions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Prints notifications to stdout
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        tracing::debug!(%severity, "{message}");
        println!("{} {}", severity.symbol(), message);
    }
}

/// Asks on the terminal and reads the answer from stdin
#[derive(Debug, Default)]
pub struct ConsoleConfirm;

#[async_trait]
impl Confirm for ConsoleConfirm {
    async fn confirm(&self, message: &str) -> bool {
        print!("{message} [y/N] ");
        let _ = std::io::stdout().flush();
        match read_stdin_line().await {
            Ok(Some(answer)) => is_yes(&answer),
            _ => false,
        }
    }
}

/// Always answers the same; for scripted sessions
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirm(pub bool);

#[async_trait]
impl Confirm for FixedConfirm {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

/// Read one line from stdin without blocking the runtime.
///
/// Goes through the process-wide std handle so the command loop and
/// confirmation prompts share a single buffer.
pub async fn read_stdin_line() -> std::io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let read = std::io::stdin().read_line(&mut line)?;
        Ok((read > 0).then_some(line))
    })
    .await
    .map_err(std::io::Error::other)?
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
