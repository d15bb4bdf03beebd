// ABOUTME: Terminal seams: interactive confirmation and progress markers.
// ABOUTME: Orchestrators depend on the Prompter and Progress traits, not on the terminal.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("read confirmation answer: {0}")]
    Io(#[from] io::Error),
}

/// Yes/no confirmation before destructive or long-running operations.
pub trait Prompter: Send + Sync {
    fn confirm(&self, message: &str, help: &str) -> Result<bool, PromptError>;
}

/// Reads answers from stdin. An empty answer means "no".
pub struct TermPrompter;

impl Prompter for TermPrompter {
    fn confirm(&self, message: &str, help: &str) -> Result<bool, PromptError> {
        if !help.is_empty() {
            eprintln!("{}", console::style(help).dim());
        }
        eprint!("{} [y/N]: ", console::style(message).bold());
        io::stderr().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().to_ascii_lowercase().starts_with('y'))
    }
}

/// Start/stop markers around long-running external calls. `stop` receives the
/// final message, already annotated as success or failure.
pub trait Progress: Send + Sync {
    fn start(&self, message: &str);
    fn stop(&self, message: &str);
}

/// Annotate a stop message as successful.
pub fn success(message: &str) -> String {
    format!("✔ {message}")
}

/// Annotate a stop message as failed.
pub fn failure(message: &str) -> String {
    format!("✘ {message}")
}

/// Spinner-backed progress display.
pub struct Spinner {
    bar: Mutex<Option<ProgressBar>>,
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for Spinner {
    fn start(&self, message: &str) {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message(message.to_string());
        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(bar);
    }

    fn stop(&self, message: &str) {
        if let Some(bar) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            bar.finish_and_clear();
        }
        println!("{message}");
    }
}
