//! User-facing notifications for operation outcomes

use colored::Colorize;

use crate::error::Error;

/// Receives the outcome of grid mutations and report loads.
pub trait Notifier: Send + Sync {
    /// An operation succeeded; `message` is the server acknowledgement.
    fn success(&self, message: &str);

    /// An operation failed and the affected view kept its previous state.
    fn error(&self, err: &Error);
}

/// Prints notifications to stderr so stdout stays parseable
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        if !message.is_empty() {
            eprintln!("{} {}", "✓".green(), message);
        }
    }

    fn error(&self, err: &Error) {
        eprintln!("{} {}", "✗".red(), err);
    }
}

/// Collects notifications for assertions in tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub successes: std::sync::Mutex<Vec<String>>,
    pub errors: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, err: &Error) {
        self.errors.lock().unwrap().push(err.to_string());
    }
}
