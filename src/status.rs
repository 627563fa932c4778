use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

/// Holds the single message currently on screen.
///
/// Errors go to their own line; everything else goes to the status line.
/// Showing one kind hides the other.
#[derive(Debug, Default)]
pub struct StatusReporter {
    current: Option<StatusMessage>,
}

impl StatusReporter {
    pub fn show(&mut self, severity: Severity, text: impl Into<String>) {
        let text = text.into();
        match severity {
            Severity::Info | Severity::Success => tracing::info!("{}", text),
            Severity::Warning => tracing::warn!("{}", text),
            Severity::Error => tracing::error!("{}", text),
        }

        self.current = Some(StatusMessage {
            text,
            severity,
            shown_at: Instant::now(),
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.show(Severity::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.show(Severity::Success, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.show(Severity::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.show(Severity::Error, text);
    }

    /// Drop the message once it has been visible for `max_age`
    pub fn expire(&mut self, max_age: Duration) {
        if self.current.as_ref().is_some_and(|m| m.shown_at.elapsed() >= max_age) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    pub fn status_line(&self) -> Option<&StatusMessage> {
        self.current.as_ref().filter(|m| m.severity != Severity::Error)
    }

    pub fn error_line(&self) -> Option<&StatusMessage> {
        self.current.as_ref().filter(|m| m.severity == Severity::Error)
    }
}
