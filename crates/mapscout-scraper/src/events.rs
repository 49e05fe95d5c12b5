//! One-way notifications from the worker to the control surface.

use tokio::sync::mpsc::UnboundedSender;

/// Severity/category tag carried by a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    /// Low-importance progress detail (zoom changes, skipped listings).
    Detail,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Log { level: LogLevel, message: String },
    /// `percent` is in `[0, 100]`.
    Progress { percent: f64, caption: String },
}

/// Emits [`RunEvent`]s and mirrors them to `tracing`.
///
/// Sending never blocks; events are dropped silently once the receiver is
/// gone.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<RunEvent>>,
}

impl EventSink {
    #[must_use]
    pub fn new(tx: UnboundedSender<RunEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that only logs through `tracing`.
    #[must_use]
    pub fn tracing_only() -> Self {
        Self { tx: None }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => tracing::info!("{message}"),
            LogLevel::Detail => tracing::debug!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        self.send(RunEvent::Log { level, message });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn detail(&self, message: impl Into<String>) {
        self.log(LogLevel::Detail, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn progress(&self, percent: f64, caption: impl Into<String>) {
        let percent = percent.clamp(0.0, 100.0);
        let caption = caption.into();
        tracing::debug!(percent, %caption, "progress");
        self.send(RunEvent::Progress { percent, caption });
    }

    fn send(&self, event: RunEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
