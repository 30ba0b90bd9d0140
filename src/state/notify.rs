use std::time::{Duration, Instant};

/// How long a notice stays in the status bar.
const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    raised_at: Instant,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.raised_at) >= NOTICE_TTL
    }
}

/// Single notice slot; a newer notice replaces the older one.
#[derive(Debug, Default)]
pub struct Notifications {
    current: Option<Notice>,
}

impl Notifications {
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.raise(Severity::Error, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.raise(Severity::Success, message);
    }

    fn raise(&mut self, severity: Severity, message: String) {
        self.current = Some(Notice {
            severity,
            message,
            raised_at: Instant::now(),
        });
    }

    /// Current notice, if it has not expired yet.
    pub fn current(&self) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|n| !n.is_expired(Instant::now()))
    }
}
