use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::config::ToastConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    #[default]
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToastId(u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    /// `None` for a toast that stays until dismissed.
    pub expires_at: Option<Duration>,
}

/// Transient notifications in display order.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    default_duration: Duration,
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new(config: &ToastConfig) -> Self {
        Self {
            default_duration: Duration::from_millis(config.default_duration_ms),
            next_id: 0,
            toasts: Vec::new(),
        }
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Shows a toast with the default lifetime.
    pub fn notify(&mut self, message: impl Into<String>, kind: ToastKind, now: Duration) -> ToastId {
        let duration = self.default_duration;
        self.show(message, kind, duration, now)
    }

    /// Shows a toast that is removed `duration` after `now`. A zero
    /// duration keeps it until dismissed.
    pub fn show(
        &mut self,
        message: impl Into<String>,
        kind: ToastKind,
        duration: Duration,
        now: Duration,
    ) -> ToastId {
        self.next_id += 1;
        let id = ToastId(self.next_id);
        let expires_at = (!duration.is_zero()).then(|| now + duration);
        self.toasts.push(Toast {
            id,
            message: message.into(),
            kind,
            expires_at,
        });
        tracing::debug!(%id, ?kind, "toast shown");
        id
    }

    /// Returns whether a toast was removed.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        before != self.toasts.len()
    }

    /// Drops expired toasts and returns how many were removed.
    pub fn tick(&mut self, now: Duration) -> usize {
        let before = self.toasts.len();
        self.toasts
            .retain(|toast| toast.expires_at.map_or(true, |at| now < at));
        before - self.toasts.len()
    }

    pub fn clear(&mut self) {
        self.toasts.clear();
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(&ToastConfig::default())
    }
}
