//! Per-notification record and the platform display seam.

use std::fmt;
use std::sync::{Arc, Weak};

use super::delegate::NotificationDelegate;
use super::options::NotificationOptions;
use super::presenter::WeakNotification;
use crate::error::Result;

/// Registry key for a notification. Handles are never reused, so a stale
/// handle can always be told apart from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationHandle(pub(crate) u64);

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notification#{}", self.0)
    }
}

/// Lifecycle state of a live notification. A destroyed notification has no
/// state: it is simply gone from the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    Created,
    Shown,
    /// Dismissed by the OS but still waiting for `remove`.
    Dismissed,
}

impl NotificationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Shown => "shown",
            Self::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for NotificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform display implementation for a single notification.
///
/// Backends report OS events through the `WeakNotification` passed to
/// `show`. They may do so synchronously from inside `show` or later from any
/// thread; events for notifications that are already gone are dropped.
pub trait NotificationBackend: Send {
    /// Puts the notification on screen. An error here is routed to the
    /// delegate's `notification_failed` and destroys the notification.
    fn show(&mut self, options: &NotificationOptions, events: WeakNotification) -> Result<()>;

    /// Asks the OS to take the notification down.
    fn dismiss(&mut self) -> Result<()>;

    /// Second-phase teardown for platforms where dismissal does not release
    /// everything.
    fn remove(&mut self) {}
}

pub(crate) struct Notification {
    pub(crate) notification_id: String,
    pub(crate) delegate: Option<Weak<dyn NotificationDelegate>>,
    /// `None` while a presenter call is running the backend outside the lock.
    pub(crate) backend: Option<Box<dyn NotificationBackend>>,
    pub(crate) options: Option<Arc<NotificationOptions>>,
    pub(crate) state: NotificationState,
    pub(crate) is_dismissed: bool,
}

impl Notification {
    pub(crate) fn new(
        notification_id: String,
        backend: Box<dyn NotificationBackend>,
        delegate: Option<Weak<dyn NotificationDelegate>>,
    ) -> Self {
        Self {
            notification_id,
            delegate,
            backend: Some(backend),
            options: None,
            state: NotificationState::Created,
            is_dismissed: false,
        }
    }

    /// The delegate, if one was attached and is still alive.
    pub(crate) fn delegate(&self) -> Option<Arc<dyn NotificationDelegate>> {
        self.delegate.as_ref().and_then(Weak::upgrade)
    }
}
