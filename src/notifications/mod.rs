//! Notification lifecycle: payload, delegate callbacks, the presenter that
//! owns live notifications, and the Windows toast backend.

#[cfg(windows)]
mod aumid;
mod delegate;
mod notification;
mod options;
mod presenter;
#[cfg(windows)]
mod toast;
#[cfg_attr(not(windows), allow(dead_code))]
mod toast_args;

#[cfg(windows)]
pub use aumid::{ensure_aumid_registered, register_activator_server};
pub use delegate::NotificationDelegate;
pub use notification::{NotificationBackend, NotificationHandle, NotificationState};
pub use options::{
    ActivationType, NotificationAction, NotificationIcon, NotificationOptions,
    NotificationOptionsBuilder,
};
pub use presenter::{NotificationPresenter, WeakNotification};
#[cfg(windows)]
pub use toast::WinrtToastBackend;
