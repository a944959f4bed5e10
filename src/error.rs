use thiserror::Error;

use crate::notifications::NotificationHandle;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification not found: {0}")]
    NotFound(NotificationHandle),

    #[error("Invalid transition for {handle}: cannot {action} while {state}")]
    InvalidTransition {
        handle: NotificationHandle,
        action: &'static str,
        state: &'static str,
    },

    #[error("Activation type \"system\" is reserved for the internal dismiss action (action {0})")]
    ReservedActivationType(usize),

    #[error("Activation type \"system\" is reserved for the internal dismiss action")]
    ReservedSystemActivation,

    #[error("Display error: {0}")]
    Display(String),

    #[error("COM registration error (0x{code:08X}): {message}")]
    Registration { code: u32, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl serde::Serialize for NotificationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<anyhow::Error> for NotificationError {
    fn from(err: anyhow::Error) -> Self {
        NotificationError::Other(err.to_string())
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for NotificationError {
    fn from(err: windows::core::Error) -> Self {
        NotificationError::Registration {
            code: err.code().0 as u32,
            message: err.message().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NotificationError>;
