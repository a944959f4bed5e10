//! Notification payload: title, body, icon, actions and platform hints.
//!
//! Options are built once and handed to `NotificationPresenter::show`. The
//! presenter keeps its own copy, so later edits by the caller never reach a
//! toast that is already on screen.

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::{NotificationError, Result};

/// How Windows should route a toast button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationType {
    #[default]
    Foreground,
    Background,
    Protocol,
    /// Only used for the dismiss button synthesized from `close_button_text`.
    System,
}

impl ActivationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::Background => "background",
            Self::Protocol => "protocol",
            Self::System => "system",
        }
    }
}

impl FromStr for ActivationType {
    type Err = NotificationError;

    /// Parses a caller-supplied activation type. Empty or unknown values
    /// fall back to `Foreground`; `"system"` is refused.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "background" => Ok(Self::Background),
            "protocol" => Ok(Self::Protocol),
            "system" => Err(NotificationError::ReservedSystemActivation),
            _ => Ok(Self::Foreground),
        }
    }
}

impl fmt::Display for ActivationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActivationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A toast action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub activation_type: ActivationType,
}

impl NotificationAction {
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            activation_type: ActivationType::Foreground,
        }
    }

    /// Builds an action from a raw activation type string as received from
    /// application code.
    pub fn with_activation_type(
        kind: impl Into<String>,
        text: impl Into<String>,
        activation_type: &str,
    ) -> Result<Self> {
        Ok(Self {
            kind: kind.into(),
            text: text.into(),
            activation_type: activation_type.parse()?,
        })
    }

    pub(crate) fn system_dismiss(text: &str) -> Self {
        Self {
            kind: "button".to_string(),
            text: text.to_string(),
            activation_type: ActivationType::System,
        }
    }

    pub fn is_system(&self) -> bool {
        self.activation_type == ActivationType::System
    }
}

/// Notification icon, either still to be fetched or already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationIcon {
    Url(Url),
    Bitmap(RgbaImage),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationOptions {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub tag: String,
    pub silent: bool,
    pub icon: Option<NotificationIcon>,
    pub has_reply: bool,
    pub reply_placeholder: String,
    pub sound: String,
    /// Linux urgency hint
    pub urgency: String,
    pub timeout_type: String,
    pub actions: Vec<NotificationAction>,
    pub close_button_text: String,
    pub toast_xml: String,
}

impl NotificationOptions {
    pub fn builder(title: impl Into<String>) -> NotificationOptionsBuilder {
        NotificationOptionsBuilder::new(title)
    }

    /// Rejects payloads that could not have come from a well-behaved caller.
    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self.actions.iter().position(NotificationAction::is_system) {
            return Err(NotificationError::ReservedActivationType(index));
        }
        Ok(())
    }

    /// Placeholder text for the inline reply box, if one is requested.
    pub fn reply_placeholder(&self) -> Option<&str> {
        self.has_reply.then_some(self.reply_placeholder.as_str())
    }

    /// Actions as they should be rendered: the caller's buttons followed by
    /// the synthesized dismiss button when `close_button_text` is set.
    pub fn effective_actions(&self) -> Vec<NotificationAction> {
        let mut actions = self.actions.clone();
        if !self.close_button_text.is_empty() {
            actions.push(NotificationAction::system_dismiss(&self.close_button_text));
        }
        actions
    }
}

pub struct NotificationOptionsBuilder {
    options: NotificationOptions,
}

impl NotificationOptionsBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            options: NotificationOptions {
                title: title.into(),
                ..Default::default()
            },
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.options.subtitle = subtitle.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.options.body = body.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.options.tag = tag.into();
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.options.silent = silent;
        self
    }

    pub fn icon(mut self, icon: NotificationIcon) -> Self {
        self.options.icon = Some(icon);
        self
    }

    pub fn reply(mut self, placeholder: impl Into<String>) -> Self {
        self.options.has_reply = true;
        self.options.reply_placeholder = placeholder.into();
        self
    }

    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.options.sound = sound.into();
        self
    }

    pub fn urgency(mut self, urgency: impl Into<String>) -> Self {
        self.options.urgency = urgency.into();
        self
    }

    pub fn timeout_type(mut self, timeout_type: impl Into<String>) -> Self {
        self.options.timeout_type = timeout_type.into();
        self
    }

    pub fn action(mut self, action: NotificationAction) -> Self {
        self.options.actions.push(action);
        self
    }

    pub fn close_button_text(mut self, text: impl Into<String>) -> Self {
        self.options.close_button_text = text.into();
        self
    }

    pub fn toast_xml(mut self, xml: impl Into<String>) -> Self {
        self.options.toast_xml = xml.into();
        self
    }

    pub fn build(self) -> Result<NotificationOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}
