//! Toast button arguments and how an activation maps back onto a
//! notification's transitions.
//!
//! Each button carries a string the OS hands back on activation. Caller
//! buttons are `action:<index>`, with the index into
//! `NotificationOptions::effective_actions`; the synthesized close button
//! is `dismiss`.

use super::options::NotificationAction;
use super::presenter::WeakNotification;

pub(crate) const DISMISS_ARGUMENT: &str = "dismiss";
pub(crate) const ACTION_PREFIX: &str = "action:";

/// Argument attached to the button rendered for `action` at `index`.
pub(crate) fn button_argument(index: usize, action: &NotificationAction) -> String {
    if action.is_system() {
        DISMISS_ARGUMENT.to_string()
    } else {
        format!("{}{}", ACTION_PREFIX, index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ToastEvent {
    Click,
    Action(usize),
    Dismiss,
}

/// Decodes the argument of an activated toast. No argument means the body
/// was clicked; anything unrecognized is treated the same way.
pub(crate) fn decode_activation(argument: Option<&str>) -> ToastEvent {
    match argument {
        None | Some("") => ToastEvent::Click,
        Some(DISMISS_ARGUMENT) => ToastEvent::Dismiss,
        Some(arg) => match arg.strip_prefix(ACTION_PREFIX).and_then(|i| i.parse().ok()) {
            Some(index) => ToastEvent::Action(index),
            None => {
                tracing::debug!("Unknown toast argument {:?}, treating as click", arg);
                ToastEvent::Click
            }
        },
    }
}

/// Applies a decoded activation. Returns whether the notification acted on it.
pub(crate) fn route(events: &WeakNotification, event: ToastEvent) -> bool {
    match event {
        ToastEvent::Click => events.clicked(),
        ToastEvent::Action(index) => events.action_invoked(index),
        ToastEvent::Dismiss => events.dismissed(true),
    }
}
