//! Windows toast backend built on `tauri-winrt-notification`.

use std::path::{Path, PathBuf};

use tauri_winrt_notification::{Duration, IconCrop, Sound, Toast, ToastDismissalReason};

use super::notification::NotificationBackend;
use super::options::{NotificationIcon, NotificationOptions};
use super::presenter::WeakNotification;
use super::toast_args;
use crate::error::{NotificationError, Result};

pub struct WinrtToastBackend {
    aumid: String,
    display_name: String,
    /// Decoded bitmap icons are written here for the toast to load.
    icon_file: Option<PathBuf>,
}

impl WinrtToastBackend {
    pub fn new(aumid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            aumid: aumid.into(),
            display_name: display_name.into(),
            icon_file: None,
        }
    }

    fn normalize_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        let normalized = match path_str.strip_prefix(r"\\?\") {
            Some(stripped) => PathBuf::from(stripped),
            None => path.to_path_buf(),
        };
        if normalized.exists() { Some(normalized) } else { None }
    }

    fn truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() > max_chars {
            let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", kept)
        } else {
            text.to_string()
        }
    }

    fn resolve_icon(&mut self, icon: &NotificationIcon) -> Option<PathBuf> {
        match icon {
            NotificationIcon::Url(url) => match url.to_file_path() {
                Ok(path) => Self::normalize_path(&path),
                Err(()) => {
                    tracing::debug!("Skipping non-file icon URL: {}", url);
                    None
                }
            },
            NotificationIcon::Bitmap(bitmap) => {
                let path = std::env::temp_dir().join(format!("toast-icon-{}.png", uuid::Uuid::new_v4()));
                match bitmap.save(&path) {
                    Ok(()) => {
                        self.icon_file = Some(path.clone());
                        Some(path)
                    }
                    Err(e) => {
                        tracing::warn!("Failed to write toast icon: {}", e);
                        None
                    }
                }
            }
        }
    }
}

impl NotificationBackend for WinrtToastBackend {
    fn show(&mut self, options: &NotificationOptions, events: WeakNotification) -> Result<()> {
        if !options.toast_xml.is_empty() {
            return Err(NotificationError::Display(
                "custom toast XML is not supported by this backend".to_string(),
            ));
        }

        let mut toast = Toast::new(&self.aumid)
            .title(&Self::truncate(&options.title, 60))
            .duration(match options.timeout_type.as_str() {
                "never" => Duration::Long,
                _ => Duration::Short,
            })
            .sound(if options.silent { None } else { Some(Sound::Default) });

        if !options.subtitle.is_empty() {
            toast = toast.text1(&Self::truncate(&options.subtitle, 60));
            toast = toast.text2(&Self::truncate(&options.body, 120));
        } else {
            toast = toast.text1(&Self::truncate(&options.body, 120));
        }

        if let Some(ref icon) = options.icon {
            if let Some(path) = self.resolve_icon(icon) {
                toast = toast.icon(&path, IconCrop::Circular, &self.display_name);
            }
        }

        if options.has_reply {
            tracing::debug!("Inline reply requires custom toast XML, reply box omitted");
        }

        for (index, action) in options.effective_actions().iter().enumerate() {
            toast = toast.add_button(&action.text, &toast_args::button_argument(index, action));
        }

        let on_activated = events.clone();
        let on_dismissed = events;
        toast = toast
            .on_activated(move |argument| {
                let event = toast_args::decode_activation(argument.as_deref());
                toast_args::route(&on_activated, event);
                Ok(())
            })
            .on_dismissed(move |reason| {
                // Timed-out toasts move to the Action Center and stay there until removed
                let should_destroy = !matches!(reason, Some(ToastDismissalReason::TimedOut));
                on_dismissed.dismissed(should_destroy);
                Ok(())
            });

        toast
            .show()
            .map_err(|e| NotificationError::Display(e.to_string()))?;

        tracing::info!("Toast shown: {}", options.title);
        Ok(())
    }

    /// The WinRT wrapper has no hide API. The toast stays on screen and the
    /// notification stays live until the OS reports an outcome.
    fn dismiss(&mut self) -> Result<()> {
        Err(NotificationError::Display(
            "hiding a shown toast is not supported by this backend".to_string(),
        ))
    }

    fn remove(&mut self) {
        if let Some(path) = self.icon_file.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl Drop for WinrtToastBackend {
    fn drop(&mut self) {
        self.remove();
    }
}
