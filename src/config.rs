use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NotificationError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivatorSettings {
    #[serde(default = "default_aumid")]
    pub aumid: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    #[serde(default)]
    pub icon_path: Option<PathBuf>,
    #[serde(default = "default_icon_background_color")]
    pub icon_background_color: String,
    /// Class identifier of the toast activator. Must match the one written to
    /// the shortcut/installer metadata, so it is never hard-coded.
    #[serde(default)]
    pub activator_clsid: Option<Uuid>,
    #[serde(default)]
    pub debug_notifications: bool,
}

fn default_aumid() -> String {
    "com.toastlifecycle.app".to_string()
}

fn default_display_name() -> String {
    "Toast Lifecycle".to_string()
}

fn default_icon_background_color() -> String {
    "FF1e293b".to_string()
}

impl Default for ActivatorSettings {
    fn default() -> Self {
        Self {
            aumid: default_aumid(),
            display_name: default_display_name(),
            icon_path: None,
            icon_background_color: default_icon_background_color(),
            activator_clsid: None,
            debug_notifications: false,
        }
    }
}

impl ActivatorSettings {
    /// Loads settings from a JSON file, then applies environment overrides.
    /// A missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        let settings = if path.exists() {
            match std::fs::read_to_string(path)
                .map_err(NotificationError::from)
                .and_then(|s| serde_json::from_str(&s).map_err(NotificationError::from))
            {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Ignoring invalid settings file {:?}: {}", path, e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        settings.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `TOAST_ACTIVATOR_CLSID`, `TOAST_AUMID` and `DEBUG_NOTIFICATIONS`.
    pub fn with_env_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = var("TOAST_ACTIVATOR_CLSID") {
            match Uuid::parse_str(raw.trim().trim_start_matches('{').trim_end_matches('}')) {
                Ok(clsid) => {
                    tracing::info!("Using TOAST_ACTIVATOR_CLSID from environment variable");
                    self.activator_clsid = Some(clsid);
                }
                Err(e) => tracing::warn!("Invalid TOAST_ACTIVATOR_CLSID {:?}: {}", raw, e),
            }
        }

        if let Some(aumid) = var("TOAST_AUMID").filter(|s| !s.trim().is_empty()) {
            self.aumid = aumid.trim().to_string();
        }

        if let Some(flag) = var("DEBUG_NOTIFICATIONS") {
            self.debug_notifications = matches!(flag.trim(), "1" | "true" | "yes");
        }

        self
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// The activator CLSID, or a configuration error if none was deployed.
    pub fn require_clsid(&self) -> Result<Uuid> {
        self.activator_clsid.ok_or_else(|| {
            NotificationError::Config("toast activator CLSID is not configured".to_string())
        })
    }
}
