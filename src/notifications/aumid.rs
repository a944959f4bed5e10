//! AUMID (Application User Model ID) and toast activator registration.
//!
//! Windows toast notifications require a registered AUMID to display the correct
//! app name and icon. For cold activation the AUMID key must also name the COM
//! class that handles activations (`CustomActivator`), and that class must be
//! registered as a local server pointing at our executable. Both are written from
//! the same settings the activation server registers with, so they cannot drift.

use std::path::Path;

use winreg::enums::*;
use winreg::RegKey;

use crate::config::ActivatorSettings;
use crate::error::Result;

/// Formats a class identifier the way the registry expects: `{XXXXXXXX-...}`.
fn registry_clsid(clsid: &uuid::Uuid) -> String {
    format!("{{{}}}", clsid.hyphenated().to_string().to_uppercase())
}

/// Ensures the AUMID is registered in the Windows Registry.
///
/// Creates the registry key at:
/// `HKEY_CURRENT_USER\Software\Classes\AppUserModelId\<aumid>`
///
/// With values:
/// - DisplayName
/// - IconUri: Path to the app icon (only if it exists)
/// - IconBackgroundColor
/// - CustomActivator: the toast activator CLSID, when one is configured
pub fn ensure_aumid_registered(settings: &ActivatorSettings) -> Result<()> {
    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let path = format!(r"Software\Classes\AppUserModelId\{}", settings.aumid);

    let (key, disposition) = hkcu.create_subkey(&path)?;

    let action = match disposition {
        RegDisposition::REG_CREATED_NEW_KEY => "Created",
        RegDisposition::REG_OPENED_EXISTING_KEY => "Updated",
    };

    key.set_value("DisplayName", &settings.display_name)?;

    if let Some(ref icon_path) = settings.icon_path {
        if icon_path.exists() {
            let icon_path_str = icon_path.to_string_lossy().to_string();
            key.set_value("IconUri", &icon_path_str)?;
            tracing::debug!("AUMID icon set to: {}", icon_path_str);
        } else {
            tracing::warn!("Icon file not found at: {:?}", icon_path);
        }
    }

    key.set_value("IconBackgroundColor", &settings.icon_background_color)?;

    match settings.activator_clsid {
        Some(ref clsid) => {
            key.set_value("CustomActivator", &registry_clsid(clsid))?;
        }
        None => {
            tracing::warn!("No activator CLSID configured, cold toast activation disabled");
        }
    }

    tracing::info!("{} AUMID registry entry: {}", action, path);

    Ok(())
}

/// Registers `exe_path` as the local COM server for the activator CLSID so
/// Windows can start the app when a toast is clicked while it is not running.
pub fn register_activator_server(clsid: &uuid::Uuid, exe_path: &Path) -> Result<()> {
    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let path = format!(r"Software\Classes\CLSID\{}\LocalServer32", registry_clsid(clsid));

    let (key, _) = hkcu.create_subkey(&path)?;
    let command = format!("\"{}\"", exe_path.to_string_lossy());
    key.set_value("", &command)?;

    tracing::info!("Registered toast activator server: {} -> {}", path, command);
    Ok(())
}
