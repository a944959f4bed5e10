pub mod activator;
pub mod config;
pub mod error;
pub mod notifications;

pub use config::ActivatorSettings;
pub use error::{NotificationError, Result};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    // Load environment variables from .env file (for development)
    let _ = dotenvy::dotenv();

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toast_lifecycle=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Presenter that shows notifications as native Windows toasts.
#[cfg(windows)]
pub fn toast_presenter(settings: &ActivatorSettings) -> notifications::NotificationPresenter {
    let aumid = settings.aumid.clone();
    let display_name = settings.display_name.clone();
    notifications::NotificationPresenter::new(move || {
        Box::new(notifications::WinrtToastBackend::new(
            aumid.clone(),
            display_name.clone(),
        )) as Box<dyn notifications::NotificationBackend>
    })
    .with_debug_notifications(settings.debug_notifications)
}

/// Startup wiring for cold toast activation: registry metadata, then the
/// class object. Registry problems are only logged; a failed class-object
/// registration is returned, but the app can keep running without it.
///
/// COM must already be initialized on the calling thread.
#[cfg(windows)]
pub fn setup_toast_activation(
    settings: &ActivatorSettings,
    handoff: std::sync::Arc<dyn activator::LaunchHandoff>,
) -> Result<()> {
    if let Err(e) = notifications::ensure_aumid_registered(settings) {
        tracing::warn!("AUMID registration failed: {}", e);
    }

    let clsid = settings.require_clsid()?;
    match std::env::current_exe() {
        Ok(exe) => {
            if let Err(e) = notifications::register_activator_server(&clsid, &exe) {
                tracing::warn!("Activator server registration failed: {}", e);
            }
        }
        Err(e) => tracing::warn!("Could not resolve current executable: {}", e),
    }

    activator::init_activation_server(settings, handoff)?;
    activator::register_com_server()
}

/// Revokes the class object registered by `setup_toast_activation`.
#[cfg(windows)]
pub fn shutdown_toast_activation() {
    let _ = activator::unregister_com_server();
}
