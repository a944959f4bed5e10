//! Process-wide registration of the toast activator class object.
//!
//! The registration is an owned resource: `register_com_server` acquires it
//! at most once and `unregister_com_server` (or dropping the server) releases
//! it. A failed registration only disables cold activation; toasts keep working
//! while the process is alive.

use std::num::NonZeroU32;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::ActivatorSettings;
use crate::error::{NotificationError, Result};

/// Registers and revokes class objects with the OS.
pub trait ClassObjectRegistrar: Send + Sync {
    /// Registers the activator class object for `clsid`, returning the
    /// registration cookie.
    fn register(&self, clsid: Uuid) -> Result<u32>;

    fn revoke(&self, cookie: u32) -> Result<()>;
}

/// A live registration. Revoked when dropped.
struct Registration<R: ClassObjectRegistrar> {
    cookie: NonZeroU32,
    registrar: Arc<R>,
}

impl<R: ClassObjectRegistrar> Drop for Registration<R> {
    fn drop(&mut self) {
        match self.registrar.revoke(self.cookie.get()) {
            Ok(()) => tracing::info!("Revoked toast activator registration {}", self.cookie),
            Err(e) => tracing::warn!("Failed to revoke toast activator registration: {}", e),
        }
    }
}

pub struct ToastActivationServer<R: ClassObjectRegistrar> {
    clsid: Uuid,
    registrar: Arc<R>,
    registration: Mutex<Option<Registration<R>>>,
}

impl<R: ClassObjectRegistrar> ToastActivationServer<R> {
    pub fn new(registrar: R, clsid: Uuid) -> Self {
        Self {
            clsid,
            registrar: Arc::new(registrar),
            registration: Mutex::new(None),
        }
    }

    pub fn from_settings(registrar: R, settings: &ActivatorSettings) -> Result<Self> {
        Ok(Self::new(registrar, settings.require_clsid()?))
    }

    pub fn clsid(&self) -> Uuid {
        self.clsid
    }

    /// Registers the class object unless it already is.
    pub fn register_com_server(&self) -> Result<()> {
        let mut registration = self.registration.lock();
        if registration.is_some() {
            tracing::debug!("Toast activator already registered");
            return Ok(());
        }

        let cookie = match self.registrar.register(self.clsid) {
            Ok(cookie) => cookie,
            Err(e) => {
                tracing::error!("Failed to register toast activator COM server: {}", e);
                return Err(e);
            }
        };
        let Some(cookie) = NonZeroU32::new(cookie) else {
            tracing::error!("Toast activator registration returned an empty cookie");
            return Err(NotificationError::Registration {
                code: 0x8000_FFFF,
                message: "registration returned an empty cookie".to_string(),
            });
        };

        tracing::info!("Registered toast activator {} (cookie {})", self.clsid, cookie);
        *registration = Some(Registration {
            cookie,
            registrar: self.registrar.clone(),
        });
        Ok(())
    }

    /// Revokes the registration if one is held. Always succeeds.
    pub fn unregister_com_server(&self) -> Result<()> {
        let registration = self.registration.lock().take();
        drop(registration);
        Ok(())
    }

    pub fn is_registered(&self) -> bool {
        self.registration.lock().is_some()
    }

    /// Cookie of the active registration.
    pub fn cookie(&self) -> Option<u32> {
        self.registration.lock().as_ref().map(|r| r.cookie.get())
    }
}
