//! COM class factory and `INotificationActivationCallback` implementation.
//!
//! Windows constructs a fresh activator through the registered factory for
//! every activation, on a COM worker thread. The activator only carries the
//! hand-off it was created with; it never reaches into notification state.

use std::ffi::c_void;
use std::sync::{Arc, OnceLock};

use uuid::Uuid;
use windows::core::{implement, IUnknown, Interface, GUID, PCWSTR};
use windows::Win32::Foundation::{BOOL, CLASS_E_NOAGGREGATION, E_POINTER};
use windows::Win32::System::Com::{
    CoRegisterClassObject, CoRevokeClassObject, IClassFactory, IClassFactory_Impl,
    CLSCTX_LOCAL_SERVER, REGCLS_MULTIPLEUSE,
};
use windows::Win32::UI::Shell::{
    INotificationActivationCallback, INotificationActivationCallback_Impl,
    NOTIFICATION_USER_INPUT_DATA,
};

use super::handler::{ActivationHandler, LaunchHandoff};
use super::server::{ClassObjectRegistrar, ToastActivationServer};
use crate::config::ActivatorSettings;
use crate::error::{NotificationError, Result};

unsafe fn wide_to_string(value: PCWSTR) -> String {
    if value.is_null() {
        String::new()
    } else {
        String::from_utf16_lossy(value.as_wide())
    }
}

#[implement(INotificationActivationCallback)]
struct NotificationToastActivator {
    handler: ActivationHandler,
}

impl INotificationActivationCallback_Impl for NotificationToastActivator_Impl {
    fn Activate(
        &self,
        appusermodelid: &PCWSTR,
        invokedargs: &PCWSTR,
        data: *const NOTIFICATION_USER_INPUT_DATA,
        count: u32,
    ) -> windows::core::Result<()> {
        let app_user_model_id = unsafe { wide_to_string(*appusermodelid) };
        let invoked_args = unsafe { wide_to_string(*invokedargs) };

        let user_input: Vec<(String, String)> = if data.is_null() || count == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(data, count as usize) }
                .iter()
                .map(|entry| unsafe { (wide_to_string(entry.Key), wide_to_string(entry.Value)) })
                .collect()
        };

        self.handler
            .activate(&app_user_model_id, &invoked_args, &user_input);
        Ok(())
    }
}

#[implement(IClassFactory)]
struct ToastActivatorFactory {
    handler: ActivationHandler,
}

impl IClassFactory_Impl for ToastActivatorFactory_Impl {
    fn CreateInstance(
        &self,
        punkouter: Option<&IUnknown>,
        riid: *const GUID,
        ppvobject: *mut *mut c_void,
    ) -> windows::core::Result<()> {
        if ppvobject.is_null() {
            return Err(E_POINTER.into());
        }
        unsafe { *ppvobject = std::ptr::null_mut() };
        if punkouter.is_some() {
            return Err(CLASS_E_NOAGGREGATION.into());
        }

        let activator: IUnknown = NotificationToastActivator {
            handler: self.handler.clone(),
        }
        .into();
        unsafe { activator.query(riid, ppvobject).ok() }
    }

    fn LockServer(&self, _flock: BOOL) -> windows::core::Result<()> {
        Ok(())
    }
}

/// Registers the activator factory with the COM runtime as a multi-use
/// local server. The calling thread must already have initialized COM; the
/// apartment choice belongs to the host.
pub struct ComRegistrar {
    handler: ActivationHandler,
}

impl ComRegistrar {
    pub fn new(handoff: Arc<dyn LaunchHandoff>) -> Self {
        Self {
            handler: ActivationHandler::new(handoff),
        }
    }
}

impl ClassObjectRegistrar for ComRegistrar {
    fn register(&self, clsid: Uuid) -> Result<u32> {
        let factory: IClassFactory = ToastActivatorFactory {
            handler: self.handler.clone(),
        }
        .into();
        let guid = GUID::from_u128(clsid.as_u128());
        let cookie = unsafe {
            CoRegisterClassObject(&guid, &factory, CLSCTX_LOCAL_SERVER, REGCLS_MULTIPLEUSE)
        }?;
        Ok(cookie)
    }

    fn revoke(&self, cookie: u32) -> Result<()> {
        unsafe { CoRevokeClassObject(cookie) }?;
        Ok(())
    }
}

static SERVER: OnceLock<ToastActivationServer<ComRegistrar>> = OnceLock::new();

/// Sets up the process-wide activation server. Later calls return the
/// server created by the first one.
pub fn init_activation_server(
    settings: &ActivatorSettings,
    handoff: Arc<dyn LaunchHandoff>,
) -> Result<&'static ToastActivationServer<ComRegistrar>> {
    if let Some(server) = SERVER.get() {
        return Ok(server);
    }
    let server = ToastActivationServer::from_settings(ComRegistrar::new(handoff), settings)?;
    let _ = SERVER.set(server);
    SERVER
        .get()
        .ok_or_else(|| NotificationError::Other("activation server unavailable".to_string()))
}

fn server() -> Result<&'static ToastActivationServer<ComRegistrar>> {
    SERVER.get().ok_or_else(|| {
        NotificationError::Config("activation server has not been initialized".to_string())
    })
}

pub fn register_com_server() -> Result<()> {
    server()?.register_com_server()
}

pub fn unregister_com_server() -> Result<()> {
    match SERVER.get() {
        Some(server) => server.unregister_com_server(),
        None => Ok(()),
    }
}

pub fn is_registered() -> bool {
    SERVER.get().is_some_and(|server| server.is_registered())
}
