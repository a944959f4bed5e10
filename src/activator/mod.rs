//! Toast activation: the relaunch command line, the stateless activation
//! handler and the class-object registration that lets Windows reach us
//! when the app is not running.

#[cfg(windows)]
mod com;
mod command_line;
mod handler;
mod server;

#[cfg(windows)]
pub use com::{
    init_activation_server, is_registered, register_com_server, unregister_com_server,
    ComRegistrar,
};
pub use command_line::{
    RelaunchCommand, ToastActivation, TOAST_ACTIVATION_SWITCH, TOAST_ARGS_SWITCH,
    TOAST_INPUT_PREFIX,
};
pub use handler::{ActivationHandler, LaunchHandoff, LogOnlyHandoff, RelaunchCurrentExe};
pub use server::{ClassObjectRegistrar, ToastActivationServer};
