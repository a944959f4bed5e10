//! Activation handling shared by the COM callback and tests.
//!
//! Runs in whatever context the OS activates us in, possibly a process that
//! was just started for this purpose. It only reads the activation's own
//! arguments and passes a relaunch command to the configured hand-off.

use std::sync::Arc;

use super::command_line::{RelaunchCommand, ToastActivation};

/// Delivers a relaunch command to the process that should handle it.
pub trait LaunchHandoff: Send + Sync {
    fn hand_off(&self, command: &RelaunchCommand) -> anyhow::Result<()>;
}

/// Starts a new instance of the current executable with the activation
/// switches; a single-instance guard in the app forwards them if one is
/// already running.
pub struct RelaunchCurrentExe;

impl LaunchHandoff for RelaunchCurrentExe {
    fn hand_off(&self, command: &RelaunchCommand) -> anyhow::Result<()> {
        let exe = std::env::current_exe()?;
        let child = std::process::Command::new(&exe).args(command.args()).spawn()?;
        tracing::debug!("Relaunched {:?} (pid {}) for toast activation", exe, child.id());
        Ok(())
    }
}

/// Only records the activation in the log.
pub struct LogOnlyHandoff;

impl LaunchHandoff for LogOnlyHandoff {
    fn hand_off(&self, command: &RelaunchCommand) -> anyhow::Result<()> {
        tracing::info!("Toast activation (not delivered): {}", command);
        Ok(())
    }
}

#[derive(Clone)]
pub struct ActivationHandler {
    handoff: Arc<dyn LaunchHandoff>,
}

impl ActivationHandler {
    pub fn new(handoff: Arc<dyn LaunchHandoff>) -> Self {
        Self { handoff }
    }

    /// Turns an activation into a relaunch command and hands it off.
    ///
    /// Never fails: the activation counts as accepted even when nobody is
    /// there to receive it.
    pub fn activate(
        &self,
        app_user_model_id: &str,
        invoked_args: &str,
        user_input: &[(String, String)],
    ) -> RelaunchCommand {
        let activation = ToastActivation {
            invoked_args: invoked_args.to_string(),
            user_input: user_input.to_vec(),
        };
        let command = activation.to_command();

        tracing::info!(
            "Toast activation for {:?}: args={:?} inputs={}",
            app_user_model_id,
            invoked_args,
            user_input.len()
        );

        if let Err(e) = self.handoff.hand_off(&command) {
            tracing::warn!("Failed to hand off toast activation: {}", e);
        }
        command
    }
}
