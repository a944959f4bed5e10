//! Relaunch command line produced for a toast activation.
//!
//! The format is the contract between the activation callback and the process
//! that ends up handling the activation:
//!
//! ```text
//! --toast-activation --toast-args=<invoked args> --toast-input-<key>=<value> ...
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;

pub const TOAST_ACTIVATION_SWITCH: &str = "toast-activation";
pub const TOAST_ARGS_SWITCH: &str = "toast-args";
pub const TOAST_INPUT_PREFIX: &str = "toast-input-";

const SWITCH_PREFIX: &str = "--";

/// Ordered list of `--name[=value]` switches, values kept as native strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaunchCommand {
    switches: Vec<(String, Option<OsString>)>,
}

impl RelaunchCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_switch(&mut self, name: &str) {
        self.switches.push((name.to_string(), None));
    }

    pub fn append_switch_native(&mut self, name: &str, value: impl Into<OsString>) {
        self.switches.push((name.to_string(), Some(value.into())));
    }

    pub fn has_switch(&self, name: &str) -> bool {
        self.switches.iter().any(|(n, _)| n == name)
    }

    /// Value of the last occurrence of `name`.
    pub fn switch_value(&self, name: &str) -> Option<&OsStr> {
        self.switches
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn switches(&self) -> impl Iterator<Item = (&str, Option<&OsStr>)> {
        self.switches
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    /// Arguments suitable for `std::process::Command::args`.
    pub fn args(&self) -> Vec<OsString> {
        self.switches
            .iter()
            .map(|(name, value)| {
                let mut arg = OsString::from(SWITCH_PREFIX);
                arg.push(name);
                if let Some(value) = value {
                    arg.push("=");
                    arg.push(value);
                }
                arg
            })
            .collect()
    }
}

impl fmt::Display for RelaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .args()
            .iter()
            .map(|arg| quote_arg(&arg.to_string_lossy()))
            .collect();
        f.write_str(&rendered.join(" "))
    }
}

/// Quotes an argument for display using the Windows argv conventions.
fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0;
    for c in arg.chars() {
        if c == '\\' {
            backslashes += 1;
            continue;
        }
        let escapes = if c == '"' { backslashes * 2 + 1 } else { backslashes };
        quoted.extend(std::iter::repeat('\\').take(escapes));
        quoted.push(c);
        backslashes = 0;
    }
    quoted.extend(std::iter::repeat('\\').take(backslashes * 2));
    quoted.push('"');
    quoted
}

/// A toast activation as carried on the relaunch command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastActivation {
    /// The toast's launch or button arguments, possibly empty.
    pub invoked_args: String,
    /// Input fields (e.g. the inline reply box) in the order the OS gave them.
    pub user_input: Vec<(String, String)>,
}

impl ToastActivation {
    pub fn new(invoked_args: impl Into<String>) -> Self {
        Self {
            invoked_args: invoked_args.into(),
            user_input: Vec::new(),
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_input.push((key.into(), value.into()));
        self
    }

    /// Value typed into the input field `key`.
    pub fn input(&self, key: &str) -> Option<&str> {
        self.user_input
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Builds the relaunch command line. The args switch is always present,
    /// empty when the toast had no arguments. Inputs whose key is empty or
    /// contains `=` are dropped, since their switch could not be read back.
    pub fn to_command(&self) -> RelaunchCommand {
        let mut command = RelaunchCommand::new();
        command.append_switch(TOAST_ACTIVATION_SWITCH);
        command.append_switch_native(TOAST_ARGS_SWITCH, self.invoked_args.as_str());

        for (key, value) in &self.user_input {
            if key.is_empty() {
                continue;
            }
            if key.contains('=') {
                tracing::warn!("Dropping toast input with unrepresentable key {:?}", key);
                continue;
            }
            command.append_switch_native(&format!("{}{}", TOAST_INPUT_PREFIX, key), value.as_str());
        }
        command
    }

    /// Recovers an activation from a process's arguments. Returns `None`
    /// unless the toast-activation marker is present; non-switch arguments
    /// such as the program path are skipped.
    pub fn from_args<I, S>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut is_activation = false;
        let mut activation = Self::default();

        for arg in args {
            let arg = arg.as_ref().to_string_lossy();
            let Some(switch) = arg.strip_prefix(SWITCH_PREFIX) else {
                continue;
            };
            let (name, value) = match switch.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (switch, None),
            };

            if name == TOAST_ACTIVATION_SWITCH {
                is_activation = true;
            } else if name == TOAST_ARGS_SWITCH {
                activation.invoked_args = value.unwrap_or_default().to_string();
            } else if let Some(key) = name.strip_prefix(TOAST_INPUT_PREFIX) {
                if !key.is_empty() {
                    activation
                        .user_input
                        .push((key.to_string(), value.unwrap_or_default().to_string()));
                }
            }
        }

        is_activation.then_some(activation)
    }
}
