//! Process actions on installed programs.
//!
//! Uninstall and modify commands are handed to the shell verbatim and
//! awaited with a bounded wait; file browser and registry editor launches
//! are fire-and-forget.

use crate::config::{ActionConfig, RegistryConfig};
use crate::error::{ProgInfoError, Result};
use crate::programs::ProgramRecord;
use crate::registry::{KeyValueStore, RegValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Shell command that uninstalls `record`.
///
/// With `quiet`, only the quiet uninstall string qualifies.
pub fn uninstall_command(record: &ProgramRecord, quiet: bool) -> Option<String> {
    let command = if quiet {
        record.quiet_uninstall_string.as_deref()
    } else {
        record.uninstall_string.as_deref()
    };
    non_empty(command).map(str::to_string)
}

/// Shell command that opens `record`'s modify dialog, with `extra_args`
/// appended.
pub fn modify_command(record: &ProgramRecord, extra_args: Option<&str>) -> Option<String> {
    let command = non_empty(record.modify_path.as_deref())?;
    Some(match non_empty(extra_args) {
        Some(extra) => format!("{} {}", command, extra),
        None => command.to_string(),
    })
}

/// Address-bar form of `record`'s registry key as regedit stores it.
pub fn regedit_address(record: &ProgramRecord) -> Option<String> {
    let key = non_empty(Some(record.reg_key.as_str()))?;
    Some(format!(
        "{}{}{}",
        RegistryConfig::COMPUTER_PREFIX,
        RegistryConfig::SEPARATOR,
        key
    ))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Launches uninstallers, modifiers, the file browser and the registry editor.
#[derive(Clone)]
pub struct ProgramActions {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ProgramActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramActions").finish_non_exhaustive()
    }
}

impl ProgramActions {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Run the (quiet) uninstall command and wait for it to exit.
    pub async fn uninstall(&self, record: &ProgramRecord, quiet: bool) -> bool {
        let Some(command) = uninstall_command(record, quiet) else {
            warn!("No {}uninstall command for {}", if quiet { "quiet " } else { "" }, record);
            return false;
        };
        info!("Uninstalling {}", record);
        report(&command, run_shell(&command, ActionConfig::ACTION_TIMEOUT).await)
    }

    /// Run the modify command and wait for it to exit.
    pub async fn modify(&self, record: &ProgramRecord, extra_args: Option<&str>) -> bool {
        let Some(command) = modify_command(record, extra_args) else {
            warn!("No modify command for {}", record);
            return false;
        };
        info!("Modifying {}", record);
        report(&command, run_shell(&command, ActionConfig::ACTION_TIMEOUT).await)
    }

    /// Show the install location in the file browser.
    pub async fn open_location(&self, record: &ProgramRecord) -> bool {
        let Some(location) = non_empty(record.install_location.as_deref()) else {
            warn!("No install location for {}", record);
            return false;
        };
        report(
            ActionConfig::EXPLORER,
            spawn_detached(ActionConfig::EXPLORER, &[location]).await,
        )
    }

    /// Open the registry editor at the record's uninstall key.
    ///
    /// Points regedit's remembered key at the record before launching it.
    pub async fn open_registry_location(&self, record: &ProgramRecord) -> bool {
        let Some(address) = regedit_address(record) else {
            warn!("No registry key for {}", record);
            return false;
        };
        if let Err(e) = self
            .store
            .set(ActionConfig::REGEDIT_LAST_KEY, RegValue::String(address))
        {
            warn!("Failed to preselect {} in regedit: {}", record.reg_key, e);
            return false;
        }
        report(
            ActionConfig::REGEDIT,
            spawn_detached(ActionConfig::REGEDIT, &[]).await,
        )
    }
}

fn report(command: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("`{}` failed: {}", command, e);
            false
        }
    }
}

fn shell_command(command: &str) -> Command {
    let mut shell = Command::new(ActionConfig::SHELL);
    #[cfg(windows)]
    {
        // cmd.exe does its own parsing; quoting the command would break it.
        shell.raw_arg("/C").raw_arg(command);
    }
    #[cfg(not(windows))]
    {
        shell.arg("/C").arg(command);
    }
    shell
}

async fn run_shell(command: &str, timeout: Duration) -> Result<()> {
    let mut child = shell_command(command)
        .kill_on_drop(false)
        .spawn()
        .map_err(|e| ProgInfoError::LaunchFailed {
            command: command.to_string(),
            message: e.to_string(),
        })?;

    let status = tokio::time::timeout(timeout, child.wait())
        .await
        .map_err(|_| ProgInfoError::Timeout(timeout))?
        .map_err(|e| ProgInfoError::LaunchFailed {
            command: command.to_string(),
            message: e.to_string(),
        })?;

    debug!("`{}` exited with {}", command, status);
    Ok(())
}

async fn spawn_detached(program: &str, args: &[&str]) -> Result<()> {
    let child = Command::new(program)
        .args(args)
        .spawn()
        .map_err(|e| ProgInfoError::LaunchFailed {
            command: program.to_string(),
            message: e.to_string(),
        })?;
    debug!("Started {} (pid {:?})", program, child.id());

    // Reap in the background so the caller never waits on the UI process.
    tokio::spawn(async move {
        let mut child = child;
        let _ = tokio::time::timeout(ActionConfig::OPEN_TIMEOUT, child.wait()).await;
    });
    Ok(())
}
