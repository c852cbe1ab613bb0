//! Privileged host actions: restart the launcher, reboot or power off the
//! host, or leave the compositor. Each action maps to exactly one external
//! command. The runner is a trait so front-ends and tests can inject a
//! fake instead of touching the host.

use std::{
    fmt,
    process::{Child, Command, ExitStatus},
    str::FromStr,
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::info;

pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    RestartApp,
    Reboot,
    Poweroff,
    ExitCompositor,
}

impl SystemAction {
    pub const ALL: &'static [SystemAction] = &[
        SystemAction::RestartApp,
        SystemAction::Reboot,
        SystemAction::Poweroff,
        SystemAction::ExitCompositor,
    ];

    /// Wire identifier used by the HTTP API.
    pub fn id(self) -> &'static str {
        match self {
            SystemAction::RestartApp => "restart-app",
            SystemAction::Reboot => "reboot",
            SystemAction::Poweroff => "poweroff",
            SystemAction::ExitCompositor => "sway-exit",
        }
    }

    /// Human label for menus.
    pub fn label(self) -> &'static str {
        match self {
            SystemAction::RestartApp => "Restart launcher",
            SystemAction::Reboot => "Reboot",
            SystemAction::Poweroff => "Power off",
            SystemAction::ExitCompositor => "Exit to compositor",
        }
    }
}

impl fmt::Display for SystemAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SystemAction {
    type Err = SystemError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "restart-app" => Ok(SystemAction::RestartApp),
            "reboot" => Ok(SystemAction::Reboot),
            "poweroff" => Ok(SystemAction::Poweroff),
            "sway-exit" => Ok(SystemAction::ExitCompositor),
            other => Err(SystemError::UnknownAction(other.to_owned())),
        }
    }
}

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("unknown system action: {0}")]
    UnknownAction(String),
    #[error("failed to resolve current executable: {0}")]
    CurrentExe(std::io::Error),
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("failed to wait for {command}: {source}")]
    Wait {
        command: String,
        source: std::io::Error,
    },
    #[error("{command} exited with {status}")]
    Failed { command: String, status: ExitStatus },
    #[error("{command} did not finish within {timeout:?} and was killed")]
    TimedOut { command: String, timeout: Duration },
}

/// Capability to perform a privileged action. Injected into both
/// front-ends; tests substitute a recording fake.
pub trait ActionRunner: Send + Sync {
    fn perform(&self, action: SystemAction) -> Result<(), SystemError>;
}

/// Runner that invokes the real host commands.
#[derive(Debug, Clone)]
pub struct HostRunner {
    timeout: Duration,
}

impl HostRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command_for(action: SystemAction) -> Result<Command, SystemError> {
        match action {
            SystemAction::RestartApp => {
                let exe = std::env::current_exe().map_err(SystemError::CurrentExe)?;
                Ok(Command::new(exe))
            }
            SystemAction::Reboot => Ok(Command::new("reboot")),
            SystemAction::Poweroff => Ok(Command::new("poweroff")),
            SystemAction::ExitCompositor => {
                let mut command = Command::new("swaymsg");
                command.arg("exit");
                Ok(command)
            }
        }
    }
}

impl Default for HostRunner {
    fn default() -> Self {
        Self::new(DEFAULT_ACTION_TIMEOUT)
    }
}

impl ActionRunner for HostRunner {
    fn perform(&self, action: SystemAction) -> Result<(), SystemError> {
        let mut command = Self::command_for(action)?;
        let label = action.id().to_owned();
        info!("performing system action {}", label);

        let mut child = command.spawn().map_err(|source| SystemError::Spawn {
            command: label.clone(),
            source,
        })?;

        // The replacement launcher instance is expected to outlive us;
        // waiting on it would only ever end in a kill.
        if action == SystemAction::RestartApp {
            return Ok(());
        }

        let status = wait_with_deadline(&mut child, self.timeout, &label)?;
        if status.success() {
            Ok(())
        } else {
            Err(SystemError::Failed {
                command: label,
                status,
            })
        }
    }
}

/// Wait for `child`, polling until `timeout` elapses; kills the process on
/// expiry so a hung command cannot stall the caller forever.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
    command: &str,
) -> Result<ExitStatus, SystemError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SystemError::TimedOut {
                        command: command.to_owned(),
                        timeout,
                    });
                }
                std::thread::sleep(WAIT_POLL_INTERVAL);
            }
            Err(source) => {
                return Err(SystemError::Wait {
                    command: command.to_owned(),
                    source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_ids_round_trip() {
        for action in SystemAction::ALL {
            let parsed: SystemAction = action.id().parse().expect("parse own id");
            assert_eq!(parsed, *action);
            assert_eq!(action.to_string(), action.id());
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = "bogus-action".parse::<SystemAction>().unwrap_err();
        assert!(matches!(err, SystemError::UnknownAction(_)));
        assert!(err.to_string().contains("bogus-action"));
    }

    #[cfg(unix)]
    #[test]
    fn wait_with_deadline_reports_success() {
        let mut child = Command::new("true").spawn().expect("spawn true");
        let status = wait_with_deadline(&mut child, Duration::from_secs(5), "true")
            .expect("wait for true");
        assert!(status.success());
    }

    #[cfg(unix)]
    #[test]
    fn wait_with_deadline_kills_hung_commands() {
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        let err = wait_with_deadline(&mut child, Duration::from_millis(100), "sleep")
            .expect_err("sleep must time out");
        assert!(matches!(err, SystemError::TimedOut { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn wait_with_deadline_reports_nonzero_exit() {
        let mut child = Command::new("false").spawn().expect("spawn false");
        let status = wait_with_deadline(&mut child, Duration::from_secs(5), "false")
            .expect("wait for false");
        assert!(!status.success());
    }
}
