//! ipmitool subprocess executor.
//! Every invocation is bounded by the configured command timeout.

use std::fmt;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, trace};

use crate::config::types::IpmiSettings;

/// A raw IPMI request: the byte tokens passed after `ipmitool raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    bytes: Vec<String>,
}

impl RawCommand {
    pub fn new(bytes: &str) -> Self {
        Self {
            bytes: bytes.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn bytes(&self) -> &[String] {
        &self.bytes
    }
}

impl fmt::Display for RawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "raw {}", self.bytes.join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    Failure,
    Timeout,
}

impl CommandOutcome {
    pub fn is_success(self) -> bool {
        self == CommandOutcome::Success
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command to completion or timeout. Never retries.
    async fn attempt(&self, command: &RawCommand) -> CommandOutcome;
}

/// Build an ipmitool Command with interface and credential flags.
/// A configured host routes via lanplus to a remote BMC; otherwise the local interface is used.
pub fn build_ipmitool_command(settings: &IpmiSettings) -> std::process::Command {
    let mut cmd = std::process::Command::new(&settings.tool_path);

    if let Some(host) = settings.host.as_deref() {
        debug!("IPMI routing to remote BMC: {}:{}", host, settings.port);
        cmd.args(["-I", "lanplus", "-H", host, "-p", &settings.port.to_string()]);
    }
    if !settings.user.is_empty() {
        cmd.args(["-U", &settings.user]);
    }
    if !settings.password.is_empty() {
        cmd.args(["-P", &settings.password]);
    }

    cmd
}

pub struct IpmitoolRunner {
    settings: IpmiSettings,
    timeout: Duration,
    dry_run: bool,
}

impl IpmitoolRunner {
    pub fn new(settings: IpmiSettings, timeout: Duration) -> Self {
        Self { settings, timeout, dry_run: false }
    }

    /// Log each invocation instead of executing it; every attempt reports success.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    async fn run(&self, command: &RawCommand) -> std::io::Result<Option<Output>> {
        let mut cmd = build_ipmitool_command(&self.settings);
        cmd.arg("raw").args(command.bytes());

        let mut cmd = tokio::process::Command::from(cmd);
        cmd.kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(output) => output.map(Some),
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl CommandRunner for IpmitoolRunner {
    async fn attempt(&self, command: &RawCommand) -> CommandOutcome {
        if self.dry_run {
            info!("[DRY RUN] Would execute: {} {}", self.settings.tool_path, command);
            return CommandOutcome::Success;
        }

        debug!("Executing: {} {}", self.settings.tool_path, command);

        match self.run(command).await {
            Ok(Some(output)) if output.status.success() => {
                trace!("{} output: {}", command, String::from_utf8_lossy(&output.stdout).trim());
                CommandOutcome::Success
            }
            Ok(Some(output)) => {
                error!(
                    "ipmitool {} failed ({}): stderr={:?}, stdout={:?}",
                    command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim(),
                    String::from_utf8_lossy(&output.stdout).trim(),
                );
                CommandOutcome::Failure
            }
            Ok(None) => {
                error!("ipmitool {} timeout after {:?}", command, self.timeout);
                CommandOutcome::Timeout
            }
            Err(e) => {
                error!("Failed to execute {}: {}", self.settings.tool_path, e);
                CommandOutcome::Failure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(tool: &str) -> IpmiSettings {
        IpmiSettings { tool_path: tool.to_string(), ..IpmiSettings::default() }
    }

    fn args_of(cmd: &std::process::Command) -> Vec<String> {
        cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect()
    }

    #[test]
    fn test_raw_command_tokens() {
        let cmd = RawCommand::new("0x30 0x30  0x01 0x00");
        assert_eq!(cmd.bytes(), ["0x30", "0x30", "0x01", "0x00"]);
        assert_eq!(cmd.to_string(), "raw 0x30 0x30 0x01 0x00");
    }

    #[test]
    fn test_local_command_without_credentials() {
        let cmd = build_ipmitool_command(&settings("ipmitool"));
        assert_eq!(cmd.get_program(), "ipmitool");
        assert!(args_of(&cmd).is_empty());
    }

    #[test]
    fn test_credentials_are_passed() {
        let mut s = settings("/opt/ipmitool");
        s.user = "admin".to_string();
        s.password = "secret".to_string();

        let cmd = build_ipmitool_command(&s);
        assert_eq!(cmd.get_program(), "/opt/ipmitool");
        assert_eq!(args_of(&cmd), ["-U", "admin", "-P", "secret"]);
    }

    #[test]
    fn test_remote_host_uses_lanplus() {
        let mut s = settings("ipmitool");
        s.host = Some("10.0.0.5".to_string());
        s.port = 6230;
        s.user = "admin".to_string();

        let cmd = build_ipmitool_command(&s);
        assert_eq!(
            args_of(&cmd),
            ["-I", "lanplus", "-H", "10.0.0.5", "-p", "6230", "-U", "admin"]
        );
    }

    #[tokio::test]
    async fn test_dry_run_never_spawns() {
        let runner = IpmitoolRunner::new(settings("/nonexistent/ipmitool"), Duration::from_secs(1))
            .with_dry_run(true);
        assert_eq!(runner.attempt(&RawCommand::new("0x30 0x30 0x01 0x00")).await, CommandOutcome::Success);
    }

    #[tokio::test]
    async fn test_missing_tool_is_failure() {
        let runner = IpmitoolRunner::new(settings("/nonexistent/ipmitool"), Duration::from_secs(1));
        assert_eq!(runner.attempt(&RawCommand::new("0x30")).await, CommandOutcome::Failure);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_maps_to_outcome() {
        let ok = IpmitoolRunner::new(settings("true"), Duration::from_secs(5));
        assert_eq!(ok.attempt(&RawCommand::new("0x30")).await, CommandOutcome::Success);

        let failing = IpmitoolRunner::new(settings("false"), Duration::from_secs(5));
        assert_eq!(failing.attempt(&RawCommand::new("0x30")).await, CommandOutcome::Failure);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_tool_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-ipmitool");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = IpmitoolRunner::new(
            settings(script.to_str().unwrap()),
            Duration::from_millis(200),
        );
        let started = std::time::Instant::now();
        assert_eq!(runner.attempt(&RawCommand::new("0x30")).await, CommandOutcome::Timeout);
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
