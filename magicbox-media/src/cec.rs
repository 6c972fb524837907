//! [`TvBackend`] over HDMI-CEC using libcec's `cec-client`
//!
//! Every call runs `cec-client -s -d 1` in single-command mode with the CEC
//! command on stdin, so no long-lived CEC connection is held.

use std::process::Command;
use std::time::Duration;

use magicbox_core::{BackendResult, PowerStatus, TvBackend};
use tracing::{debug, info};

use crate::error::MediaError;
use crate::process;

/// How `cec-client` is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CecConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Logical address of the TV
    pub tv_address: u8,
    /// Bounds a power query, including `cec-client` start-up
    pub query_timeout: Duration,
    pub command_timeout: Duration,
}

impl Default for CecConfig {
    fn default() -> Self {
        Self {
            program: "cec-client".to_string(),
            args: vec!["-s".to_string(), "-d".to_string(), "1".to_string()],
            tv_address: 0,
            query_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(10),
        }
    }
}

/// TV control through `cec-client`
#[derive(Debug, Clone, Default)]
pub struct CecClient {
    config: CecConfig,
}

impl CecClient {
    pub fn new(config: CecConfig) -> Self {
        Self { config }
    }

    fn send(&self, command: &str, timeout: Duration) -> Result<String, MediaError> {
        debug!(command, "cec-client");
        let finished = process::run(
            Command::new(&self.config.program).args(&self.config.args),
            &format!("{command}\n"),
            timeout,
        )?;

        if no_adapter(&finished.stdout) {
            return Err(MediaError::NoCecAdapter);
        }
        if !finished.status.success() {
            return Err(MediaError::Failed {
                program: self.config.program.clone(),
                status: finished.status.to_string(),
            });
        }
        Ok(finished.stdout)
    }
}

/// Power state from the output of a `pow` command
pub fn parse_power_status(output: &str) -> PowerStatus {
    let Some(status) = output.lines().find_map(|line| {
        let line = line.to_ascii_lowercase();
        line.split_once("power status:")
            .map(|(_, status)| status.trim().to_string())
    }) else {
        return PowerStatus::Unknown;
    };

    match status.as_str() {
        "on" | "in transition from standby to on" => PowerStatus::On,
        "standby" | "in transition from on to standby" => PowerStatus::Off,
        _ => PowerStatus::Unknown,
    }
}

fn no_adapter(output: &str) -> bool {
    output.contains("autodetect FAILED") || output.contains("could not open a connection")
}

impl TvBackend for CecClient {
    fn query_power(&mut self) -> BackendResult<PowerStatus> {
        let output = self.send(
            &format!("pow {}", self.config.tv_address),
            self.config.query_timeout,
        )?;
        let status = parse_power_status(&output);
        debug!(%status, "TV power status");
        Ok(status)
    }

    fn power_on(&mut self) -> BackendResult<()> {
        info!("turning TV on");
        self.send(&format!("on {}", self.config.tv_address), self.config.command_timeout)?;
        Ok(())
    }

    fn power_off(&mut self) -> BackendResult<()> {
        info!("putting TV in standby");
        self.send(
            &format!("standby {}", self.config.tv_address),
            self.config.command_timeout,
        )?;
        Ok(())
    }

    fn activate_source(&mut self) -> BackendResult<()> {
        self.send("as", self.config.command_timeout)?;
        Ok(())
    }
}
