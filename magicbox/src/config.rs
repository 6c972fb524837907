use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use magicbox_media::{CecConfig, PlayerConfig};
use magicbox_sonos::VolumePolicy;
use tracing::info;

/// MagicBox NFC controller
///
/// Plays music on a Sonos speaker, video on the TV and runs playback
/// controls, driven by NFC tags presented to a PN532 reader.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "magicbox")]
#[command(about = "NFC tag controller for Sonos, TV and video playback")]
#[command(version)]
pub struct Args {
    /// Sonos room name or speaker IP address
    pub room: String,

    /// Serial port of the PN532 reader (repeatable, tried in order)
    #[arg(short = 'r', long = "reader-device")]
    pub reader_devices: Vec<String>,

    /// Volume change per vol_up / vol_down tag
    #[arg(long, default_value = "5")]
    pub volume_step: u8,

    /// Highest volume the speaker is ever set to
    #[arg(long, default_value = "60")]
    pub max_volume: u8,

    /// Volume to start playback at (default: keep current, capped)
    #[arg(long)]
    pub start_volume: Option<u8>,

    /// Video player program
    #[arg(long, default_value = "mpv")]
    pub player: String,

    /// Arguments passed to the video player, whitespace separated
    #[arg(long, default_value = "--fs --really-quiet", allow_hyphen_values = true)]
    pub player_args: String,

    /// Start the player without an IPC socket (disables video transport tags)
    #[arg(long)]
    pub no_ipc: bool,

    /// cec-client program
    #[arg(long, default_value = "cec-client")]
    pub cec_client: String,

    /// CEC power query timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub cec_query_timeout_ms: u64,

    /// CEC command timeout in seconds
    #[arg(long, default_value = "10")]
    pub cec_command_timeout: u64,

    /// Time the TV gets to settle after a power command, in milliseconds
    #[arg(long, default_value = "3500")]
    pub tv_settle_ms: u64,

    /// ALSA device for feedback tones (aplay -D)
    #[arg(long)]
    pub audio_device: Option<String>,

    /// Disable feedback tones
    #[arg(long)]
    pub no_tones: bool,

    /// Speaker discovery timeout in seconds
    #[arg(short = 'd', long, default_value = "3")]
    pub discovery_timeout: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Override arguments with `MAGICBOX_*` variables read through `env`
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(devices) = env("MAGICBOX_READER_DEVICES") {
            self.reader_devices = devices
                .split(',')
                .map(str::trim)
                .filter(|device| !device.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(step) = env("MAGICBOX_VOLUME_STEP") {
            self.volume_step = step
                .parse()
                .context("Invalid MAGICBOX_VOLUME_STEP environment variable")?;
        }

        if let Some(max) = env("MAGICBOX_MAX_VOLUME") {
            self.max_volume = max
                .parse()
                .context("Invalid MAGICBOX_MAX_VOLUME environment variable")?;
        }

        if let Some(start) = env("MAGICBOX_START_VOLUME") {
            self.start_volume = Some(
                start
                    .parse()
                    .context("Invalid MAGICBOX_START_VOLUME environment variable")?,
            );
        }

        if let Some(player) = env("MAGICBOX_PLAYER") {
            self.player = player;
        }

        if let Some(player_args) = env("MAGICBOX_PLAYER_ARGS") {
            self.player_args = player_args;
        }

        if let Some(cec_client) = env("MAGICBOX_CEC_CLIENT") {
            self.cec_client = cec_client;
        }

        if let Some(timeout) = env("MAGICBOX_CEC_QUERY_TIMEOUT_MS") {
            self.cec_query_timeout_ms = timeout
                .parse()
                .context("Invalid MAGICBOX_CEC_QUERY_TIMEOUT_MS environment variable")?;
        }

        if let Some(timeout) = env("MAGICBOX_CEC_COMMAND_TIMEOUT") {
            self.cec_command_timeout = timeout
                .parse()
                .context("Invalid MAGICBOX_CEC_COMMAND_TIMEOUT environment variable")?;
        }

        if let Some(settle) = env("MAGICBOX_TV_SETTLE_MS") {
            self.tv_settle_ms = settle
                .parse()
                .context("Invalid MAGICBOX_TV_SETTLE_MS environment variable")?;
        }

        if let Some(device) = env("MAGICBOX_AUDIO_DEVICE") {
            self.audio_device = Some(device);
        }

        if env("MAGICBOX_NO_TONES").is_some() {
            self.no_tones = true;
        }

        if env("MAGICBOX_NO_IPC").is_some() {
            self.no_ipc = true;
        }

        if let Some(timeout) = env("MAGICBOX_DISCOVERY_TIMEOUT") {
            self.discovery_timeout = timeout
                .parse()
                .context("Invalid MAGICBOX_DISCOVERY_TIMEOUT environment variable")?;
        }

        if let Some(log_level) = env("MAGICBOX_LOG_LEVEL") {
            self.log_level = log_level;
        }

        Ok(())
    }

    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        if self.room.trim().is_empty() {
            return Err(anyhow::anyhow!("Room must not be empty"));
        }

        if self.volume_step == 0 || self.volume_step > 100 {
            return Err(anyhow::anyhow!(
                "Volume step must be between 1 and 100, got {}",
                self.volume_step
            ));
        }

        if self.max_volume == 0 || self.max_volume > 100 {
            return Err(anyhow::anyhow!(
                "Max volume must be between 1 and 100, got {}",
                self.max_volume
            ));
        }

        if let Some(start) = self.start_volume {
            if start > self.max_volume {
                return Err(anyhow::anyhow!(
                    "Start volume ({}) exceeds max volume ({})",
                    start,
                    self.max_volume
                ));
            }
        }

        if self.player.trim().is_empty() {
            return Err(anyhow::anyhow!("Video player must not be empty"));
        }

        if self.cec_query_timeout_ms == 0 || self.cec_command_timeout == 0 {
            return Err(anyhow::anyhow!("CEC timeouts must be positive"));
        }

        if self.discovery_timeout == 0 {
            return Err(anyhow::anyhow!("Discovery timeout must be positive"));
        }

        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                    self.log_level
                ));
            }
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments and environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub room: String,
    pub reader_devices: Vec<String>,
    pub volume_step: u8,
    pub volume: VolumePolicy,
    pub player: PlayerConfig,
    pub cec: CecConfig,
    pub tv_settle: Duration,
    pub audio_device: Option<String>,
    pub tones: bool,
    pub discovery_timeout: Duration,
    pub log_level: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let reader_devices = if args.reader_devices.is_empty() {
            magicbox_nfc::DEFAULT_DEVICES
                .iter()
                .map(|device| device.to_string())
                .collect()
        } else {
            args.reader_devices
        };

        let defaults = PlayerConfig::default();
        let player = PlayerConfig {
            program: args.player,
            args: args.player_args.split_whitespace().map(String::from).collect(),
            ipc_socket: if args.no_ipc { None } else { defaults.ipc_socket },
            ..defaults
        };

        let cec = CecConfig {
            program: args.cec_client,
            query_timeout: Duration::from_millis(args.cec_query_timeout_ms),
            command_timeout: Duration::from_secs(args.cec_command_timeout),
            ..CecConfig::default()
        };

        Self {
            room: args.room.trim().to_string(),
            reader_devices,
            volume_step: args.volume_step,
            volume: VolumePolicy {
                max_volume: args.max_volume,
                start_volume: args.start_volume,
            },
            player,
            cec,
            tv_settle: Duration::from_millis(args.tv_settle_ms),
            audio_device: args.audio_device,
            tones: !args.no_tones,
            discovery_timeout: Duration::from_secs(args.discovery_timeout),
            log_level: args.log_level,
        }
    }
}

impl Config {
    /// Create configuration from command line arguments and environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_args(Args::parse(), |key| std::env::var(key).ok())
    }

    pub fn from_args(mut args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        args.apply_env(env)?;
        args.validate()?;
        Ok(Config::from(args))
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        info!("Configuration:");
        info!("  Room: {}", self.room);
        info!("  Reader devices: {}", self.reader_devices.join(", "));
        info!("  Volume step: {}", self.volume_step);
        info!("  Max volume: {}", self.volume.max_volume);
        match self.volume.start_volume {
            Some(volume) => info!("  Start volume: {}", volume),
            None => info!("  Start volume: current (capped)"),
        }
        info!("  Video player: {} {}", self.player.program, self.player.args.join(" "));
        info!("  Player IPC: {}", self.player.ipc_socket.is_some());
        info!("  CEC client: {}", self.cec.program);
        info!(
            "  CEC timeouts: query {}ms, command {}s",
            self.cec.query_timeout.as_millis(),
            self.cec.command_timeout.as_secs()
        );
        info!("  TV settle window: {}ms", self.tv_settle.as_millis());
        info!("  Feedback tones: {}", self.tones);
        if let Some(device) = &self.audio_device {
            info!("  Audio device: {}", device);
        }
        info!("  Discovery timeout: {}s", self.discovery_timeout.as_secs());
        info!("  Log level: {}", self.log_level);
    }
}

/// Print help information about environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!("  MAGICBOX_READER_DEVICES       Comma separated reader ports (default: /dev/ttyS0,/dev/ttyAMA0)");
    println!("  MAGICBOX_VOLUME_STEP          Volume change per tag (default: 5)");
    println!("  MAGICBOX_MAX_VOLUME           Volume cap (default: 60)");
    println!("  MAGICBOX_START_VOLUME         Playback start volume");
    println!("  MAGICBOX_PLAYER               Video player (default: mpv)");
    println!("  MAGICBOX_PLAYER_ARGS          Video player arguments (default: --fs --really-quiet)");
    println!("  MAGICBOX_NO_IPC               Disable the player IPC socket (set to enable)");
    println!("  MAGICBOX_CEC_CLIENT           cec-client program (default: cec-client)");
    println!("  MAGICBOX_CEC_QUERY_TIMEOUT_MS CEC query timeout (default: 5000)");
    println!("  MAGICBOX_CEC_COMMAND_TIMEOUT  CEC command timeout in seconds (default: 10)");
    println!("  MAGICBOX_TV_SETTLE_MS         TV settle window (default: 3500)");
    println!("  MAGICBOX_AUDIO_DEVICE         ALSA device for tones");
    println!("  MAGICBOX_NO_TONES             Disable feedback tones (set to enable)");
    println!("  MAGICBOX_DISCOVERY_TIMEOUT    Discovery timeout in seconds (default: 3)");
    println!("  MAGICBOX_LOG_LEVEL            Log level (default: info)");
    println!("  MAGICBOX_LOG_MODE             silent, development, debug or json (default: development)");
    println!();
}
