use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use magicbox_core::{
    AudioOutput, Controller, DispatchConfig, Dispatcher, FeedbackCategory, FeedbackEmitter,
    PlaybackState, SpeakerBackend, TvPowerCoordinator,
};
use magicbox_media::{CecClient, PlayerVideo};
use magicbox_nfc::{Pn532Error, Pn532Reader};
use magicbox_sonos::{Discovery, SonosSpeaker};
use tracing::{error, info, warn};

mod config;
mod logging;

use config::{print_env_help, Config};

fn main() -> ExitCode {
    if std::env::args().any(|arg| arg == "--env-help") {
        print_env_help();
        return ExitCode::SUCCESS;
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("MagicBox failed: {:#}", e);
            eprintln!("magicbox: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = Config::from_env().context("Failed to parse configuration")?;

    logging::init_logging_from_env(&config.log_level).context("Failed to initialize logging")?;
    config.print_summary();

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })
        .context("Failed to install signal handler")?;
    }

    let mut feedback = build_feedback(&config);
    let reader = open_reader(&mut feedback, || {
        Pn532Reader::open(config.reader_devices.as_slice(), magicbox_nfc::DEFAULT_TIMEOUT)
    })?;

    let mut speaker = build_speaker(&config)?;
    probe_speaker(&mut speaker, &config.room);

    let tv = TvPowerCoordinator::new(Box::new(CecClient::new(config.cec.clone())))
        .with_settle_window(config.tv_settle);
    let dispatcher = Dispatcher::new(
        Box::new(speaker),
        Box::new(PlayerVideo::new(config.player.clone())),
        tv,
    )
    .with_config(DispatchConfig {
        volume_step: config.volume_step,
    });

    let state = PlaybackState::new(config.room.clone());
    let mut controller = Controller::new(Box::new(reader), dispatcher, feedback, state);

    info!(room = %config.room, "MagicBox ready, waiting for tags");
    controller.run(&shutdown);
    info!("MagicBox stopped");

    Ok(())
}

/// Open the reader, sounding the failure tone if none answers
fn open_reader<R>(
    feedback: &mut FeedbackEmitter,
    open: impl FnOnce() -> Result<R, Pn532Error>,
) -> Result<R> {
    open().map_err(|e| {
        feedback.emit(FeedbackCategory::Failure);
        anyhow::Error::new(e).context("NFC reader unavailable")
    })
}

fn build_speaker(config: &Config) -> Result<SonosSpeaker<Discovery>> {
    let discovery =
        Discovery::new(config.discovery_timeout).context("Failed to set up speaker discovery")?;
    Ok(SonosSpeaker::discover(discovery).with_volume_policy(config.volume))
}

/// Resolve the room once up front so a typo shows up at start-up.
/// An unreachable speaker is not fatal; it may come online later.
fn probe_speaker(speaker: &mut SonosSpeaker<Discovery>, room: &str) {
    match speaker.transport_state(room) {
        Ok(state) => info!(room, %state, "speaker found"),
        Err(e) => warn!(room, error = %e, "speaker not reachable yet"),
    }
}

fn build_feedback(config: &Config) -> FeedbackEmitter {
    if !config.tones {
        return FeedbackEmitter::silent();
    }

    match audio_output(config) {
        Ok(output) => FeedbackEmitter::new(output),
        Err(e) => {
            warn!(error = %e, "audio output unavailable, feedback tones disabled");
            FeedbackEmitter::silent()
        }
    }
}

#[cfg(not(feature = "rodio"))]
fn audio_output(config: &Config) -> Result<Box<dyn AudioOutput>> {
    let mut output = magicbox_media::AplayOutput::default();
    if let Some(device) = &config.audio_device {
        output = output.with_device(device.clone());
    }
    Ok(Box::new(output))
}

#[cfg(feature = "rodio")]
fn audio_output(config: &Config) -> Result<Box<dyn AudioOutput>> {
    if config.audio_device.is_some() {
        warn!("--audio-device is ignored with rodio output");
    }
    let output = magicbox_media::RodioOutput::new().context("Failed to open audio device")?;
    Ok(Box::new(output))
}
