//! [`AudioOutput`]s for feedback tones

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use magicbox_core::{AudioOutput, BackendResult, Tone};
use tracing::trace;

use crate::error::MediaError;
use crate::process;

// aplay start-up on top of the tone itself
const PLAYBACK_SLACK: Duration = Duration::from_secs(5);

/// Write `tone` as a 16-bit mono PCM WAV file
pub fn write_wav(path: &Path, tone: &Tone) -> Result<(), MediaError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: Tone::SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in tone.synthesize(Tone::SAMPLE_RATE) {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Plays tones with ALSA's `aplay`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AplayOutput {
    program: String,
    device: Option<String>,
}

impl Default for AplayOutput {
    fn default() -> Self {
        Self {
            program: "aplay".to_string(),
            device: None,
        }
    }
}

impl AplayOutput {
    /// Play on an ALSA device (`-D`) instead of the default one
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Use another player taking aplay's arguments
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn play(&self, tone: &Tone) -> Result<(), MediaError> {
        let file = tempfile::Builder::new()
            .prefix("magicbox-tone-")
            .suffix(".wav")
            .tempfile()?;
        write_wav(file.path(), tone)?;

        let mut command = Command::new(&self.program);
        command.arg("-q");
        if let Some(device) = &self.device {
            command.arg("-D").arg(device);
        }
        command.arg(file.path()).stdout(Stdio::null());

        trace!(frequency = tone.frequency_hz, "aplay");
        let finished = process::run(&mut command, "", tone.duration + PLAYBACK_SLACK)?;
        if !finished.status.success() {
            return Err(MediaError::Device(format!(
                "{} exited with {}",
                self.program, finished.status
            )));
        }
        Ok(())
    }
}

impl AudioOutput for AplayOutput {
    fn play_tone(&mut self, tone: &Tone) -> BackendResult<()> {
        self.play(tone)?;
        Ok(())
    }
}

#[cfg(feature = "rodio")]
pub use self::rodio_output::RodioOutput;

#[cfg(feature = "rodio")]
mod rodio_output {
    use magicbox_core::{AudioOutput, BackendResult, Tone};
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use crate::error::MediaError;

    /// Plays tones on the default output device in-process
    pub struct RodioOutput {
        // dropping the stream closes the device
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl RodioOutput {
        pub fn new() -> Result<Self, MediaError> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| MediaError::Device(e.to_string()))?;
            Ok(Self {
                _stream: stream,
                handle,
            })
        }
    }

    impl AudioOutput for RodioOutput {
        fn play_tone(&mut self, tone: &Tone) -> BackendResult<()> {
            let sink = Sink::try_new(&self.handle).map_err(|e| MediaError::Device(e.to_string()))?;
            sink.append(SamplesBuffer::new(
                1,
                Tone::SAMPLE_RATE,
                tone.synthesize(Tone::SAMPLE_RATE),
            ));
            sink.sleep_until_end();
            Ok(())
        }
    }

    impl std::fmt::Debug for RodioOutput {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RodioOutput").finish_non_exhaustive()
        }
    }
}
