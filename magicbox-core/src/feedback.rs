//! Audible feedback
//!
//! Every scan is acknowledged with a short sine tone, and every dispatched
//! action ends with a success or failure tone. Tones are played synchronously:
//! the loop does not accept the next scan until the tone has finished.

use std::f64::consts::PI;
use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::AudioOutput;

/// What a tone signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackCategory {
    /// A tag was detected
    Scan,
    Success,
    Failure,
    /// Startup and shutdown
    Info,
}

impl FeedbackCategory {
    /// Fixed tone table
    pub fn tone(self) -> Tone {
        match self {
            FeedbackCategory::Scan => Tone::new(660, Duration::from_millis(100)),
            FeedbackCategory::Success => Tone::new(880, Duration::from_millis(200)),
            FeedbackCategory::Failure => Tone::new(220, Duration::from_millis(300)),
            FeedbackCategory::Info => Tone::new(440, Duration::from_millis(200)),
        }
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackCategory::Scan => write!(f, "scan"),
            FeedbackCategory::Success => write!(f, "success"),
            FeedbackCategory::Failure => write!(f, "failure"),
            FeedbackCategory::Info => write!(f, "info"),
        }
    }
}

/// A single-frequency tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration: Duration,
}

impl Tone {
    /// Sample rate used for synthesis
    pub const SAMPLE_RATE: u32 = 22_050;

    /// Peak amplitude relative to full scale
    pub const AMPLITUDE: f64 = 0.5;

    pub const fn new(frequency_hz: u32, duration: Duration) -> Self {
        Self {
            frequency_hz,
            duration,
        }
    }

    /// Number of samples the tone spans at `sample_rate`
    pub fn sample_count(&self, sample_rate: u32) -> usize {
        (sample_rate as f64 * self.duration.as_secs_f64()).round() as usize
    }

    /// Render the tone as 16-bit signed mono PCM
    pub fn synthesize(&self, sample_rate: u32) -> Vec<i16> {
        let step = 2.0 * PI * self.frequency_hz as f64 / sample_rate as f64;
        let scale = Self::AMPLITUDE * i16::MAX as f64;

        (0..self.sample_count(sample_rate))
            .map(|n| ((n as f64 * step).sin() * scale) as i16)
            .collect()
    }
}

/// Plays feedback tones on an [`AudioOutput`], swallowing device errors
pub struct FeedbackEmitter {
    output: Option<Box<dyn AudioOutput>>,
}

impl FeedbackEmitter {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output: Some(output),
        }
    }

    /// An emitter that never makes a sound
    pub fn silent() -> Self {
        Self { output: None }
    }

    /// Play the tone for `category` and block until it has finished.
    ///
    /// A missing or broken audio device is logged and otherwise ignored; it is
    /// never reported as an action failure.
    pub fn emit(&mut self, category: FeedbackCategory) {
        let Some(output) = self.output.as_mut() else {
            return;
        };

        let tone = category.tone();
        debug!(%category, frequency = tone.frequency_hz, "playing feedback tone");

        if let Err(error) = output.play_tone(&tone) {
            warn!(%category, %error, "failed to play feedback tone");
        }
    }
}

impl fmt::Debug for FeedbackEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedbackEmitter")
            .field("enabled", &self.output.is_some())
            .finish()
    }
}
