//! Recording test doubles for the backend traits
//!
//! Every double appends to one shared call log so tests can assert on the
//! order of calls across backends.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use magicbox_core::{
    AudioOutput, BackendError, BackendResult, Dispatcher, PowerStatus, RawRecord, SpeakerBackend,
    TagReader, Tone, TransportCommand, TransportState, TvBackend, TvPowerCoordinator,
    VideoBackend,
};

/// One observed backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SpeakerPlay {
        room: String,
        uri: String,
        shuffle: bool,
    },
    SpeakerResume(String),
    SpeakerStop(String),
    SpeakerNext(String),
    SpeakerPrev(String),
    SpeakerVolume {
        room: String,
        delta: i8,
    },
    VideoStart(String),
    VideoStop,
    VideoTransport(TransportCommand),
    TvQuery,
    TvOn,
    TvOff,
    TvActivate,
    Tone(u32),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Calls that reached a backend, ignoring tones
pub fn backend_calls(log: &CallLog) -> Vec<Call> {
    log.borrow()
        .iter()
        .filter(|call| !matches!(call, Call::Tone(_)))
        .cloned()
        .collect()
}

/// Frequencies of the tones played so far
pub fn tones(log: &CallLog) -> Vec<u32> {
    log.borrow()
        .iter()
        .filter_map(|call| match call {
            Call::Tone(hz) => Some(*hz),
            _ => None,
        })
        .collect()
}

pub struct MockSpeaker {
    pub log: CallLog,
    pub fail_with: Option<BackendError>,
    pub volume: u8,
}

impl MockSpeaker {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
            fail_with: None,
            volume: 20,
        }
    }

    pub fn failing(log: &CallLog, error: BackendError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(log)
        }
    }

    fn record(&self, call: Call) -> BackendResult<()> {
        self.log.borrow_mut().push(call);
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl SpeakerBackend for MockSpeaker {
    fn play(&mut self, room: &str, uri: &str, shuffle: bool) -> BackendResult<()> {
        self.record(Call::SpeakerPlay {
            room: room.to_string(),
            uri: uri.to_string(),
            shuffle,
        })
    }

    fn resume(&mut self, room: &str) -> BackendResult<()> {
        self.record(Call::SpeakerResume(room.to_string()))
    }

    fn stop(&mut self, room: &str) -> BackendResult<()> {
        self.record(Call::SpeakerStop(room.to_string()))
    }

    fn next(&mut self, room: &str) -> BackendResult<()> {
        self.record(Call::SpeakerNext(room.to_string()))
    }

    fn prev(&mut self, room: &str) -> BackendResult<()> {
        self.record(Call::SpeakerPrev(room.to_string()))
    }

    fn set_volume_delta(&mut self, room: &str, delta: i8) -> BackendResult<u8> {
        self.record(Call::SpeakerVolume {
            room: room.to_string(),
            delta,
        })?;
        self.volume = (i16::from(self.volume) + i16::from(delta)).clamp(0, 100) as u8;
        Ok(self.volume)
    }

    fn transport_state(&mut self, _room: &str) -> BackendResult<TransportState> {
        Ok(TransportState::Stopped)
    }
}

pub struct MockVideo {
    pub log: CallLog,
    pub fail_with: Option<BackendError>,
}

impl MockVideo {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
            fail_with: None,
        }
    }

    pub fn failing(log: &CallLog, error: BackendError) -> Self {
        Self {
            log: Rc::clone(log),
            fail_with: Some(error),
        }
    }

    fn record(&self, call: Call) -> BackendResult<()> {
        self.log.borrow_mut().push(call);
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl VideoBackend for MockVideo {
    fn start(&mut self, uri: &str) -> BackendResult<()> {
        self.record(Call::VideoStart(uri.to_string()))
    }

    fn stop(&mut self) -> BackendResult<()> {
        self.record(Call::VideoStop)
    }

    fn transport(&mut self, command: TransportCommand) -> BackendResult<()> {
        self.record(Call::VideoTransport(command))
    }
}

pub struct MockTv {
    pub log: CallLog,
    pub status: PowerStatus,
    pub command_error: Option<BackendError>,
}

impl MockTv {
    pub fn new(log: &CallLog, status: PowerStatus) -> Self {
        Self {
            log: Rc::clone(log),
            status,
            command_error: None,
        }
    }
}

impl TvBackend for MockTv {
    fn query_power(&mut self) -> BackendResult<PowerStatus> {
        self.log.borrow_mut().push(Call::TvQuery);
        Ok(self.status)
    }

    fn power_on(&mut self) -> BackendResult<()> {
        self.log.borrow_mut().push(Call::TvOn);
        match &self.command_error {
            Some(error) => Err(error.clone()),
            None => {
                self.status = PowerStatus::On;
                Ok(())
            }
        }
    }

    fn power_off(&mut self) -> BackendResult<()> {
        self.log.borrow_mut().push(Call::TvOff);
        match &self.command_error {
            Some(error) => Err(error.clone()),
            None => {
                self.status = PowerStatus::Off;
                Ok(())
            }
        }
    }

    fn activate_source(&mut self) -> BackendResult<()> {
        self.log.borrow_mut().push(Call::TvActivate);
        Ok(())
    }
}

pub struct MockAudio {
    pub log: CallLog,
}

impl AudioOutput for MockAudio {
    fn play_tone(&mut self, tone: &Tone) -> BackendResult<()> {
        self.log.borrow_mut().push(Call::Tone(tone.frequency_hz));
        Ok(())
    }
}

/// Reader that replays a fixed script of poll results
pub struct ScriptedReader {
    pub polls: VecDeque<BackendResult<Option<Vec<RawRecord>>>>,
}

impl ScriptedReader {
    pub fn new(polls: Vec<BackendResult<Option<Vec<RawRecord>>>>) -> Self {
        Self {
            polls: polls.into(),
        }
    }
}

impl TagReader for ScriptedReader {
    fn poll(&mut self) -> BackendResult<Option<Vec<RawRecord>>> {
        self.polls.pop_front().unwrap_or(Ok(None))
    }
}

/// TV coordinator over `tv` that never waits for the TV to settle
pub fn coordinator(tv: MockTv) -> TvPowerCoordinator {
    TvPowerCoordinator::new(Box::new(tv)).with_settle_window(std::time::Duration::ZERO)
}

/// Dispatcher over healthy mocks sharing `log`; the TV starts in standby
pub fn dispatcher(log: &CallLog) -> Dispatcher {
    Dispatcher::new(
        Box::new(MockSpeaker::new(log)),
        Box::new(MockVideo::new(log)),
        coordinator(MockTv::new(log, PowerStatus::Off)),
    )
}
