//! AVTransport operations: playback, queue and play mode

use std::fmt;

use magicbox_core::TransportState;

use crate::define_upnp_operation;
use crate::operation::{required_number, required_text};
use crate::soap::escape_xml;

/// Queue play modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayMode {
    Normal,
    ShuffleNoRepeat,
}

impl PlayMode {
    pub fn from_shuffle(shuffle: bool) -> Self {
        if shuffle {
            PlayMode::ShuffleNoRepeat
        } else {
            PlayMode::Normal
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayMode::Normal => write!(f, "NORMAL"),
            PlayMode::ShuffleNoRepeat => write!(f, "SHUFFLE_NOREPEAT"),
        }
    }
}

/// Parse a UPnP `CurrentTransportState` value
pub fn parse_transport_state(raw: &str) -> TransportState {
    match raw {
        "PLAYING" => TransportState::Playing,
        "PAUSED_PLAYBACK" => TransportState::Paused,
        "STOPPED" => TransportState::Stopped,
        "TRANSITIONING" => TransportState::Transitioning,
        "NO_MEDIA_PRESENT" => TransportState::NoMedia,
        other => TransportState::Other(other.to_string()),
    }
}

/// Result of enqueuing a URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddUriToQueueResponse {
    /// 1-based queue position of the first enqueued track
    pub first_track_number_enqueued: u32,
    pub num_tracks_added: u32,
    pub new_queue_length: u32,
}

// =============================================================================
// BASIC PLAYBACK CONTROL
// =============================================================================

define_upnp_operation! {
    operation: PlayOperation,
    action: "Play",
    service: AVTransport,
    request: {
        speed: String,
    },
    response: (),
    payload: |req| format!("<InstanceID>{}</InstanceID><Speed>{}</Speed>", req.instance_id, req.speed),
    parse: |_xml| Ok(()),
}

define_upnp_operation! {
    operation: StopOperation,
    action: "Stop",
    service: AVTransport,
    request: {},
    response: (),
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
    parse: |_xml| Ok(()),
}

define_upnp_operation! {
    operation: NextOperation,
    action: "Next",
    service: AVTransport,
    request: {},
    response: (),
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
    parse: |_xml| Ok(()),
}

define_upnp_operation! {
    operation: PreviousOperation,
    action: "Previous",
    service: AVTransport,
    request: {},
    response: (),
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
    parse: |_xml| Ok(()),
}

define_upnp_operation! {
    operation: SeekOperation,
    action: "Seek",
    service: AVTransport,
    request: {
        unit: String,
        target: String,
    },
    response: (),
    payload: |req| {
        format!(
            "<InstanceID>{}</InstanceID><Unit>{}</Unit><Target>{}</Target>",
            req.instance_id, req.unit, escape_xml(&req.target)
        )
    },
    parse: |_xml| Ok(()),
}

define_upnp_operation! {
    operation: GetTransportInfoOperation,
    action: "GetTransportInfo",
    service: AVTransport,
    request: {},
    response: TransportState,
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
    parse: |xml| Ok(parse_transport_state(&required_text(xml, "CurrentTransportState")?)),
}

// =============================================================================
// MEDIA AND QUEUE
// =============================================================================

define_upnp_operation! {
    operation: SetAVTransportURIOperation,
    action: "SetAVTransportURI",
    service: AVTransport,
    request: {
        current_uri: String,
        current_uri_metadata: String,
    },
    response: (),
    payload: |req| {
        format!(
            "<InstanceID>{}</InstanceID><CurrentURI>{}</CurrentURI><CurrentURIMetaData>{}</CurrentURIMetaData>",
            req.instance_id,
            escape_xml(&req.current_uri),
            escape_xml(&req.current_uri_metadata)
        )
    },
    parse: |_xml| Ok(()),
}

define_upnp_operation! {
    operation: AddURIToQueueOperation,
    action: "AddURIToQueue",
    service: AVTransport,
    request: {
        enqueued_uri: String,
        enqueued_uri_metadata: String,
        desired_first_track_number_enqueued: u32,
        enqueue_as_next: bool,
    },
    response: AddUriToQueueResponse,
    payload: |req| {
        format!(
            "<InstanceID>{}</InstanceID><EnqueuedURI>{}</EnqueuedURI><EnqueuedURIMetaData>{}</EnqueuedURIMetaData><DesiredFirstTrackNumberEnqueued>{}</DesiredFirstTrackNumberEnqueued><EnqueueAsNext>{}</EnqueueAsNext>",
            req.instance_id,
            escape_xml(&req.enqueued_uri),
            escape_xml(&req.enqueued_uri_metadata),
            req.desired_first_track_number_enqueued,
            u8::from(req.enqueue_as_next)
        )
    },
    parse: |xml| {
        Ok(AddUriToQueueResponse {
            first_track_number_enqueued: required_number(xml, "FirstTrackNumberEnqueued")?,
            num_tracks_added: required_number(xml, "NumTracksAdded")?,
            new_queue_length: required_number(xml, "NewQueueLength")?,
        })
    },
}

define_upnp_operation! {
    operation: RemoveAllTracksFromQueueOperation,
    action: "RemoveAllTracksFromQueue",
    service: AVTransport,
    request: {},
    response: (),
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
    parse: |_xml| Ok(()),
}

define_upnp_operation! {
    operation: SetPlayModeOperation,
    action: "SetPlayMode",
    service: AVTransport,
    request: {
        new_play_mode: PlayMode,
    },
    response: (),
    payload: |req| {
        format!(
            "<InstanceID>{}</InstanceID><NewPlayMode>{}</NewPlayMode>",
            req.instance_id, req.new_play_mode
        )
    },
    parse: |_xml| Ok(()),
}
