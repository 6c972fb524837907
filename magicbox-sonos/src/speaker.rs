//! [`SpeakerBackend`] over UPnP

use std::collections::HashMap;

use magicbox_core::{BackendResult, SpeakerBackend, TransportState};
use tracing::{debug, info, warn};

use crate::client::SonosClient;
use crate::discovery::{Device, Discovery};
use crate::error::{Result, SonosError};
use crate::operations::*;
use crate::sharelink::ShareLink;

/// Volume policy applied when playback starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumePolicy {
    /// Upper bound for every volume the adapter sets
    pub max_volume: u8,
    /// Volume to start playback at; `None` keeps the current volume (capped)
    pub start_volume: Option<u8>,
}

impl Default for VolumePolicy {
    fn default() -> Self {
        Self {
            max_volume: 60,
            start_volume: None,
        }
    }
}

/// Where a speaker is found
pub trait Locator {
    fn locate(&self, room: &str) -> Result<Device>;
}

impl Locator for Discovery {
    fn locate(&self, room: &str) -> Result<Device> {
        self.resolve(room)
    }
}

/// Sonos speaker addressed by room name or IP address
pub struct SonosSpeaker<L = Discovery> {
    client: SonosClient,
    locator: L,
    policy: VolumePolicy,
    devices: HashMap<String, Device>,
}

impl<L: Locator> SonosSpeaker<L> {
    pub fn new(client: SonosClient, locator: L) -> Self {
        Self {
            client,
            locator,
            policy: VolumePolicy::default(),
            devices: HashMap::new(),
        }
    }

    pub fn with_volume_policy(mut self, policy: VolumePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn volume_policy(&self) -> &VolumePolicy {
        &self.policy
    }

    /// Resolve `room`, caching the result until a network error
    pub fn device(&mut self, room: &str) -> Result<Device> {
        if let Some(device) = self.devices.get(room) {
            return Ok(device.clone());
        }

        let device = self.locator.locate(room)?;
        self.devices.insert(room.to_string(), device.clone());
        Ok(device)
    }

    // Runs `f` against the room's speaker. A network failure forgets the
    // cached device so the next call locates it again.
    fn with_device<T>(
        &mut self,
        room: &str,
        f: impl FnOnce(&SonosClient, &Device, &VolumePolicy) -> Result<T>,
    ) -> BackendResult<T> {
        let device = self.device(room)?;
        match f(&self.client, &device, &self.policy) {
            Ok(value) => Ok(value),
            Err(error) => {
                if error.is_network() {
                    warn!(room, ip = %device.ip_address, %error, "speaker unreachable, forgetting address");
                    self.devices.remove(room);
                }
                Err(error.into())
            }
        }
    }
}

impl SonosSpeaker<Discovery> {
    /// Speaker on the standard port, located with SSDP when needed
    pub fn discover(discovery: Discovery) -> Self {
        Self::new(SonosClient::new(), discovery)
    }
}

fn play_share_link(
    client: &SonosClient,
    device: &Device,
    policy: &VolumePolicy,
    link: &ShareLink,
    shuffle: bool,
) -> Result<()> {
    let ip = device.ip_address.as_str();

    client.execute::<RemoveAllTracksFromQueueOperation>(
        ip,
        &RemoveAllTracksFromQueueOperationRequest::new(),
    )?;

    let enqueued = client.execute::<AddURIToQueueOperation>(
        ip,
        &AddURIToQueueOperationRequest::new(link.enqueue_uri(), link.didl_metadata(), 0, false),
    )?;
    debug!(%link, tracks = enqueued.num_tracks_added, "enqueued share link");

    client.execute::<SetAVTransportURIOperation>(
        ip,
        &SetAVTransportURIOperationRequest::new(device.queue_uri(), String::new()),
    )?;
    client.execute::<SetPlayModeOperation>(
        ip,
        &SetPlayModeOperationRequest::new(PlayMode::from_shuffle(shuffle)),
    )?;
    client.execute::<SeekOperation>(
        ip,
        &SeekOperationRequest::new(
            "TRACK_NR".to_string(),
            enqueued.first_track_number_enqueued.max(1).to_string(),
        ),
    )?;

    apply_start_volume(client, ip, policy)?;
    client.execute::<PlayOperation>(ip, &PlayOperationRequest::new("1".to_string()))
}

fn play_stream(client: &SonosClient, device: &Device, policy: &VolumePolicy, uri: &str) -> Result<()> {
    let ip = device.ip_address.as_str();

    client.execute::<SetAVTransportURIOperation>(
        ip,
        &SetAVTransportURIOperationRequest::new(uri.to_string(), String::new()),
    )?;

    apply_start_volume(client, ip, policy)?;
    client.execute::<PlayOperation>(ip, &PlayOperationRequest::new("1".to_string()))
}

fn apply_start_volume(client: &SonosClient, ip: &str, policy: &VolumePolicy) -> Result<()> {
    let target = match policy.start_volume {
        Some(volume) => volume.min(policy.max_volume),
        None => {
            let current = client
                .execute::<GetVolumeOperation>(ip, &GetVolumeOperationRequest::new(MASTER.to_string()))?;
            if current <= policy.max_volume {
                return Ok(());
            }
            current.min(policy.max_volume)
        }
    };

    debug!(ip, volume = target, "setting start volume");
    client.execute::<SetVolumeOperation>(
        ip,
        &SetVolumeOperationRequest::new(MASTER.to_string(), target),
    )
}

/// `current + delta`, clamped to `0..=max`
pub fn clamp_volume(current: u8, delta: i8, max: u8) -> u8 {
    (i16::from(current) + i16::from(delta)).clamp(0, i16::from(max)) as u8
}

fn is_stream(uri: &str) -> bool {
    url::Url::parse(uri).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

impl<L: Locator> SpeakerBackend for SonosSpeaker<L> {
    fn play(&mut self, room: &str, uri: &str, shuffle: bool) -> BackendResult<()> {
        if let Some(link) = ShareLink::parse(uri) {
            info!(room, %link, shuffle, "playing share link");
            return self.with_device(room, |client, device, policy| {
                play_share_link(client, device, policy, &link, shuffle)
            });
        }

        if !is_stream(uri) {
            return Err(SonosError::UnsupportedUri(uri.to_string()).into());
        }

        if shuffle {
            debug!(room, uri, "shuffle has no effect on a single stream");
        }
        info!(room, uri, "playing stream");
        self.with_device(room, |client, device, policy| {
            play_stream(client, device, policy, uri)
        })
    }

    fn resume(&mut self, room: &str) -> BackendResult<()> {
        self.with_device(room, |client, device, _| {
            client.execute::<PlayOperation>(
                &device.ip_address,
                &PlayOperationRequest::new("1".to_string()),
            )
        })
    }

    fn stop(&mut self, room: &str) -> BackendResult<()> {
        self.with_device(room, |client, device, _| {
            client.execute::<StopOperation>(&device.ip_address, &StopOperationRequest::new())
        })
    }

    fn next(&mut self, room: &str) -> BackendResult<()> {
        self.with_device(room, |client, device, _| {
            client.execute::<NextOperation>(&device.ip_address, &NextOperationRequest::new())
        })
    }

    fn prev(&mut self, room: &str) -> BackendResult<()> {
        self.with_device(room, |client, device, _| {
            client.execute::<PreviousOperation>(&device.ip_address, &PreviousOperationRequest::new())
        })
    }

    fn set_volume_delta(&mut self, room: &str, delta: i8) -> BackendResult<u8> {
        self.with_device(room, |client, device, policy| {
            let ip = device.ip_address.as_str();
            let current = client
                .execute::<GetVolumeOperation>(ip, &GetVolumeOperationRequest::new(MASTER.to_string()))?;
            let volume = clamp_volume(current, delta, policy.max_volume);

            client.execute::<SetVolumeOperation>(
                ip,
                &SetVolumeOperationRequest::new(MASTER.to_string(), volume),
            )?;
            debug!(ip, from = current, to = volume, "volume changed");
            Ok(volume)
        })
    }

    fn transport_state(&mut self, room: &str) -> BackendResult<TransportState> {
        self.with_device(room, |client, device, _| {
            client.execute::<GetTransportInfoOperation>(
                &device.ip_address,
                &GetTransportInfoOperationRequest::new(),
            )
        })
    }
}

impl<L> std::fmt::Debug for SonosSpeaker<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonosSpeaker")
            .field("client", &self.client)
            .field("policy", &self.policy)
            .field("cached_rooms", &self.devices.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
