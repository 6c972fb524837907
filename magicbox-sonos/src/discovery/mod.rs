//! Finding speakers: SSDP search plus device description lookups
//!
//! A room is given either as a speaker IP address, in which case only that
//! speaker's description is fetched, or as a room name, which triggers an
//! SSDP search for ZonePlayers and a case-insensitive room name match.
//! Either way the speaker is then swapped for its group coordinator.

pub mod device;
mod ssdp;
pub mod topology;

use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;

use tracing::{debug, info};

use crate::client::SonosClient;
use crate::error::{DiscoveryError, Result, SonosError};
use crate::operations::{GetZoneGroupStateOperation, GetZoneGroupStateOperationRequest};
use crate::soap::{SoapClient, SONOS_PORT};

pub use device::{Device, DeviceDescription};
pub use ssdp::ZONE_PLAYER_URN;
pub use topology::{ZoneGroupMember, ZoneGroupState};

/// Speaker lookup over SSDP and HTTP
#[derive(Debug, Clone)]
pub struct Discovery {
    timeout: Duration,
    port: u16,
    http_client: reqwest::blocking::Client,
    client: SonosClient,
}

impl Discovery {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_port(timeout, SONOS_PORT)
    }

    /// Discovery for speakers serving UPnP on `port`
    pub fn with_port(timeout: Duration, port: u16) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DiscoveryError::Network(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            timeout,
            port,
            http_client,
            client: SonosClient::with_soap_client(SoapClient::with_port(port)),
        })
    }

    /// Fetch the description of the speaker at `ip`
    pub fn describe(&self, ip: &str) -> Result<Device> {
        let location = format!("http://{}:{}/xml/device_description.xml", ip, self.port);
        let description = self.fetch_description(&location)?;
        if !description.is_sonos_device() {
            return Err(DiscoveryError::InvalidDevice(format!(
                "{ip} is a '{}', not a Sonos player",
                description.model_name
            ))
            .into());
        }
        Ok(description.into_device(ip.to_string(), self.port))
    }

    /// Every Sonos speaker answering an SSDP search
    pub fn discover(&self) -> Result<Vec<Device>> {
        let responses = ssdp::SsdpClient::new(self.timeout)?.search(ZONE_PLAYER_URN)?;

        let mut seen = HashSet::new();
        let mut devices = Vec::new();
        for response in responses {
            if !seen.insert(response.location.clone()) || !response.is_likely_sonos() {
                continue;
            }

            let Some(ip) = device::extract_ip_from_url(&response.location) else {
                continue;
            };

            match self.fetch_description(&response.location) {
                Ok(description) if description.is_sonos_device() => {
                    let device = description.into_device(ip, self.port);
                    debug!(room = %device.room_name, ip = %device.ip_address, "found speaker");
                    devices.push(device);
                }
                Ok(_) => {}
                Err(error) => debug!(location = %response.location, %error, "skipping device"),
            }
        }

        Ok(devices)
    }

    /// Resolve `room` (an IP address or a room name) to the speaker
    /// coordinating its group
    pub fn resolve(&self, room: &str) -> Result<Device> {
        let device = if room.parse::<IpAddr>().is_ok() {
            let device = self.describe(room)?;
            info!(ip = room, room = %device.room_name, "using speaker by address");
            device
        } else {
            let devices = self.discover()?;
            let device = select_room(devices, room)?;
            info!(room, ip = %device.ip_address, model = %device.model_name, "resolved speaker");
            device
        };

        Ok(self.coordinator(device))
    }

    /// Household topology as seen by the speaker at `ip`
    pub fn zone_group_state(&self, ip: &str) -> Result<ZoneGroupState> {
        let xml = self.client.execute::<GetZoneGroupStateOperation>(
            ip,
            &GetZoneGroupStateOperationRequest::new(),
        )?;
        Ok(ZoneGroupState::from_xml(&xml)?)
    }

    // Falls back to `device` itself when the topology is unavailable.
    fn coordinator(&self, device: Device) -> Device {
        let state = match self.zone_group_state(&device.ip_address) {
            Ok(state) => state,
            Err(error) => {
                debug!(ip = %device.ip_address, %error, "zone group state unavailable");
                return device;
            }
        };

        match state.coordinator_of(device.uid()) {
            Some(member) if member.uuid != device.uid() => match member.to_device(self.port) {
                Some(coordinator) => {
                    info!(
                        room = %device.room_name,
                        member = %device.ip_address,
                        coordinator = %coordinator.ip_address,
                        "speaker is grouped, using group coordinator"
                    );
                    coordinator
                }
                None => device,
            },
            _ => device,
        }
    }

    fn fetch_description(&self, location: &str) -> Result<DeviceDescription> {
        let response = self
            .http_client
            .get(location)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                DiscoveryError::Network(format!("Failed to fetch device description: {e}"))
            })?;

        let xml = response.text().map_err(|e| {
            DiscoveryError::Network(format!("Failed to read response body: {e}"))
        })?;

        Ok(DeviceDescription::from_xml(&xml)?)
    }
}

/// Pick the speaker whose room name matches `room`, ignoring case
fn select_room(devices: Vec<Device>, room: &str) -> Result<Device> {
    if devices.is_empty() {
        return Err(SonosError::NoDevices);
    }

    let wanted = room.trim();
    devices
        .into_iter()
        .find(|device| device.room_name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| SonosError::UnknownRoom(room.to_string()))
}
