//! Device description parsing

use serde::Deserialize;

use crate::error::DiscoveryError;

/// A Sonos player on the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Unique device name, e.g. `uuid:RINCON_000E58A0123456`
    pub id: String,
    pub name: String,
    pub room_name: String,
    pub ip_address: String,
    pub port: u16,
    pub model_name: String,
}

impl Device {
    /// The `RINCON_...` identifier used in queue URIs
    pub fn uid(&self) -> &str {
        let id = self.id.strip_prefix("uuid:").unwrap_or(&self.id);
        id.split("::").next().unwrap_or(id)
    }

    /// URI selecting this player's own queue as the transport source
    pub fn queue_uri(&self) -> String {
        format!("x-rincon-queue:{}#0", self.uid())
    }
}

#[derive(Debug, Deserialize)]
struct Root {
    device: DeviceDescription,
}

/// The parts of a UPnP device description we use
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    #[serde(rename = "UDN")]
    pub udn: String,
    pub room_name: Option<String>,
}

impl DeviceDescription {
    pub fn from_xml(xml: &str) -> Result<Self, DiscoveryError> {
        let root: Root = quick_xml::de::from_str(xml)
            .map_err(|e| DiscoveryError::Parse(format!("Failed to parse device XML: {e}")))?;
        Ok(root.device)
    }

    pub fn is_sonos_device(&self) -> bool {
        self.manufacturer.to_lowercase().contains("sonos")
            || self.device_type.contains("ZonePlayer")
    }

    pub fn into_device(self, ip_address: String, port: u16) -> Device {
        Device {
            id: self.udn,
            room_name: self
                .room_name
                .unwrap_or_else(|| self.friendly_name.clone()),
            name: self.friendly_name,
            ip_address,
            port,
            model_name: self.model_name,
        }
    }
}

/// Host part of a location URL such as `http://192.168.1.100:1400/xml/...`
pub fn extract_ip_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed.host_str().map(str::to_string)
}
