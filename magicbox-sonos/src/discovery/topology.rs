//! ZoneGroupState parsing
//!
//! Grouped and stereo-paired players only accept transport and queue
//! commands on the group coordinator.

use serde::Deserialize;

use super::device::{extract_ip_from_url, Device};
use crate::error::DiscoveryError;

/// Household topology as reported by `GetZoneGroupState`
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneGroupState {
    #[serde(rename = "ZoneGroups")]
    pub zone_groups: ZoneGroups,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneGroups {
    #[serde(rename = "ZoneGroup", default)]
    pub zone_groups: Vec<ZoneGroup>,
}

/// Players currently playing together
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneGroup {
    #[serde(rename = "@Coordinator")]
    pub coordinator: String,

    #[serde(rename = "ZoneGroupMember", default)]
    pub members: Vec<ZoneGroupMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneGroupMember {
    /// `RINCON_...` identifier
    #[serde(rename = "@UUID")]
    pub uuid: String,

    /// Device description URL
    #[serde(rename = "@Location")]
    pub location: String,

    #[serde(rename = "@ZoneName")]
    pub zone_name: String,
}

impl ZoneGroupState {
    pub fn from_xml(xml: &str) -> Result<Self, DiscoveryError> {
        quick_xml::de::from_str(xml)
            .map_err(|e| DiscoveryError::Parse(format!("Failed to parse zone group state: {e}")))
    }

    /// Coordinator of the group `uid` belongs to
    pub fn coordinator_of(&self, uid: &str) -> Option<&ZoneGroupMember> {
        let group = self
            .zone_groups
            .zone_groups
            .iter()
            .find(|group| group.members.iter().any(|member| member.uuid == uid))?;
        group
            .members
            .iter()
            .find(|member| member.uuid == group.coordinator)
    }
}

impl ZoneGroupMember {
    /// The member as a [`Device`], addressed through its location URL
    pub fn to_device(&self, fallback_port: u16) -> Option<Device> {
        let ip_address = extract_ip_from_url(&self.location)?;
        let port = url::Url::parse(&self.location)
            .ok()
            .and_then(|url| url.port())
            .unwrap_or(fallback_port);
        Some(Device {
            id: format!("uuid:{}", self.uuid),
            name: self.zone_name.clone(),
            room_name: self.zone_name.clone(),
            ip_address,
            port,
            model_name: String::new(),
        })
    }
}
