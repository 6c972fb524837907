//! SSDP M-SEARCH client

use std::net::UdpSocket;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::DiscoveryError;

const MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Search target for Sonos players
pub const ZONE_PLAYER_URN: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

/// One answer to an M-SEARCH
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SsdpResponse {
    pub location: String,
    pub urn: String,
    pub usn: String,
    pub server: Option<String>,
}

impl SsdpResponse {
    /// Cheap check before fetching the device description
    pub fn is_likely_sonos(&self) -> bool {
        self.urn.contains("ZonePlayer")
            || self.usn.contains("RINCON")
            || self
                .server
                .as_deref()
                .is_some_and(|server| server.to_lowercase().contains("sonos"))
    }
}

pub(crate) struct SsdpClient {
    socket: UdpSocket,
    timeout: Duration,
}

impl SsdpClient {
    pub fn new(timeout: Duration) -> Result<Self, DiscoveryError> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| {
            DiscoveryError::Network(format!("Failed to bind UDP socket: {e}"))
        })?;
        socket.set_multicast_loop_v4(true).map_err(|e| {
            DiscoveryError::Network(format!("Failed to set multicast loop: {e}"))
        })?;

        Ok(Self { socket, timeout })
    }

    /// Send an M-SEARCH and collect every answer received within the timeout
    pub fn search(&self, search_target: &str) -> Result<Vec<SsdpResponse>, DiscoveryError> {
        let request = format!(
            "M-SEARCH * HTTP/1.1\r\n\
             HOST: {MULTICAST_ADDR}\r\n\
             MAN: \"ssdp:discover\"\r\n\
             MX: 1\r\n\
             ST: {search_target}\r\n\
             USER-AGENT: magicbox/1.0 UPnP/1.0\r\n\
             \r\n"
        );

        self.socket
            .send_to(request.as_bytes(), MULTICAST_ADDR)
            .map_err(|e| DiscoveryError::Network(format!("Failed to send M-SEARCH: {e}")))?;

        let deadline = Instant::now() + self.timeout;
        let mut buffer = [0u8; 2048];
        let mut responses = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.socket.set_read_timeout(Some(remaining)).map_err(|e| {
                DiscoveryError::Network(format!("Failed to set read timeout: {e}"))
            })?;

            match self.socket.recv_from(&mut buffer) {
                Ok((size, from)) => {
                    let Ok(text) = std::str::from_utf8(&buffer[..size]) else {
                        continue;
                    };
                    if let Some(response) = parse_ssdp_response(text) {
                        trace!(%from, location = %response.location, "ssdp response");
                        responses.push(response);
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break;
                }
                Err(e) => return Err(DiscoveryError::Network(format!("Socket error: {e}"))),
            }
        }

        Ok(responses)
    }
}

/// Parse an SSDP response from its HTTP text
pub(crate) fn parse_ssdp_response(response: &str) -> Option<SsdpResponse> {
    let mut location = None;
    let mut urn = None;
    let mut usn = None;
    let mut server = None;

    for line in response.lines() {
        let line = line.trim();

        if let Some(value) = extract_header_value(line, "LOCATION:") {
            location = Some(value);
        } else if let Some(value) = extract_header_value(line, "ST:") {
            urn = Some(value);
        } else if let Some(value) = extract_header_value(line, "USN:") {
            usn = Some(value);
        } else if let Some(value) = extract_header_value(line, "SERVER:") {
            server = Some(value);
        }
    }

    Some(SsdpResponse {
        location: location?,
        urn: urn?,
        usn: usn?,
        server,
    })
}

fn extract_header_value(line: &str, header: &str) -> Option<String> {
    let prefix = line.get(..header.len())?;
    if line.len() > header.len() && prefix.eq_ignore_ascii_case(header) {
        Some(line[header.len()..].trim().to_string())
    } else {
        None
    }
}
