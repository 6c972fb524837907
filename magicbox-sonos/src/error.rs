use magicbox_core::BackendError;
use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoapError {
    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// SOAP fault returned by the speaker
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}

/// Errors from SSDP discovery and device description lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// Socket creation, multicast send or HTTP fetch failed
    #[error("Network error: {0}")]
    Network(String),

    /// Device description XML could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The device answered but is not a Sonos player
    #[error("Invalid device: {0}")]
    InvalidDevice(String),
}

/// Errors raised by the speaker adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SonosError {
    #[error(transparent)]
    Soap(#[from] SoapError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Discovery ran but no speaker is in the requested room
    #[error("no Sonos speaker found in room '{0}'")]
    UnknownRoom(String),

    /// Discovery ran but found no speakers at all
    #[error("no Sonos speakers found on the network")]
    NoDevices,

    /// The URI is neither a supported share link nor a plain http(s) stream
    #[error("unsupported media URI: {0}")]
    UnsupportedUri(String),

    /// The speaker answered with something we could not use
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SonosError {
    /// Whether the speaker could not be reached at all
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SonosError::Soap(SoapError::Network(_)) | SonosError::Discovery(DiscoveryError::Network(_))
        )
    }
}

/// Result alias used across the adapter
pub type Result<T> = std::result::Result<T, SonosError>;

impl From<SonosError> for BackendError {
    fn from(error: SonosError) -> Self {
        match &error {
            SonosError::Soap(SoapError::Network(_))
            | SonosError::Discovery(DiscoveryError::Network(_))
            | SonosError::NoDevices => BackendError::unavailable(error.to_string()),
            SonosError::Soap(_)
            | SonosError::Discovery(_)
            | SonosError::UnknownRoom(_)
            | SonosError::UnsupportedUri(_)
            | SonosError::InvalidResponse(_) => BackendError::rejected(error.to_string()),
        }
    }
}
