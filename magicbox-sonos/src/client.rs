use tracing::debug;

use crate::error::Result;
use crate::operation::UPnPOperation;
use crate::soap::SoapClient;

/// Executes typed operations against a speaker
#[derive(Debug, Clone, Default)]
pub struct SonosClient {
    soap_client: SoapClient,
}

impl SonosClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_soap_client(soap_client: SoapClient) -> Self {
        Self { soap_client }
    }

    pub fn port(&self) -> u16 {
        self.soap_client.port()
    }

    /// Execute `Op` against the speaker at `ip`
    pub fn execute<Op: UPnPOperation>(&self, ip: &str, request: &Op::Request) -> Result<Op::Response> {
        let service_info = Op::SERVICE.info();
        let payload = Op::build_payload(request);
        debug!(ip, service = Op::SERVICE.name(), action = Op::ACTION, "executing operation");

        let xml = self.soap_client.call(
            ip,
            service_info.endpoint,
            service_info.service_uri,
            Op::ACTION,
            &payload,
        )?;

        Op::parse_response(&xml)
    }
}
