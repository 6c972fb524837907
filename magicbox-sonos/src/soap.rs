//! Minimal SOAP client for UPnP control of Sonos players

use std::time::Duration;

use tracing::trace;
use xmltree::Element;

use crate::error::SoapError;

/// Port every Sonos player serves UPnP on
pub const SONOS_PORT: u16 = 1400;

/// A minimal blocking SOAP client
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
    port: u16,
}

impl SoapClient {
    /// Client for the standard Sonos port (connect 5 s, read 10 s)
    pub fn new() -> Self {
        Self::with_port(SONOS_PORT)
    }

    /// Client talking to a non-standard port
    pub fn with_port(port: u16) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .timeout_read(Duration::from_secs(10))
                .build(),
            port,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Send a SOAP request and return the `<{action}Response>` element
    pub fn call(
        &self,
        ip: &str,
        endpoint: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_uri}">{payload}</u:{action}></s:Body></s:Envelope>"#
        );

        let url = format!("http://{}:{}/{}", ip, self.port, endpoint);
        let soap_action = format!("\"{service_uri}#{action}\"");
        trace!(%url, action, "soap request");

        // UPnP reports faults with HTTP 500 and a fault body
        let xml_text = match self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            Err(ureq::Error::Status(500, response)) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            Err(ureq::Error::Status(code, _)) => {
                return Err(SoapError::Network(format!("HTTP {code} from {url}")));
            }
            Err(error) => return Err(SoapError::Network(error.to_string())),
        };

        let xml =
            Element::parse(xml_text.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;

        extract_response(&xml, action)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_response(xml: &Element, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        let error_code = fault
            .get_child("detail")
            .and_then(|d| d.get_child("UPnPError"))
            .and_then(|e| e.get_child("errorCode"))
            .and_then(|c| c.get_text())
            .and_then(|t| t.trim().parse::<u16>().ok())
            .unwrap_or(500);
        return Err(SoapError::Fault(error_code));
    }

    let response_name = format!("{action}Response");
    body.get_child(response_name.as_str())
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {response_name} element")))
}

/// Escape text for use inside an XML element
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
