//! Typed UPnP operations
//!
//! Each operation is a zero-sized type tying a SOAP action to its service,
//! its request struct and its parsed response.

use xmltree::Element;

use crate::error::SonosError;
use crate::service::Service;

/// A single UPnP action
pub trait UPnPOperation {
    type Request;
    type Response;

    const SERVICE: Service;
    const ACTION: &'static str;

    /// XML arguments placed inside the action element
    fn build_payload(request: &Self::Request) -> String;

    /// Parse the `<{ACTION}Response>` element
    fn parse_response(xml: &Element) -> Result<Self::Response, SonosError>;
}

/// Text of a required response argument
pub fn required_text(xml: &Element, name: &str) -> Result<String, SonosError> {
    xml.get_child(name)
        .and_then(|e| e.get_text())
        .map(|text| text.trim().to_string())
        .ok_or_else(|| SonosError::InvalidResponse(format!("missing {name} in response")))
}

/// A required numeric response argument
pub fn required_number<T: std::str::FromStr>(xml: &Element, name: &str) -> Result<T, SonosError> {
    let text = required_text(xml, name)?;
    text.parse()
        .map_err(|_| SonosError::InvalidResponse(format!("{name} is not a number: '{text}'")))
}

/// Define an operation, its `...Request` struct and a `new` constructor
///
/// ```rust,ignore
/// define_upnp_operation! {
///     operation: PlayOperation,
///     action: "Play",
///     service: AVTransport,
///     request: {
///         speed: String,
///     },
///     response: (),
///     payload: |req| format!("<InstanceID>{}</InstanceID><Speed>{}</Speed>", req.instance_id, req.speed),
///     parse: |_xml| Ok(()),
/// }
/// ```
#[macro_export]
macro_rules! define_upnp_operation {
    (
        operation: $op_struct:ident,
        action: $action:literal,
        service: $service:ident,
        request: {
            $($field:ident: $field_type:ty),* $(,)?
        },
        response: $response_type:ty,
        payload: |$req_param:ident| $payload_expr:expr,
        parse: |$xml_param:ident| $parse_expr:expr $(,)?
    ) => {
        paste::paste! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct [<$op_struct Request>] {
                pub instance_id: u32,
                $(pub $field: $field_type,)*
            }

            impl [<$op_struct Request>] {
                #[allow(clippy::new_without_default)]
                pub fn new($($field: $field_type),*) -> Self {
                    Self {
                        instance_id: 0,
                        $($field,)*
                    }
                }
            }

            #[doc = concat!("`", $action, "` on ", stringify!($service))]
            pub struct $op_struct;

            impl $crate::operation::UPnPOperation for $op_struct {
                type Request = [<$op_struct Request>];
                type Response = $response_type;

                const SERVICE: $crate::service::Service = $crate::service::Service::$service;
                const ACTION: &'static str = $action;

                fn build_payload($req_param: &Self::Request) -> String {
                    $payload_expr
                }

                fn parse_response(
                    $xml_param: &xmltree::Element,
                ) -> Result<Self::Response, $crate::error::SonosError> {
                    $parse_expr
                }
            }
        }
    };
}
