//! RenderingControl operations: volume

use crate::define_upnp_operation;
use crate::operation::required_number;

/// Channel name for the main volume
pub const MASTER: &str = "Master";

define_upnp_operation! {
    operation: GetVolumeOperation,
    action: "GetVolume",
    service: RenderingControl,
    request: {
        channel: String,
    },
    response: u8,
    payload: |req| format!("<InstanceID>{}</InstanceID><Channel>{}</Channel>", req.instance_id, req.channel),
    parse: |xml| required_number(xml, "CurrentVolume"),
}

define_upnp_operation! {
    operation: SetVolumeOperation,
    action: "SetVolume",
    service: RenderingControl,
    request: {
        channel: String,
        desired_volume: u8,
    },
    response: (),
    payload: |req| {
        format!(
            "<InstanceID>{}</InstanceID><Channel>{}</Channel><DesiredVolume>{}</DesiredVolume>",
            req.instance_id, req.channel, req.desired_volume.min(100)
        )
    },
    parse: |_xml| Ok(()),
}
