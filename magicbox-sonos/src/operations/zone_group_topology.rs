//! ZoneGroupTopology operations: household grouping

use crate::define_upnp_operation;
use crate::operation::required_text;

define_upnp_operation! {
    operation: GetZoneGroupStateOperation,
    action: "GetZoneGroupState",
    service: ZoneGroupTopology,
    request: {},
    response: String,
    payload: |_req| String::new(),
    parse: |xml| required_text(xml, "ZoneGroupState"),
}
