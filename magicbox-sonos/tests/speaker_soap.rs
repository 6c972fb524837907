//! SonosSpeaker against a mocked UPnP endpoint
//!
//! Each test runs a mockito server standing in for the speaker's port 1400
//! and checks the exact SOAP actions the adapter sends.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use magicbox_core::{BackendError, SpeakerBackend, TransportState};
use magicbox_sonos::{
    Device, Discovery, DiscoveryError, Locator, SoapClient, SonosClient, SonosError, SonosSpeaker,
    VolumePolicy,
};
use mockito::{Matcher, Mock, Server, ServerGuard};

const ROOM: &str = "Living Room";

struct FixedLocator {
    device: Device,
    calls: Rc<Cell<usize>>,
}

impl Locator for FixedLocator {
    fn locate(&self, room: &str) -> magicbox_sonos::Result<Device> {
        self.calls.set(self.calls.get() + 1);
        if room.eq_ignore_ascii_case(&self.device.room_name) {
            Ok(self.device.clone())
        } else {
            Err(SonosError::UnknownRoom(room.to_string()))
        }
    }
}

fn port_of(server: &ServerGuard) -> u16 {
    server
        .host_with_port()
        .rsplit(':')
        .next()
        .and_then(|port| port.parse().ok())
        .expect("mock server port")
}

fn speaker_on(port: u16) -> (SonosSpeaker<FixedLocator>, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let locator = FixedLocator {
        device: Device {
            id: "uuid:RINCON_000E58TEST01400".to_string(),
            name: ROOM.to_string(),
            room_name: ROOM.to_string(),
            ip_address: "127.0.0.1".to_string(),
            port,
            model_name: "Sonos One".to_string(),
        },
        calls: Rc::clone(&calls),
    };
    let client = SonosClient::with_soap_client(SoapClient::with_port(port));
    (SonosSpeaker::new(client, locator), calls)
}

fn envelope(action: &str, service: &str, inner: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action}Response xmlns:u="urn:schemas-upnp-org:service:{service}:1">{inner}</u:{action}Response></s:Body></s:Envelope>"#
    )
}

fn av_transport(server: &mut ServerGuard, action: &str, body: Matcher, inner: &str) -> Mock {
    server
        .mock("POST", "/MediaRenderer/AVTransport/Control")
        .match_header(
            "soapaction",
            format!("\"urn:schemas-upnp-org:service:AVTransport:1#{action}\"").as_str(),
        )
        .match_body(body)
        .with_status(200)
        .with_header("content-type", "text/xml; charset=\"utf-8\"")
        .with_body(envelope(action, "AVTransport", inner))
        .expect(1)
        .create()
}

fn rendering(server: &mut ServerGuard, action: &str, body: Matcher, inner: &str) -> Mock {
    server
        .mock("POST", "/MediaRenderer/RenderingControl/Control")
        .match_header(
            "soapaction",
            format!("\"urn:schemas-upnp-org:service:RenderingControl:1#{action}\"").as_str(),
        )
        .match_body(body)
        .with_status(200)
        .with_body(envelope(action, "RenderingControl", inner))
        .expect(1)
        .create()
}

#[test]
fn test_play_spotify_album_with_shuffle() {
    let mut server = Server::new();
    let mocks = vec![
        av_transport(&mut server, "RemoveAllTracksFromQueue", Matcher::Any, ""),
        av_transport(
            &mut server,
            "AddURIToQueue",
            Matcher::AllOf(vec![
                Matcher::Regex(
                    "<EnqueuedURI>x-rincon-cpcontainer:1004206cspotify%3aalbum%3a6wiUBliPe76YAVpNEdidpY</EnqueuedURI>"
                        .to_string(),
                ),
                Matcher::Regex("SA_RINCON2311_X_#Svc2311-0-Token".to_string()),
                Matcher::Regex("&lt;DIDL-Lite".to_string()),
            ]),
            "<FirstTrackNumberEnqueued>1</FirstTrackNumberEnqueued><NumTracksAdded>11</NumTracksAdded><NewQueueLength>11</NewQueueLength>",
        ),
        av_transport(
            &mut server,
            "SetAVTransportURI",
            Matcher::Regex("<CurrentURI>x-rincon-queue:RINCON_000E58TEST01400#0</CurrentURI>".to_string()),
            "",
        ),
        av_transport(
            &mut server,
            "SetPlayMode",
            Matcher::Regex("<NewPlayMode>SHUFFLE_NOREPEAT</NewPlayMode>".to_string()),
            "",
        ),
        av_transport(
            &mut server,
            "Seek",
            Matcher::Regex("<Unit>TRACK_NR</Unit><Target>1</Target>".to_string()),
            "",
        ),
        rendering(&mut server, "GetVolume", Matcher::Any, "<CurrentVolume>75</CurrentVolume>"),
        rendering(
            &mut server,
            "SetVolume",
            Matcher::Regex("<DesiredVolume>60</DesiredVolume>".to_string()),
            "",
        ),
        av_transport(&mut server, "Play", Matcher::Regex("<Speed>1</Speed>".to_string()), ""),
    ];

    let (mut speaker, _) = speaker_on(port_of(&server));
    speaker
        .play(
            ROOM,
            "https://open.spotify.com/album/6wiUBliPe76YAVpNEdidpY?si=abc",
            true,
        )
        .unwrap();

    for mock in mocks {
        mock.assert();
    }
}

#[test]
fn test_play_stream_with_start_volume() {
    let mut server = Server::new();
    let set_uri = av_transport(
        &mut server,
        "SetAVTransportURI",
        Matcher::Regex("<CurrentURI>https://radio.example.com/live.mp3</CurrentURI>".to_string()),
        "",
    );
    let set_volume = rendering(
        &mut server,
        "SetVolume",
        Matcher::Regex("<DesiredVolume>25</DesiredVolume>".to_string()),
        "",
    );
    let play = av_transport(&mut server, "Play", Matcher::Any, "");

    let (speaker, _) = speaker_on(port_of(&server));
    let mut speaker = speaker.with_volume_policy(VolumePolicy {
        max_volume: 60,
        start_volume: Some(25),
    });
    speaker
        .play(ROOM, "https://radio.example.com/live.mp3", false)
        .unwrap();

    set_uri.assert();
    set_volume.assert();
    play.assert();
}

#[test]
fn test_volume_below_cap_is_left_alone() {
    let mut server = Server::new();
    let set_uri = av_transport(&mut server, "SetAVTransportURI", Matcher::Any, "");
    let get_volume = rendering(&mut server, "GetVolume", Matcher::Any, "<CurrentVolume>30</CurrentVolume>");
    let set_volume = server
        .mock("POST", "/MediaRenderer/RenderingControl/Control")
        .match_header(
            "soapaction",
            "\"urn:schemas-upnp-org:service:RenderingControl:1#SetVolume\"",
        )
        .expect(0)
        .create();
    let play = av_transport(&mut server, "Play", Matcher::Any, "");

    let (mut speaker, _) = speaker_on(port_of(&server));
    speaker.play(ROOM, "http://radio.example.com/live", false).unwrap();

    set_uri.assert();
    get_volume.assert();
    set_volume.assert();
    play.assert();
}

#[test]
fn test_set_volume_delta_is_clamped_to_max() {
    let mut server = Server::new();
    let get_volume = rendering(&mut server, "GetVolume", Matcher::Any, "<CurrentVolume>58</CurrentVolume>");
    let set_volume = rendering(
        &mut server,
        "SetVolume",
        Matcher::Regex("<Channel>Master</Channel><DesiredVolume>60</DesiredVolume>".to_string()),
        "",
    );

    let (mut speaker, _) = speaker_on(port_of(&server));
    assert_eq!(speaker.set_volume_delta(ROOM, 5), Ok(60));

    get_volume.assert();
    set_volume.assert();
}

#[test]
fn test_transport_state() {
    let mut server = Server::new();
    let info = av_transport(
        &mut server,
        "GetTransportInfo",
        Matcher::Any,
        "<CurrentTransportState>PLAYING</CurrentTransportState><CurrentTransportStatus>OK</CurrentTransportStatus><CurrentSpeed>1</CurrentSpeed>",
    );

    let (mut speaker, _) = speaker_on(port_of(&server));
    assert_eq!(speaker.transport_state(ROOM), Ok(TransportState::Playing));
    info.assert();
}

#[test]
fn test_soap_fault_is_rejected() {
    let mut server = Server::new();
    let fault = server
        .mock("POST", "/MediaRenderer/AVTransport/Control")
        .with_status(500)
        .with_body(
            r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>701</errorCode></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#,
        )
        .create();

    let (mut speaker, calls) = speaker_on(port_of(&server));
    let result = speaker.next(ROOM);

    assert_eq!(
        result,
        Err(BackendError::rejected("SOAP fault: error code 701"))
    );
    fault.assert();

    // a fault keeps the cached device
    let _ = speaker.next(ROOM);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_network_error_forgets_device() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let (mut speaker, calls) = speaker_on(port);

    assert!(matches!(speaker.stop(ROOM), Err(BackendError::Unavailable(_))));
    assert!(matches!(speaker.stop(ROOM), Err(BackendError::Unavailable(_))));
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_unknown_room_is_rejected() {
    let server = Server::new();
    let (mut speaker, _) = speaker_on(port_of(&server));

    assert_eq!(
        speaker.stop("Attic"),
        Err(BackendError::rejected("no Sonos speaker found in room 'Attic'"))
    );
}

#[test]
fn test_unsupported_uri_is_rejected_without_lookup() {
    let server = Server::new();
    let (mut speaker, calls) = speaker_on(port_of(&server));

    let result = speaker.play(ROOM, "file:///music/song.mp3", false);

    assert!(matches!(result, Err(BackendError::Rejected(_))));
    assert_eq!(calls.get(), 0);
}

const DEVICE_DESCRIPTION: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:ZonePlayer:1</deviceType>
    <friendlyName>127.0.0.1 - Sonos One - RINCON_000E58TEST01400</friendlyName>
    <manufacturer>Sonos, Inc.</manufacturer>
    <modelNumber>S18</modelNumber>
    <modelName>Sonos One</modelName>
    <UDN>uuid:RINCON_000E58TEST01400</UDN>
    <roomName>Living Room</roomName>
    <displayName>One</displayName>
  </device>
</root>"#;

#[test]
fn test_resolve_by_address() {
    let mut server = Server::new();
    let description = server
        .mock("GET", "/xml/device_description.xml")
        .with_status(200)
        .with_body(DEVICE_DESCRIPTION)
        .create();

    let discovery = Discovery::with_port(Duration::from_secs(2), port_of(&server)).unwrap();
    let device = discovery.resolve("127.0.0.1").unwrap();

    description.assert();
    assert_eq!(device.room_name, ROOM);
    assert_eq!(device.uid(), "RINCON_000E58TEST01400");
    assert_eq!(device.model_name, "Sonos One");
}

fn zone_group_state(members: &str) -> String {
    let state = format!(
        r#"<ZoneGroupState><ZoneGroups><ZoneGroup Coordinator="RINCON_000E58LEFT01400" ID="RINCON_000E58LEFT01400:7">{members}</ZoneGroup></ZoneGroups><VanishedDevices/></ZoneGroupState>"#
    );
    let escaped = state
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;");
    envelope(
        "GetZoneGroupState",
        "ZoneGroupTopology",
        &format!("<ZoneGroupState>{escaped}</ZoneGroupState>"),
    )
}

#[test]
fn test_resolve_prefers_group_coordinator() {
    let mut server = Server::new();
    let _description = server
        .mock("GET", "/xml/device_description.xml")
        .with_status(200)
        .with_body(DEVICE_DESCRIPTION)
        .create();
    let topology = server
        .mock("POST", "/ZoneGroupTopology/Control")
        .match_header(
            "soapaction",
            "\"urn:schemas-upnp-org:service:ZoneGroupTopology:1#GetZoneGroupState\"",
        )
        .with_status(200)
        .with_body(zone_group_state(concat!(
            r#"<ZoneGroupMember UUID="RINCON_000E58LEFT01400" Location="http://127.0.0.2:1400/xml/device_description.xml" ZoneName="Living Room"/>"#,
            r#"<ZoneGroupMember UUID="RINCON_000E58TEST01400" Location="http://127.0.0.1:1400/xml/device_description.xml" ZoneName="Living Room"/>"#,
        )))
        .expect(1)
        .create();

    let discovery = Discovery::with_port(Duration::from_secs(2), port_of(&server)).unwrap();
    let device = discovery.resolve("127.0.0.1").unwrap();

    topology.assert();
    assert_eq!(device.uid(), "RINCON_000E58LEFT01400");
    assert_eq!(device.ip_address, "127.0.0.2");
    assert_eq!(device.port, 1400);
    assert_eq!(device.room_name, ROOM);
}

#[test]
fn test_resolve_keeps_coordinating_speaker() {
    let mut server = Server::new();
    let _description = server
        .mock("GET", "/xml/device_description.xml")
        .with_status(200)
        .with_body(DEVICE_DESCRIPTION)
        .create();
    let _topology = server
        .mock("POST", "/ZoneGroupTopology/Control")
        .with_status(200)
        .with_body(zone_group_state(concat!(
            r#"<ZoneGroupMember UUID="RINCON_000E58TEST01400" Location="http://127.0.0.1:1400/xml/device_description.xml" ZoneName="Living Room"/>"#,
        )).replace("RINCON_000E58LEFT01400", "RINCON_000E58TEST01400"))
        .create();

    let discovery = Discovery::with_port(Duration::from_secs(2), port_of(&server)).unwrap();
    let device = discovery.resolve("127.0.0.1").unwrap();

    assert_eq!(device.uid(), "RINCON_000E58TEST01400");
    assert_eq!(device.model_name, "Sonos One");
}

#[test]
fn test_describe_rejects_non_sonos_device() {
    let mut server = Server::new();
    let _description = server
        .mock("GET", "/xml/device_description.xml")
        .with_status(200)
        .with_body(
            r#"<root><device>
                <deviceType>urn:schemas-upnp-org:device:InternetGatewayDevice:1</deviceType>
                <friendlyName>Router</friendlyName>
                <manufacturer>Other Company</manufacturer>
                <modelName>Router</modelName>
                <UDN>uuid:ROUTER123</UDN>
            </device></root>"#,
        )
        .create();

    let discovery = Discovery::with_port(Duration::from_secs(2), port_of(&server)).unwrap();
    assert!(matches!(
        discovery.describe("127.0.0.1"),
        Err(SonosError::Discovery(DiscoveryError::InvalidDevice(_)))
    ));
}

#[test]
fn test_describe_http_error_is_network() {
    let mut server = Server::new();
    let _missing = server
        .mock("GET", "/xml/device_description.xml")
        .with_status(404)
        .create();

    let discovery = Discovery::with_port(Duration::from_secs(2), port_of(&server)).unwrap();
    let error = discovery.describe("127.0.0.1").unwrap_err();
    assert!(error.is_network());
}
