//! Streaming-service share links
//!
//! Spotify, Apple Music, TIDAL and Deezer share URLs cannot be played by
//! URL. They are rewritten into the service's Sonos URI plus DIDL-Lite
//! metadata naming the service account, and then enqueued.

use std::fmt;

use url::Url;

/// Streaming services that publish share links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicService {
    Spotify,
    AppleMusic,
    Tidal,
    Deezer,
}

impl MusicService {
    /// Sonos service number used in the account descriptor
    pub fn service_number(&self) -> u32 {
        match self {
            MusicService::Spotify => 2311,
            MusicService::AppleMusic => 52231,
            MusicService::Tidal => 44551,
            MusicService::Deezer => 519,
        }
    }
}

impl fmt::Display for MusicService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MusicService::Spotify => write!(f, "Spotify"),
            MusicService::AppleMusic => write!(f, "Apple Music"),
            MusicService::Tidal => write!(f, "TIDAL"),
            MusicService::Deezer => write!(f, "Deezer"),
        }
    }
}

/// What a share link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareKind {
    Album,
    Track,
    Playlist,
    Episode,
    Show,
}

impl ShareKind {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "album" => Some(ShareKind::Album),
            "track" | "song" => Some(ShareKind::Track),
            "playlist" => Some(ShareKind::Playlist),
            "episode" => Some(ShareKind::Episode),
            "show" => Some(ShareKind::Show),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ShareKind::Album => "album",
            ShareKind::Track => "track",
            ShareKind::Playlist => "playlist",
            ShareKind::Episode => "episode",
            ShareKind::Show => "show",
        }
    }
}

/// A recognised share link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub service: MusicService,
    pub kind: ShareKind,
    /// Service-specific item id, already percent-encoded for Sonos
    pub encoded_id: String,
}

impl ShareLink {
    /// Recognise a share link, or `None` for any other URI
    pub fn parse(uri: &str) -> Option<Self> {
        if let Some(rest) = uri.strip_prefix("spotify:") {
            return parse_spotify_uri(rest);
        }

        let url = Url::parse(uri).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?.to_ascii_lowercase();
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        if host.ends_with("spotify.com") {
            parse_spotify_path(&segments)
        } else if host == "music.apple.com" {
            parse_apple_music(&url, &segments)
        } else if host.ends_with("tidal.com") {
            parse_tidal(&segments)
        } else if host.ends_with("deezer.com") {
            parse_deezer(&segments)
        } else {
            None
        }
    }

    // (URI prefix, item id prefix, UPnP class). Spotify items use their own
    // item id keys; the other services share the container keys.
    fn magic(&self) -> (&'static str, &'static str, &'static str) {
        let spotify = self.service == MusicService::Spotify;
        match self.kind {
            ShareKind::Album => (
                "x-rincon-cpcontainer:1004206c",
                if spotify { "00040000" } else { "1004206c" },
                "object.container.album.musicAlbum",
            ),
            ShareKind::Track => (
                "",
                if spotify { "00032020" } else { "10032020" },
                "object.item.audioItem.musicTrack",
            ),
            ShareKind::Episode => ("", "00032020", "object.item.audioItem.podcast"),
            ShareKind::Playlist | ShareKind::Show => (
                "x-rincon-cpcontainer:1006206c",
                "1006206c",
                "object.container.playlistContainer",
            ),
        }
    }

    /// URI to enqueue
    pub fn enqueue_uri(&self) -> String {
        let (prefix, _, _) = self.magic();
        format!("{prefix}{}", self.encoded_id)
    }

    /// DIDL-Lite metadata naming the item and the service account
    pub fn didl_metadata(&self) -> String {
        let (_, key, class) = self.magic();
        let number = self.service.service_number();
        format!(
            concat!(
                r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
                r#"xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" "#,
                r#"xmlns:r="urn:schemas-rinconnetworks-com:metadata-1-0/" "#,
                r#"xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/">"#,
                r#"<item id="{key}{id}" parentID="" restricted="true">"#,
                r#"<dc:title></dc:title><upnp:class>{class}</upnp:class>"#,
                r#"<desc id="cdudn" nameSpace="urn:schemas-rinconnetworks-com:metadata-1-0/">"#,
                r#"SA_RINCON{number}_X_#Svc{number}-0-Token</desc>"#,
                r#"</item></DIDL-Lite>"#
            ),
            key = key,
            id = self.encoded_id,
            class = class,
            number = number,
        )
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.service, self.kind.as_str())
    }
}

fn is_id(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn spotify(kind: ShareKind, id: &str) -> Option<ShareLink> {
    if !is_id(id) {
        return None;
    }
    Some(ShareLink {
        service: MusicService::Spotify,
        kind,
        encoded_id: format!("spotify%3a{}%3a{id}", kind.as_str()),
    })
}

// spotify:album:ID
fn parse_spotify_uri(rest: &str) -> Option<ShareLink> {
    let mut parts = rest.split(':');
    let kind = ShareKind::parse(parts.next()?)?;
    spotify(kind, parts.next()?)
}

// open.spotify.com/[intl-xx/]album/ID
fn parse_spotify_path(segments: &[&str]) -> Option<ShareLink> {
    segments.windows(2).find_map(|pair| {
        let kind = ShareKind::parse(pair[0])?;
        (kind != ShareKind::Track || pair[0] == "track")
            .then(|| spotify(kind, pair[1]))
            .flatten()
    })
}

// music.apple.com/{cc}/album/{name}/{id}[?i={track}]
// music.apple.com/{cc}/playlist/{name}/pl.{id}
// music.apple.com/{cc}/song/{name}/{id}
fn parse_apple_music(url: &Url, segments: &[&str]) -> Option<ShareLink> {
    let (kind, id) = match segments {
        [_, "album", .., id] => {
            let track = url
                .query_pairs()
                .find(|(key, _)| key == "i")
                .map(|(_, value)| value.into_owned());
            match track {
                Some(track) => (ShareKind::Track, format!("song:{track}")),
                None => (ShareKind::Album, format!("album:{id}")),
            }
        }
        [_, "song", .., id] => (ShareKind::Track, format!("song:{id}")),
        [_, "playlist", .., id] if id.starts_with("pl.") => {
            (ShareKind::Playlist, format!("playlist:{id}"))
        }
        _ => return None,
    };

    let bare = id.split_once(':').map(|(_, bare)| bare).unwrap_or_default();
    if bare.is_empty() || !bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-') {
        return None;
    }

    Some(ShareLink {
        service: MusicService::AppleMusic,
        kind,
        encoded_id: id.replace(':', "%3a"),
    })
}

// tidal.com/[browse/]album/ID
fn parse_tidal(segments: &[&str]) -> Option<ShareLink> {
    segments.windows(2).find_map(|pair| {
        let kind = ShareKind::parse(pair[0])?;
        let valid = matches!(kind, ShareKind::Album | ShareKind::Track | ShareKind::Playlist)
            && pair[0] != "song"
            && !pair[1].is_empty()
            && pair[1].chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then(|| ShareLink {
            service: MusicService::Tidal,
            kind,
            encoded_id: format!("{}%2f{}", kind.as_str(), pair[1]),
        })
    })
}

// deezer.com/[lang/]album/ID
fn parse_deezer(segments: &[&str]) -> Option<ShareLink> {
    segments.windows(2).find_map(|pair| {
        let kind = ShareKind::parse(pair[0])?;
        let valid = matches!(kind, ShareKind::Album | ShareKind::Track | ShareKind::Playlist)
            && pair[0] != "song"
            && !pair[1].is_empty()
            && pair[1].chars().all(|c| c.is_ascii_digit());
        valid.then(|| ShareLink {
            service: MusicService::Deezer,
            kind,
            encoded_id: format!("{}-{}", kind.as_str(), pair[1]),
        })
    })
}
