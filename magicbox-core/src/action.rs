//! Tag classification
//!
//! A scanned tag is either a *media* tag (a URI plus optional metadata text
//! records) or a *control* tag (a single plain-text command token). The
//! [`classify`] function maps any record sequence to exactly one [`Action`].

use std::fmt;

use crate::record::RawRecord;

/// Which backend a media tag targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaKind {
    /// Music on the networked speaker (the default)
    #[default]
    Audio,
    /// A stream shown full-screen on the TV
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Universal control commands carried by control tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    Play,
    Stop,
    Next,
    Prev,
    VolUp,
    VolDown,
    TvOn,
    TvOff,
}

impl ControlCommand {
    /// Every command, in token-table order
    pub const ALL: [ControlCommand; 8] = [
        ControlCommand::Play,
        ControlCommand::Stop,
        ControlCommand::Next,
        ControlCommand::Prev,
        ControlCommand::VolUp,
        ControlCommand::VolDown,
        ControlCommand::TvOn,
        ControlCommand::TvOff,
    ];

    /// The literal token written on the tag
    pub fn token(&self) -> &'static str {
        match self {
            ControlCommand::Play => "play",
            ControlCommand::Stop => "stop",
            ControlCommand::Next => "next",
            ControlCommand::Prev => "prev",
            ControlCommand::VolUp => "vol_up",
            ControlCommand::VolDown => "vol_down",
            ControlCommand::TvOn => "tv_on",
            ControlCommand::TvOff => "tv_off",
        }
    }

    /// Match a text payload against the token table.
    ///
    /// Surrounding whitespace is ignored and matching is case-insensitive.
    pub fn from_token(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|command| command.token().eq_ignore_ascii_case(text))
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The classified intent of a scanned tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    PlayMedia {
        uri: String,
        kind: MediaKind,
        display_name: Option<String>,
        shuffle: bool,
    },
    Control {
        command: ControlCommand,
    },
    /// No URI and no recognised command
    Unrecognized,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PlayMedia {
                uri,
                kind,
                display_name,
                shuffle,
            } => {
                write!(f, "play {kind} {uri}")?;
                if let Some(name) = display_name {
                    write!(f, " ({name})")?;
                }
                if *shuffle {
                    write!(f, " [shuffle]")?;
                }
                Ok(())
            }
            Action::Control { command } => write!(f, "control {command}"),
            Action::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Optional metadata attached to a media tag through `prefix:value` text records
#[derive(Debug, Default)]
struct MediaMetadata {
    display_name: Option<String>,
    shuffle: bool,
    kind: MediaKind,
}

impl MediaMetadata {
    /// Later records override earlier ones; unknown prefixes are ignored.
    fn collect<'a>(texts: impl Iterator<Item = &'a str>) -> Self {
        let mut metadata = Self::default();

        for text in texts {
            let Some((prefix, value)) = text.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match prefix.trim().to_ascii_lowercase().as_str() {
                "name" => {
                    metadata.display_name = (!value.is_empty()).then(|| value.to_string());
                }
                "mode" => metadata.shuffle = value.eq_ignore_ascii_case("shuffle"),
                "type" => {
                    metadata.kind = if value.eq_ignore_ascii_case("video") {
                        MediaKind::Video
                    } else {
                        MediaKind::Audio
                    };
                }
                _ => {}
            }
        }

        metadata
    }
}

/// Classify a tag's records into an [`Action`].
///
/// Pure and total: every input maps to exactly one variant.
///
/// 1. The first `uri` record makes this a media tag; metadata comes from the
///    `name:`, `mode:` and `type:` text records.
/// 2. Without a URI, exactly one text record must match a command token.
/// 3. Anything else is [`Action::Unrecognized`].
pub fn classify(records: &[RawRecord]) -> Action {
    let texts = || {
        records
            .iter()
            .filter(|record| record.is_text())
            .map(|record| record.payload.as_str())
    };

    if let Some(uri) = records.iter().find(|record| record.is_uri()) {
        let metadata = MediaMetadata::collect(texts());
        return Action::PlayMedia {
            uri: uri.payload.clone(),
            kind: metadata.kind,
            display_name: metadata.display_name,
            shuffle: metadata.shuffle,
        };
    }

    let mut commands = texts().filter_map(ControlCommand::from_token);
    match (commands.next(), commands.next()) {
        (Some(command), None) => Action::Control { command },
        _ => Action::Unrecognized,
    }
}
