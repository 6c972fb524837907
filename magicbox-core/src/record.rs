//! Raw records as they come off a tag.

use std::fmt;

/// Kind of a record scanned from a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// NDEF well-known `U` record (or an absolute-URI record)
    Uri,
    /// NDEF well-known `T` record
    Text,
}

/// One NDEF-equivalent record scanned from a tag.
///
/// A tag yields an ordered sequence of these. The payload is already decoded:
/// URI prefixes are expanded and text records have their language code stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawRecord {
    pub kind: RecordKind,
    pub payload: String,
}

impl RawRecord {
    /// Create a `uri` record
    pub fn uri(payload: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Uri,
            payload: payload.into(),
        }
    }

    /// Create a `text` record
    pub fn text(payload: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Text,
            payload: payload.into(),
        }
    }

    pub fn is_uri(&self) -> bool {
        self.kind == RecordKind::Uri
    }

    pub fn is_text(&self) -> bool {
        self.kind == RecordKind::Text
    }
}

impl fmt::Display for RawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RecordKind::Uri => write!(f, "uri:{:?}", self.payload),
            RecordKind::Text => write!(f, "text:{:?}", self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        assert!(RawRecord::uri("https://example.com").is_uri());
        assert!(RawRecord::text("play").is_text());
        assert!(!RawRecord::text("play").is_uri());
    }

    #[test]
    fn test_display() {
        assert_eq!(RawRecord::text("name:Favs").to_string(), "text:\"name:Favs\"");
        assert_eq!(
            RawRecord::uri("https://example.com").to_string(),
            "uri:\"https://example.com\""
        );
    }
}
