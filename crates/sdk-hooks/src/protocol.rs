//! Wire-protocol identifiers and negotiation.
//!
//! The SDK advertises the protocols it speaks as an ordered list in its
//! configuration (`config.protocol-version`). The CLI picks the first entry it
//! understands. Unknown entries are skipped, which lets an SDK advertise a
//! newer protocol ahead of one this crate knows.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a hook wire protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Legacy protocol: the response is the trimmed stdout (or its last line for `Start`).
    #[default]
    Default,
    /// The payload is wrapped between two occurrences of a random boundary token.
    MessageBoundaries,
    /// A well-formed identifier this crate does not recognise.
    Unknown(String),
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Default => "default",
            Protocol::MessageBoundaries => "message-boundaries",
            Protocol::Unknown(s) => s,
        }
    }

    /// `true` for the two protocols this crate implements.
    pub fn is_valid(&self) -> bool {
        !matches!(self, Protocol::Unknown(_))
    }
}

impl From<&str> for Protocol {
    fn from(s: &str) -> Self {
        match s {
            "default" => Protocol::Default,
            "message-boundaries" => Protocol::MessageBoundaries,
            other => Protocol::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Protocol::from(s.as_str()))
    }
}

/// Protocols supported by the SDK, most preferred first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersions(pub Vec<Protocol>);

impl ProtocolVersions {
    /// The first valid protocol in the list, or [`Protocol::Default`].
    pub fn preferred(&self) -> Protocol {
        self.0
            .iter()
            .find(|p| p.is_valid())
            .cloned()
            .unwrap_or_default()
    }
}

impl<P: Into<Protocol>> FromIterator<P> for ProtocolVersions {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
