use std::fmt;

use crate::sdp::rtp_map::RtpMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Other(String),
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MediaKind {
    fn from(s: &str) -> Self {
        match s {
            "audio" => Self::Audio,
            "video" => Self::Video,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Stream direction attributes (`a=sendrecv` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAttribute {
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl MediaAttribute {
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "sendrecv" => Some(Self::SendRecv),
            "sendonly" => Some(Self::SendOnly),
            "recvonly" => Some(Self::RecvOnly),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for MediaAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SendRecv => "sendrecv",
            Self::SendOnly => "sendonly",
            Self::RecvOnly => "recvonly",
            Self::Inactive => "inactive",
        })
    }
}

/// One `m=` section of a session description.
///
/// `receive_port` 0 is the sentinel for a failed port allocation; a non-zero
/// port is reserved for this stream until the description is released.
/// `connection_address` is empty while the global `c=` applies and is only set
/// when a nominated address overrides it per media line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescription {
    pub kind: MediaKind,
    pub receive_port: u16,
    pub proto: String, // transport tag, "RTP/AVP" here
    /// Declared payload numbers from the `m=` line, dynamic numbers first.
    pub payload_types: Vec<u8>,
    /// Codec mappings in offer-preference order.
    pub codecs: Vec<RtpMap>,
    pub connection_address: String,
    pub attributes: Vec<MediaAttribute>,
}

impl MediaDescription {
    #[must_use]
    pub fn new(kind: MediaKind, receive_port: u16, proto: &str) -> Self {
        Self {
            kind,
            receive_port,
            proto: proto.to_string(),
            payload_types: Vec::new(),
            codecs: Vec::new(),
            connection_address: String::new(),
            attributes: Vec::new(),
        }
    }

    /// The `m=` line format token list, space-separated.
    #[must_use]
    pub fn fmt_tokens(&self) -> String {
        self.payload_types
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
