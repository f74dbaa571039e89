use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::sdp::session::SessionDescription;
use crate::sip::routing::RoutingInfo;
use crate::sip::sip_error::SipParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Invite,
    Ack,
    Bye,
    Cancel,
    Options,
    Register,
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Invite => "INVITE",
            Self::Ack => "ACK",
            Self::Bye => "BYE",
            Self::Cancel => "CANCEL",
            Self::Options => "OPTIONS",
            Self::Register => "REGISTER",
        })
    }
}

impl FromStr for RequestMethod {
    type Err = SipParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVITE" => Ok(Self::Invite),
            "ACK" => Ok(Self::Ack),
            "BYE" => Ok(Self::Bye),
            "CANCEL" => Ok(Self::Cancel),
            "OPTIONS" => Ok(Self::Options),
            "REGISTER" => Ok(Self::Register),
            _ => Err(SipParseError::MalformedMessage("request method")),
        }
    }
}

/// Response classes we send or act on. Unknown codes inside a class are
/// folded to the nearest member by [`from_code`](Self::from_code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Trying,
    Ringing,
    Ok,
    BadRequest,
    NotFound,
    RequestTimeout,
    CallDoesNotExist,
    MessageTooLarge,
    Decline,
}

impl ResponseType {
    #[must_use]
    pub const fn as_code(self) -> u16 {
        match self {
            Self::Trying => 100,
            Self::Ringing => 180,
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::RequestTimeout => 408,
            Self::CallDoesNotExist => 481,
            Self::MessageTooLarge => 513,
            Self::Decline => 603,
        }
    }

    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Trying => "Trying",
            Self::Ringing => "Ringing",
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::RequestTimeout => "Request Timeout",
            Self::CallDoesNotExist => "Call/Transaction Does Not Exist",
            Self::MessageTooLarge => "Message Too Large",
            Self::Decline => "Decline",
        }
    }

    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            100 => Some(Self::Trying),
            180 => Some(Self::Ringing),
            200 => Some(Self::Ok),
            400 => Some(Self::BadRequest),
            404 => Some(Self::NotFound),
            408 => Some(Self::RequestTimeout),
            481 => Some(Self::CallDoesNotExist),
            513 => Some(Self::MessageTooLarge),
            603 => Some(Self::Decline),
            _ => None,
        }
    }

    /// A final response ends the transaction; provisional ones (1xx) do not.
    #[must_use]
    pub const fn is_final(self) -> bool {
        self.as_code() >= 200
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_code(), self.reason())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    None,
    Sdp,
    Unknown(String),
}

impl ContentType {
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "application/sdp" => Self::Sdp,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Sdp => f.write_str("application/sdp"),
            Self::Unknown(s) => f.write_str(s),
        }
    }
}

/// Message payload after content-type dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    None,
    Sdp(SessionDescription),
    /// A body we carry but do not understand.
    Opaque(String),
}

impl Content {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The body this content renders to; its length is what Content-Length
    /// declares.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Sdp(sdp) => sdp.to_wire(),
            Self::Opaque(body) => body.clone(),
        }
    }
}

/// The fields shared by requests and responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipMessageHeader {
    pub routing: RoutingInfo,
    pub call_id: String,
    pub cseq: u32,
    pub cseq_method: RequestMethod,
    pub content_type: ContentType,
    pub content_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipRequest {
    pub method: RequestMethod,
    pub request_uri: String,
    pub message: SipMessageHeader,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipResponse {
    pub response: ResponseType,
    pub message: SipMessageHeader,
}

/// A fresh Call-ID: an unguessable token at the local host.
#[must_use]
pub fn generate_call_id(host: &str) -> String {
    let token = OsRng.next_u64();
    format!("{token:016x}@{host}")
}
