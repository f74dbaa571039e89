use std::fmt;

/// Failures while turning raw bytes into a structured message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SipParseError {
    /// The message violates the grammar; the token names the offending part.
    MalformedMessage(&'static str),
    /// A field every message must carry was absent.
    MissingMandatoryField(&'static str),
    /// A single message exceeded the framing buffer cap.
    FrameTooLarge,
}

impl fmt::Display for SipParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedMessage(what) => write!(f, "Malformed message: {what}"),
            Self::MissingMandatoryField(name) => {
                write!(f, "Missing mandatory field: {name}")
            }
            Self::FrameTooLarge => write!(f, "Message exceeds the framing buffer"),
        }
    }
}

impl std::error::Error for SipParseError {}

/// Failures while checking a message against the dialog's routing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingError {
    /// A field contradicts what this dialog has already established.
    Mismatch(&'static str),
    /// A response arrived that does not answer any request we have sent.
    OutOfSequence,
    /// Routing was asked to act before local or remote identity was known.
    Uninitialized,
    /// Response routing was requested with no received request on record.
    NoPriorRequest,
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch(field) => write!(f, "Field does not match dialog state: {field}"),
            Self::OutOfSequence => write!(f, "Response does not match the sent request"),
            Self::Uninitialized => write!(f, "Routing state is not initialized"),
            Self::NoPriorRequest => write!(f, "No prior request on record"),
        }
    }
}

impl std::error::Error for RoutingError {}

/// Top-level error for the signaling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SipError {
    Parse(SipParseError),
    Routing(RoutingError),
    /// The event or wire channel's receiver is gone.
    ChannelClosed,
}

impl fmt::Display for SipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Routing(e) => write!(f, "{e}"),
            Self::ChannelClosed => write!(f, "Signaling channel closed"),
        }
    }
}

impl std::error::Error for SipError {}

impl From<SipParseError> for SipError {
    fn from(e: SipParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<RoutingError> for SipError {
    fn from(e: RoutingError) -> Self {
        Self::Routing(e)
    }
}
