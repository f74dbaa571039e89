use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationError {
    /// No free RTP/RTCP port pair remained for a new media stream.
    PortsExhausted,
    /// The remote offer failed validation (address, version or codec set).
    OfferRejected,
    /// ICE nomination concluded without a usable connection.
    NegotiationFailed,
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortsExhausted => write!(f, "No free media port pairs remain"),
            Self::OfferRejected => write!(f, "Remote session description was not acceptable"),
            Self::NegotiationFailed => write!(f, "Connectivity nomination failed"),
        }
    }
}

impl std::error::Error for NegotiationError {}
