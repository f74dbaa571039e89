use std::net::SocketAddr;

/// A nominated connection: the address we send from and the address the peer
/// receives at, for one component of one media stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NominatedPair {
    pub local: SocketAddr,
    pub remote: SocketAddr,
}

/// Nomination outcome for one media line. RTP and RTCP nominate independently;
/// a media line is only usable when both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaNomination {
    pub rtp: Option<NominatedPair>,
    pub rtcp: Option<NominatedPair>,
}

impl MediaNomination {
    /// True when both components nominated, i.e. the media line's addresses
    /// may be rewritten.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.rtp.is_some() && self.rtcp.is_some()
    }
}

/// Per-session nomination result, one entry per media line in fixed
/// [audio, video] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionNomination {
    pub audio: MediaNomination,
    pub video: MediaNomination,
}
