use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Which half of the media stream a candidate serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Rtp,
    Rtcp,
}

impl Component {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Rtp => 1,
            Self::Rtcp => 2,
        }
    }

    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Rtp),
            2 => Some(Self::Rtcp),
            _ => None,
        }
    }
}

/// A connectivity candidate reported by the ICE subsystem.
///
/// Foundation, priority and type tag come from the gatherer and pass through
/// the signaling core unmodified; only address, port and component are
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub foundation: String,
    pub component: Component,
    pub transport: String,
    pub priority: u32,
    pub address: IpAddr,
    pub port: u16,
    pub cand_type: String,
}

impl Candidate {
    #[must_use]
    pub fn host(address: IpAddr, port: u16, component: Component) -> Self {
        Self {
            foundation: "1".to_string(),
            component,
            transport: "UDP".to_string(),
            priority: 0,
            address,
            port,
            cand_type: "host".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateParseError(pub &'static str);

impl fmt::Display for CandidateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid candidate attribute: {}", self.0)
    }
}
impl std::error::Error for CandidateParseError {}

/// The `a=candidate:` attribute value form:
/// `<foundation> <component> <transport> <priority> <address> <port> typ <type>`
impl FromStr for Candidate {
    type Err = CandidateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut it = s.split_whitespace();
        let foundation = it.next().ok_or(CandidateParseError("foundation"))?;
        let component = it
            .next()
            .and_then(|t| t.parse::<u8>().ok())
            .and_then(Component::from_id)
            .ok_or(CandidateParseError("component"))?;
        let transport = it.next().ok_or(CandidateParseError("transport"))?;
        let priority = it
            .next()
            .and_then(|t| t.parse::<u32>().ok())
            .ok_or(CandidateParseError("priority"))?;
        let address = it
            .next()
            .and_then(|t| t.parse::<IpAddr>().ok())
            .ok_or(CandidateParseError("address"))?;
        let port = it
            .next()
            .and_then(|t| t.parse::<u16>().ok())
            .ok_or(CandidateParseError("port"))?;
        if it.next() != Some("typ") {
            return Err(CandidateParseError("typ"));
        }
        let cand_type = it.next().ok_or(CandidateParseError("type"))?;
        if it.next().is_some() {
            return Err(CandidateParseError("trailing tokens"));
        }

        Ok(Self {
            foundation: foundation.to_string(),
            component,
            transport: transport.to_string(),
            priority,
            address,
            port,
            cand_type: cand_type.to_string(),
        })
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component.id(),
            self.transport,
            self.priority,
            self.address,
            self.port,
            self.cand_type
        )
    }
}
