use std::fmt;
use std::num::ParseIntError;

#[derive(Debug)]
pub enum SdpError {
    Missing(&'static str),
    Invalid(&'static str),
    ParseInt(ParseIntError),
    AddrType,
}

impl From<ParseIntError> for SdpError {
    fn from(e: ParseIntError) -> Self {
        Self::ParseInt(e)
    }
}

impl fmt::Display for SdpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(msg) => write!(f, "Missing field: {}", msg),
            Self::Invalid(msg) => write!(f, "Invalid field: {}", msg),
            Self::ParseInt(e) => write!(f, "Parse int error: {}", e),
            Self::AddrType => write!(f, "Invalid address type"),
        }
    }
}

impl std::error::Error for SdpError {}
