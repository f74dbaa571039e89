use std::fmt;
use std::str::FromStr;

/// One `a=rtpmap` codec mapping: numeric payload type plus codec description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpMap {
    pub payload_type: u8,
    pub encoding_name: String, // leave as-is; case-insensitive in SDP
    pub clock_rate: u32,
    pub encoding_params: Option<u16>, // usually channels for audio
}

impl RtpMap {
    #[must_use]
    pub fn new(payload_type: u8, encoding_name: &str, clock_rate: u32) -> Self {
        Self {
            payload_type,
            encoding_name: encoding_name.to_string(),
            clock_rate,
            encoding_params: None,
        }
    }

    #[must_use]
    pub const fn with_params(mut self, params: u16) -> Self {
        self.encoding_params = Some(params);
        self
    }

    /// Case-insensitive codec name comparison, the way SDP treats encoding names.
    #[must_use]
    pub fn is_codec(&self, name: &str) -> bool {
        self.encoding_name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtpMapParseError {
    MissingParts,
    InvalidPayloadType,
    InvalidClockRate,
    TrailingGarbage,
}

impl fmt::Display for RtpMapParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RtpMapParseError::*;
        match self {
            MissingParts => write!(f, "Missing required parts in rtpmap"),
            InvalidPayloadType => write!(f, "Invalid payload type"),
            InvalidClockRate => write!(f, "Invalid clock rate"),
            TrailingGarbage => write!(f, "Unexpected trailing tokens after rtpmap"),
        }
    }
}
impl std::error::Error for RtpMapParseError {}

impl FromStr for RtpMap {
    type Err = RtpMapParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use RtpMapParseError::*;

        // Accept strings like: "96 opus/48000/2" or "0 PCMU/8000"
        // We expect: <pt> <encoding>/<clock>[/<params>]
        let s = s.trim();

        let mut it = s.split_whitespace();
        let pt_str = it.next().ok_or(MissingParts)?;
        let rhs = it.next().ok_or(MissingParts)?;

        // Extra tokens (beyond "<pt> <rhs>") are suspicious; fail explicitly
        if it.next().is_some() {
            return Err(TrailingGarbage);
        }

        let payload_type: u8 = pt_str.parse().map_err(|_| InvalidPayloadType)?;
        if payload_type > 127 {
            return Err(InvalidPayloadType);
        }

        let mut parts = rhs.splitn(3, '/');
        let encoding_name = parts.next().ok_or(MissingParts)?.trim().to_string();
        let clock_rate: u32 = parts
            .next()
            .ok_or(MissingParts)?
            .trim()
            .parse()
            .map_err(|_| InvalidClockRate)?;

        // Optional third part; "0" channels is meaningless and dropped to None
        let encoding_params = match parts.next() {
            None => None,
            Some(p) => {
                let p = p.trim();
                if p.is_empty() {
                    None
                } else {
                    let v: u16 = p.parse().map_err(|_| MissingParts)?;
                    if v == 0 { None } else { Some(v) }
                }
            }
        };

        Ok(Self {
            payload_type,
            encoding_name,
            clock_rate,
            encoding_params,
        })
    }
}

impl fmt::Display for RtpMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.payload_type, self.encoding_name, self.clock_rate
        )?;
        if let Some(p) = self.encoding_params {
            write!(f, "/{p}")?;
        }
        Ok(())
    }
}
