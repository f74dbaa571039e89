use std::fmt::Write as _;

use crate::ice::candidate::Candidate;
use crate::sdp::addr_type::AddrType;
use crate::sdp::media::{MediaAttribute, MediaDescription, MediaKind};
use crate::sdp::rtp_map::RtpMap;
use crate::sdp::sdp_error::SdpError;
use crate::sdp::time_desc::TimeWindow;

/// A complete session description: the `application/sdp` payload of an offer
/// or answer.
///
/// Media order is fixed as [audio, video] when generated locally; a
/// description without any media section never parses (`Missing("m=")`).
/// `sess_v` increments on every renegotiation round.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDescription {
    pub version: u8,
    pub originator_username: String,
    pub sess_id: u64,
    pub sess_v: u64,
    pub host_nettype: String,
    pub host_addrtype: AddrType,
    pub host_address: String,
    pub session_name: String,
    pub session_description: String,
    pub connection_nettype: String,
    pub connection_addrtype: AddrType,
    pub connection_address: String,
    pub time_window: TimeWindow,
    pub media: Vec<MediaDescription>,
    pub candidates: Vec<Candidate>,
}

impl SessionDescription {
    /// Parses the line-oriented wire form. Unknown lines and unknown `a=`
    /// attributes are tolerated; malformed known lines are not.
    ///
    /// # Errors
    /// `SdpError` naming the offending or missing line.
    pub fn parse(input: &str) -> Result<Self, SdpError> {
        let mut version: Option<u8> = None;
        let mut origin: Option<(String, u64, u64, String, AddrType, String)> = None;
        let mut session_name: Option<String> = None;
        let mut session_description = String::new();
        let mut connection: Option<(String, AddrType, String)> = None;
        let mut time_window = TimeWindow::unbounded();
        let mut media: Vec<MediaDescription> = Vec::new();
        let mut candidates: Vec<Candidate> = Vec::new();

        // Tracks whether a= / c= lines belong to the session or the last m=
        let mut in_media = false;

        for raw in input.split('\n') {
            let line = raw.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let mut it = line.splitn(2, '=');
            let (Some(prefix), Some(rest)) = (it.next(), it.next()) else {
                continue;
            };
            match prefix {
                "v" => {
                    version = Some(rest.parse::<u8>()?);
                    in_media = false;
                }
                "o" => {
                    let parts: Vec<_> = rest.split_whitespace().collect();
                    if parts.len() != 6 {
                        return Err(SdpError::Invalid("o="));
                    }
                    origin = Some((
                        parts[0].to_owned(),
                        parts[1].parse::<u64>()?,
                        parts[2].parse::<u64>()?,
                        parts[3].to_owned(),
                        parts[4].parse().map_err(|()| SdpError::AddrType)?,
                        parts[5].to_owned(),
                    ));
                    in_media = false;
                }
                "s" => {
                    session_name = Some(rest.to_string());
                    in_media = false;
                }
                "i" => {
                    if !in_media {
                        session_description = rest.to_string();
                    }
                }
                "c" => {
                    let parts: Vec<_> = rest.split_whitespace().collect();
                    if parts.len() != 3 {
                        return Err(SdpError::Invalid("c="));
                    }
                    if in_media {
                        if let Some(m) = media.last_mut() {
                            m.connection_address = parts[2].to_string();
                        }
                    } else {
                        connection = Some((
                            parts[0].to_string(),
                            parts[1].parse().map_err(|()| SdpError::AddrType)?,
                            parts[2].to_string(),
                        ));
                    }
                }
                "t" => {
                    let mut p = rest.split_whitespace();
                    let (Some(st), Some(et)) = (p.next(), p.next()) else {
                        return Err(SdpError::Invalid("t="));
                    };
                    time_window = TimeWindow::new(st.parse::<u64>()?, et.parse::<u64>()?);
                    in_media = false;
                }
                "m" => {
                    // m=<media> <port> <proto> <fmt>...
                    let mut p = rest.split_whitespace();
                    let Some(mkind) = p.next() else {
                        return Err(SdpError::Invalid("m="));
                    };
                    let Some(port_tok) = p.next() else {
                        return Err(SdpError::Invalid("m= port"));
                    };
                    let Some(proto) = p.next() else {
                        return Err(SdpError::Invalid("m= proto"));
                    };
                    let mut m =
                        MediaDescription::new(MediaKind::from(mkind), port_tok.parse::<u16>()?, proto);
                    for fmt in p {
                        m.payload_types.push(fmt.parse::<u8>()?);
                    }
                    media.push(m);
                    in_media = true;
                }
                "a" => {
                    let (key, val) = match rest.split_once(':') {
                        Some((k, v)) => (k.trim(), Some(v.trim())),
                        None => (rest.trim(), None),
                    };
                    match (key, val) {
                        ("rtpmap", Some(v)) => {
                            let rtp: RtpMap =
                                v.parse().map_err(|_| SdpError::Invalid("a=rtpmap"))?;
                            if let Some(m) = media.last_mut() {
                                m.codecs.push(rtp);
                            }
                        }
                        ("candidate", Some(v)) => {
                            // candidates live at session scope regardless of position
                            let cand: Candidate =
                                v.parse().map_err(|_| SdpError::Invalid("a=candidate"))?;
                            candidates.push(cand);
                        }
                        (dir, None) => {
                            if let (Some(attr), true) = (MediaAttribute::from_key(dir), in_media) {
                                if let Some(m) = media.last_mut() {
                                    m.attributes.push(attr);
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        let (originator_username, sess_id, sess_v, host_nettype, host_addrtype, host_address) =
            origin.ok_or(SdpError::Missing("o="))?;
        let (connection_nettype, connection_addrtype, connection_address) =
            connection.ok_or(SdpError::Missing("c="))?;
        if media.is_empty() {
            return Err(SdpError::Missing("m="));
        }

        Ok(Self {
            version: version.ok_or(SdpError::Missing("v="))?,
            originator_username,
            sess_id,
            sess_v,
            host_nettype,
            host_addrtype,
            host_address,
            session_name: session_name.ok_or(SdpError::Missing("s="))?,
            session_description,
            connection_nettype,
            connection_addrtype,
            connection_address,
            time_window,
            media,
            candidates,
        })
    }

    /// Renders the CRLF-terminated wire form, the inverse of [`parse`](Self::parse).
    #[must_use]
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        macro_rules! pushln {
            ($($arg:tt)*) => {{
                let _ = write!(out, $($arg)*);
                out.push_str("\r\n");
            }};
        }

        pushln!("v={}", self.version);
        pushln!(
            "o={} {} {} {} {} {}",
            self.originator_username,
            self.sess_id,
            self.sess_v,
            self.host_nettype,
            self.host_addrtype,
            self.host_address
        );
        pushln!("s={}", self.session_name);
        if !self.session_description.is_empty() {
            pushln!("i={}", self.session_description);
        }
        pushln!(
            "c={} {} {}",
            self.connection_nettype,
            self.connection_addrtype,
            self.connection_address
        );
        pushln!("t={} {}", self.time_window.start, self.time_window.stop);
        for cand in &self.candidates {
            pushln!("a=candidate:{cand}");
        }
        for m in &self.media {
            pushln!("m={} {} {} {}", m.kind, m.receive_port, m.proto, m.fmt_tokens());
            if !m.connection_address.is_empty() {
                pushln!(
                    "c={} {} {}",
                    self.connection_nettype,
                    self.connection_addrtype,
                    m.connection_address
                );
            }
            for codec in &m.codecs {
                pushln!("a=rtpmap:{codec}");
            }
            for attr in &m.attributes {
                pushln!("a={attr}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::ice::candidate::Component;

    const OFFER: &str = "v=0\r\n\
        o=alice 2890844526 2890844526 IN IP4 203.0.113.5\r\n\
        s=-\r\n\
        c=IN IP4 203.0.113.5\r\n\
        t=0 0\r\n\
        a=candidate:1 1 UDP 2130706431 203.0.113.5 21500 typ host\r\n\
        a=candidate:1 2 UDP 2130706430 203.0.113.5 21501 typ host\r\n\
        m=audio 21500 RTP/AVP 96 0 8\r\n\
        a=rtpmap:96 opus/48000/2\r\n\
        a=sendrecv\r\n\
        m=video 21502 RTP/AVP 97\r\n\
        a=rtpmap:97 h265/90000\r\n\
        a=sendrecv\r\n";

    #[test]
    fn parses_full_offer() {
        let sdp = SessionDescription::parse(OFFER).unwrap();
        assert_eq!(sdp.version, 0);
        assert_eq!(sdp.originator_username, "alice");
        assert_eq!(sdp.sess_id, 2_890_844_526);
        assert_eq!(sdp.connection_address, "203.0.113.5");
        assert_eq!(sdp.time_window, TimeWindow::unbounded());
        assert_eq!(sdp.media.len(), 2);
        assert_eq!(sdp.media[0].kind, MediaKind::Audio);
        assert_eq!(sdp.media[0].payload_types, vec![96, 0, 8]);
        assert!(sdp.media[0].codecs[0].is_codec("opus"));
        assert_eq!(sdp.media[1].kind, MediaKind::Video);
        assert_eq!(sdp.candidates.len(), 2);
        assert_eq!(sdp.candidates[1].component, Component::Rtcp);
    }

    #[test]
    fn wire_round_trip_is_lossless() {
        let sdp = SessionDescription::parse(OFFER).unwrap();
        let again = SessionDescription::parse(&sdp.to_wire()).unwrap();
        assert_eq!(sdp, again);
    }

    #[test]
    fn media_level_connection_overrides_are_kept() {
        let input = OFFER.replace(
            "m=audio 21500 RTP/AVP 96 0 8\r\n",
            "m=audio 21500 RTP/AVP 96 0 8\r\nc=IN IP4 198.51.100.7\r\n",
        );
        let sdp = SessionDescription::parse(&input).unwrap();
        assert_eq!(sdp.media[0].connection_address, "198.51.100.7");
        assert_eq!(sdp.media[1].connection_address, "");
        let again = SessionDescription::parse(&sdp.to_wire()).unwrap();
        assert_eq!(sdp, again);
    }

    #[test]
    fn missing_media_is_rejected() {
        let input = "v=0\r\no=a 1 1 IN IP4 10.0.0.1\r\ns=-\r\nc=IN IP4 10.0.0.1\r\nt=0 0\r\n";
        assert!(matches!(
            SessionDescription::parse(input),
            Err(SdpError::Missing("m="))
        ));
    }

    #[test]
    fn missing_origin_is_rejected() {
        let input = "v=0\r\ns=-\r\nc=IN IP4 10.0.0.1\r\nt=0 0\r\nm=audio 5000 RTP/AVP 96\r\n";
        assert!(matches!(
            SessionDescription::parse(input),
            Err(SdpError::Missing("o="))
        ));
    }

    #[test]
    fn malformed_connection_is_rejected() {
        let input = OFFER.replace("c=IN IP4 203.0.113.5", "c=IN IP4");
        assert!(matches!(
            SessionDescription::parse(&input),
            Err(SdpError::Invalid("c="))
        ));
    }

    #[test]
    fn unknown_lines_and_attributes_are_tolerated() {
        let input = OFFER.replace(
            "t=0 0\r\n",
            "t=0 0\r\nu=http://example.com\r\na=tool:callsig\r\n",
        );
        let sdp = SessionDescription::parse(&input).unwrap();
        assert_eq!(sdp.media.len(), 2);
    }

    #[test]
    fn lf_only_line_endings_parse_too() {
        let input = OFFER.replace("\r\n", "\n");
        let sdp = SessionDescription::parse(&input).unwrap();
        assert_eq!(sdp.media.len(), 2);
    }
}
