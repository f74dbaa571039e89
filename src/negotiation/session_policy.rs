use crate::config::Config;
use crate::sdp::rtp_map::RtpMap;

/// Default port range shared by all sessions, partitioned into RTP/RTCP pairs.
pub const MIN_MEDIA_PORT: u16 = 21500;
pub const MAX_MEDIA_PORT: u16 = 22000;
pub const MAX_PORT_PAIRS: usize = 42;

/// What this endpoint offers in a session description: session naming, the
/// dynamic codecs we actually implement and the static payload numbers we
/// declare for completeness.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub session_name: String,
    pub session_description: String,
    pub audio_codecs: Vec<RtpMap>,
    pub video_codecs: Vec<RtpMap>,
    /// Well-known static audio payload numbers appended after the dynamic ones.
    pub audio_payload_types: Vec<u8>,
    pub video_payload_types: Vec<u8>,
    pub min_port: u16,
    pub max_port: u16,
    pub max_pairs: usize,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            session_name: "-".to_string(),
            session_description: String::new(),
            audio_codecs: vec![RtpMap::new(96, "opus", 48_000).with_params(2)],
            video_codecs: vec![RtpMap::new(97, "h265", 90_000)],
            // PCMU/PCMA; declared but we favor the dynamic codecs above.
            audio_payload_types: vec![0, 8],
            // H263; we will probably never pick any pre-set video type.
            video_payload_types: vec![34],
            min_port: MIN_MEDIA_PORT,
            max_port: MAX_MEDIA_PORT,
            max_pairs: MAX_PORT_PAIRS,
        }
    }
}

impl SessionPolicy {
    /// Reads overrides from the `[sdp]` section, keeping defaults for absent keys.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            session_name: config
                .get_non_empty("sdp", "session_name")
                .unwrap_or(&defaults.session_name)
                .to_string(),
            session_description: config
                .get_or_default("sdp", "session_description", &defaults.session_description)
                .to_string(),
            min_port: config.get_u16_or("sdp", "min_port", defaults.min_port),
            max_port: config.get_u16_or("sdp", "max_port", defaults.max_port),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn defaults_offer_opus_and_h265() {
        let policy = SessionPolicy::default();
        assert!(policy.audio_codecs.iter().any(|c| c.is_codec("opus")));
        assert!(policy.video_codecs.iter().any(|c| c.is_codec("h265")));
        assert!(policy.audio_codecs[0].payload_type >= 96, "dynamic range");
    }

    #[test]
    fn config_overrides_ports_and_name() {
        let cfg = Config::parse("[sdp]\nmin_port = 30000\nmax_port = 30100\nsession_name = call\n");
        let policy = SessionPolicy::from_config(&cfg);
        assert_eq!(policy.min_port, 30_000);
        assert_eq!(policy.max_port, 30_100);
        assert_eq!(policy.session_name, "call");
        assert_eq!(policy.max_pairs, MAX_PORT_PAIRS);
    }
}
