use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use crate::ice::IceSubsystem;
use crate::log::log_msg::now_millis;
use crate::log::log_sink::LogSink;
use crate::negotiation::negotiation_error::NegotiationError;
use crate::negotiation::port_allocator::PortAllocator;
use crate::negotiation::session_policy::SessionPolicy;
use crate::sdp::addr_type::AddrType;
use crate::sdp::media::{MediaAttribute, MediaDescription, MediaKind};
use crate::sdp::session::SessionDescription;
use crate::{sink_debug, sink_warn};

/// Drives offer/answer negotiation for every session: builds local
/// descriptions from the [`SessionPolicy`], validates remote ones and folds
/// nominated connection addresses back into both halves of an agreement.
///
/// Media order in generated descriptions is fixed as [audio, video]. The
/// nomination calls block the invoking thread until the ICE side settles;
/// callers must not hold signaling locks across [`finalize`](Self::finalize)
/// or [`remote_finalize`](Self::remote_finalize).
pub struct SdpNegotiator {
    local_username: Mutex<Option<String>>,
    policy: SessionPolicy,
    ports: PortAllocator,
    ice: Arc<dyn IceSubsystem>,
    logger: Arc<dyn LogSink>,
}

impl SdpNegotiator {
    #[must_use]
    pub fn new(policy: SessionPolicy, ice: Arc<dyn IceSubsystem>, logger: Arc<dyn LogSink>) -> Self {
        let ports = PortAllocator::new(policy.min_port, policy.max_port, policy.max_pairs);
        Self {
            local_username: Mutex::new(None),
            policy,
            ports,
            ice,
            logger,
        }
    }

    /// Records the username used as `o=` originator. Negotiation is refused
    /// until this has been called once.
    pub fn set_local_identity(&self, username: &str) {
        if let Ok(mut name) = self.local_username.lock() {
            *name = Some(username.to_string());
        }
    }

    /// Builds a fresh local description bound to `local_address`, reserving an
    /// RTP/RTCP pair for audio and one for video. Returns `None` when the
    /// identity is unset, the address is unusable or the port pool cannot
    /// cover both streams; a partially reserved pair is returned to the pool.
    #[must_use]
    pub fn local_suggestion(&self, local_address: IpAddr) -> Option<SessionDescription> {
        let username = match self.local_username.lock() {
            Ok(name) => name.clone(),
            Err(_) => None,
        };
        let Some(username) = username else {
            sink_warn!(self.logger, "Local identity not set, no SDP suggestion");
            return None;
        };
        if local_address.is_unspecified() {
            sink_warn!(self.logger, "Refusing to offer the unspecified address");
            return None;
        }

        let audio_port = self.ports.reserve_pair()?;
        let Some(video_port) = self.ports.reserve_pair() else {
            self.ports.release_pair(audio_port);
            sink_warn!(self.logger, "Port pool exhausted while building an offer");
            return None;
        };

        let audio = self.media_section(MediaKind::Audio, audio_port);
        let video = self.media_section(MediaKind::Video, video_port);

        let now = u64::try_from(now_millis()).unwrap_or(u64::MAX);
        let address = local_address.to_string();
        sink_debug!(
            self.logger,
            "Suggesting session at {address}, audio {audio_port}, video {video_port}"
        );

        Some(SessionDescription {
            version: 0,
            originator_username: username,
            sess_id: now,
            sess_v: now,
            host_nettype: "IN".to_string(),
            host_addrtype: AddrType::of(local_address),
            host_address: address.clone(),
            session_name: self.policy.session_name.clone(),
            session_description: self.policy.session_description.clone(),
            connection_nettype: "IN".to_string(),
            connection_addrtype: AddrType::of(local_address),
            connection_address: address,
            time_window: crate::sdp::time_desc::TimeWindow::unbounded(),
            media: vec![audio, video],
            candidates: self.ice.generate_candidates(),
        })
    }

    fn media_section(&self, kind: MediaKind, rtp_port: u16) -> MediaDescription {
        let (codecs, statics) = match kind {
            MediaKind::Audio => (&self.policy.audio_codecs, &self.policy.audio_payload_types),
            _ => (&self.policy.video_codecs, &self.policy.video_payload_types),
        };
        let mut section = MediaDescription::new(kind, rtp_port, "RTP/AVP");
        for codec in codecs {
            section.payload_types.push(codec.payload_type);
            section.codecs.push(codec.clone());
        }
        section.payload_types.extend_from_slice(statics);
        section.attributes.push(MediaAttribute::SendRecv);
        section
    }

    /// Whether a remote description is one we can work with: version 0, a
    /// routable connection address and our required codecs on every stream.
    #[must_use]
    pub fn validate_offer(&self, desc: &SessionDescription) -> bool {
        if desc.version != 0 {
            sink_warn!(self.logger, "Rejecting SDP with version {}", desc.version);
            return false;
        }
        if desc.connection_address.is_empty() || desc.connection_address == "0.0.0.0" {
            sink_warn!(
                self.logger,
                "Rejecting SDP with unusable connection address '{}'",
                desc.connection_address
            );
            return false;
        }
        if desc.media.is_empty() {
            return false;
        }

        let mut has_opus = false;
        let mut has_h265 = false;
        for media in &desc.media {
            match media.kind {
                MediaKind::Audio => {
                    if media.codecs.iter().any(|c| c.is_codec("opus")) {
                        has_opus = true;
                    } else {
                        sink_warn!(self.logger, "Remote audio stream does not offer opus");
                        return false;
                    }
                }
                MediaKind::Video => {
                    if media.codecs.iter().any(|c| c.is_codec("h265")) {
                        has_h265 = true;
                    } else {
                        sink_warn!(self.logger, "Remote video stream does not offer h265");
                        return false;
                    }
                }
                MediaKind::Other(_) => {}
            }
        }
        has_opus && has_h265
    }

    /// Concludes negotiation on this side and yields our final description.
    ///
    /// With no prior local description we are answering a fresh offer: a new
    /// local half is synthesized, adopting the remote session name. With a
    /// prior suggestion we are the offerer processing the answer: nomination
    /// runs to completion (blocking) and the nominated addresses are written
    /// into both descriptions. Either way the returned description carries
    /// `sess_v` advanced past the remote's.
    ///
    /// # Errors
    /// [`NegotiationError::OfferRejected`] for an unacceptable remote
    /// description, [`NegotiationError::PortsExhausted`] when the answer
    /// cannot reserve media ports and [`NegotiationError::NegotiationFailed`]
    /// when nomination concludes without a connection.
    pub fn finalize(
        &self,
        remote: &mut SessionDescription,
        local_address: IpAddr,
        prior_local: Option<SessionDescription>,
        session_id: u32,
    ) -> Result<SessionDescription, NegotiationError> {
        if !self.validate_offer(remote) {
            return Err(NegotiationError::OfferRejected);
        }

        let mut local = match prior_local {
            None => {
                let mut local = self
                    .local_suggestion(local_address)
                    .ok_or(NegotiationError::PortsExhausted)?;
                local.session_name = remote.session_name.clone();
                sink_debug!(self.logger, "Synthesized answer for session {session_id}");
                local
            }
            Some(mut local) => {
                self.ice
                    .respond_to_nominations(&local.candidates, &remote.candidates, session_id);
                if !self.ice.caller_connection_nominated(session_id) {
                    sink_warn!(self.logger, "Nomination failed for session {session_id}");
                    return Err(NegotiationError::NegotiationFailed);
                }
                self.merge_nominated(&mut local, remote, session_id);
                local
            }
        };
        local.sess_v = remote.sess_v.wrapping_add(1);
        Ok(local)
    }

    /// Callee-side conclusion: waits (blocking) for our peer's nomination to
    /// settle, then re-validates the agreed remote description. True when the
    /// session is usable.
    #[must_use]
    pub fn remote_finalize(&self, remote: &SessionDescription, session_id: u32) -> bool {
        if !self.ice.callee_connection_nominated(session_id) {
            sink_warn!(self.logger, "Peer nomination failed for session {session_id}");
            return false;
        }
        self.validate_offer(remote)
    }

    /// Hands remote candidates to the ICE side and starts controller-role
    /// nomination for the session.
    pub fn start_candidate_negotiation(
        &self,
        local: &SessionDescription,
        remote: &SessionDescription,
        session_id: u32,
    ) {
        self.ice
            .start_nomination(&local.candidates, &remote.candidates, session_id);
    }

    /// Rewrites the audio and video sections of both halves with the
    /// nominated address pairs for the session. A stream whose nomination is
    /// incomplete keeps its signaled addresses. [`finalize`](Self::finalize)
    /// calls this on the offerer path; it can also be invoked on its own to
    /// re-apply a settled nomination to a description pair.
    pub fn merge_nominated(
        &self,
        local: &mut SessionDescription,
        remote: &mut SessionDescription,
        session_id: u32,
    ) {
        let nomination = self.ice.nominated(session_id);
        for (index, media) in [nomination.audio, nomination.video].into_iter().enumerate() {
            let Some(rtp) = media.rtp.filter(|_| media.is_complete()) else {
                sink_debug!(
                    self.logger,
                    "Session {session_id} media {index} not nominated, keeping signaled addresses"
                );
                continue;
            };
            if let Some(m) = local.media.get_mut(index) {
                m.connection_address = rtp.local.ip().to_string();
                m.receive_port = rtp.local.port();
            }
            if let Some(m) = remote.media.get_mut(index) {
                m.connection_address = rtp.remote.ip().to_string();
                m.receive_port = rtp.remote.port();
            }
        }
    }

    /// Returns the description's media ports to the pool and zeroes them so a
    /// second release is a no-op. `None` releases nothing.
    pub fn release(&self, desc: Option<&mut SessionDescription>) {
        let Some(desc) = desc else {
            return;
        };
        for media in &mut desc.media {
            self.ports.release_pair(media.receive_port);
            media.receive_port = 0;
        }
    }

    /// Drops all ICE state for the session, unblocking any pending waiter.
    pub fn ice_cleanup(&self, session_id: u32) {
        self.ice.cleanup_session(session_id);
    }

    #[must_use]
    pub fn free_port_pairs(&self) -> usize {
        self.ports.free_pairs()
    }
}
