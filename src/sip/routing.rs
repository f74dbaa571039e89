use crate::sip::message::RequestMethod;
use crate::sip::sip_error::RoutingError;

/// Hop limit stamped on every outgoing request.
pub const MAX_FORWARDS: u16 = 70;

/// The routing-relevant fields of one message: who it is from and to, where
/// the sender can be reached directly and which session it belongs to.
///
/// `sender_reply_address` is the Via stack, oldest hop last; `session_host`
/// is the host part of the Call-ID and pins the message to the dialog that
/// created it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingInfo {
    pub from_username: String,
    pub from_realname: String,
    pub from_host: String,
    pub to_username: String,
    pub to_realname: String,
    pub to_host: String,
    /// Direct `sip:user@host` address from the Contact field.
    pub contact_address: String,
    pub sender_reply_address: Vec<String>,
    pub session_host: String,
    pub max_forwards: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SentRequest {
    method: RequestMethod,
    cseq: u32,
    routing: RoutingInfo,
}

/// Per-dialog routing state.
///
/// Tracks both identities and the last request in each direction so that
/// outgoing messages can be stamped and incoming ones checked. The remote
/// identity is adopted from the first incoming request and is fixed for the
/// dialog's lifetime after that; on the caller side it is set explicitly
/// before the first request goes out.
#[derive(Debug)]
pub struct SipRouting {
    local_username: String,
    local_realname: String,
    local_host: String,
    remote_username: Option<String>,
    remote_host: Option<String>,
    remote_direct_address: Option<String>,
    previous_sent: Option<SentRequest>,
    previous_received: Option<RoutingInfo>,
}

impl SipRouting {
    #[must_use]
    pub fn new(local_username: &str, local_host: &str) -> Self {
        Self {
            local_username: local_username.to_string(),
            local_realname: String::new(),
            local_host: local_host.to_string(),
            remote_username: None,
            remote_host: None,
            remote_direct_address: None,
            previous_sent: None,
            previous_received: None,
        }
    }

    pub fn set_local_realname(&mut self, realname: &str) {
        self.local_realname = realname.to_string();
    }

    /// Caller-side initialization: who we are dialing, before any message has
    /// been exchanged.
    pub fn set_remote(&mut self, username: &str, host: &str) {
        self.remote_username = Some(username.to_string());
        self.remote_host = Some(host.to_string());
    }

    /// Where the peer asked to be contacted directly, once known.
    #[must_use]
    pub fn remote_direct_address(&self) -> Option<&str> {
        self.remote_direct_address.as_deref()
    }

    fn local_contact(&self) -> String {
        format!("sip:{}@{}", self.local_username, self.local_host)
    }

    /// Stamps routing onto an outgoing request and records it for matching
    /// the response later.
    ///
    /// # Errors
    /// [`RoutingError::Uninitialized`] before both identities are known.
    pub fn request_routing(
        &mut self,
        method: RequestMethod,
        cseq: u32,
        session_host: &str,
    ) -> Result<RoutingInfo, RoutingError> {
        if self.local_username.is_empty() || self.local_host.is_empty() {
            return Err(RoutingError::Uninitialized);
        }
        let (Some(remote_username), Some(remote_host)) =
            (self.remote_username.clone(), self.remote_host.clone())
        else {
            return Err(RoutingError::Uninitialized);
        };

        let routing = RoutingInfo {
            from_username: self.local_username.clone(),
            from_realname: self.local_realname.clone(),
            from_host: self.local_host.clone(),
            to_username: remote_username,
            to_realname: String::new(),
            to_host: remote_host,
            contact_address: self.local_contact(),
            sender_reply_address: vec![self.local_host.clone()],
            session_host: session_host.to_string(),
            max_forwards: MAX_FORWARDS,
        };
        self.previous_sent = Some(SentRequest {
            method,
            cseq,
            routing: routing.clone(),
        });
        Ok(routing)
    }

    /// Checks an incoming request and records it so a response can be routed
    /// back. The first request fixes the remote identity for the dialog.
    ///
    /// # Errors
    /// [`RoutingError::Mismatch`] naming the contradicting field.
    pub fn process_request_routing(&mut self, routing: &RoutingInfo) -> Result<(), RoutingError> {
        if routing.max_forwards == 0 {
            return Err(RoutingError::Mismatch("Max-Forwards"));
        }
        if routing.to_username != self.local_username || routing.to_host != self.local_host {
            return Err(RoutingError::Mismatch("To"));
        }

        match (&self.remote_username, &self.remote_host) {
            (Some(username), Some(host)) => {
                if routing.from_username != *username || routing.from_host != *host {
                    return Err(RoutingError::Mismatch("From"));
                }
            }
            _ => {
                self.remote_username = Some(routing.from_username.clone());
                self.remote_host = Some(routing.from_host.clone());
            }
        }

        if !routing.contact_address.is_empty() {
            self.remote_direct_address = Some(routing.contact_address.clone());
        }
        self.previous_received = Some(routing.clone());
        Ok(())
    }

    /// Checks an incoming response against the request we last sent. The
    /// peer's contact must be its own address, never an echo of ours; a valid
    /// response updates the remote direct address.
    ///
    /// # Errors
    /// [`RoutingError::OutOfSequence`] when nothing is outstanding or the
    /// CSeq does not match, [`RoutingError::Mismatch`] when identity fields
    /// contradict the request.
    pub fn process_response_routing(
        &mut self,
        cseq: u32,
        cseq_method: RequestMethod,
        routing: &RoutingInfo,
    ) -> Result<(), RoutingError> {
        let Some(sent) = &self.previous_sent else {
            return Err(RoutingError::OutOfSequence);
        };
        if cseq != sent.cseq || cseq_method != sent.method {
            return Err(RoutingError::OutOfSequence);
        }
        if routing.from_username != sent.routing.from_username
            || routing.from_host != sent.routing.from_host
        {
            return Err(RoutingError::Mismatch("From"));
        }
        if routing.to_username != sent.routing.to_username
            || routing.to_host != sent.routing.to_host
        {
            return Err(RoutingError::Mismatch("To"));
        }
        if !routing.session_host.is_empty() && routing.session_host != sent.routing.session_host {
            return Err(RoutingError::Mismatch("Call-ID"));
        }
        if routing.contact_address == sent.routing.contact_address {
            return Err(RoutingError::Mismatch("Contact"));
        }

        if !routing.contact_address.is_empty() {
            self.remote_direct_address = Some(routing.contact_address.clone());
        }
        Ok(())
    }

    /// Routing for a response to the last received request: everything is
    /// copied from the request so the response retraces the Via stack, except
    /// the contact, which becomes our own direct address.
    ///
    /// # Errors
    /// [`RoutingError::NoPriorRequest`] when nothing has been received.
    pub fn response_routing(&self) -> Result<RoutingInfo, RoutingError> {
        let Some(received) = &self.previous_received else {
            return Err(RoutingError::NoPriorRequest);
        };
        let mut routing = received.clone();
        routing.contact_address = self.local_contact();
        Ok(routing)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn caller() -> SipRouting {
        let mut routing = SipRouting::new("alice", "10.0.0.1");
        routing.set_remote("bob", "10.0.0.2");
        routing
    }

    fn request_from(user: &str, host: &str, to_user: &str) -> RoutingInfo {
        RoutingInfo {
            from_username: user.to_string(),
            from_host: host.to_string(),
            to_username: to_user.to_string(),
            to_host: "10.0.0.2".to_string(),
            contact_address: format!("sip:{user}@{host}"),
            sender_reply_address: vec![host.to_string()],
            session_host: host.to_string(),
            max_forwards: MAX_FORWARDS,
            ..RoutingInfo::default()
        }
    }

    #[test]
    fn outgoing_request_carries_identity_and_hop_limit() {
        let mut routing = caller();
        let info = routing
            .request_routing(RequestMethod::Invite, 1, "10.0.0.1")
            .unwrap();
        assert_eq!(info.from_username, "alice");
        assert_eq!(info.to_username, "bob");
        assert_eq!(info.contact_address, "sip:alice@10.0.0.1");
        assert_eq!(info.max_forwards, MAX_FORWARDS);
        assert_eq!(info.sender_reply_address, vec!["10.0.0.1".to_string()]);
    }

    #[test]
    fn request_without_remote_identity_is_refused() {
        let mut routing = SipRouting::new("alice", "10.0.0.1");
        assert_eq!(
            routing.request_routing(RequestMethod::Invite, 1, "10.0.0.1"),
            Err(RoutingError::Uninitialized)
        );
    }

    #[test]
    fn first_request_fixes_the_remote_identity() {
        let mut routing = SipRouting::new("bob", "10.0.0.2");
        routing
            .process_request_routing(&request_from("alice", "10.0.0.1", "bob"))
            .unwrap();
        assert_eq!(routing.remote_direct_address(), Some("sip:alice@10.0.0.1"));

        // a different caller on the same dialog is rejected
        assert_eq!(
            routing.process_request_routing(&request_from("mallory", "10.9.9.9", "bob")),
            Err(RoutingError::Mismatch("From"))
        );
    }

    #[test]
    fn request_for_someone_else_is_rejected() {
        let mut routing = SipRouting::new("bob", "10.0.0.2");
        assert_eq!(
            routing.process_request_routing(&request_from("alice", "10.0.0.1", "carol")),
            Err(RoutingError::Mismatch("To"))
        );
    }

    #[test]
    fn request_for_the_right_user_at_the_wrong_host_is_rejected() {
        let mut routing = SipRouting::new("bob", "10.0.0.9");
        // To names our user but at a host we do not serve
        assert_eq!(
            routing.process_request_routing(&request_from("alice", "10.0.0.1", "bob")),
            Err(RoutingError::Mismatch("To"))
        );
    }

    #[test]
    fn exhausted_hop_limit_is_rejected() {
        let mut routing = SipRouting::new("bob", "10.0.0.2");
        let mut info = request_from("alice", "10.0.0.1", "bob");
        info.max_forwards = 0;
        assert_eq!(
            routing.process_request_routing(&info),
            Err(RoutingError::Mismatch("Max-Forwards"))
        );
    }

    #[test]
    fn response_must_answer_the_sent_request() {
        let mut routing = caller();
        let sent = routing
            .request_routing(RequestMethod::Invite, 1, "10.0.0.1")
            .unwrap();

        let mut reply = sent.clone();
        reply.contact_address = "sip:bob@10.0.0.2".to_string();
        routing
            .process_response_routing(1, RequestMethod::Invite, &reply)
            .unwrap();
        assert_eq!(routing.remote_direct_address(), Some("sip:bob@10.0.0.2"));

        assert_eq!(
            routing.process_response_routing(2, RequestMethod::Invite, &reply),
            Err(RoutingError::OutOfSequence)
        );
        assert_eq!(
            routing.process_response_routing(1, RequestMethod::Bye, &reply),
            Err(RoutingError::OutOfSequence)
        );
    }

    #[test]
    fn response_with_tampered_identity_is_rejected() {
        let mut routing = caller();
        let sent = routing
            .request_routing(RequestMethod::Invite, 1, "10.0.0.1")
            .unwrap();

        let mut bad_from = sent.clone();
        bad_from.contact_address = "sip:bob@10.0.0.2".to_string();
        bad_from.from_username = "mallory".to_string();
        assert_eq!(
            routing.process_response_routing(1, RequestMethod::Invite, &bad_from),
            Err(RoutingError::Mismatch("From"))
        );

        let mut bad_session = sent.clone();
        bad_session.contact_address = "sip:bob@10.0.0.2".to_string();
        bad_session.session_host = "elsewhere".to_string();
        assert_eq!(
            routing.process_response_routing(1, RequestMethod::Invite, &bad_session),
            Err(RoutingError::Mismatch("Call-ID"))
        );
    }

    #[test]
    fn response_echoing_our_contact_is_rejected() {
        let mut routing = caller();
        let sent = routing
            .request_routing(RequestMethod::Invite, 1, "10.0.0.1")
            .unwrap();
        assert_eq!(
            routing.process_response_routing(1, RequestMethod::Invite, &sent),
            Err(RoutingError::Mismatch("Contact"))
        );
    }

    #[test]
    fn response_without_prior_request_is_out_of_sequence() {
        let mut routing = caller();
        assert_eq!(
            routing.process_response_routing(1, RequestMethod::Invite, &RoutingInfo::default()),
            Err(RoutingError::OutOfSequence)
        );
    }

    #[test]
    fn response_routing_retraces_the_request() {
        let mut routing = SipRouting::new("bob", "10.0.0.2");
        let request = request_from("alice", "10.0.0.1", "bob");
        routing.process_request_routing(&request).unwrap();

        let reply = routing.response_routing().unwrap();
        assert_eq!(reply.from_username, "alice");
        assert_eq!(reply.to_username, "bob");
        assert_eq!(reply.sender_reply_address, request.sender_reply_address);
        assert_eq!(reply.contact_address, "sip:bob@10.0.0.2");
    }

    #[test]
    fn response_routing_needs_a_received_request() {
        let routing = SipRouting::new("bob", "10.0.0.2");
        assert_eq!(routing.response_routing(), Err(RoutingError::NoPriorRequest));
    }
}
