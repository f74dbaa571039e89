use std::net::SocketAddr;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::log::log_sink::LogSink;
use crate::sink_debug;
use crate::sink_warn;
use crate::sip::composer::{compose_request, compose_response};
use crate::sip::frame_buffer::{FrameBuffer, SipFrame};
use crate::sip::message::{
    generate_call_id, Content, ContentType, RequestMethod, ResponseType, SipMessageHeader,
    SipRequest, SipResponse,
};
use crate::sip::parser::{parse_frame, ParsedMessage};
use crate::sip::routing::SipRouting;
use crate::sip::sip_error::{SipError, SipParseError};

/// What the signaling layer reports upward. Consumed from the event channel
/// by whoever owns the call state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SipEvent {
    /// The underlying connection is up and the dialog may start.
    Established {
        transport_id: u32,
        local: SocketAddr,
        remote: SocketAddr,
    },
    IncomingRequest {
        request: SipRequest,
        content: Content,
        /// Where the request came from, as learned at establishment.
        source: SocketAddr,
        transport_id: u32,
    },
    IncomingResponse {
        response: SipResponse,
        content: Content,
        transport_id: u32,
    },
    /// An incoming message was rejected; the peer should be sent this
    /// negative response.
    ParseFailure {
        response: ResponseType,
        transport_id: u32,
    },
}

/// One dialog over one connection: reassembles incoming bytes into messages,
/// checks them against the dialog's routing state and emits [`SipEvent`]s;
/// outgoing messages are stamped, composed and pushed to the wire channel.
///
/// Not a socket owner. Bytes come in through
/// [`network_package`](Self::network_package) and leave through the wire
/// channel, so the I/O loop and the tests drive it the same way.
pub struct SipTransport {
    transport_id: u32,
    buffer: FrameBuffer,
    routing: SipRouting,
    call_id: String,
    cseq: u32,
    remote_address: SocketAddr,
    last_received: Option<(RequestMethod, u32)>,
    event_tx: Sender<SipEvent>,
    wire_tx: Sender<Vec<u8>>,
    logger: Arc<dyn LogSink>,
}

impl SipTransport {
    #[must_use]
    pub fn new(
        transport_id: u32,
        local_username: &str,
        local_host: &str,
        event_tx: Sender<SipEvent>,
        wire_tx: Sender<Vec<u8>>,
        logger: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            transport_id,
            buffer: FrameBuffer::new(),
            routing: SipRouting::new(local_username, local_host),
            call_id: generate_call_id(local_host),
            cseq: 0,
            remote_address: SocketAddr::from(([0, 0, 0, 0], 0)),
            last_received: None,
            event_tx,
            wire_tx,
            logger,
        }
    }

    #[must_use]
    pub fn transport_id(&self) -> u32 {
        self.transport_id
    }

    #[must_use]
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Caller-side: who we are dialing.
    pub fn set_remote(&mut self, username: &str, host: &str) {
        self.routing.set_remote(username, host);
    }

    /// Reports the connection as usable.
    ///
    /// # Errors
    /// [`SipError::ChannelClosed`] when the event consumer is gone.
    pub fn connection_established(
        &mut self,
        local: SocketAddr,
        remote: SocketAddr,
    ) -> Result<(), SipError> {
        sink_debug!(
            self.logger,
            "Transport {} established {local} -> {remote}",
            self.transport_id
        );
        self.remote_address = remote;
        self.emit(SipEvent::Established {
            transport_id: self.transport_id,
            local,
            remote,
        })
    }

    /// Composes and sends a request in this dialog. ACK completes the
    /// transaction it acknowledges and reuses its sequence number; every
    /// other method starts a new transaction.
    ///
    /// # Errors
    /// Routing errors before both identities are known, or
    /// [`SipError::ChannelClosed`] when the wire channel is gone.
    pub fn send_request(
        &mut self,
        method: RequestMethod,
        content: &Content,
    ) -> Result<(), SipError> {
        if method != RequestMethod::Ack {
            self.cseq = self.cseq.wrapping_add(1);
        }
        let session_host = session_host_of(&self.call_id);
        let routing = self.routing.request_routing(method, self.cseq, &session_host)?;
        let request_uri = match self.routing.remote_direct_address() {
            Some(address) => address.to_string(),
            None => format!("sip:{}@{}", routing.to_username, routing.to_host),
        };

        let request = SipRequest {
            method,
            request_uri,
            message: self.header(routing, self.cseq, method, content),
        };
        sink_debug!(self.logger, "Sending {} on transport {}", method, self.transport_id);
        self.send_wire(compose_request(&request, content))
    }

    /// Composes and sends a response to the last received request.
    ///
    /// # Errors
    /// [`SipError::Routing`] with no request outstanding, or
    /// [`SipError::ChannelClosed`].
    pub fn send_response(
        &mut self,
        response: ResponseType,
        content: &Content,
    ) -> Result<(), SipError> {
        let Some((method, cseq)) = self.last_received else {
            return Err(crate::sip::sip_error::RoutingError::NoPriorRequest.into());
        };
        let routing = self.routing.response_routing()?;
        let message = SipResponse {
            response,
            message: self.header(routing, cseq, method, content),
        };
        sink_debug!(
            self.logger,
            "Sending {} on transport {}",
            response,
            self.transport_id
        );
        self.send_wire(compose_response(&message, content))
    }

    /// Feeds received bytes in and drains every message they complete. A bad
    /// message surfaces as a [`SipEvent::ParseFailure`] rather than an error;
    /// only losing a channel fails the call.
    ///
    /// # Errors
    /// [`SipError::ChannelClosed`].
    pub fn network_package(&mut self, bytes: &[u8]) -> Result<(), SipError> {
        if let Err(e) = self.buffer.submit(bytes) {
            return self.reject(SipError::Parse(e));
        }
        loop {
            match self.buffer.next_frame() {
                Ok(Some(frame)) => self.handle_frame(&frame)?,
                Ok(None) => return Ok(()),
                Err(e) => return self.reject(SipError::Parse(e)),
            }
        }
    }

    fn handle_frame(&mut self, frame: &SipFrame) -> Result<(), SipError> {
        match parse_frame(frame) {
            Ok(ParsedMessage::Request(request, content)) => {
                if let Err(e) = self.routing.process_request_routing(&request.message.routing) {
                    return self.reject(SipError::Routing(e));
                }
                self.last_received = Some((request.method, request.message.cseq));
                // the caller's Call-ID names the dialog from here on
                self.call_id = request.message.call_id.clone();
                self.emit(SipEvent::IncomingRequest {
                    request,
                    content,
                    source: self.remote_address,
                    transport_id: self.transport_id,
                })
            }
            Ok(ParsedMessage::Response(response, content)) => {
                let check = self.routing.process_response_routing(
                    response.message.cseq,
                    response.message.cseq_method,
                    &response.message.routing,
                );
                if let Err(e) = check {
                    sink_warn!(
                        self.logger,
                        "Dropping response on transport {}: {e}",
                        self.transport_id
                    );
                    return Ok(());
                }
                self.emit(SipEvent::IncomingResponse {
                    response,
                    content,
                    transport_id: self.transport_id,
                })
            }
            Err(e) => self.reject(SipError::Parse(e)),
        }
    }

    fn reject(&mut self, error: SipError) -> Result<(), SipError> {
        sink_warn!(
            self.logger,
            "Rejecting message on transport {}: {error}",
            self.transport_id
        );
        self.emit(SipEvent::ParseFailure {
            response: failure_response(&error),
            transport_id: self.transport_id,
        })
    }

    fn header(
        &self,
        routing: crate::sip::routing::RoutingInfo,
        cseq: u32,
        cseq_method: RequestMethod,
        content: &Content,
    ) -> SipMessageHeader {
        let content_type = match content {
            Content::Sdp(_) => ContentType::Sdp,
            Content::None | Content::Opaque(_) => ContentType::None,
        };
        SipMessageHeader {
            routing,
            call_id: self.call_id.clone(),
            cseq,
            cseq_method,
            content_type,
            content_length: content.to_wire().len(),
        }
    }

    fn emit(&self, event: SipEvent) -> Result<(), SipError> {
        self.event_tx.send(event).map_err(|_| SipError::ChannelClosed)
    }

    fn send_wire(&self, message: String) -> Result<(), SipError> {
        self.wire_tx
            .send(message.into_bytes())
            .map_err(|_| SipError::ChannelClosed)
    }
}

fn session_host_of(call_id: &str) -> String {
    call_id
        .split_once('@')
        .map(|(_, host)| host.to_string())
        .unwrap_or_default()
}

/// The negative response a rejected message earns.
fn failure_response(error: &SipError) -> ResponseType {
    match error {
        SipError::Parse(SipParseError::FrameTooLarge) => ResponseType::MessageTooLarge,
        SipError::Parse(_) => ResponseType::BadRequest,
        SipError::Routing(_) | SipError::ChannelClosed => ResponseType::CallDoesNotExist,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::noop_log_sink::NoopLogSink;
    use crate::sip::frame_buffer::MAX_BUFFERED_BYTES;
    use std::sync::mpsc::{channel, Receiver};

    fn transport(
        id: u32,
        username: &str,
        host: &str,
    ) -> (SipTransport, Receiver<SipEvent>, Receiver<Vec<u8>>) {
        let (event_tx, event_rx) = channel();
        let (wire_tx, wire_rx) = channel();
        let transport =
            SipTransport::new(id, username, host, event_tx, wire_tx, Arc::new(NoopLogSink));
        (transport, event_rx, wire_rx)
    }

    #[test]
    fn establishment_is_reported() {
        let (mut alice, events, _wire) = transport(1, "alice", "10.0.0.1");
        alice
            .connection_established(
                "10.0.0.1:5060".parse().unwrap(),
                "10.0.0.2:5060".parse().unwrap(),
            )
            .unwrap();
        assert!(matches!(
            events.try_recv().unwrap(),
            SipEvent::Established { transport_id: 1, .. }
        ));
    }

    #[test]
    fn request_travels_to_the_peer_and_back() {
        let (mut alice, alice_events, alice_wire) = transport(1, "alice", "10.0.0.1");
        let (mut bob, bob_events, bob_wire) = transport(2, "bob", "10.0.0.2");
        alice.set_remote("bob", "10.0.0.2");

        alice.send_request(RequestMethod::Invite, &Content::None).unwrap();
        bob.network_package(&alice_wire.try_recv().unwrap()).unwrap();

        let SipEvent::IncomingRequest { request, .. } = bob_events.try_recv().unwrap() else {
            panic!("expected a request event");
        };
        assert_eq!(request.method, RequestMethod::Invite);
        assert_eq!(request.message.call_id, alice.call_id());
        assert_eq!(bob.call_id(), alice.call_id());

        bob.send_response(ResponseType::Ok, &Content::None).unwrap();
        alice.network_package(&bob_wire.try_recv().unwrap()).unwrap();

        let SipEvent::IncomingResponse { response, .. } = alice_events.try_recv().unwrap() else {
            panic!("expected a response event");
        };
        assert_eq!(response.response, ResponseType::Ok);
        assert_eq!(response.message.cseq, 1);
        assert!(alice_events.try_recv().is_err());
    }

    #[test]
    fn split_delivery_produces_the_same_events() {
        let (mut alice, _e, alice_wire) = transport(1, "alice", "10.0.0.1");
        let (mut bob, bob_events, _w) = transport(2, "bob", "10.0.0.2");
        alice.set_remote("bob", "10.0.0.2");
        alice.send_request(RequestMethod::Invite, &Content::None).unwrap();

        let bytes = alice_wire.try_recv().unwrap();
        for chunk in bytes.chunks(3) {
            bob.network_package(chunk).unwrap();
        }
        assert!(matches!(
            bob_events.try_recv().unwrap(),
            SipEvent::IncomingRequest { .. }
        ));
    }

    #[test]
    fn garbage_earns_a_bad_request() {
        let (mut bob, events, _w) = transport(2, "bob", "10.0.0.2");
        bob.network_package(b"NONSENSE\r\n\r\n").unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            SipEvent::ParseFailure {
                response: ResponseType::BadRequest,
                transport_id: 2
            }
        );
    }

    #[test]
    fn oversized_stream_earns_message_too_large() {
        let (mut bob, events, _w) = transport(2, "bob", "10.0.0.2");
        bob.network_package(&vec![b'a'; MAX_BUFFERED_BYTES]).unwrap();
        bob.network_package(b"x").unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            SipEvent::ParseFailure {
                response: ResponseType::MessageTooLarge,
                transport_id: 2
            }
        );
    }

    #[test]
    fn misrouted_request_earns_call_does_not_exist() {
        let (mut alice, _e, alice_wire) = transport(1, "alice", "10.0.0.1");
        let (mut carol, carol_events, _w) = transport(3, "carol", "10.0.0.3");
        alice.set_remote("bob", "10.0.0.2");
        alice.send_request(RequestMethod::Invite, &Content::None).unwrap();

        carol.network_package(&alice_wire.try_recv().unwrap()).unwrap();
        assert_eq!(
            carol_events.try_recv().unwrap(),
            SipEvent::ParseFailure {
                response: ResponseType::CallDoesNotExist,
                transport_id: 3
            }
        );
    }

    #[test]
    fn stray_response_is_dropped_silently() {
        let (mut bob, bob_events, bob_wire) = transport(2, "bob", "10.0.0.2");
        let (mut alice, alice_events, _w) = transport(1, "alice", "10.0.0.1");

        // bob answers a request that alice never sent on this dialog
        let (mut carol, _ce, carol_wire) = transport(3, "carol", "10.0.0.3");
        carol.set_remote("bob", "10.0.0.2");
        carol.send_request(RequestMethod::Invite, &Content::None).unwrap();
        bob.network_package(&carol_wire.try_recv().unwrap()).unwrap();
        let _ = bob_events.try_recv();
        bob.send_response(ResponseType::Ok, &Content::None).unwrap();

        alice.network_package(&bob_wire.try_recv().unwrap()).unwrap();
        assert!(alice_events.try_recv().is_err());
    }

    #[test]
    fn incoming_requests_carry_the_peer_address() {
        let (mut alice, _e, alice_wire) = transport(1, "alice", "10.0.0.1");
        let (mut bob, bob_events, _w) = transport(2, "bob", "10.0.0.2");
        alice.set_remote("bob", "10.0.0.2");
        bob.connection_established(
            "10.0.0.2:5060".parse().unwrap(),
            "10.0.0.1:5060".parse().unwrap(),
        )
        .unwrap();
        let _ = bob_events.try_recv();

        alice.send_request(RequestMethod::Invite, &Content::None).unwrap();
        bob.network_package(&alice_wire.try_recv().unwrap()).unwrap();

        let SipEvent::IncomingRequest { source, .. } = bob_events.try_recv().unwrap() else {
            panic!("expected a request event");
        };
        assert_eq!(source, "10.0.0.1:5060".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn declared_content_length_matches_the_sent_body() {
        let (mut alice, _e, alice_wire) = transport(1, "alice", "10.0.0.1");
        let (mut bob, bob_events, _w) = transport(2, "bob", "10.0.0.2");
        alice.set_remote("bob", "10.0.0.2");

        let sdp = crate::sdp::session::SessionDescription::parse(
            "v=0\r\no=alice 1 1 IN IP4 10.0.0.1\r\ns=-\r\nc=IN IP4 10.0.0.1\r\nt=0 0\r\n\
             m=audio 21500 RTP/AVP 96\r\na=rtpmap:96 opus/48000/2\r\n",
        )
        .unwrap();
        let content = Content::Sdp(sdp);
        alice.send_request(RequestMethod::Invite, &content).unwrap();

        let wire = alice_wire.try_recv().unwrap();
        let expected = format!("Content-Length: {}\r\n", content.to_wire().len());
        assert!(String::from_utf8(wire.clone()).unwrap().contains(&expected));

        bob.network_package(&wire).unwrap();
        let SipEvent::IncomingRequest { request, .. } = bob_events.try_recv().unwrap() else {
            panic!("expected a request event");
        };
        assert_eq!(request.message.content_length, content.to_wire().len());
    }

    #[test]
    fn ack_reuses_the_invite_sequence_number() {
        let (mut alice, _e, alice_wire) = transport(1, "alice", "10.0.0.1");
        let (mut bob, bob_events, _w) = transport(2, "bob", "10.0.0.2");
        alice.set_remote("bob", "10.0.0.2");

        alice.send_request(RequestMethod::Invite, &Content::None).unwrap();
        bob.network_package(&alice_wire.try_recv().unwrap()).unwrap();
        let _ = bob_events.try_recv();

        alice.send_request(RequestMethod::Ack, &Content::None).unwrap();
        bob.network_package(&alice_wire.try_recv().unwrap()).unwrap();
        let SipEvent::IncomingRequest { request, .. } = bob_events.try_recv().unwrap() else {
            panic!("expected the ACK");
        };
        assert_eq!(request.method, RequestMethod::Ack);
        assert_eq!(request.message.cseq, 1);

        alice.send_request(RequestMethod::Bye, &Content::None).unwrap();
        bob.network_package(&alice_wire.try_recv().unwrap()).unwrap();
        let SipEvent::IncomingRequest { request, .. } = bob_events.try_recv().unwrap() else {
            panic!("expected the BYE");
        };
        assert_eq!(request.message.cseq, 2);
    }
}
