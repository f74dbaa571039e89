//! A complete call setup: INVITE with an offer, 200 OK with an answer, ACK,
//! nomination folded into both halves, then teardown with BYE.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::IpAddr;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

use callsig::ice::{MediaNomination, NominatedPair, SessionNomination, StubIce};
use callsig::log::noop_log_sink::NoopLogSink;
use callsig::negotiation::{SdpNegotiator, SessionPolicy};
use callsig::sip::{Content, RequestMethod, ResponseType, SipEvent, SipTransport};

const SESSION_ID: u32 = 1;

struct Endpoint {
    transport: SipTransport,
    events: Receiver<SipEvent>,
    wire: Receiver<Vec<u8>>,
    negotiator: SdpNegotiator,
    address: IpAddr,
}

fn endpoint(id: u32, username: &str, host: &str, nomination: SessionNomination) -> Endpoint {
    let address: IpAddr = host.parse().unwrap();
    let (event_tx, events) = channel();
    let (wire_tx, wire) = channel();
    let transport = SipTransport::new(id, username, host, event_tx, wire_tx, Arc::new(NoopLogSink));
    let ice = StubIce::scripted(true, nomination).with_host_candidates(address, 21500);
    let negotiator = SdpNegotiator::new(
        SessionPolicy::default(),
        Arc::new(ice),
        Arc::new(NoopLogSink),
    );
    negotiator.set_local_identity(username);
    Endpoint {
        transport,
        events,
        wire,
        negotiator,
        address,
    }
}

fn pair(local: &str, remote: &str) -> NominatedPair {
    NominatedPair {
        local: local.parse().unwrap(),
        remote: remote.parse().unwrap(),
    }
}

fn nomination_seen_by(local_host: &str, remote_host: &str) -> SessionNomination {
    SessionNomination {
        audio: MediaNomination {
            rtp: Some(pair(
                &format!("{local_host}:21500"),
                &format!("{remote_host}:21500"),
            )),
            rtcp: Some(pair(
                &format!("{local_host}:21501"),
                &format!("{remote_host}:21501"),
            )),
        },
        video: MediaNomination {
            rtp: Some(pair(
                &format!("{local_host}:21502"),
                &format!("{remote_host}:21502"),
            )),
            rtcp: Some(pair(
                &format!("{local_host}:21503"),
                &format!("{remote_host}:21503"),
            )),
        },
    }
}

fn deliver(from: &Endpoint, to: &mut Endpoint) {
    while let Ok(bytes) = from.wire.try_recv() {
        to.transport.network_package(&bytes).unwrap();
    }
}

#[test]
fn invite_offer_answer_ack_establishes_media_addresses() {
    let mut alice = endpoint(1, "alice", "10.0.0.1", nomination_seen_by("10.0.0.1", "10.0.0.2"));
    let mut bob = endpoint(2, "bob", "10.0.0.2", nomination_seen_by("10.0.0.2", "10.0.0.1"));
    alice.transport.set_remote("bob", "10.0.0.2");

    // caller builds the offer and sends INVITE
    let offer = alice.negotiator.local_suggestion(alice.address).unwrap();
    alice
        .transport
        .send_request(RequestMethod::Invite, &Content::Sdp(offer.clone()))
        .unwrap();
    deliver(&alice, &mut bob);

    let SipEvent::IncomingRequest { request, content, .. } = bob.events.try_recv().unwrap() else {
        panic!("expected the INVITE");
    };
    assert_eq!(request.method, RequestMethod::Invite);
    let Content::Sdp(mut remote_offer) = content else {
        panic!("expected an SDP offer");
    };

    // callee answers with its own half and starts nomination
    let answer = bob
        .negotiator
        .finalize(&mut remote_offer, bob.address, None, SESSION_ID)
        .unwrap();
    bob.negotiator
        .start_candidate_negotiation(&answer, &remote_offer, SESSION_ID);
    bob.transport
        .send_response(ResponseType::Ok, &Content::Sdp(answer.clone()))
        .unwrap();
    deliver(&bob, &mut alice);

    let SipEvent::IncomingResponse { response, content, .. } = alice.events.try_recv().unwrap()
    else {
        panic!("expected the 200 OK");
    };
    assert_eq!(response.response, ResponseType::Ok);
    let Content::Sdp(mut remote_answer) = content else {
        panic!("expected an SDP answer");
    };

    // caller concludes: nomination settles, addresses merge, version advances
    let agreed = alice
        .negotiator
        .finalize(&mut remote_answer, alice.address, Some(offer), SESSION_ID)
        .unwrap();
    assert_eq!(agreed.sess_v, remote_answer.sess_v + 1);
    assert_eq!(agreed.media[0].connection_address, "10.0.0.1");
    assert_eq!(remote_answer.media[0].connection_address, "10.0.0.2");

    alice
        .transport
        .send_request(RequestMethod::Ack, &Content::None)
        .unwrap();
    deliver(&alice, &mut bob);
    let SipEvent::IncomingRequest { request, .. } = bob.events.try_recv().unwrap() else {
        panic!("expected the ACK");
    };
    assert_eq!(request.method, RequestMethod::Ack);

    // callee side settles too
    assert!(bob.negotiator.remote_finalize(&remote_offer, SESSION_ID));
}

#[test]
fn bye_tears_down_and_ports_return_to_the_pool() {
    let mut alice = endpoint(1, "alice", "10.0.0.1", nomination_seen_by("10.0.0.1", "10.0.0.2"));
    let mut bob = endpoint(2, "bob", "10.0.0.2", nomination_seen_by("10.0.0.2", "10.0.0.1"));
    alice.transport.set_remote("bob", "10.0.0.2");

    let mut offer = alice.negotiator.local_suggestion(alice.address).unwrap();
    alice
        .transport
        .send_request(RequestMethod::Invite, &Content::Sdp(offer.clone()))
        .unwrap();
    deliver(&alice, &mut bob);
    let _ = bob.events.try_recv();

    alice.transport.send_request(RequestMethod::Bye, &Content::None).unwrap();
    deliver(&alice, &mut bob);
    bob.transport.send_response(ResponseType::Ok, &Content::None).unwrap();
    deliver(&bob, &mut alice);

    alice.negotiator.release(Some(&mut offer));
    alice.negotiator.ice_cleanup(SESSION_ID);
    assert_eq!(alice.negotiator.free_port_pairs(), 42);

    let SipEvent::IncomingRequest { request, .. } = bob.events.try_recv().unwrap() else {
        panic!("expected the BYE");
    };
    assert_eq!(request.method, RequestMethod::Bye);
    assert!(matches!(
        alice.events.try_recv().unwrap(),
        SipEvent::IncomingResponse { .. }
    ));
}
