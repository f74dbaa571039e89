//! Renders typed messages back to their CRLF wire form. The inverse of the
//! parser for every message this endpoint produces.

use std::fmt::Write as _;

use crate::sip::field::compose_name_addr;
use crate::sip::message::{Content, SipMessageHeader, SipRequest, SipResponse};

/// Field order is fixed: Via, Max-Forwards, To, From, Call-ID, CSeq, Contact,
/// then content fields when a body is present.
fn compose_fields(out: &mut String, header: &SipMessageHeader, content: &Content) {
    macro_rules! pushln {
        ($($arg:tt)*) => {{
            let _ = write!(out, $($arg)*);
            out.push_str("\r\n");
        }};
    }

    let routing = &header.routing;
    for via_host in &routing.sender_reply_address {
        pushln!("Via: SIP/2.0/TCP {via_host}");
    }
    pushln!("Max-Forwards: {}", routing.max_forwards);
    pushln!(
        "To: {}",
        compose_name_addr(&routing.to_realname, &routing.to_username, &routing.to_host)
    );
    pushln!(
        "From: {}",
        compose_name_addr(
            &routing.from_realname,
            &routing.from_username,
            &routing.from_host
        )
    );
    pushln!("Call-ID: {}", header.call_id);
    pushln!("CSeq: {} {}", header.cseq, header.cseq_method);
    if !routing.contact_address.is_empty() {
        pushln!("Contact: <{}>", routing.contact_address);
    }

    match content {
        Content::Sdp(_) => pushln!("Content-Type: application/sdp"),
        Content::None | Content::Opaque(_) => {}
    }
    pushln!("Content-Length: {}", content.to_wire().len());
}

#[must_use]
pub fn compose_request(request: &SipRequest, content: &Content) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} {} SIP/2.0\r\n", request.method, request.request_uri);
    compose_fields(&mut out, &request.message, content);
    out.push_str("\r\n");
    out.push_str(&content.to_wire());
    out
}

#[must_use]
pub fn compose_response(response: &SipResponse, content: &Content) -> String {
    let mut out = String::new();
    let _ = write!(out, "SIP/2.0 {}\r\n", response.response);
    compose_fields(&mut out, &response.message, content);
    out.push_str("\r\n");
    out.push_str(&content.to_wire());
    out
}
