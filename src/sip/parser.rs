//! Turns a delimited [`SipFrame`] into a typed request or response.
//!
//! Parsing is two-staged: the header block becomes generic [`SipField`]s
//! first (unknown fields and invalid field names are skipped, not fatal),
//! then the fields are checked and assembled into the typed message. Only
//! grammar violations in fields we depend on fail the message.

use crate::sdp::session::SessionDescription;
use crate::sip::field::{parse_name_addr, parse_value_sets, valid_field_name, SipField};
use crate::sip::frame_buffer::SipFrame;
use crate::sip::message::{
    Content, ContentType, RequestMethod, ResponseType, SipMessageHeader, SipRequest, SipResponse,
};
use crate::sip::routing::{RoutingInfo, MAX_FORWARDS};
use crate::sip::sip_error::SipParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMessage {
    Request(SipRequest, Content),
    Response(SipResponse, Content),
}

enum StartLine {
    Request { method: RequestMethod, uri: String },
    Response(ResponseType),
}

/// Parses one frame into a typed message with its content. The start line is
/// judged before any field, so a garbled first line is reported as such even
/// when the fields below it are broken too.
///
/// # Errors
/// [`SipParseError`] naming the malformed or missing part.
pub fn parse_frame(frame: &SipFrame) -> Result<ParsedMessage, SipParseError> {
    let mut lines = logical_lines(&frame.header);
    let first_line = lines
        .next()
        .ok_or(SipParseError::MalformedMessage("empty header"))?;
    let start = parse_start_line(&first_line)?;

    let fields = header_to_fields(lines);
    let header = fields_to_header(&fields)?;
    let content = parse_content(&header.content_type, &frame.body)?;

    match start {
        StartLine::Request { method, uri } => Ok(ParsedMessage::Request(
            SipRequest {
                method,
                request_uri: uri,
                message: header,
            },
            content,
        )),
        StartLine::Response(response) => Ok(ParsedMessage::Response(
            SipResponse {
                response,
                message: header,
            },
            content,
        )),
    }
}

fn parse_start_line(first_line: &str) -> Result<StartLine, SipParseError> {
    if let Some(status) = first_line.strip_prefix("SIP/2.0 ") {
        let code_token = status
            .split_whitespace()
            .next()
            .ok_or(SipParseError::MalformedMessage("status line"))?;
        let code: u16 = code_token
            .parse()
            .map_err(|_| SipParseError::MalformedMessage("status line"))?;
        let response = ResponseType::from_code(code)
            .ok_or(SipParseError::MalformedMessage("response code"))?;
        Ok(StartLine::Response(response))
    } else {
        let mut parts = first_line.split_whitespace();
        let (Some(method), Some(uri), Some("SIP/2.0"), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SipParseError::MalformedMessage("request line"));
        };
        Ok(StartLine::Request {
            method: method.parse()?,
            uri: uri.to_string(),
        })
    }
}

/// Joins continuation lines (leading whitespace) onto the line above.
fn logical_lines(header: &str) -> impl Iterator<Item = String> + '_ {
    let mut combined: Vec<String> = Vec::new();
    for line in header.lines() {
        if line.starts_with([' ', '\t']) {
            if let Some(previous) = combined.last_mut() {
                previous.push(' ');
                previous.push_str(line.trim_start());
                continue;
            }
        }
        combined.push(line.to_string());
    }
    combined.into_iter()
}

fn header_to_fields(lines: impl Iterator<Item = String>) -> Vec<SipField> {
    let mut fields = Vec::new();
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if !valid_field_name(name) {
            continue;
        }
        fields.push(SipField {
            name: name.to_string(),
            value_sets: parse_value_sets(value.trim()),
        });
    }
    fields
}

fn field<'a>(fields: &'a [SipField], name: &str) -> Option<&'a SipField> {
    fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

fn fields_to_header(fields: &[SipField]) -> Result<SipMessageHeader, SipParseError> {
    let (from_realname, from_username, from_host) = name_addr_field(fields, "From")?;
    let (to_realname, to_username, to_host) = name_addr_field(fields, "To")?;

    let call_id_field =
        field(fields, "Call-ID").ok_or(SipParseError::MissingMandatoryField("Call-ID"))?;
    let call_id = call_id_field
        .value_sets
        .first()
        .and_then(|set| set.words.first())
        .ok_or(SipParseError::MalformedMessage("Call-ID"))?
        .clone();
    let session_host = call_id
        .split_once('@')
        .map(|(_, host)| host.to_string())
        .unwrap_or_default();

    let cseq_field = field(fields, "CSeq").ok_or(SipParseError::MissingMandatoryField("CSeq"))?;
    let cseq_words = cseq_field
        .value_sets
        .first()
        .map(|set| set.words.as_slice())
        .unwrap_or_default();
    let [cseq_number, cseq_method] = cseq_words else {
        return Err(SipParseError::MalformedMessage("CSeq"));
    };
    let cseq: u32 = cseq_number
        .parse()
        .map_err(|_| SipParseError::MalformedMessage("CSeq"))?;
    let cseq_method: RequestMethod = cseq_method.parse()?;

    // Via stack, topmost hop first; each set is "SIP/2.0/TCP <host>"
    let sender_reply_address = field(fields, "Via")
        .map(|f| {
            f.value_sets
                .iter()
                .filter_map(|set| set.words.get(1).cloned())
                .collect()
        })
        .unwrap_or_default();

    let max_forwards = match field(fields, "Max-Forwards") {
        Some(f) => f
            .value_sets
            .first()
            .and_then(|set| set.words.first())
            .ok_or(SipParseError::MalformedMessage("Max-Forwards"))?
            .parse()
            .map_err(|_| SipParseError::MalformedMessage("Max-Forwards"))?,
        None => MAX_FORWARDS,
    };

    let contact_address = field(fields, "Contact")
        .and_then(|f| f.value_sets.first())
        .and_then(|set| parse_name_addr(&set.words))
        .map(|(_, user, host)| format!("sip:{user}@{host}"))
        .unwrap_or_default();

    let content_type = field(fields, "Content-Type")
        .and_then(|f| f.value_sets.first())
        .and_then(|set| set.words.first())
        .map_or(ContentType::None, |word| ContentType::from_wire(word));

    let content_length = match field(fields, "Content-Length") {
        Some(f) => f
            .value_sets
            .first()
            .and_then(|set| set.words.first())
            .ok_or(SipParseError::MalformedMessage("Content-Length"))?
            .parse()
            .map_err(|_| SipParseError::MalformedMessage("Content-Length"))?,
        None => 0,
    };

    Ok(SipMessageHeader {
        routing: RoutingInfo {
            from_username,
            from_realname,
            from_host,
            to_username,
            to_realname,
            to_host,
            contact_address,
            sender_reply_address,
            session_host,
            max_forwards,
        },
        call_id,
        cseq,
        cseq_method,
        content_type,
        content_length,
    })
}

fn name_addr_field(
    fields: &[SipField],
    name: &'static str,
) -> Result<(String, String, String), SipParseError> {
    let f = field(fields, name).ok_or(SipParseError::MissingMandatoryField(name))?;
    f.value_sets
        .first()
        .and_then(|set| parse_name_addr(&set.words))
        .ok_or(SipParseError::MalformedMessage(name))
}

fn parse_content(content_type: &ContentType, body: &str) -> Result<Content, SipParseError> {
    match content_type {
        ContentType::Sdp => {
            let sdp = SessionDescription::parse(body)
                .map_err(|_| SipParseError::MalformedMessage("sdp body"))?;
            Ok(Content::Sdp(sdp))
        }
        ContentType::None => Ok(Content::None),
        ContentType::Unknown(_) => Ok(Content::Opaque(body.to_string())),
    }
}
