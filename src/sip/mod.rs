//! Signaling messages: framing, parsing, composing and per-dialog routing.

pub mod composer;
pub mod field;
pub mod frame_buffer;
pub mod message;
pub mod parser;
pub mod routing;
pub mod sip_error;
pub mod transport;

pub use frame_buffer::{FrameBuffer, SipFrame, MAX_BUFFERED_BYTES};
pub use message::{
    generate_call_id, Content, ContentType, RequestMethod, ResponseType, SipRequest, SipResponse,
};
pub use parser::{parse_frame, ParsedMessage};
pub use routing::{RoutingInfo, SipRouting, MAX_FORWARDS};
pub use sip_error::{RoutingError, SipError, SipParseError};
pub use transport::{SipEvent, SipTransport};
