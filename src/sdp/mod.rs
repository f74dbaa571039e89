pub mod addr_type;
pub mod media;
pub mod rtp_map;
pub mod sdp_error;
pub mod session;
pub mod time_desc;

pub use addr_type::AddrType;
pub use media::{MediaAttribute, MediaDescription, MediaKind};
pub use rtp_map::RtpMap;
pub use sdp_error::SdpError;
pub use session::SessionDescription;
pub use time_desc::TimeWindow;
