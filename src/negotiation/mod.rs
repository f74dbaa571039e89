pub mod negotiation_error;
pub mod negotiator;
pub mod port_allocator;
pub mod session_policy;

pub use negotiation_error::NegotiationError;
pub use negotiator::SdpNegotiator;
pub use port_allocator::PortAllocator;
pub use session_policy::SessionPolicy;
