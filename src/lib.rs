//! callsig is the signaling core of a peer-to-peer calling application.
//!
//! It covers everything between the byte stream of a signaling connection and
//! the point where media can flow: framing and parsing of SIP-style messages,
//! per-dialog routing checks, SDP-style session descriptions and the
//! offer/answer negotiation that folds nominated connection addresses back
//! into them. Sockets, media transport and the ICE engine itself live outside
//! this crate and talk to it over channels and the [`ice::IceSubsystem`]
//! trait.

/// Handles configuration loading and management.
pub mod config;
/// Contract with the ICE subsystem and an in-process stub of it.
pub mod ice;
/// Logging utilities for the application.
pub mod log;
/// Offer/answer negotiation, media port allocation and codec policy.
pub mod negotiation;
/// Session description parsing and building.
pub mod sdp;
/// Signaling messages: framing, parsing, composing, routing and transport.
pub mod sip;
