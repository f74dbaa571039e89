//! Contract with the ICE subsystem: candidate gathering, nomination and
//! cleanup. The negotiator drives these calls; the engine behind them lives
//! outside this crate. `caller_connection_nominated` and
//! `callee_connection_nominated` block the calling thread, which is deliberate:
//! no final signaling message may be composed before nomination settles.

pub mod candidate;
pub mod nomination;
pub mod stub;

pub use candidate::{Candidate, Component};
pub use nomination::{MediaNomination, NominatedPair, SessionNomination};
pub use stub::StubIce;

pub trait IceSubsystem: Send + Sync {
    /// Gathers local connectivity candidates. Synchronous, no session context.
    fn generate_candidates(&self) -> Vec<Candidate>;

    /// Begins asynchronous nomination for a fresh session in the controller role.
    fn start_nomination(&self, local: &[Candidate], remote: &[Candidate], session_id: u32);

    /// Begins nomination in the answering, controllee-aware role.
    fn respond_to_nominations(&self, local: &[Candidate], remote: &[Candidate], session_id: u32);

    /// Blocks until the controller-side nomination for this session concludes.
    /// True on success.
    fn caller_connection_nominated(&self, session_id: u32) -> bool;

    /// Blocks until the callee-side nomination for this session concludes.
    fn callee_connection_nominated(&self, session_id: u32) -> bool;

    /// The nominated address pairs for this session. Absent entries mean that
    /// media line's candidates failed to nominate.
    fn nominated(&self, session_id: u32) -> SessionNomination;

    /// Releases all nomination state for the session and unblocks any waiter.
    /// Safe to call for unknown or already-finished sessions.
    fn cleanup_session(&self, session_id: u32);
}
