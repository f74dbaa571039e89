use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Condvar, Mutex};

use crate::ice::candidate::{Candidate, Component};
use crate::ice::nomination::SessionNomination;
use crate::ice::IceSubsystem;

#[derive(Debug, Clone, Default)]
struct SessionSlot {
    outcome: Option<bool>,
    nomination: SessionNomination,
}

/// In-process stand-in for the ICE engine, used by tests and local loopback
/// runs. Each session is a slot behind a mutex; the blocking contract calls
/// park on a condvar until the slot's outcome is set, either pre-scripted or
/// from another thread via [`complete`](Self::complete).
#[derive(Default)]
pub struct StubIce {
    sessions: Mutex<HashMap<u32, SessionSlot>>,
    settled: Condvar,
    local_candidates: Vec<Candidate>,
    script: Option<(bool, SessionNomination)>,
}

impl StubIce {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every nomination for every session resolves immediately with the given
    /// outcome, without a `complete` call.
    #[must_use]
    pub fn scripted(success: bool, nomination: SessionNomination) -> Self {
        Self {
            script: Some((success, nomination)),
            ..Self::default()
        }
    }

    /// Sets the candidates `generate_candidates` reports.
    #[must_use]
    pub fn with_host_candidates(mut self, address: IpAddr, rtp_port: u16) -> Self {
        self.local_candidates = vec![
            Candidate::host(address, rtp_port, Component::Rtp),
            Candidate::host(address, rtp_port + 1, Component::Rtcp),
        ];
        self
    }

    /// Resolves the session's nomination and wakes every blocked waiter.
    pub fn complete(&self, session_id: u32, success: bool, nomination: SessionNomination) {
        if let Ok(mut sessions) = self.sessions.lock() {
            let slot = sessions.entry(session_id).or_default();
            slot.outcome = Some(success);
            slot.nomination = nomination;
        }
        self.settled.notify_all();
    }

    fn begin(&self, session_id: u32) {
        let Ok(mut sessions) = self.sessions.lock() else {
            return;
        };
        let slot = sessions.entry(session_id).or_default();
        if let Some((success, nomination)) = &self.script {
            slot.outcome = Some(*success);
            slot.nomination = *nomination;
        }
        drop(sessions);
        self.settled.notify_all();
    }

    fn wait_settled(&self, session_id: u32) -> bool {
        let Ok(mut sessions) = self.sessions.lock() else {
            return false;
        };
        loop {
            match sessions.get(&session_id).and_then(|s| s.outcome) {
                Some(success) => return success,
                None => {
                    sessions = match self.settled.wait(sessions) {
                        Ok(guard) => guard,
                        Err(_) => return false,
                    };
                }
            }
        }
    }
}

impl IceSubsystem for StubIce {
    fn generate_candidates(&self) -> Vec<Candidate> {
        self.local_candidates.clone()
    }

    fn start_nomination(&self, _local: &[Candidate], _remote: &[Candidate], session_id: u32) {
        self.begin(session_id);
    }

    fn respond_to_nominations(&self, _local: &[Candidate], _remote: &[Candidate], session_id: u32) {
        self.begin(session_id);
    }

    fn caller_connection_nominated(&self, session_id: u32) -> bool {
        self.wait_settled(session_id)
    }

    fn callee_connection_nominated(&self, session_id: u32) -> bool {
        self.wait_settled(session_id)
    }

    fn nominated(&self, session_id: u32) -> SessionNomination {
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(&session_id).map(|s| s.nomination))
            .unwrap_or_default()
    }

    fn cleanup_session(&self, session_id: u32) {
        // An in-flight wait observes the aborted outcome instead of hanging.
        if let Ok(mut sessions) = self.sessions.lock() {
            let slot = sessions.entry(session_id).or_default();
            if slot.outcome.is_none() {
                slot.outcome = Some(false);
            }
        }
        self.settled.notify_all();
    }
}
