use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// Allocates RTP/RTCP port pairs from a bounded range shared by every session.
///
/// A pair is two consecutive ports (RTP even offset, RTCP = RTP + 1) and is
/// always handed out and taken back whole. The allocator is the only state
/// shared across sessions, so every mutation happens under the mutex.
pub struct PortAllocator {
    pool: Mutex<PortPool>,
}

struct PortPool {
    free: VecDeque<u16>,
    reserved: HashSet<u16>,
}

impl PortAllocator {
    /// Partitions `[min_port, max_port)` into at most `max_pairs` pairs.
    #[must_use]
    pub fn new(min_port: u16, max_port: u16, max_pairs: usize) -> Self {
        let mut free = VecDeque::new();
        let mut rtp = min_port;
        while free.len() < max_pairs && rtp < max_port && rtp.checked_add(1).is_some() {
            free.push_back(rtp);
            match rtp.checked_add(2) {
                Some(next) => rtp = next,
                None => break,
            }
        }
        Self {
            pool: Mutex::new(PortPool {
                free,
                reserved: HashSet::new(),
            }),
        }
    }

    /// Reserves the next free pair and returns its RTP port, or `None` when
    /// the pool is exhausted.
    #[must_use]
    pub fn reserve_pair(&self) -> Option<u16> {
        let mut pool = self.pool.lock().ok()?;
        let rtp = pool.free.pop_front()?;
        pool.reserved.insert(rtp);
        Some(rtp)
    }

    /// Returns a pair to the pool. A no-op for the 0 sentinel and for ports
    /// that are not currently reserved, so double release never double-credits.
    pub fn release_pair(&self, rtp_port: u16) {
        if rtp_port == 0 {
            return;
        }
        let Ok(mut pool) = self.pool.lock() else {
            return;
        };
        if pool.reserved.remove(&rtp_port) {
            pool.free.push_back(rtp_port);
        }
    }

    /// True when at least `pairs` pairs remain free.
    #[must_use]
    pub fn has_free(&self, pairs: usize) -> bool {
        self.pool.lock().map(|p| p.free.len() >= pairs).unwrap_or(false)
    }

    #[must_use]
    pub fn free_pairs(&self) -> usize {
        self.pool.lock().map(|p| p.free.len()).unwrap_or(0)
    }
}
