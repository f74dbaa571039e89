/// The single `t=` time window of a session description. Calls are unbounded,
/// so both values are normally 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    pub start: u64,
    pub stop: u64,
}

impl TimeWindow {
    #[must_use]
    pub const fn new(start: u64, stop: u64) -> Self {
        Self { start, stop }
    }

    /// `t=0 0`, the open-ended window used for live calls.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { start: 0, stop: 0 }
    }
}
