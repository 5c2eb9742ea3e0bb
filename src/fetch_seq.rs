use std::sync::atomic::{AtomicU64, Ordering};

/// Request-sequence guard: every fetch takes a ticket, and only the holder of
/// the newest ticket may write its result.
#[derive(Debug, Default)]
pub struct FetchSeq(AtomicU64);

impl FetchSeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}
