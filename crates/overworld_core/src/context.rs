//! Per-document counters shared by every grid and object of one open world

/// Identifier of one spatial search call
pub type SearchId = u64;

/// Number of micro-depths one context hands out before consecutive values
/// may round to the same `f64`
pub const MICRO_DEPTH_DISTINCT: u64 = 1 << 26;

/// Counters owned by a single open document.
///
/// Two independently opened worlds each get their own context, so their
/// micro-depths and search stamps never interleave.
#[derive(Debug, Clone, Default)]
pub struct WorldContext {
    next_micro_depth: u64,
    next_search_id: SearchId,
}

impl WorldContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next micro-depth, always in `(0, 1)`.
    ///
    /// Zero is left free for tile layers, which draw below every object of
    /// the same depth. Values are strictly increasing for the first
    /// [`MICRO_DEPTH_DISTINCT`] calls on one context; past that, `f64`
    /// spacing near 1 lets neighbouring values compare equal.
    pub fn next_micro_depth(&mut self) -> f64 {
        self.next_micro_depth += 1;
        let seq = self.next_micro_depth as f64;
        seq / (seq + 1.0)
    }

    /// Fresh id for one search call. Never returns 0, which marks "never stamped".
    pub fn next_search_id(&mut self) -> SearchId {
        self.next_search_id = self.next_search_id.wrapping_add(1).max(1);
        self.next_search_id
    }
}
