use persistence::{KvStore, PersistenceBridge, Slice};

/// A slice whose stored raw value differs from what this view last saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChange {
    pub slice: Slice,
    /// `None` when another view removed the slice.
    pub raw: Option<String>,
}

/// Change detector for the shared store.
///
/// The store has no change notification, so the host calls [`poll`] on a
/// fixed interval. Each poll marks the observed raw value as seen before
/// returning it, even if it later fails validation; static garbage is
/// reported once, not on every tick.
///
/// [`poll`]: SyncPoller::poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPoller {
    interval_ms: u32,
    ticks: u64,
}

impl SyncPoller {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            ticks: 0,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Changed slices, in `Slice::ALL` order.
    pub fn poll<S: KvStore>(&mut self, bridge: &mut PersistenceBridge<S>) -> Vec<ExternalChange> {
        self.ticks = self.ticks.wrapping_add(1);
        let mut out = Vec::new();
        for slice in Slice::ALL {
            let raw = bridge.raw(slice);
            if bridge.cached(slice) == Some(raw.as_deref()) {
                continue;
            }
            bridge.remember(slice, raw.clone());
            out.push(ExternalChange { slice, raw });
        }
        out
    }
}
