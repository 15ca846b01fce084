/// Wall-clock source in milliseconds since the Unix epoch.
///
/// Glow animations are phase-locked to this clock so that every view and
/// every unit shares the same animation phase.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// `SystemTime`-backed clock; maps to `Date.now()` on wasm.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Phase offset into a repeating animation of `period_ms`.
pub fn phase_ms(now_ms: u64, period_ms: u64) -> u64 {
    if period_ms == 0 {
        return 0;
    }
    now_ms % period_ms
}
