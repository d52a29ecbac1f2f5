//! Small shared utilities.

/// Strictly increasing millisecond clock.
///
/// Successive calls never return the same value, even when the wall clock
/// stalls or steps backwards, so save timestamps always order correctly
/// within a process.
pub mod increasing_time {
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static LAST: AtomicI64 = AtomicI64::new(0);

    /// Current epoch milliseconds, bumped past every previously returned
    /// value.
    pub fn next_millis() -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let mut prev = LAST.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match LAST.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return next,
                Err(observed) => prev = observed,
            }
        }
    }

}
