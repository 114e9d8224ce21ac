//! Cancellable delayed callbacks driven by explicit timestamps.
//!
//! The engine runs on a single cooperative event loop. Instead of OS timers,
//! every component keeps its pending callbacks as [`DelayedCallback`] values
//! and the loop calls `tick(now_ms)` with the current time. A callback fires at
//! most once, and never after it has been cancelled or replaced.

/// A single pending callback carrying a payload of type `T`.
#[derive(Debug, Clone)]
pub struct DelayedCallback<T = ()> {
    pending: Option<(u64, T)>,
}

impl<T> Default for DelayedCallback<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DelayedCallback<T> {
    /// Create an idle callback.
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Schedule `payload` to fire `delay_ms` after `now_ms`, replacing any
    /// pending callback. Returns true if a pending callback was replaced.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, payload: T) -> bool {
        self.pending
            .replace((now_ms.saturating_add(delay_ms), payload))
            .is_some()
    }

    /// Cancel the pending callback. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// True if a callback is scheduled (regardless of whether it is due).
    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// True if a callback is scheduled and has not reached its deadline at `now_ms`.
    pub fn is_pending(&self, now_ms: u64) -> bool {
        matches!(self.pending, Some((deadline, _)) if now_ms < deadline)
    }

    /// Deadline of the pending callback, if any.
    pub fn deadline(&self) -> Option<u64> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Payload of the pending callback, if any.
    pub fn payload(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, payload)| payload)
    }

    /// Take the payload if the deadline has been reached at `now_ms`.
    pub fn fire_if_due(&mut self, now_ms: u64) -> Option<T> {
        match self.pending {
            Some((deadline, _)) if deadline <= now_ms => self.pending.take().map(|(_, p)| p),
            _ => None,
        }
    }
}

/// Earliest of several optional deadlines.
pub(crate) fn earliest(deadlines: impl IntoIterator<Item = Option<u64>>) -> Option<u64> {
    deadlines.into_iter().flatten().min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_at_deadline() {
        let mut cb = DelayedCallback::new();
        cb.schedule(1_000, 150, (4, 2));
        assert_eq!(cb.deadline(), Some(1_150));
        assert!(cb.is_pending(1_149));
        assert_eq!(cb.fire_if_due(1_149), None);
        assert_eq!(cb.fire_if_due(1_150), Some((4, 2)));
        assert_eq!(cb.fire_if_due(2_000), None);
        assert!(!cb.is_scheduled());
    }

    #[test]
    fn test_reschedule_replaces_pending() {
        let mut cb = DelayedCallback::new();
        assert!(!cb.schedule(0, 100, 'a'));
        assert!(cb.schedule(50, 100, 'b'));
        assert_eq!(cb.fire_if_due(100), None);
        assert_eq!(cb.fire_if_due(150), Some('b'));
    }

    #[test]
    fn test_never_fires_after_cancel() {
        let mut cb: DelayedCallback = DelayedCallback::new();
        cb.schedule(0, 10, ());
        assert!(cb.cancel());
        assert!(!cb.cancel());
        assert_eq!(cb.fire_if_due(u64::MAX), None);
    }

    #[test]
    fn test_earliest() {
        assert_eq!(earliest([None, Some(30), Some(10)]), Some(10));
        assert_eq!(earliest([None, None]), None);
    }
}
