//! Session accounting.
//!
//! The connection manager notifies a [`StatsKeeper`] when a session's
//! data-plane comes up and again when the session ends, so accounting stays
//! paired across every teardown path (disconnect, clean exit, failure).

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// External accounting sink notified at session boundaries.
pub trait StatsKeeper: Send + Sync {
    /// The session's data-plane connection is up.
    fn mark_session_start(&self);

    /// The session has ended.
    ///
    /// Called at most once per preceding `mark_session_start`.
    fn mark_session_end(&self);
}

#[derive(Default)]
struct TrackerState {
    started_at: Option<Instant>,
    last_duration: Option<Duration>,
    completed: u64,
}

/// Stats keeper that records session durations.
#[derive(Default)]
pub struct SessionTimeTracker {
    state: Mutex<TrackerState>,
}

impl SessionTimeTracker {
    /// Create a tracker with no recorded sessions.
    pub fn new() -> Self {
        SessionTimeTracker::default()
    }

    /// Whether a session is currently running.
    pub fn session_active(&self) -> bool {
        self.state.lock().unwrap().started_at.is_some()
    }

    /// Duration of the most recently completed session.
    pub fn last_session_duration(&self) -> Option<Duration> {
        self.state.lock().unwrap().last_duration
    }

    /// Number of completed sessions.
    pub fn completed_sessions(&self) -> u64 {
        self.state.lock().unwrap().completed
    }
}

impl StatsKeeper for SessionTimeTracker {
    fn mark_session_start(&self) {
        let mut state = self.state.lock().unwrap();
        state.started_at = Some(Instant::now());
    }

    fn mark_session_end(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(started_at) = state.started_at.take() {
            state.last_duration = Some(started_at.elapsed());
            state.completed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_end_records_a_session() {
        let tracker = SessionTimeTracker::new();
        assert!(!tracker.session_active());

        tracker.mark_session_start();
        assert!(tracker.session_active());
        assert_eq!(tracker.completed_sessions(), 0);

        tracker.mark_session_end();
        assert!(!tracker.session_active());
        assert_eq!(tracker.completed_sessions(), 1);
        assert!(tracker.last_session_duration().is_some());
    }

    #[test]
    fn test_end_without_start_is_ignored() {
        let tracker = SessionTimeTracker::new();
        tracker.mark_session_end();
        assert_eq!(tracker.completed_sessions(), 0);
        assert!(tracker.last_session_duration().is_none());
    }
}
