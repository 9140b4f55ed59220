//! Typing indicator debounce
//!
//! `TypingState` is the pure `idle`/`typing` state machine; `TypingTimer`
//! owns the single pending expiry check for a connection. Every keystroke
//! cancels the previous check and schedules a new one, so at most one timer
//! per connection is alive.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::types::ConnectionId;

/// Inactivity threshold after which a typing participant is considered idle
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(800);

/// Per-connection typing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypingState {
    #[default]
    Idle,
    Typing {
        /// Time of the most recent keystroke
        last_activity: Instant,
    },
}

impl TypingState {
    pub fn is_typing(&self) -> bool {
        matches!(self, TypingState::Typing { .. })
    }

    /// Record a keystroke at `now`
    ///
    /// Returns true on the `idle → typing` transition, i.e. when a
    /// `typing` event must be emitted. Later keystrokes only refresh the
    /// activity timestamp.
    pub fn keystroke(&mut self, now: Instant) -> bool {
        let started = !self.is_typing();
        *self = TypingState::Typing { last_activity: now };
        started
    }

    /// Expiry check: go idle if at least `timeout` passed since the last keystroke
    ///
    /// Returns true if the transition happened. Idempotent: a check that
    /// finds the state already idle, or activity too recent, does nothing.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> bool {
        match *self {
            TypingState::Typing { last_activity }
                if now.saturating_duration_since(last_activity) >= timeout =>
            {
                *self = TypingState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Force `typing → idle` (explicit stop, message sent, disconnect)
    ///
    /// Returns true if the connection was typing.
    pub fn stop(&mut self) -> bool {
        let was_typing = self.is_typing();
        *self = TypingState::Idle;
        was_typing
    }
}

/// Notice posted back to the server when a connection's typing timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingExpired {
    pub connection_id: ConnectionId,
}

/// Cancellable expiry check for one connection
#[derive(Debug, Default)]
pub struct TypingTimer {
    handle: Option<JoinHandle<()>>,
}

impl TypingTimer {
    /// Cancel any pending check and schedule a new one `timeout` from now
    pub fn reschedule(
        &mut self,
        connection_id: ConnectionId,
        timeout: Duration,
        notify: mpsc::UnboundedSender<TypingExpired>,
    ) {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            // Server gone: nothing left to notify
            let _ = notify.send(TypingExpired { connection_id });
        }));
    }

    /// Cancel the pending check, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a check is scheduled and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TypingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = DEFAULT_TYPING_TIMEOUT;

    #[test]
    fn test_first_keystroke_starts_typing() {
        let now = Instant::now();
        let mut state = TypingState::default();

        assert!(!state.is_typing());
        assert!(state.keystroke(now));
        assert!(state.is_typing());

        // Subsequent keystrokes do not re-emit
        assert!(!state.keystroke(now + Duration::from_millis(100)));
        assert!(state.is_typing());
    }

    #[test]
    fn test_expire_requires_full_threshold() {
        let start = Instant::now();
        let mut state = TypingState::default();
        state.keystroke(start);

        assert!(!state.expire(start + Duration::from_millis(799), TIMEOUT));
        assert!(state.is_typing());

        assert!(state.expire(start + TIMEOUT, TIMEOUT));
        assert!(!state.is_typing());
    }

    #[test]
    fn test_keystroke_at_799_suppresses_expiry() {
        let start = Instant::now();
        let mut state = TypingState::default();
        state.keystroke(start);
        state.keystroke(start + Duration::from_millis(799));

        // The check scheduled by the first keystroke fires at 800
        assert!(!state.expire(start + TIMEOUT, TIMEOUT));
        assert!(state.is_typing());

        assert!(state.expire(start + Duration::from_millis(1599), TIMEOUT));
    }

    #[test]
    fn test_expire_is_idempotent() {
        let start = Instant::now();
        let mut state = TypingState::default();
        state.keystroke(start);

        let later = start + Duration::from_secs(2);
        assert!(state.expire(later, TIMEOUT));
        assert!(!state.expire(later, TIMEOUT));
    }

    #[test]
    fn test_stop() {
        let mut state = TypingState::default();
        assert!(!state.stop());

        state.keystroke(Instant::now());
        assert!(state.stop());
        assert!(!state.is_typing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_timeout() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new();
        let start = Instant::now();

        let mut timer = TypingTimer::default();
        timer.reschedule(id, TIMEOUT, tx);
        assert!(timer.is_pending());

        let expired = rx.recv().await.unwrap();
        assert_eq!(expired.connection_id, id);
        assert!(start.elapsed() >= TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_cancels_previous() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new();
        let start = Instant::now();

        let mut timer = TypingTimer::default();
        timer.reschedule(id, TIMEOUT, tx.clone());
        tokio::time::sleep(Duration::from_millis(500)).await;
        timer.reschedule(id, TIMEOUT, tx);

        rx.recv().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1300));

        // Only one notice was ever sent
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut timer = TypingTimer::default();
        timer.reschedule(ConnectionId::new(), TIMEOUT, tx.clone());
        timer.cancel();
        assert!(!timer.is_pending());

        let mut dropped = TypingTimer::default();
        dropped.reschedule(ConnectionId::new(), TIMEOUT, tx);
        drop(dropped);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }
}
