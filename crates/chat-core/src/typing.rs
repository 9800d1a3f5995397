use std::time::{Duration, Instant};

/// Inactivity window after which an active typist is considered stopped.
pub const DEFAULT_INACTIVITY_WINDOW: Duration = Duration::from_millis(3000);

/// Outbound presence signal produced by a debouncer transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    /// Emit `typing = true` to the transport.
    Started,
    /// Emit `typing = false` to the transport.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    Active,
}

/// Client-local typing debouncer.
///
/// Emits at most one `Started` per activity session: further keystrokes
/// while active only push the inactivity deadline out. Time is passed in by
/// the caller, so the state machine itself never sleeps; the owner schedules
/// a timer for [`TypingDebouncer::deadline`] and reports expiry via
/// [`TypingDebouncer::tick`].
#[derive(Debug, Clone)]
pub struct TypingDebouncer {
    state: DebounceState,
    deadline: Option<Instant>,
    window: Duration,
}

impl Default for TypingDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_INACTIVITY_WINDOW)
    }
}

impl TypingDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            state: DebounceState::Idle,
            deadline: None,
            window,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == DebounceState::Active
    }

    /// Deadline the owner should arm a timer for, while active.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Feed the current input text; returns the signal to emit, if any.
    pub fn input_changed(&mut self, text: &str, now: Instant) -> Option<TypingSignal> {
        match (self.state, text.is_empty()) {
            (DebounceState::Idle, false) => {
                self.state = DebounceState::Active;
                self.deadline = Some(now + self.window);
                Some(TypingSignal::Started)
            }
            (DebounceState::Active, false) => {
                self.deadline = Some(now + self.window);
                None
            }
            (DebounceState::Active, true) => {
                self.go_idle();
                Some(TypingSignal::Stopped)
            }
            // Already idle with an empty input: redundant, suppressed.
            (DebounceState::Idle, true) => None,
        }
    }

    /// The user submitted a message; an active session ends immediately.
    pub fn message_submitted(&mut self) -> Option<TypingSignal> {
        match self.state {
            DebounceState::Active => {
                self.go_idle();
                Some(TypingSignal::Stopped)
            }
            DebounceState::Idle => None,
        }
    }

    /// A timer armed for `fired_deadline` elapsed.
    ///
    /// Ticks for superseded deadlines are rejected, so a stale callback that
    /// escaped cancellation cannot end a session that was since extended.
    pub fn tick(&mut self, fired_deadline: Instant) -> Option<TypingSignal> {
        match (self.state, self.deadline) {
            (DebounceState::Active, Some(deadline)) if deadline <= fired_deadline => {
                self.go_idle();
                Some(TypingSignal::Stopped)
            }
            _ => None,
        }
    }

    /// Drop all state without emitting a signal, for room teardown.
    pub fn reset(&mut self) {
        self.go_idle();
    }

    fn go_idle(&mut self) {
        self.state = DebounceState::Idle;
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn burst_of_input_emits_exactly_one_start_and_one_stop() {
        let base = Instant::now();
        let mut debouncer = TypingDebouncer::default();

        let mut signals = Vec::new();
        for (i, text) in ["h", "he", "hel", "hell", "hello"].iter().enumerate() {
            signals.extend(debouncer.input_changed(text, at(base, i as u64 * 100)));
        }
        assert_eq!(signals, vec![TypingSignal::Started]);

        // Window elapses with no further input.
        let deadline = debouncer.deadline().expect("active session has a deadline");
        assert_eq!(debouncer.tick(deadline), Some(TypingSignal::Stopped));
        assert!(!debouncer.is_active());
    }

    #[test]
    fn each_keystroke_extends_the_deadline() {
        let base = Instant::now();
        let mut debouncer = TypingDebouncer::default();

        debouncer.input_changed("h", base);
        let first = debouncer.deadline().expect("deadline set");

        debouncer.input_changed("hi", at(base, 1000));
        let second = debouncer.deadline().expect("deadline extended");
        assert_eq!(second, at(base, 1000) + DEFAULT_INACTIVITY_WINDOW);
        assert!(second > first);
    }

    #[test]
    fn stale_tick_for_superseded_deadline_is_rejected() {
        let base = Instant::now();
        let mut debouncer = TypingDebouncer::default();

        debouncer.input_changed("h", base);
        let stale = debouncer.deadline().expect("deadline set");
        debouncer.input_changed("hi", at(base, 2000));

        assert_eq!(debouncer.tick(stale), None);
        assert!(debouncer.is_active());

        let current = debouncer.deadline().expect("deadline still set");
        assert_eq!(debouncer.tick(current), Some(TypingSignal::Stopped));
    }

    #[test]
    fn clearing_the_input_stops_the_session() {
        let base = Instant::now();
        let mut debouncer = TypingDebouncer::default();

        debouncer.input_changed("h", base);
        assert_eq!(
            debouncer.input_changed("", at(base, 500)),
            Some(TypingSignal::Stopped)
        );
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn empty_input_while_idle_emits_nothing() {
        let mut debouncer = TypingDebouncer::default();
        assert_eq!(debouncer.input_changed("", Instant::now()), None);
        assert!(!debouncer.is_active());
    }

    #[test]
    fn submit_ends_an_active_session_once() {
        let mut debouncer = TypingDebouncer::default();
        debouncer.input_changed("h", Instant::now());

        assert_eq!(debouncer.message_submitted(), Some(TypingSignal::Stopped));
        assert_eq!(debouncer.message_submitted(), None);
    }

    #[test]
    fn reset_is_silent() {
        let mut debouncer = TypingDebouncer::default();
        debouncer.input_changed("h", Instant::now());

        debouncer.reset();
        assert!(!debouncer.is_active());
        assert_eq!(debouncer.deadline(), None);
        // A tick from a timer that escaped cancellation stays inert.
        assert_eq!(debouncer.tick(Instant::now()), None);
    }

    #[test]
    fn new_session_can_start_after_stop() {
        let base = Instant::now();
        let mut debouncer = TypingDebouncer::default();

        debouncer.input_changed("h", base);
        debouncer.message_submitted();

        assert_eq!(
            debouncer.input_changed("again", at(base, 100)),
            Some(TypingSignal::Started)
        );
    }
}
