use std::{future::pending, time::Duration};

use tokio::time::Instant;

use crate::utils::clock::Clock;

/// Single-slot save timer. Scheduling replaces any previously armed
/// deadline, so a burst of mutations collapses into one write at the end of
/// the quiet window. Flushing out of band must [cancel](Self::cancel) the
/// slot explicitly.
pub struct SaveDebouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl SaveDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Arms (or re-arms) the deadline one window away from `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves when the armed deadline passes. While disarmed this never
    /// resolves, which makes it safe to park in a `select!` arm.
    pub async fn expired(&self, clock: &dyn Clock) {
        match self.deadline {
            Some(deadline) => clock.sleep_until(deadline).await,
            None => pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::{advance, timeout, Instant};

    use super::SaveDebouncer;
    use crate::utils::clock::{Clock, DefaultClock};

    const WINDOW: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn disarmed_debouncer_never_fires() {
        let debouncer = SaveDebouncer::new(WINDOW);
        let result = timeout(Duration::from_secs(10), debouncer.expired(&DefaultClock)).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_the_quiet_window() {
        let mut debouncer = SaveDebouncer::new(WINDOW);
        debouncer.schedule(Instant::now());
        timeout(Duration::from_secs(2), debouncer.expired(&DefaultClock))
            .await
            .expect("deadline should fire within the window");
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_pushes_the_deadline_back() {
        let clock = DefaultClock;
        let mut debouncer = SaveDebouncer::new(WINDOW);
        debouncer.schedule(clock.instant());

        // Half a window later new activity arrives; the original deadline
        // must no longer fire at the one-window mark.
        advance(Duration::from_millis(500)).await;
        debouncer.schedule(clock.instant());

        let result = timeout(Duration::from_millis(600), debouncer.expired(&clock)).await;
        assert!(result.is_err(), "old deadline fired after rescheduling");

        timeout(Duration::from_millis(500), debouncer.expired(&clock))
            .await
            .expect("rescheduled deadline should fire");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms_a_pending_deadline() {
        let clock = DefaultClock;
        let mut debouncer = SaveDebouncer::new(WINDOW);
        debouncer.schedule(clock.instant());
        debouncer.cancel();
        assert!(!debouncer.is_armed());

        let result = timeout(Duration::from_secs(5), debouncer.expired(&clock)).await;
        assert!(result.is_err());
    }
}
