use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Cancellable debounce timer.
///
/// Each call to [`Debouncer::arm`] invalidates every earlier ticket, so only
/// the latest caller fires after the quiet period. Runs on tokio time and is
/// deterministic under a paused test clock.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    /// Start (or restart) the debounce window.
    pub fn arm(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Invalidate all outstanding tickets without arming a new window.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Wait out the quiet period; returns whether this ticket should fire.
    pub async fn fire(&self, ticket: Ticket) -> bool {
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn last_armed_ticket_wins() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let first = debouncer.arm();
        let second = debouncer.arm();

        assert!(!debouncer.fire(first).await);
        assert!(debouncer.fire(second).await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_invalidates_pending_ticket() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let ticket = debouncer.arm();
        debouncer.cancel();

        assert!(!debouncer.fire(ticket).await);
    }

    #[tokio::test(start_paused = true)]
    async fn ticket_fires_when_undisturbed() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let ticket = debouncer.arm();
        assert!(debouncer.fire(ticket).await);
    }
}
