//! Process-wide cooldown after a global 429

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::warn;

/// Gate shared by every bucket of a client.
///
/// While a deadline is set and in the future, `wait` blocks.
#[derive(Debug)]
pub struct GlobalCooldown {
    until: watch::Sender<Option<Instant>>,
}

impl Default for GlobalCooldown {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalCooldown {
    pub fn new() -> Self {
        let (until, _) = watch::channel(None);
        Self { until }
    }

    pub fn is_active(&self) -> bool {
        self.until
            .borrow()
            .is_some_and(|until| until > Instant::now())
    }

    /// Block every request for `duration`. Overlapping activations keep the
    /// later deadline.
    pub fn activate(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        warn!(?duration, "Global rate limit hit, pausing all requests");
        self.until.send_modify(|current| {
            if current.map_or(true, |existing| existing < deadline) {
                *current = Some(deadline);
            }
        });
    }

    /// Lift the cooldown immediately
    pub fn clear(&self) {
        self.until.send_replace(None);
    }

    /// Wait until no cooldown is active
    pub async fn wait(&self) {
        let mut rx = self.until.subscribe();
        loop {
            let deadline = *rx.borrow_and_update();
            match deadline {
                Some(deadline) if deadline > Instant::now() => {
                    tokio::select! {
                        () = sleep_until(deadline) => {}
                        _ = rx.changed() => {}
                    }
                }
                _ => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_returns_immediately_when_inactive() {
        let cooldown = GlobalCooldown::new();
        assert!(!cooldown.is_active());
        tokio::time::timeout(Duration::from_millis(50), cooldown.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_blocks_until_deadline() {
        let cooldown = GlobalCooldown::new();
        cooldown.activate(Duration::from_millis(100));
        assert!(cooldown.is_active());

        let start = Instant::now();
        cooldown.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(90));
        assert!(!cooldown.is_active());
    }

    #[tokio::test]
    async fn test_clear_releases_waiters() {
        let cooldown = std::sync::Arc::new(GlobalCooldown::new());
        cooldown.activate(Duration::from_secs(30));

        let waiter = {
            let cooldown = cooldown.clone();
            tokio::spawn(async move { cooldown.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        cooldown.clear();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
