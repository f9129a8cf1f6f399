use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of waiting on a [`Pacer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// The full delay elapsed
    Elapsed,
    /// Cancellation was requested before the delay elapsed
    Cancelled,
}

/// Fixed pause between consecutive submissions, cut short by cancellation
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn wait(&self, cancel: &CancellationToken) -> Pace {
        if cancel.is_cancelled() {
            return Pace::Cancelled;
        }
        if self.delay.is_zero() {
            return Pace::Elapsed;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Pace::Cancelled,
            _ = tokio::time::sleep(self.delay) => Pace::Elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_wait_elapses() {
        let pacer = Pacer::new(Duration::from_secs(2));
        let start = Instant::now();

        assert_eq!(pacer.wait(&CancellationToken::new()).await, Pace::Elapsed);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cut_short_by_cancel() {
        let pacer = Pacer::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        assert_eq!(pacer.wait(&cancel).await, Pace::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_already_cancelled_returns_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(
            Pacer::new(Duration::from_secs(3600)).wait(&cancel).await,
            Pace::Cancelled
        );
    }

    #[tokio::test]
    async fn test_zero_delay() {
        let pacer = Pacer::new(Duration::ZERO);
        assert_eq!(pacer.wait(&CancellationToken::new()).await, Pace::Elapsed);
    }
}
