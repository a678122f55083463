//! Fixed inter-request delay shared by every call to one provider.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces successive requests at least `delay` apart.
///
/// The first request goes out immediately. Holding the lock across the sleep
/// keeps concurrent callers in line as well.
#[derive(Debug)]
pub struct RequestPacer {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait until the next request may be sent, then claim the slot.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.delay;
            if Instant::now() < ready_at {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_is_not_delayed() {
        let pacer = RequestPacer::new(Duration::from_secs(5));
        let started = Instant::now();
        pacer.wait().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn second_request_waits_for_the_delay() {
        let pacer = RequestPacer::new(Duration::from_millis(60));
        pacer.wait().await;
        let started = Instant::now();
        pacer.wait().await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn zero_delay_never_blocks() {
        tokio_test::block_on(async {
            let pacer = RequestPacer::new(Duration::ZERO);
            for _ in 0..3 {
                pacer.wait().await;
            }
            assert_eq!(pacer.delay(), Duration::ZERO);
        });
    }
}
