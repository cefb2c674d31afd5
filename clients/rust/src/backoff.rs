use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;

/// Fixed-delay retry policy bounded by total elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff {
    interval: Duration,
    max_elapsed: Duration,
}

impl ConstantBackoff {
    pub fn new(interval: Duration, max_elapsed: Duration) -> Self {
        Self {
            interval,
            max_elapsed,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_elapsed(&self) -> Duration {
        self.max_elapsed
    }

    /// Starts the elapsed-time clock.
    pub fn retry(&self) -> Retry {
        Retry {
            interval: self.interval,
            max_elapsed: self.max_elapsed,
            started: Instant::now(),
            current_attempt: 0,
        }
    }
}

/// Yields one [`Delay`] per attempt. The first attempt is immediate; every
/// later attempt waits `interval`. Iteration ends once waiting another
/// interval would overshoot the elapsed-time budget.
#[derive(Debug)]
pub struct Retry {
    interval: Duration,
    max_elapsed: Duration,
    started: Instant,
    current_attempt: u32,
}

impl Retry {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns the duration to sleep if a retry should be done
    /// or None if we should no longer retry
    fn next_duration(&self) -> Option<Duration> {
        if self.elapsed() + self.interval > self.max_elapsed {
            return None;
        }
        Some(self.interval)
    }
}

impl Iterator for Retry {
    type Item = Delay;

    fn next(&mut self) -> Option<Self::Item> {
        self.current_attempt += 1;
        if self.current_attempt == 1 {
            return Some(Delay::new(Duration::ZERO, self.current_attempt));
        }

        self.next_duration()
            .map(|d| Delay::new(d, self.current_attempt))
    }
}

#[derive(Debug)]
pub struct Delay {
    duration: Duration,
    attempt_counter: u32,
    sleep: Pin<Box<tokio::time::Sleep>>,
}

impl Delay {
    fn new(duration: Duration, attempt_counter: u32) -> Self {
        Self {
            duration,
            attempt_counter,
            sleep: Box::pin(tokio::time::sleep(duration)),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn attempt_number(&self) -> u32 {
        self.attempt_counter
    }

    pub fn first_attempt(&self) -> bool {
        self.attempt_counter == 1
    }
}

impl std::future::Future for Delay {
    type Output = ();

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        if self.attempt_counter == 1 {
            // The first attempt never sleeps or yields to the scheduler.
            return std::task::Poll::Ready(());
        }
        self.sleep.as_mut().poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_attempt_is_immediate() {
        let backoff =
            ConstantBackoff::new(Duration::from_secs(2), Duration::from_secs(10));
        let mut retry = backoff.retry();

        let delay = retry.next().unwrap();
        assert!(delay.first_attempt());
        assert_eq!(Duration::ZERO, delay.duration());

        let before = Instant::now();
        delay.await;
        assert_eq!(Duration::ZERO, before.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn constant_delays_until_budget_is_spent() {
        let backoff =
            ConstantBackoff::new(Duration::from_secs(2), Duration::from_secs(10));
        let mut retry = backoff.retry();
        let mut attempts = 0;

        while let Some(delay) = retry.next() {
            if !delay.first_attempt() {
                // No exponential growth.
                assert_eq!(Duration::from_secs(2), delay.duration());
            }
            delay.await;
            attempts += 1;
        }

        // t = 0, 2, 4, 6, 8, 10
        assert_eq!(6, attempts);
        assert_eq!(Duration::from_secs(10), retry.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempts_count_against_budget() {
        let backoff =
            ConstantBackoff::new(Duration::from_secs(1), Duration::from_secs(5));
        let mut retry = backoff.retry();

        retry.next().unwrap().await;
        tokio::time::sleep(Duration::from_secs(4)).await;
        // 4s spent + 1s interval still fits.
        let delay = retry.next().unwrap();
        assert_eq!(2, delay.attempt_number());
        delay.await;
        assert!(retry.next().is_none());
    }
}
