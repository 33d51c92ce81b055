//! Single hard-cutoff timer owned by the session.
//!
//! Restart discipline: every transition restarts the watchdog; it is
//! never started once and left running. On fire the session stops the
//! in-flight load and the watchdog disarms until the next transition.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

pub struct Watchdog {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl Watchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    /// (Re)start the timeout window from now.
    pub fn restart(&mut self) {
        self.deadline = Some(Instant::now() + self.timeout);
    }

    /// Disarm after firing; the timer stays quiet until restarted.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Future that resolves when the current window expires. Pends
    /// forever while disarmed. The returned future owns a snapshot of the
    /// deadline, so the watchdog itself stays free to be restarted.
    pub fn expired(&self) -> impl Future<Output = ()> {
        let deadline = self.deadline;
        async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_the_timeout_window() {
        let mut watchdog = Watchdog::new(Duration::from_secs(300));
        watchdog.restart();
        let started = Instant::now();
        watchdog.expired().await;
        assert!(started.elapsed() >= Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn pends_forever_while_disarmed() {
        let watchdog = Watchdog::new(Duration::from_secs(300));
        assert!(!watchdog.is_armed());
        let fired = tokio::time::timeout(Duration::from_secs(3600), watchdog.expired()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_extends_the_window() {
        let mut watchdog = Watchdog::new(Duration::from_secs(300));
        watchdog.restart();
        tokio::time::advance(Duration::from_secs(200)).await;
        watchdog.restart();

        // 200s into the second window: nothing yet.
        let early = tokio::time::timeout(Duration::from_secs(200), watchdog.expired()).await;
        assert!(early.is_err());

        // The remaining 100s elapse and the watchdog fires.
        let late = tokio::time::timeout(Duration::from_secs(150), watchdog.expired()).await;
        assert!(late.is_ok());
    }
}
