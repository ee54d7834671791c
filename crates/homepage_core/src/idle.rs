use std::time::Duration;

use tokio::time::Instant;

/// Countdown to the idle-timeout open. Activity pushes the deadline back.
#[derive(Debug, Clone, Copy)]
pub struct IdleTimer {
    last_activity: Instant,
}

impl IdleTimer {
    pub fn new() -> Self {
        Self {
            last_activity: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn deadline(&self, threshold: Duration) -> Instant {
        self.last_activity + threshold
    }
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn activity_pushes_the_deadline_back() {
        let threshold = Duration::from_secs(60);
        let mut timer = IdleTimer::new();
        let first = timer.deadline(threshold);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(timer.deadline(threshold) > Instant::now());

        timer.touch();
        assert!(timer.deadline(threshold) > first);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(timer.deadline(threshold) > Instant::now());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(timer.deadline(threshold) <= Instant::now());
    }
}
