use std::time::{Duration, Instant};

/// Measures the time between consecutive frames.
#[derive(Debug, Default, Clone)]
pub struct Clock {
    last: Option<Instant>,
}

impl Clock {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Time since the previous call. The first call returns zero.
    pub fn delta(&mut self) -> Duration {
        self.delta_at(Instant::now())
    }

    pub fn delta_at(&mut self, now: Instant) -> Duration {
        let delta = self
            .last
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last = Some(now);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_delta_is_zero_then_elapsed() {
        let mut clock = Clock::new();
        let start = Instant::now();
        assert_eq!(clock.delta_at(start), Duration::ZERO);
        assert_eq!(
            clock.delta_at(start + Duration::from_millis(16)),
            Duration::from_millis(16)
        );
    }
}
