use chrono::{DateTime, Duration, Utc};

/// Elapsed-time display for the selected running timer.
///
/// Always reseeded from the timer's stored start time, so drift between ticks
/// never accumulates past the next selection change.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    elapsed: Duration,
    last_tick: Option<DateTime<Utc>>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Stopwatch {
            elapsed: Duration::zero(),
            last_tick: None,
        }
    }
}

impl Stopwatch {
    pub fn start(&mut self, initial_elapsed: Duration, now: DateTime<Utc>) {
        self.elapsed = initial_elapsed.max(Duration::zero());
        self.last_tick = Some(now);
    }

    pub fn stop(&mut self) {
        self.last_tick = None;
    }

    pub fn reset(&mut self) {
        self.stop();
        self.elapsed = Duration::zero();
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.last_tick {
            let delta = now - last;
            if delta > Duration::zero() {
                self.elapsed = self.elapsed + delta;
            }
            self.last_tick = Some(now.max(last));
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn running(&self) -> bool {
        self.last_tick.is_some()
    }
}

pub fn format_duration(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
