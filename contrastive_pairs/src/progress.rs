use log::info;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct State {
    done: usize,
    start: Instant,
}

/// Files-processed counter shared by all workers of one run.
pub struct Progress {
    label: String,
    total: usize,
    every: usize,
    state: Mutex<State>,
}

impl Progress {
    pub fn new(label: impl Into<String>, total: usize, every: usize) -> Self {
        Self {
            label: label.into(),
            total,
            every: every.max(1),
            state: Mutex::new(State {
                done: 0,
                start: Instant::now(),
            }),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done(&self) -> usize {
        self.state.lock().done
    }

    /// Remaining time extrapolated from the mean time per finished file.
    fn eta_from(done: usize, total: usize, elapsed: Duration) -> Option<Duration> {
        if done == 0 {
            return None;
        }
        let per_file = elapsed.as_secs_f64() / done as f64;
        Some(Duration::from_secs_f64(per_file * total.saturating_sub(done) as f64))
    }

    /// Count one finished file and log every `every` files.
    pub fn tick(&self) {
        let (done, elapsed) = {
            let mut s = self.state.lock();
            s.done += 1;
            (s.done, s.start.elapsed())
        };
        if done % self.every != 0 || self.total == 0 {
            return;
        }
        let pct = done as f64 / self.total as f64 * 100.0;
        let eta = Self::eta_from(done, self.total, elapsed).unwrap_or_default();
        info!("[{}] {:.2}%\tETA: {}s", self.label, pct, eta.as_secs());
    }
}
