use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window request limiter keyed by client address.
///
/// Addresses whose window has fully expired are swept at most once per
/// window, so spoofed `x-forwarded-for` values cannot grow the map forever.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    state: Arc<Mutex<LimiterState>>,
    window: Duration,
    max_requests: usize,
}

#[derive(Debug, Default)]
struct LimiterState {
    hits: HashMap<String, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

impl LimiterState {
    fn sweep(&mut self, now: Instant, window: Duration) {
        let due = self
            .last_sweep
            .map_or(true, |last| now.duration_since(last) >= window);
        if !due {
            return;
        }

        self.hits.retain(|_, hits| {
            expire(hits, now, window);
            !hits.is_empty()
        });
        self.last_sweep = Some(now);
    }
}

fn expire(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while hits
        .front()
        .is_some_and(|oldest| now.duration_since(*oldest) > window)
    {
        hits.pop_front();
    }
}

impl IpRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(LimiterState::default())),
            window,
            max_requests,
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut state = self.state.lock();
        state.sweep(now, self.window);

        let hits = state.hits.entry(key.to_string()).or_default();
        expire(hits, now, self.window);
        if hits.len() >= self.max_requests {
            return false;
        }

        hits.push_back(now);
        true
    }

    #[cfg(test)]
    fn tracked_addresses(&self) -> usize {
        self.state.lock().hits.len()
    }
}
