//! Millisecond clock contract and best-effort frame pacing.
//!
//! Pacing is a frame-rate cap, not a fixed-timestep simulation clock: the
//! measured elapsed time is never fed into the update phase, so game speed
//! follows the achieved frame rate.

use std::time::{Duration, Instant};

/// Whole-millisecond frame budget for a 60 FPS cap (integer division, 16 ms).
pub const DEFAULT_FRAME_BUDGET_MS: u64 = 1000 / 60;

const FPS_SAMPLE_COUNT: usize = 60;

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_millis(&self) -> u64;

    fn sleep_millis(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Wall clock measured from its own construction.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

pub struct FramePacer {
    pub frame_budget_ms: u64,
    last_frame_start: u64,
    pub frame_count: u64,
    /// How long the last pacing wait slept.
    pub last_sleep_ms: u64,

    frame_samples: [f64; FPS_SAMPLE_COUNT],
    frame_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FramePacer {
    pub fn new<C: Clock>(frame_budget_ms: u64, clock: &C) -> Self {
        let budget = frame_budget_ms as f64;
        Self {
            frame_budget_ms,
            last_frame_start: clock.now_millis(),
            frame_count: 0,
            last_sleep_ms: 0,
            frame_samples: [budget; FPS_SAMPLE_COUNT],
            frame_sample_index: 0,
            smoothed_fps: if budget > 0.0 { 1000.0 / budget } else { 0.0 },
            smoothed_frame_time_ms: budget,
        }
    }

    /// Sleep away whatever is left of the frame budget, then start the next
    /// frame. Returns the time slept in milliseconds.
    pub fn end_frame<C: Clock>(&mut self, clock: &mut C) -> u64 {
        let elapsed = clock.now_millis().saturating_sub(self.last_frame_start);
        let slept = if elapsed < self.frame_budget_ms {
            let remaining = self.frame_budget_ms - elapsed;
            clock.sleep_millis(remaining);
            remaining
        } else {
            if elapsed > self.frame_budget_ms * 4 {
                log::debug!(
                    "Frame took {}ms (budget {}ms)",
                    elapsed,
                    self.frame_budget_ms
                );
            }
            0
        };

        let now = clock.now_millis();
        let frame_ms = now.saturating_sub(self.last_frame_start);
        self.last_frame_start = now;
        self.last_sleep_ms = slept;
        self.frame_count += 1;
        self.record_sample(frame_ms as f64);
        slept
    }

    fn record_sample(&mut self, frame_ms: f64) {
        self.frame_samples[self.frame_sample_index] = frame_ms;
        self.frame_sample_index = (self.frame_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_ms: f64 = self.frame_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_ms;
        self.smoothed_fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
    }
}
