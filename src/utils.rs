use std::time::{Duration, Instant};

use crate::pipeline::Metrics;

/// Frame time counter that averages the last N samples.
#[derive(Clone, Default)]
pub struct FpsCounter {
    measured_times: Vec<Duration>,
    max_samples: usize,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::with_samples(60)
    }

    pub fn with_samples(max_samples: usize) -> Self {
        FpsCounter {
            measured_times: Vec::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    pub fn record_measurement(&mut self, measurement: Duration) {
        if self.measured_times.len() >= self.max_samples {
            self.measured_times.rotate_left(1);
            if let Some(last) = self.measured_times.last_mut() {
                *last = measurement;
            }
        } else {
            self.measured_times.push(measurement);
        }
    }

    pub fn mean_time(&self) -> Duration {
        if self.measured_times.is_empty() {
            return Duration::ZERO;
        }
        self.measured_times.iter().sum::<Duration>() / self.measured_times.len() as u32
    }

    pub fn mean_fps(&self) -> f32 {
        1. / self.mean_time().as_secs_f32()
    }

    /// Mean of the slowest `fraction` of the samples.
    pub fn worst_mean_time(&mut self, fraction: f32) -> Duration {
        assert!(fraction > 0. && fraction <= 1., "fraction must be in range (0, 1]");
        if self.measured_times.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted = self.measured_times.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let len = ((sorted.len() as f32 * fraction) as usize).clamp(1, sorted.len());
        sorted[..len].iter().sum::<Duration>() / len as u32
    }
}

/// Fixed rate timer. A frame that overruns its slot delays the following ones instead of letting the clock
/// skip ahead or catch up.
#[derive(Clone, Debug)]
pub struct FrameClock {
    interval: Duration,
    deadline: Instant,
}

impl FrameClock {
    pub fn new(fps: u32, now: Instant) -> Self {
        FrameClock {
            interval: Duration::from_secs(1) / fps.max(1),
            deadline: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the next frame should start.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Marks a frame as started at `now` and schedules the next one.
    pub fn tick(&mut self, now: Instant) -> Instant {
        self.deadline = (self.deadline + self.interval).max(now);
        self.deadline
    }
}

/// Aggregates per-frame metrics and reports them once per period.
#[derive(Clone)]
pub struct FrameStats {
    frame_times: FpsCounter,
    vertex_times: FpsCounter,
    fragment_times: FpsCounter,
    period: Duration,
    last_report: Instant,
    last_frame: Option<Instant>,
}

impl FrameStats {
    pub fn new(period: Duration, now: Instant) -> Self {
        FrameStats {
            frame_times: FpsCounter::new(),
            vertex_times: FpsCounter::new(),
            fragment_times: FpsCounter::new(),
            period,
            last_report: now,
            last_frame: None,
        }
    }

    pub fn record(&mut self, metrics: &Metrics, now: Instant) {
        if let Some(prev) = self.last_frame.replace(now) {
            self.frame_times.record_measurement(now - prev);
        }
        self.vertex_times.record_measurement(metrics.vertex_time);
        self.fragment_times.record_measurement(metrics.fragment_time);
    }

    /// Logs a summary if a full period elapsed since the last one. Returns whether it did.
    pub fn report(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last_report) < self.period {
            return false;
        }
        self.last_report = now;
        log::info!(
            "{:.1} fps (worst 10%: {:.2?}), vertex pass {:.2?}, fragment pass {:.2?}",
            self.frame_times.mean_fps(),
            self.frame_times.worst_mean_time(0.1),
            self.vertex_times.mean_time(),
            self.fragment_times.mean_time(),
        );
        true
    }
}
