/// Convergence monitor settings: how many recent steps to average, the
/// satisfaction threshold, and the scale divisor applied to the
/// reference-ful metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub window_size: usize,
    pub threshold: f32,
    /// Divisor applied to the reference-ful error metric. 1.0 for the
    /// topologies that use the plain |error / input| ratio.
    pub metric_scale: f32,
}

impl MonitorSettings {
    pub fn filtered() -> Self {
        Self {
            window_size: 1000,
            threshold: 0.70,
            metric_scale: 1.0,
        }
    }

    pub fn reference_ful() -> Self {
        Self {
            window_size: 1000,
            threshold: 0.10,
            metric_scale: 100.0,
        }
    }

    pub fn reference_less() -> Self {
        Self {
            window_size: 1000,
            threshold: 0.70,
            metric_scale: 1.0,
        }
    }
}

/// Phase of the convergence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// The observation window has not aged in yet.
    Filling,
    /// Window aged in, watching the rolling average.
    Monitoring,
    /// Terminal: the average dropped below the threshold once.
    Satisfied,
}

/// Outcome of a run's convergence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessVerdict {
    pub satisfied: bool,
    /// Step index at which the latch flipped, if it did.
    pub satisfied_at: Option<usize>,
}

/// Watches a sliding window of per-step error ratios and latches once
/// their rolling average first drops below the threshold.
///
/// The ring starts as zeros and the average is always taken over the full
/// window, so early steps see a window padded with silence. The check
/// only arms once the step index reaches the window size, and the latch
/// is one-shot: later samples are still recorded but the verdict never
/// reverts.
pub struct LivenessMonitor {
    values: Vec<f32>,
    cursor: usize,
    /// Running sum of the ring, kept in f64 so long runs do not drift.
    sum: f64,
    threshold: f32,
    state: MonitorState,
    satisfied_at: Option<usize>,
}

impl LivenessMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            values: vec![0.0; settings.window_size],
            cursor: 0,
            sum: 0.0,
            threshold: settings.threshold,
            state: MonitorState::Filling,
            satisfied_at: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn verdict(&self) -> LivenessVerdict {
        LivenessVerdict {
            satisfied: self.state == MonitorState::Satisfied,
            satisfied_at: self.satisfied_at,
        }
    }

    fn average(&self) -> f32 {
        if self.values.is_empty() {
            0.0
        } else {
            (self.sum / self.values.len() as f64) as f32
        }
    }

    /// Record the metric for `step` and advance the state machine.
    pub fn observe(&mut self, step: usize, metric: f32) {
        if !self.values.is_empty() {
            let evicted = self.values[self.cursor];
            self.values[self.cursor] = metric;
            self.cursor = (self.cursor + 1) % self.values.len();
            self.sum += metric as f64 - evicted as f64;
        }

        if self.state == MonitorState::Filling && step >= self.values.len() {
            self.state = MonitorState::Monitoring;
        }
        if self.state == MonitorState::Monitoring && self.average() < self.threshold {
            self.state = MonitorState::Satisfied;
            self.satisfied_at = Some(step);
        }
    }
}
