use log::{error, info};

use crate::controller::Controller;
use crate::error::SimulationError;
use crate::monitor::{LivenessMonitor, LivenessVerdict, MonitorSettings};

/// Feedback wiring between the error microphone and the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// No feedback at all: the filter state is static for the run.
    Filtered,
    /// A separately streamed clean reference sample is fed back each step.
    ReferenceFul,
    /// The just-computed error-microphone value is fed back: fully
    /// closed-loop.
    ReferenceLess,
}

impl Topology {
    /// Monitor window/threshold defaults for this wiring.
    pub fn default_monitor(&self) -> MonitorSettings {
        match self {
            Topology::Filtered => MonitorSettings::filtered(),
            Topology::ReferenceFul => MonitorSettings::reference_ful(),
            Topology::ReferenceLess => MonitorSettings::reference_less(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Topology::Filtered => "filtered",
            Topology::ReferenceFul => "reference-ful",
            Topology::ReferenceLess => "reference-less",
        }
    }
}

/// Everything a run produces: the error-microphone sequence, the
/// convergence verdict, and the framing data a sink needs.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Error-microphone samples, one per completed step. Shorter than the
    /// requested count only after a safety abort.
    pub samples: Vec<f32>,
    pub liveness: LivenessVerdict,
    /// Mean squared error against the reference stream. Reference-ful
    /// runs only.
    pub mse: Option<f32>,
    /// Echoed back for audio-format sinks; the core never interprets it.
    pub sample_rate: u32,
    /// Step at which the safety check aborted the run, if it did.
    pub safety_fault: Option<usize>,
}

/// Drives one controller through a feedback topology, step by step.
///
/// The runner can be reused: successive runs keep the controller's
/// learned weights (intentionally), while the liveness monitor is built
/// fresh for every run.
pub struct SimulationRunner {
    topology: Topology,
    controller: Controller,
    monitor_settings: MonitorSettings,
    sample_rate: u32,
}

impl SimulationRunner {
    pub fn new(topology: Topology, controller: Controller, sample_rate: u32) -> Self {
        Self {
            topology,
            controller,
            monitor_settings: topology.default_monitor(),
            sample_rate,
        }
    }

    /// Override the monitor window/threshold for subsequent runs.
    pub fn with_monitor_settings(mut self, settings: MonitorSettings) -> Self {
        self.monitor_settings = settings;
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Swap in a different controller for the next run.
    pub fn replace_controller(&mut self, controller: Controller) {
        self.controller = controller;
    }

    /// Run the filtered or reference-less wiring over `steps` samples.
    pub fn run(
        &mut self,
        disturbance: &[f32],
        steps: usize,
    ) -> Result<SimulationResult, SimulationError> {
        self.drive(disturbance, None, steps)
    }

    /// Run the reference-ful wiring: the disturbance stream (independent
    /// noise plus reference, combined upstream) and the clean reference
    /// stream, step-aligned.
    pub fn run_with_reference(
        &mut self,
        disturbance: &[f32],
        reference: &[f32],
        steps: usize,
    ) -> Result<SimulationResult, SimulationError> {
        self.drive(disturbance, Some(reference), steps)
    }

    fn drive(
        &mut self,
        disturbance: &[f32],
        reference: Option<&[f32]>,
        steps: usize,
    ) -> Result<SimulationResult, SimulationError> {
        if disturbance.is_empty() {
            return Err(SimulationError::EmptyInput);
        }

        let mut n = steps.min(disturbance.len());
        let reference = if self.topology == Topology::ReferenceFul {
            let reference = reference.ok_or(SimulationError::MissingReference)?;
            if reference.is_empty() {
                return Err(SimulationError::EmptyReference);
            }
            n = n.min(reference.len());
            Some(reference)
        } else {
            None
        };

        info!(
            "Simulating {} steps with {} on the {} topology",
            n,
            self.controller.name(),
            self.topology.label()
        );

        let mut monitor = LivenessMonitor::new(self.monitor_settings);
        let mut samples = Vec::with_capacity(n);
        let mut safety_fault = None;

        for i in 0..n {
            let input = disturbance[i];
            let output = self.controller.input(input);

            // Safety check: the input stage must produce a finite
            // cancellation output.
            if !output.is_finite() {
                error!(
                    "Safety check failed at step {} for {}, stopping run",
                    i,
                    self.controller.name()
                );
                safety_fault = Some(i);
                break;
            }

            // The error microphone combines the disturbance with the
            // cancelling wave.
            let err = input + output;
            samples.push(err);

            let reference_sample = reference.map(|r| r[i]).unwrap_or(0.0);
            let metric = step_metric(
                self.topology,
                self.monitor_settings.metric_scale,
                input,
                err,
                reference_sample,
            );
            monitor.observe(i, metric);

            match self.topology {
                Topology::Filtered => {}
                Topology::ReferenceFul => self.controller.feed_forward(reference_sample),
                Topology::ReferenceLess => self.controller.feed_forward(err),
            }
        }

        let liveness = monitor.verdict();
        match liveness.satisfied_at {
            Some(step) => info!(
                "Liveness satisfied at step {} for {}",
                step,
                self.controller.name()
            ),
            None => info!("Liveness was NOT satisfied for {}", self.controller.name()),
        }

        let mse = reference.map(|r| {
            let mse = mean_squared_error(r, &samples);
            info!("MSE for {} was {}", self.controller.name(), mse);
            mse
        });

        Ok(SimulationResult {
            samples,
            liveness,
            mse,
            sample_rate: self.sample_rate,
            safety_fault,
        })
    }
}

/// Per-step liveness metric. Zero denominators fall back to 0 rather
/// than producing NaN or infinity.
fn step_metric(topology: Topology, scale: f32, input: f32, err: f32, reference: f32) -> f32 {
    match topology {
        Topology::Filtered | Topology::ReferenceLess => {
            if input != 0.0 { (err / input).abs() } else { 0.0 }
        }
        Topology::ReferenceFul => {
            if reference != 0.0 {
                let ratio = (1.0 - (err / reference).abs()).abs();
                if scale != 0.0 { ratio / scale } else { ratio }
            } else {
                0.0
            }
        }
    }
}

/// MSE between the reference stream and the collected error sequence,
/// over however many steps actually completed.
fn mean_squared_error(reference: &[f32], samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = reference
        .iter()
        .zip(samples)
        .map(|(r, s)| {
            let diff = (r - s) as f64;
            diff * diff
        })
        .sum();
    (sum / samples.len() as f64) as f32
}
