use crate::adaptive::{AdaptiveFilter, LmsFilter, NlmsFilter, RlsFilter};
use crate::error::SimulationError;
use crate::window::HistoryWindow;

/// Produces a cancellation output from each disturbance sample and learns
/// from whatever signal the topology feeds back.
///
/// The controller owns one adaptive filter and the history window it
/// predicts from. `input` records the sample and answers with the filter
/// estimate under the algorithm's output polarity; `feed_forward` adapts
/// the filter against the current window, gated on a prior `input` call.
pub struct Controller {
    name: String,
    filter: Box<dyn AdaptiveFilter>,
    window: HistoryWindow,
    previous_input: Option<f32>,
    /// LMS and RLS emit the inverted prediction as the cancelling wave;
    /// NLMS emits the raw prediction.
    invert_output: bool,
}

impl Controller {
    /// LMS controller: order 5, step size 0.1, inverted output.
    pub fn lms() -> Self {
        Self::matched("LMS", Box::new(LmsFilter::new(5, 0.1)), true)
    }

    /// NLMS controller: order 10, step size 0.05, raw output.
    pub fn nlms() -> Self {
        Self::matched("NLMS", Box::new(NlmsFilter::new(10, 0.05)), false)
    }

    /// RLS controller: order 4, forgetting factor 0.9, inverted output.
    pub fn rls() -> Self {
        Self::matched("RLS", Box::new(RlsFilter::new(4, 0.9)), true)
    }

    /// Build a controller from explicit parts, validating that the window
    /// capacity matches the filter order.
    pub fn assemble(
        name: impl Into<String>,
        filter: Box<dyn AdaptiveFilter>,
        window: HistoryWindow,
        invert_output: bool,
    ) -> Result<Self, SimulationError> {
        if filter.order() == 0 {
            return Err(SimulationError::ZeroOrder);
        }
        if filter.order() != window.len() {
            return Err(SimulationError::OrderMismatch {
                filter: filter.order(),
                window: window.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            filter,
            window,
            previous_input: None,
            invert_output,
        })
    }

    fn matched(name: &str, filter: Box<dyn AdaptiveFilter>, invert_output: bool) -> Self {
        let window = HistoryWindow::new(filter.order());
        Self {
            name: name.into(),
            filter,
            window,
            previous_input: None,
            invert_output,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn window(&self) -> &HistoryWindow {
        &self.window
    }

    pub fn weights(&self) -> &[f32] {
        self.filter.weights()
    }

    /// Record a disturbance sample and answer with the cancellation
    /// output for this step.
    pub fn input(&mut self, sample: f32) -> f32 {
        self.previous_input = Some(sample);
        self.window.push(sample);
        let prediction = self.filter.predict(&self.window);
        if self.invert_output { -prediction } else { prediction }
    }

    /// Adapt the filter toward the learning signal the topology fed back.
    ///
    /// Consumes the recorded previous input; without one (no `input` call
    /// since the last adaptation) this is a silent no-op.
    pub fn feed_forward(&mut self, signal: f32) {
        if self.previous_input.take().is_some() {
            self.filter.adapt(signal, &self.window);
        }
    }
}
