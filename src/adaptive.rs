use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::window::HistoryWindow;

/// Common capability set of the adaptive algorithms: estimate the next
/// disturbance value from the history window, and fold a learning signal
/// back into the weights.
///
/// Implementations mutate only their own state. Weight-vector length is
/// fixed at construction and never changes.
pub trait AdaptiveFilter {
    /// Number of taps (weights).
    fn order(&self) -> usize;

    /// Current weight vector, oldest tap first.
    fn weights(&self) -> &[f32];

    /// Estimate of the disturbance: dot product of the weights with the
    /// history window, oldest-first.
    fn predict(&self, window: &HistoryWindow) -> f32;

    /// Update the weights in place toward `desired`, using the current
    /// history window as the input vector.
    fn adapt(&mut self, desired: f32, window: &HistoryWindow);
}

fn dot(weights: &[f32], window: &HistoryWindow) -> f32 {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| w * window.get(i))
        .sum()
}

fn random_weights(order: usize) -> Vec<f32> {
    let mut rng = rand::rng();
    (0..order).map(|_| rng.random_range(-0.5f32..0.5)).collect()
}

fn seeded_weights(order: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..order).map(|_| rng.random_range(-0.5f32..0.5)).collect()
}

/// Least mean squares filter.
///
/// The cheapest of the three algorithms, O(order) per step:
///
/// ```text
/// e = d - w·x
/// w += μ * e * x
/// ```
pub struct LmsFilter {
    weights: Vec<f32>,
    /// Step size (learning rate).
    mu: f32,
}

impl LmsFilter {
    /// Filter with randomly initialized weights.
    pub fn new(order: usize, mu: f32) -> Self {
        Self {
            weights: random_weights(order),
            mu,
        }
    }

    /// Filter with weights drawn from a seeded generator, for
    /// reproducible runs.
    pub fn seeded(order: usize, mu: f32, seed: u64) -> Self {
        Self {
            weights: seeded_weights(order, seed),
            mu,
        }
    }

    /// Filter with explicit initial weights.
    pub fn with_weights(mu: f32, weights: Vec<f32>) -> Self {
        Self { weights, mu }
    }
}

impl AdaptiveFilter for LmsFilter {
    fn order(&self) -> usize {
        self.weights.len()
    }

    fn weights(&self) -> &[f32] {
        &self.weights
    }

    fn predict(&self, window: &HistoryWindow) -> f32 {
        dot(&self.weights, window)
    }

    fn adapt(&mut self, desired: f32, window: &HistoryWindow) {
        let error = desired - dot(&self.weights, window);
        for (i, w) in self.weights.iter_mut().enumerate() {
            *w += self.mu * error * window.get(i);
        }
    }
}

/// Normalized least mean squares filter.
///
/// Same update rule as LMS, but the step size is divided by the window
/// power plus a small constant, which bounds the update when the input
/// is near silence and keeps loud passages from blowing the weights up.
pub struct NlmsFilter {
    weights: Vec<f32>,
    /// Step size scale.
    mu: f32,
    /// Added to the power term so the normalization never divides by zero.
    eps: f32,
}

impl NlmsFilter {
    const DEFAULT_EPS: f32 = 1.0;

    /// Filter with randomly initialized weights and the default
    /// regularization constant.
    pub fn new(order: usize, mu: f32) -> Self {
        Self::from_options(order, mu, Self::DEFAULT_EPS)
    }

    pub fn from_options(order: usize, mu: f32, eps: f32) -> Self {
        Self {
            weights: random_weights(order),
            mu,
            eps,
        }
    }

    /// Filter with weights drawn from a seeded generator.
    pub fn seeded(order: usize, mu: f32, seed: u64) -> Self {
        Self {
            weights: seeded_weights(order, seed),
            mu,
            eps: Self::DEFAULT_EPS,
        }
    }

    /// Filter with explicit initial weights.
    pub fn with_weights(mu: f32, weights: Vec<f32>) -> Self {
        Self {
            weights,
            mu,
            eps: Self::DEFAULT_EPS,
        }
    }
}

impl AdaptiveFilter for NlmsFilter {
    fn order(&self) -> usize {
        self.weights.len()
    }

    fn weights(&self) -> &[f32] {
        &self.weights
    }

    fn predict(&self, window: &HistoryWindow) -> f32 {
        dot(&self.weights, window)
    }

    fn adapt(&mut self, desired: f32, window: &HistoryWindow) {
        let error = desired - dot(&self.weights, window);

        let mut power = 0.0;
        for x in window.iter() {
            power += x * x;
        }

        let step = self.mu * error / (power + self.eps);
        for (i, w) in self.weights.iter_mut().enumerate() {
            *w += step * window.get(i);
        }
    }
}

/// Recursive least squares filter.
///
/// Tracks an order×order inverse correlation matrix P alongside the
/// weights, O(order²) per step:
///
/// ```text
/// k = P·x / (λ + xᵀPx)
/// w += k * e
/// P = (P - k·xᵀP) / λ
/// ```
///
/// λ is the forgetting factor; values below 1 discount old samples and
/// let the filter track a drifting disturbance path.
pub struct RlsFilter {
    weights: Vec<f32>,
    /// Inverse correlation matrix, row-major, order×order.
    p: Vec<f32>,
    /// Forgetting factor.
    lambda: f32,
}

impl RlsFilter {
    /// P starts as δ·I.
    const DEFAULT_DELTA: f32 = 10.0;

    /// Filter with randomly initialized weights and the default P
    /// initialization.
    pub fn new(order: usize, lambda: f32) -> Self {
        Self::from_options(order, lambda, Self::DEFAULT_DELTA)
    }

    pub fn from_options(order: usize, lambda: f32, delta: f32) -> Self {
        Self {
            weights: random_weights(order),
            p: Self::initial_p(order, delta),
            lambda,
        }
    }

    /// Filter with weights drawn from a seeded generator.
    pub fn seeded(order: usize, lambda: f32, seed: u64) -> Self {
        Self {
            weights: seeded_weights(order, seed),
            p: Self::initial_p(order, Self::DEFAULT_DELTA),
            lambda,
        }
    }

    /// Filter with explicit initial weights.
    pub fn with_weights(lambda: f32, weights: Vec<f32>) -> Self {
        let order = weights.len();
        Self {
            weights,
            p: Self::initial_p(order, Self::DEFAULT_DELTA),
            lambda,
        }
    }

    fn initial_p(order: usize, delta: f32) -> Vec<f32> {
        let mut p = vec![0.0; order * order];
        for i in 0..order {
            p[i * order + i] = delta;
        }
        p
    }
}

impl AdaptiveFilter for RlsFilter {
    fn order(&self) -> usize {
        self.weights.len()
    }

    fn weights(&self) -> &[f32] {
        &self.weights
    }

    fn predict(&self, window: &HistoryWindow) -> f32 {
        dot(&self.weights, window)
    }

    fn adapt(&mut self, desired: f32, window: &HistoryWindow) {
        let n = self.weights.len();
        let error = desired - dot(&self.weights, window);

        // px = P·x; with P symmetric this is also xᵀP.
        let mut px = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                px[i] += self.p[i * n + j] * window.get(j);
            }
        }

        let mut xpx = 0.0;
        for (j, pxj) in px.iter().enumerate() {
            xpx += window.get(j) * pxj;
        }

        let denom = self.lambda + xpx;
        let mut gain = vec![0.0; n];
        for i in 0..n {
            gain[i] = px[i] / denom;
        }

        for i in 0..n {
            self.weights[i] += gain[i] * error;
        }

        let inv_lambda = 1.0 / self.lambda;
        for i in 0..n {
            for j in 0..n {
                self.p[i * n + j] = inv_lambda * (self.p[i * n + j] - gain[i] * px[j]);
            }
        }
    }
}
