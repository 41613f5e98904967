use counterwave::{
    Controller, HistoryWindow, LmsFilter, RlsFilter, SimulationRunner, Topology,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn seeded_lms_controller(seed: u64) -> Controller {
    Controller::assemble(
        "LMS",
        Box::new(LmsFilter::seeded(5, 0.1, seed)),
        HistoryWindow::new(5),
        true,
    )
    .unwrap()
}

fn seeded_rls_controller(seed: u64) -> Controller {
    Controller::assemble(
        "RLS",
        Box::new(RlsFilter::seeded(4, 0.9, seed)),
        HistoryWindow::new(4),
        true,
    )
    .unwrap()
}

fn noise(len: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.random_range(-amplitude..amplitude))
        .collect()
}

/// Constant-amplitude input through the filtered topology: the weights
/// never move, and every error sample is the input plus the static
/// filter's (inverted) prediction.
#[test]
fn filtered_run_leaves_seeded_lms_weights_untouched() {
    init_logs();

    let controller = seeded_lms_controller(42);
    let initial_weights: Vec<f32> = controller.weights().to_vec();

    let mut runner = SimulationRunner::new(Topology::Filtered, controller, 44_100);
    let disturbance = vec![0.5f32; 2000];
    let result = runner.run(&disturbance, 2000).unwrap();

    assert_eq!(result.samples.len(), 2000);
    assert_eq!(runner.controller().weights(), initial_weights.as_slice());

    // Shadow the loop with a plain shift-and-append window: each error
    // sample must equal input minus the static prediction.
    let mut shadow = vec![0.0f32; 5];
    for (step, &sample) in result.samples.iter().enumerate() {
        shadow.rotate_left(1);
        shadow[4] = disturbance[step];
        let prediction: f32 = initial_weights
            .iter()
            .zip(&shadow)
            .map(|(w, x)| w * x)
            .sum();
        let expected = disturbance[step] - prediction;
        assert!(
            (sample - expected).abs() < 1e-6,
            "step {step}: {sample} vs {expected}"
        );
    }
}

/// Filtered output is a pure function of initial weights and input: a
/// second run over the same stream reproduces the first exactly.
#[test]
fn filtered_output_is_independent_of_run_count() {
    init_logs();

    let mut runner = SimulationRunner::new(Topology::Filtered, seeded_lms_controller(7), 44_100);
    let disturbance = noise(3000, 1.0, 11);

    let first = runner.run(&disturbance, 3000).unwrap();
    let second = runner.run(&disturbance, 3000).unwrap();
    assert_eq!(first.samples, second.samples);
}

/// Reference-ful cancellation with zero independent noise: the
/// disturbance IS the reference, so a converged RLS controller drives
/// the error microphone toward silence and the MSE against the (small)
/// reference stays well under the bound.
#[test]
fn reference_ful_rls_converges_on_clean_reference() {
    init_logs();

    let reference = noise(50_000, 0.05, 21);
    let disturbance = reference.clone();

    let mut runner = SimulationRunner::new(Topology::ReferenceFul, seeded_rls_controller(3), 44_100);
    let result = runner
        .run_with_reference(&disturbance, &reference, 50_000)
        .unwrap();

    assert_eq!(result.samples.len(), 50_000);
    assert!(result.safety_fault.is_none());

    let mse = result.mse.expect("reference-ful run reports an MSE");
    assert!(mse < 0.01, "mse was {mse}");

    // Once converged, the residual is tiny compared to the reference.
    let tail_power: f32 = result.samples[40_000..]
        .iter()
        .map(|s| s * s)
        .sum::<f32>()
        / 10_000.0;
    assert!(tail_power < 1e-4, "tail power was {tail_power}");

    // The metric settles at |1 - 0| / 100 once the error is gone, far
    // below the 0.10 threshold.
    assert!(result.liveness.satisfied);
    assert!(result.liveness.satisfied_at.unwrap() >= 1000);
}

/// Learned weights carry across runs on an adapting topology; the
/// monitor does not.
#[test]
fn controller_reuse_carries_weights_forward() {
    init_logs();

    let mut runner =
        SimulationRunner::new(Topology::ReferenceLess, seeded_lms_controller(13), 44_100);
    let disturbance = noise(2000, 0.8, 17);

    let before: Vec<f32> = runner.controller().weights().to_vec();
    runner.run(&disturbance, 2000).unwrap();
    let after_first: Vec<f32> = runner.controller().weights().to_vec();
    assert_ne!(before, after_first);

    runner.run(&disturbance, 2000).unwrap();
    let after_second: Vec<f32> = runner.controller().weights().to_vec();
    assert_ne!(after_first, after_second);
}

/// Reference samples of exactly zero hit the metric fallback instead of
/// poisoning the run with NaN.
#[test]
fn zero_reference_samples_do_not_poison_the_run() {
    init_logs();

    let mut reference = noise(3000, 0.05, 31);
    for sample in reference.iter_mut().step_by(10) {
        *sample = 0.0;
    }
    let disturbance = reference.clone();

    let mut runner = SimulationRunner::new(Topology::ReferenceFul, seeded_rls_controller(5), 44_100);
    let result = runner
        .run_with_reference(&disturbance, &reference, 3000)
        .unwrap();

    assert!(result.safety_fault.is_none());
    assert!(result.samples.iter().all(|s| s.is_finite()));
    assert!(result.mse.unwrap().is_finite());
}

/// A mid-stream fault yields the partial sequence collected before it.
#[test]
fn safety_abort_returns_the_partial_sequence() {
    init_logs();

    let mut disturbance = noise(500, 0.5, 41);
    disturbance[300] = f32::NAN;

    let mut runner = SimulationRunner::new(Topology::ReferenceLess, Controller::lms(), 44_100);
    let result = runner.run(&disturbance, 500).unwrap();

    assert_eq!(result.safety_fault, Some(300));
    assert_eq!(result.samples.len(), 300);
    assert!(result.samples.iter().all(|s| s.is_finite()));
    assert!(!result.liveness.satisfied);
}
