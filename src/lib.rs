//! Active noise cancellation, simulated.
//!
//! An adaptive controller watches a disturbance stream and plays a
//! cancelling wave against it; the residual at a virtual error microphone
//! is what a listener would still hear. Three controller algorithms
//! (LMS, NLMS, RLS) can be wired into three feedback topologies:
//! filtered (no feedback), reference-ful (a clean reference stream is
//! fed back for learning) and reference-less (the error itself is fed
//! back). A liveness monitor decides whether cancellation stabilized.
//!
//! The crate is pure data-in/data-out: it consumes normalized `f32`
//! sample slices and produces the error-microphone sequence plus the
//! convergence verdict. Reading audio files, normalizing, plotting and
//! persisting are caller concerns.
//!
//! ```
//! use counterwave::{Controller, SimulationRunner, Topology};
//!
//! let disturbance = vec![0.2f32; 4000];
//! let mut runner = SimulationRunner::new(Topology::Filtered, Controller::lms(), 44_100);
//! let result = runner.run(&disturbance, 4000).unwrap();
//! assert_eq!(result.samples.len(), 4000);
//! println!("cancellation converged: {}", result.liveness.satisfied);
//! ```

mod adaptive;
mod controller;
mod error;
mod monitor;
mod simulation;
mod window;

pub use adaptive::{AdaptiveFilter, LmsFilter, NlmsFilter, RlsFilter};
pub use controller::Controller;
pub use error::SimulationError;
pub use monitor::{LivenessMonitor, LivenessVerdict, MonitorSettings, MonitorState};
pub use simulation::{SimulationResult, SimulationRunner, Topology};
pub use window::HistoryWindow;
