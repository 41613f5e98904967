use thiserror::Error;

/// Configuration failures surfaced to callers.
///
/// These are the only conditions the crate reports as errors. Degenerate
/// arithmetic in the liveness metrics is resolved at the point of
/// computation with the documented fallback values, and adaptation
/// requested before any input is silently ignored by the controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("disturbance stream is empty")]
    EmptyInput,

    #[error("reference-ful topology requires a reference stream")]
    MissingReference,

    #[error("reference stream is empty")]
    EmptyReference,

    #[error("filter order {filter} does not match history window capacity {window}")]
    OrderMismatch { filter: usize, window: usize },

    #[error("filter order must be at least 1")]
    ZeroOrder,
}
