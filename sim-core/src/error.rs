//! Error types.
//!
//! Only setup and estimation can fail. Per-step operations are total over
//! well-formed state; a broken state machine panics instead.

use thiserror::Error;

use crate::types::{FirmCoord, Price, WorkerId};

/// Hiring into a full firm. Callers treat this as a normal negative result.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum HireError {
    #[error("Firm {firm} is at capacity ({capacity})")]
    CapacityExceeded { firm: FirmCoord, capacity: u32 },
}

/// Errors from the difference-in-differences estimator.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum DidError {
    #[error("Invalid {label} window [{start}, {end}] for series of length {len}")]
    InvalidWindow {
        label: &'static str,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("Treated and control series differ in length: {treated} vs {control}")]
    LengthMismatch { treated: usize, control: usize },

    #[error("Unknown metric series '{0}'")]
    UnknownSeries(String),
}

/// Errors that stop a run before its first step.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Wage {wage} at {context} is negative or not finite")]
    NonPositiveWage { context: String, wage: Price },

    #[error("{context} {value} is not finite")]
    NonFiniteResource { context: String, value: f64 },

    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("Step count must be positive")]
    ZeroSteps,

    #[error("Shock step {step} is outside the run of {steps} steps")]
    ShockStepOutOfRange { step: u64, steps: u64 },

    #[error("Neighbor radius must be positive")]
    ZeroRadius,

    #[error("max_failed_attempts must be positive")]
    ZeroAttempts,

    #[error("Grid must have at least one cell, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },

    #[error("Cannot place {workers} workers into total capacity {capacity}")]
    InsufficientCapacity { workers: usize, capacity: u64 },

    #[error("Worker {worker:?} assignment is inconsistent with firm membership: {reason}")]
    InconsistentAssignment { worker: WorkerId, reason: String },

    #[error("Firm {firm} employs {employed} workers over capacity {capacity}")]
    OverCapacity {
        firm: FirmCoord,
        employed: usize,
        capacity: u32,
    },

    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
