use thiserror::Error;

/// Top-level error type for the Alinea geometry kernel.
#[derive(Debug, Error)]
pub enum AlineaError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Numeric(#[from] NumericError),
}

/// Caller-supplied parameter outside its domain. Never retried.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("parameter {parameter} = {value} must be positive")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error("index {index} is out of range for {count} points")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("offset profile must contain fraction key {key}")]
    MissingProfileKey { key: f64 },

    #[error("invalid argument: {0}")]
    Invalid(String),
}

/// Structurally degenerate geometric input ("nothing to draw").
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("at least {needed} points are required, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    #[error("consecutive duplicate point at index {index}")]
    DuplicatePoint { index: usize },

    #[error("zero-length chord where a direction is required")]
    ZeroChord,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Internal numeric invariant failure. Fatal/unexpected, not a caller
/// mistake; the clothoid solver retries once under the alternate shape
/// hypothesis before surfacing this.
#[derive(Debug, Error)]
pub enum NumericError {
    #[error("{stage}: bracket endpoints have the same sign, no root exists")]
    NoBracket { stage: &'static str },

    #[error("{stage}: no convergence after {iterations} iterations")]
    NoConvergence {
        stage: &'static str,
        iterations: usize,
    },

    #[error("{stage}: required intersection could not be found")]
    NoIntersection { stage: &'static str },

    #[error("direction function is inconsistent with the point function")]
    InconsistentDirection,
}

/// Convenience type alias for results using [`AlineaError`].
pub type Result<T> = std::result::Result<T, AlineaError>;
