pub mod error;
pub mod flatten;
pub mod geometry;
pub mod math;
pub mod offset;

pub use error::{AlineaError, Result};
