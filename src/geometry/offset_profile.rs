use crate::error::{ArgumentError, Result};
use crate::math::TOLERANCE;

/// A sparse, strictly increasing mapping from length fraction (0..1) to a
/// lateral offset value.
///
/// Describes a laterally varying offset along a curve's length; keys 0.0
/// and 1.0 are mandatory. Offsets between keys are linearly interpolated.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetProfile {
    entries: Vec<(f64, f64)>,
}

impl OffsetProfile {
    /// Creates a profile from (fraction, offset) pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the fractions are not strictly increasing, fall
    /// outside [0, 1], or do not include both 0.0 and 1.0.
    pub fn new(entries: Vec<(f64, f64)>) -> Result<Self> {
        if entries.is_empty() || (entries[0].0).abs() > TOLERANCE {
            return Err(ArgumentError::MissingProfileKey { key: 0.0 }.into());
        }
        let last = entries[entries.len() - 1].0;
        if (last - 1.0).abs() > TOLERANCE {
            return Err(ArgumentError::MissingProfileKey { key: 1.0 }.into());
        }
        for pair in entries.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ArgumentError::Invalid(format!(
                    "profile fractions must be strictly increasing, got {} after {}",
                    pair[1].0, pair[0].0
                ))
                .into());
            }
        }
        Ok(Self { entries })
    }

    /// A constant offset over the whole length.
    #[must_use]
    pub fn constant(offset: f64) -> Self {
        Self {
            entries: vec![(0.0, offset), (1.0, offset)],
        }
    }

    /// A linearly varying offset from `start` to `end`.
    #[must_use]
    pub fn linear(start: f64, end: f64) -> Self {
        Self {
            entries: vec![(0.0, start), (1.0, end)],
        }
    }

    /// Returns the interpolated offset at `fraction`, clamped to [0, 1].
    #[must_use]
    pub fn at(&self, fraction: f64) -> f64 {
        let f = fraction.clamp(0.0, 1.0);
        let i = match self
            .entries
            .binary_search_by(|(k, _)| k.partial_cmp(&f).unwrap_or(std::cmp::Ordering::Less))
        {
            Ok(i) => return self.entries[i].1,
            Err(i) => i,
        };
        if i == 0 {
            return self.entries[0].1;
        }
        if i == self.entries.len() {
            return self.entries[i - 1].1;
        }
        // f lies strictly between entries[i-1] and entries[i].
        let (f0, o0) = self.entries[i - 1];
        let (f1, o1) = self.entries[i];
        o0 + (o1 - o0) * (f - f0) / (f1 - f0)
    }

    /// Returns the slope d(offset)/d(fraction) at `fraction` (the slope of
    /// the key interval containing it; right-continuous at keys).
    #[must_use]
    pub fn slope_at(&self, fraction: f64) -> f64 {
        let f = fraction.clamp(0.0, 1.0);
        let mut i = 1;
        while i < self.entries.len() - 1 && self.entries[i].0 <= f {
            i += 1;
        }
        let (f0, o0) = self.entries[i - 1];
        let (f1, o1) = self.entries[i];
        (o1 - o0) / (f1 - f0)
    }

    /// Returns the (fraction, offset) keys.
    #[must_use]
    pub fn entries(&self) -> &[(f64, f64)] {
        &self.entries
    }

    /// Returns the fraction keys strictly inside (0, 1).
    #[must_use]
    pub fn interior_fractions(&self) -> Vec<f64> {
        self.entries[1..self.entries.len() - 1]
            .iter()
            .map(|&(f, _)| f)
            .collect()
    }

    /// Returns true if every key has the same offset value.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        let first = self.entries[0].1;
        self.entries
            .iter()
            .all(|&(_, o)| (o - first).abs() < TOLERANCE)
    }
}
