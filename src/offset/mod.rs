//! Offset-curve construction, in the continuous domain for Bézier curves
//! and in the discrete domain for polylines.

pub mod bezier_offset;
pub mod polyline_offset;

pub use polyline_offset::{offset_polyline, offset_polyline_varying};

/// Tolerances of the discrete offset constructor.
///
/// The defaults are hand-tuned values that work well for road-scale
/// geometry (meters); none of them is derived from first principles, so
/// they are configuration rather than constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetConfig {
    /// Slack on the required clearance when discarding generated points
    /// that ended up closer to the reference line than the offset.
    pub precision: f64,
    /// Sagitta bound for the straight micro-segments approximating the
    /// arc at a convex corner.
    pub circle_precision: f64,
    /// Minimum spacing between output points when blending two
    /// fixed-offset lines for a varying offset.
    pub min_spacing: f64,
    /// Reference vertices closer than `|offset| / prefilter_ratio` to
    /// their predecessor are dropped before offsetting.
    pub prefilter_ratio: f64,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            precision: 1e-5,
            circle_precision: 1e-3,
            min_spacing: 1e-3,
            prefilter_ratio: 10.0,
        }
    }
}
