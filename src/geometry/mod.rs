pub mod curve;
pub mod directed_point;
pub mod offset_profile;
pub mod polyline;

pub use curve::{BezierCubic, Clothoid, ContinuousCurve, Curve, Straight};
pub use directed_point::DirectedPoint;
pub use offset_profile::OffsetProfile;
pub use polyline::{Polyline, ProjectionFallback};
