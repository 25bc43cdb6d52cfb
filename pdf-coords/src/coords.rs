//! Coordinate conventions and the transforms between them.
//!
//! Raw coordinates are what the renderer produces: PDF points with the
//! origin at the top-left corner and the Y axis pointing down. Everything a
//! user sees or exports is an adjusted coordinate, i.e. the same position
//! measured from whichever page corner they picked.

pub mod origin;
pub mod transform;

pub use origin::OriginPoint;
pub use transform::{PageSize, adjust, canvas_to_raw, points_to_mm, raw_to_canvas};
