//! Page corners that can serve as the (0, 0) point for adjusted coordinates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Corner of the page treated as the coordinate origin.
///
/// Display names match what the CSV files carry (`Top-Left`, ...). Parsing
/// is case-insensitive and also takes the two-letter short forms.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum OriginPoint {
    #[strum(to_string = "Top-Left", serialize = "tl", serialize = "top_left")]
    #[serde(rename = "Top-Left")]
    TopLeft,

    #[strum(to_string = "Top-Right", serialize = "tr", serialize = "top_right")]
    #[serde(rename = "Top-Right")]
    TopRight,

    #[strum(to_string = "Bottom-Left", serialize = "bl", serialize = "bottom_left")]
    #[serde(rename = "Bottom-Left")]
    #[default]
    BottomLeft,

    #[strum(to_string = "Bottom-Right", serialize = "br", serialize = "bottom_right")]
    #[serde(rename = "Bottom-Right")]
    BottomRight,
}

impl OriginPoint {
    /// Whether X is measured from the right edge.
    pub fn flips_x(self) -> bool {
        matches!(self, OriginPoint::TopRight | OriginPoint::BottomRight)
    }

    /// Whether Y is measured from the bottom edge.
    pub fn flips_y(self) -> bool {
        matches!(self, OriginPoint::BottomLeft | OriginPoint::BottomRight)
    }
}
