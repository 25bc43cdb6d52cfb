//! Descriptive metadata users attach to a picked point.
//!
//! None of this affects coordinates; it travels with the point so a form
//! filler downstream knows what to draw there.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Which section of the document a point belongs to.
///
/// `Linespace` points carry a line spacing in their raw Y rather than a
/// real position.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum DocumentPart {
    #[default]
    Heading,
    Body,
    Summary,
    Linespace,
}

/// Kind of value that will be placed at the point
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum DataType {
    #[default]
    Text,
    #[strum(to_string = "Numeric", serialize = "number")]
    Numeric,
    #[strum(to_string = "Numeric 2 digits", serialize = "numeric2", serialize = "number2")]
    #[serde(rename = "Numeric 2 digits")]
    Numeric2,
    Date,
    Image,
    Video,
    Audio,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
}

/// Name and layout hints for one point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointAnnotation {
    pub name: String,
    pub part: DocumentPart,
    pub data_type: DataType,
    pub alignment: Alignment,
}

impl PointAnnotation {
    /// Default annotation for the point at 1-based position `number`
    pub fn numbered(number: usize) -> Self {
        Self {
            name: format!("point_{}", number),
            part: DocumentPart::default(),
            data_type: DataType::default(),
            alignment: Alignment::default(),
        }
    }
}
