use serde::{Deserialize, Serialize};

use super::annotation::PointAnnotation;
use crate::coords::{OriginPoint, PageSize, adjust, points_to_mm};

/// One logged click.
///
/// Fields are private so adjusted coordinates can only ever come out of
/// [`ClickRecord::compute`]. Changing a point means building a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickRecord {
    page: u32,
    origin: OriginPoint,
    raw_x: f64,
    raw_y: f64,
    adjusted_x: f64,
    adjusted_y: f64,
    page_size: PageSize,
    annotation: PointAnnotation,
}

impl ClickRecord {
    pub fn compute(
        page: u32,
        origin: OriginPoint,
        raw_x: f64,
        raw_y: f64,
        page_size: PageSize,
        annotation: PointAnnotation,
    ) -> Self {
        let (adjusted_x, adjusted_y) =
            adjust(raw_x, raw_y, page_size.width, page_size.height, origin);
        Self {
            page,
            origin,
            raw_x,
            raw_y,
            adjusted_x,
            adjusted_y,
            page_size,
            annotation,
        }
    }

    /// Same point measured from a different corner
    pub fn with_origin(&self, origin: OriginPoint) -> Self {
        Self::compute(
            self.page,
            origin,
            self.raw_x,
            self.raw_y,
            self.page_size,
            self.annotation.clone(),
        )
    }

    /// Same point moved to a new raw position
    pub fn moved_to(&self, raw_x: f64, raw_y: f64, origin: OriginPoint) -> Self {
        Self::compute(
            self.page,
            origin,
            raw_x,
            raw_y,
            self.page_size,
            self.annotation.clone(),
        )
    }

    pub fn with_annotation(&self, annotation: PointAnnotation) -> Self {
        Self {
            annotation,
            ..self.clone()
        }
    }

    /// Page number exactly as the caller supplied it
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn origin(&self) -> OriginPoint {
        self.origin
    }

    pub fn raw(&self) -> (f64, f64) {
        (self.raw_x, self.raw_y)
    }

    pub fn adjusted(&self) -> (f64, f64) {
        (self.adjusted_x, self.adjusted_y)
    }

    /// Adjusted coordinates in millimetres
    pub fn adjusted_mm(&self) -> (f64, f64) {
        (points_to_mm(self.adjusted_x), points_to_mm(self.adjusted_y))
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn annotation(&self) -> &PointAnnotation {
        &self.annotation
    }
}
