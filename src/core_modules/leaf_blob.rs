// THEORY:
// A `LeafBlob` is one 4-connected region of greenish pixels in a single image. It is a
// "dumb" data container that summarizes the region (area, bounding box, centroid) so
// the decision engine and diagnostics can talk about "the leaf" instead of thousands
// of mask bits.
//
// `ComponentLabelingResult` is the labeler's whole output. The decision engine only
// reads `largest_component_ratio`; the rest is there for logging and inspection.

use serde::Serialize;

/// A 2D coordinate on the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// A single connected region of masked pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafBlob {
    /// Discovery order within this image only. Depends on scan order, unlike the size.
    pub id: u64,
    /// Top-left and bottom-right corners, inclusive.
    pub bounding_box: (Point, Point),
    pub size_in_pixels: usize,
    /// Unweighted mean of the member coordinates.
    pub center_of_mass: (f64, f64),
}

impl LeafBlob {
    pub fn bounding_box_area(&self) -> usize {
        let (top_left, bottom_right) = self.bounding_box;
        (bottom_right.x - top_left.x + 1) as usize * (bottom_right.y - top_left.y + 1) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentLabelingResult {
    /// Pixels in the largest region divided by all pixels in the image.
    pub largest_component_ratio: f64,
    pub component_count: usize,
    pub largest: Option<LeafBlob>,
}

impl ComponentLabelingResult {
    pub fn empty() -> Self {
        Self {
            largest_component_ratio: 0.0,
            component_count: 0,
            largest: None,
        }
    }
}
