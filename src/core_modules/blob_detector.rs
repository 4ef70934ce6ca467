// THEORY:
// The `BlobDetector` is the Component Labeler. It answers one question about the green
// mask: how much of the image does the single largest connected green region cover?
// A real leaf photo has one dominant region. Scattered foliage, texture noise or an
// illustration's speckles do not.
//
// Algorithm:
// 1.  **Scan**: Visit pixels in row-major order. Every masked pixel not yet visited
//     seeds a new region.
// 2.  **Grow**: Flood-fill the region over 4-connected neighbours (up, down, left,
//     right; never diagonals) with an explicit stack and a flat `visited` buffer. The
//     host stack stays O(1) however large the region is.
// 3.  **Aggregate**: While growing, track area, bounding box and coordinate sums, and
//     keep the biggest `LeafBlob` seen so far.
//
// Time is O(pixels) and space is O(pixels) for `visited` plus the frontier. Region
// sizes do not depend on fill order, so `largest_component_ratio` is deterministic.
// Blob ids do depend on it.
//
// Like the rest of the pipeline, the detector is a stateless utility.

use crate::core_modules::leaf_blob::{ComponentLabelingResult, LeafBlob, Point};

pub mod blob_detector {
    use super::*;

    /// Labels 4-connected regions of `mask` and reports the largest.
    pub fn find_largest_component(
        mask: &[bool],
        width: u32,
        height: u32,
    ) -> ComponentLabelingResult {
        let total = width as usize * height as usize;
        assert_eq!(mask.len(), total, "mask does not match {}x{} grid", width, height);
        if total == 0 {
            return ComponentLabelingResult::empty();
        }

        let mut visited = vec![false; total];
        let mut stack: Vec<usize> = Vec::new();
        let mut largest: Option<LeafBlob> = None;
        let mut component_count = 0usize;

        for seed in 0..total {
            if !mask[seed] || visited[seed] {
                continue;
            }

            let blob_id = component_count as u64;
            let blob = grow_blob_from_seed(seed, mask, &mut visited, &mut stack, width, blob_id);
            component_count += 1;

            let is_larger = largest
                .as_ref()
                .is_none_or(|current| blob.size_in_pixels > current.size_in_pixels);
            if is_larger {
                largest = Some(blob);
            }
        }

        let largest_size = largest.as_ref().map_or(0, |blob| blob.size_in_pixels);
        ComponentLabelingResult {
            largest_component_ratio: largest_size as f64 / total as f64,
            component_count,
            largest,
        }
    }

    /// Depth-first fill from `seed`. `stack` is reused between regions to avoid
    /// reallocating the frontier.
    fn grow_blob_from_seed(
        seed: usize,
        mask: &[bool],
        visited: &mut [bool],
        stack: &mut Vec<usize>,
        width: u32,
        blob_id: u64,
    ) -> LeafBlob {
        let width = width as usize;
        let height = mask.len() / width;

        let mut size = 0usize;
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        let mut sum_x = 0.0f64;
        let mut sum_y = 0.0f64;

        stack.clear();
        stack.push(seed);
        visited[seed] = true;

        while let Some(current) = stack.pop() {
            let x = current % width;
            let y = current / width;

            size += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            sum_x += x as f64;
            sum_y += y as f64;

            // Check all 4 direct neighbors (not diagonals).
            let neighbours = [
                (x > 0).then(|| current - 1),
                (x + 1 < width).then(|| current + 1),
                (y > 0).then(|| current - width),
                (y + 1 < height).then(|| current + width),
            ];
            for next in neighbours.into_iter().flatten() {
                if mask[next] && !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        LeafBlob {
            id: blob_id,
            bounding_box: (
                Point {
                    x: min_x as u32,
                    y: min_y as u32,
                },
                Point {
                    x: max_x as u32,
                    y: max_y as u32,
                },
            ),
            size_in_pixels: size,
            center_of_mass: (sum_x / size as f64, sum_y / size as f64),
        }
    }
}
