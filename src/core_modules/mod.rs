pub mod blob_detector;
pub mod color_features;
pub mod decision;
pub mod leaf_blob;
pub mod pixel;
pub mod pixel_grid;
pub mod utils;
pub mod verdict;
