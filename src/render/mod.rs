//! Frame rasterization.
//!
//! Frames are rasterized on the CPU with `resvg` and PNG encoded. Frames that request the 3D
//! style are composited onto a perspective plane before encoding.

/// Frame descriptors, the capture seam, and the SVG rasterizer.
pub mod raster;
pub(crate) mod surface_pool;
/// Perspective flip compositing.
pub mod three_d;
