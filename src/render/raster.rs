use std::sync::Arc;

use image::ImageEncoder as _;
use resvg::tiny_skia::{Pixmap, PixmapPaint, Transform};

use crate::animation::directive::{AnimationDirective, wants_three_d};
use crate::animation::timeline::{Presentation, apply_animation_state};
use crate::foundation::core::{Affine, Canvas, FrameIndex, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::three_d::ThreeDCompositor;
use crate::scene::stage::StagedElement;

/// Everything needed to capture one frame. Created per frame and dropped after capture.
#[derive(Clone, Debug)]
pub struct FrameDescriptor {
    pub index: FrameIndex,
    /// `index / total_frames`, in `[0, 1)`.
    pub normalized_time: f64,
    pub source: Arc<StagedElement>,
    pub canvas: Canvas,
    pub animations: Arc<[AnimationDirective]>,
}

impl FrameDescriptor {
    pub fn new(
        index: FrameIndex,
        total_frames: u64,
        source: Arc<StagedElement>,
        animations: Arc<[AnimationDirective]>,
    ) -> Self {
        let normalized_time = if total_frames == 0 {
            0.0
        } else {
            index.0 as f64 / total_frames as f64
        };
        let canvas = source.canvas();
        Self {
            index,
            normalized_time,
            source,
            canvas,
            animations,
        }
    }
}

/// One captured still image, PNG encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedFrame {
    pub index: FrameIndex,
    pub png: Vec<u8>,
}

impl EncodedFrame {
    pub fn file_name(&self) -> String {
        self.index.file_name()
    }
}

/// Produces the still image for a frame descriptor.
///
/// Implementations are called from blocking worker threads, several at a time within a batch.
pub trait FrameCapture: Send + Sync {
    fn capture_frame(&self, descriptor: &FrameDescriptor) -> ReelResult<EncodedFrame>;

    /// Release graphics resources retained across frames. Called once per export, on every exit
    /// path.
    fn release(&self) {}
}

/// CPU rasterizer for SVG elements with the 3D compositing path built in.
#[derive(Default)]
pub struct SvgRasterizer {
    three_d: ThreeDCompositor,
}

impl SvgRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterize the staged element with `presentation` applied, as premultiplied RGBA8.
    pub fn rasterize(
        &self,
        source: &StagedElement,
        presentation: &Presentation,
    ) -> ReelResult<Pixmap> {
        let canvas = source.canvas();
        let mut out = Pixmap::new(canvas.width, canvas.height).ok_or_else(|| {
            ReelError::validation(format!(
                "cannot allocate {}x{} frame",
                canvas.width, canvas.height
            ))
        })?;
        if presentation.is_invisible() {
            return Ok(out);
        }

        let origin = Vec2::new(
            f64::from(canvas.width) / 2.0,
            f64::from(canvas.height) / 2.0,
        );
        let xform = to_skia(presentation.to_affine(origin) * source.fit());

        if presentation.opacity >= 1.0 {
            resvg::render(source.element().tree(), xform, &mut out.as_mut());
            return Ok(out);
        }

        let mut layer = Pixmap::new(canvas.width, canvas.height)
            .ok_or_else(|| ReelError::validation("cannot allocate opacity layer"))?;
        resvg::render(source.element().tree(), xform, &mut layer.as_mut());
        let paint = PixmapPaint {
            opacity: presentation.opacity.clamp(0.0, 1.0) as f32,
            ..PixmapPaint::default()
        };
        out.draw_pixmap(0, 0, layer.as_ref(), &paint, Transform::identity(), None);
        Ok(out)
    }

    fn capture(&self, d: &FrameDescriptor) -> ReelResult<Vec<u8>> {
        let mut presentation = Presentation::BASELINE;
        apply_animation_state(&mut presentation, d.normalized_time, &d.animations);

        let flat = self.rasterize(&d.source, &presentation)?;
        if !wants_three_d(&d.animations) {
            return encode_png(&flat);
        }

        let surface = self
            .three_d
            .render_three_d_frame(&flat, d.normalized_time, d.canvas)?;
        let png = encode_png(&surface);
        self.three_d.recycle(surface);
        png
    }
}

impl FrameCapture for SvgRasterizer {
    fn capture_frame(&self, d: &FrameDescriptor) -> ReelResult<EncodedFrame> {
        let png = self
            .capture(d)
            .map_err(|e| ReelError::capture(d.index.0, e.to_string()))?;
        if png.is_empty() {
            return Err(ReelError::capture(d.index.0, "rasterizer produced no image data"));
        }
        Ok(EncodedFrame {
            index: d.index,
            png,
        })
    }

    fn release(&self) {
        self.three_d.dispose();
    }
}

fn to_skia(a: Affine) -> Transform {
    let [sx, ky, kx, sy, tx, ty] = a.as_coeffs();
    Transform::from_row(
        sx as f32, ky as f32, kx as f32, sy as f32, tx as f32, ty as f32,
    )
}

/// Encode a premultiplied pixmap as a straight-alpha RGBA PNG, preserving transparency.
pub fn encode_png(pixmap: &Pixmap) -> ReelResult<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for p in pixmap.pixels() {
        let c = p.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(
            &rgba,
            pixmap.width(),
            pixmap.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ReelError::encode(format!("png encode failed: {e}")))?;
    Ok(png)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
