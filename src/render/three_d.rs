//! Perspective "flip and recede" compositing.
//!
//! The flat frame is used as the texture of a plane that rotates about its vertical axis by
//! `PI * t` while moving along depth by `-2 * sin(PI * t)`. A fresh scene is built for every
//! frame; only output surfaces are pooled, and [`ThreeDCompositor::dispose`] drops them.

use std::f64::consts::PI;
use std::sync::{Mutex, MutexGuard};

use glam::{DMat4, DVec3};
use rayon::prelude::*;
use resvg::tiny_skia::Pixmap;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface_pool::{SurfacePool, SurfacePoolOpts};

/// Rotation of the plane about Y at normalized time `t`, in radians.
pub fn plane_rotation(t: f64) -> f64 {
    PI * t
}

/// Depth displacement of the plane at normalized time `t`.
///
/// Zero at both ends, most negative (farthest away) at `t = 0.5`.
pub fn plane_depth_offset(t: f64) -> f64 {
    -2.0 * (PI * t).sin()
}

/// Camera on the +Z axis looking at the origin.
#[derive(Clone, Copy, Debug)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_y_deg: f64,
    pub aspect: f64,
    pub position_z: f64,
}

impl PerspectiveCamera {
    pub const DEFAULT_FOV_DEG: f64 = 45.0;
    const NEAR: f64 = 0.1;
    const FAR: f64 = 100.0;

    /// Place the camera so that a plane of `plane_height` at depth 0 exactly fills the view.
    pub fn framing(aspect: f64, plane_height: f64) -> Self {
        let half_fov = (Self::DEFAULT_FOV_DEG.to_radians()) / 2.0;
        Self {
            fov_y_deg: Self::DEFAULT_FOV_DEG,
            aspect,
            position_z: (plane_height / 2.0) / half_fov.tan(),
        }
    }

    pub fn eye(&self) -> DVec3 {
        DVec3::new(0.0, 0.0, self.position_z)
    }

    pub fn view_projection(&self) -> DMat4 {
        let projection =
            DMat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, Self::NEAR, Self::FAR);
        projection * DMat4::look_at_rh(self.eye(), DVec3::ZERO, DVec3::Y)
    }
}

/// Textured rectangle in its local XY plane, centered on the Z axis.
#[derive(Clone, Copy, Debug)]
pub struct PlaneMesh {
    pub width: f64,
    pub height: f64,
    pub rotation_y: f64,
    pub position_z: f64,
}

impl PlaneMesh {
    /// Model transform: rotate about Y, then push along depth.
    pub fn to_world(&self) -> DMat4 {
        DMat4::from_translation(DVec3::new(0.0, 0.0, self.position_z))
            * DMat4::from_rotation_y(self.rotation_y)
    }

    fn to_local(&self) -> DMat4 {
        DMat4::from_rotation_y(-self.rotation_y)
            * DMat4::from_translation(DVec3::new(0.0, 0.0, -self.position_z))
    }
}

/// Camera and plane for one frame.
#[derive(Clone, Copy, Debug)]
pub struct Scene {
    pub camera: PerspectiveCamera,
    pub plane: PlaneMesh,
}

impl Scene {
    const PLANE_HEIGHT: f64 = 2.0;

    pub fn build(canvas: Canvas, normalized_time: f64) -> Self {
        let aspect = canvas.aspect();
        Self {
            camera: PerspectiveCamera::framing(aspect, Self::PLANE_HEIGHT),
            plane: PlaneMesh {
                width: Self::PLANE_HEIGHT * aspect,
                height: Self::PLANE_HEIGHT,
                rotation_y: plane_rotation(normalized_time),
                position_z: plane_depth_offset(normalized_time),
            },
        }
    }

    fn ray_caster(&self) -> RayCaster {
        let to_local = self.plane.to_local();
        RayCaster {
            origin: to_local.transform_point3(self.camera.eye()),
            eye: self.camera.eye(),
            ndc_to_world: self.camera.view_projection().inverse(),
            to_local,
            width: self.plane.width,
            height: self.plane.height,
        }
    }
}

/// Per-frame ray setup, shared by every pixel.
struct RayCaster {
    eye: DVec3,
    /// Camera position in plane space.
    origin: DVec3,
    ndc_to_world: DMat4,
    to_local: DMat4,
    width: f64,
    height: f64,
}

impl RayCaster {
    /// Texture coordinates hit by the ray through `(ndc_x, ndc_y)`, if any. Both faces are hit.
    fn hit_uv(&self, ndc_x: f64, ndc_y: f64) -> Option<(f64, f64)> {
        const EPS: f64 = 1e-9;
        let far = self
            .ndc_to_world
            .project_point3(DVec3::new(ndc_x, ndc_y, 1.0));
        let dir = self.to_local.transform_vector3((far - self.eye).normalize());

        if dir.z.abs() < EPS {
            return None;
        }
        let s = -self.origin.z / dir.z;
        if s <= EPS {
            return None;
        }

        let hit = self.origin + dir * s;
        let u = hit.x / self.width + 0.5;
        let v = 0.5 - hit.y / self.height;
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }
        Some((u, v))
    }
}

/// Renders flat frames onto the rotating plane.
pub struct ThreeDCompositor {
    pool: Mutex<SurfacePool>,
}

impl Default for ThreeDCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreeDCompositor {
    pub fn new() -> Self {
        Self {
            pool: Mutex::new(SurfacePool::new(SurfacePoolOpts::default())),
        }
    }

    fn pool(&self) -> MutexGuard<'_, SurfacePool> {
        self.pool.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Project `texture` (premultiplied RGBA8, same size as `canvas`) onto the plane at
    /// `normalized_time` and return the rendered surface over a transparent background.
    pub fn render_three_d_frame(
        &self,
        texture: &Pixmap,
        normalized_time: f64,
        canvas: Canvas,
    ) -> ReelResult<Pixmap> {
        if texture.width() == 0 || texture.height() == 0 {
            return Err(ReelError::validation("3d texture is empty"));
        }
        if !normalized_time.is_finite() {
            return Err(ReelError::validation("3d normalized time must be finite"));
        }

        let rays = Scene::build(canvas, normalized_time).ray_caster();
        let mut out = self.pool().borrow(canvas)?;

        let w = canvas.width as usize;
        let h = canvas.height as usize;
        let tex = Texture {
            data: texture.data(),
            width: texture.width() as usize,
            height: texture.height() as usize,
        };

        out.data_mut()
            .par_chunks_mut(w * 4)
            .enumerate()
            .for_each(|(py, row)| {
                let ndc_y = 1.0 - 2.0 * (py as f64 + 0.5) / h as f64;
                for (px, dst) in row.chunks_exact_mut(4).enumerate() {
                    let ndc_x = 2.0 * (px as f64 + 0.5) / w as f64 - 1.0;
                    if let Some((u, v)) = rays.hit_uv(ndc_x, ndc_y) {
                        dst.copy_from_slice(&tex.sample_bilinear(u, v));
                    }
                }
            });

        Ok(out)
    }

    /// Hand a surface produced by [`Self::render_three_d_frame`] back for reuse.
    pub fn recycle(&self, surface: Pixmap) {
        self.pool().release(surface);
    }

    /// Release every pooled surface. Called once an export completes.
    pub fn dispose(&self) {
        let mut pool = self.pool();
        let stats = pool.stats();
        pool.dispose();
        tracing::debug!(
            retained = stats.retained_surfaces,
            allocated = stats.alloc_surfaces,
            dropped = stats.dropped_on_release,
            "disposed 3d compositor surfaces"
        );
    }

    #[cfg(test)]
    pub(crate) fn retained_surfaces(&self) -> usize {
        self.pool().stats().retained_surfaces
    }
}

struct Texture<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl Texture<'_> {
    fn texel(&self, x: usize, y: usize) -> [f64; 4] {
        let i = (y * self.width + x) * 4;
        let p = &self.data[i..i + 4];
        [
            f64::from(p[0]),
            f64::from(p[1]),
            f64::from(p[2]),
            f64::from(p[3]),
        ]
    }

    /// Bilinear sample in premultiplied space; `u, v` in `[0, 1)`.
    fn sample_bilinear(&self, u: f64, v: f64) -> [u8; 4] {
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        let x = (u * self.width as f64 - 0.5).clamp(0.0, max_x);
        let y = (v * self.height as f64 - 0.5).clamp(0.0, max_y);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f64;
        let fy = y - y0 as f64;

        let a = self.texel(x0, y0);
        let b = self.texel(x1, y0);
        let c = self.texel(x0, y1);
        let d = self.texel(x1, y1);

        let mut out = [0u8; 4];
        for k in 0..4 {
            let top = a[k] + (b[k] - a[k]) * fx;
            let bottom = c[k] + (d[k] - c[k]) * fx;
            out[k] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/three_d.rs"]
mod tests;
