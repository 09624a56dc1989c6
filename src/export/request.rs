use crate::animation::directive::{AnimationDirective, DirectiveKind};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};

pub const DEFAULT_DURATION_SECONDS: f64 = 3.0;
pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const DEFAULT_QUALITY: u32 = 23;
/// Highest constant rate factor libx264 accepts.
pub const MAX_QUALITY: u32 = 51;

/// Caller-facing export options. Every field is optional and falls back to its default.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(alias = "duration_seconds")]
    pub duration_seconds: Option<f64>,
    #[serde(alias = "frames_per_second", alias = "fps")]
    pub frames_per_second: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(alias = "qualityParameter")]
    pub quality: Option<u32>,
    #[serde(alias = "animationDirectives")]
    pub animations: Option<Vec<AnimationDirective>>,
}

impl ExportRequest {
    /// Fill every unset field of `self` from `base`.
    pub fn or(self, base: &ExportRequest) -> ExportRequest {
        ExportRequest {
            duration_seconds: self.duration_seconds.or(base.duration_seconds),
            frames_per_second: self.frames_per_second.or(base.frames_per_second),
            width: self.width.or(base.width),
            height: self.height.or(base.height),
            quality: self.quality.or(base.quality),
            animations: self.animations.or_else(|| base.animations.clone()),
        }
    }

    /// Apply defaults and validate.
    pub fn resolve(&self) -> ReelResult<ResolvedExportRequest> {
        let duration_seconds = self.duration_seconds.unwrap_or(DEFAULT_DURATION_SECONDS);
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(ReelError::validation(format!(
                "duration must be finite and > 0 (got {duration_seconds})"
            )));
        }

        let fps = Fps::new(self.frames_per_second.unwrap_or(DEFAULT_FPS))?;

        let canvas = Canvas {
            width: self.width.unwrap_or(DEFAULT_WIDTH),
            height: self.height.unwrap_or(DEFAULT_HEIGHT),
        };
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ReelError::validation("width/height must be non-zero"));
        }
        if !canvas.width.is_multiple_of(2) || !canvas.height.is_multiple_of(2) {
            return Err(ReelError::validation(format!(
                "width/height must be even for yuv420p output (got {}x{})",
                canvas.width, canvas.height
            )));
        }

        let quality = self.quality.unwrap_or(DEFAULT_QUALITY);
        if quality > MAX_QUALITY {
            return Err(ReelError::validation(format!(
                "quality must be in 0..={MAX_QUALITY} (got {quality})"
            )));
        }

        let animations = match &self.animations {
            Some(a) => a.clone(),
            None => vec![AnimationDirective::new(DirectiveKind::Fade)],
        };
        for a in &animations {
            a.validate()?;
        }

        let total_frames = fps.secs_to_frames_floor(duration_seconds);
        if total_frames == 0 {
            return Err(ReelError::validation(format!(
                "{duration_seconds}s at {} fps yields no frames",
                fps.0
            )));
        }
        if total_frames > FrameIndex::MAX_FRAMES {
            return Err(ReelError::validation(format!(
                "{duration_seconds}s at {} fps yields {total_frames} frames (max {})",
                fps.0,
                FrameIndex::MAX_FRAMES
            )));
        }

        Ok(ResolvedExportRequest {
            duration_seconds,
            fps,
            canvas,
            quality,
            animations,
            total_frames,
        })
    }
}

/// A validated export request with all defaults applied. Immutable for one export.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedExportRequest {
    pub duration_seconds: f64,
    pub fps: Fps,
    pub canvas: Canvas,
    pub quality: u32,
    pub animations: Vec<AnimationDirective>,
    /// `floor(duration_seconds × fps)`.
    pub total_frames: u64,
}

#[cfg(test)]
#[path = "../../tests/unit/export/request.rs"]
mod tests;
