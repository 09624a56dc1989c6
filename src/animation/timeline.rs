//! Deterministic seeking of a composed animation timeline.
//!
//! Directives are laid out back to back in the order given: each one starts after the previous
//! directive's end plus its own delay. Seeking never plays in real time; the presentation for a
//! progress value is computed directly.
//!
//! When several directives animate the same property the latest one that has started wins. Before
//! any of them starts, the first one holds the property at its "from" value.

use crate::animation::directive::{AnimationDirective, DirectiveKind};
use crate::animation::ease::Ease;
use crate::foundation::core::{Affine, Vec2};

/// Horizontal offset a slide starts from, in output pixels.
pub const SLIDE_FROM_X: f64 = -100.0;
/// Rotation a rotate directive starts from, in degrees.
pub const ROTATE_FROM_DEG: f64 = -180.0;

const SNAP_EPS: f64 = 1e-9;

/// Visual properties the timeline animates on a staged element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Presentation {
    pub opacity: f64,
    pub offset_x: f64,
    pub scale: f64,
    pub rotation_deg: f64,
}

impl Presentation {
    /// Neutral state: fully opaque, untransformed.
    pub const BASELINE: Self = Self {
        opacity: 1.0,
        offset_x: 0.0,
        scale: 1.0,
        rotation_deg: 0.0,
    };

    /// Transform about `origin`, matching a `50% 50%` transform origin.
    pub fn to_affine(&self, origin: Vec2) -> Affine {
        Affine::translate(origin + Vec2::new(self.offset_x, 0.0))
            * Affine::rotate(self.rotation_deg.to_radians())
            * Affine::scale(self.scale)
            * Affine::translate(-origin)
    }

    pub fn is_invisible(&self) -> bool {
        self.opacity <= 0.0 || self.scale == 0.0
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::BASELINE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Property {
    Opacity,
    OffsetX,
    Scale,
    Rotation,
}

impl Property {
    fn baseline(self) -> f64 {
        match self {
            Self::Opacity => Presentation::BASELINE.opacity,
            Self::OffsetX => Presentation::BASELINE.offset_x,
            Self::Scale => Presentation::BASELINE.scale,
            Self::Rotation => Presentation::BASELINE.rotation_deg,
        }
    }

    fn write(self, p: &mut Presentation, v: f64) {
        match self {
            Self::Opacity => p.opacity = v,
            Self::OffsetX => p.offset_x = v,
            Self::Scale => p.scale = v,
            Self::Rotation => p.rotation_deg = v,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Tween {
    property: Property,
    start: f64,
    duration: f64,
    from: f64,
    to: f64,
    ease: Ease,
}

impl Tween {
    fn value_at(&self, position: f64) -> f64 {
        let local = if self.duration <= 0.0 || position >= self.start + self.duration - SNAP_EPS {
            1.0
        } else {
            (position - self.start) / self.duration
        };
        self.from + (self.to - self.from) * self.ease.apply(local)
    }
}

fn tracks(kind: DirectiveKind) -> &'static [(Property, f64, f64)] {
    match kind {
        DirectiveKind::Fade => &[(Property::Opacity, 0.0, 1.0)],
        DirectiveKind::Slide => &[
            (Property::OffsetX, SLIDE_FROM_X, 0.0),
            (Property::Opacity, 0.0, 1.0),
        ],
        DirectiveKind::Zoom => &[(Property::Scale, 0.0, 1.0), (Property::Opacity, 0.0, 1.0)],
        DirectiveKind::Rotate => &[
            (Property::Rotation, ROTATE_FROM_DEG, 0.0),
            (Property::Opacity, 0.0, 1.0),
        ],
        // Rendered by the 3D compositing path; occupies no time on this timeline.
        DirectiveKind::ThreeD => &[],
    }
}

/// A composed timeline built from an ordered directive list.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    tweens: Vec<Tween>,
    total: f64,
}

impl Timeline {
    pub fn compose(directives: &[AnimationDirective]) -> Self {
        let mut tweens = Vec::new();
        let mut cursor = 0.0f64;
        for d in directives {
            let props = tracks(d.kind);
            if props.is_empty() {
                continue;
            }
            let start = cursor + d.delay.max(0.0);
            let duration = d.duration.max(0.0);
            for &(property, from, to) in props {
                tweens.push(Tween {
                    property,
                    start,
                    duration,
                    from,
                    to,
                    ease: d.ease,
                });
            }
            cursor = start + duration;
        }
        Self {
            tweens,
            total: cursor,
        }
    }

    /// Length of the timeline in seconds.
    pub fn total_duration(&self) -> f64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Presentation at normalized `progress` in `[0, 1]`.
    pub fn seek(&self, progress: f64) -> Presentation {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let position = progress * self.total;

        let mut out = Presentation::BASELINE;
        for property in [
            Property::Opacity,
            Property::OffsetX,
            Property::Scale,
            Property::Rotation,
        ] {
            let mut first = None;
            let mut governing = None;
            for t in self.tweens.iter().filter(|t| t.property == property) {
                first.get_or_insert(t);
                if t.start <= position + SNAP_EPS {
                    governing = Some(t);
                }
            }
            let value = match (governing, first) {
                (Some(t), _) => t.value_at(position),
                (None, Some(t)) => t.from,
                (None, None) => property.baseline(),
            };
            property.write(&mut out, value);
        }
        out
    }
}

/// Reset `presentation` to the baseline, then place it at `progress` on the timeline composed
/// from `directives`.
pub fn apply_animation_state(
    presentation: &mut Presentation,
    progress: f64,
    directives: &[AnimationDirective],
) {
    *presentation = Presentation::BASELINE;
    let timeline = Timeline::compose(directives);
    if timeline.is_empty() {
        return;
    }
    *presentation = timeline.seek(progress);
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;
