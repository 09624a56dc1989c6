use crate::animation::ease::Ease;
use crate::foundation::error::{ReelError, ReelResult};

/// Closed set of animation effects a directive can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DirectiveKind {
    /// Opacity 0 -> 1.
    Fade,
    /// Horizontal offset -100px -> 0 together with opacity 0 -> 1.
    Slide,
    /// Scale 0 -> 1 together with opacity 0 -> 1.
    Zoom,
    /// Rotation -180deg -> 0 together with opacity 0 -> 1.
    Rotate,
    /// Perspective flip rendered by the 3D compositing path.
    ThreeD,
}

impl DirectiveKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::Slide => "slide",
            Self::Zoom => "zoom",
            Self::Rotate => "rotate",
            Self::ThreeD => "three-d",
        }
    }
}

impl std::str::FromStr for DirectiveKind {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = s.trim().to_ascii_lowercase();
        if kind.is_empty() {
            return Err(ReelError::validation("animation kind must be non-empty"));
        }

        match kind.as_str() {
            "fade" | "fadein" | "fade-in" => Ok(Self::Fade),
            "slide" | "slidein" | "slide-in" => Ok(Self::Slide),
            "zoom" | "zoomin" | "zoom-in" | "scale" => Ok(Self::Zoom),
            "rotate" | "spin" => Ok(Self::Rotate),
            "three-d" | "threed" | "three_d" | "3d" => Ok(Self::ThreeD),
            _ => Err(ReelError::validation(format!(
                "unknown animation kind '{kind}'"
            ))),
        }
    }
}

impl TryFrom<String> for DirectiveKind {
    type Error = ReelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DirectiveKind> for String {
    fn from(value: DirectiveKind) -> Self {
        value.name().to_owned()
    }
}

fn default_duration() -> f64 {
    1.0
}

/// One declarative animation effect placed on the export timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationDirective {
    /// Which effect to animate.
    #[serde(rename = "type", alias = "kind")]
    pub kind: DirectiveKind,
    /// Tween length in seconds.
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Gap in seconds before the tween starts, measured from the end of the previous directive.
    #[serde(default)]
    pub delay: f64,
    /// Easing applied to the tween's local progress.
    #[serde(default)]
    pub ease: Ease,
}

impl AnimationDirective {
    pub fn new(kind: DirectiveKind) -> Self {
        Self {
            kind,
            duration: default_duration(),
            delay: 0.0,
            ease: Ease::default(),
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ReelError::validation(format!(
                "{} duration must be finite and >= 0",
                self.kind.name()
            )));
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(ReelError::validation(format!(
                "{} delay must be finite and >= 0",
                self.kind.name()
            )));
        }
        Ok(())
    }

    /// Parse the compact CLI form `kind[:duration[:delay[:ease]]]`, e.g. `slide:0.8:0.2:power2.out`.
    pub fn parse_compact(s: &str) -> ReelResult<Self> {
        let mut parts = s.split(':');
        let kind: DirectiveKind = parts.next().unwrap_or_default().parse()?;
        let mut directive = Self::new(kind);

        fn seconds(field: &str, v: &str) -> ReelResult<f64> {
            v.trim()
                .parse::<f64>()
                .map_err(|e| ReelError::validation(format!("invalid {field} '{v}': {e}")))
        }

        if let Some(v) = parts.next().filter(|v| !v.is_empty()) {
            directive.duration = seconds("duration", v)?;
        }
        if let Some(v) = parts.next().filter(|v| !v.is_empty()) {
            directive.delay = seconds("delay", v)?;
        }
        if let Some(v) = parts.next().filter(|v| !v.is_empty()) {
            directive.ease = v.parse()?;
        }
        if parts.next().is_some() {
            return Err(ReelError::validation(format!(
                "too many fields in animation '{s}'"
            )));
        }
        directive.validate()?;
        Ok(directive)
    }
}

/// Return `true` when any directive requests the 3D compositing path.
pub fn wants_three_d(directives: &[AnimationDirective]) -> bool {
    directives.iter().any(|d| d.kind == DirectiveKind::ThreeD)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/directive.rs"]
mod tests;
