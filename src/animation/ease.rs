use crate::foundation::error::ReelError;

/// Easing functions used to map normalized tween progress.
///
/// Parsed from GSAP-style names (`"power1.out"`, `"sine.inOut"`, `"none"`) and the CSS keywords
/// (`"ease-in"`, `"ease-out"`, `"ease-in-out"`, `"linear"`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    #[default]
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
    /// Sinusoidal ease-in.
    InSine,
    /// Sinusoidal ease-out.
    OutSine,
    /// Sinusoidal ease-in/out.
    InOutSine,
}

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            // Endpoints are pinned so that cos/sin rounding never leaks into seeks at 0 and 1.
            Self::InSine | Self::OutSine | Self::InOutSine if t == 0.0 || t == 1.0 => t,
            Self::InSine => 1.0 - (t * std::f64::consts::FRAC_PI_2).cos(),
            Self::OutSine => (t * std::f64::consts::FRAC_PI_2).sin(),
            Self::InOutSine => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
        }
    }

    /// Canonical GSAP-style name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "none",
            Self::InQuad => "power1.in",
            Self::OutQuad => "power1.out",
            Self::InOutQuad => "power1.inOut",
            Self::InCubic => "power2.in",
            Self::OutCubic => "power2.out",
            Self::InOutCubic => "power2.inOut",
            Self::InSine => "sine.in",
            Self::OutSine => "sine.out",
            Self::InOutSine => "sine.inOut",
        }
    }
}

impl std::str::FromStr for Ease {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('_', "");
        let ease = match name.as_str() {
            "none" | "linear" => Self::Linear,
            "power1.in" | "quad.in" | "inquad" => Self::InQuad,
            "" | "power1" | "power1.out" | "quad.out" | "outquad" | "ease-out" | "ease" => {
                Self::OutQuad
            }
            "power1.inout" | "quad.inout" | "inoutquad" | "ease-in-out" => Self::InOutQuad,
            "power2.in" | "cubic.in" | "incubic" | "ease-in" => Self::InCubic,
            "power2" | "power2.out" | "cubic.out" | "outcubic" => Self::OutCubic,
            "power2.inout" | "cubic.inout" | "inoutcubic" => Self::InOutCubic,
            "sine.in" | "insine" => Self::InSine,
            "sine" | "sine.out" | "outsine" => Self::OutSine,
            "sine.inout" | "inoutsine" => Self::InOutSine,
            other => {
                return Err(ReelError::validation(format!(
                    "unknown easing function '{other}'"
                )));
            }
        };
        Ok(ease)
    }
}

impl TryFrom<String> for Ease {
    type Error = ReelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(value: Ease) -> Self {
        value.name().to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
