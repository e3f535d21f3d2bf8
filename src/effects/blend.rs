#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
/// How two values (parameters or pixels) combine.
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
}

impl BlendMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "source-over" => Some(Self::Normal),
            "multiply" => Some(Self::Multiply),
            "screen" => Some(Self::Screen),
            "overlay" => Some(Self::Overlay),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
        }
    }

    /// Blend two effect parameter values on the 0..100 percent scale.
    pub fn blend_param(self, base: f64, overlay: f64) -> f64 {
        match self {
            Self::Normal => overlay,
            Self::Multiply => base * overlay / 100.0,
            Self::Screen => 100.0 - (100.0 - base) * (100.0 - overlay) / 100.0,
            Self::Overlay => {
                if base < 50.0 {
                    2.0 * base * overlay / 100.0
                } else {
                    100.0 - 2.0 * (100.0 - base) * (100.0 - overlay) / 100.0
                }
            }
        }
    }

    /// Separable blend of unit-range channel values (backdrop `cb`, source `cs`).
    pub fn blend_channel(self, cb: f32, cs: f32) -> f32 {
        match self {
            Self::Normal => cs,
            Self::Multiply => cb * cs,
            Self::Screen => cb + cs - cb * cs,
            Self::Overlay => {
                if cb <= 0.5 {
                    2.0 * cb * cs
                } else {
                    1.0 - 2.0 * (1.0 - cb) * (1.0 - cs)
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blend.rs"]
mod tests;
