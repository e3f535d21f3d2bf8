use crate::{
    effects::{blur::blur_surface, params::EffectParams, params::keys},
    foundation::{error::ReelResult, math::to_u8},
    render::surface::Surface,
};

/// CSS-style filter functions read from merged effect parameters.
///
/// Percent-valued settings use `100` as identity for `brightness`,
/// `contrast`, `saturation` and `opacity`, and `0` as identity for
/// `grayscale`, `sepia` and `invert`. `hue_rotate` is in degrees, `blur`
/// in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FilterSettings {
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub saturation: Option<f64>,
    pub hue_rotate: Option<f64>,
    pub grayscale: Option<f64>,
    pub sepia: Option<f64>,
    pub invert: Option<f64>,
    pub blur: Option<f64>,
    pub opacity: Option<f64>,
}

type Matrix = [[f32; 3]; 3];

#[derive(Clone, Copy, Debug)]
enum ColorOp {
    Linear { slope: f32, intercept: f32 },
    Matrix(Matrix),
    Invert(f32),
}

impl FilterSettings {
    pub fn from_params(params: &EffectParams) -> Self {
        Self {
            brightness: params.number(keys::BRIGHTNESS),
            contrast: params.number(keys::CONTRAST),
            saturation: params.number(keys::SATURATION),
            hue_rotate: params.number(keys::HUE_ROTATE),
            grayscale: params.number(keys::GRAYSCALE),
            sepia: params.number(keys::SEPIA),
            invert: params.number(keys::INVERT),
            blur: params.number(keys::BLUR),
            opacity: params.number(keys::OPACITY),
        }
    }

    /// Layer opacity in `[0, 1]`, applied by the compositor.
    pub fn opacity_factor(&self) -> f32 {
        self.opacity
            .map(|o| (o / 100.0).clamp(0.0, 1.0) as f32)
            .unwrap_or(1.0)
    }

    fn color_ops(&self) -> Vec<ColorOp> {
        let mut ops = Vec::new();
        if let Some(b) = self.brightness.filter(|&b| b != 100.0) {
            let slope = (b / 100.0).max(0.0) as f32;
            ops.push(ColorOp::Linear {
                slope,
                intercept: 0.0,
            });
        }
        if let Some(c) = self.contrast.filter(|&c| c != 100.0) {
            let slope = (c / 100.0).max(0.0) as f32;
            ops.push(ColorOp::Linear {
                slope,
                intercept: 0.5 - 0.5 * slope,
            });
        }
        if let Some(s) = self.saturation.filter(|&s| s != 100.0) {
            ops.push(ColorOp::Matrix(saturate_matrix((s / 100.0).max(0.0) as f32)));
        }
        if let Some(deg) = self.hue_rotate.filter(|&d| d % 360.0 != 0.0) {
            ops.push(ColorOp::Matrix(hue_rotate_matrix(deg.to_radians() as f32)));
        }
        if let Some(g) = self.grayscale.filter(|&g| g > 0.0) {
            ops.push(ColorOp::Matrix(grayscale_matrix(unit_amount(g))));
        }
        if let Some(s) = self.sepia.filter(|&s| s > 0.0) {
            ops.push(ColorOp::Matrix(sepia_matrix(unit_amount(s))));
        }
        if let Some(i) = self.invert.filter(|&i| i > 0.0) {
            ops.push(ColorOp::Invert(unit_amount(i)));
        }
        ops
    }

    /// Apply the color functions and blur to `layer`. Opacity is left to the
    /// compositor.
    pub fn apply(&self, layer: &mut Surface) -> ReelResult<()> {
        let ops = self.color_ops();
        if !ops.is_empty() {
            for px in layer.data_mut().chunks_exact_mut(4) {
                apply_color_ops(px, &ops);
            }
        }
        if let Some(sigma) = self.blur {
            blur_surface(layer, sigma)?;
        }
        Ok(())
    }
}

fn unit_amount(percent: f64) -> f32 {
    (percent / 100.0).clamp(0.0, 1.0) as f32
}

fn apply_color_ops(px: &mut [u8], ops: &[ColorOp]) {
    let a = px[3];
    if a == 0 {
        return;
    }
    let af = f32::from(a) / 255.0;
    let mut rgb = [
        f32::from(px[0]) / 255.0 / af,
        f32::from(px[1]) / 255.0 / af,
        f32::from(px[2]) / 255.0 / af,
    ];
    for op in ops {
        rgb = match *op {
            ColorOp::Linear { slope, intercept } => rgb.map(|c| c * slope + intercept),
            ColorOp::Matrix(m) => [
                m[0][0] * rgb[0] + m[0][1] * rgb[1] + m[0][2] * rgb[2],
                m[1][0] * rgb[0] + m[1][1] * rgb[1] + m[1][2] * rgb[2],
                m[2][0] * rgb[0] + m[2][1] * rgb[1] + m[2][2] * rgb[2],
            ],
            ColorOp::Invert(amount) => rgb.map(|c| amount * (1.0 - c) + (1.0 - amount) * c),
        };
        // Each CSS filter function clamps its own output.
        rgb = rgb.map(|c| c.clamp(0.0, 1.0));
    }
    for (dst, c) in px.iter_mut().zip(rgb) {
        *dst = to_u8(c * af * 255.0);
    }
}

fn saturate_matrix(s: f32) -> Matrix {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_rotate_matrix(rad: f32) -> Matrix {
    let (sin, cos) = rad.sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn grayscale_matrix(amount: f32) -> Matrix {
    let s = 1.0 - amount;
    [
        [0.2126 + 0.7874 * s, 0.7152 - 0.7152 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 + 0.2848 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 - 0.7152 * s, 0.0722 + 0.9278 * s],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix {
    let s = 1.0 - amount;
    [
        [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
        [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
        [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filter.rs"]
mod tests;
