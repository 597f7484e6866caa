// src/motion/shaper.rs
//! Torque correction curve generation.
//!
//! A curve holds one unsigned byte per degree over `[-180, 180)`. Index 0 is
//! -180°, index 359 is +179°. Every shape except [`ShapingFunction::Constant`]
//! is evaluated with a dead zone of `±tolerance` around zero, rescaled from its
//! natural domain range onto `[-127, 128)` and shifted by +127.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of samples in a torque curve (one per degree).
pub const CURVE_LEN: usize = 360;

const TARGET_MIN: f64 = -127.0;
const TARGET_MAX: f64 = 128.0;
const BYTE_OFFSET: f64 = 127.0;

#[derive(Debug, Error, PartialEq)]
pub enum ShapingError {
    #[error("Unknown shaping function '{0}' (expected constant, linear, hyperbolic sine, cubic or hyperbolic sine + cubic, or codes 0-4)")]
    UnknownFunction(String),
    #[error("Constant value {0} does not fit in a byte (0-255)")]
    ConstantOutOfRange(i64),
}

/// Shaping function used to build the torque correction curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ShapingSelector", into = "String")]
pub enum ShapingFunction {
    Constant,
    Linear,
    Sinh,
    Cubic,
    SinhPlusCubic,
}

impl ShapingFunction {
    pub const ALL: [ShapingFunction; 5] = [
        ShapingFunction::Constant,
        ShapingFunction::Linear,
        ShapingFunction::Sinh,
        ShapingFunction::Cubic,
        ShapingFunction::SinhPlusCubic,
    ];

    /// Numeric selector as used by the device tooling (0 = constant ... 4 = sinh + cubic).
    pub fn from_code(code: i64) -> Result<Self, ShapingError> {
        match code {
            0 => Ok(ShapingFunction::Constant),
            1 => Ok(ShapingFunction::Linear),
            2 => Ok(ShapingFunction::Sinh),
            3 => Ok(ShapingFunction::Cubic),
            4 => Ok(ShapingFunction::SinhPlusCubic),
            other => Err(ShapingError::UnknownFunction(other.to_string())),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ShapingFunction::Constant => 0,
            ShapingFunction::Linear => 1,
            ShapingFunction::Sinh => 2,
            ShapingFunction::Cubic => 3,
            ShapingFunction::SinhPlusCubic => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapingFunction::Constant => "constant",
            ShapingFunction::Linear => "linear",
            ShapingFunction::Sinh => "hyperbolic sine",
            ShapingFunction::Cubic => "cubic",
            ShapingFunction::SinhPlusCubic => "hyperbolic sine + cubic",
        }
    }

    /// Shape value before negation and rescaling.
    fn shape(self, x: f64) -> f64 {
        match self {
            ShapingFunction::Constant => 0.0,
            ShapingFunction::Linear => x,
            ShapingFunction::Sinh => x.sinh(),
            ShapingFunction::Cubic => x.powi(3),
            ShapingFunction::SinhPlusCubic => x.sinh() + x.powi(3),
        }
    }

    /// Natural range of the shape over `[-π, π]`.
    fn domain(self) -> (f64, f64) {
        match self {
            ShapingFunction::Constant => (0.0, 0.0),
            ShapingFunction::Linear => (-PI, PI),
            ShapingFunction::Sinh => ((-PI).sinh(), PI.sinh()),
            ShapingFunction::Cubic => ((-PI).powi(3), PI.powi(3)),
            ShapingFunction::SinhPlusCubic => (
                (-PI).sinh() + (-PI).powi(3),
                PI.sinh() + PI.powi(3),
            ),
        }
    }
}

impl fmt::Display for ShapingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapingFunction {
    type Err = ShapingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if let Ok(code) = key.parse::<i64>() {
            return Self::from_code(code);
        }
        match key.as_str() {
            "constant" | "const" => Ok(ShapingFunction::Constant),
            "linear" => Ok(ShapingFunction::Linear),
            "hyperbolic sine" | "sinh" => Ok(ShapingFunction::Sinh),
            "cubic" => Ok(ShapingFunction::Cubic),
            "hyperbolic sine + cubic" | "sinh+cubic" | "sinh-cubic" => {
                Ok(ShapingFunction::SinhPlusCubic)
            }
            _ => Err(ShapingError::UnknownFunction(s.to_string())),
        }
    }
}

/// Either a name or a numeric code, as accepted from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ShapingSelector {
    Code(i64),
    Name(String),
}

impl TryFrom<ShapingSelector> for ShapingFunction {
    type Error = ShapingError;

    fn try_from(value: ShapingSelector) -> Result<Self, Self::Error> {
        match value {
            ShapingSelector::Code(code) => ShapingFunction::from_code(code),
            ShapingSelector::Name(name) => name.parse(),
        }
    }
}

impl From<ShapingFunction> for String {
    fn from(value: ShapingFunction) -> Self {
        value.name().to_string()
    }
}

/// Per-degree torque correction values.
///
/// Never mutated after generation; the frame encoder rotates private copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorqueCurve {
    samples: [u8; CURVE_LEN],
}

impl TorqueCurve {
    pub fn from_samples(samples: [u8; CURVE_LEN]) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[u8; CURVE_LEN] {
        &self.samples
    }

    /// Value at an angle in `[-180, 180)`.
    pub fn at_degree(&self, degree: i32) -> Option<u8> {
        let index = usize::try_from(degree.checked_add(180)?).ok()?;
        self.samples.get(index).copied()
    }

    /// `(degree, value)` pairs in curve order, for display.
    pub fn points(&self) -> impl Iterator<Item = (i32, u8)> + '_ {
        self.samples
            .iter()
            .enumerate()
            .map(|(index, &value)| (index as i32 - 180, value))
    }
}

/// Build the torque curve for `function`.
///
/// `const_value` is only used by [`ShapingFunction::Constant`] and
/// `tolerance_deg` is ignored by it.
pub fn generate(
    function: ShapingFunction,
    tolerance_deg: u16,
    const_value: i64,
) -> Result<TorqueCurve, ShapingError> {
    if function == ShapingFunction::Constant {
        let value =
            u8::try_from(const_value).map_err(|_| ShapingError::ConstantOutOfRange(const_value))?;
        return Ok(TorqueCurve::from_samples([value; CURVE_LEN]));
    }

    let tolerance = i32::from(tolerance_deg);
    let tolerance_rad = f64::from(tolerance) * PI / 180.0;
    let (r_min, r_max) = function.domain();

    let mut samples = [0u8; CURVE_LEN];
    for (slot, degree) in samples.iter_mut().zip(-180i32..180) {
        let angle = f64::from(degree) * PI / 180.0;
        let m = if degree < -tolerance {
            -function.shape(angle + tolerance_rad)
        } else if degree < tolerance {
            0.0
        } else {
            -function.shape(angle - tolerance_rad)
        };
        *slot = rescale(m, r_min, r_max);
    }

    Ok(TorqueCurve::from_samples(samples))
}

/// Map `m` from `[r_min, r_max]` onto a byte. Ties round to even.
fn rescale(m: f64, r_min: f64, r_max: f64) -> u8 {
    let scaled = ((m - r_min) / (r_max - r_min)) * (TARGET_MAX - TARGET_MIN) + TARGET_MIN;
    (scaled.round_ties_even() + BYTE_OFFSET).clamp(0.0, 255.0) as u8
}
