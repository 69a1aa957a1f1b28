//! Double-single precision.
//!
//! GPUs only do `f32` math, which cannot resolve small offsets at world-scale
//! magnitudes. A value is carried instead as a pair of `f32`s whose sum
//! reconstructs the original `f64`:
//! - `high`: the value rounded to `f32`
//! - `low`: the rounding residual, itself rounded to `f32`
//!
//! Geometry is then expressed relative to a `high` center so that only small
//! magnitudes reach the shader, and `low` is added back where needed.

/// CPU-authoritative precision type.
pub type HighPrecision = f64;

/// An `f64` split into a high/low `f32` pair.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct DoubleSingle {
    pub high: f32,
    pub low: f32,
}

impl DoubleSingle {
    pub fn split(value: HighPrecision) -> Self {
        let high = value as f32;
        let low = (value - high as f64) as f32;
        Self { high, low }
    }

    /// Reconstruct the value in `f64`.
    #[inline]
    pub fn value(self) -> HighPrecision {
        self.high as f64 + self.low as f64
    }

    /// Offset from `center`, component-wise on the high and low parts.
    ///
    /// Both differences stay in `f32`, which is what the vertex shader sees.
    #[inline]
    pub fn relative_to(self, center: Self) -> Self {
        Self {
            high: self.high - center.high,
            low: self.low - center.low,
        }
    }
}
