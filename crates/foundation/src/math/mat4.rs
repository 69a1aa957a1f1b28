/// Column-major 4x4 `f32` matrix, matching the WGSL/GLSL uniform layout.
///
/// `cols[c][r]` is the element at row `r` of column `c`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    pub fn to_cols_array(self) -> [[f32; 4]; 4] {
        self.cols
    }

    /// Returns `self * T(v)`.
    ///
    /// Only the fourth column changes. It is accumulated in `f64` and rounded
    /// once, so the offset carries no more error than a single `f32` store.
    pub fn translate(&self, v: [f64; 3]) -> Self {
        let a = &self.cols;
        let mut out = *self;
        for row in 0..4 {
            out.cols[3][row] = (a[0][row] as f64 * v[0]
                + a[1][row] as f64 * v[1]
                + a[2][row] as f64 * v[2]
                + a[3][row] as f64) as f32;
        }
        out
    }

    /// Transform a point (w = 1) into homogeneous clip space.
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 4] {
        let m = &self.cols;
        let mut out = [0.0f32; 4];
        for (row, o) in out.iter_mut().enumerate() {
            *o = m[0][row] * p[0] + m[1][row] * p[1] + m[2][row] * p[2] + m[3][row];
        }
        out
    }
}
