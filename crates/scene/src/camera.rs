use foundation::math::{DoubleSingle, Mat4, Vec2, Vec3};

/// Camera state supplied by the hosting map engine.
///
/// Both values are read fresh on every `PrecisionCameraTransform::update`.
/// Implementations are only queried after the engine has computed a camera
/// (i.e. after its first render); calling earlier is a host bug.
pub trait CameraEngine {
    /// Camera center in world space, full double precision.
    fn world_position(&self) -> Vec3;

    /// Current view-projection (e.g. mercator) matrix.
    fn view_projection(&self) -> Mat4;
}

/// GPU uniform block for camera-relative rendering.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PrecisionUniforms {
    pub relative_eye_matrix: [[f32; 4]; 4],
    pub center_high: [f32; 2],
    pub center_low: [f32; 2],
}

/// Per-camera jitter-free transform.
///
/// The camera's X/Y center is split into `f32` high/low pairs. Geometry is
/// uploaded relative to `center_high`, and `relative_eye_matrix` translates
/// it back before applying the engine's view-projection, so only small
/// magnitudes pass through `f32` math. `center_low` goes to the shader as a
/// uniform for sub-`f32` correction: a vertex shader reconstructs
/// `high + low + center_low` before applying `relative_eye_matrix`.
///
/// Every update rebuilds all three fields from the engine's current state.
/// Nothing is patched incrementally, so no error accumulates across frames.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PrecisionCameraTransform {
    pub center_high: [f32; 2],
    pub center_low: [f32; 2],
    pub relative_eye_matrix: Mat4,
}

impl Default for PrecisionCameraTransform {
    fn default() -> Self {
        Self {
            center_high: [0.0; 2],
            center_low: [0.0; 2],
            relative_eye_matrix: Mat4::IDENTITY,
        }
    }
}

impl PrecisionCameraTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute from the engine. Call once per camera move.
    pub fn update(&mut self, engine: &impl CameraEngine) {
        self.update_with(engine.world_position(), engine.view_projection());
    }

    pub fn update_with(&mut self, position: Vec3, view_projection: Mat4) {
        let x = DoubleSingle::split(position.x);
        let y = DoubleSingle::split(position.y);

        self.center_high = [x.high, y.high];
        self.center_low = [x.low, y.low];
        self.relative_eye_matrix =
            view_projection.translate([x.high as f64, y.high as f64, 0.0]);
    }

    /// Encode a world-space X/Y position as `(high, low)` offsets from the
    /// current center, ready for the vertex and low-part vertex buffers.
    pub fn encode_vertex(&self, world: Vec2) -> ([f32; 2], [f32; 2]) {
        let x = DoubleSingle::split(world.x).relative_to(self.center_x());
        let y = DoubleSingle::split(world.y).relative_to(self.center_y());
        ([x.high, y.high], [x.low, y.low])
    }

    pub fn center_x(&self) -> DoubleSingle {
        DoubleSingle {
            high: self.center_high[0],
            low: self.center_low[0],
        }
    }

    pub fn center_y(&self) -> DoubleSingle {
        DoubleSingle {
            high: self.center_high[1],
            low: self.center_low[1],
        }
    }

    pub fn uniforms(&self) -> PrecisionUniforms {
        PrecisionUniforms {
            relative_eye_matrix: self.relative_eye_matrix.to_cols_array(),
            center_high: self.center_high,
            center_low: self.center_low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraEngine, PrecisionCameraTransform, PrecisionUniforms};
    use foundation::math::{Mat4, MercatorCoordinate, Vec2, Vec3};

    struct FixedEngine {
        position: Vec3,
        view_projection: Mat4,
    }

    impl CameraEngine for FixedEngine {
        fn world_position(&self) -> Vec3 {
            self.position
        }

        fn view_projection(&self) -> Mat4 {
            self.view_projection
        }
    }

    fn zoomed_view(scale: f32, offset: [f32; 2]) -> Mat4 {
        Mat4::from_cols([
            [scale, 0.0, 0.0, 0.0],
            [0.0, -scale, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [offset[0], offset[1], 0.0, 1.0],
        ])
    }

    #[test]
    fn center_halves_reconstruct_position() {
        let mut transform = PrecisionCameraTransform::new();
        let position = Vec3::new(12_345_678.987_654_3, -4_510_023.333_333_3, 500.0);
        transform.update_with(position, Mat4::IDENTITY);

        let x = transform.center_x().value();
        let y = transform.center_y().value();
        assert!((x - position.x).abs() <= position.x.abs() * 2f64.powi(-47));
        assert!((y - position.y).abs() <= position.y.abs() * 2f64.powi(-47));
    }

    #[test]
    fn relative_eye_translates_by_center_high_only() {
        let mut transform = PrecisionCameraTransform::new();
        transform.update_with(Vec3::new(1.0 / 3.0, 2.0 / 3.0, 0.0), Mat4::IDENTITY);

        let cols = transform.relative_eye_matrix.cols;
        assert_eq!(cols[3][0], transform.center_high[0]);
        assert_eq!(cols[3][1], transform.center_high[1]);
        assert_eq!(cols[3][2], 0.0);
        assert_eq!(cols[0], Mat4::IDENTITY.cols[0]);
    }

    #[test]
    fn relative_vertices_land_where_world_vertices_would() {
        // Zoomed far into Wuhan: tiny mercator deltas, large scale.
        let center = MercatorCoordinate::from_lng_lat(114.305_39, 30.593_1, 0.0);
        let scale = 4_194_304.0_f32;
        let view = zoomed_view(scale, [-(center.x as f32) * scale, center.y as f32 * scale]);

        let engine = FixedEngine {
            position: center.as_vec3(),
            view_projection: view,
        };
        let mut transform = PrecisionCameraTransform::new();
        transform.update(&engine);

        let corner = MercatorCoordinate::from_lng_lat(114.305_5, 30.593_2, 0.0);
        let (high, low) = transform.encode_vertex(Vec2::new(corner.x, corner.y));
        // What the vertex shader does: offset + residual + center residual.
        let local = [
            high[0] + low[0] + transform.center_low[0],
            high[1] + low[1] + transform.center_low[1],
            0.0,
        ];
        let clip = transform.relative_eye_matrix.transform_point(local);

        let expected_x = (corner.x - transform.center_high[0] as f64) * scale as f64;
        assert!((clip[0] as f64 - expected_x).abs() < 1e-3, "x {} vs {expected_x}", clip[0]);
        assert_eq!(clip[3], 1.0);
    }

    #[test]
    fn each_update_rebuilds_from_scratch() {
        let view_a = zoomed_view(2.0, [0.1, 0.2]);
        let view_b = zoomed_view(8.0, [-0.3, 0.4]);
        let pos_a = Vec3::new(0.123_456_789, 0.987_654_321, 0.0);
        let pos_b = Vec3::new(0.555_555_555_5, 0.444_444_444_4, 0.0);

        let mut moved = PrecisionCameraTransform::new();
        for _ in 0..3 {
            moved.update_with(pos_a, view_a);
            moved.update_with(pos_b, view_b);
        }

        let mut fresh = PrecisionCameraTransform::new();
        fresh.update_with(pos_b, view_b);
        assert_eq!(moved, fresh);
    }

    #[test]
    fn encode_vertex_at_center_is_zero() {
        let mut transform = PrecisionCameraTransform::new();
        let position = Vec3::new(0.817_264_513_917_4, 0.402_113_7, 0.0);
        transform.update_with(position, Mat4::IDENTITY);

        let (high, low) = transform.encode_vertex(position.xy());
        assert_eq!(high, [0.0, 0.0]);
        assert_eq!(low, [0.0, 0.0]);
    }

    #[test]
    fn uniforms_are_plain_bytes() {
        let mut transform = PrecisionCameraTransform::new();
        transform.update_with(Vec3::new(0.5, 0.25, 0.0), Mat4::IDENTITY);
        let uniforms = transform.uniforms();
        let bytes = bytemuck::bytes_of(&uniforms);
        assert_eq!(bytes.len(), std::mem::size_of::<PrecisionUniforms>());
        assert_eq!(bytes.len(), 80);
        assert_eq!(uniforms.center_high, [0.5, 0.25]);
    }
}
