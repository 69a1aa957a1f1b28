use super::Vec3;

/// Mean Earth radius used by Web Mercator map engines (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;
/// Equatorial circumference for `EARTH_RADIUS_M` (meters).
pub const EARTH_CIRCUMFERENCE_M: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS_M;

/// Normalized Web Mercator coordinate.
///
/// `x` and `y` span `[0, 1]` across the whole world (origin at the north-west
/// corner); `z` is altitude in mercator units at the coordinate's latitude.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct MercatorCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MercatorCoordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_lng_lat(lng_deg: f64, lat_deg: f64, altitude_m: f64) -> Self {
        Self {
            x: mercator_x_from_lng(lng_deg),
            y: mercator_y_from_lat(lat_deg),
            z: altitude_m / circumference_at_latitude(lat_deg),
        }
    }

    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

pub fn mercator_x_from_lng(lng_deg: f64) -> f64 {
    (180.0 + lng_deg) / 360.0
}

pub fn mercator_y_from_lat(lat_deg: f64) -> f64 {
    let pi = std::f64::consts::PI;
    (180.0 - (180.0 / pi) * (pi / 4.0 + lat_deg * pi / 360.0).tan().ln()) / 360.0
}

fn circumference_at_latitude(lat_deg: f64) -> f64 {
    EARTH_CIRCUMFERENCE_M * lat_deg.to_radians().cos()
}
