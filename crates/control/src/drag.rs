//! Drag-to-angle mapping for circular input affordances: projects a
//! pointer position onto the control's plane and remaps the signed
//! angle into the control's value band.

use crate::circular::FULL_TURN;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalized(self) -> Self {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return Self::default();
        }
        Self::new(self.x / magnitude, self.y / magnitude, self.z / magnitude)
    }

    fn project_onto_plane(self, unit_normal: Self) -> Self {
        let along_normal = self.dot(unit_normal);
        Self::new(
            self.x - unit_normal.x * along_normal,
            self.y - unit_normal.y * along_normal,
            self.z - unit_normal.z * along_normal,
        )
    }
}

/// Signed angle in `(-180, 180]` between `reference` and `point`, both
/// projected onto the plane with the given normal. Degenerate inputs
/// (zero vectors, or vectors parallel to the normal) yield 0.
pub fn drag_angle(reference: Vec3, point: Vec3, normal: Vec3) -> f64 {
    let unit_normal = normal.normalized();
    let a = reference.project_onto_plane(unit_normal);
    let b = point.project_onto_plane(unit_normal);

    let sin = unit_normal.dot(a.cross(b));
    let cos = a.dot(b);
    if sin == 0.0 && cos == 0.0 {
        return 0.0;
    }

    sin.atan2(cos).to_degrees()
}

/// Value band `[min, max]` of a circular input control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleBand {
    pub min: f64,
    pub max: f64,
}

impl AngleBand {
    pub const FULL: Self = Self {
        min: 0.0,
        max: FULL_TURN,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Seam policy for raw drag angles: a negative angle is shifted by
    /// +360 first; if the shifted value sits inside the band it is
    /// used as-is, anything still outside is clamped to the band edge.
    /// So -10 maps to 350 in `[0, 360]` but to 300 in `[0, 300]`.
    pub fn remap(&self, raw: f64) -> f64 {
        let value = if raw < 0.0 { raw + FULL_TURN } else { raw };
        value.clamp(self.min, self.max)
    }
}
