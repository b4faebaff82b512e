//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. The [`Transform`] type holds position, rotation, and
//! scale for every drawable, plus a cached world matrix.
//!
//! ## World matrix
//!
//! The world matrix is composed as `T * Rx * Ry * Rz * S`: translate, then
//! rotate around X, Y and Z (in that order, angles in degrees), then scale.
//! Meshes are authored against this order, so it must not change.
//!
//! Setters never recompute the matrix. They only mark the transform dirty;
//! whoever consumes the matrix (a renderer, usually) checks [`Transform::is_dirty`]
//! and calls [`Transform::recalculate_world_matrix`] first.

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Position, rotation (degrees per axis), and scale with a lazily rebuilt
/// world matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    world: Mat4,
    dirty: bool,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
        world: Mat4::IDENTITY,
        dirty: false,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        let mut transform = Self::IDENTITY;
        transform.set_position(Vec3::new(x, y, z));
        transform
    }

    /// Create a transform at the given 2D position (z = 0).
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self::from_xyz(x, y, 0.0)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    /// Set the position on the XY plane (z = 0).
    pub fn set_position_xy(&mut self, x: f32, y: f32) {
        self.set_position(Vec3::new(x, y, 0.0));
    }

    /// Move by `offset` relative to the current position.
    pub fn translate(&mut self, offset: Vec3) {
        self.set_position(self.position + offset);
    }

    /// Set rotation in degrees around X, Y and Z.
    pub fn set_rotation(&mut self, degrees: Vec3) {
        self.rotation = degrees;
        self.dirty = true;
    }

    /// Set the in-plane rotation (degrees around Z). X and Y are reset to 0.
    pub fn set_rotation_z(&mut self, degrees: f32) {
        self.set_rotation(Vec3::new(0.0, 0.0, degrees));
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Set the scale on the XY plane (z = 1).
    pub fn set_scale_xy(&mut self, x: f32, y: f32) {
        self.set_scale(Vec3::new(x, y, 1.0));
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Rotation in degrees per axis.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Returns `true` if a setter ran since the last recalculation.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild the cached world matrix from position, rotation and scale.
    pub fn recalculate_world_matrix(&mut self) {
        self.world = Self::compose(self.position, self.rotation, self.scale);
        self.dirty = false;
    }

    /// The cached world matrix. Stale while [`is_dirty`](Self::is_dirty) is
    /// `true`.
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// Axis-aligned bounds `[position, position + scale]`.
    ///
    /// This assumes a mesh spanning `0..1` on each axis, which is what the
    /// built-in unit quad uses. Negative scales are normalized so that
    /// `min <= max` on every axis.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let far = self.position + self.scale;
        (self.position.min(far), self.position.max(far))
    }

    fn compose(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
        Mat4::from_translation(position)
            * Mat4::from_rotation_x(rotation.x.to_radians())
            * Mat4::from_rotation_y(rotation.y.to_radians())
            * Mat4::from_rotation_z(rotation.z.to_radians())
            * Mat4::from_scale(scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat_approx_eq(a: Mat4, b: Mat4) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < 0.001)
    }

    #[test]
    fn setters_mark_dirty() {
        let mut t = Transform::default();
        assert!(!t.is_dirty());

        t.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(t.is_dirty());
        t.recalculate_world_matrix();
        assert!(!t.is_dirty());

        t.set_rotation_z(45.0);
        assert!(t.is_dirty());
        t.recalculate_world_matrix();

        t.set_scale_xy(2.0, 2.0);
        assert!(t.is_dirty());
    }

    #[test]
    fn world_matrix_matches_trs_order() {
        let mut t = Transform::default();
        t.set_position(Vec3::new(10.0, -4.0, 2.0));
        t.set_rotation(Vec3::new(30.0, 60.0, 90.0));
        t.set_scale(Vec3::new(2.0, 3.0, 4.0));
        t.recalculate_world_matrix();

        let expected = Mat4::from_translation(Vec3::new(10.0, -4.0, 2.0))
            * Mat4::from_rotation_x(30f32.to_radians())
            * Mat4::from_rotation_y(60f32.to_radians())
            * Mat4::from_rotation_z(90f32.to_radians())
            * Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));

        assert!(
            mat_approx_eq(t.world_matrix(), expected),
            "world matrix should be T * Rx * Ry * Rz * S"
        );
    }

    #[test]
    fn only_last_setter_wins() {
        let mut t = Transform::default();
        t.set_position(Vec3::new(5.0, 5.0, 5.0));
        t.set_position_xy(1.0, 2.0);
        t.set_scale_xy(3.0, 3.0);
        t.recalculate_world_matrix();

        let p = t.world_matrix().transform_point3(Vec3::ONE);
        assert!((p.x - 4.0).abs() < 0.001);
        assert!((p.y - 5.0).abs() < 0.001);
        assert!((p.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn recalculate_is_idempotent() {
        let mut t = Transform::from_xy(3.0, 4.0);
        t.set_rotation(Vec3::new(10.0, 20.0, 30.0));
        t.recalculate_world_matrix();
        let first = t.world_matrix();
        t.recalculate_world_matrix();
        assert_eq!(first, t.world_matrix(), "second recalculation changed the matrix");
    }

    #[test]
    fn stale_until_recalculated() {
        let mut t = Transform::default();
        t.set_position_xy(100.0, 0.0);
        assert_eq!(t.world_matrix(), Mat4::IDENTITY);
        t.recalculate_world_matrix();
        assert!((t.world_matrix().w_axis.x - 100.0).abs() < 0.001);
    }

    #[test]
    fn bounds_handle_negative_scale() {
        let mut t = Transform::from_xy(10.0, 10.0);
        t.set_scale_xy(-4.0, 2.0);
        let (min, max) = t.bounds();
        assert_eq!(min, Vec3::new(6.0, 10.0, 0.0));
        assert_eq!(max, Vec3::new(10.0, 12.0, 1.0));
    }
}
