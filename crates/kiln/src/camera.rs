//! # Camera — view and projection matrices
//!
//! A [`Camera`] is a look-at view (`position`, `target`, `up`) plus either a
//! perspective or an orthographic projection.
//!
//! The view matrix is cached behind a dirty flag: moving the camera only marks
//! it dirty, and the renderer rebuilds it once per frame with
//! [`Camera::calculate_view_matrix`]. Projections are computed immediately
//! when set.
//!
//! ## Culling
//!
//! Frustum culling is orthographic only. In orthographic mode
//! [`Camera::frustum`] returns the ortho bounds shifted by the camera
//! position, which is the visible world region as long as the camera looks
//! down `-Z` (the default target). A perspective camera has no frustum and
//! renderers skip culling for it.

use crate::math::{Mat4, Vec3};

/// Default vertical field of view, in degrees.
pub const DEFAULT_FOV_DEGREES: f32 = 45.0;
pub const DEFAULT_PERSPECTIVE_NEAR: f32 = 0.1;
pub const DEFAULT_PERSPECTIVE_FAR: f32 = 100.0;
pub const DEFAULT_ORTHO_NEAR: f32 = -1.0;
pub const DEFAULT_ORTHO_FAR: f32 = 100.0;

/// The projection currently installed on a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        aspect: f32,
        fov_degrees: f32,
        near: f32,
        far: f32,
    },
    Orthographic(OrthoFrustum),
}

/// Orthographic bounds, as passed to
/// [`Camera::set_orthographic_projection`].
///
/// `top` may be smaller than `bottom` (a Y-down screen projection such as
/// `(0, 960, 0, 540)`); overlap tests normalize the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoFrustum {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoFrustum {
    /// World-space minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(
            self.left.min(self.right),
            self.top.min(self.bottom),
            -self.far.max(self.near),
        )
    }

    /// World-space maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(
            self.left.max(self.right),
            self.top.max(self.bottom),
            -self.far.min(self.near),
        )
    }

    /// Returns `true` if the box `[min, max]` overlaps this frustum on all
    /// three axes. Touching edges count as overlap.
    pub fn intersects(&self, min: Vec3, max: Vec3) -> bool {
        let f_min = self.min();
        let f_max = self.max();
        max.x >= f_min.x
            && min.x <= f_max.x
            && max.y >= f_min.y
            && min.y <= f_max.y
            && max.z >= f_min.z
            && min.z <= f_max.z
    }

    /// The same frustum moved by `offset` (the camera position).
    ///
    /// Depth is measured along `-Z` from the camera, so `near`/`far` shift
    /// opposite to `offset.z`.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            left: self.left + offset.x,
            right: self.right + offset.x,
            top: self.top + offset.y,
            bottom: self.bottom + offset.y,
            near: self.near - offset.z,
            far: self.far - offset.z,
        }
    }
}

/// A look-at camera with a cached view matrix.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    view: Mat4,
    projection_matrix: Mat4,
    projection: Option<Projection>,
    view_dirty: bool,
}

impl Camera {
    /// A camera at the origin looking down `-Z` with `+Y` up. Both matrices
    /// start as identity until a projection is set.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            view: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            projection: None,
            view_dirty: true,
        }
    }

    /// A camera with an orthographic projection and default depth range.
    pub fn orthographic(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        let mut camera = Self::new();
        camera.set_orthographic_projection(
            left,
            right,
            top,
            bottom,
            DEFAULT_ORTHO_NEAR,
            DEFAULT_ORTHO_FAR,
        );
        camera
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.view_dirty = true;
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.view_dirty = true;
    }

    pub fn set_up_vector(&mut self, up: Vec3) {
        self.up = up;
        self.view_dirty = true;
    }

    /// Move the camera by `offset`. The target does not move with it.
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
        self.view_dirty = true;
    }

    pub fn set_perspective_projection(&mut self, aspect: f32, fov_degrees: f32, near: f32, far: f32) {
        self.projection_matrix = Mat4::perspective_rh(fov_degrees.to_radians(), aspect, near, far);
        self.projection = Some(Projection::Perspective {
            aspect,
            fov_degrees,
            near,
            far,
        });
    }

    /// Perspective projection with a 45° FOV and a `0.1..100` depth range.
    pub fn set_perspective_projection_default(&mut self, aspect: f32) {
        self.set_perspective_projection(
            aspect,
            DEFAULT_FOV_DEGREES,
            DEFAULT_PERSPECTIVE_NEAR,
            DEFAULT_PERSPECTIVE_FAR,
        );
    }

    pub fn set_orthographic_projection(
        &mut self,
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) {
        self.projection_matrix = Mat4::orthographic_rh(left, right, bottom, top, near, far);
        self.projection = Some(Projection::Orthographic(OrthoFrustum {
            left,
            right,
            top,
            bottom,
            near,
            far,
        }));
    }

    /// Orthographic projection with a `-1..100` depth range.
    pub fn set_orthographic_projection_default(&mut self, left: f32, right: f32, top: f32, bottom: f32) {
        self.set_orthographic_projection(left, right, top, bottom, DEFAULT_ORTHO_NEAR, DEFAULT_ORTHO_FAR);
    }

    /// Rebuild the view matrix with look-at and clear the dirty flag.
    pub fn calculate_view_matrix(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.target, self.up);
        self.view_dirty = false;
    }

    /// Returns `true` if the view changed since the last
    /// [`calculate_view_matrix`](Self::calculate_view_matrix).
    pub fn needs_view_update(&self) -> bool {
        self.view_dirty
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up_vector(&self) -> Vec3 {
        self.up
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    /// `projection * view`.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view
    }

    pub fn projection(&self) -> Option<Projection> {
        self.projection
    }

    /// The visible world region for culling, or `None` when the camera has no
    /// orthographic projection.
    pub fn frustum(&self) -> Option<OrthoFrustum> {
        match self.projection {
            Some(Projection::Orthographic(frustum)) => Some(frustum.translated(self.position)),
            _ => None,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_mark_view_dirty() {
        let mut camera = Camera::new();
        assert!(camera.needs_view_update());
        camera.calculate_view_matrix();
        assert!(!camera.needs_view_update());

        camera.translate(Vec3::new(1.0, 0.0, 0.0));
        assert!(camera.needs_view_update());
        camera.calculate_view_matrix();

        camera.set_target(Vec3::new(0.0, 0.0, -5.0));
        assert!(camera.needs_view_update());
        camera.calculate_view_matrix();

        camera.set_up_vector(Vec3::Y);
        assert!(camera.needs_view_update());
    }

    #[test]
    fn projection_is_computed_immediately() {
        let mut camera = Camera::new();
        camera.set_orthographic_projection_default(0.0, 960.0, 540.0, 0.0);
        assert_ne!(camera.projection_matrix(), Mat4::IDENTITY);
        // View stays dirty; only the projection is eager.
        assert!(camera.needs_view_update());
    }

    #[test]
    fn default_view_is_identity_for_origin_camera() {
        let mut camera = Camera::new();
        camera.calculate_view_matrix();
        let p = camera.view_matrix().transform_point3(Vec3::new(3.0, 4.0, 0.0));
        assert!((p.x - 3.0).abs() < 0.001);
        assert!((p.y - 4.0).abs() < 0.001);
    }

    #[test]
    fn ortho_maps_bounds_to_clip_space() {
        let mut camera = Camera::orthographic(0.0, 960.0, 540.0, 0.0);
        camera.calculate_view_matrix();
        let vp = camera.view_projection();
        let bottom_left = vp.project_point3(Vec3::new(0.0, 0.0, 0.0));
        let top_right = vp.project_point3(Vec3::new(960.0, 540.0, 0.0));
        assert!((bottom_left.x + 1.0).abs() < 0.001 && (bottom_left.y + 1.0).abs() < 0.001);
        assert!((top_right.x - 1.0).abs() < 0.001 && (top_right.y - 1.0).abs() < 0.001);
    }

    #[test]
    fn perspective_has_no_frustum() {
        let mut camera = Camera::new();
        camera.set_perspective_projection_default(16.0 / 9.0);
        assert!(camera.frustum().is_none());
        assert!(matches!(
            camera.projection(),
            Some(Projection::Perspective { fov_degrees, .. }) if (fov_degrees - 45.0).abs() < 0.001
        ));
    }

    #[test]
    fn frustum_follows_camera_position() {
        let mut camera = Camera::orthographic(0.0, 960.0, 0.0, 540.0);
        camera.set_position(Vec3::new(100.0, 50.0, 0.0));
        let frustum = camera.frustum().expect("ortho camera has a frustum");
        assert!((frustum.left - 100.0).abs() < 0.001);
        assert!((frustum.right - 1060.0).abs() < 0.001);
        assert!((frustum.min().y - 50.0).abs() < 0.001);
        assert!((frustum.max().y - 590.0).abs() < 0.001);
    }

    #[test]
    fn touching_edge_is_inside() {
        let frustum = Camera::orthographic(0.0, 960.0, 0.0, 540.0)
            .frustum()
            .expect("ortho camera has a frustum");

        // Box ends exactly at the left edge.
        assert!(frustum.intersects(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 1.0)));
        // Box starts exactly at the top edge.
        assert!(frustum.intersects(Vec3::new(0.0, 540.0, 0.0), Vec3::new(10.0, 550.0, 1.0)));
    }

    #[test]
    fn just_outside_is_rejected() {
        let frustum = Camera::orthographic(0.0, 960.0, 0.0, 540.0)
            .frustum()
            .expect("ortho camera has a frustum");
        let eps = 0.01;

        assert!(!frustum.intersects(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(-eps, 10.0, 1.0)));
        assert!(!frustum.intersects(Vec3::new(960.0 + eps, 0.0, 0.0), Vec3::new(970.0, 10.0, 1.0)));
        assert!(!frustum.intersects(Vec3::new(0.0, 0.0, 1.0 + eps), Vec3::new(10.0, 10.0, 2.0)));
    }
}
