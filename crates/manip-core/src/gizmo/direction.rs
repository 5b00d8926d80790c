//! Gizmo placement and screen-space axis directions

use glam::{Mat4, Quat, Vec2, Vec3};

use super::{Axis, GizmoSpace};
use crate::camera::Camera;
use crate::constants::manipulation::DEGENERATE_EPSILON;

/// Where the gizmo sits in the world and how large it is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoPlacement {
    pub center: Vec3,
    pub orientation: Quat,
    /// World units per gizmo unit
    pub scale: f32,
}

impl GizmoPlacement {
    /// Place the gizmo on the primary object's transform.
    ///
    /// Local space takes the object's rotation, Global space keeps the world
    /// axes. The scale grows with camera distance so the gizmo keeps a
    /// constant screen size.
    pub fn compute(primary: Mat4, space: GizmoSpace, camera_position: Vec3, divisor: f32) -> Self {
        let (_, rotation, center) = primary.to_scale_rotation_translation();
        let orientation = match space {
            GizmoSpace::Local => rotation.normalize(),
            GizmoSpace::Global => Quat::IDENTITY,
        };
        Self {
            center,
            orientation,
            scale: gizmo_scale(camera_position, center, divisor),
        }
    }

    /// Gizmo-to-world matrix
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.orientation,
            self.center,
        )
    }

    /// World direction of one gizmo axis (unit length)
    pub fn axis_world_direction(&self, axis: Axis) -> Vec3 {
        self.orientation * axis.direction()
    }
}

/// Gizmo size for a given camera distance
pub fn gizmo_scale(camera_position: Vec3, center: Vec3, divisor: f32) -> f32 {
    if divisor <= 0.0 {
        return 1.0;
    }
    camera_position.distance(center) / divisor
}

/// Screen-space unit vector of `local_axis` for the gizmo at `placement`.
///
/// Projects the gizmo origin and the origin plus one unit along the axis
/// and normalizes the difference. Axes pointing at or away from the camera,
/// or points that fail to project, yield `Vec2::ZERO`.
pub fn screen_direction(camera: &Camera, placement: &GizmoPlacement, local_axis: Vec3) -> Vec2 {
    let world = placement.world_matrix();
    let origin = world.transform_point3(Vec3::ZERO);
    let tip = world.transform_point3(local_axis);

    let (Some(p0), Some(p1)) = (camera.world_to_screen(origin), camera.world_to_screen(tip))
    else {
        return Vec2::ZERO;
    };

    let delta = p1 - p0;
    if !delta.is_finite() || delta.length() < DEGENERATE_EPSILON {
        return Vec2::ZERO;
    }
    delta.normalize_or_zero()
}
