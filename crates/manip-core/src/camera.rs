//! Orbit camera and viewport for gizmo math

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::camera as defaults;

/// Screen-space rectangle the camera renders into (pixels, Y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Convert a screen position into viewport-local pixel coordinates
    pub fn to_local(&self, screen: Vec2) -> Vec2 {
        screen - Vec2::new(self.x, self.y)
    }

    /// Size in whole pixels (at least 1x1)
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width.round() as u32).max(1),
            (self.height.round() as u32).max(1),
        )
    }
}

/// Orbit camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: Viewport,
    // Orbit state
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

impl Camera {
    /// Create a new camera with default parameters
    pub fn new(viewport: Viewport) -> Self {
        let yaw = 45.0_f32.to_radians();
        let pitch = 30.0_f32.to_radians();
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Z,
            fov: defaults::DEFAULT_FOV_DEGREES.to_radians(),
            near: defaults::DEFAULT_NEAR,
            far: defaults::DEFAULT_FAR,
            viewport,
            yaw,
            pitch,
            distance: 5.0,
        };
        camera.update_position_from_orbit();
        camera
    }

    /// Camera at an explicit position looking at `target`
    pub fn looking_at(position: Vec3, target: Vec3, up: Vec3, viewport: Viewport) -> Self {
        let offset = position - target;
        let distance = offset.length();
        let (yaw, pitch) = if distance > 0.0 {
            (offset.y.atan2(offset.x), (offset.z / distance).clamp(-1.0, 1.0).asin())
        } else {
            (0.0, 0.0)
        };
        Self {
            position,
            target,
            up,
            fov: defaults::DEFAULT_FOV_DEGREES.to_radians(),
            near: defaults::DEFAULT_NEAR,
            far: defaults::DEFAULT_FAR,
            viewport,
            yaw,
            pitch,
            distance,
        }
    }

    /// Update the viewport (and with it the aspect ratio)
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Orbit the camera around the target
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch =
            (self.pitch + delta_pitch).clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
        self.update_position_from_orbit();
    }

    /// Zoom the camera
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance * (1.0 - delta * 0.1)).clamp(0.1, 10000.0);
        self.update_position_from_orbit();
    }

    fn update_position_from_orbit(&mut self) {
        let x = self.distance * self.pitch.cos() * self.yaw.cos();
        let y = self.distance * self.pitch.cos() * self.yaw.sin();
        let z = self.distance * self.pitch.sin();
        self.position = self.target + Vec3::new(x, y, z);
    }

    /// Set to top view (looking down -Z)
    pub fn set_top_view(&mut self) {
        self.yaw = 0.0;
        self.pitch = 89.0_f32.to_radians();
        self.update_position_from_orbit();
    }

    /// Set to front view (looking down -X)
    pub fn set_front_view(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.update_position_from_orbit();
    }

    /// Set to side view (looking down -Y)
    pub fn set_side_view(&mut self) {
        self.yaw = 90.0_f32.to_radians();
        self.pitch = 0.0;
        self.update_position_from_orbit();
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.viewport.aspect(), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world point to screen pixels.
    ///
    /// Returns `None` for points on or behind the camera plane.
    pub fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            self.viewport.x + (ndc.x + 1.0) * 0.5 * self.viewport.width,
            self.viewport.y + (1.0 - ndc.y) * 0.5 * self.viewport.height,
        ))
    }
}
