//! Color-index picking
//!
//! Shapes are drawn into an offscreen target with flat, unique colors and a
//! small pixel region is read back and decoded into shape identities.
//!
//! # Pick passes
//!
//! [`Picker::begin_manual_pick`] binds the target and returns a [`PickPass`]
//! guard. The guard releases the target when finished or dropped, so the
//! previous render target is restored on every exit path, including early
//! returns through `?`. Only one pass can be open at a time because the guard
//! borrows the picker mutably.
//!
//! # Target requirements
//!
//! Colors are matched exactly. Pick targets must not multisample, filter or
//! dither; a blended edge texel would otherwise decode to an unrelated shape.

mod software;

pub use software::SoftwarePickTarget;

use glam::{Mat4, Vec2};

use crate::camera::{Camera, Viewport};
use crate::color::PickColor;
use crate::constants::pick::COLOR_CAPACITY;
use crate::scene::ObjectId;

/// Picking errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PickError {
    #[error("Color space exhausted: {requested} pickable objects, capacity {capacity}")]
    ColorSpaceExhausted { requested: usize, capacity: usize },

    #[error("Pick target unavailable: {0}")]
    TargetUnavailable(String),

    #[error("Pixel readback failed: {0}")]
    Readback(String),
}

/// Rectangle of pixels to read back, in viewport-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A single pixel
    pub fn pixel(x: i32, y: i32) -> Self {
        Self::new(x, y, 1, 1)
    }

    /// Square region of side `size` centered on `position`
    pub fn around(position: Vec2, size: u32) -> Self {
        let half = (size / 2) as i32;
        Self::new(
            position.x.floor() as i32 - half,
            position.y.floor() as i32 - half,
            size,
            size,
        )
    }

    /// Shift the region inward so it lies within a `width` x `height` buffer.
    ///
    /// Regions larger than the buffer are shrunk to fit.
    pub fn clamp_to(self, width: u32, height: u32) -> Self {
        let region_width = self.width.min(width);
        let region_height = self.height.min(height);
        let max_left = (width - region_width) as i32;
        let max_top = (height - region_height) as i32;
        Self {
            left: self.left.clamp(0, max_left),
            top: self.top.clamp(0, max_top),
            width: region_width,
            height: region_height,
        }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Borrowed triangle mesh drawn by a pick pass
#[derive(Debug, Clone, Copy)]
pub struct PickMesh<'a> {
    pub positions: &'a [[f32; 3]],
    pub indices: &'a [u32],
    /// Model-to-world transform
    pub transform: Mat4,
}

/// Resolves registered shape identities to drawable geometry.
///
/// The picker never owns geometry; it only keeps identities in registration
/// order and asks the source for a mesh when drawing.
pub trait PickSource {
    fn pick_mesh(&self, id: ObjectId) -> Option<PickMesh<'_>>;
}

/// Offscreen color buffer the picker draws into.
///
/// Implementations: [`SoftwarePickTarget`] (CPU) and the wgpu target in the
/// renderer crate.
pub trait PickTarget {
    /// Bind the target sized to `viewport`, clear it to
    /// [`PickColor::BACKGROUND`] and set the transforms for later draws.
    fn begin(&mut self, view: Mat4, projection: Mat4, viewport: Viewport)
    -> Result<(), PickError>;

    /// Draw `mesh` unlit and untextured in a single flat color
    fn draw_flat(&mut self, mesh: &PickMesh<'_>, color: PickColor);

    /// Unbind the target and restore whatever was bound before `begin`
    fn end(&mut self);

    /// Current buffer size in pixels
    fn size(&self) -> (u32, u32);

    /// Read back `region` row-major. `region` is already clamped to [`size`].
    ///
    /// [`size`]: PickTarget::size
    fn read_pixels(&mut self, region: Region) -> Result<Vec<PickColor>, PickError>;
}

/// An open pick pass. Ends the pass on drop if [`finish`] was not called.
///
/// [`finish`]: PickPass::finish
pub struct PickPass<'a, T: PickTarget> {
    target: &'a mut T,
    open: bool,
}

impl<T: PickTarget> PickPass<'_, T> {
    /// Draw one shape in `color`
    pub fn render_object(&mut self, mesh: &PickMesh<'_>, color: PickColor) {
        self.target.draw_flat(mesh, color);
    }

    /// End the pass and read back `region`, shifted inward if it crosses
    /// the buffer edge.
    pub fn finish(mut self, region: Region) -> Result<Vec<PickColor>, PickError> {
        self.open = false;
        self.target.end();
        let (width, height) = self.target.size();
        let clamped = region.clamp_to(width, height);
        if clamped != region {
            tracing::trace!(?region, ?clamped, "Pick region shifted inside target");
        }
        self.target.read_pixels(clamped)
    }
}

impl<T: PickTarget> Drop for PickPass<'_, T> {
    fn drop(&mut self) {
        if self.open {
            self.target.end();
        }
    }
}

/// Color-index picker over a registered, ordered list of shapes
pub struct Picker<T: PickTarget> {
    target: T,
    shapes: Vec<ObjectId>,
    capacity: usize,
}

impl<T: PickTarget> Picker<T> {
    pub fn new(target: T) -> Self {
        Self::with_capacity(target, COLOR_CAPACITY)
    }

    /// Picker that refuses to pick once more than `capacity` shapes are
    /// registered (capped at the 24-bit color capacity)
    pub fn with_capacity(target: T, capacity: usize) -> Self {
        Self {
            target,
            shapes: Vec::new(),
            capacity: capacity.min(COLOR_CAPACITY),
        }
    }

    /// Register a shape. Registration order decides color assignment.
    ///
    /// Returns `false` if the shape was already registered.
    pub fn add_object(&mut self, id: ObjectId) -> bool {
        if self.shapes.contains(&id) {
            return false;
        }
        self.shapes.push(id);
        true
    }

    /// Unregister a shape, keeping the order of the rest
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.shapes.iter().position(|s| *s == id) else {
            return false;
        };
        self.shapes.remove(index);
        true
    }

    pub fn objects(&self) -> &[ObjectId] {
        &self.shapes
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Fail if more shapes are registered than there are unique colors
    pub fn ensure_capacity(&self) -> Result<(), PickError> {
        if self.shapes.len() > self.capacity {
            return Err(PickError::ColorSpaceExhausted {
                requested: self.shapes.len(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Bind the pick target for a manual pass
    pub fn begin_manual_pick(
        &mut self,
        view: Mat4,
        projection: Mat4,
        viewport: Viewport,
    ) -> Result<PickPass<'_, T>, PickError> {
        self.target.begin(view, projection, viewport)?;
        Ok(PickPass {
            target: &mut self.target,
            open: true,
        })
    }

    /// Pick the registered shape under viewport-local pixel (`x`, `y`).
    ///
    /// Returns `Ok(None)` for pixels outside the viewport, background pixels
    /// and colors that do not decode to a registered shape.
    pub fn pick<S: PickSource>(
        &mut self,
        source: &S,
        camera: &Camera,
        x: i32,
        y: i32,
    ) -> Result<Option<ObjectId>, PickError> {
        self.ensure_capacity()?;

        // Only hover regions shift inward; a single pick pixel must lie inside
        let (width, height) = camera.viewport.pixel_size();
        if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
            tracing::trace!(x, y, width, height, "Object pick outside viewport");
            return Ok(None);
        }

        let shapes = self.shapes.clone();
        let mut pass = self.begin_manual_pick(
            camera.view_matrix(),
            camera.projection_matrix(),
            camera.viewport,
        )?;
        for (index, id) in shapes.iter().enumerate() {
            let color = PickColor::from_index(index).ok_or(PickError::ColorSpaceExhausted {
                requested: shapes.len(),
                capacity: COLOR_CAPACITY,
            })?;
            // Missing geometry still consumes its index so colors stay aligned
            if let Some(mesh) = source.pick_mesh(*id) {
                pass.render_object(&mesh, color);
            }
        }
        let pixels = pass.finish(Region::pixel(x, y))?;

        let hit = pixels
            .first()
            .and_then(|color| color.to_index())
            .and_then(|index| shapes.get(index).copied());
        tracing::trace!(x, y, ?hit, "Object pick");
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, SceneObject};
    use glam::Vec3;

    #[test]
    fn test_region_around_cursor() {
        let region = Region::around(Vec2::new(100.4, 50.9), 20);
        assert_eq!(region, Region::new(90, 40, 20, 20));
    }

    #[test]
    fn test_region_clamp_shifts_inward() {
        let region = Region::new(-5, 790, 20, 20).clamp_to(800, 800);
        assert_eq!(region, Region::new(0, 780, 20, 20));
    }

    #[test]
    fn test_region_clamp_inside_is_unchanged() {
        let region = Region::new(10, 10, 20, 20);
        assert_eq!(region.clamp_to(800, 600), region);
    }

    #[test]
    fn test_region_larger_than_buffer_shrinks() {
        let region = Region::new(-3, -3, 20, 20).clamp_to(8, 4);
        assert_eq!(region, Region::new(0, 0, 8, 4));
        assert_eq!(region.area(), 32);
    }

    #[test]
    fn test_registration_keeps_insertion_order() {
        let mut picker = Picker::new(SoftwarePickTarget::new());
        let a = ObjectId::new();
        let b = ObjectId::new();
        let c = ObjectId::new();
        assert!(picker.add_object(a));
        assert!(picker.add_object(b));
        assert!(picker.add_object(c));
        assert!(!picker.add_object(b));
        assert!(picker.remove_object(b));
        assert!(!picker.remove_object(b));
        assert_eq!(picker.objects(), &[a, c]);
    }

    fn front_camera() -> Camera {
        Camera::looking_at(
            Vec3::new(0.0, -14.0, 0.0),
            Vec3::ZERO,
            Vec3::Z,
            Viewport::new(800.0, 600.0),
        )
    }

    fn begin(picker: &mut Picker<SoftwarePickTarget>) -> Result<(), PickError> {
        let camera = front_camera();
        picker
            .begin_manual_pick(
                camera.view_matrix(),
                camera.projection_matrix(),
                camera.viewport,
            )
            .map(|_| ())
    }

    #[test]
    fn test_pick_outside_viewport_hits_nothing() {
        let camera = front_camera();
        let mut scene = Scene::new();
        // Wide enough to cover both side edges of the view
        let wide = scene.add(SceneObject::cuboid("wide", Vec3::new(20.0, 1.0, 1.0)));
        let mut picker = Picker::new(SoftwarePickTarget::new());
        picker.add_object(wide);

        assert_eq!(picker.pick(&scene, &camera, 0, 300).unwrap(), Some(wide));
        assert_eq!(picker.pick(&scene, &camera, 799, 300).unwrap(), Some(wide));
        assert_eq!(picker.pick(&scene, &camera, -500, 300).unwrap(), None);
        assert_eq!(picker.pick(&scene, &camera, 800, 300).unwrap(), None);
        assert_eq!(picker.pick(&scene, &camera, 400, 600).unwrap(), None);
        assert_eq!(picker.pick(&scene, &camera, 400, -1).unwrap(), None);
    }

    #[test]
    fn test_dropped_pass_releases_target() {
        let mut picker = Picker::new(SoftwarePickTarget::new());
        let camera = front_camera();
        {
            let pass = picker
                .begin_manual_pick(
                    camera.view_matrix(),
                    camera.projection_matrix(),
                    camera.viewport,
                )
                .unwrap();
            drop(pass);
        }
        assert!(!picker.target().is_bound());
        assert!(begin(&mut picker).is_ok());
        assert!(!picker.target().is_bound());
    }

    #[test]
    fn test_early_return_releases_target() {
        fn failing_pass(picker: &mut Picker<SoftwarePickTarget>) -> Result<(), PickError> {
            let camera = front_camera();
            let _pass = picker.begin_manual_pick(
                camera.view_matrix(),
                camera.projection_matrix(),
                camera.viewport,
            )?;
            Err(PickError::Readback("aborted".into()))
        }

        let mut picker = Picker::new(SoftwarePickTarget::new());
        assert!(failing_pass(&mut picker).is_err());
        assert!(!picker.target().is_bound());
    }

    #[test]
    fn test_begin_fails_while_pass_open() {
        let mut picker = Picker::new(SoftwarePickTarget::new());
        let camera = front_camera();
        let pass = picker
            .begin_manual_pick(
                camera.view_matrix(),
                camera.projection_matrix(),
                camera.viewport,
            )
            .unwrap();
        // A leaked guard never ends the pass
        std::mem::forget(pass);
        assert!(picker.target().is_bound());

        let result = begin(&mut picker);
        assert!(matches!(result, Err(PickError::TargetUnavailable(_))));

        picker.target_mut().end();
        assert!(begin(&mut picker).is_ok());
    }
}
