//! CPU pick target
//!
//! Rasterizes flat-colored triangles into an in-memory color buffer with a
//! depth test. Pixels are sampled at their centers with no antialiasing, so
//! every covered texel holds exactly the color it was drawn with.

use glam::{Mat4, Vec2, Vec3};

use super::{PickError, PickMesh, PickTarget, Region};
use crate::camera::Viewport;
use crate::color::PickColor;

/// Clip-space `w` below which a vertex counts as behind the camera
const NEAR_W: f32 = 1e-5;
/// Triangles with a smaller doubled screen area are skipped
const MIN_AREA: f32 = 1e-8;

/// In-memory pick target
#[derive(Debug, Clone)]
pub struct SoftwarePickTarget {
    width: u32,
    height: u32,
    color: Vec<PickColor>,
    depth: Vec<f32>,
    view_projection: Mat4,
    bound: bool,
    triangles_drawn: usize,
}

impl Default for SoftwarePickTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwarePickTarget {
    pub fn new() -> Self {
        Self {
            width: 1,
            height: 1,
            color: vec![PickColor::BACKGROUND],
            depth: vec![f32::INFINITY],
            view_projection: Mat4::IDENTITY,
            bound: false,
            triangles_drawn: 0,
        }
    }

    /// Color at a pixel from the last pass
    pub fn pixel(&self, x: u32, y: u32) -> Option<PickColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.color.get((y * self.width + x) as usize).copied()
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Triangles rasterized during the last pass
    pub fn triangles_drawn(&self) -> usize {
        self.triangles_drawn
    }

    fn to_screen(&self, mvp: &Mat4, position: [f32; 3]) -> Option<Vec3> {
        let clip = *mvp * Vec3::from(position).extend(1.0);
        if clip.w <= NEAR_W {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
            ndc.z,
        ))
    }

    fn rasterize(&mut self, v: [Vec3; 3], color: PickColor) {
        let (a, b, c) = (v[0].truncate(), v[1].truncate(), v[2].truncate());
        let area = edge_function(a, b, c);
        if area.abs() < MIN_AREA {
            return;
        }
        let inv_area = 1.0 / area;

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(self.width as f32).max(0.0) as u32;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(self.height as f32).max(0.0) as u32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge_function(b, c, p);
                let w1 = edge_function(c, a, p);
                let w2 = edge_function(a, b, p);
                let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0)
                    || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
                if !inside {
                    continue;
                }

                let depth = (w0 * v[0].z + w1 * v[1].z + w2 * v[2].z) * inv_area;
                if !(0.0..=1.0).contains(&depth) {
                    continue;
                }
                let index = (y * self.width + x) as usize;
                if depth <= self.depth[index] {
                    self.depth[index] = depth;
                    self.color[index] = color;
                }
            }
        }
    }
}

/// Signed doubled area of triangle (a, b, p)
fn edge_function(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

impl PickTarget for SoftwarePickTarget {
    fn begin(
        &mut self,
        view: Mat4,
        projection: Mat4,
        viewport: Viewport,
    ) -> Result<(), PickError> {
        if self.bound {
            return Err(PickError::TargetUnavailable(
                "a pick pass is already open".into(),
            ));
        }
        let (width, height) = viewport.pixel_size();
        let len = (width * height) as usize;
        self.width = width;
        self.height = height;
        self.color.clear();
        self.color.resize(len, PickColor::BACKGROUND);
        self.depth.clear();
        self.depth.resize(len, f32::INFINITY);
        self.view_projection = projection * view;
        self.triangles_drawn = 0;
        self.bound = true;
        Ok(())
    }

    fn draw_flat(&mut self, mesh: &PickMesh<'_>, color: PickColor) {
        if !self.bound {
            tracing::warn!("draw_flat called outside of a pick pass");
            return;
        }
        let mvp = self.view_projection * mesh.transform;

        // Triangles crossing the near plane are dropped rather than clipped
        for triangle in mesh.indices.chunks_exact(3) {
            let mut screen = [Vec3::ZERO; 3];
            let mut visible = true;
            for (corner, &index) in triangle.iter().enumerate() {
                match mesh
                    .positions
                    .get(index as usize)
                    .and_then(|p| self.to_screen(&mvp, *p))
                {
                    Some(point) => screen[corner] = point,
                    None => {
                        visible = false;
                        break;
                    }
                }
            }
            if visible {
                self.rasterize(screen, color);
                self.triangles_drawn += 1;
            }
        }
    }

    fn end(&mut self) {
        self.bound = false;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_pixels(&mut self, region: Region) -> Result<Vec<PickColor>, PickError> {
        if region.left < 0
            || region.top < 0
            || region.left as u32 + region.width > self.width
            || region.top as u32 + region.height > self.height
        {
            return Err(PickError::Readback(format!(
                "region {:?} outside {}x{} target",
                region, self.width, self.height
            )));
        }

        let mut pixels = Vec::with_capacity(region.area());
        for row in 0..region.height {
            let start = ((region.top as u32 + row) * self.width + region.left as u32) as usize;
            pixels.extend_from_slice(&self.color[start..start + region.width as usize]);
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: [[f32; 3]; 4] = [
        [-1.0, -1.0, 0.0],
        [1.0, -1.0, 0.0],
        [1.0, 1.0, 0.0],
        [-1.0, 1.0, 0.0],
    ];
    const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

    fn begin_identity(target: &mut SoftwarePickTarget, size: f32) {
        target
            .begin(Mat4::IDENTITY, Mat4::IDENTITY, Viewport::new(size, size))
            .unwrap();
    }

    #[test]
    fn test_clears_to_background() {
        let mut target = SoftwarePickTarget::new();
        begin_identity(&mut target, 4.0);
        target.end();
        let pixels = target.read_pixels(Region::new(0, 0, 4, 4)).unwrap();
        assert_eq!(pixels.len(), 16);
        assert!(pixels.iter().all(|c| c.is_background()));
    }

    #[test]
    fn test_fullscreen_quad_covers_every_pixel() {
        let mut target = SoftwarePickTarget::new();
        begin_identity(&mut target, 8.0);
        let mesh = PickMesh {
            positions: &QUAD,
            indices: &QUAD_INDICES,
            transform: Mat4::IDENTITY,
        };
        target.draw_flat(&mesh, PickColor::GREEN);
        target.end();
        let pixels = target.read_pixels(Region::new(0, 0, 8, 8)).unwrap();
        assert!(pixels.iter().all(|c| *c == PickColor::GREEN));
        assert_eq!(target.triangles_drawn(), 2);
    }

    #[test]
    fn test_nearer_shape_wins() {
        let mut target = SoftwarePickTarget::new();
        begin_identity(&mut target, 8.0);
        let far = PickMesh {
            positions: &QUAD,
            indices: &QUAD_INDICES,
            transform: Mat4::from_translation(Vec3::new(0.0, 0.0, 0.8)),
        };
        let near = PickMesh {
            transform: Mat4::from_translation(Vec3::new(0.0, 0.0, 0.2)),
            ..far
        };
        target.draw_flat(&near, PickColor::RED);
        target.draw_flat(&far, PickColor::BLUE);
        target.end();
        assert_eq!(target.pixel(4, 4), Some(PickColor::RED));
    }

    #[test]
    fn test_draw_outside_pass_is_ignored() {
        let mut target = SoftwarePickTarget::new();
        let mesh = PickMesh {
            positions: &QUAD,
            indices: &QUAD_INDICES,
            transform: Mat4::IDENTITY,
        };
        target.draw_flat(&mesh, PickColor::RED);
        assert_eq!(target.pixel(0, 0), Some(PickColor::BACKGROUND));
    }

    #[test]
    fn test_nested_begin_is_rejected() {
        let mut target = SoftwarePickTarget::new();
        begin_identity(&mut target, 4.0);
        let err = target
            .begin(Mat4::IDENTITY, Mat4::IDENTITY, Viewport::new(4.0, 4.0))
            .unwrap_err();
        assert!(matches!(err, PickError::TargetUnavailable(_)));
    }

    #[test]
    fn test_out_of_bounds_read_is_an_error() {
        let mut target = SoftwarePickTarget::new();
        begin_identity(&mut target, 4.0);
        target.end();
        assert!(target.read_pixels(Region::new(2, 2, 4, 4)).is_err());
    }
}
