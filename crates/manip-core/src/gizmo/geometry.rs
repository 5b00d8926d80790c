//! Gizmo geometry generation
//!
//! Every gizmo is a list of part meshes in gizmo space (unit size, origin at
//! the gizmo center). The pick pass draws each part in its palette color;
//! the renderer merges them into one vertex buffer tagged by part index.

use std::f32::consts::{FRAC_PI_2, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::{Axis, GizmoMode, GizmoPart};
use crate::constants::gizmo;
use crate::picker::PickMesh;
use crate::scene::generate_box_mesh;

/// Gizmo vertex data. Color is looked up per part at draw time.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GizmoVertex {
    pub position: [f32; 3],
    pub part_id: u32,
}

/// Triangles belonging to one gizmo part
#[derive(Debug, Clone)]
pub struct PartMesh {
    pub part: GizmoPart,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl PartMesh {
    fn new(part: GizmoPart) -> Self {
        Self {
            part,
            positions: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn base(&self) -> u32 {
        self.positions.len() as u32
    }

    fn push(&mut self, position: Vec3) {
        self.positions.push(position.into());
    }

    /// Append positions/indices produced in another local frame
    fn append(&mut self, transform: Mat4, positions: &[[f32; 3]], indices: &[u32]) {
        let base = self.base();
        for p in positions {
            self.push(transform.transform_point3(Vec3::from(*p)));
        }
        self.indices.extend(indices.iter().map(|i| base + i));
    }

    /// Borrow as a pick mesh placed by `transform`
    pub fn pick_mesh(&self, transform: Mat4) -> PickMesh<'_> {
        PickMesh {
            positions: &self.positions,
            indices: &self.indices,
            transform,
        }
    }
}

/// All part meshes of one gizmo mode
#[derive(Debug, Clone)]
pub struct GizmoGeometry {
    pub mode: GizmoMode,
    pub parts: Vec<PartMesh>,
}

impl GizmoGeometry {
    pub fn for_mode(mode: GizmoMode) -> Self {
        let parts = match mode {
            GizmoMode::Translate => generate_translation_gizmo(),
            GizmoMode::Rotate => generate_rotation_gizmo(),
            GizmoMode::Scale => generate_scale_gizmo(),
        };
        Self { mode, parts }
    }

    pub fn part(&self, part: GizmoPart) -> Option<&PartMesh> {
        self.parts.iter().find(|p| p.part == part)
    }

    /// Merge all parts into one indexed buffer tagged by part index
    pub fn vertices(&self) -> (Vec<GizmoVertex>, Vec<u32>) {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for mesh in &self.parts {
            let base = vertices.len() as u32;
            vertices.extend(mesh.positions.iter().map(|p| GizmoVertex {
                position: *p,
                part_id: mesh.part.index() as u32,
            }));
            indices.extend(mesh.indices.iter().map(|i| base + i));
        }
        (vertices, indices)
    }
}

/// Rotation taking +Y onto the given axis
fn align_y_to(axis: Axis) -> Mat4 {
    match axis {
        Axis::X => Mat4::from_rotation_z(-FRAC_PI_2),
        Axis::Y => Mat4::IDENTITY,
        Axis::Z => Mat4::from_rotation_x(FRAC_PI_2),
    }
}

/// Open cylinder along +Y from `start` to `end`
fn push_cylinder(mesh: &mut PartMesh, rotation: Mat4, radius: f32, start: f32, end: f32) {
    let segments = gizmo::SEGMENTS;
    let base_index = mesh.base();
    for i in 0..=segments {
        let angle = (i as f32 / segments as f32) * TAU;
        let x = angle.cos() * radius;
        let z = angle.sin() * radius;
        mesh.push(rotation.transform_point3(Vec3::new(x, start, z)));
        mesh.push(rotation.transform_point3(Vec3::new(x, end, z)));
    }
    for i in 0..segments {
        let i0 = base_index + i * 2;
        let i1 = base_index + i * 2 + 1;
        let i2 = base_index + (i + 1) * 2;
        let i3 = base_index + (i + 1) * 2 + 1;
        mesh.indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
    }
}

/// Arrow along an axis: shaft plus capped cone
fn arrow(axis: Axis) -> PartMesh {
    let part = match axis {
        Axis::X => GizmoPart::X,
        Axis::Y => GizmoPart::Y,
        Axis::Z => GizmoPart::Z,
    };
    let mut mesh = PartMesh::new(part);
    let rotation = align_y_to(axis);
    let segments = gizmo::SEGMENTS;
    let shaft_end = gizmo::ARROW_LENGTH - gizmo::HEAD_LENGTH;

    push_cylinder(&mut mesh, rotation, gizmo::SHAFT_RADIUS, 0.0, shaft_end);

    // Cone tip followed by the base ring
    let tip_index = mesh.base();
    mesh.push(rotation.transform_point3(Vec3::new(0.0, gizmo::ARROW_LENGTH, 0.0)));
    for i in 0..=segments {
        let angle = (i as f32 / segments as f32) * TAU;
        let x = angle.cos() * gizmo::HEAD_RADIUS;
        let z = angle.sin() * gizmo::HEAD_RADIUS;
        mesh.push(rotation.transform_point3(Vec3::new(x, shaft_end, z)));
    }
    for i in 0..segments {
        let i0 = tip_index + 1 + i;
        let i1 = tip_index + 2 + i;
        mesh.indices.extend_from_slice(&[tip_index, i1, i0]);
    }

    // Base cap
    let center_index = mesh.base();
    mesh.push(rotation.transform_point3(Vec3::new(0.0, shaft_end, 0.0)));
    for i in 0..segments {
        let i0 = tip_index + 1 + i;
        let i1 = tip_index + 2 + i;
        mesh.indices.extend_from_slice(&[center_index, i0, i1]);
    }

    mesh
}

fn plane_axes(part: GizmoPart) -> (Vec3, Vec3) {
    match part {
        GizmoPart::XY => (Vec3::X, Vec3::Y),
        GizmoPart::YZ => (Vec3::Y, Vec3::Z),
        _ => (Vec3::X, Vec3::Z),
    }
}

/// Square handle between two axes
fn plane_square(part: GizmoPart) -> PartMesh {
    let (u, v) = plane_axes(part);
    let near = gizmo::PLANE_HANDLE_OFFSET;
    let far = near + gizmo::PLANE_HANDLE_SIZE;
    let mut mesh = PartMesh::new(part);
    mesh.push(u * near + v * near);
    mesh.push(u * far + v * near);
    mesh.push(u * far + v * far);
    mesh.push(u * near + v * far);
    mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
    mesh
}

/// Band joining two scale shafts
fn plane_band(part: GizmoPart) -> PartMesh {
    let (u, v) = plane_axes(part);
    let outer = gizmo::SCALE_PLANE_EXTENT;
    let inner = outer * 0.6;
    let mut mesh = PartMesh::new(part);
    mesh.push(u * inner);
    mesh.push(u * outer);
    mesh.push(v * outer);
    mesh.push(v * inner);
    mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
    mesh
}

fn center_cube() -> PartMesh {
    let (positions, indices) =
        generate_box_mesh(Vec3::splat(gizmo::CENTER_HANDLE_HALF_SIZE * 2.0));
    let mut mesh = PartMesh::new(GizmoPart::All);
    mesh.append(Mat4::IDENTITY, &positions, &indices);
    mesh
}

/// Generate translation gizmo geometry: three arrows, three plane squares
/// and the center cube.
pub fn generate_translation_gizmo() -> Vec<PartMesh> {
    let mut parts = vec![
        plane_square(GizmoPart::XY),
        plane_square(GizmoPart::YZ),
        plane_square(GizmoPart::XZ),
    ];
    parts.extend(Axis::ALL.into_iter().map(arrow));
    parts.push(center_cube());
    parts
}

/// Generate rotation gizmo geometry: one torus per axis, the axis being the
/// ring normal.
pub fn generate_rotation_gizmo() -> Vec<PartMesh> {
    Axis::ALL
        .into_iter()
        .map(|axis| {
            let (part, u, v) = match axis {
                Axis::X => (GizmoPart::X, Vec3::Y, Vec3::Z),
                Axis::Y => (GizmoPart::Y, Vec3::Z, Vec3::X),
                Axis::Z => (GizmoPart::Z, Vec3::X, Vec3::Y),
            };
            let normal = axis.direction();
            let ring_segments = gizmo::RING_SEGMENTS;
            let tube_segments = gizmo::RING_TUBE_SEGMENTS;
            let mut mesh = PartMesh::new(part);

            for i in 0..=ring_segments {
                let a = (i as f32 / ring_segments as f32) * TAU;
                let radial = u * a.cos() + v * a.sin();
                let center = radial * gizmo::RING_RADIUS;
                for j in 0..=tube_segments {
                    let b = (j as f32 / tube_segments as f32) * TAU;
                    let offset = (radial * b.cos() + normal * b.sin()) * gizmo::RING_THICKNESS;
                    mesh.push(center + offset);
                }
            }

            let stride = tube_segments + 1;
            for i in 0..ring_segments {
                for j in 0..tube_segments {
                    let i0 = i * stride + j;
                    let i1 = i0 + 1;
                    let i2 = i0 + stride;
                    let i3 = i2 + 1;
                    mesh.indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
                }
            }
            mesh
        })
        .collect()
}

/// Generate scale gizmo geometry: three shafts ending in cubes, three plane
/// bands and the center cube.
pub fn generate_scale_gizmo() -> Vec<PartMesh> {
    let mut parts = vec![
        plane_band(GizmoPart::XY),
        plane_band(GizmoPart::YZ),
        plane_band(GizmoPart::XZ),
    ];

    let (cube_positions, cube_indices) =
        generate_box_mesh(Vec3::splat(gizmo::SCALE_CUBE_HALF_SIZE * 2.0));
    for axis in Axis::ALL {
        let part = match axis {
            Axis::X => GizmoPart::X,
            Axis::Y => GizmoPart::Y,
            Axis::Z => GizmoPart::Z,
        };
        let mut mesh = PartMesh::new(part);
        let rotation = align_y_to(axis);
        push_cylinder(
            &mut mesh,
            rotation,
            gizmo::SHAFT_RADIUS,
            0.0,
            gizmo::SCALE_AXIS_LENGTH,
        );
        let cube_at_end =
            Mat4::from_translation(axis.direction() * gizmo::SCALE_AXIS_LENGTH);
        mesh.append(cube_at_end, &cube_positions, &cube_indices);
        parts.push(mesh);
    }

    parts.push(center_cube());
    parts
}
