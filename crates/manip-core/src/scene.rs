//! Scene objects and transform storage

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::picker::{PickMesh, PickSource};

/// Identity of a pickable, transformable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Read/write access to object transforms.
///
/// The gizmo session and the undo history only talk to objects through
/// this trait.
pub trait TransformStore {
    fn transform(&self, id: ObjectId) -> Option<Mat4>;

    /// Returns `false` if the object does not exist
    fn set_transform(&mut self, id: ObjectId, transform: Mat4) -> bool;
}

/// A mesh-backed object in the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    /// Triangle vertices in object space
    pub positions: Vec<[f32; 3]>,
    /// Indices for indexed rendering
    pub indices: Vec<u32>,
    /// Object-to-world transform
    pub transform: Mat4,
    /// Bounding box min
    pub bbox_min: [f32; 3],
    /// Bounding box max
    pub bbox_max: [f32; 3],
}

impl SceneObject {
    /// Create a new empty object
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            positions: Vec::new(),
            indices: Vec::new(),
            transform: Mat4::IDENTITY,
            bbox_min: [0.0; 3],
            bbox_max: [0.0; 3],
        }
    }

    /// Box centered on the object origin
    pub fn cuboid(name: impl Into<String>, size: Vec3) -> Self {
        let (positions, indices) = generate_box_mesh(size);
        let mut object = Self {
            positions,
            indices,
            ..Self::new(name)
        };
        object.calculate_bounding_box();
        object
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_translation(self, translation: Vec3) -> Self {
        self.with_transform(Mat4::from_translation(translation))
    }

    /// Calculate bounding box from vertices
    pub fn calculate_bounding_box(&mut self) {
        if self.positions.is_empty() {
            self.bbox_min = [0.0; 3];
            self.bbox_max = [0.0; 3];
            return;
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];

        for v in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }

        self.bbox_min = min;
        self.bbox_max = max;
    }

    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    pub fn scale_rotation_translation(&self) -> (Vec3, Quat, Vec3) {
        self.transform.to_scale_rotation_translation()
    }
}

/// Generate a box mesh with the given dimensions: 8 shared corners,
/// 12 triangles.
pub fn generate_box_mesh(size: Vec3) -> (Vec<[f32; 3]>, Vec<u32>) {
    let h = size * 0.5;
    let positions = vec![
        [-h.x, -h.y, -h.z],
        [h.x, -h.y, -h.z],
        [h.x, h.y, -h.z],
        [-h.x, h.y, -h.z],
        [-h.x, -h.y, h.z],
        [h.x, -h.y, h.z],
        [h.x, h.y, h.z],
        [-h.x, h.y, h.z],
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1, 0, 3, 2, // -Z
        4, 5, 6, 4, 6, 7, // +Z
        0, 1, 5, 0, 5, 4, // -Y
        3, 7, 6, 3, 6, 2, // +Y
        0, 4, 7, 0, 7, 3, // -X
        1, 2, 6, 1, 6, 5, // +X
    ];
    (positions, indices)
}

/// Objects keyed by id, remembering insertion order
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: HashMap<ObjectId, SceneObject>,
    order: Vec<ObjectId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, returns its ID
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        if self.objects.insert(id, object).is_none() {
            self.order.push(id);
        }
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.order.retain(|o| *o != id);
        self.objects.remove(&id)
    }

    /// Find an object by name
    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        self.iter().find(|o| o.name == name)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl TransformStore for Scene {
    fn transform(&self, id: ObjectId) -> Option<Mat4> {
        self.objects.get(&id).map(|o| o.transform)
    }

    fn set_transform(&mut self, id: ObjectId, transform: Mat4) -> bool {
        match self.objects.get_mut(&id) {
            Some(object) => {
                object.transform = transform;
                true
            }
            None => false,
        }
    }
}

impl PickSource for Scene {
    fn pick_mesh(&self, id: ObjectId) -> Option<PickMesh<'_>> {
        let object = self.objects.get(&id)?;
        Some(PickMesh {
            positions: &object.positions,
            indices: &object.indices,
            transform: object.transform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_mesh() {
        let (positions, indices) = generate_box_mesh(Vec3::ONE);
        assert_eq!(positions.len(), 8);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|i| (*i as usize) < positions.len()));
    }

    #[test]
    fn test_cuboid_bounding_box() {
        let object = SceneObject::cuboid("crate", Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(object.bbox_min, [-1.0, -2.0, -3.0]);
        assert_eq!(object.bbox_max, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_scene_keeps_insertion_order() {
        let mut scene = Scene::new();
        let a = scene.add(SceneObject::new("a"));
        let b = scene.add(SceneObject::new("b"));
        let c = scene.add(SceneObject::new("c"));
        scene.remove(b);
        assert_eq!(scene.ids(), &[a, c]);
        assert_eq!(scene.find("c").map(|o| o.id), Some(c));
        assert!(scene.find("b").is_none());
    }

    #[test]
    fn test_transform_store() {
        let mut scene = Scene::new();
        let id = scene.add(SceneObject::new("a").with_translation(Vec3::X));
        assert_eq!(scene.transform(id), Some(Mat4::from_translation(Vec3::X)));
        assert!(scene.set_transform(id, Mat4::IDENTITY));
        assert_eq!(scene.get(id).unwrap().position(), Vec3::ZERO);
        assert!(!scene.set_transform(ObjectId::new(), Mat4::IDENTITY));
    }
}
