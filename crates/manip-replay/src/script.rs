//! Replay script format
//!
//! A script lists the scene, the camera and a sequence of input steps. Each
//! input step becomes one frame of the gizmo session.
//!
//! ```ron
//! (
//!     viewport: (width: 800.0, height: 600.0),
//!     camera: (position: (0.0, -14.0, 0.0), target: (0.0, 0.0, 0.0)),
//!     objects: [(name: "a", size: (1.0, 1.0, 1.0))],
//!     steps: [Enable(["a"]), Press(x: 435.0, y: 300.0), Drag(dx: 100.0, dy: 0.0), Release],
//! )
//! ```

use std::path::Path;

use glam::{EulerRot, Mat4, Quat, Vec3};
use manip_core::config::GizmoConfig;
use manip_core::gizmo::{GizmoMode, GizmoSpace, ViewportMode};
use serde::{Deserialize, Serialize};

/// Replay errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Script parse error: {0}")]
    Parse(String),
    #[error("Unknown object: {0}")]
    UnknownObject(String),
    #[error("Report error: {0}")]
    Report(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportSpec {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportSpec {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSpec {
    pub position: Vec3,
    pub target: Vec3,
    #[serde(default = "default_up")]
    pub up: Vec3,
}

fn default_up() -> Vec3 {
    Vec3::Z
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

/// A cuboid placed in the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    pub size: Vec3,
    #[serde(default)]
    pub translation: Vec3,
    /// XYZ Euler angles in degrees
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl ObjectSpec {
    pub fn transform(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Select objects by name, first is primary
    Enable(Vec<String>),
    Disable,
    Mode(GizmoMode),
    Space(GizmoSpace),
    /// Snap the camera to a view and use its viewport mode for rendering
    View(ViewportMode),
    /// Orbit the camera around its target, in degrees
    Orbit {
        yaw: f32,
        pitch: f32,
    },
    /// Zoom the camera; positive moves closer
    Zoom(f32),
    Hover {
        x: f32,
        y: f32,
    },
    Press {
        x: f32,
        y: f32,
        #[serde(default)]
        alt: bool,
    },
    /// Move the cursor by a delta with the button held
    Drag {
        dx: f32,
        dy: f32,
    },
    Release,
    Escape,
    Undo,
    Redo,
    /// Object pick at a viewport pixel
    Pick {
        x: i32,
        y: i32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub config: GizmoConfig,
    #[serde(default)]
    pub viewport: ViewportSpec,
    pub camera: CameraSpec,
    pub objects: Vec<ObjectSpec>,
    pub steps: Vec<Step>,
}

impl ReplayScript {
    pub fn from_ron_str(content: &str) -> Result<Self, ReplayError> {
        ron::from_str(content).map_err(|e| ReplayError::Parse(e.to_string()))
    }

    /// Load a script from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ReplayError::Io(e.to_string()))?;
        let script = Self::from_ron_str(&content)?;
        tracing::info!(
            path = %path.display(),
            objects = script.objects.len(),
            steps = script.steps.len(),
            "Loaded replay script"
        );
        Ok(script)
    }
}
