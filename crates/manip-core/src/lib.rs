//! Picker-driven transform gizmos
//!
//! Renders scene objects and gizmo parts into an offscreen color-indexed
//! buffer, decodes the pixels under the cursor back into object or axis
//! identity, and turns mouse movement into translation, rotation and scale
//! of one or more selected objects with undoable commits.
//!
//! # Module Structure
//!
//! ```text
//! manip-core/
//! ├── color.rs        # Color enumeration and the fixed gizmo palette
//! ├── picker/         # Picker, PickTarget seam, CPU pick target
//! ├── gizmo/          # Geometry, resolver, screen directions, manipulators, session
//! ├── scene.rs        # Objects and the TransformStore seam
//! ├── history.rs      # Transactions and undo/redo
//! ├── camera.rs       # Orbit camera and viewport
//! ├── input.rs        # Per-frame input snapshot
//! ├── config.rs       # RON configuration
//! └── constants.rs    # Geometry and tuning constants
//! ```

pub mod camera;
pub mod color;
pub mod config;
pub mod constants;
pub mod gizmo;
pub mod history;
pub mod input;
pub mod picker;
pub mod scene;

pub use camera::{Camera, Viewport};
pub use color::PickColor;
pub use config::{ConfigError, GizmoConfig, ManipulationConfig, PickConfig};
pub use gizmo::{
    Axis, AxisSelection, GizmoDrawData, GizmoMode, GizmoPart, GizmoSession, GizmoSpace,
    GizmoState, UpdateOutcome, ViewportMode,
};
pub use history::{History, Transaction, TransformChange, UndoSink};
pub use input::FrameInput;
pub use picker::{
    PickError, PickMesh, PickPass, PickSource, PickTarget, Picker, Region, SoftwarePickTarget,
};
pub use scene::{ObjectId, Scene, SceneObject, TransformStore};
