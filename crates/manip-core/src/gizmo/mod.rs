//! Transform gizmos
//!
//! Translate, rotate and scale manipulators in the Softimage XSI style:
//! single-axis handles, two-axis plane handles and an all-axes center
//! handle, picked through the color-index picker.
//!
//! # Module Structure
//!
//! ```text
//! gizmo/
//! ├── geometry.rs     # Per-part gizmo meshes
//! ├── resolver.rs     # Pixel readback -> axis selection
//! ├── direction.rs    # Placement and screen-space axis directions
//! ├── manipulator.rs  # Translate / Rotate / Scale strategies
//! └── session.rs      # Hover / arm / drag / commit / cancel lifecycle
//! ```

mod direction;
mod geometry;
mod manipulator;
mod resolver;
mod session;

pub use direction::{GizmoPlacement, gizmo_scale, screen_direction};
pub use geometry::{GizmoGeometry, GizmoVertex, PartMesh};
pub use manipulator::{DragFrame, DragState, Manipulator, manipulator_for};
pub use resolver::{AxisSelection, resolve_axes};
pub use session::{GizmoDrawData, GizmoSession, GizmoState, UpdateOutcome};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::color::PickColor;
use crate::constants::gizmo::colors;

/// Gizmo mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

impl GizmoMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            GizmoMode::Translate => "Translate",
            GizmoMode::Rotate => "Rotate",
            GizmoMode::Scale => "Scale",
        }
    }
}

/// Gizmo coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GizmoSpace {
    #[default]
    Global,
    Local,
}

impl GizmoSpace {
    pub fn toggled(self) -> Self {
        match self {
            GizmoSpace::Global => GizmoSpace::Local,
            GizmoSpace::Local => GizmoSpace::Global,
        }
    }
}

/// A single gizmo axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn direction(&self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Pickable sub-part of a gizmo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GizmoPart {
    X,
    Y,
    Z,
    XY,
    YZ,
    XZ,
    /// Center handle acting on all three axes
    All,
}

impl GizmoPart {
    pub const ALL: [GizmoPart; 7] = [
        GizmoPart::X,
        GizmoPart::Y,
        GizmoPart::Z,
        GizmoPart::XY,
        GizmoPart::YZ,
        GizmoPart::XZ,
        GizmoPart::All,
    ];

    /// Fixed pick color of this part
    pub fn pick_color(&self) -> PickColor {
        match self {
            GizmoPart::X => PickColor::RED,
            GizmoPart::Y => PickColor::GREEN,
            GizmoPart::Z => PickColor::BLUE,
            GizmoPart::XY => PickColor::YELLOW,
            GizmoPart::XZ => PickColor::MAGENTA,
            GizmoPart::YZ => PickColor::CYAN,
            GizmoPart::All => PickColor::WHITE,
        }
    }

    pub fn from_pick_color(color: PickColor) -> Option<Self> {
        GizmoPart::ALL
            .into_iter()
            .find(|part| part.pick_color() == color)
    }

    /// Axes this part acts on
    pub fn axes(&self) -> AxisSelection {
        match self {
            GizmoPart::X => AxisSelection::single(Axis::X),
            GizmoPart::Y => AxisSelection::single(Axis::Y),
            GizmoPart::Z => AxisSelection::single(Axis::Z),
            GizmoPart::XY => AxisSelection::new(true, true, false),
            GizmoPart::YZ => AxisSelection::new(false, true, true),
            GizmoPart::XZ => AxisSelection::new(true, false, true),
            GizmoPart::All => AxisSelection::ALL,
        }
    }

    /// Index into per-part color tables
    pub fn index(&self) -> usize {
        match self {
            GizmoPart::X => 0,
            GizmoPart::Y => 1,
            GizmoPart::Z => 2,
            GizmoPart::XY => 3,
            GizmoPart::YZ => 4,
            GizmoPart::XZ => 5,
            GizmoPart::All => 6,
        }
    }

    /// Display color when not highlighted
    pub fn display_color(&self) -> [f32; 4] {
        match self {
            GizmoPart::X => colors::X_AXIS,
            GizmoPart::Y => colors::Y_AXIS,
            GizmoPart::Z => colors::Z_AXIS,
            GizmoPart::XY | GizmoPart::YZ | GizmoPart::XZ => colors::PLANE,
            GizmoPart::All => colors::CENTER,
        }
    }
}

/// How the hosting viewport looks at the scene.
///
/// The orthographic-style views hide the axis pointing into the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewportMode {
    #[default]
    Perspective,
    Top,
    Front,
    Side,
}

impl ViewportMode {
    /// Axis along the viewing direction, if any
    pub fn hidden_axis(&self) -> Option<Axis> {
        match self {
            ViewportMode::Perspective => None,
            ViewportMode::Top => Some(Axis::Z),
            ViewportMode::Front => Some(Axis::X),
            ViewportMode::Side => Some(Axis::Y),
        }
    }

    /// Whether `part` is drawn in this viewport
    pub fn shows(&self, part: GizmoPart) -> bool {
        match (self.hidden_axis(), part) {
            (None, _) | (_, GizmoPart::All) => true,
            (Some(axis), part) => !part.axes().contains(axis),
        }
    }
}
