//! Axis selection from pick readback
//!
//! The hover pass draws gizmo parts in their palette colors and reads back a
//! small region around the cursor. The scan below turns that region into
//! three axis flags.
//!
//! Translate and scale gizmos start optimistic (all flags set) and only ever
//! narrow within one scan:
//!
//! - white (center handle) sets all flags and stops the scan,
//! - a pure axis color sets exactly that flag, overriding earlier results,
//! - a plane color sets its two flags, but only while all three are still set.
//!
//! If the scan ends with all flags set and no white pixel was seen, nothing
//! was hit and every flag is cleared. The result depends on scan order
//! (row-major).
//!
//! Rotate gizmos only have single-axis rings, start with no flags set and
//! take pure axis colors alone.

use super::{Axis, GizmoMode};
use crate::color::PickColor;

/// Which of the three gizmo axes are selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisSelection {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisSelection {
    pub const NONE: Self = Self::new(false, false, false);
    pub const ALL: Self = Self::new(true, true, true);

    pub const fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    pub fn single(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::new(true, false, false),
            Axis::Y => Self::new(false, true, false),
            Axis::Z => Self::new(false, false, true),
        }
    }

    pub fn contains(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Selected axes in X, Y, Z order
    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::ALL.into_iter().filter(|axis| self.contains(*axis))
    }

    pub fn count(&self) -> usize {
        self.x as usize + self.y as usize + self.z as usize
    }

    pub fn is_none(&self) -> bool {
        self.count() == 0
    }

    pub fn any(&self) -> bool {
        self.count() > 0
    }

    /// Exactly one axis: single-axis drag
    pub fn is_single(&self) -> bool {
        self.count() == 1
    }

    /// Exactly two axes: planar drag
    pub fn is_plane(&self) -> bool {
        self.count() == 2
    }

    /// All three axes: uniform / free drag
    pub fn is_all(&self) -> bool {
        self.count() == 3
    }
}

/// Resolve the hovered axes for `mode` from a row-major pixel region
pub fn resolve_axes(mode: GizmoMode, pixels: &[PickColor]) -> AxisSelection {
    match mode {
        GizmoMode::Translate | GizmoMode::Scale => resolve_handles(pixels),
        GizmoMode::Rotate => resolve_rings(pixels),
    }
}

fn resolve_handles(pixels: &[PickColor]) -> AxisSelection {
    let mut selection = AxisSelection::ALL;

    for &pixel in pixels {
        match pixel {
            PickColor::WHITE => return AxisSelection::ALL,
            PickColor::RED => selection = AxisSelection::single(Axis::X),
            PickColor::GREEN => selection = AxisSelection::single(Axis::Y),
            PickColor::BLUE => selection = AxisSelection::single(Axis::Z),
            PickColor::YELLOW if selection.is_all() => {
                selection = AxisSelection::new(true, true, false);
            }
            PickColor::MAGENTA if selection.is_all() => {
                selection = AxisSelection::new(true, false, true);
            }
            PickColor::CYAN if selection.is_all() => {
                selection = AxisSelection::new(false, true, true);
            }
            _ => {}
        }
    }

    // All set without the center handle means nothing was hit
    if selection.is_all() {
        AxisSelection::NONE
    } else {
        selection
    }
}

fn resolve_rings(pixels: &[PickColor]) -> AxisSelection {
    let mut selection = AxisSelection::NONE;

    for &pixel in pixels {
        match pixel {
            PickColor::RED => selection = AxisSelection::single(Axis::X),
            PickColor::GREEN => selection = AxisSelection::single(Axis::Y),
            PickColor::BLUE => selection = AxisSelection::single(Axis::Z),
            _ => {}
        }
    }

    selection
}
