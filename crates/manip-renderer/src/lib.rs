//! wgpu backends for manip-core
//!
//! - [`WgpuPickTarget`] - offscreen pick target implementing
//!   [`manip_core::picker::PickTarget`]
//! - [`GizmoRenderer`] - draws the visible gizmo from
//!   [`manip_core::gizmo::GizmoDrawData`]
//!
//! # Module Structure
//!
//! ```text
//! manip-renderer/
//! ├── pick_target.rs   # Flat-color pass and synchronous readback
//! ├── gizmo.rs         # Visible gizmo pipeline
//! └── shaders/         # pick.wgsl, gizmo.wgsl
//! ```

pub mod gizmo;
pub mod pick_target;

pub use gizmo::{GizmoRenderer, GizmoUniform};
pub use pick_target::{PICK_FORMAT, PickVertex, WgpuPickTarget};
