//! Manipulation constants
//!
//! Gizmo geometry dimensions, palettes and tuning defaults shared by the
//! picking pass, the session and the renderer.

/// Gizmo geometry constants (gizmo space, before placement scale)
pub mod gizmo {
    /// Arrow shaft radius
    pub const SHAFT_RADIUS: f32 = 0.02;
    /// Arrow head radius
    pub const HEAD_RADIUS: f32 = 0.06;
    /// Arrow head length
    pub const HEAD_LENGTH: f32 = 0.15;
    /// Total arrow length
    pub const ARROW_LENGTH: f32 = 1.0;
    /// Number of segments for cylindrical geometry
    pub const SEGMENTS: u32 = 8;

    /// Distance of the plane handles from the gizmo origin
    pub const PLANE_HANDLE_OFFSET: f32 = 0.2;
    /// Edge length of the plane handles
    pub const PLANE_HANDLE_SIZE: f32 = 0.2;
    /// Half-size of the center (all axes) handle
    pub const CENTER_HANDLE_HALF_SIZE: f32 = 0.07;

    /// Rotation gizmo ring radius
    pub const RING_RADIUS: f32 = 0.8;
    /// Rotation gizmo ring tube thickness
    pub const RING_THICKNESS: f32 = 0.03;
    /// Number of segments for ring (around the circle)
    pub const RING_SEGMENTS: u32 = 32;
    /// Number of segments for ring tube (cross-section)
    pub const RING_TUBE_SEGMENTS: u32 = 8;

    /// Scale gizmo axis length
    pub const SCALE_AXIS_LENGTH: f32 = 0.8;
    /// Scale gizmo end cube half-size
    pub const SCALE_CUBE_HALF_SIZE: f32 = 0.06;
    /// Distance of the scale plane triangles from the origin
    pub const SCALE_PLANE_EXTENT: f32 = 0.35;

    /// Display colors for gizmo parts (RGBA)
    pub mod colors {
        /// X-axis color (red)
        pub const X_AXIS: [f32; 4] = [1.0, 0.2, 0.2, 1.0];
        /// Y-axis color (green)
        pub const Y_AXIS: [f32; 4] = [0.2, 1.0, 0.2, 1.0];
        /// Z-axis color (blue)
        pub const Z_AXIS: [f32; 4] = [0.2, 0.2, 1.0, 1.0];
        /// Plane handle color
        pub const PLANE: [f32; 4] = [0.8, 0.8, 0.2, 0.5];
        /// Center handle color
        pub const CENTER: [f32; 4] = [0.9, 0.9, 0.9, 1.0];
        /// Hovered or active part color
        pub const HIGHLIGHT: [f32; 4] = [1.0, 0.85, 0.1, 1.0];
    }
}

/// Picking defaults
pub mod pick {
    /// Side length in pixels of the readback region around the cursor
    pub const REGION_SIZE: u32 = 20;
    /// Number of distinct non-background colors in 24 bits
    pub const COLOR_CAPACITY: usize = 256 * 256 * 256 - 1;
}

/// Manipulation tuning defaults
pub mod manipulation {
    /// Camera distance divided by this gives the gizmo placement scale
    pub const SCALE_DIVISOR: f32 = 14.0;
    /// World units per mouse pixel at placement scale 1
    pub const TRANSLATE_SPEED: f32 = 0.015;
    /// Mouse pixels per degree of rotation
    pub const ROTATE_DIVISOR: f32 = 2.0;
    /// Scale delta per mouse pixel along an axis
    pub const SCALE_SPEED: f32 = 0.01;
    /// Smallest allowed per-axis scale factor relative to the snapshot
    pub const MIN_SCALE_FACTOR: f32 = 0.001;
    /// Projected axes shorter than this (pixels) are treated as degenerate
    pub const DEGENERATE_EPSILON: f32 = 1e-4;
}

/// Undo history defaults
pub mod history {
    /// Maximum number of transactions kept on the undo stack
    pub const DEFAULT_LIMIT: usize = 256;
}

/// Camera default parameters
pub mod camera {
    /// Default field of view in degrees
    pub const DEFAULT_FOV_DEGREES: f32 = 40.0;
    /// Default near clipping plane
    pub const DEFAULT_NEAR: f32 = 0.1;
    /// Default far clipping plane
    pub const DEFAULT_FAR: f32 = 100000.0;
}
