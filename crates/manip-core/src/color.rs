//! Pick colors
//!
//! Two color schemes share the pick target:
//!
//! - **Enumerated colors** identify registered scene objects. Index `i` is
//!   encoded as the 24-bit value `i + 1`, filling red first, then green, then
//!   blue, so black stays free as the background.
//! - **Palette colors** identify gizmo parts and are fixed constants
//!   (pure red/green/blue, their pairwise mixes and white).
//!
//! The two schemes overlap numerically, so a single pick pass must only ever
//! draw one of them.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::constants::pick::COLOR_CAPACITY;

/// An opaque 8-bit-per-channel pick color
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct PickColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PickColor {
    /// Reserved "no hit" color
    pub const BACKGROUND: Self = Self::new(0, 0, 0);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);
    pub const YELLOW: Self = Self::new(255, 255, 0);
    pub const MAGENTA: Self = Self::new(255, 0, 255);
    pub const CYAN: Self = Self::new(0, 255, 255);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color assigned to the object at `index` in registration order.
    ///
    /// Returns `None` once the 24-bit color space is exhausted.
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= COLOR_CAPACITY {
            return None;
        }
        let value = index + 1;
        Some(Self {
            r: (value % 256) as u8,
            g: ((value / 256) % 256) as u8,
            b: (value / (256 * 256)) as u8,
        })
    }

    /// Inverse of [`PickColor::from_index`]. The background maps to `None`.
    pub fn to_index(self) -> Option<usize> {
        let value = self.r as usize + self.g as usize * 256 + self.b as usize * 256 * 256;
        value.checked_sub(1)
    }

    /// Build from an RGBA8 readback texel, ignoring alpha
    pub fn from_rgba8(texel: [u8; 4]) -> Self {
        Self::new(texel[0], texel[1], texel[2])
    }

    /// Normalized RGBA for shader uniforms (alpha is always 1)
    pub fn to_rgba_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            1.0,
        ]
    }

    pub fn is_background(self) -> bool {
        self == Self::BACKGROUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_fills_red_first() {
        assert_eq!(PickColor::from_index(0), Some(PickColor::new(1, 0, 0)));
        assert_eq!(PickColor::from_index(254), Some(PickColor::new(255, 0, 0)));
        assert_eq!(PickColor::from_index(255), Some(PickColor::new(0, 1, 0)));
        assert_eq!(PickColor::from_index(65535), Some(PickColor::new(0, 0, 1)));
    }

    #[test]
    fn test_enumeration_never_yields_background() {
        for index in 0..2000 {
            let color = PickColor::from_index(index).unwrap();
            assert!(!color.is_background());
            assert_eq!(color.to_index(), Some(index));
        }
    }

    #[test]
    fn test_background_has_no_index() {
        assert_eq!(PickColor::BACKGROUND.to_index(), None);
    }

    #[test]
    fn test_capacity_boundary() {
        assert_eq!(
            PickColor::from_index(COLOR_CAPACITY - 1),
            Some(PickColor::WHITE)
        );
        assert_eq!(PickColor::from_index(COLOR_CAPACITY), None);
    }

    #[test]
    fn test_rgba_conversions() {
        let color = PickColor::from_rgba8([255, 0, 128, 7]);
        assert_eq!(color, PickColor::new(255, 0, 128));
        let rgba = PickColor::CYAN.to_rgba_f32();
        assert_eq!(rgba, [0.0, 1.0, 1.0, 1.0]);
    }
}
