//! Translate / Rotate / Scale strategies
//!
//! A manipulator turns one frame of mouse movement into accumulated drag
//! amounts, and turns accumulated amounts plus an object's arm-time snapshot
//! into that object's live transform. Amounts are always re-applied to the
//! snapshot, never to the live transform, so a drag cannot compound.

use glam::{Mat4, Quat, Vec2, Vec3};

use super::{Axis, AxisSelection, GizmoMode, GizmoPlacement, GizmoSpace};
use crate::config::ManipulationConfig;

/// Amounts accumulated since the gizmo was armed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    /// Per-axis distance (translate) or degrees (rotate)
    pub amounts: Vec3,
    /// Combined per-axis scale delta relative to the snapshot scale
    pub scale_delta: Vec3,
}

/// Inputs for one frame of dragging
#[derive(Debug, Clone, Copy)]
pub struct DragFrame {
    pub mouse_delta: Vec2,
    pub axes: AxisSelection,
    /// Screen direction per axis, indexed by [`Axis::index`]
    pub directions: [Vec2; 3],
    pub placement: GizmoPlacement,
    pub config: ManipulationConfig,
}

impl DragFrame {
    /// Mouse movement projected onto one axis' screen direction
    pub fn projected(&self, axis: Axis) -> f32 {
        self.mouse_delta.dot(self.directions[axis.index()])
    }
}

pub trait Manipulator: Send + Sync {
    fn mode(&self) -> GizmoMode;

    /// Fold one frame of mouse movement into `drag`
    fn accumulate(&self, drag: &mut DragState, frame: &DragFrame);

    /// Live transform for an object given its arm-time snapshot
    fn apply(
        &self,
        snapshot: Mat4,
        drag: &DragState,
        space: GizmoSpace,
        config: &ManipulationConfig,
    ) -> Mat4;
}

pub struct Translate;
pub struct Rotate;
pub struct Scale;

static TRANSLATE: Translate = Translate;
static ROTATE: Rotate = Rotate;
static SCALE: Scale = Scale;

/// Strategy for a gizmo mode
pub fn manipulator_for(mode: GizmoMode) -> &'static dyn Manipulator {
    match mode {
        GizmoMode::Translate => &TRANSLATE,
        GizmoMode::Rotate => &ROTATE,
        GizmoMode::Scale => &SCALE,
    }
}

impl Manipulator for Translate {
    fn mode(&self) -> GizmoMode {
        GizmoMode::Translate
    }

    fn accumulate(&self, drag: &mut DragState, frame: &DragFrame) {
        let speed = frame.placement.scale * frame.config.translate_speed;
        for axis in frame.axes.axes() {
            drag.amounts[axis.index()] += frame.projected(axis) * speed;
        }
    }

    fn apply(
        &self,
        snapshot: Mat4,
        drag: &DragState,
        space: GizmoSpace,
        _config: &ManipulationConfig,
    ) -> Mat4 {
        let offset = match space {
            GizmoSpace::Global => drag.amounts,
            GizmoSpace::Local => {
                let (_, rotation, _) = snapshot.to_scale_rotation_translation();
                rotation.normalize() * drag.amounts
            }
        };
        Mat4::from_translation(offset) * snapshot
    }
}

impl Manipulator for Rotate {
    fn mode(&self) -> GizmoMode {
        GizmoMode::Rotate
    }

    fn accumulate(&self, drag: &mut DragState, frame: &DragFrame) {
        let divisor = frame.config.rotate_divisor.max(f32::EPSILON);
        for axis in frame.axes.axes() {
            drag.amounts[axis.index()] += frame.projected(axis) / divisor;
        }
    }

    fn apply(
        &self,
        snapshot: Mat4,
        drag: &DragState,
        space: GizmoSpace,
        _config: &ManipulationConfig,
    ) -> Mat4 {
        let (scale, rotation, translation) = snapshot.to_scale_rotation_translation();
        let mut rotation = rotation.normalize();
        for axis in Axis::ALL {
            let degrees = drag.amounts[axis.index()];
            if degrees == 0.0 {
                continue;
            }
            let delta = Quat::from_axis_angle(axis.direction(), degrees.to_radians());
            rotation = match space {
                GizmoSpace::Local => rotation * delta,
                GizmoSpace::Global => delta * rotation,
            };
        }
        Mat4::from_scale_rotation_translation(scale, rotation.normalize(), translation)
    }
}

impl Manipulator for Scale {
    fn mode(&self) -> GizmoMode {
        GizmoMode::Scale
    }

    fn accumulate(&self, drag: &mut DragState, frame: &DragFrame) {
        let selected: Vec<Axis> = frame.axes.axes().collect();
        if selected.is_empty() {
            return;
        }
        let deltas: Vec<f32> = selected
            .iter()
            .map(|axis| frame.projected(*axis) * frame.config.scale_speed)
            .collect();
        let combined = deltas.iter().sum::<f32>() / deltas.len() as f32;
        for axis in selected {
            drag.scale_delta[axis.index()] += combined;
        }
    }

    fn apply(
        &self,
        snapshot: Mat4,
        drag: &DragState,
        _space: GizmoSpace,
        config: &ManipulationConfig,
    ) -> Mat4 {
        let (scale, rotation, translation) = snapshot.to_scale_rotation_translation();
        let factor = (Vec3::ONE + drag.scale_delta).max(Vec3::splat(config.min_scale_factor));
        Mat4::from_scale_rotation_translation(scale * factor, rotation, translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(axes: AxisSelection, mouse_delta: Vec2) -> DragFrame {
        DragFrame {
            mouse_delta,
            axes,
            directions: [Vec2::X, Vec2::NEG_Y, Vec2::new(0.6, 0.8)],
            placement: GizmoPlacement {
                center: Vec3::ZERO,
                orientation: Quat::IDENTITY,
                scale: 2.0,
            },
            config: ManipulationConfig::default(),
        }
    }

    #[test]
    fn test_translate_single_axis() {
        let config = ManipulationConfig::default();
        let mut drag = DragState::default();
        let f = frame(AxisSelection::single(Axis::X), Vec2::new(10.0, 5.0));
        manipulator_for(GizmoMode::Translate).accumulate(&mut drag, &f);
        let expected = 10.0 * 2.0 * config.translate_speed;
        assert_relative_eq!(drag.amounts.x, expected);
        assert_eq!(drag.amounts.y, 0.0);
        assert_eq!(drag.amounts.z, 0.0);
    }

    #[test]
    fn test_translate_plane_sums_axes() {
        let mut drag = DragState::default();
        let f = frame(AxisSelection::new(true, true, false), Vec2::new(10.0, -10.0));
        manipulator_for(GizmoMode::Translate).accumulate(&mut drag, &f);
        assert!(drag.amounts.x > 0.0);
        assert!(drag.amounts.y > 0.0);
        assert_eq!(drag.amounts.z, 0.0);
    }

    #[test]
    fn test_translate_global_and_local() {
        let config = ManipulationConfig::default();
        let drag = DragState {
            amounts: Vec3::new(2.0, 0.0, 0.0),
            ..DragState::default()
        };
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let snapshot = Mat4::from_rotation_translation(rotation, Vec3::new(5.0, 0.0, 0.0));
        let translate = manipulator_for(GizmoMode::Translate);

        let global = translate.apply(snapshot, &drag, GizmoSpace::Global, &config);
        let position = global.w_axis.truncate();
        assert_relative_eq!(position.x, 7.0, epsilon = 1e-5);
        assert_relative_eq!(position.y, 0.0, epsilon = 1e-5);

        let local = translate.apply(snapshot, &drag, GizmoSpace::Local, &config);
        let position = local.w_axis.truncate();
        assert_relative_eq!(position.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(position.y, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotate_uses_divisor() {
        let config = ManipulationConfig::default();
        let mut drag = DragState::default();
        let f = frame(AxisSelection::single(Axis::Z), Vec2::new(30.0, 40.0));
        manipulator_for(GizmoMode::Rotate).accumulate(&mut drag, &f);
        // 30 * 0.6 + 40 * 0.8 = 50
        assert_relative_eq!(drag.amounts.z, 50.0 / config.rotate_divisor, epsilon = 1e-4);
    }

    #[test]
    fn test_rotate_pivots_on_object() {
        let config = ManipulationConfig::default();
        let drag = DragState {
            amounts: Vec3::new(0.0, 0.0, 90.0),
            ..DragState::default()
        };
        let snapshot = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));
        let rotated =
            manipulator_for(GizmoMode::Rotate).apply(snapshot, &drag, GizmoSpace::Global, &config);
        let position = rotated.w_axis.truncate();
        assert_relative_eq!(position.x, 3.0, epsilon = 1e-5);
        let x = rotated.transform_vector3(Vec3::X);
        assert_relative_eq!(x.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotate_local_vs_global_order() {
        let config = ManipulationConfig::default();
        let drag = DragState {
            amounts: Vec3::new(90.0, 0.0, 0.0),
            ..DragState::default()
        };
        let snapshot = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let rotate = manipulator_for(GizmoMode::Rotate);
        let local = rotate.apply(snapshot, &drag, GizmoSpace::Local, &config);
        let global = rotate.apply(snapshot, &drag, GizmoSpace::Global, &config);
        // Local X of the snapshot is world Y; the two spaces disagree
        let local_z = local.transform_vector3(Vec3::Z);
        let global_z = global.transform_vector3(Vec3::Z);
        assert_relative_eq!(local_z.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(global_z.y, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotate_two_axes_applies_x_then_z() {
        use std::f32::consts::FRAC_PI_2;

        let config = ManipulationConfig::default();
        let mut drag = DragState::default();
        let f = frame(AxisSelection::new(true, false, true), Vec2::new(0.0, 0.0));
        manipulator_for(GizmoMode::Rotate).accumulate(&mut drag, &f);
        assert_eq!(drag.amounts, Vec3::ZERO);
        drag.amounts = Vec3::new(90.0, 0.0, 90.0);

        let rx = Quat::from_rotation_x(FRAC_PI_2);
        let rz = Quat::from_rotation_z(FRAC_PI_2);
        let position = Vec3::new(2.0, 0.0, 0.0);
        let snapshot = Mat4::from_translation(position);
        let rotate = manipulator_for(GizmoMode::Rotate);

        // Local: X about the object, then Z about the already-rotated frame
        let local = rotate.apply(snapshot, &drag, GizmoSpace::Local, &config);
        let expected = Mat4::from_rotation_translation(rx * rz, position);
        assert!(local.abs_diff_eq(expected, 1e-5));
        let x = local.transform_vector3(Vec3::X);
        assert_relative_eq!(x.z, 1.0, epsilon = 1e-5);

        // Global: X about world X, then Z about world Z
        let global = rotate.apply(snapshot, &drag, GizmoSpace::Global, &config);
        let expected = Mat4::from_rotation_translation(rz * rx, position);
        assert!(global.abs_diff_eq(expected, 1e-5));
        let x = global.transform_vector3(Vec3::X);
        assert_relative_eq!(x.y, 1.0, epsilon = 1e-5);

        // Z-then-X would give the other space's result
        assert!(!local.abs_diff_eq(global, 1e-3));
        assert_relative_eq!(local.w_axis.truncate().x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(global.w_axis.truncate().x, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_scale_uniform_uses_mean() {
        let config = ManipulationConfig::default();
        let mut drag = DragState::default();
        let f = frame(AxisSelection::ALL, Vec2::new(10.0, 0.0));
        manipulator_for(GizmoMode::Scale).accumulate(&mut drag, &f);
        // Projections: 10, 0, 6
        let expected = (10.0 + 0.0 + 6.0) / 3.0 * config.scale_speed;
        assert_relative_eq!(drag.scale_delta.x, expected, epsilon = 1e-6);
        assert_eq!(drag.scale_delta.x, drag.scale_delta.y);
        assert_eq!(drag.scale_delta.y, drag.scale_delta.z);
    }

    #[test]
    fn test_scale_plane_averages_two() {
        let config = ManipulationConfig::default();
        let mut drag = DragState::default();
        let f = frame(AxisSelection::new(true, false, true), Vec2::new(10.0, 0.0));
        manipulator_for(GizmoMode::Scale).accumulate(&mut drag, &f);
        let expected = (10.0 + 6.0) / 2.0 * config.scale_speed;
        assert_relative_eq!(drag.scale_delta.x, expected, epsilon = 1e-6);
        assert_relative_eq!(drag.scale_delta.z, expected, epsilon = 1e-6);
        assert_eq!(drag.scale_delta.y, 0.0);
    }

    #[test]
    fn test_scale_relative_to_snapshot() {
        let config = ManipulationConfig::default();
        let drag = DragState {
            scale_delta: Vec3::splat(0.5),
            ..DragState::default()
        };
        let snapshot = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::IDENTITY,
            Vec3::new(4.0, 0.0, 0.0),
        );
        let scaled =
            manipulator_for(GizmoMode::Scale).apply(snapshot, &drag, GizmoSpace::Global, &config);
        let (scale, _, translation) = scaled.to_scale_rotation_translation();
        assert_relative_eq!(scale.x, 1.5, epsilon = 1e-5);
        assert_relative_eq!(scale.y, 3.0, epsilon = 1e-5);
        assert_relative_eq!(scale.z, 4.5, epsilon = 1e-5);
        assert_relative_eq!(translation.x, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_scale_factor_is_clamped() {
        let config = ManipulationConfig::default();
        let drag = DragState {
            scale_delta: Vec3::new(-5.0, 0.0, 0.0),
            ..DragState::default()
        };
        let scaled = manipulator_for(GizmoMode::Scale).apply(
            Mat4::IDENTITY,
            &drag,
            GizmoSpace::Global,
            &config,
        );
        let (scale, _, _) = scaled.to_scale_rotation_translation();
        assert_relative_eq!(scale.x, config.min_scale_factor, epsilon = 1e-6);
    }

    #[test]
    fn test_manipulator_modes() {
        for mode in [GizmoMode::Translate, GizmoMode::Rotate, GizmoMode::Scale] {
            assert_eq!(manipulator_for(mode).mode(), mode);
        }
    }
}
