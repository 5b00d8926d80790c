//! Gizmo session: hover, arm, drag, commit and cancel
//!
//! One session owns the selection, the arm-time snapshots and the axis
//! flags for whichever gizmo mode is current, so only one gizmo can ever be
//! active. Each frame the host calls [`GizmoSession::update`] and then
//! [`GizmoSession::render`].
//!
//! ```text
//! Inactive --enable--> Hover --press on axis--> Active --release--> Hover
//!                        ^                        |
//!                        +--------escape----------+
//! ```

use glam::{Mat4, Vec2, Vec3};

use super::{
    AxisSelection, DragFrame, DragState, GizmoGeometry, GizmoMode, GizmoPart, GizmoPlacement,
    GizmoSpace, ViewportMode, manipulator_for, resolve_axes, screen_direction,
};
use crate::camera::Camera;
use crate::color::PickColor;
use crate::config::{GizmoConfig, ManipulationConfig, PickConfig};
use crate::constants::gizmo::colors;
use crate::history::{Transaction, TransformChange, UndoSink};
use crate::input::FrameInput;
use crate::picker::{PickError, PickTarget, Picker, Region};
use crate::scene::{ObjectId, TransformStore};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoState {
    /// Nothing selected, gizmo hidden
    #[default]
    Inactive,
    /// Gizmo visible, hover re-resolved every frame
    Hover,
    /// Dragging with frozen axis flags
    Active,
}

/// What one call to [`GizmoSession::update`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Gizmo not enabled
    Idle,
    /// Hover resolved to the given axes (possibly none)
    Hovering(AxisSelection),
    /// Mouse-down on an axis started a drag
    Armed,
    /// Live transforms were updated
    Dragged,
    /// Drag ended with a change and one transaction was committed
    Committed,
    /// Drag ended without changing the primary object
    Released,
    /// Escape restored the snapshots
    Cancelled,
}

/// Everything needed to draw the visible gizmo for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoDrawData {
    pub mode: GizmoMode,
    pub world_matrix: Mat4,
    /// Display color per part, indexed by [`GizmoPart::index`]
    pub part_colors: [[f32; 4]; 7],
}

pub struct GizmoSession {
    manipulation: ManipulationConfig,
    pick: PickConfig,
    mode: GizmoMode,
    space: GizmoSpace,
    state: GizmoState,
    geometry: GizmoGeometry,
    /// Primary object first
    selection: Vec<ObjectId>,
    /// Index-aligned with `selection`
    snapshots: Vec<Mat4>,
    axes: AxisSelection,
    drag: DragState,
}

impl GizmoSession {
    pub fn new(config: &GizmoConfig) -> Self {
        let mode = GizmoMode::default();
        Self {
            manipulation: config.manipulation,
            pick: config.pick,
            mode,
            space: GizmoSpace::default(),
            state: GizmoState::Inactive,
            geometry: GizmoGeometry::for_mode(mode),
            selection: Vec::new(),
            snapshots: Vec::new(),
            axes: AxisSelection::NONE,
            drag: DragState::default(),
        }
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    /// Switch gizmo kind. Refused while a drag is in progress.
    pub fn set_mode(&mut self, mode: GizmoMode) -> bool {
        if self.state == GizmoState::Active {
            tracing::warn!(
                from = self.mode.display_name(),
                to = mode.display_name(),
                "Cannot switch gizmo mode during a drag"
            );
            return false;
        }
        if mode != self.mode {
            self.mode = mode;
            self.geometry = GizmoGeometry::for_mode(mode);
            self.axes = AxisSelection::NONE;
        }
        true
    }

    pub fn space(&self) -> GizmoSpace {
        self.space
    }

    pub fn set_space(&mut self, space: GizmoSpace) {
        self.space = space;
    }

    pub fn state(&self) -> GizmoState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == GizmoState::Active
    }

    pub fn axes(&self) -> AxisSelection {
        self.axes
    }

    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    pub fn primary(&self) -> Option<ObjectId> {
        self.selection.first().copied()
    }

    pub fn snapshots(&self) -> &[Mat4] {
        &self.snapshots
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn geometry(&self) -> &GizmoGeometry {
        &self.geometry
    }

    pub fn manipulation_config(&self) -> &ManipulationConfig {
        &self.manipulation
    }

    /// Show the gizmo on `objects` (the first one is primary) and snapshot
    /// their transforms. Objects unknown to `store` are skipped.
    ///
    /// Returns `false` and changes nothing for an empty selection or while
    /// a drag is in progress.
    pub fn enable(&mut self, objects: &[ObjectId], store: &impl TransformStore) -> bool {
        if self.state == GizmoState::Active {
            tracing::warn!("Cannot change gizmo selection during a drag");
            return false;
        }

        let (selection, snapshots): (Vec<_>, Vec<_>) = objects
            .iter()
            .filter_map(|id| store.transform(*id).map(|m| (*id, m)))
            .unzip();
        if selection.is_empty() {
            tracing::warn!(requested = objects.len(), "Gizmo enabled with empty selection");
            return false;
        }
        if selection.len() != objects.len() {
            tracing::warn!(
                requested = objects.len(),
                found = selection.len(),
                "Some selected objects have no transform"
            );
        }

        tracing::debug!(
            mode = self.mode.display_name(),
            objects = selection.len(),
            "Gizmo enabled"
        );
        self.selection = selection;
        self.snapshots = snapshots;
        self.axes = AxisSelection::NONE;
        self.drag = DragState::default();
        self.state = GizmoState::Hover;
        true
    }

    /// Hide the gizmo. An in-progress drag is rolled back first.
    pub fn disable(&mut self, store: &mut impl TransformStore) {
        if self.state == GizmoState::Active {
            self.restore_snapshots(store);
            tracing::debug!("Drag rolled back on disable");
        }
        self.selection.clear();
        self.snapshots.clear();
        self.axes = AxisSelection::NONE;
        self.drag = DragState::default();
        self.state = GizmoState::Inactive;
    }

    /// Advance one frame
    pub fn update<T, S, U>(
        &mut self,
        input: &FrameInput,
        camera: &Camera,
        picker: &mut Picker<T>,
        store: &mut S,
        undo: &mut U,
    ) -> UpdateOutcome
    where
        T: PickTarget,
        S: TransformStore,
        U: UndoSink,
    {
        match self.state {
            GizmoState::Inactive => UpdateOutcome::Idle,
            GizmoState::Hover => {
                let Some(primary) = self.primary_transform(store) else {
                    tracing::warn!("Primary object vanished, disabling gizmo");
                    self.disable(store);
                    return UpdateOutcome::Idle;
                };
                self.resolve_hover(input, camera, picker, primary);

                if input.left_just_pressed && !input.alt_held && self.axes.any() {
                    self.arm(store);
                    UpdateOutcome::Armed
                } else {
                    UpdateOutcome::Hovering(self.axes)
                }
            }
            GizmoState::Active => {
                if input.escape_just_pressed {
                    self.cancel(store);
                    UpdateOutcome::Cancelled
                } else if input.left_just_released || !input.left_pressed {
                    self.release(store, undo)
                } else {
                    self.apply_drag(input, camera, store);
                    UpdateOutcome::Dragged
                }
            }
        }
    }

    /// Draw data for the visible gizmo, `None` while inactive.
    ///
    /// Parts on the selected axes use the highlight color; parts along the
    /// depth axis of an orthographic-style view are fully transparent.
    pub fn render(
        &self,
        camera: &Camera,
        store: &impl TransformStore,
        viewport_mode: ViewportMode,
    ) -> Option<GizmoDrawData> {
        if self.state == GizmoState::Inactive {
            return None;
        }
        let primary = self.primary_transform(store)?;
        let placement = self.placement(camera, primary);

        let mut part_colors = [[0.0; 4]; 7];
        for part in GizmoPart::ALL {
            let mut color = if self.is_highlighted(part) {
                colors::HIGHLIGHT
            } else {
                part.display_color()
            };
            if !viewport_mode.shows(part) {
                color[3] = 0.0;
            }
            part_colors[part.index()] = color;
        }

        Some(GizmoDrawData {
            mode: self.mode,
            world_matrix: placement.world_matrix(),
            part_colors,
        })
    }

    fn is_highlighted(&self, part: GizmoPart) -> bool {
        if !self.axes.any() {
            return false;
        }
        let axes = part.axes();
        axes.axes().all(|axis| self.axes.contains(axis))
    }

    fn primary_transform(&self, store: &impl TransformStore) -> Option<Mat4> {
        self.primary().and_then(|id| store.transform(id))
    }

    fn placement(&self, camera: &Camera, primary: Mat4) -> GizmoPlacement {
        GizmoPlacement::compute(
            primary,
            self.space,
            camera.position,
            self.manipulation.scale_divisor,
        )
    }

    /// Draw gizmo parts in palette colors and read back around the cursor
    fn pick_parts<T: PickTarget>(
        &self,
        camera: &Camera,
        picker: &mut Picker<T>,
        placement: &GizmoPlacement,
        cursor: Vec2,
    ) -> Result<Vec<PickColor>, PickError> {
        picker.ensure_capacity()?;

        let world = placement.world_matrix();
        let mut pass = picker.begin_manual_pick(
            camera.view_matrix(),
            camera.projection_matrix(),
            camera.viewport,
        )?;
        for part in &self.geometry.parts {
            pass.render_object(&part.pick_mesh(world), part.part.pick_color());
        }
        pass.finish(Region::around(cursor, self.pick.region_size))
    }

    fn resolve_hover<T: PickTarget>(
        &mut self,
        input: &FrameInput,
        camera: &Camera,
        picker: &mut Picker<T>,
        primary: Mat4,
    ) {
        let placement = self.placement(camera, primary);
        let cursor = camera.viewport.to_local(input.mouse_position);
        match self.pick_parts(camera, picker, &placement, cursor) {
            Ok(pixels) => {
                let axes = resolve_axes(self.mode, &pixels);
                if axes != self.axes {
                    tracing::trace!(?axes, "Gizmo hover changed");
                }
                self.axes = axes;
            }
            Err(e) => {
                tracing::warn!("Gizmo hover skipped: {}", e);
            }
        }
    }

    fn snapshot(&mut self, store: &impl TransformStore) {
        for (id, snapshot) in self.selection.iter().zip(self.snapshots.iter_mut()) {
            if let Some(transform) = store.transform(*id) {
                *snapshot = transform;
            }
        }
    }

    fn restore_snapshots(&self, store: &mut impl TransformStore) {
        for (id, snapshot) in self.selection.iter().zip(&self.snapshots) {
            if !store.set_transform(*id, *snapshot) {
                tracing::warn!(object = %id, "Cannot restore transform of missing object");
            }
        }
    }

    fn arm(&mut self, store: &impl TransformStore) {
        self.snapshot(store);
        self.drag = DragState::default();
        self.state = GizmoState::Active;

        if self.mode == GizmoMode::Rotate && self.axes.count() > 1 {
            tracing::warn!(
                axes = ?self.axes,
                "Rotation armed on several axes, applying them in X, Y, Z order"
            );
        }
        tracing::debug!(
            mode = self.mode.display_name(),
            axes = ?self.axes,
            space = ?self.space,
            "Gizmo armed"
        );
    }

    fn apply_drag(&mut self, input: &FrameInput, camera: &Camera, store: &mut impl TransformStore) {
        if input.mouse_delta == Vec2::ZERO {
            return;
        }
        let Some(primary) = self.primary_transform(store) else {
            return;
        };

        let placement = self.placement(camera, primary);
        let directions = [
            screen_direction(camera, &placement, Vec3::X),
            screen_direction(camera, &placement, Vec3::Y),
            screen_direction(camera, &placement, Vec3::Z),
        ];
        let frame = DragFrame {
            mouse_delta: input.mouse_delta,
            axes: self.axes,
            directions,
            placement,
            config: self.manipulation,
        };

        let manipulator = manipulator_for(self.mode);
        manipulator.accumulate(&mut self.drag, &frame);

        for (id, snapshot) in self.selection.iter().zip(&self.snapshots) {
            let transform =
                manipulator.apply(*snapshot, &self.drag, self.space, &self.manipulation);
            if !store.set_transform(*id, transform) {
                tracing::warn!(object = %id, "Dragged object no longer exists");
            }
        }
    }

    fn cancel(&mut self, store: &mut impl TransformStore) {
        self.restore_snapshots(store);
        self.drag = DragState::default();
        self.state = GizmoState::Hover;
        tracing::debug!(mode = self.mode.display_name(), "Gizmo drag cancelled");
    }

    fn release(
        &mut self,
        store: &mut impl TransformStore,
        undo: &mut impl UndoSink,
    ) -> UpdateOutcome {
        self.state = GizmoState::Hover;
        self.drag = DragState::default();

        let changed = match (self.primary_transform(store), self.snapshots.first()) {
            (Some(current), Some(snapshot)) => current != *snapshot,
            _ => false,
        };
        if !changed {
            return UpdateOutcome::Released;
        }

        let changes: Vec<TransformChange> = self
            .selection
            .iter()
            .zip(&self.snapshots)
            .filter_map(|(id, before)| {
                store.transform(*id).map(|after| TransformChange {
                    object: *id,
                    before: *before,
                    after,
                })
            })
            .collect();
        let label = match changes.len() {
            1 => format!("{} 1 object", self.mode.display_name()),
            n => format!("{} {} objects", self.mode.display_name(), n),
        };
        tracing::debug!(%label, "Gizmo drag committed");
        undo.commit(Transaction::new(label, changes));

        self.snapshot(store);
        UpdateOutcome::Committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Viewport;
    use crate::gizmo::Axis;
    use crate::history::History;
    use crate::picker::SoftwarePickTarget;
    use crate::scene::{Scene, SceneObject};

    const CENTER: Vec2 = Vec2::new(400.0, 300.0);
    // About 35 px right of center lies on the X arrow shaft
    const ON_X_ARROW: Vec2 = Vec2::new(435.0, 300.0);

    struct Fixture {
        scene: Scene,
        picker: Picker<SoftwarePickTarget>,
        history: History,
        camera: Camera,
        session: GizmoSession,
        object: ObjectId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut scene = Scene::new();
            let object = scene.add(SceneObject::cuboid("box", Vec3::ONE));
            // Looking along +Y with Z up: +X is screen right, +Z is screen up
            let camera = Camera::looking_at(
                Vec3::new(0.0, -14.0, 0.0),
                Vec3::ZERO,
                Vec3::Z,
                Viewport::new(800.0, 600.0),
            );
            Self {
                scene,
                picker: Picker::new(SoftwarePickTarget::new()),
                history: History::new(),
                camera,
                session: GizmoSession::new(&GizmoConfig::default()),
                object,
            }
        }

        fn step(&mut self, input: FrameInput) -> UpdateOutcome {
            self.session.update(
                &input,
                &self.camera,
                &mut self.picker,
                &mut self.scene,
                &mut self.history,
            )
        }
    }

    #[test]
    fn test_inactive_session_is_idle() {
        let mut f = Fixture::new();
        assert_eq!(f.step(FrameInput::hover(CENTER)), UpdateOutcome::Idle);
        assert!(f.session.render(&f.camera, &f.scene, ViewportMode::Perspective).is_none());
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let mut f = Fixture::new();
        assert!(!f.session.enable(&[], &f.scene));
        assert!(!f.session.enable(&[ObjectId::new()], &f.scene));
        assert_eq!(f.session.state(), GizmoState::Inactive);
    }

    #[test]
    fn test_hover_center_selects_all_axes() {
        let mut f = Fixture::new();
        assert!(f.session.enable(&[f.object], &f.scene));
        assert_eq!(
            f.step(FrameInput::hover(CENTER)),
            UpdateOutcome::Hovering(AxisSelection::ALL)
        );
    }

    #[test]
    fn test_hover_arrow_selects_axis() {
        let mut f = Fixture::new();
        f.session.enable(&[f.object], &f.scene);
        f.step(FrameInput::hover(ON_X_ARROW));
        assert_eq!(f.session.axes(), AxisSelection::single(Axis::X));
    }

    #[test]
    fn test_hover_empty_space_selects_nothing() {
        let mut f = Fixture::new();
        f.session.enable(&[f.object], &f.scene);
        assert_eq!(
            f.step(FrameInput::hover(Vec2::new(100.0, 100.0))),
            UpdateOutcome::Hovering(AxisSelection::NONE)
        );
        assert_eq!(
            f.step(FrameInput::press(Vec2::new(100.0, 100.0))),
            UpdateOutcome::Hovering(AxisSelection::NONE)
        );
        assert_eq!(f.session.state(), GizmoState::Hover);
    }

    #[test]
    fn test_alt_press_does_not_arm() {
        let mut f = Fixture::new();
        f.session.enable(&[f.object], &f.scene);
        let outcome = f.step(FrameInput::press(CENTER).with_alt());
        assert_eq!(outcome, UpdateOutcome::Hovering(AxisSelection::ALL));
        assert!(!f.session.is_active());
    }

    #[test]
    fn test_mode_switch_refused_while_active() {
        let mut f = Fixture::new();
        f.session.enable(&[f.object], &f.scene);
        assert_eq!(f.step(FrameInput::press(CENTER)), UpdateOutcome::Armed);
        assert!(!f.session.set_mode(GizmoMode::Rotate));
        assert_eq!(f.session.mode(), GizmoMode::Translate);

        f.step(FrameInput::release(CENTER));
        assert!(f.session.set_mode(GizmoMode::Rotate));
        assert_eq!(f.session.geometry().mode, GizmoMode::Rotate);
    }

    #[test]
    fn test_release_without_motion_commits_nothing() {
        let mut f = Fixture::new();
        f.session.enable(&[f.object], &f.scene);
        f.step(FrameInput::press(CENTER));
        assert_eq!(f.step(FrameInput::release(CENTER)), UpdateOutcome::Released);
        assert!(f.history.is_empty());
    }

    #[test]
    fn test_disable_while_active_rolls_back() {
        let mut f = Fixture::new();
        f.session.enable(&[f.object], &f.scene);
        f.step(FrameInput::press(ON_X_ARROW));
        f.step(FrameInput::drag(ON_X_ARROW + Vec2::new(50.0, 0.0), Vec2::new(50.0, 0.0)));
        assert!(f.scene.get(f.object).unwrap().position().x > 0.0);

        f.session.disable(&mut f.scene);
        assert_eq!(f.scene.get(f.object).unwrap().transform, Mat4::IDENTITY);
        assert_eq!(f.session.state(), GizmoState::Inactive);
        assert!(f.history.is_empty());
    }

    #[test]
    fn test_render_highlights_selected_axis() {
        let mut f = Fixture::new();
        f.session.enable(&[f.object], &f.scene);
        f.step(FrameInput::hover(ON_X_ARROW));
        let data = f
            .session
            .render(&f.camera, &f.scene, ViewportMode::Perspective)
            .unwrap();
        assert_eq!(data.part_colors[GizmoPart::X.index()], colors::HIGHLIGHT);
        assert_eq!(data.part_colors[GizmoPart::Y.index()], colors::Y_AXIS);
        assert_eq!(data.part_colors[GizmoPart::XY.index()], colors::PLANE);
    }

    #[test]
    fn test_render_hides_depth_axis() {
        let mut f = Fixture::new();
        f.session.enable(&[f.object], &f.scene);
        let data = f.session.render(&f.camera, &f.scene, ViewportMode::Top).unwrap();
        assert_eq!(data.part_colors[GizmoPart::Z.index()][3], 0.0);
        assert_eq!(data.part_colors[GizmoPart::XZ.index()][3], 0.0);
        assert_eq!(data.part_colors[GizmoPart::X.index()], colors::X_AXIS);
        assert!(data.part_colors[GizmoPart::All.index()][3] > 0.0);
    }

    #[test]
    fn test_render_places_gizmo_on_primary() {
        let mut f = Fixture::new();
        let moved = f.scene.add(
            SceneObject::cuboid("moved", Vec3::ONE).with_translation(Vec3::new(1.0, 2.0, 3.0)),
        );
        f.session.enable(&[moved, f.object], &f.scene);
        let data = f
            .session
            .render(&f.camera, &f.scene, ViewportMode::Perspective)
            .unwrap();
        assert_eq!(data.world_matrix.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }
}
