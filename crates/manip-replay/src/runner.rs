//! Script execution against a headless gizmo session

use std::collections::HashMap;

use glam::{EulerRot, Vec2};
use manip_core::camera::{Camera, Viewport};
use manip_core::gizmo::{GizmoSession, UpdateOutcome, ViewportMode};
use manip_core::history::History;
use manip_core::input::FrameInput;
use manip_core::picker::{Picker, SoftwarePickTarget};
use manip_core::scene::{ObjectId, Scene, SceneObject};
use serde::Serialize;

use crate::script::{ReplayError, ReplayScript, Step};

/// Result of one step
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    pub index: usize,
    pub step: String,
    pub outcome: String,
}

/// Final state of one object
#[derive(Debug, Clone, Serialize)]
pub struct ObjectReport {
    pub name: String,
    pub translation: [f32; 3],
    /// XYZ Euler angles in degrees
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub frames: Vec<FrameRecord>,
    pub objects: Vec<ObjectReport>,
    pub undo_depth: usize,
    pub can_redo: bool,
}

impl ReplayReport {
    pub fn to_json(&self) -> Result<String, ReplayError> {
        serde_json::to_string_pretty(self).map_err(|e| ReplayError::Report(e.to_string()))
    }

    pub fn object(&self, name: &str) -> Option<&ObjectReport> {
        self.objects.iter().find(|o| o.name == name)
    }
}

pub struct Replay {
    scene: Scene,
    picker: Picker<SoftwarePickTarget>,
    history: History,
    camera: Camera,
    session: GizmoSession,
    names: HashMap<String, ObjectId>,
    cursor: Vec2,
    viewport_mode: ViewportMode,
}

impl Replay {
    pub fn new(script: &ReplayScript) -> Self {
        let viewport = Viewport::new(script.viewport.width, script.viewport.height);
        let camera = Camera::looking_at(
            script.camera.position,
            script.camera.target,
            script.camera.up,
            viewport,
        );

        let mut scene = Scene::new();
        let mut picker =
            Picker::with_capacity(SoftwarePickTarget::new(), script.config.pick.capacity);
        let mut names = HashMap::new();
        for spec in &script.objects {
            let object =
                SceneObject::cuboid(spec.name.clone(), spec.size).with_transform(spec.transform());
            let id = scene.add(object);
            picker.add_object(id);
            if names.insert(spec.name.clone(), id).is_some() {
                tracing::warn!(name = %spec.name, "Duplicate object name, later one wins");
            }
        }

        Self {
            scene,
            picker,
            history: History::with_limit(script.config.history_limit),
            camera,
            session: GizmoSession::new(&script.config),
            names,
            cursor: Vec2::ZERO,
            viewport_mode: ViewportMode::Perspective,
        }
    }

    /// Run every step and build the report
    pub fn run(script: &ReplayScript) -> Result<ReplayReport, ReplayError> {
        let mut replay = Self::new(script);
        let mut frames = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let outcome = replay.step(step)?;
            tracing::debug!(index, ?step, %outcome, "Replay step");
            frames.push(FrameRecord {
                index,
                step: format!("{step:?}"),
                outcome,
            });
        }
        Ok(replay.report(frames))
    }

    fn resolve(&self, name: &str) -> Result<ObjectId, ReplayError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ReplayError::UnknownObject(name.to_string()))
    }

    fn name_of(&self, id: ObjectId) -> &str {
        self.scene.get(id).map(|o| o.name.as_str()).unwrap_or("?")
    }

    fn frame(&mut self, input: FrameInput) -> UpdateOutcome {
        let outcome = self.session.update(
            &input,
            &self.camera,
            &mut self.picker,
            &mut self.scene,
            &mut self.history,
        );
        // Visible gizmo after all state changes of the frame
        if let Some(draw) = self
            .session
            .render(&self.camera, &self.scene, self.viewport_mode)
        {
            tracing::trace!(mode = ?draw.mode, center = ?draw.world_matrix.w_axis, "Gizmo drawn");
        }
        outcome
    }

    fn step(&mut self, step: &Step) -> Result<String, ReplayError> {
        let outcome = match step {
            Step::Enable(names) => {
                let ids = names
                    .iter()
                    .map(|name| self.resolve(name))
                    .collect::<Result<Vec<_>, _>>()?;
                let enabled = self.session.enable(&ids, &self.scene);
                format!("enabled: {enabled}")
            }
            Step::Disable => {
                self.session.disable(&mut self.scene);
                "disabled".to_string()
            }
            Step::Mode(mode) => {
                let switched = self.session.set_mode(*mode);
                format!("mode {}: {switched}", mode.display_name())
            }
            Step::Space(space) => {
                self.session.set_space(*space);
                format!("space {space:?}")
            }
            Step::View(mode) => {
                match mode {
                    ViewportMode::Perspective => {}
                    ViewportMode::Top => self.camera.set_top_view(),
                    ViewportMode::Front => self.camera.set_front_view(),
                    ViewportMode::Side => self.camera.set_side_view(),
                }
                self.viewport_mode = *mode;
                format!("view {mode:?}")
            }
            Step::Orbit { yaw, pitch } => {
                self.camera.orbit(yaw.to_radians(), pitch.to_radians());
                format!("camera at {}", self.camera.position.round())
            }
            Step::Zoom(delta) => {
                self.camera.zoom(*delta);
                format!("camera distance {:.2}", self.camera.distance)
            }
            Step::Hover { x, y } => {
                self.cursor = Vec2::new(*x, *y);
                format!("{:?}", self.frame(FrameInput::hover(self.cursor)))
            }
            Step::Press { x, y, alt } => {
                self.cursor = Vec2::new(*x, *y);
                let mut input = FrameInput::press(self.cursor);
                if *alt {
                    input = input.with_alt();
                }
                format!("{:?}", self.frame(input))
            }
            Step::Drag { dx, dy } => {
                let delta = Vec2::new(*dx, *dy);
                self.cursor += delta;
                format!("{:?}", self.frame(FrameInput::drag(self.cursor, delta)))
            }
            Step::Release => format!("{:?}", self.frame(FrameInput::release(self.cursor))),
            Step::Escape => format!("{:?}", self.frame(FrameInput::escape(self.cursor))),
            Step::Undo | Step::Redo if self.session.is_active() => {
                tracing::warn!(?step, "History step ignored during a drag");
                "ignored".to_string()
            }
            Step::Undo => match self.history.undo(&mut self.scene) {
                Some(label) => format!("undo {label}"),
                None => "nothing to undo".to_string(),
            },
            Step::Redo => match self.history.redo(&mut self.scene) {
                Some(label) => format!("redo {label}"),
                None => "nothing to redo".to_string(),
            },
            Step::Pick { x, y } => match self.picker.pick(&self.scene, &self.camera, *x, *y) {
                Ok(Some(id)) => format!("picked {}", self.name_of(id)),
                Ok(None) => "picked nothing".to_string(),
                Err(e) => {
                    tracing::warn!("Pick failed: {}", e);
                    format!("pick failed: {e}")
                }
            },
        };
        Ok(outcome)
    }

    fn report(&self, frames: Vec<FrameRecord>) -> ReplayReport {
        let objects = self
            .scene
            .iter()
            .map(|object| {
                let (scale, rotation, translation) = object.scale_rotation_translation();
                let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
                ObjectReport {
                    name: object.name.clone(),
                    translation: translation.to_array(),
                    rotation: [x.to_degrees(), y.to_degrees(), z.to_degrees()],
                    scale: scale.to_array(),
                }
            })
            .collect();

        ReplayReport {
            frames,
            objects,
            undo_depth: self.history.len(),
            can_redo: self.history.can_redo(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(steps: &str) -> ReplayScript {
        ReplayScript::from_ron_str(&format!(
            r#"(
                config: (manipulation: (translate_speed: 0.01)),
                camera: (position: (0.0, -14.0, 0.0), target: (0.0, 0.0, 0.0)),
                objects: [
                    (name: "a", size: (1.0, 1.0, 1.0)),
                    (name: "b", size: (1.0, 1.0, 1.0), translation: (5.0, 0.0, 0.0)),
                ],
                steps: [{steps}],
            )"#
        ))
        .unwrap()
    }

    #[test]
    fn test_translate_commit_and_undo() {
        let script = script(
            r#"Enable(["a", "b"]), Hover(x: 435.0, y: 300.0), Press(x: 435.0, y: 300.0),
               Drag(dx: 200.0, dy: 0.0), Release"#,
        );
        let report = Replay::run(&script).unwrap();
        assert_eq!(report.frames[2].outcome, "Armed");
        assert_eq!(report.frames[4].outcome, "Committed");
        assert_eq!(report.undo_depth, 1);
        let a = report.object("a").unwrap();
        let b = report.object("b").unwrap();
        assert!((a.translation[0] - 2.0).abs() < 1e-3);
        assert!((b.translation[0] - 7.0).abs() < 1e-3);

        let mut steps = script.steps.clone();
        steps.push(Step::Undo);
        let undone = Replay::run(&ReplayScript { steps, ..script }).unwrap();
        assert_eq!(undone.object("a").unwrap().translation, [0.0, 0.0, 0.0]);
        assert_eq!(undone.object("b").unwrap().translation, [5.0, 0.0, 0.0]);
        assert!(undone.can_redo);
    }

    #[test]
    fn test_escape_leaves_no_history() {
        let script = script(
            r#"Enable(["a"]), Press(x: 400.0, y: 300.0), Drag(dx: 30.0, dy: 10.0), Escape,
               Undo"#,
        );
        let report = Replay::run(&script).unwrap();
        assert_eq!(report.frames[3].outcome, "Cancelled");
        assert_eq!(report.frames[4].outcome, "nothing to undo");
        assert_eq!(report.object("a").unwrap().translation, [0.0, 0.0, 0.0]);
        assert_eq!(report.undo_depth, 0);
    }

    #[test]
    fn test_pick_step() {
        let script = script("Pick(x: 400, y: 300), Pick(x: 5, y: 5)");
        let report = Replay::run(&script).unwrap();
        assert_eq!(report.frames[0].outcome, "picked a");
        assert_eq!(report.frames[1].outcome, "picked nothing");
    }

    #[test]
    fn test_orbit_flips_screen_axes() {
        // Half a turn puts the camera on +Y, so world +X points screen left
        let script = script(
            r#"Orbit(yaw: 180.0, pitch: 0.0), Enable(["a"]), Hover(x: 365.0, y: 300.0),
               Press(x: 365.0, y: 300.0), Drag(dx: 100.0, dy: 0.0), Release"#,
        );
        let report = Replay::run(&script).unwrap();
        assert!(report.frames[0].outcome.starts_with("camera at"));
        assert_eq!(report.frames[3].outcome, "Armed");
        assert_eq!(report.frames[5].outcome, "Committed");
        let a = report.object("a").unwrap();
        assert!((a.translation[0] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_step() {
        let script = script("Zoom(1.0), Zoom(-1.0)");
        let report = Replay::run(&script).unwrap();
        assert_eq!(report.frames[0].outcome, "camera distance 12.60");
        assert_eq!(report.frames[1].outcome, "camera distance 13.86");
    }

    #[test]
    fn test_unknown_object() {
        let script = script(r#"Enable(["missing"])"#);
        let result = Replay::run(&script);
        assert!(matches!(result, Err(ReplayError::UnknownObject(name)) if name == "missing"));
    }

    #[test]
    fn test_report_json() {
        let script = script(r#"Enable(["a"]), Hover(x: 10.0, y: 10.0)"#);
        let json = Replay::run(&script).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["objects"][0]["name"], "a");
        assert_eq!(value["undo_depth"], 0);
    }
}
