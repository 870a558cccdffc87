use std::collections::HashSet;

use terrascape_camera::Camera;

use crate::key::Key;

/// Transition of the movement mode, reported so the window layer can grab
/// or release the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Entered,
    Left,
}

/// Held keys, movement-mode flag and last pointer position.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    camera_mode: bool,
    last_pointer: Option<(f32, f32)>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera_mode(&self) -> bool {
        self.camera_mode
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Record a key transition. `KeyF` toggles movement mode and `Escape`
    /// leaves it; both act on press only.
    pub fn key_event(&mut self, key: Key, pressed: bool) -> Option<ModeChange> {
        if !pressed {
            self.held.remove(&key);
            return None;
        }

        match key {
            Key::KeyF if self.camera_mode => Some(self.leave_camera_mode()),
            Key::KeyF => Some(self.enter_camera_mode()),
            Key::Escape if self.camera_mode => Some(self.leave_camera_mode()),
            Key::Escape => None,
            _ => {
                self.held.insert(key);
                None
            }
        }
    }

    fn enter_camera_mode(&mut self) -> ModeChange {
        self.camera_mode = true;
        self.last_pointer = None;
        tracing::debug!("movement mode entered");
        ModeChange::Entered
    }

    fn leave_camera_mode(&mut self) -> ModeChange {
        self.camera_mode = false;
        self.held.clear();
        self.last_pointer = None;
        tracing::debug!("movement mode left");
        ModeChange::Left
    }

    /// Move the camera for every held movement key, in [`Key::MOVEMENT`]
    /// order. No-op outside movement mode.
    pub fn process_input(&self, camera: &mut Camera, dt: f32) {
        if !self.camera_mode {
            return;
        }
        let held = Key::MOVEMENT.iter().filter(|k| self.held.contains(*k));
        for direction in held.filter_map(|k| k.direction()) {
            camera.move_in(direction, dt);
        }
    }

    /// Absolute pointer position in window coordinates (Y grows downward).
    ///
    /// The first sample after the camera's first-mouse flag is set (or after
    /// re-entering movement mode) only seeds the reference point.
    pub fn pointer_moved(&mut self, camera: &mut Camera, x: f32, y: f32) {
        if !self.camera_mode {
            return;
        }
        let (last_x, last_y) = match self.last_pointer {
            Some(last) if !camera.is_first_mouse() => last,
            _ => {
                camera.unset_first_mouse();
                (x, y)
            }
        };
        self.last_pointer = Some((x, y));
        camera.rotate(x - last_x, last_y - y);
    }

    /// Raw relative motion from a captured pointer (Y grows downward).
    pub fn pointer_delta(&self, camera: &mut Camera, dx: f32, dy: f32) {
        if self.camera_mode {
            camera.rotate(dx, -dy);
        }
    }
}
