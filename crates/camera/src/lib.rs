//! Free-fly camera: yaw/pitch orientation, ground-plane movement, view-projection.
//!
//! # Invariants
//! - Pitch stays within [-89°, 89°] after any rotation.
//! - `front`, `right`, `up` are recomputed as an orthonormal set on every rotation.
//! - Horizontal moves never change Y; vertical moves only change Y.

mod camera;

pub use camera::{Camera, CameraSettings, Direction, FAR_PLANE, NEAR_PLANE, PITCH_LIMIT};
