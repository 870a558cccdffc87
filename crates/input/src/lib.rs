//! Input state owned by the render loop.
//!
//! Window callbacks only record key and pointer events here; the loop then
//! calls [`InputState::process_input`] once per tick to move the camera.

mod key;
mod state;

pub use key::{Key, UnknownKey};
pub use state::{InputState, ModeChange};
