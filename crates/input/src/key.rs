use std::fmt;
use std::str::FromStr;

use terrascape_camera::Direction;

/// Logical keys the viewer reacts to, named after physical key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    KeyW,
    KeyA,
    KeyS,
    KeyD,
    Space,
    ShiftLeft,
    /// Toggles movement mode.
    KeyF,
    /// Leaves movement mode.
    Escape,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown key name: {0:?}")]
pub struct UnknownKey(pub String);

impl Key {
    pub const ALL: [Key; 8] = [
        Key::KeyW,
        Key::KeyA,
        Key::KeyS,
        Key::KeyD,
        Key::Space,
        Key::ShiftLeft,
        Key::KeyF,
        Key::Escape,
    ];

    /// Movement keys in the order their displacements are applied each tick.
    pub const MOVEMENT: [Key; 6] = [
        Key::KeyW,
        Key::KeyS,
        Key::KeyA,
        Key::KeyD,
        Key::Space,
        Key::ShiftLeft,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Key::KeyW => "KeyW",
            Key::KeyA => "KeyA",
            Key::KeyS => "KeyS",
            Key::KeyD => "KeyD",
            Key::Space => "Space",
            Key::ShiftLeft => "ShiftLeft",
            Key::KeyF => "KeyF",
            Key::Escape => "Escape",
        }
    }

    /// Camera direction bound to this key, if it is a movement key.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Key::KeyW => Some(Direction::Forward),
            Key::KeyS => Some(Direction::Backward),
            Key::KeyA => Some(Direction::Left),
            Key::KeyD => Some(Direction::Right),
            Key::Space => Some(Direction::Up),
            Key::ShiftLeft => Some(Direction::Down),
            Key::KeyF | Key::Escape => None,
        }
    }
}

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownKey(s.to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
