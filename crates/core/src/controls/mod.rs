use serde::{Deserialize, Serialize};

/// Step applied by the speed keys, matching the slider granularity.
pub const SPEED_STEP_MS: u64 = 100;

/// User-facing control surface of the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlCommand {
    TogglePlay,
    Reset,
    SetSpeed(u64),
    /// Shorter tick interval by one step.
    Faster,
    /// Longer tick interval by one step.
    Slower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Char(char),
    Other,
}

impl ControlCommand {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Space => Some(Self::TogglePlay),
            Key::Char('r' | 'R') => Some(Self::Reset),
            Key::Char('+' | '=') => Some(Self::Faster),
            Key::Char('-' | '_') => Some(Self::Slower),
            _ => None,
        }
    }
}
