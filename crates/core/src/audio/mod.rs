use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

/// Signals sent to the audio collaborator on playback transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Start,
    Pause,
    Stop,
    SeekToStart,
}

/// Audio capability owned by the playback controller. The core never plays
/// sound itself; it only tells the collaborator what to do.
pub trait AudioSync {
    fn cue(&mut self, cue: AudioCue);

    /// Releases whatever the collaborator holds. Called once when the
    /// controller is dropped.
    fn release(&mut self) {}
}

/// No audio attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl AudioSync for Silent {
    fn cue(&mut self, _cue: AudioCue) {}
}

/// Records every cue. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct CueLog {
    shared: Rc<RefCell<CueLogState>>,
}

#[derive(Debug, Default)]
struct CueLogState {
    cues: Vec<AudioCue>,
    released: bool,
}

impl CueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.shared.borrow().cues.clone()
    }

    /// Returns and forgets the cues recorded so far.
    pub fn take(&self) -> Vec<AudioCue> {
        std::mem::take(&mut self.shared.borrow_mut().cues)
    }

    pub fn is_released(&self) -> bool {
        self.shared.borrow().released
    }
}

impl AudioSync for CueLog {
    fn cue(&mut self, cue: AudioCue) {
        self.shared.borrow_mut().cues.push(cue);
    }

    fn release(&mut self) {
        self.shared.borrow_mut().released = true;
    }
}
