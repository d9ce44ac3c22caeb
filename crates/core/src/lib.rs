//! Core library for the animated ranking bubble chart.
//!
//! Given a table of entities with one score per period, the crate ranks the
//! top entries of a period, maps them through scales derived from the whole
//! table, relaxes their circles into a non-overlapping layout and plays the
//! periods back on a timer. Rendering, timers and audio are collaborators
//! reached through the [`Renderer`], [`Scheduler`] and [`AudioSync`] traits.

pub mod audio;
pub mod config;
pub mod controls;
pub mod error;
pub mod layout;
pub mod playback;
pub mod rank;
pub mod render;
pub mod scale;
pub mod table;
pub mod timeline;

pub use audio::{AudioCue, AudioSync, CueLog, Silent};
pub use config::{
    AudioTrackConfig, CanvasConfig, ChartConfig, LayoutConfig, Margin, PlaybackConfig,
    ScaleConfig,
};
pub use controls::{ControlCommand, Key, SPEED_STEP_MS};
pub use error::{RankChartError, Result};
pub use layout::{LayoutEngine, Point, PositionMap, Relaxed};
pub use playback::{PlaybackController, PlaybackState};
pub use rank::{extract_top_n, Frame, RankedEntry};
pub use render::{FrameDiff, FrameLog, FrameUpdate, Renderer, Sprite};
pub use scale::{LinearScale, PointScale, ScaleSet, Tick, CATEGORY10};
pub use table::{DataTable, EntityMetadata, EntityRecord, Period};
pub use timeline::{ManualScheduler, PlaybackClock, Scheduler, TimerToken};
