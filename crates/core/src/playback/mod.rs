//! Playback state machine.
//!
//! The controller walks the table's periods one tick at a time. Each tick
//! ranks, scales and relaxes the next period, seeded with the positions of the
//! previous frame, and hands the result to the [`Renderer`]. Timers and audio
//! are injected capabilities owned by the controller; every transition that
//! stops playback cancels the pending timer before returning.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    extract_top_n, AudioCue, AudioSync, ChartConfig, ControlCommand, DataTable, FrameDiff,
    FrameUpdate, LayoutEngine, Period, PlaybackConfig, PositionMap, RankChartError, Relaxed,
    Renderer, Result, ScaleSet, Scheduler, TimerToken, SPEED_STEP_MS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Finished,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

pub struct PlaybackController<S: Scheduler, A: AudioSync, R: Renderer> {
    table: DataTable,
    scales: ScaleSet,
    layout: LayoutEngine,
    playback: PlaybackConfig,
    state: PlaybackState,
    index: usize,
    tick_interval: Duration,
    pending: Option<TimerToken>,
    positions: PositionMap,
    shown: Vec<String>,
    scheduler: S,
    audio: A,
    renderer: R,
}

impl<S: Scheduler, A: AudioSync, R: Renderer> PlaybackController<S, A, R> {
    pub fn new(
        table: DataTable,
        config: &ChartConfig,
        scheduler: S,
        audio: A,
        renderer: R,
    ) -> Result<Self> {
        config.validate()?;
        let scales = ScaleSet::from_table(&table, config);
        let layout = LayoutEngine::new(config.layout.clone(), &config.canvas);
        let tick_interval = config
            .playback
            .clamp_interval(config.playback.tick_interval_ms);

        Ok(Self {
            table,
            scales,
            layout,
            playback: config.playback.clone(),
            state: PlaybackState::Idle,
            index: 0,
            tick_interval,
            pending: None,
            positions: PositionMap::new(),
            shown: Vec::new(),
            scheduler,
            audio,
            renderer,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_period(&self) -> &Period {
        &self.table.periods()[self.index]
    }

    pub fn last_index(&self) -> usize {
        self.table.periods().len().saturating_sub(1)
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Ranks, scales and relaxes the period at `index`, seeded with the
    /// positions of the last emitted frame. Does not touch controller state.
    pub fn frame_at(&self, index: usize) -> Result<Relaxed> {
        let period = self
            .table
            .periods()
            .get(index)
            .ok_or_else(|| RankChartError::msg(format!("period index {index} is out of range")))?;
        let frame = extract_top_n(&self.table, period, self.playback.top_n)?;
        let frame = self.scales.annotate(frame)?;
        Ok(self.layout.relax(frame, Some(&self.positions)))
    }

    /// Emits the frame for the current index without changing state.
    pub fn show_current(&mut self) {
        self.emit(self.index);
    }

    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Playing => return,
            PlaybackState::Finished => self.reset(),
            PlaybackState::Idle | PlaybackState::Paused => {}
        }

        self.transition(PlaybackState::Playing);
        self.arm();
        self.audio.cue(AudioCue::Start);
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }

        self.disarm();
        self.transition(PlaybackState::Paused);
        self.audio.cue(AudioCue::Pause);
    }

    pub fn toggle(&mut self) {
        if self.state == PlaybackState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Returns to the first period from any state and shows its frame again
    /// with fresh layout seeds.
    pub fn reset(&mut self) {
        self.disarm();
        self.transition(PlaybackState::Idle);
        self.index = 0;
        self.positions.clear();
        self.shown.clear();
        self.audio.cue(AudioCue::Stop);
        self.audio.cue(AudioCue::SeekToStart);
        self.emit(0);
    }

    /// Sets the interval used by the next scheduled tick. Out-of-range values
    /// are clamped; an already pending tick keeps its deadline.
    pub fn set_speed(&mut self, ms: u64) -> Duration {
        let interval = self.playback.clamp_interval(ms);
        if interval.as_millis() != u128::from(ms) {
            tracing::debug!(requested_ms = ms, applied = ?interval, "clamped tick interval");
        }
        self.tick_interval = interval;
        interval
    }

    pub fn apply(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::TogglePlay => self.toggle(),
            ControlCommand::Reset => self.reset(),
            ControlCommand::SetSpeed(ms) => {
                self.set_speed(ms);
            }
            ControlCommand::Faster => {
                let ms = self.interval_ms().saturating_sub(SPEED_STEP_MS);
                self.set_speed(ms);
            }
            ControlCommand::Slower => {
                let ms = self.interval_ms().saturating_add(SPEED_STEP_MS);
                self.set_speed(ms);
            }
        }
    }

    /// Handles a fired timer. Tokens other than the pending one are ignored.
    pub fn on_timer(&mut self, token: TimerToken) {
        if self.pending != Some(token) {
            tracing::debug!(token = token.id(), "ignoring timer that is not pending");
            return;
        }
        self.pending = None;

        if self.state != PlaybackState::Playing {
            return;
        }

        let last = self.last_index();
        if self.index >= last {
            self.finish();
            return;
        }

        self.index += 1;
        self.emit(self.index);

        if self.index == last {
            self.finish();
        } else {
            self.arm();
        }
    }

    fn finish(&mut self) {
        self.disarm();
        self.transition(PlaybackState::Finished);
        self.audio.cue(AudioCue::Stop);
    }

    fn emit(&mut self, index: usize) {
        let relaxed = match self.frame_at(index) {
            Ok(relaxed) => relaxed,
            Err(err) if err.is_empty_period() => {
                tracing::warn!(index, error = %err, "skipping frame");
                return;
            }
            Err(err) => {
                tracing::error!(index, error = %err, "failed to compute frame");
                return;
            }
        };

        let diff = FrameDiff::between(&self.shown, &relaxed.frame);
        let update = FrameUpdate::new(index, &relaxed.frame, &self.scales, diff);

        self.shown = relaxed.frame.ids().map(str::to_string).collect();
        self.positions = relaxed.positions;
        self.renderer.present(update);
    }

    fn arm(&mut self) {
        self.disarm();
        self.pending = Some(self.scheduler.schedule(self.tick_interval));
    }

    fn disarm(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(token);
        }
    }

    fn transition(&mut self, next: PlaybackState) {
        if self.state != next {
            tracing::info!(from = %self.state, to = %next, index = self.index, "playback transition");
            self.state = next;
        }
    }

    fn interval_ms(&self) -> u64 {
        u64::try_from(self.tick_interval.as_millis()).unwrap_or(u64::MAX)
    }
}

impl<S: Scheduler, A: AudioSync, R: Renderer> Drop for PlaybackController<S, A, R> {
    fn drop(&mut self) {
        self.disarm();
        if self.state == PlaybackState::Playing {
            self.audio.cue(AudioCue::Stop);
        }
        self.audio.release();
    }
}

impl<S: Scheduler, A: AudioSync, R: Renderer> fmt::Debug for PlaybackController<S, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state)
            .field("index", &self.index)
            .field("periods", &self.table.periods().len())
            .field("tick_interval", &self.tick_interval)
            .field("pending", &self.pending)
            .finish()
    }
}
