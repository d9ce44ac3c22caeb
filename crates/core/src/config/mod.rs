use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{RankChartError, Result};

/// Top-level configuration structure for the chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub canvas: CanvasConfig,
    pub scale: ScaleConfig,
    pub layout: LayoutConfig,
    pub playback: PlaybackConfig,
    pub audio: Option<AudioTrackConfig>,
}

impl ChartConfig {
    /// Parses a (possibly partial) JSON document. Missing keys keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects settings the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let canvas = &self.canvas;
        if canvas.inner_width() <= 0.0 || canvas.inner_height() <= 0.0 {
            return Err(RankChartError::format(
                "canvas margins leave no drawable area",
            ));
        }

        let [min_radius, max_radius] = self.scale.radius_range;
        if !(min_radius >= 0.0 && max_radius >= min_radius) {
            return Err(RankChartError::format(format!(
                "invalid radius range [{min_radius}, {max_radius}]"
            )));
        }

        let playback = &self.playback;
        if playback.min_interval_ms == 0 || playback.min_interval_ms > playback.max_interval_ms {
            return Err(RankChartError::format(format!(
                "invalid tick interval range [{}, {}]",
                playback.min_interval_ms, playback.max_interval_ms
            )));
        }

        if playback.top_n == 0 {
            return Err(RankChartError::format("top_n must be at least 1"));
        }

        Ok(())
    }
}

/// Pixel extent of the drawing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl CanvasConfig {
    pub fn inner_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }

    /// Horizontal pixel span available to bubble centres.
    pub fn x_span(&self) -> [f64; 2] {
        [self.margin.left, self.width - self.margin.right]
    }

    /// Vertical pixel span available to bubble centres.
    pub fn y_span(&self) -> [f64; 2] {
        [self.margin.top, self.height - self.margin.bottom]
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            margin: Margin::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 50.0,
            left: 40.0,
        }
    }
}

/// Settings for the value → pixel mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    pub radius_range: [f64; 2],
    /// Extend the value domain outward to round numbers.
    pub nice: bool,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            radius_range: [5.0, 40.0],
            nice: false,
        }
    }
}

/// Parameters of the collision relaxation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub iterations: usize,
    pub strength_x: f64,
    pub strength_y: f64,
    pub collision_passes: usize,
    pub padding: f64,
    /// Largest residual overlap (ε) a settled frame may keep.
    pub collision_tolerance: f64,
    /// Upper bound of the random offset given to unseeded entities.
    pub jitter: f64,
    pub seed: u64,
    pub alpha_min: f64,
    /// Number of iterations over which alpha would cool from 1 to
    /// `alpha_min`.
    pub cooling_iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 120,
            strength_x: 0.1,
            strength_y: 0.1,
            collision_passes: 4,
            padding: 1.0,
            collision_tolerance: 1.0,
            jitter: 1.0,
            seed: 42,
            alpha_min: 0.001,
            cooling_iterations: 300,
        }
    }
}

/// Timing and ranking settings for the playback controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub tick_interval_ms: u64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub top_n: usize,
}

impl PlaybackConfig {
    pub fn clamp_interval(&self, ms: u64) -> Duration {
        Duration::from_millis(ms.clamp(self.min_interval_ms, self.max_interval_ms))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            min_interval_ms: 100,
            max_interval_ms: 10_000,
            top_n: 20,
        }
    }
}

/// Background track the audio collaborator should play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrackConfig {
    pub source: String,
    #[serde(default = "default_looped")]
    pub looped: bool,
}

fn default_looped() -> bool {
    true
}
