use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use rank_bubbles_core::{
    extract_top_n, AudioCue, AudioSync, AudioTrackConfig, ChartConfig, DataTable, FrameDiff,
    FrameUpdate, LayoutEngine, ManualScheduler, Period, PlaybackController, Renderer, ScaleSet,
};
use tracing_subscriber::EnvFilter;

fn main() -> rank_bubbles_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { input } => run_inspect(&input),
        Commands::Frame { source, period } => run_frame(&source, &period),
        Commands::Play {
            source,
            speed,
            realtime,
        } => run_play(&source, speed, realtime),
    }
}

fn run_inspect(input: &Path) -> rank_bubbles_core::Result<()> {
    let table = DataTable::from_json_file(input)?;
    tracing::info!(?input, "inspecting ranking table");

    let periods = table.periods();
    println!("entities: {}", table.entities().len());
    println!(
        "periods:  {} ({} .. {})",
        periods.len(),
        periods.first().map(Period::as_str).unwrap_or("-"),
        periods.last().map(Period::as_str).unwrap_or("-"),
    );
    match table.value_domain() {
        Some((min, max)) => println!("values:   {min} .. {max}"),
        None => println!("values:   none"),
    }
    Ok(())
}

fn run_frame(source: &SourceArgs, period: &str) -> rank_bubbles_core::Result<()> {
    let (table, config) = source.load()?;
    let scales = ScaleSet::from_table(&table, &config);
    let layout = LayoutEngine::new(config.layout.clone(), &config.canvas);

    let period = Period::new(period);
    let index = table.period_index(&period)?;
    let frame = extract_top_n(&table, &period, config.playback.top_n)?;
    let relaxed = layout.relax(scales.annotate(frame)?, None);

    let diff = FrameDiff::between(&[], &relaxed.frame);
    let output = serde_json::json!({
        "frame": FrameUpdate::new(index, &relaxed.frame, &scales, diff),
        "residual_overlap": relaxed.frame.max_overlap(),
        "value_ticks": scales.value_ticks(10),
        "period_ticks": scales.period_ticks(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_play(source: &SourceArgs, speed: Option<u64>, realtime: bool) -> rank_bubbles_core::Result<()> {
    let (table, config) = source.load()?;
    tracing::info!(
        periods = table.periods().len(),
        realtime,
        "starting playback"
    );

    let scheduler = ManualScheduler::new();
    let audio = TracingAudio::new(config.audio.clone());
    let mut controller = PlaybackController::new(
        table,
        &config,
        scheduler.clone(),
        audio,
        JsonLines::new(io::stdout()),
    )?;
    if let Some(ms) = speed {
        controller.set_speed(ms);
    }

    controller.show_current();
    controller.play();
    while let Some((token, waited)) = scheduler.fire_next() {
        if realtime {
            std::thread::sleep(waited);
        }
        controller.on_timer(token);
    }

    tracing::info!(state = %controller.state(), "playback complete");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

/// Writes each frame update as one JSON line.
struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Renderer for JsonLines<W> {
    fn present(&mut self, update: FrameUpdate) {
        let written = serde_json::to_writer(&mut self.out, &update)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            tracing::error!(error = %err, period = %update.period, "failed to write frame");
        }
    }
}

/// Stands in for the audio player by logging each cue.
struct TracingAudio {
    track: Option<AudioTrackConfig>,
}

impl TracingAudio {
    fn new(track: Option<AudioTrackConfig>) -> Self {
        Self { track }
    }
}

impl AudioSync for TracingAudio {
    fn cue(&mut self, cue: AudioCue) {
        match &self.track {
            Some(track) => {
                tracing::info!(?cue, source = %track.source, looped = track.looped, "audio cue")
            }
            None => tracing::debug!(?cue, "audio cue without track"),
        }
    }

    fn release(&mut self) {
        if let Some(track) = self.track.take() {
            tracing::info!(source = %track.source, "released audio track");
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animated ranking bubble chart engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a ranking table and summarise its contents.
    Inspect {
        /// JSON table: header row followed by one row per entity.
        input: PathBuf,
    },
    /// Lay out a single period and print it as JSON.
    Frame {
        #[command(flatten)]
        source: SourceArgs,
        /// Period column to lay out.
        #[arg(short, long)]
        period: String,
    },
    /// Play every period and stream frame updates as JSON lines.
    Play {
        #[command(flatten)]
        source: SourceArgs,
        /// Tick interval in milliseconds.
        #[arg(short, long)]
        speed: Option<u64>,
        /// Wait for each tick in wall-clock time instead of running flat out.
        #[arg(long)]
        realtime: bool,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// JSON table: header row followed by one row per entity.
    input: PathBuf,
    /// Optional chart configuration file (JSON).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of entities shown per period.
    #[arg(short = 'n', long)]
    top: Option<usize>,
}

impl SourceArgs {
    fn load(&self) -> rank_bubbles_core::Result<(DataTable, ChartConfig)> {
        let mut config = match &self.config {
            Some(path) => ChartConfig::from_json_file(path)?,
            None => ChartConfig::default(),
        };
        if let Some(top) = self.top {
            config.playback.top_n = top;
            config.validate()?;
        }

        let table = DataTable::from_json_file(&self.input)?;
        Ok((table, config))
    }
}
