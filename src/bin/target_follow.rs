//! target-follow command line
//!
//! Loads a detection model, then moves the pointer to the largest confident
//! detection of the chosen class on every frame until the exit key is hit.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use target_follow::actuator::Actuator;
use target_follow::capture::FrameSource;
use target_follow::signal::{CancellationSignal, CancellationToken};
use target_follow::{
    Backends, ExitKey, LogActuator, ReplayModelLoader, Supervisor, TrackingConfig,
};

/// Follow detected objects with the mouse pointer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with base settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Class name to follow (exact, then substring match)
    #[arg(short, long)]
    target: Option<String>,

    /// Model reference (a detections replay JSON file)
    #[arg(short, long)]
    model: Option<String>,

    /// Key that stops tracking (esc, space, enter, tab, f1-f12, a letter)
    #[arg(short, long)]
    exit_key: Option<String>,

    /// Seconds to sleep between iterations
    #[arg(long)]
    poll_interval: Option<f64>,

    /// Minimum detection confidence (exclusive)
    #[arg(long)]
    confidence: Option<f32>,

    /// Seconds each pointer move takes
    #[arg(long)]
    move_duration: Option<f64>,

    /// Replay frames from a directory of images instead of the screen
    #[cfg(feature = "vision")]
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Loop the replayed frames
    #[cfg(feature = "vision")]
    #[arg(long, default_value_t = false)]
    loop_frames: bool,

    /// Size of the blank frames used when no screen is available
    #[arg(long, default_value = "640x480", value_parser = parse_frame_size)]
    frame_size: (u32, u32),

    /// Log pointer moves instead of performing them
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn parse_frame_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if w == 0 || h == 0 {
        return Err("frame size must be non-zero".to_string());
    }
    Ok((w, h))
}

impl Args {
    fn tracking_config(&self) -> Result<TrackingConfig> {
        let mut config = match &self.config {
            Some(path) => TrackingConfig::from_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => TrackingConfig::default(),
        };

        if let Some(target) = &self.target {
            config.target_class = target.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(key) = &self.exit_key {
            config.exit_key = key.clone();
        }
        if let Some(secs) = self.poll_interval {
            config.poll_interval_secs = secs;
        }
        if let Some(threshold) = self.confidence {
            config.confidence_threshold = threshold;
        }
        if let Some(secs) = self.move_duration {
            config.move_duration_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }

    fn frame_source(&self) -> Result<Box<dyn FrameSource>> {
        #[cfg(feature = "vision")]
        if let Some(dir) = &self.frames {
            let source = target_follow::FrameSequenceCapture::from_directory(dir, self.loop_frames)?;
            return Ok(Box::new(source));
        }

        #[cfg(target_os = "windows")]
        {
            Ok(Box::new(target_follow::ScreenCapture::new()))
        }
        #[cfg(not(target_os = "windows"))]
        {
            let (width, height) = self.frame_size;
            log::warn!("No screen capture on this platform, using {}x{} blank frames", width, height);
            Ok(Box::new(target_follow::BlankFrameSource::new(width, height)))
        }
    }

    fn actuator(&self) -> Box<dyn Actuator> {
        if self.dry_run {
            return Box::new(LogActuator::new());
        }

        #[cfg(target_os = "windows")]
        {
            Box::new(target_follow::CursorActuator::new())
        }
        #[cfg(not(target_os = "windows"))]
        {
            log::warn!("No pointer control on this platform, moves are only logged");
            Box::new(LogActuator::new())
        }
    }
}

fn exit_signal(key: ExitKey) -> Box<dyn CancellationSignal> {
    #[cfg(target_os = "windows")]
    {
        Box::new(target_follow::KeyboardListener::new(key))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(target_follow::StdinListener::new(key))
    }
}

/// Ctrl-C handler body: request a stop and let the supervisor join the worker
fn on_interrupt(token: CancellationToken) -> impl Fn() + Send + 'static {
    move || {
        if token.cancel() {
            log::info!("Interrupted, stopping tracking");
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.tracking_config()?;
    let key: ExitKey = config.exit_key.parse()?;

    let backends = Backends {
        loader: Box::new(ReplayModelLoader::new()),
        source: args.frame_source()?,
        actuator: args.actuator(),
    };
    let mut signal = exit_signal(key);

    log::info!(
        "Following '{}' with model {} (exit: {}, poll: {:?})",
        config.target_class,
        config.model,
        key,
        config.poll_interval()
    );

    let supervisor = Supervisor::new();
    if let Err(err) = ctrlc::set_handler(on_interrupt(supervisor.cancel_token())) {
        log::warn!("Failed to install Ctrl+C handler: {}", err);
    }
    let state = supervisor.run(config, backends, signal.as_mut())?;

    log::info!(
        "Session finished: {} frames, {} targets, {} errors, last fps {:.1}",
        state.frames_total,
        state.detections_total,
        state.errors_total,
        state.current_fps
    );
    Ok(())
}
