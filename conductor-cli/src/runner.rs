use std::{
    error::Error,
    path::PathBuf,
    sync::Arc,
    thread::sleep,
    time::{Duration, Instant},
};

use clap::ArgMatches;
use conductor_lib::{
    media,
    playback::{MemoryBackend, PlaybackBackend, PlaybackRamp},
    ControlConfig, ControlLoop,
};
use log::{error, info, warn};

use crate::{
    logging::{self, LogBuffer},
    summary::Summary,
    trace::{self, SyntheticTrace, Toggle, TraceFrame},
};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(3);

type RunResult<T> = Result<T, Box<dyn Error>>;

/// How frames are spaced in wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pacing {
    /// Follow the trace timestamps.
    RealTime,
    Fixed(Duration),
}

struct SessionOptions {
    config: Option<PathBuf>,
    track: Option<PathBuf>,
    dry_run: bool,
    pacing: Pacing,
    disable_volume: bool,
    disable_tempo: bool,
}

impl SessionOptions {
    fn from_args(args: &ArgMatches) -> Self {
        Self {
            config: args.get_one::<String>("config").map(PathBuf::from),
            track: args.get_one::<String>("track").map(PathBuf::from),
            dry_run: args.get_flag("dry-run"),
            pacing: match args.get_one::<u64>("frame-ms") {
                Some(&ms) => Pacing::Fixed(Duration::from_millis(ms)),
                None => Pacing::RealTime,
            },
            disable_volume: args.get_flag("disable-volume"),
            disable_tempo: args.get_flag("disable-tempo"),
        }
    }
}

pub fn run(args: &ArgMatches, log_buffer: &LogBuffer) -> RunResult<i32> {
    let code = match args.subcommand() {
        Some(("replay", sub)) => {
            let path = sub
                .get_one::<String>("TRACE")
                .ok_or("missing trace path")?;
            let frames = trace::load(path)?;
            info!("loaded {} frames from {}", frames.len(), path);
            run_session(&SessionOptions::from_args(sub), &frames)?
        }
        Some(("simulate", sub)) => simulate(sub)?,
        Some(("create", sub)) => match sub.subcommand() {
            Some(("config-json", _)) => {
                println!("{}", ControlConfig::default().to_json_pretty()?);
                0
            }
            _ => {
                error!("unknown create target");
                -1
            }
        },
        _ => {
            error!("no subcommand given");
            -1
        }
    };

    if let Some(&count) = args.get_one::<usize>("log-tail") {
        for line in logging::tail(log_buffer, count) {
            println!("{}", line);
        }
    }

    Ok(code)
}

fn simulate(args: &ArgMatches) -> RunResult<i32> {
    let bpm = *args.get_one::<f64>("bpm").ok_or("missing --bpm")?;
    let fps = *args.get_one::<f64>("fps").ok_or("missing --fps")?;
    if bpm <= 0.0 || fps <= 0.0 {
        return Err("--bpm and --fps must be positive".into());
    }

    let synthetic = SyntheticTrace {
        bpm,
        seconds: *args.get_one::<f64>("seconds").ok_or("missing --seconds")?,
        fps,
        dropout: args.get_one::<(f64, f64)>("dropout").copied(),
        jitter: *args.get_one::<f64>("jitter").ok_or("missing --jitter")?,
        seed: args.get_one::<u64>("seed").copied(),
    };
    let frames = synthetic.generate();
    info!(
        "synthesized {} frames at {:.0} bpm ({:.1}s)",
        frames.len(),
        synthetic.bpm,
        synthetic.seconds
    );

    if let Some(path) = args.get_one::<String>("write") {
        trace::save(path, &frames)?;
        info!("wrote trace to {}", path);
        return Ok(0);
    }

    run_session(&SessionOptions::from_args(args), &frames)
}

fn run_session(options: &SessionOptions, frames: &[TraceFrame]) -> RunResult<i32> {
    let mut config = match &options.config {
        Some(path) => ControlConfig::load(path)?,
        None => ControlConfig::default(),
    };
    if options.disable_volume {
        config.control.volume_enabled = false;
    }
    if options.disable_tempo {
        config.control.tempo_enabled = false;
    }

    if let Some(track) = &options.track {
        let info = media::probe(track)?;
        info!(
            "track {}: {} Hz, {} channels, {}",
            track.display(),
            info.sample_rate,
            info.channels,
            info.duration_secs
                .map(|secs| format!("{:.1}s", secs))
                .unwrap_or_else(|| "unknown length".to_string())
        );
    }

    let output = open_output(options)?;
    let backend = output.backend();
    if let Some(track) = &options.track {
        backend.load(track, true)?;
    }

    let ramp = PlaybackRamp::new(backend, &config);
    let mut control = ControlLoop::new(&config, ramp);
    let mut summary = Summary::default();

    let started = Instant::now();
    let first_t = frames.first().map(|frame| frame.t).unwrap_or(0.0);
    for frame in frames {
        pace(options.pacing, started, frame.t - first_t);

        match frame.toggle {
            Some(Toggle::Volume) => {
                control.toggle_volume_control();
            }
            Some(Toggle::Tempo) => {
                control.toggle_tempo_control();
            }
            None => {}
        }

        let report = control.step(&frame.hands(), frame.t);
        summary.record(&report);
    }

    if !control.playback().wait_idle(SETTLE_TIMEOUT) {
        warn!("playback still fading after {:?}", SETTLE_TIMEOUT);
    }
    summary.finish(control.playback());
    control.shutdown();

    println!("{}", summary);
    Ok(0)
}

fn pace(pacing: Pacing, started: Instant, offset_secs: f64) {
    match pacing {
        Pacing::RealTime => {
            let due = started + Duration::from_secs_f64(offset_secs.max(0.0));
            let now = Instant::now();
            if due > now {
                sleep(due - now);
            }
        }
        Pacing::Fixed(delay) => {
            if !delay.is_zero() {
                sleep(delay);
            }
        }
    }
}

/// Backend for the session. The rodio variant owns the output device, so it
/// must outlive the control loop.
enum Output {
    Memory(Arc<MemoryBackend>),
    #[cfg(feature = "audio")]
    Rodio(conductor_lib::playback::RodioOutput),
}

impl Output {
    fn backend(&self) -> Arc<dyn PlaybackBackend> {
        match self {
            Output::Memory(backend) => backend.clone() as Arc<dyn PlaybackBackend>,
            #[cfg(feature = "audio")]
            Output::Rodio(output) => output.backend(),
        }
    }
}

#[cfg(feature = "audio")]
fn open_output(options: &SessionOptions) -> RunResult<Output> {
    if options.dry_run || options.track.is_none() {
        if !options.dry_run {
            info!("no --track given; using the dry-run backend");
        }
        return Ok(Output::Memory(Arc::new(MemoryBackend::new())));
    }
    Ok(Output::Rodio(
        conductor_lib::playback::RodioOutput::open_default()?,
    ))
}

#[cfg(not(feature = "audio"))]
fn open_output(options: &SessionOptions) -> RunResult<Output> {
    if !options.dry_run && options.track.is_some() {
        warn!("built without the `audio` feature; using the dry-run backend");
    }
    Ok(Output::Memory(Arc::new(MemoryBackend::new())))
}
