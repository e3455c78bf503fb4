//! CLI argument definitions for `conduct`.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("conduct")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Drive music playback from recorded or synthetic hand traces")
        .arg_required_else_help(true)
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Do not echo log lines to stderr"),
        )
        .arg(
            Arg::new("log-tail")
                .long("log-tail")
                .global(true)
                .value_name("LINES")
                .value_parser(value_parser!(usize))
                .help("Print the last LINES buffered log lines when done"),
        )
        .subcommand(
            Command::new("replay")
                .about("Feed a recorded hand trace through the control loop")
                .arg(
                    Arg::new("TRACE")
                        .help("JSON array of {t, left, right} frames")
                        .required(true)
                        .index(1),
                )
                .args(session_args()),
        )
        .subcommand(
            Command::new("simulate")
                .about("Synthesize a conducting trace and replay it")
                .arg(
                    Arg::new("bpm")
                        .long("bpm")
                        .value_name("BPM")
                        .default_value("120")
                        .value_parser(value_parser!(f64))
                        .help("Tempo of the synthetic strokes"),
                )
                .arg(
                    Arg::new("seconds")
                        .long("seconds")
                        .value_name("SECONDS")
                        .default_value("10")
                        .value_parser(value_parser!(f64))
                        .help("Length of the trace"),
                )
                .arg(
                    Arg::new("fps")
                        .long("fps")
                        .value_name("FPS")
                        .default_value("30")
                        .value_parser(value_parser!(f64))
                        .help("Frames per second of the trace"),
                )
                .arg(
                    Arg::new("dropout")
                        .long("dropout")
                        .value_name("START:END")
                        .value_parser(parse_window)
                        .help("Window (seconds) in which no hands are tracked"),
                )
                .arg(
                    Arg::new("jitter")
                        .long("jitter")
                        .value_name("PX")
                        .default_value("1.5")
                        .value_parser(value_parser!(f64))
                        .help("Uniform tracking noise added to every coordinate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_name("SEED")
                        .value_parser(value_parser!(u64))
                        .help("Seed for reproducible jitter"),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .value_name("PATH")
                        .help("Save the trace as JSON instead of replaying it"),
                )
                .args(session_args()),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("config-json").about("Print the default ControlConfig JSON"),
                ),
        )
}

/// Options shared by every subcommand that runs a session.
fn session_args() -> Vec<Arg> {
    vec![
        Arg::new("config")
            .long("config")
            .short('c')
            .value_name("PATH")
            .help("ControlConfig JSON; missing fields use defaults"),
        Arg::new("track")
            .long("track")
            .short('t')
            .value_name("AUDIO")
            .help("Media file to loop"),
        Arg::new("dry-run")
            .long("dry-run")
            .action(ArgAction::SetTrue)
            .help("Record backend calls instead of playing audio"),
        Arg::new("frame-ms")
            .long("frame-ms")
            .value_name("MS")
            .value_parser(value_parser!(u64))
            .help("Fixed delay per frame instead of real-time pacing (0 = none)"),
        Arg::new("disable-volume")
            .long("disable-volume")
            .action(ArgAction::SetTrue)
            .help("Start with gesture volume control off"),
        Arg::new("disable-tempo")
            .long("disable-tempo")
            .action(ArgAction::SetTrue)
            .help("Start with tempo control off"),
    ]
}

fn parse_window(value: &str) -> Result<(f64, f64), String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got {:?}", value))?;
    let start: f64 = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start {:?}", start))?;
    let end: f64 = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid end {:?}", end))?;
    if end < start {
        return Err(format!("window ends before it starts: {}", value));
    }
    Ok((start, end))
}
