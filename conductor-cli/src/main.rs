//! # Conduct
//!
//! A command-line host for the conductor control core. It replays recorded
//! or synthetic hand traces through a control loop and plays (or records)
//! the resulting playback commands.

use log::error;

mod cli;
mod logging;
mod runner;
mod summary;
mod trace;

fn main() {
    let args = cli::args::build_cli().get_matches();
    let log_buffer = logging::init(!args.get_flag("quiet"));

    let code = match runner::run(&args, &log_buffer) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}
