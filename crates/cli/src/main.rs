//! Calltrace CLI — drive the recorder from the command line.
//!
//! - `calltrace simulate` runs concurrent traced statements and prints the
//!   recorder snapshot
//! - `calltrace settings` prints the settings resolved from the environment

mod commands;
mod format;
mod parse;
mod workload;

use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use calltrace::{CallTracer, TraceConfig, TraceRecorder, TraceSettings};
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_report, format_settings, format_snapshot, OutputMode};
use parse::{matches_to_action, CliAction, SimulateArgs};

fn main() {
    let cli = build_cli();
    let matches = cli.get_matches();

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            matches
                .get_one::<String>("log")
                .map(String::as_str)
                .unwrap_or("info"),
        )
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match matches_to_action(&matches) {
        Ok(CliAction::Simulate(args)) => run_simulate(args, output_mode),
        Ok(CliAction::Settings(config)) => {
            println!("{}", format_settings(&resolve(config), output_mode));
            0
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            1
        }
    };
    process::exit(exit_code);
}

fn resolve(config: TraceConfig) -> TraceSettings {
    let recorder = TraceRecorder::new();
    recorder.init(config);
    recorder.settings().clone()
}

fn run_simulate(args: SimulateArgs, mode: OutputMode) -> i32 {
    let tracer = match CallTracer::new(args.config.clone()) {
        Ok(tracer) => Arc::new(tracer),
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string(), mode));
            return 1;
        }
    };

    let summary = workload::run(&tracer, &args);
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "workload finished"
    );

    if args.linger_ms > 0 {
        thread::sleep(Duration::from_millis(args.linger_ms));
    }
    tracer.close();
    let report = tracer.sweep_now();
    if mode == OutputMode::Human {
        eprintln!("{}", format_report(&report));
    }

    println!("{}", format_snapshot(&tracer.snapshot(), mode));
    0
}
