//! Clap command tree.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the top-level `calltrace` command.
pub fn build_cli() -> Command {
    Command::new("calltrace")
        .about("Drive the calltrace recorder with a simulated workload")
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print output as JSON"),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .global(true)
                .default_value("info")
                .help("Log filter (RUST_LOG syntax) when RUST_LOG is unset"),
        )
        .subcommand_required(true)
        .subcommand(simulate_command())
        .subcommand(
            Command::new("settings")
                .about("Show the settings resolved from CALLTRACE_* environment variables"),
        )
}

fn simulate_command() -> Command {
    Command::new("simulate")
        .about("Run traced no-op statements and print the recorder snapshot")
        .arg(
            Arg::new("calls")
                .long("calls")
                .value_parser(value_parser!(usize))
                .default_value("20")
                .help("Statements per thread"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_parser(value_parser!(usize))
                .default_value("4")
                .help("Concurrent callers"),
        )
        .arg(
            Arg::new("max-latency-ms")
                .long("max-latency-ms")
                .value_parser(value_parser!(u64))
                .default_value("50")
                .help("Upper bound of simulated statement latency"),
        )
        .arg(
            Arg::new("fail-every")
                .long("fail-every")
                .value_parser(value_parser!(usize))
                .default_value("0")
                .help("Fail every Nth statement (0 = never)"),
        )
        .arg(
            Arg::new("linger-ms")
                .long("linger-ms")
                .value_parser(value_parser!(u64))
                .default_value("0")
                .help("Keep the sweeper running this long before printing"),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .short('s')
                .action(ArgAction::Append)
                .value_name("KEY=VALUE")
                .help("Trace setting, e.g. trace-size=100 (overrides environment)"),
        )
}
