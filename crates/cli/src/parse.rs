//! ArgMatches → CliAction conversion.

use calltrace::TraceConfig;
use clap::ArgMatches;

/// The result of parsing the command line.
pub enum CliAction {
    /// Run a simulated workload.
    Simulate(SimulateArgs),
    /// Print resolved settings.
    Settings(TraceConfig),
}

/// Parameters of `calltrace simulate`.
pub struct SimulateArgs {
    pub config: TraceConfig,
    pub calls: usize,
    pub threads: usize,
    pub max_latency_ms: u64,
    pub fail_every: usize,
    pub linger_ms: u64,
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "simulate" => parse_simulate(sub_matches),
        "settings" => Ok(CliAction::Settings(TraceConfig::from_env())),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn parse_simulate(matches: &ArgMatches) -> Result<CliAction, String> {
    let mut config = TraceConfig::from_env();
    if let Some(pairs) = matches.get_many::<String>("set") {
        for pair in pairs {
            let (key, value) = split_setting(pair)?;
            config
                .apply_setting(key, value)
                .map_err(|e| e.to_string())?;
        }
    }

    let threads = *matches.get_one::<usize>("threads").unwrap_or(&4);
    if threads == 0 {
        return Err("--threads must be at least 1".to_string());
    }

    Ok(CliAction::Simulate(SimulateArgs {
        config,
        calls: *matches.get_one::<usize>("calls").unwrap_or(&20),
        threads,
        max_latency_ms: *matches.get_one::<u64>("max-latency-ms").unwrap_or(&50),
        fail_every: *matches.get_one::<usize>("fail-every").unwrap_or(&0),
        linger_ms: *matches.get_one::<u64>("linger-ms").unwrap_or(&0),
    }))
}

/// Split `key=value`.
pub fn split_setting(pair: &str) -> Result<(&str, &str), String> {
    pair.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{}'", pair))
}
