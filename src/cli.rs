use std::path::Path;

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::pipeline::run_pipeline;
use crate::server;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Serve,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("run") => Some(Command::Run),
        Some("serve") => Some(Command::Serve),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(command) => {
            let config_file = args.get(2).map(String::as_str).unwrap_or(DEFAULT_CONFIG_FILE);
            let config = match AppConfig::load(Path::new(config_file)) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("invalid configuration: {err}");
                    return 1;
                }
            };
            match command {
                Command::Run => handle_run(&config),
                Command::Serve => handle_serve(&config),
            }
        }
        None => {
            eprintln!("usage: electricity-etl <run|serve> [config.toml]");
            2
        }
    }
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Runtime::new() {
        Ok(runtime) => Some(runtime),
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            None
        }
    }
}

fn handle_run(config: &AppConfig) -> i32 {
    let Some(runtime) = runtime() else {
        return 1;
    };

    let outcome = match runtime.block_on(run_pipeline(config)) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(error = %err, "run aborted");
            eprintln!("run aborted: {err}");
            return 1;
        }
    };

    match serde_json::to_string_pretty(&outcome.report) {
        Ok(payload) => println!("{payload}"),
        Err(err) => {
            eprintln!("failed to serialize run report: {err}");
            return 1;
        }
    }

    if outcome.report.is_success() {
        0
    } else {
        1
    }
}

fn handle_serve(config: &AppConfig) -> i32 {
    let Some(runtime) = runtime() else {
        return 1;
    };

    match runtime.block_on(server::serve(config)) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}
