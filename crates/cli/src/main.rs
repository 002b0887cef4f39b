//! `clientgen` command-line entry point.
//!
//! Parses arguments, sets up tracing and hands a resolved request to
//! `clientgen-core`.

use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod generate;

#[derive(Parser)]
#[command(
    name = "clientgen",
    version,
    about = "Generate client libraries from Protobuf and OpenAPI service descriptions"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one or more client libraries
    Generate(generate::GenerateArgs),
}

fn main() -> ExitCode {
    init_tracing();
    let code = match Cli::try_parse() {
        Ok(cli) => match cli.command {
            Some(Commands::Generate(args)) => run_command(|| generate::run(args)),
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn run_command<F>(f: F) -> i32
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn init_tracing() {
    // CLIENTGEN_LOG controls log level: "trace", "debug", "info", "warn", "error"
    // or a full tracing filter spec like "clientgen_core=debug"
    let filter = match std::env::var("CLIENTGEN_LOG") {
        Ok(level) if is_plain_level(&level) => {
            format!("clientgen={level},clientgen_core={level}")
        }
        Ok(spec) => spec,
        Err(_) => "clientgen=info,clientgen_core=info".to_string(),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_plain_level() {
        assert!(is_plain_level("debug"));
        assert!(is_plain_level("WARN"));
        assert!(!is_plain_level("clientgen_core=debug"));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
