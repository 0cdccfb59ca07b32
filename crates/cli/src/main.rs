//! `connmeta` command line.

#![forbid(unsafe_code)]
#![deny(unused_must_use, missing_debug_implementations)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod enrich;
mod index_schema;

#[derive(Parser, Debug)]
#[command(
    name = "connmeta",
    version,
    about = "Enrich OpenAPI documents with workflow designer extensions"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enrich an OpenAPI document with declared annotations
    Enrich(enrich::EnrichArgs),
    /// Print the JSON Schema of the annotation index format
    IndexSchema(index_schema::IndexSchemaArgs),
}

fn main() {
    init_tracing();
    std::process::exit(run_cli(std::env::args_os()));
}

fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Enrich(args)) => enrich::run(&args),
            Some(Commands::IndexSchema(args)) => index_schema::run(&args),
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
    }
}

fn init_tracing() {
    // CONNMETA_LOG controls log level: "trace", "debug", "info", "warn", "error"
    // or a full tracing filter spec like "connmeta_core=debug"
    let filter = match std::env::var("CONNMETA_LOG") {
        Ok(level) if is_plain_level(&level) => {
            format!("connmeta_core={level},connmeta={level}")
        }
        Ok(spec) => spec,
        Err(_) => "connmeta_core=info,connmeta=info".to_string(),
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
