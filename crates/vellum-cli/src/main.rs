//! `vellum` CLI: validate and reformat JSON from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Validate (exit code 0 on success, 1 with the error on failure)
//! echo '{"name": "Alice"}' | vellum validate
//!
//! # Pretty-print, normalizing comments and single quotes away
//! vellum pretty -i config.json -o config.pretty.json
//!
//! # Compact
//! echo '{ "a": 1, "b": [2, 3] }' | vellum minify
//!
//! # Reject the comment/single-quote extensions
//! vellum validate --strict -i data.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use vellum_core::{Mapper, MapperConfig};

#[derive(Parser)]
#[command(name = "vellum", version, about = "Hand-written JSON validator and reformatter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Reject the comment and single-quoted-string extensions
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the input and report the first error, if any
    Validate {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Reformat as pretty-printed JSON
    Pretty {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Reformat as compact JSON
    Minify {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mapper = Mapper::with_config(MapperConfig {
        allow_comments: !cli.strict,
        allow_single_quoted_strings: !cli.strict,
        ..Default::default()
    });

    match cli.command {
        Commands::Validate { input } => {
            let text = read_input(input.as_deref())?;
            mapper.to_dynamic(&text).context("Invalid JSON")?;
        }
        Commands::Pretty { input, output } => {
            let text = read_input(input.as_deref())?;
            let value = mapper.to_dynamic(&text).context("Failed to parse JSON")?;
            write_output(output.as_deref(), &value.to_json_pretty())?;
        }
        Commands::Minify { input, output } => {
            let text = read_input(input.as_deref())?;
            let mut value = mapper.to_dynamic(&text).context("Failed to parse JSON")?;
            write_output(output.as_deref(), &value.to_json())?;
        }
    }

    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {path}"))?;
        }
        None => {
            println!("{content}");
        }
    }
    Ok(())
}
