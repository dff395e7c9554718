//! # bejc — BEJ command-line codec
//!
//! Converts between JSON text and BEJ (Binary Encoded JSON) streams using
//! pre-shared schema and annotation dictionaries.
//!
//! ## Usage
//!
//! ```text
//! bejc encode <input.json> -s <schema.bin> [-a <annotations.bin>] [-o <out.bej>]
//! bejc decode <input.bej>  -s <schema.bin> [-a <annotations.bin>] [-o <out.json>]
//! ```
//!
//! Without `-o`, both subcommands write to stdout (decode output is
//! pretty-printed JSON). A schema path ending in `.map` is resolved to its
//! sibling `.bin` file. Exit status is 0 on success and 1 on any failure.
//!
//! ## Example
//!
//! ```text
//! $ bejc encode drive.json -s DriveSchema.bin -a Annotations.bin -o drive.bej
//! $ bejc decode drive.bej -s DriveSchema.bin -a Annotations.bin
//! {
//!   "Id": "Drive-3",
//!   ...
//! }
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dictionary::Dictionary;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "bejc")]
#[command(about = "Encode JSON to BEJ and decode BEJ back to JSON")]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON file into a BEJ stream
    Encode(CodecArgs),
    /// Decode a BEJ stream back into JSON
    Decode(CodecArgs),
}

#[derive(clap::Args)]
struct CodecArgs {
    /// Input file: JSON text for encode, a BEJ stream for decode
    input: PathBuf,

    /// Schema dictionary (`.bin`, or `.map` resolved to its sibling `.bin`)
    #[arg(short, long)]
    schema: PathBuf,

    /// Annotation dictionary for `@`-prefixed properties
    #[arg(short, long)]
    annotations: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Encode(args) => run_encode(&args),
        Commands::Decode(args) => run_decode(&args),
    }
}

/// Loads the schema dictionary and, when given, the annotation dictionary.
fn load_dictionaries(args: &CodecArgs) -> Result<(Dictionary, Option<Dictionary>)> {
    let schema = Dictionary::load(&args.schema)
        .with_context(|| format!("failed to load schema dictionary {}", args.schema.display()))?;
    info!(
        entries = schema.entry_count(),
        bytes = schema.size(),
        "loaded schema dictionary"
    );

    let annotations = match &args.annotations {
        Some(path) => {
            let dict = Dictionary::load(path).with_context(|| {
                format!("failed to load annotation dictionary {}", path.display())
            })?;
            info!(
                entries = dict.entry_count(),
                bytes = dict.size(),
                "loaded annotation dictionary"
            );
            Some(dict)
        }
        None => None,
    };
    Ok((schema, annotations))
}

fn run_encode(args: &CodecArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let json: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse JSON from {}", args.input.display()))?;

    let (schema, annotations) = load_dictionaries(args)?;
    let bytes = codec::encode_to_vec(&json, &schema, annotations.as_ref())?;
    debug!(bytes = bytes.len(), "encoded BEJ stream");

    write_output(args.output.as_deref(), &bytes)
}

fn run_decode(args: &CodecArgs) -> Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let (schema, annotations) = load_dictionaries(args)?;
    let json = codec::decode_buffer(&bytes, &schema, annotations.as_ref())?;
    debug!("decoded BEJ stream");

    let mut text = serde_json::to_string_pretty(&json)?;
    text.push('\n');
    write_output(args.output.as_deref(), text.as_bytes())
}

/// Writes the result to the given path, or to stdout when none was given.
fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}
