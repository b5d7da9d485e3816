//! ramify — compile a grammar source file into a timed event listing.
//!
//! Exit codes: 0 success, 1 parse failure, 2 unresolved symbol, 3 cycle
//! detected, 4 resource limit exceeded.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use ramify::event::Event;
use ramify::grammar::{CompileOptions, Compiler};

#[derive(Parser)]
#[command(
    name = "ramify",
    version,
    about = "Expand a generative music grammar into a timed event stream"
)]
struct Cli {
    /// Grammar source file.
    source: PathBuf,

    /// Start symbol (defaults to the source's `start` directive).
    #[arg(long)]
    start: Option<String>,

    /// Seed for choice draws (defaults to a fixed seed for reproducibility).
    #[arg(long)]
    seed: Option<u64>,

    /// Write the listing to this path instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Emit events as JSON instead of the tab-separated listing.
    #[arg(long)]
    json: bool,

    /// Initial instrument.
    #[arg(long)]
    instrument: Option<String>,

    /// Initial velocity.
    #[arg(long)]
    velocity: Option<u32>,
}

fn main() {
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.source) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{}: {e}", cli.source.display());
            process::exit(1);
        }
    };

    let mut options = CompileOptions {
        start: cli.start,
        ..CompileOptions::default()
    };
    if let Some(seed) = cli.seed {
        options.seed = seed;
    }
    if let Some(instrument) = cli.instrument {
        options.initial.instrument = instrument;
    }
    if let Some(velocity) = cli.velocity {
        options.initial.velocity = velocity;
    }

    let events = match Compiler::compile(&source, &options) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(e.exit_code());
        }
    };

    let listing = if cli.json {
        match serde_json::to_string_pretty(&events) {
            Ok(json) => json + "\n",
            Err(e) => {
                eprintln!("error: failed to serialize events: {e}");
                process::exit(1);
            }
        }
    } else {
        render_listing(&events)
    };

    match cli.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &listing) {
                eprintln!("{}: {e}", path.display());
                process::exit(1);
            }
            println!("wrote {} events to {}", events.len(), path.display());
        }
        None => print!("{listing}"),
    }
}

fn render_listing(events: &[Event]) -> String {
    let mut out = String::from("onset\tduration\tpitches\tinstrument\tvelocity\n");
    for event in events {
        out.push_str(&event.to_string());
        out.push('\n');
    }
    out
}
