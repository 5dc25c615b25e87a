//! CLI frontend for Mosaic definition directories.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mosaic",
    about = "Mosaic: entities assembled at runtime from XML templates",
    version,
    propagate_version = true
)]
struct Cli {
    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where definition documents are read from.
#[derive(Args)]
struct Source {
    /// Directory containing definition documents
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// File extension of definition documents
    #[arg(long, default_value = "xml")]
    ext: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every document and produce every template, reporting problems
    Check {
        #[command(flatten)]
        source: Source,
    },

    /// List entity and set templates
    List {
        /// Only show one kind: entity or set
        kind: Option<String>,

        #[command(flatten)]
        source: Source,
    },

    /// Show a template with its inheritance applied
    Show {
        /// Template name
        name: String,

        #[command(flatten)]
        source: Source,
    },

    /// Produce the entities of a template and print them
    Produce {
        /// Entity or set template name
        name: String,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        source: Source,
    },

    /// Produce a template and drive it with the host for a number of ticks
    Run {
        /// Entity or set template name
        name: String,

        /// Number of ticks to run
        #[arg(short, long, default_value = "60")]
        ticks: u64,

        /// Seconds per tick
        #[arg(long, default_value = "0.016666668")]
        dt: f32,

        /// Host configuration as JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print run statistics as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        source: Source,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { source } => commands::check::run(&source.dir, &source.ext),
        Commands::List { kind, source } => {
            commands::list::run(&source.dir, &source.ext, kind.as_deref())
        }
        Commands::Show { name, source } => commands::show::run(&source.dir, &source.ext, &name),
        Commands::Produce { name, json, source } => {
            commands::produce::run(&source.dir, &source.ext, &name, json)
        }
        Commands::Run {
            name,
            ticks,
            dt,
            config,
            json,
            source,
        } => commands::run::run(
            &source.dir,
            &source.ext,
            &name,
            commands::run::RunOptions {
                ticks,
                dt,
                config,
                json,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
