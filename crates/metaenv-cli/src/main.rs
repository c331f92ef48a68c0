#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "metaenv")]
#[command(author, version, about = "Rewrite import.meta.env into process.env lookups", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by commands that resolve the prefix set.
#[derive(clap::Args, Debug, Clone, Default)]
struct PrefixArgs {
    /// Recognized variable prefix (repeatable; overrides the config file)
    #[arg(long = "env-prefix", value_name = "PREFIX")]
    env_prefix: Vec<String>,

    /// JSON plugin options file, e.g. {"envPrefix": ["VITE_", "APP_"]}
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Rewrite import.meta.env references in source files
    Transform {
        /// Files to transform
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        prefixes: PrefixArgs,

        /// Write results into this directory instead of stdout
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Also write a source map next to each output file
        #[arg(long)]
        sourcemap: bool,
    },

    /// Print the resolved prefix set
    Prefixes {
        #[command(flatten)]
        prefixes: PrefixArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(cli.json),
        Some(Commands::Transform {
            files,
            prefixes,
            out_dir,
            sourcemap,
        }) => {
            let options = commands::load_options(&cwd, &prefixes.env_prefix, prefixes.config.as_deref())?;
            commands::transform::run(&commands::transform::TransformAction {
                cwd,
                files,
                options,
                out_dir,
                sourcemap,
                json: cli.json,
            })
        }
        Some(Commands::Prefixes { prefixes }) => {
            let options = commands::load_options(&cwd, &prefixes.env_prefix, prefixes.config.as_deref())?;
            commands::prefixes::run(&options, cli.json)
        }
    }
}
