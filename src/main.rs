use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Source/decompiled function pairs for decompilation models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract source/decompiled example pairs from a dataset directory
    Extract {
        /// Dataset directory, one subdirectory per artifact
        #[arg(short, long)]
        input: PathBuf,

        /// Pairs file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Languages to extract (comma-separated: c, c/c++)
        #[arg(short = 't', long = "types", default_value = "c")]
        types: String,

        /// Stop after this many examples (0 for no limit)
        #[arg(short = 'n', long, default_value_t = 0)]
        count: usize,

        /// Overwrite an existing pairs file
        #[arg(short, long)]
        force: bool,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print examples from a pairs file
    Inspect {
        /// Pairs file to read
        #[arg(short, long)]
        input: PathBuf,

        /// Only show these languages (comma-separated)
        #[arg(short = 't', long = "types")]
        types: Option<String>,

        /// Show at most this many examples (0 for all)
        #[arg(short = 'n', long, default_value_t = 0)]
        count: usize,

        /// Skip this many examples first
        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Shuffle with this seed before selecting
        #[arg(long)]
        shuffle: Option<u64>,
    },

    /// Move a held-out fraction of a pairs file into another file
    Split {
        /// Pairs file to split, rewritten with the remaining examples
        #[arg(short, long)]
        input: PathBuf,

        /// File for the held-out examples
        #[arg(short, long)]
        output: PathBuf,

        /// Fraction of examples to hold out, taken from the end
        #[arg(long, default_value_t = 0.1)]
        ratio: f64,

        /// Overwrite an existing held-out file
        #[arg(short, long)]
        force: bool,
    },

    /// Rewrite a decompiled tree into source through a translation model
    #[command(group(ArgGroup::new("backend").required(true).args(["command", "endpoint", "dry_run"])))]
    Transform {
        /// Directory of decompiled files
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory, created fresh
        #[arg(short, long)]
        output: PathBuf,

        /// Languages to transform (comma-separated: c, c/c++)
        #[arg(short = 't', long = "types", default_value = "c")]
        types: String,

        /// Transform at most this many files, copy the rest (0 for no limit)
        #[arg(short = 'n', long, default_value_t = 0)]
        count: usize,

        /// Replace an existing output directory
        #[arg(short, long)]
        force: bool,

        /// Translator program and arguments, run once per function body
        #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "PROGRAM")]
        command: Option<Vec<String>>,

        /// Inference server URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Copy function bodies unchanged
        #[arg(long)]
        dry_run: bool,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("LOG_LEVEL", "info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            output,
            types,
            count,
            force,
            config,
        } => {
            commands::extract::execute(&input, &output, &types, count, force, config.as_deref())?;
        }
        Commands::Inspect {
            input,
            types,
            count,
            skip,
            shuffle,
        } => {
            commands::inspect::execute(&input, types.as_deref(), count, skip, shuffle)?;
        }
        Commands::Split {
            input,
            output,
            ratio,
            force,
        } => {
            commands::split::execute(&input, &output, ratio, force)?;
        }
        Commands::Transform {
            input,
            output,
            types,
            count,
            force,
            command,
            endpoint,
            dry_run: _,
            config,
        } => {
            let backend = match (command, endpoint) {
                (Some(command), _) => commands::transform::Backend::Command(command),
                (None, Some(url)) => commands::transform::Backend::Endpoint(url),
                (None, None) => commands::transform::Backend::DryRun,
            };
            commands::transform::execute(&input, &output, &types, count, force, backend, config.as_deref())?;
        }
    }

    Ok(())
}
