//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tapioca::{FileType, OutputFormat, Quantity, StepRange};

/// Tapioca - read Mandyoc output into labeled datasets
#[derive(Parser, Debug)]
#[command(name = "tapioca", author, version)]
#[command(about = "Read Mandyoc output into labeled datasets", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log debug events
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[allow(missing_docs)]
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the parameters and saved steps of a model directory
    Info {
        /// Mandyoc output directory
        dir: PathBuf,

        /// Parameters file name inside the directory
        #[arg(long)]
        parameters_file: Option<String>,
    },

    /// Read grid fields and export them
    Grid(GridArgs),

    /// Read particle files and export them
    Particles(ParticleArgs),

    /// Configuration file management
    Config {
        #[allow(missing_docs)]
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by every reading command.
#[derive(Args, Debug, Clone, Default)]
pub struct ReadArgs {
    /// Mandyoc output directory
    pub dir: PathBuf,

    /// Parameters file name inside the directory
    #[arg(long)]
    pub parameters_file: Option<String>,

    /// Inclusive step range, as MIN:MAX
    #[arg(long, value_name = "MIN:MAX")]
    pub steps: Option<StepRange>,

    /// Encoding of the files: ascii or binary
    #[arg(long)]
    pub filetype: Option<FileType>,
}

/// Options shared by every exporting command.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output format: json or csv [default: from the file extension or config]
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Output file; writes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Indent JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// `tapioca grid` arguments.
#[derive(Args, Debug, Clone, Default)]
pub struct GridArgs {
    #[allow(missing_docs)]
    #[command(flatten)]
    pub read: ReadArgs,

    /// Comma-separated quantities, e.g. temperature,velocity
    #[arg(long, value_delimiter = ',')]
    pub datasets: Vec<Quantity>,

    #[allow(missing_docs)]
    #[command(flatten)]
    pub output: OutputArgs,
}

/// `tapioca particles` arguments.
#[derive(Args, Debug, Clone, Default)]
pub struct ParticleArgs {
    #[allow(missing_docs)]
    #[command(flatten)]
    pub read: ReadArgs,

    #[allow(missing_docs)]
    #[command(flatten)]
    pub output: OutputArgs,
}

/// `tapioca config` subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,

    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Where to write it [default: the per-user config path]
        #[arg(long)]
        file: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
