//! Handlers for the reading commands: `info`, `grid` and `particles`.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tapioca::export::write_dataset;
use tapioca::particles::discover_particle_files;
use tapioca::{
    read_mandyoc_data, read_mandyoc_particles, read_parameters, read_times, Attr, Dataset,
    FileType, GridOptions, OutputFormat, Parameters, ParticleOptions, Timeline,
};

use crate::cli::{Cli, Command, GridArgs, OutputArgs, ParticleArgs};
use crate::config::Config;
use crate::config_handlers::handle_config_command;
use crate::error::Result;

// ============================================================================
// Dispatch
// ============================================================================

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Info {
            dir,
            parameters_file,
        } => {
            let config = Config::load(config_path)?;
            let name = parameters_file.unwrap_or(config.read.parameters_file);
            print!("{}", ModelInfo::gather(&dir, &name)?);
            Ok(())
        }
        Command::Grid(args) => cmd_grid(&Config::load(config_path)?, &args),
        Command::Particles(args) => cmd_particles(&Config::load(config_path)?, &args),
        Command::Config { action } => handle_config_command(config_path, action),
    }
}

// ============================================================================
// info
// ============================================================================

/// What `tapioca info` reports about a model directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model directory.
    pub dir: PathBuf,
    /// Parsed parameters file.
    pub parameters: Parameters,
    /// Saved steps found on disk.
    pub timeline: Timeline,
    /// Number of steps with particle files, per encoding.
    pub particle_steps: Vec<(FileType, usize)>,
}

impl ModelInfo {
    /// Inspect a model directory.
    pub fn gather(dir: &Path, parameters_file: &str) -> Result<Self> {
        let parameters = read_parameters(&dir.join(parameters_file))?;
        let timeline = read_times(
            dir,
            parameters.require_print_step()?,
            parameters.require_step_max()?,
            None,
        )?;
        let mut particle_steps = Vec::new();
        for filetype in [FileType::Ascii, FileType::Binary] {
            particle_steps.push((filetype, discover_particle_files(dir, filetype)?.len()));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            parameters,
            timeline,
            particle_steps,
        })
    }
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.parameters;
        let shape: Vec<String> = p.shape.iter().map(ToString::to_string).collect();
        writeln!(f, "Model directory: {}", self.dir.display())?;
        writeln!(f, "Dimension: {}", p.dimension())?;
        writeln!(f, "Grid shape: {}", shape.join(" x "))?;
        writeln!(f, "Region: {}", Attr::Floats(p.region.clone()))?;
        if let Some(print_step) = p.print_step {
            writeln!(f, "print_step: {print_step}")?;
        }
        if let Some(step_max) = p.step_max {
            writeln!(f, "stepMAX: {step_max}")?;
        }
        if let Some(time_max) = p.time_max {
            writeln!(f, "timeMAX: {time_max}")?;
        }
        if !p.extra.is_empty() {
            writeln!(f, "Other parameters:")?;
            for (key, value) in &p.extra {
                writeln!(f, "  {key} = {value}")?;
            }
        }

        writeln!(f, "Saved steps: {}", self.timeline.len())?;
        for (step, time) in self.timeline.iter() {
            writeln!(f, "  {step:>8}  {time:>12.6} Ma")?;
        }
        for (filetype, steps) in &self.particle_steps {
            writeln!(f, "Particle files ({filetype}): {steps} steps")?;
        }
        Ok(())
    }
}

// ============================================================================
// grid / particles
// ============================================================================

/// Grid options from the config, overridden by the command line.
pub fn grid_options(config: &Config, args: &GridArgs) -> GridOptions {
    let mut options = config.grid_options();
    if let Some(name) = &args.read.parameters_file {
        options.parameters_file = name.clone();
    }
    if let Some(filetype) = args.read.filetype {
        options.filetype = filetype;
    }
    if !args.datasets.is_empty() {
        options.datasets = args.datasets.clone();
    }
    options.steps = args.read.steps;
    options
}

/// Particle options from the config, overridden by the command line.
pub fn particle_options(config: &Config, args: &ParticleArgs) -> ParticleOptions {
    let mut options = config.particle_options();
    if let Some(name) = &args.read.parameters_file {
        options.parameters_file = name.clone();
    }
    if let Some(filetype) = args.read.filetype {
        options.filetype = filetype;
    }
    options.steps = args.read.steps;
    options
}

/// Resolve the export format and indentation.
///
/// `--format` wins, then the output file extension, then the config.
pub fn output_settings(config: &Config, args: &OutputArgs) -> (OutputFormat, bool) {
    let format = args
        .format
        .or_else(|| args.output.as_deref().and_then(format_from_extension))
        .unwrap_or(config.output.format);
    (format, args.pretty || config.output.pretty)
}

fn format_from_extension(path: &Path) -> Option<OutputFormat> {
    path.extension()?
        .to_str()?
        .to_ascii_lowercase()
        .parse()
        .ok()
}

/// A `history` entry recording when and how a dataset was produced.
pub fn history_entry(command: &str, dir: &Path) -> String {
    format!(
        "{}: tapioca {command} {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        dir.display()
    )
}

fn cmd_grid(config: &Config, args: &GridArgs) -> Result<()> {
    let options = grid_options(config, args);
    let ds = read_mandyoc_data(&args.read.dir, &options)?;
    export(ds, history_entry("grid", &args.read.dir), config, &args.output)
}

fn cmd_particles(config: &Config, args: &ParticleArgs) -> Result<()> {
    let options = particle_options(config, args);
    let ds = read_mandyoc_particles(&args.read.dir, &options)?;
    export(ds, history_entry("particles", &args.read.dir), config, &args.output)
}

fn export(mut ds: Dataset, history: String, config: &Config, args: &OutputArgs) -> Result<()> {
    ds.set_attr("history", Attr::Text(history));
    let (format, pretty) = output_settings(config, args);
    write_dataset(&ds, args.output.as_deref(), format, pretty)?;

    // Keep stdout clean when it carries the data.
    if args.output.is_some() {
        println!("{ds}");
    } else {
        eprintln!("{ds}");
    }
    Ok(())
}
