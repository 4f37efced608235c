//! Lagrangian particle data.
//!
//! Every MPI rank writes its own particle file per saved step, named
//! `step_{step}-rank_new{rank}.{txt,bin}`. Each particle carries its
//! position, a persistent id, the layer it belongs to and its cumulative
//! strain. Particles are matched across steps by id.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::dataset::{Dataset, Variable};
use crate::error::{Error, Result};
use crate::filetype::FileType;
use crate::grids::axis_names;
use crate::io::ascii::{read_columns, TextLayout};
use crate::io::particle_bin::read_particle_file;
use crate::parameters::{read_parameters, PARAMETERS_FILE};
use crate::times::{read_times, StepRange, Timeline};

/// Prefix of every particle file.
pub const PARTICLE_PREFIX: &str = "step_";

const RANK_SEPARATOR: &str = "-rank_new";

// ============================================================================
// Records
// ============================================================================

/// Particles read from a single rank file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleRecords {
    /// One vector per axis (`x, z` or `x, y, z`).
    pub coordinates: Vec<Vec<f64>>,
    /// Particle ids.
    pub ids: Vec<i64>,
    /// Layer index of each particle.
    pub layers: Vec<i64>,
    /// Cumulative strain of each particle.
    pub cumulative_strain: Vec<f64>,
}

impl ParticleRecords {
    /// Number of particles.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the file held no particles.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Read an ASCII particle file (`x [y] z id layer strain` per line).
pub fn read_ascii_particles(path: &Path, dimension: usize) -> Result<ParticleRecords> {
    let mut columns = read_columns(path, TextLayout::PARTICLES, dimension + 3)?;
    let cumulative_strain = columns.pop().unwrap_or_default();
    let layers = to_integers(columns.pop().unwrap_or_default(), path, "layer")?;
    let ids = to_integers(columns.pop().unwrap_or_default(), path, "particle id")?;
    Ok(ParticleRecords {
        coordinates: columns,
        ids,
        layers,
        cumulative_strain,
    })
}

fn to_integers(values: Vec<f64>, path: &Path, what: &str) -> Result<Vec<i64>> {
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            if v.fract() == 0.0 && v.is_finite() {
                Ok(v as i64)
            } else {
                Err(Error::parse(
                    path,
                    row + 1,
                    format!("{what} must be an integer, found {v}"),
                ))
            }
        })
        .collect()
}

/// Read one particle file in the given encoding.
pub fn read_particle_records(
    path: &Path,
    dimension: usize,
    filetype: FileType,
) -> Result<ParticleRecords> {
    tracing::debug!(path = %path.display(), "Reading particle file");
    match filetype {
        FileType::Ascii => read_ascii_particles(path, dimension),
        FileType::Binary => read_particle_file(path, dimension),
    }
}

// ============================================================================
// File discovery
// ============================================================================

/// Path of the file written by `rank` at `step`.
pub fn particle_path(dir: &Path, step: i64, rank: usize, filetype: FileType) -> PathBuf {
    dir.join(format!(
        "{PARTICLE_PREFIX}{step}{RANK_SEPARATOR}{rank}.{}",
        filetype.extension()
    ))
}

/// Parse `step_{step}-rank_new{rank}.{ext}` into `(step, rank)`.
pub fn parse_particle_filename(name: &str) -> Option<(i64, usize)> {
    let stem = name.strip_prefix(PARTICLE_PREFIX)?;
    let stem = stem.rsplit_once('.').map_or(stem, |(stem, _)| stem);
    let (step, rank) = stem.split_once(RANK_SEPARATOR)?;
    Some((step.parse().ok()?, rank.parse().ok()?))
}

/// Map each step to the ranks that wrote a particle file for it.
pub fn discover_particle_files(dir: &Path, filetype: FileType) -> Result<BTreeMap<i64, Vec<usize>>> {
    let pattern = format!(
        "{}/{PARTICLE_PREFIX}*{RANK_SEPARATOR}*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        filetype.extension()
    );
    let entries = glob::glob(&pattern).map_err(|e| Error::InvalidParameter {
        key: "path".to_string(),
        message: e.to_string(),
    })?;

    let mut files: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            Error::io_with_path(e.into_error(), path)
        })?;
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((step, rank)) = parse_particle_filename(name) {
            files.entry(step).or_default().push(rank);
        }
    }
    for ranks in files.values_mut() {
        ranks.sort_unstable();
    }
    Ok(files)
}

// ============================================================================
// Reading
// ============================================================================

/// What to read from a model directory's particle files.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleOptions {
    /// Parameters file name, relative to the model directory.
    pub parameters_file: String,
    /// Restrict reading to these steps; defaults to `0..=stepMAX`.
    pub steps: Option<StepRange>,
    /// Encoding of the particle files.
    pub filetype: FileType,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            parameters_file: PARAMETERS_FILE.to_string(),
            steps: None,
            filetype: FileType::Ascii,
        }
    }
}

impl ParticleOptions {
    /// Options reading ASCII particle files for every step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different parameters file name.
    pub fn with_parameters_file(mut self, name: impl Into<String>) -> Self {
        self.parameters_file = name.into();
        self
    }

    /// Restrict the steps read.
    pub fn with_steps(mut self, steps: StepRange) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Read files in this encoding.
    pub fn with_filetype(mut self, filetype: FileType) -> Self {
        self.filetype = filetype;
        self
    }
}

/// Read the particle files of a Mandyoc model directory.
///
/// The result is indexed by `time` and `particle_id`. Variables `x`, [`y`,]
/// `z`, `layer` and `cumulative_strain` are NaN wherever a particle was not
/// reported at a step.
pub fn read_mandyoc_particles(dir: &Path, options: &ParticleOptions) -> Result<Dataset> {
    let parameters = read_parameters(&dir.join(&options.parameters_file))?;
    let timeline = read_times(
        dir,
        parameters.require_print_step()?,
        parameters.require_step_max()?,
        options.steps,
    )?;
    let files = discover_particle_files(dir, options.filetype)?;
    tracing::info!(
        dir = %dir.display(),
        steps = timeline.len(),
        files = files.values().map(Vec::len).sum::<usize>(),
        "Reading Mandyoc particles"
    );

    let ds = build_particle_dataset(dir, parameters.dimension(), &timeline, &files, options.filetype)?;
    Ok(ds.with_attrs(parameters.attrs()))
}

/// Number of ranks that wrote `step`, checked against the first step.
fn rank_count(files: &BTreeMap<i64, Vec<usize>>, step: i64, expected: Option<usize>) -> Result<usize> {
    let found = files.get(&step).map_or(0, Vec::len);
    match expected {
        Some(expected) if expected != found => Err(Error::RankMismatch {
            step,
            expected,
            found,
        }),
        _ => Ok(found),
    }
}

/// Build the particle dataset from discovered files.
pub fn build_particle_dataset(
    dir: &Path,
    dimension: usize,
    timeline: &Timeline,
    files: &BTreeMap<i64, Vec<usize>>,
    filetype: FileType,
) -> Result<Dataset> {
    let axes = axis_names(dimension)?;
    let n_rank = match timeline.steps.first() {
        Some(&first) => rank_count(files, first, None)?,
        None => 0,
    };

    // Particle ids come from the first step read, in rank order.
    let mut particle_ids = Vec::new();
    if let Some(&first) = timeline.steps.first() {
        for rank in 0..n_rank {
            let records = read_particle_records(
                &particle_path(dir, first, rank, filetype),
                dimension,
                filetype,
            )?;
            particle_ids.extend(records.ids);
        }
    }
    let column_of: HashMap<i64, usize> = particle_ids
        .iter()
        .enumerate()
        .map(|(column, &id)| (id, column))
        .collect();

    let n_particles = particle_ids.len();
    let n_times = timeline.len();
    let mut coordinates = vec![vec![f64::NAN; n_times * n_particles]; dimension];
    let mut layers = vec![f64::NAN; n_times * n_particles];
    let mut strain = vec![f64::NAN; n_times * n_particles];

    for (row, (step, _)) in timeline.iter().enumerate() {
        rank_count(files, step, Some(n_rank))?;
        for rank in 0..n_rank {
            let records =
                read_particle_records(&particle_path(dir, step, rank, filetype), dimension, filetype)?;
            for (i, id) in records.ids.iter().enumerate() {
                let column = *column_of
                    .get(id)
                    .ok_or(Error::UnknownParticle { step, id: *id })?;
                let cell = row * n_particles + column;
                for (axis, values) in coordinates.iter_mut().enumerate() {
                    values[cell] = records.coordinates[axis][i];
                }
                layers[cell] = records.layers[i] as f64;
                strain[cell] = records.cumulative_strain[i];
            }
        }
    }

    let dims = ["time", "particle_id"];
    let shape = vec![n_times, n_particles];
    let mut ds = Dataset::new();
    ds.insert_coord("time", Variable::float_1d("time", timeline.times.clone()))?;
    ds.insert_coord("step", Variable::int_1d("time", timeline.steps.clone()))?;
    ds.insert_coord("particle_id", Variable::int_1d("particle_id", particle_ids))?;
    for (axis, values) in axes.iter().zip(coordinates) {
        ds.insert_var(*axis, Variable::float(dims, shape.clone(), values)?)?;
    }
    ds.insert_var("layer", Variable::float(dims, shape.clone(), layers)?)?;
    ds.insert_var("cumulative_strain", Variable::float(dims, shape, strain)?)?;
    Ok(ds)
}
