//! Field data on the regular model grid.
//!
//! Mandyoc writes one file per quantity and saved step, e.g.
//! `temperature_10.txt` or `velocity_10.bin`. Scalars hold one value per
//! node; velocity holds `dimension` interleaved components per node. In both
//! cases the nodes are listed in Fortran order (x varies fastest).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::{fortran_to_c, Dataset, Variable};
use crate::error::{Error, Result};
use crate::filetype::FileType;
use crate::io::ascii::{read_values, TextLayout};
use crate::io::{flush_tiny, petsc};
use crate::parameters::{read_parameters, Parameters, PARAMETERS_FILE};
use crate::times::{read_times, StepRange, Timeline};

// ============================================================================
// Quantities
// ============================================================================

/// A field Mandyoc can write on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Temperature (C)
    Temperature,
    /// Density (kg/m^3)
    Density,
    /// Radiogenic heat production (W/m^3)
    RadiogenicHeat,
    /// Effective viscosity (Pa s)
    Viscosity,
    /// Accumulated strain
    Strain,
    /// Strain rate (1/s)
    StrainRate,
    /// Pressure (Pa)
    Pressure,
    /// Velocity vector (m/s)
    Velocity,
}

impl Quantity {
    /// Every quantity, in the order datasets are read by default.
    pub const ALL: [Quantity; 8] = [
        Quantity::Temperature,
        Quantity::Density,
        Quantity::RadiogenicHeat,
        Quantity::Viscosity,
        Quantity::Strain,
        Quantity::StrainRate,
        Quantity::Pressure,
        Quantity::Velocity,
    ];

    /// Dataset variable name.
    pub fn name(self) -> &'static str {
        match self {
            Quantity::Temperature => "temperature",
            Quantity::Density => "density",
            Quantity::RadiogenicHeat => "radiogenic_heat",
            Quantity::Viscosity => "viscosity",
            Quantity::Strain => "strain",
            Quantity::StrainRate => "strain_rate",
            Quantity::Pressure => "pressure",
            Quantity::Velocity => "velocity",
        }
    }

    /// Prefix of the files holding this quantity.
    pub fn basename(self) -> &'static str {
        match self {
            Quantity::RadiogenicHeat => "heat",
            other => other.name(),
        }
    }

    /// Whether the quantity is a scalar measured on the grid nodes.
    pub fn is_scalar(self) -> bool {
        !matches!(self, Quantity::Velocity)
    }

    /// File holding this quantity at `step`.
    pub fn path(self, dir: &Path, step: i64, filetype: FileType) -> PathBuf {
        dir.join(format!(
            "{}_{step}.{}",
            self.basename(),
            filetype.extension()
        ))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Quantity::ALL
            .into_iter()
            .find(|q| q.name() == s)
            .ok_or_else(|| Error::UnknownDataset(s.to_string()))
    }
}

// ============================================================================
// Options
// ============================================================================

/// What to read from a model directory.
#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    /// Parameters file name, relative to the model directory.
    pub parameters_file: String,
    /// Quantities to load.
    pub datasets: Vec<Quantity>,
    /// Restrict reading to these steps; defaults to `0..=stepMAX`.
    pub steps: Option<StepRange>,
    /// Encoding of the field files.
    pub filetype: FileType,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            parameters_file: PARAMETERS_FILE.to_string(),
            datasets: Quantity::ALL.to_vec(),
            steps: None,
            filetype: FileType::Ascii,
        }
    }
}

impl GridOptions {
    /// Options reading every quantity from ASCII files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different parameters file name.
    pub fn with_parameters_file(mut self, name: impl Into<String>) -> Self {
        self.parameters_file = name.into();
        self
    }

    /// Load only these quantities.
    pub fn with_datasets(mut self, datasets: impl IntoIterator<Item = Quantity>) -> Self {
        self.datasets = datasets.into_iter().collect();
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

// ============================================================================
// Reading
// ============================================================================

/// Largest grid, in nodes, that the readers will allocate.
pub const MAX_GRID_NODES: usize = 1 << 28;

/// Number of nodes of a grid with the given shape.
///
/// Shapes whose node count overflows or exceeds [`MAX_GRID_NODES`] are
/// rejected before anything is allocated.
pub fn node_count(shape: &[usize]) -> Result<usize> {
    let invalid = |message: String| Error::InvalidParameter {
        key: "shape".to_string(),
        message,
    };
    let nodes = shape
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| invalid(format!("node count of {shape:?} overflows")))?;
    if nodes > MAX_GRID_NODES {
        return Err(invalid(format!(
            "{nodes} nodes exceed the limit of {MAX_GRID_NODES}"
        )));
    }
    Ok(nodes)
}

/// Evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = stop;
            values
        }
    }
}

/// Names of the grid axes for a given dimension.
pub fn axis_names(dimension: usize) -> Result<&'static [&'static str]> {
    match dimension {
        2 => Ok(&["x", "z"]),
        3 => Ok(&["x", "y", "z"]),
        other => Err(Error::InvalidDimension(other)),
    }
}

/// Node coordinates along each axis.
///
/// `region` holds `(min, max)` pairs per axis and `shape` the node count per
/// axis, in the same axis order.
pub fn build_coordinates(region: &[f64], shape: &[usize]) -> Result<Vec<Vec<f64>>> {
    if region.len() != shape.len() * 2 {
        return Err(Error::DimensionMismatch {
            expected: shape.len() * 2,
            found: region.len(),
        });
    }
    Ok(shape
        .iter()
        .enumerate()
        .map(|(axis, &n)| linspace(region[2 * axis], region[2 * axis + 1], n))
        .collect())
}

/// Read field data from a Mandyoc model directory.
///
/// The result has coordinates `time` (Ma), `step` (along `time`) and one per
/// axis, and one `(time, x, [y,] z)` variable per scalar quantity. Velocity
/// is split into `velocity_x`, [`velocity_y`,] `velocity_z`. The grid
/// parameters and units become dataset attributes.
pub fn read_mandyoc_data(dir: &Path, options: &GridOptions) -> Result<Dataset> {
    let parameters = read_parameters(&dir.join(&options.parameters_file))?;
    let timeline = read_times(
        dir,
        parameters.require_print_step()?,
        parameters.require_step_max()?,
        options.steps,
    )?;
    tracing::info!(
        dir = %dir.display(),
        steps = timeline.len(),
        filetype = %options.filetype,
        "Reading Mandyoc grid data"
    );
    build_grid_dataset(dir, &parameters, &timeline, options)
}

/// Build the grid dataset from already parsed parameters and times.
pub fn build_grid_dataset(
    dir: &Path,
    parameters: &Parameters,
    timeline: &Timeline,
    options: &GridOptions,
) -> Result<Dataset> {
    let shape = &parameters.shape;
    node_count(shape)?;
    let axes = axis_names(parameters.dimension())?;
    let coordinates = build_coordinates(&parameters.region, shape)?;

    let mut ds = Dataset::new().with_attrs(parameters.attrs());
    ds.insert_coord("time", Variable::float_1d("time", timeline.times.clone()))?;
    ds.insert_coord("step", Variable::int_1d("time", timeline.steps.clone()))?;
    for (name, values) in axes.iter().zip(coordinates) {
        ds.insert_coord(*name, Variable::float_1d(*name, values))?;
    }

    let mut dims = vec!["time"];
    dims.extend_from_slice(axes);
    let mut full_shape = vec![timeline.len()];
    full_shape.extend_from_slice(shape);

    for &quantity in &options.datasets {
        if quantity.is_scalar() {
            let data = read_scalars(dir, shape, &timeline.steps, quantity, options.filetype)?;
            ds.insert_var(
                quantity.name(),
                Variable::float(dims.iter().copied(), full_shape.clone(), data)?,
            )?;
            tracing::debug!(quantity = %quantity, "Loaded scalar field");
        } else {
            let components = read_velocity(dir, shape, &timeline.steps, options.filetype)?;
            for (axis, data) in axes.iter().zip(components) {
                ds.insert_var(
                    format!("velocity_{axis}"),
                    Variable::float(dims.iter().copied(), full_shape.clone(), data)?,
                )?;
            }
            tracing::debug!("Loaded velocity field");
        }
    }
    Ok(ds)
}

/// Read the raw values of one field file.
fn read_field_file(path: &Path, filetype: FileType) -> Result<Vec<f64>> {
    tracing::debug!(path = %path.display(), "Reading field file");
    let mut values = match filetype {
        FileType::Ascii => read_values(path, TextLayout::FIELD)?,
        FileType::Binary => petsc::read_vec(path)?,
    };
    flush_tiny(&mut values);
    Ok(values)
}

/// Read a scalar quantity for every step, as a C-ordered `(time, grid...)`
/// buffer.
pub fn read_scalars(
    dir: &Path,
    shape: &[usize],
    steps: &[i64],
    quantity: Quantity,
    filetype: FileType,
) -> Result<Vec<f64>> {
    let nodes = node_count(shape)?;
    let mut data = Vec::new();
    for &step in steps {
        let path = quantity.path(dir, step, filetype);
        let values = read_field_file(&path, filetype)?;
        let reordered = fortran_to_c(&values, shape).ok_or(Error::ShapeMismatch {
            path: path.clone(),
            expected: nodes,
            found: values.len(),
        })?;
        data.extend(reordered);
    }
    Ok(data)
}

/// Read velocity for every step, one C-ordered `(time, grid...)` buffer per
/// component.
pub fn read_velocity(
    dir: &Path,
    shape: &[usize],
    steps: &[i64],
    filetype: FileType,
) -> Result<Vec<Vec<f64>>> {
    let dimension = shape.len();
    let nodes = node_count(shape)?;
    let mut components = vec![Vec::new(); dimension];
    for &step in steps {
        let path = Quantity::Velocity.path(dir, step, filetype);
        let values = read_field_file(&path, filetype)?;
        if values.len() != nodes * dimension {
            return Err(Error::ShapeMismatch {
                path,
                expected: nodes * dimension,
                found: values.len(),
            });
        }
        for (c, component) in components.iter_mut().enumerate() {
            let strided: Vec<f64> = values.iter().skip(c).step_by(dimension).copied().collect();
            let reordered = fortran_to_c(&strided, shape).ok_or(Error::ShapeMismatch {
                path: path.clone(),
                expected: nodes,
                found: strided.len(),
            })?;
            component.extend(reordered);
        }
    }
    Ok(components)
}
