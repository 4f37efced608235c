//! Mandyoc parameters file.
//!
//! The parameters file describes the grid and output cadence of a model run:
//!
//! ```text
//! 161 41
//! 1600000.0 400000.0
//! print_step 10
//! stepMAX 100
//! timeMAX 1.0e9
//! ```
//!
//! The first non-blank line is the number of nodes per axis, the second the
//! length of the region along each axis (meters). Every other line is a
//! `key value` pair.
//!
//! The region is built assuming the z axis points upward: every node beneath
//! the surface has a negative z, while x and y run from zero.

use std::collections::BTreeMap;
use std::path::Path;

use crate::dataset::Attr;
use crate::error::{Error, Result};
use crate::io::ascii::read_text;

/// Default name of the parameters file inside a model directory.
pub const PARAMETERS_FILE: &str = "param_1.5.3_2D.txt";

/// Units attached to every dataset built from a model directory.
pub const UNITS: [(&str, &str); 9] = [
    ("coords_units", "m"),
    ("times_units", "Ma"),
    ("temperature_units", "C"),
    ("density_units", "kg/m^3"),
    ("heat_units", "W/m^3"),
    ("viscosity_factor_units", "dimensionless"),
    ("viscosity_units", "Pa s"),
    ("strain_rate_units", "s^(-1)"),
    ("pressure_units", "Pa"),
];

const PRINT_STEP: &str = "print_step";
const STEP_MAX: &str = "stepMAX";
const TIME_MAX: &str = "timeMAX";

/// Parsed contents of a parameters file.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// Nodes per axis: `(nx, nz)` or `(nx, ny, nz)`.
    pub shape: Vec<usize>,
    /// Length of the region along each axis, in meters.
    pub max_coords: Vec<f64>,
    /// Axis bounds: `(x_min, x_max, [y_min, y_max,] z_min, z_max)`.
    pub region: Vec<f64>,
    /// Only steps that are multiples of this value are written.
    pub print_step: Option<i64>,
    /// Upper bound on the number of steps.
    pub step_max: Option<i64>,
    /// Upper bound on the model time, in years.
    pub time_max: Option<f64>,
    /// Every other `key value` pair, in file order.
    pub extra: Vec<(String, String)>,
}

impl Parameters {
    /// Number of spatial axes (2 or 3).
    pub fn dimension(&self) -> usize {
        self.shape.len()
    }

    /// `print_step`, or an error if the file did not define it.
    pub fn require_print_step(&self) -> Result<i64> {
        self.print_step
            .ok_or_else(|| Error::MissingParameter(PRINT_STEP.to_string()))
    }

    /// `stepMAX`, or an error if the file did not define it.
    pub fn require_step_max(&self) -> Result<i64> {
        self.step_max
            .ok_or_else(|| Error::MissingParameter(STEP_MAX.to_string()))
    }

    /// Look up an uninterpreted parameter by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render the parameters and units as dataset attributes.
    pub fn attrs(&self) -> BTreeMap<String, Attr> {
        let mut attrs = BTreeMap::new();
        attrs.insert(
            "shape".to_string(),
            Attr::Ints(self.shape.iter().map(|&n| n as i64).collect()),
        );
        attrs.insert("region".to_string(), Attr::Floats(self.region.clone()));
        attrs.insert("dimension".to_string(), Attr::Int(self.dimension() as i64));
        if let Some(print_step) = self.print_step {
            attrs.insert(PRINT_STEP.to_string(), Attr::Int(print_step));
        }
        if let Some(step_max) = self.step_max {
            attrs.insert(STEP_MAX.to_string(), Attr::Int(step_max));
        }
        if let Some(time_max) = self.time_max {
            attrs.insert(TIME_MAX.to_string(), Attr::Float(time_max));
        }
        for (key, value) in &self.extra {
            attrs.insert(key.clone(), Attr::Text(value.clone()));
        }
        for (key, unit) in UNITS {
            attrs.insert(key.to_string(), Attr::Text(unit.to_string()));
        }
        attrs
    }
}

/// Read and parse a parameters file.
pub fn read_parameters(path: &Path) -> Result<Parameters> {
    let text = read_text(path)?;
    parse_parameters(&text, path)
}

/// Parse the text of a parameters file. `path` is only used in errors.
pub fn parse_parameters(text: &str, path: &Path) -> Result<Parameters> {
    let mut shape: Option<Vec<usize>> = None;
    let mut max_coords: Option<Vec<f64>> = None;
    let mut print_step = None;
    let mut step_max = None;
    let mut time_max = None;
    let mut extra = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        if shape.is_none() {
            let parsed = tokens
                .iter()
                .map(|t| {
                    t.parse::<usize>()
                        .map_err(|_| Error::parse(path, line_no, format!("invalid node count '{t}'")))
                })
                .collect::<Result<Vec<_>>>()?;
            shape = Some(parsed);
            continue;
        }

        if max_coords.is_none() {
            let parsed = tokens
                .iter()
                .map(|t| {
                    t.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| Error::parse(path, line_no, format!("invalid coordinate '{t}'")))
                })
                .collect::<Result<Vec<_>>>()?;
            let expected = shape.as_ref().map_or(0, Vec::len);
            if parsed.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    found: parsed.len(),
                });
            }
            max_coords = Some(parsed);
            continue;
        }

        let (key, value) = match tokens.as_slice() {
            [key, value] => (*key, *value),
            [key, "=", value] => (*key, *value),
            _ => {
                return Err(Error::parse(
                    path,
                    line_no,
                    format!("expected `key value` pair, found '{}'", line.trim()),
                ));
            }
        };

        match key {
            PRINT_STEP => print_step = Some(parse_int(key, value, path, line_no)?),
            STEP_MAX | "step_max" => step_max = Some(parse_int(key, value, path, line_no)?),
            TIME_MAX => {
                // NaN and infinities have no JSON form as attributes.
                time_max = Some(value.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(
                    || Error::parse(path, line_no, format!("invalid value '{value}' for {key}")),
                )?);
            }
            _ => extra.push((key.to_string(), value.to_string())),
        }
    }

    let shape = shape.ok_or_else(|| Error::MissingParameter("shape".to_string()))?;
    let max_coords =
        max_coords.ok_or_else(|| Error::MissingParameter("max coordinates".to_string()))?;

    let region = match max_coords.as_slice() {
        [x_max, z_max] => vec![0.0, *x_max, -z_max, 0.0],
        [x_max, y_max, z_max] => vec![0.0, *x_max, 0.0, *y_max, -z_max, 0.0],
        _ => return Err(Error::InvalidDimension(shape.len())),
    };

    Ok(Parameters {
        shape,
        max_coords,
        region,
        print_step,
        step_max,
        time_max,
        extra,
    })
}

fn parse_int(key: &str, value: &str, path: &Path, line: usize) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|_| Error::parse(path, line, format!("invalid integer '{value}' for {key}")))
}
