//! Writing datasets to disk.
//!
//! Two formats are supported:
//!
//! - **JSON**: the full dataset (coordinates, variables, attributes) as
//!   serialized by serde; it can be read back with [`read_json`]
//! - **CSV**: a tidy long table with one row per element and one column per
//!   dimension, auxiliary coordinate and data variable

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Values, Variable};
use crate::error::{Error, Result};

/// Output encoding of an exported dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Serialized dataset
    #[default]
    Json,
    /// Tidy long table
    Csv,
}

impl OutputFormat {
    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(Error::InvalidParameter {
                key: "format".to_string(),
                message: format!("unknown output format '{other}'"),
            }),
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Serialize a dataset as JSON.
pub fn write_json<W: Write>(ds: &Dataset, writer: W, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, ds)?;
    } else {
        serde_json::to_writer(writer, ds)?;
    }
    Ok(())
}

/// Read a dataset previously written with [`write_json`].
pub fn read_json<R: Read>(reader: R) -> Result<Dataset> {
    let ds: Dataset = serde_json::from_reader(reader)?;
    ds.validate()?;
    Ok(ds)
}

// ============================================================================
// CSV
// ============================================================================

/// A column of the tidy table, evaluated at a full multi-index.
struct Column<'a> {
    header: String,
    source: Source<'a>,
}

enum Source<'a> {
    /// Position along a dimension without a coordinate.
    Index(usize),
    /// A variable whose dims map onto these positions of the multi-index.
    Variable(&'a Variable, Vec<usize>),
}

impl Column<'_> {
    fn cell(&self, index: &[usize]) -> String {
        match &self.source {
            Source::Index(axis) => index[*axis].to_string(),
            Source::Variable(variable, axes) => {
                let sub: Vec<usize> = axes.iter().map(|&a| index[a]).collect();
                let Some(offset) = variable.offset(&sub) else {
                    return String::new();
                };
                match variable.values() {
                    Values::Float64(v) => format_float(v[offset]),
                    Values::Int64(v) => v[offset].to_string(),
                }
            }
        }
    }
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn project<'a>(variable: &'a Variable, dims: &[String]) -> Option<Source<'a>> {
    let axes = variable
        .dims()
        .iter()
        .map(|d| dims.iter().position(|full| full == d))
        .collect::<Option<Vec<_>>>()?;
    Some(Source::Variable(variable, axes))
}

/// Write a dataset as a tidy CSV table.
///
/// Every data variable must have the same dims in the same order.
pub fn write_csv<W: Write>(ds: &Dataset, writer: W) -> Result<()> {
    let Some((_, first)) = ds.data_vars().iter().next() else {
        return Ok(());
    };
    let dims = first.dims().to_vec();
    let shape = first.shape().to_vec();
    if let Some((name, _)) = ds.data_vars().iter().find(|(_, v)| v.dims() != dims.as_slice()) {
        return Err(Error::dataset(format!(
            "cannot tabulate '{name}': all data variables must share dims {dims:?}"
        )));
    }

    let mut columns = Vec::new();
    for (axis, dim) in dims.iter().enumerate() {
        let source = match ds.coord(dim) {
            Some(coord) if coord.dims() == std::slice::from_ref(dim) => {
                project(coord, &dims).unwrap_or(Source::Index(axis))
            }
            _ => Source::Index(axis),
        };
        columns.push(Column {
            header: dim.clone(),
            source,
        });
    }
    for (name, coord) in ds.coords() {
        if dims.contains(name) || coord.dims().is_empty() {
            continue;
        }
        if let Some(source) = project(coord, &dims) {
            columns.push(Column {
                header: name.clone(),
                source,
            });
        }
    }
    for (name, variable) in ds.data_vars() {
        if let Some(source) = project(variable, &dims) {
            columns.push(Column {
                header: name.clone(),
                source,
            });
        }
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns.iter().map(|c| c.header.as_str()))?;

    let total: usize = shape.iter().product();
    let mut index = vec![0usize; shape.len()];
    for _ in 0..total {
        csv.write_record(columns.iter().map(|c| c.cell(&index)))?;
        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    csv.flush().map_err(|e| Error::io_with_path(e, "<csv>"))?;
    Ok(())
}

// ============================================================================
// Dispatch
// ============================================================================

/// Write a dataset in `format` to `writer`.
pub fn write_to<W: Write>(ds: &Dataset, writer: W, format: OutputFormat, pretty: bool) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(ds, writer, pretty),
        OutputFormat::Csv => write_csv(ds, writer),
    }
}

/// Write a dataset in `format` to a file, or to stdout when `path` is `None`.
pub fn write_dataset(
    ds: &Dataset,
    path: Option<&Path>,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| Error::io_with_path(e, path))?;
            let mut writer = BufWriter::new(file);
            write_to(ds, &mut writer, format, pretty)?;
            writer.flush().map_err(|e| Error::io_with_path(e, path))?;
            tracing::info!(path = %path.display(), format = %format, "Wrote dataset");
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_to(ds, &mut writer, format, pretty)?;
            writer
                .flush()
                .map_err(|e| Error::io_with_path(e, "<stdout>"))?;
        }
    }
    Ok(())
}
