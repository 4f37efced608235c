//! Labeled multi-dimensional arrays.
//!
//! A [`Dataset`] groups named [`Variable`]s that share dimension names, in
//! the spirit of netCDF/xarray datasets:
//!
//! - **coordinates** label positions along a dimension (`time`, `x`, ...)
//!   or carry auxiliary per-dimension data (`step` along `time`)
//! - **data variables** hold the model fields
//! - **attributes** carry free-form metadata (grid parameters, units)
//!
//! Every dimension name has exactly one size across the whole dataset; this
//! is checked on insertion.
//!
//! ```
//! use tapioca::dataset::{Dataset, Variable};
//!
//! let mut ds = Dataset::new();
//! ds.insert_coord("time", Variable::float_1d("time", vec![0.0, 1.0])).unwrap();
//! ds.insert_var(
//!     "temperature",
//!     Variable::float(["time", "x"], vec![2, 3], vec![0.0; 6]).unwrap(),
//! )
//! .unwrap();
//!
//! assert_eq!(ds.dims().get("x"), Some(&3));
//! let first = ds.isel("time", 0).unwrap();
//! assert_eq!(first.var("temperature").unwrap().shape(), &[3]);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Attributes
// ============================================================================

/// Attribute value attached to a dataset or variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attr {
    /// Integer scalar
    Int(i64),
    /// Float scalar
    Float(f64),
    /// Free text
    Text(String),
    /// Integer list
    Ints(Vec<i64>),
    /// Float list
    Floats(Vec<f64>),
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Int(v) => write!(f, "{v}"),
            Attr::Float(v) => write!(f, "{v}"),
            Attr::Text(v) => f.write_str(v),
            Attr::Ints(v) => write_list(f, v),
            Attr::Floats(v) => write_list(f, v),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

// ============================================================================
// Values
// ============================================================================

/// Typed, flat storage of a variable's elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "data", rename_all = "lowercase")]
pub enum Values {
    /// 64-bit floats. NaN marks missing data.
    Float64(#[serde(with = "nan_as_null")] Vec<f64>),
    /// 64-bit integers.
    Int64(Vec<i64>),
}

impl Values {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Values::Float64(v) => v.len(),
            Values::Int64(v) => v.len(),
        }
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at a flat index, widened to `f64`.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            Values::Float64(v) => v.get(index).copied(),
            Values::Int64(v) => v.get(index).map(|&i| i as f64),
        }
    }

    /// Name of the element type, as shown in summaries.
    pub fn dtype(&self) -> &'static str {
        match self {
            Values::Float64(_) => "float64",
            Values::Int64(_) => "int64",
        }
    }
}

/// JSON has no NaN; missing floats travel as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            values
                .iter()
                .map(|v| if v.is_nan() { None } else { Some(*v) }),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

// ============================================================================
// Variable
// ============================================================================

/// A named-dimension array stored in row-major (C) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    dims: Vec<String>,
    shape: Vec<usize>,
    values: Values,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attrs: BTreeMap<String, Attr>,
}

impl Variable {
    /// Create a variable, checking that dims, shape and values agree.
    pub fn new(dims: Vec<String>, shape: Vec<usize>, values: Values) -> Result<Self> {
        let variable = Self {
            dims,
            shape,
            values,
            attrs: BTreeMap::new(),
        };
        variable.validate()?;
        Ok(variable)
    }

    /// Create a float variable.
    pub fn float<I, D>(dims: I, shape: Vec<usize>, data: Vec<f64>) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        Self::new(
            dims.into_iter().map(Into::into).collect(),
            shape,
            Values::Float64(data),
        )
    }

    /// Create an integer variable.
    pub fn int<I, D>(dims: I, shape: Vec<usize>, data: Vec<i64>) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        Self::new(
            dims.into_iter().map(Into::into).collect(),
            shape,
            Values::Int64(data),
        )
    }

    /// One-dimensional float variable along `dim`.
    pub fn float_1d(dim: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            dims: vec![dim.into()],
            shape: vec![data.len()],
            values: Values::Float64(data),
            attrs: BTreeMap::new(),
        }
    }

    /// One-dimensional integer variable along `dim`.
    pub fn int_1d(dim: impl Into<String>, data: Vec<i64>) -> Self {
        Self {
            dims: vec![dim.into()],
            shape: vec![data.len()],
            values: Values::Int64(data),
            attrs: BTreeMap::new(),
        }
    }

    /// Attach an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: Attr) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.dims.len() != self.shape.len() {
            return Err(Error::dataset(format!(
                "{} dims {:?} for a {}-dimensional shape",
                self.dims.len(),
                self.dims,
                self.shape.len()
            )));
        }
        let expected: usize = self.shape.iter().product();
        if self.values.len() != expected {
            return Err(Error::dataset(format!(
                "shape {:?} needs {expected} values, got {}",
                self.shape,
                self.values.len()
            )));
        }
        for (i, dim) in self.dims.iter().enumerate() {
            if self.dims[..i].contains(dim) {
                return Err(Error::dataset(format!("repeated dimension '{dim}'")));
            }
        }
        Ok(())
    }

    /// Dimension names, outermost first.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Size along each dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Raw values.
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Attributes of this variable.
    pub fn attrs(&self) -> &BTreeMap<String, Attr> {
        &self.attrs
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the variable has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Float data, if this is a float variable.
    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.values {
            Values::Float64(v) => Some(v),
            Values::Int64(_) => None,
        }
    }

    /// Integer data, if this is an integer variable.
    pub fn as_i64(&self) -> Option<&[i64]> {
        match &self.values {
            Values::Int64(v) => Some(v),
            Values::Float64(_) => None,
        }
    }

    /// Position of `dim` in this variable's dims.
    pub fn axis(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Flat row-major offset of a multi-index.
    pub fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &n) in index.iter().zip(&self.shape) {
            if i >= n {
                return None;
            }
            offset = offset * n + i;
        }
        Some(offset)
    }

    /// Element at a multi-index, widened to `f64`.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.offset(index).and_then(|o| self.values.get_f64(o))
    }

    /// Smallest non-NaN value.
    pub fn min(&self) -> Option<f64> {
        self.finite_fold(f64::min)
    }

    /// Largest non-NaN value.
    pub fn max(&self) -> Option<f64> {
        self.finite_fold(f64::max)
    }

    fn finite_fold(&self, pick: fn(f64, f64) -> f64) -> Option<f64> {
        (0..self.len())
            .filter_map(|i| self.values.get_f64(i))
            .filter(|v| !v.is_nan())
            .reduce(pick)
    }

    /// Select one index along `dim`, dropping that dimension.
    pub fn isel(&self, dim: &str, index: usize) -> Result<Variable> {
        let axis = self
            .axis(dim)
            .ok_or_else(|| Error::dataset(format!("variable has no dimension '{dim}'")))?;
        let n = self.shape[axis];
        if index >= n {
            return Err(Error::dataset(format!(
                "index {index} out of bounds for dimension '{dim}' of size {n}"
            )));
        }
        let outer: usize = self.shape[..axis].iter().product();
        let inner: usize = self.shape[axis + 1..].iter().product();

        let values = match &self.values {
            Values::Float64(v) => Values::Float64(take_slab(v, outer, n, inner, index)),
            Values::Int64(v) => Values::Int64(take_slab(v, outer, n, inner, index)),
        };
        let mut dims = self.dims.clone();
        dims.remove(axis);
        let mut shape = self.shape.clone();
        shape.remove(axis);

        Ok(Variable {
            dims,
            shape,
            values,
            attrs: self.attrs.clone(),
        })
    }

    fn summary(&self) -> String {
        let range = match (self.min(), self.max()) {
            (Some(lo), Some(hi)) => format!("min={lo:e} max={hi:e}"),
            _ => "all missing".to_string(),
        };
        format!("({}) {} {range}", self.dims.join(", "), self.values.dtype())
    }
}

fn take_slab<T: Copy>(data: &[T], outer: usize, n: usize, inner: usize, index: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(outer * inner);
    for o in 0..outer {
        let start = (o * n + index) * inner;
        out.extend_from_slice(&data[start..start + inner]);
    }
    out
}

/// Reorder a column-major (Fortran) buffer into row-major (C) order.
///
/// Returns `None` when `flat` does not hold exactly `product(shape)` values.
pub fn fortran_to_c<T: Copy>(flat: &[T], shape: &[usize]) -> Option<Vec<T>> {
    let total: usize = shape.iter().product();
    if flat.len() != total {
        return None;
    }
    let mut strides = vec![1usize; shape.len()];
    for axis in 1..shape.len() {
        strides[axis] = strides[axis - 1] * shape[axis - 1];
    }

    let mut index = vec![0usize; shape.len()];
    let mut out = Vec::with_capacity(total);
    for _ in 0..total {
        let offset: usize = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
        out.push(flat[offset]);
        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    Some(out)
}

// ============================================================================
// Dataset
// ============================================================================

/// A collection of coordinates, data variables and attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    coords: BTreeMap<String, Variable>,
    #[serde(default)]
    data_vars: BTreeMap<String, Variable>,
    #[serde(default)]
    attrs: BTreeMap<String, Attr>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a coordinate.
    pub fn insert_coord(&mut self, name: impl Into<String>, variable: Variable) -> Result<()> {
        let name = name.into();
        self.check_dims(&name, &variable)?;
        self.coords.insert(name, variable);
        Ok(())
    }

    /// Add or replace a data variable.
    pub fn insert_var(&mut self, name: impl Into<String>, variable: Variable) -> Result<()> {
        let name = name.into();
        self.check_dims(&name, &variable)?;
        self.data_vars.insert(name, variable);
        Ok(())
    }

    /// Set a dataset attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: Attr) {
        self.attrs.insert(key.into(), value);
    }

    /// Replace all dataset attributes.
    pub fn with_attrs(mut self, attrs: BTreeMap<String, Attr>) -> Self {
        self.attrs = attrs;
        self
    }

    fn check_dims(&self, name: &str, variable: &Variable) -> Result<()> {
        let sizes = self.dims_excluding(name);
        for (dim, &size) in variable.dims.iter().zip(&variable.shape) {
            if let Some(&existing) = sizes.get(dim) {
                if existing != size {
                    return Err(Error::dataset(format!(
                        "'{name}' has size {size} along '{dim}', dataset has {existing}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn dims_excluding(&self, skip: &str) -> BTreeMap<String, usize> {
        let mut sizes = BTreeMap::new();
        for (name, variable) in self.coords.iter().chain(self.data_vars.iter()) {
            if name == skip {
                continue;
            }
            for (dim, &size) in variable.dims.iter().zip(&variable.shape) {
                sizes.entry(dim.clone()).or_insert(size);
            }
        }
        sizes
    }

    /// Re-check invariants of a dataset built without the insert methods
    /// (e.g. deserialized).
    pub fn validate(&self) -> Result<()> {
        let mut sizes: BTreeMap<&str, usize> = BTreeMap::new();
        for (name, variable) in self.coords.iter().chain(self.data_vars.iter()) {
            variable
                .validate()
                .map_err(|e| Error::dataset(format!("'{name}': {e}")))?;
            for (dim, &size) in variable.dims.iter().zip(&variable.shape) {
                let existing = *sizes.entry(dim.as_str()).or_insert(size);
                if existing != size {
                    return Err(Error::dataset(format!(
                        "'{name}' has size {size} along '{dim}', dataset has {existing}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Size of every dimension used in the dataset.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        self.dims_excluding("")
    }

    /// Coordinate by name.
    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    /// Data variable by name.
    pub fn var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    /// All coordinates, by name.
    pub fn coords(&self) -> &BTreeMap<String, Variable> {
        &self.coords
    }

    /// All data variables, by name.
    pub fn data_vars(&self) -> &BTreeMap<String, Variable> {
        &self.data_vars
    }

    /// Dataset attributes.
    pub fn attrs(&self) -> &BTreeMap<String, Attr> {
        &self.attrs
    }

    /// Index of `time` in the `time` coordinate.
    ///
    /// Times are compared with a small relative tolerance since they come
    /// from a unit conversion.
    pub fn time_index(&self, time: f64) -> Option<usize> {
        let times = self.coord("time")?.as_f64()?;
        let tolerance = 1.0e-9 * time.abs().max(1.0);
        times.iter().position(|t| (t - time).abs() <= tolerance)
    }

    /// Select one index along `dim` in every variable that has it.
    ///
    /// Variables without `dim` are kept unchanged; the coordinate of `dim`
    /// becomes a zero-dimensional (scalar) coordinate.
    pub fn isel(&self, dim: &str, index: usize) -> Result<Dataset> {
        let size = self
            .dims()
            .get(dim)
            .copied()
            .ok_or_else(|| Error::dataset(format!("dataset has no dimension '{dim}'")))?;
        if index >= size {
            return Err(Error::dataset(format!(
                "index {index} out of bounds for dimension '{dim}' of size {size}"
            )));
        }
        let select = |vars: &BTreeMap<String, Variable>| -> Result<BTreeMap<String, Variable>> {
            vars.iter()
                .map(|(name, variable)| {
                    let selected = if variable.axis(dim).is_some() {
                        variable.isel(dim, index)?
                    } else {
                        variable.clone()
                    };
                    Ok((name.clone(), selected))
                })
                .collect()
        };
        Ok(Dataset {
            coords: select(&self.coords)?,
            data_vars: select(&self.data_vars)?,
            attrs: self.attrs.clone(),
        })
    }

    /// Select the snapshot at model time `time` (Ma).
    pub fn sel_time(&self, time: f64) -> Result<Dataset> {
        let index = self
            .time_index(time)
            .ok_or_else(|| Error::dataset(format!("time {time} not found")))?;
        self.isel("time", index)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<tapioca.Dataset>")?;
        let dims: Vec<String> = self
            .dims()
            .iter()
            .map(|(name, size)| format!("{name}: {size}"))
            .collect();
        writeln!(f, "Dimensions:  ({})", dims.join(", "))?;

        let width = self
            .coords
            .keys()
            .chain(self.data_vars.keys())
            .map(String::len)
            .max()
            .unwrap_or(0);

        writeln!(f, "Coordinates:")?;
        for (name, variable) in &self.coords {
            let marker = if variable.dims.len() == 1 && variable.dims[0] == *name {
                '*'
            } else {
                ' '
            };
            writeln!(f, "  {marker} {name:<width$}  {}", variable.summary())?;
        }
        writeln!(f, "Data variables:")?;
        for (name, variable) in &self.data_vars {
            writeln!(f, "    {name:<width$}  {}", variable.summary())?;
        }
        if !self.attrs.is_empty() {
            writeln!(f, "Attributes:")?;
            for (key, value) in &self.attrs {
                writeln!(f, "    {key}: {value}")?;
            }
        }
        Ok(())
    }
}
