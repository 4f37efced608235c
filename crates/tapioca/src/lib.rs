#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Tapioca Core Library
//!
//! Readers for Mandyoc output directories and the labeled dataset they are
//! loaded into.
//!
//! # Modules
//!
//! - [`parameters`]: Grid and cadence parameters of a model run
//! - [`times`]: Saved steps and their model time
//! - [`grids`]: Scalar and velocity fields on the grid
//! - [`particles`]: Lagrangian particle positions, layers and strain
//! - [`dataset`]: Labeled arrays the readers produce
//! - [`export`]: JSON and CSV writers
//! - [`io`]: Low-level text and binary codecs

pub mod dataset;
pub mod error;
pub mod export;
pub mod filetype;
pub mod grids;
pub mod io;
pub mod parameters;
pub mod particles;
pub mod times;

// Re-exports for convenience
pub use dataset::{Attr, Dataset, Values, Variable};
pub use error::{Error, Result};
pub use export::OutputFormat;
pub use filetype::FileType;
pub use grids::{read_mandyoc_data, GridOptions, Quantity};
pub use parameters::{read_parameters, Parameters, PARAMETERS_FILE};
pub use particles::{read_mandyoc_particles, ParticleOptions};
pub use times::{read_times, StepRange, Timeline};
