//! # tapioca-cli
//!
//! The `tapioca` command: inspect Mandyoc output directories and export
//! their grid and particle data as JSON or CSV.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;
pub mod error;
pub mod logging;

pub use commands::run;
pub use error::{Error, Result};
