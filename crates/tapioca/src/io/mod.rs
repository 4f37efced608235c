//! Low-level readers for the file encodings Mandyoc writes.
//!
//! # Modules
//!
//! - [`ascii`]: Whitespace/delimiter separated text tables
//! - [`petsc`]: PETSc `Vec` binary files (field data)
//! - [`particle_bin`]: Raw binary particle files

pub mod ascii;
pub mod particle_bin;
pub mod petsc;

/// Values smaller than this in magnitude are flushed to zero on read.
pub const ZERO_THRESHOLD: f64 = 1.0e-200;

/// Flush denormal-scale values to exactly zero in place.
pub fn flush_tiny(values: &mut [f64]) {
    for v in values.iter_mut() {
        if v.abs() < ZERO_THRESHOLD {
            *v = 0.0;
        }
    }
}
