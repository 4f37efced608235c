//! Common fixtures for tapioca integration tests.
//!
//! Builds synthetic Mandyoc model directories inside a temporary directory.

#![allow(dead_code)]

use std::path::Path;

use tapioca::io::particle_bin::encode_particle_file;
use tapioca::io::petsc::encode_vec;
use tapioca::particles::ParticleRecords;
use tapioca::PARAMETERS_FILE;
use tempfile::TempDir;

/// A temporary Mandyoc output directory.
pub struct ModelDir {
    dir: TempDir,
}

impl ModelDir {
    /// Creates an empty model directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Path of the model directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, contents: impl AsRef<[u8]>) {
        std::fs::write(self.path().join(name), contents).expect("write fixture file");
    }

    /// Writes the parameters file.
    pub fn write_parameters(&self, shape: &[usize], max_coords: &[f64], print_step: i64, step_max: i64) {
        let shape: Vec<String> = shape.iter().map(ToString::to_string).collect();
        let coords: Vec<String> = max_coords.iter().map(ToString::to_string).collect();
        self.write(
            PARAMETERS_FILE,
            format!(
                "{}\n{}\n\nprint_step {print_step}\nstepMAX {step_max}\ntimeMAX 1.0e9\ngeoq on\n",
                shape.join(" "),
                coords.join(" ")
            ),
        );
    }

    /// Writes the time file of `step`.
    pub fn write_time(&self, step: i64, years: f64) {
        self.write(&format!("Tempo_{step}.txt"), format!("Tempo: {years}\n"));
    }

    /// Writes a field file as Mandyoc does in ASCII mode.
    pub fn write_ascii_field(&self, basename: &str, step: i64, values: &[f64]) {
        let mut text = String::from("Vec Object: 1 MPI processes\n  type: seq\n");
        for v in values {
            text.push_str(&format!("{v:e}\n"));
        }
        self.write(&format!("{basename}_{step}.txt"), text);
    }

    /// Writes a field file in PETSc binary format.
    pub fn write_binary_field(&self, basename: &str, step: i64, values: &[f64]) {
        self.write(&format!("{basename}_{step}.bin"), encode_vec(values));
    }

    /// Writes a 2D ASCII particle file: `(x, z, id, layer, strain)` rows.
    pub fn write_ascii_particles(&self, step: i64, rank: usize, rows: &[(f64, f64, i64, i64, f64)]) {
        let mut text = String::new();
        for (x, z, id, layer, strain) in rows {
            text.push_str(&format!("{x} {z} {id} {layer} {strain}\n"));
        }
        self.write(&format!("step_{step}-rank_new{rank}.txt"), text);
    }

    /// Writes a binary particle file.
    pub fn write_binary_particles(&self, step: i64, rank: usize, records: &ParticleRecords) {
        self.write(
            &format!("step_{step}-rank_new{rank}.bin"),
            encode_particle_file(records),
        );
    }
}

/// Grid used by the 2D fixtures: 3 nodes along x, 2 along z.
pub const SHAPE_2D: [usize; 2] = [3, 2];

/// Field value at `step` for the node with Fortran index `k`.
pub fn field_value(step: i64, k: usize) -> f64 {
    step as f64 * 100.0 + k as f64
}

/// A 2D model with steps 0, 10 and 20, temperature and velocity in the
/// given encoding.
pub fn model_2d(binary: bool) -> ModelDir {
    let model = ModelDir::new();
    model.write_parameters(&SHAPE_2D, &[2000.0, 1000.0], 10, 20);
    let nodes: usize = SHAPE_2D.iter().product();
    for (step, years) in [(0, 0.0), (10, 5.0e5), (20, 1.0e6)] {
        model.write_time(step, years);
        let temperature: Vec<f64> = (0..nodes).map(|k| field_value(step, k)).collect();
        let velocity: Vec<f64> = (0..nodes)
            .flat_map(|k| [k as f64, -(k as f64)])
            .collect();
        if binary {
            model.write_binary_field("temperature", step, &temperature);
            model.write_binary_field("velocity", step, &velocity);
        } else {
            model.write_ascii_field("temperature", step, &temperature);
            model.write_ascii_field("velocity", step, &velocity);
        }
    }
    model
}
