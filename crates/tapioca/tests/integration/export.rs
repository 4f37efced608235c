//! Integration tests for exporting datasets read from disk.

use std::fs::File;

use tapioca::export::{read_json, write_csv, write_dataset};
use tapioca::{read_mandyoc_data, read_mandyoc_particles, GridOptions, OutputFormat, ParticleOptions, Quantity};

use crate::common::{field_value, model_2d, ModelDir};

#[test]
fn test_grid_json_round_trip() {
    let model = model_2d(true);
    let options = GridOptions::new()
        .with_datasets([Quantity::Temperature, Quantity::Velocity])
        .with_filetype(tapioca::FileType::Binary);
    let ds = read_mandyoc_data(model.path(), &options).unwrap();

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("grid.json");
    write_dataset(&ds, Some(&path), OutputFormat::Json, false).unwrap();

    let back = read_json(File::open(&path).unwrap()).unwrap();
    assert_eq!(back, ds);
}

#[test]
fn test_grid_csv_has_one_row_per_node_and_time() {
    let model = model_2d(false);
    let ds = read_mandyoc_data(
        model.path(),
        &GridOptions::new().with_datasets([Quantity::Temperature]),
    )
    .unwrap();

    let mut out = Vec::new();
    write_csv(&ds, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "time,x,z,step,temperature");
    assert_eq!(lines.len(), 1 + 3 * 3 * 2);
    // first time, x = 1000, z = 0: Fortran index 1 + 3 = 4
    let row: Vec<&str> = lines[4].split(',').collect();
    assert_eq!(row[1], "1000");
    assert_eq!(row[2], "0");
    assert_eq!(row[3], "0");
    assert_eq!(row[4].parse::<f64>().unwrap(), field_value(0, 4));
}

#[test]
fn test_particle_csv_leaves_missing_cells_empty() {
    let model = ModelDir::new();
    model.write_parameters(&[3, 2], &[1.0, 1.0], 10, 10);
    model.write_time(0, 0.0);
    model.write_time(10, 1.0e6);
    model.write_ascii_particles(0, 0, &[(1.0, -1.0, 1, 0, 0.0), (2.0, -2.0, 2, 0, 0.0)]);
    model.write_ascii_particles(10, 0, &[(1.5, -1.5, 1, 0, 0.5)]);
    let ds = read_mandyoc_particles(model.path(), &ParticleOptions::new()).unwrap();

    let mut out = Vec::new();
    write_csv(&ds, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "time,particle_id,step,cumulative_strain,layer,x,z");
    assert_eq!(lines[4], "1,2,10,,,,");
}
