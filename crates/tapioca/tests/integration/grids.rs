//! Integration tests for reading grid fields.

use tapioca::{read_mandyoc_data, Error, FileType, GridOptions, Quantity, StepRange};

use crate::common::{field_value, model_2d, ModelDir, SHAPE_2D};

fn temperature_and_velocity() -> GridOptions {
    GridOptions::new().with_datasets([Quantity::Temperature, Quantity::Velocity])
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

#[test]
fn test_read_ascii_grid_layout() {
    let model = model_2d(false);
    let ds = read_mandyoc_data(model.path(), &temperature_and_velocity()).unwrap();

    let dims = ds.dims();
    assert_eq!(dims.get("time"), Some(&3));
    assert_eq!(dims.get("x"), Some(&3));
    assert_eq!(dims.get("z"), Some(&2));

    assert_eq!(ds.coord("step").unwrap().as_i64().unwrap(), &[0, 10, 20]);
    let times = ds.coord("time").unwrap().as_f64().unwrap();
    assert_close(times[0], 0.0);
    assert_close(times[1], 0.5);
    assert_close(times[2], 1.0);

    assert_eq!(ds.coord("x").unwrap().as_f64().unwrap(), &[0.0, 1000.0, 2000.0]);
    assert_eq!(ds.coord("z").unwrap().as_f64().unwrap(), &[-1000.0, 0.0]);

    let temperature = ds.var("temperature").unwrap();
    assert_eq!(
        temperature.dims(),
        &["time".to_string(), "x".to_string(), "z".to_string()]
    );
    let (nx, nz) = (SHAPE_2D[0], SHAPE_2D[1]);
    for (t, step) in [0i64, 10, 20].into_iter().enumerate() {
        for ix in 0..nx {
            for iz in 0..nz {
                let expected = field_value(step, ix + nx * iz);
                assert_eq!(temperature.get(&[t, ix, iz]), Some(expected));
            }
        }
    }
}

#[test]
fn test_velocity_is_split_into_components() {
    let model = model_2d(false);
    let ds = read_mandyoc_data(model.path(), &temperature_and_velocity()).unwrap();

    assert!(ds.var("velocity").is_none());
    let vx = ds.var("velocity_x").unwrap();
    let vz = ds.var("velocity_z").unwrap();
    // node (ix=2, iz=1) has Fortran index 5
    assert_eq!(vx.get(&[1, 2, 1]), Some(5.0));
    assert_eq!(vz.get(&[1, 2, 1]), Some(-5.0));
    assert_eq!(vx.get(&[0, 1, 0]), Some(1.0));
}

#[test]
fn test_binary_and_ascii_agree() {
    let ascii = model_2d(false);
    let binary = model_2d(true);
    let from_ascii = read_mandyoc_data(ascii.path(), &temperature_and_velocity()).unwrap();
    let from_binary = read_mandyoc_data(
        binary.path(),
        &temperature_and_velocity().with_filetype(FileType::Binary),
    )
    .unwrap();
    assert_eq!(from_ascii, from_binary);
}

#[test]
fn test_attributes_carry_parameters_and_units() {
    let model = model_2d(false);
    let ds = read_mandyoc_data(
        model.path(),
        &GridOptions::new().with_datasets([Quantity::Temperature]),
    )
    .unwrap();
    let attrs = ds.attrs();
    assert_eq!(attrs.get("print_step").map(ToString::to_string), Some("10".into()));
    assert_eq!(attrs.get("geoq").map(ToString::to_string), Some("on".into()));
    assert_eq!(
        attrs.get("region").map(ToString::to_string),
        Some("(0, 2000, -1000, 0)".into())
    );
    assert_eq!(attrs.get("times_units").map(ToString::to_string), Some("Ma".into()));
}

#[test]
fn test_steps_slice_limits_time_axis() {
    let model = model_2d(false);
    let ds = read_mandyoc_data(
        model.path(),
        &GridOptions::new()
            .with_datasets([Quantity::Temperature])
            .with_steps(StepRange::new(10, 20)),
    )
    .unwrap();
    assert_eq!(ds.coord("step").unwrap().as_i64().unwrap(), &[10, 20]);
    let snapshot = ds.isel("time", 0).unwrap();
    assert_eq!(
        snapshot.var("temperature").unwrap().get(&[0, 0]),
        Some(field_value(10, 0))
    );
}

#[test]
fn test_reading_stops_at_last_time_file() {
    let model = model_2d(false);
    std::fs::remove_file(model.path().join("Tempo_20.txt")).unwrap();
    let ds = read_mandyoc_data(
        model.path(),
        &GridOptions::new().with_datasets([Quantity::Temperature]),
    )
    .unwrap();
    assert_eq!(ds.dims().get("time"), Some(&2));
}

#[test]
fn test_tiny_values_are_flushed() {
    let model = ModelDir::new();
    model.write_parameters(&[2, 1], &[1.0, 1.0], 1, 0);
    model.write_time(0, 0.0);
    model.write_ascii_field("density", 0, &[1.0e-250, 3300.0]);
    let ds = read_mandyoc_data(
        model.path(),
        &GridOptions::new().with_datasets([Quantity::Density]),
    )
    .unwrap();
    assert_eq!(ds.var("density").unwrap().as_f64().unwrap(), &[0.0, 3300.0]);
}

#[test]
fn test_radiogenic_heat_reads_heat_files() {
    let model = ModelDir::new();
    model.write_parameters(&[2, 1], &[1.0, 1.0], 1, 0);
    model.write_time(0, 0.0);
    model.write_ascii_field("heat", 0, &[1.0e-6, 2.0e-6]);
    let ds = read_mandyoc_data(
        model.path(),
        &GridOptions::new().with_datasets([Quantity::RadiogenicHeat]),
    )
    .unwrap();
    assert!(ds.var("radiogenic_heat").is_some());
}

#[test]
fn test_read_3d_grid() {
    let model = ModelDir::new();
    model.write_parameters(&[2, 2, 2], &[10.0, 20.0, 30.0], 5, 5);
    model.write_time(0, 0.0);
    let values: Vec<f64> = (0..8).map(f64::from).collect();
    model.write_ascii_field("pressure", 0, &values);
    let ds = read_mandyoc_data(
        model.path(),
        &GridOptions::new().with_datasets([Quantity::Pressure]),
    )
    .unwrap();

    assert_eq!(ds.coord("y").unwrap().as_f64().unwrap(), &[0.0, 20.0]);
    assert_eq!(ds.coord("z").unwrap().as_f64().unwrap(), &[-30.0, 0.0]);
    let pressure = ds.var("pressure").unwrap();
    assert_eq!(pressure.shape(), &[1, 2, 2, 2]);
    // Fortran index of (ix=1, iy=0, iz=1) is 1 + 4 = 5
    assert_eq!(pressure.get(&[0, 1, 0, 1]), Some(5.0));
}

#[test]
fn test_read_3d_velocity() {
    let model = ModelDir::new();
    model.write_parameters(&[2, 2, 2], &[10.0, 20.0, 30.0], 5, 0);
    model.write_time(0, 0.0);
    // Component c of node k is 100 * c + k, interleaved per node.
    let values: Vec<f64> = (0..8)
        .flat_map(|k| (0..3).map(move |c| f64::from(100 * c + k)))
        .collect();
    model.write_ascii_field("velocity", 0, &values);
    let ds = read_mandyoc_data(
        model.path(),
        &GridOptions::new().with_datasets([Quantity::Velocity]),
    )
    .unwrap();

    let (vx, vy, vz) = (
        ds.var("velocity_x").unwrap(),
        ds.var("velocity_y").unwrap(),
        ds.var("velocity_z").unwrap(),
    );
    assert_eq!(vy.shape(), &[1, 2, 2, 2]);
    // Fortran index of (ix=1, iy=0, iz=1) is 5
    assert_eq!(vx.get(&[0, 1, 0, 1]), Some(5.0));
    assert_eq!(vy.get(&[0, 1, 0, 1]), Some(105.0));
    assert_eq!(vz.get(&[0, 1, 0, 1]), Some(205.0));
    // Fortran index of (ix=0, iy=1, iz=1) is 6
    assert_eq!(vy.get(&[0, 0, 1, 1]), Some(106.0));
}

#[test]
fn test_oversized_shape_is_rejected() {
    let model = ModelDir::new();
    model.write_parameters(&[1 << 32, 1 << 32], &[1.0, 1.0], 5, 0);
    model.write_time(0, 0.0);
    let err = read_mandyoc_data(model.path(), &temperature_and_velocity()).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { ref key, .. } if key == "shape"));
}

#[test]
fn test_wrong_value_count_is_shape_mismatch() {
    let model = model_2d(false);
    model.write_ascii_field("temperature", 10, &[1.0, 2.0]);
    let err = read_mandyoc_data(
        model.path(),
        &GridOptions::new().with_datasets([Quantity::Temperature]),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::ShapeMismatch {
            expected: 6,
            found: 2,
            ..
        }
    ));
}

#[test]
fn test_missing_field_file_is_io_error() {
    let model = model_2d(false);
    let err = read_mandyoc_data(
        model.path(),
        &GridOptions::new().with_datasets([Quantity::Viscosity]),
    )
    .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_missing_parameters_file() {
    let model = ModelDir::new();
    let err = read_mandyoc_data(model.path(), &GridOptions::new()).unwrap_err();
    assert!(err.is_not_found());
}
