//! Integration tests for reading particle files.

use tapioca::particles::ParticleRecords;
use tapioca::{read_mandyoc_particles, Error, FileType, ParticleOptions, StepRange};

use crate::common::ModelDir;

/// Two ranks, steps 0 and 10. Particle 3 leaves the domain at step 10.
fn two_rank_model() -> ModelDir {
    let model = ModelDir::new();
    model.write_parameters(&[3, 2], &[2000.0, 1000.0], 10, 10);
    model.write_time(0, 0.0);
    model.write_time(10, 2.0e6);

    model.write_ascii_particles(0, 0, &[(1.0, -1.0, 1, 0, 0.0), (2.0, -2.0, 2, 1, 0.0)]);
    model.write_ascii_particles(0, 1, &[(3.0, -3.0, 3, 1, 0.0)]);
    // particles may migrate between ranks
    model.write_ascii_particles(10, 0, &[(2.5, -2.5, 2, 1, 0.2)]);
    model.write_ascii_particles(10, 1, &[(1.5, -1.5, 1, 0, 0.1)]);
    model
}

#[test]
fn test_read_ascii_particles() {
    let model = two_rank_model();
    let ds = read_mandyoc_particles(model.path(), &ParticleOptions::new()).unwrap();

    assert_eq!(ds.coord("particle_id").unwrap().as_i64().unwrap(), &[1, 2, 3]);
    assert_eq!(ds.coord("step").unwrap().as_i64().unwrap(), &[0, 10]);
    assert_eq!(ds.dims().get("time"), Some(&2));

    let x = ds.var("x").unwrap();
    assert_eq!(x.dims(), &["time".to_string(), "particle_id".to_string()]);
    assert_eq!(x.get(&[0, 0]), Some(1.0));
    assert_eq!(x.get(&[0, 2]), Some(3.0));
    assert_eq!(x.get(&[1, 0]), Some(1.5));
    assert_eq!(x.get(&[1, 1]), Some(2.5));
    assert!(x.get(&[1, 2]).unwrap().is_nan());

    let z = ds.var("z").unwrap();
    assert_eq!(z.get(&[1, 1]), Some(-2.5));
    let layer = ds.var("layer").unwrap();
    assert_eq!(layer.get(&[0, 1]), Some(1.0));
    let strain = ds.var("cumulative_strain").unwrap();
    assert_eq!(strain.get(&[1, 0]), Some(0.1));
    assert!(ds.var("y").is_none());
}

#[test]
fn test_snapshot_of_particles() {
    let model = two_rank_model();
    let ds = read_mandyoc_particles(model.path(), &ParticleOptions::new()).unwrap();
    let time = ds.coord("time").unwrap().as_f64().unwrap()[1];
    let snapshot = ds.sel_time(time).unwrap();
    let x = snapshot.var("x").unwrap();
    assert_eq!(x.shape(), &[3]);
    assert_eq!(x.min(), Some(1.5));
    assert_eq!(x.max(), Some(2.5));
}

#[test]
fn test_rank_count_must_not_change() {
    let model = two_rank_model();
    std::fs::remove_file(model.path().join("step_10-rank_new1.txt")).unwrap();
    let err = read_mandyoc_particles(model.path(), &ParticleOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::RankMismatch {
            step: 10,
            expected: 2,
            found: 1
        }
    ));
}

#[test]
fn test_unknown_particle_id() {
    let model = two_rank_model();
    model.write_ascii_particles(10, 1, &[(1.5, -1.5, 42, 0, 0.1)]);
    let err = read_mandyoc_particles(model.path(), &ParticleOptions::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownParticle { step: 10, id: 42 }));
}

#[test]
fn test_steps_slice_takes_ids_from_first_step_read() {
    let model = two_rank_model();
    let ds = read_mandyoc_particles(
        model.path(),
        &ParticleOptions::new().with_steps(StepRange::new(10, 10)),
    )
    .unwrap();
    assert_eq!(ds.coord("particle_id").unwrap().as_i64().unwrap(), &[2, 1]);
    assert_eq!(ds.var("x").unwrap().as_f64().unwrap(), &[2.5, 1.5]);
}

#[test]
fn test_read_binary_particles() {
    let model = ModelDir::new();
    model.write_parameters(&[3, 2], &[2000.0, 1000.0], 10, 10);
    model.write_time(0, 0.0);
    model.write_time(10, 1.0e6);
    let step0 = ParticleRecords {
        coordinates: vec![vec![10.0, 20.0], vec![-1.0, -2.0]],
        ids: vec![100, 200],
        layers: vec![0, 2],
        cumulative_strain: vec![0.0, 0.0],
    };
    let step10 = ParticleRecords {
        coordinates: vec![vec![21.0], vec![-2.5]],
        ids: vec![200],
        layers: vec![2],
        cumulative_strain: vec![0.75],
    };
    model.write_binary_particles(0, 0, &step0);
    model.write_binary_particles(10, 0, &step10);
    // ASCII files of another run must be ignored in binary mode
    model.write_ascii_particles(10, 1, &[(0.0, 0.0, 100, 0, 0.0)]);

    let ds = read_mandyoc_particles(
        model.path(),
        &ParticleOptions::new().with_filetype(FileType::Binary),
    )
    .unwrap();
    assert_eq!(ds.coord("particle_id").unwrap().as_i64().unwrap(), &[100, 200]);
    let x = ds.var("x").unwrap();
    assert!(x.get(&[1, 0]).unwrap().is_nan());
    assert_eq!(x.get(&[1, 1]), Some(21.0));
    assert_eq!(ds.var("cumulative_strain").unwrap().get(&[1, 1]), Some(0.75));
    assert_eq!(ds.var("layer").unwrap().get(&[0, 1]), Some(2.0));
}

#[test]
fn test_read_3d_ascii_particles() {
    let model = ModelDir::new();
    model.write_parameters(&[2, 2, 2], &[1.0, 1.0, 1.0], 1, 0);
    model.write_time(0, 0.0);
    std::fs::write(
        model.path().join("step_0-rank_new0.txt"),
        "0.1 0.2 -0.3 7 1 0.0\n",
    )
    .unwrap();
    let ds = read_mandyoc_particles(model.path(), &ParticleOptions::new()).unwrap();
    assert_eq!(ds.var("y").unwrap().get(&[0, 0]), Some(0.2));
    assert_eq!(ds.var("z").unwrap().get(&[0, 0]), Some(-0.3));
}

#[test]
fn test_read_3d_binary_particles() {
    let model = ModelDir::new();
    model.write_parameters(&[2, 2, 2], &[1.0, 1.0, 1.0], 1, 0);
    model.write_time(0, 0.0);
    let records = ParticleRecords {
        coordinates: vec![vec![0.1, 0.4], vec![0.2, 0.5], vec![-0.3, -0.6]],
        ids: vec![7, 8],
        layers: vec![1, 0],
        cumulative_strain: vec![0.0, 0.25],
    };
    model.write_binary_particles(0, 0, &records);

    let ds = read_mandyoc_particles(
        model.path(),
        &ParticleOptions::new().with_filetype(FileType::Binary),
    )
    .unwrap();
    assert_eq!(ds.coord("particle_id").unwrap().as_i64().unwrap(), &[7, 8]);
    let y = ds.var("y").unwrap();
    assert_eq!(y.get(&[0, 0]), Some(0.2));
    assert_eq!(y.get(&[0, 1]), Some(0.5));
    assert_eq!(ds.var("z").unwrap().get(&[0, 1]), Some(-0.6));
    assert_eq!(ds.var("cumulative_strain").unwrap().get(&[0, 1]), Some(0.25));
}

#[test]
fn test_no_time_files_gives_empty_dataset() {
    let model = ModelDir::new();
    model.write_parameters(&[3, 2], &[1.0, 1.0], 10, 10);
    let ds = read_mandyoc_particles(model.path(), &ParticleOptions::new()).unwrap();
    assert_eq!(ds.dims().get("time"), Some(&0));
    assert_eq!(ds.dims().get("particle_id"), Some(&0));
}
