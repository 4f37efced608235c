//! Raw binary particle files.
//!
//! Unlike field data these are not PETSc objects: each rank dumps its
//! particles as native (little-endian) arrays, one after another:
//!
//! | field               | type  | count       |
//! |---------------------|-------|-------------|
//! | particle count `n`  | `i32` | 1           |
//! | coordinates         | `f64` | `n * dim`, interleaved per particle |
//! | particle ids        | `i32` | `n`         |
//! | layer               | `i32` | `n`         |
//! | cumulative strain   | `f64` | `n`         |

use std::path::Path;

use crate::error::{Error, Result};
use crate::particles::ParticleRecords;

const SINT: usize = 4;
const SFLOAT: usize = 8;

/// Total byte length of a file holding `n` particles in `dimension` axes.
fn expected_len(n: usize, dimension: usize) -> Option<usize> {
    let per_particle = SFLOAT * dimension + SINT * 2 + SFLOAT;
    n.checked_mul(per_particle)?.checked_add(SINT)
}

/// Decode a binary particle file.
pub fn decode_particle_file(bytes: &[u8], dimension: usize, path: &Path) -> Result<ParticleRecords> {
    if bytes.len() < SINT {
        return Err(Error::binary(path, "file too short for a particle count"));
    }
    let mut reader = Reader { bytes, offset: 0 };
    let n = reader.i32();
    let n = usize::try_from(n)
        .map_err(|_| Error::binary(path, format!("negative particle count {n}")))?;

    match expected_len(n, dimension) {
        Some(len) if len == bytes.len() => {}
        Some(len) => {
            return Err(Error::binary(
                path,
                format!(
                    "{n} particles in {dimension}D need {len} bytes, file has {}",
                    bytes.len()
                ),
            ));
        }
        None => return Err(Error::binary(path, format!("particle count {n} overflows"))),
    }

    let mut coordinates = vec![Vec::with_capacity(n); dimension];
    for _ in 0..n {
        for axis in coordinates.iter_mut() {
            axis.push(reader.f64());
        }
    }
    let ids = (0..n).map(|_| i64::from(reader.i32())).collect();
    let layers = (0..n).map(|_| i64::from(reader.i32())).collect();
    let cumulative_strain = (0..n).map(|_| reader.f64()).collect();

    Ok(ParticleRecords {
        coordinates,
        ids,
        layers,
        cumulative_strain,
    })
}

/// Read and decode a binary particle file.
pub fn read_particle_file(path: &Path, dimension: usize) -> Result<ParticleRecords> {
    let bytes = std::fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
    decode_particle_file(&bytes, dimension, path)
}

/// Encode particle records in the binary particle layout.
///
/// Ids and layers outside the `i32` range saturate.
pub fn encode_particle_file(records: &ParticleRecords) -> Vec<u8> {
    let n = records.len();
    let dimension = records.coordinates.len();
    let mut out = Vec::with_capacity(expected_len(n, dimension).unwrap_or(0));
    out.extend_from_slice(&saturate(n as i64).to_le_bytes());
    for i in 0..n {
        for axis in &records.coordinates {
            out.extend_from_slice(&axis[i].to_le_bytes());
        }
    }
    for id in &records.ids {
        out.extend_from_slice(&saturate(*id).to_le_bytes());
    }
    for layer in &records.layers {
        out.extend_from_slice(&saturate(*layer).to_le_bytes());
    }
    for strain in &records.cumulative_strain {
        out.extend_from_slice(&strain.to_le_bytes());
    }
    out
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Cursor over a byte slice whose length has already been validated.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn i32(&mut self) -> i32 {
        let mut raw = [0u8; SINT];
        raw.copy_from_slice(&self.bytes[self.offset..self.offset + SINT]);
        self.offset += SINT;
        i32::from_le_bytes(raw)
    }

    fn f64(&mut self) -> f64 {
        let mut raw = [0u8; SFLOAT];
        raw.copy_from_slice(&self.bytes[self.offset..self.offset + SFLOAT]);
        self.offset += SFLOAT;
        f64::from_le_bytes(raw)
    }
}
