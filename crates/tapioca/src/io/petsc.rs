//! PETSc `Vec` binary files.
//!
//! Mandyoc dumps field data with PETSc's binary viewer. A vector file is
//! big-endian: a 32-bit class id, a 32-bit length `n`, then `n` doubles.
//! PETSc may also write a `.info` sidecar; it is not needed to read the data.

use std::path::Path;

use crate::error::{Error, Result};

/// Class id PETSc writes at the start of every `Vec` file.
pub const VEC_FILE_CLASSID: i32 = 1_211_214;

const HEADER_LEN: usize = 8;

/// Decode the bytes of a PETSc `Vec` file.
///
/// `path` is only used for error messages.
pub fn decode_vec(bytes: &[u8], path: &Path) -> Result<Vec<f64>> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::binary(
            path,
            format!("file too short for a Vec header ({} bytes)", bytes.len()),
        ));
    }
    let classid = read_i32_be(&bytes[0..4]);
    if classid != VEC_FILE_CLASSID {
        return Err(Error::binary(
            path,
            format!("unexpected class id {classid}, expected {VEC_FILE_CLASSID}"),
        ));
    }
    let n = read_i32_be(&bytes[4..8]);
    let n = usize::try_from(n)
        .map_err(|_| Error::binary(path, format!("negative vector length {n}")))?;

    let body = &bytes[HEADER_LEN..];
    let expected = n
        .checked_mul(8)
        .ok_or_else(|| Error::binary(path, format!("vector length {n} overflows")))?;
    if body.len() != expected {
        return Err(Error::binary(
            path,
            format!(
                "header declares {n} values ({expected} bytes) but {} bytes follow",
                body.len()
            ),
        ));
    }

    Ok(body
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_be_bytes(raw)
        })
        .collect())
}

/// Read and decode a PETSc `Vec` file.
pub fn read_vec(path: &Path) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
    decode_vec(&bytes, path)
}

/// Encode values in the PETSc `Vec` binary layout.
///
/// The header length saturates at `i32::MAX`.
pub fn encode_vec(values: &[f64]) -> Vec<u8> {
    let n = i32::try_from(values.len()).unwrap_or(i32::MAX);
    let mut out = Vec::with_capacity(HEADER_LEN + values.len() * 8);
    out.extend_from_slice(&VEC_FILE_CLASSID.to_be_bytes());
    out.extend_from_slice(&n.to_be_bytes());
    for v in values {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out
}

fn read_i32_be(bytes: &[u8]) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    i32::from_be_bytes(raw)
}
