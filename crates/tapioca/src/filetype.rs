//! On-disk encoding of Mandyoc output files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Encoding used by Mandyoc when it wrote a model directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain-text `.txt` files.
    #[default]
    Ascii,
    /// PETSc binary `.bin` files.
    Binary,
}

impl FileType {
    /// File extension (without dot) used for this encoding.
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Ascii => "txt",
            FileType::Binary => "bin",
        }
    }

    /// Name as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Ascii => "ascii",
            FileType::Binary => "binary",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii" => Ok(FileType::Ascii),
            "binary" => Ok(FileType::Binary),
            other => Err(Error::InvalidFiletype(other.to_string())),
        }
    }
}
