//! Plain-text numeric tables.
//!
//! Mandyoc writes every text output as a small table: optional header lines,
//! then one or more whitespace-separated values per line. A [`TextLayout`]
//! describes how a given kind of file should be split into rows and tokens.
//!
//! ```
//! use tapioca::io::ascii::{rows, TextLayout};
//!
//! let text = "Time: 1000.0\n";
//! let parsed: Vec<_> = rows(text, TextLayout::TIME).collect();
//! assert_eq!(parsed, vec![(1, vec!["Time", "1000.0"])]);
//! ```

use std::path::Path;

use crate::error::{Error, Result};

/// How a text file is split into rows and tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayout {
    /// Physical lines dropped from the top of the file.
    pub skip_rows: usize,
    /// Everything from this marker to the end of the line is ignored.
    pub comment: &'static str,
    /// Token separator. `None` splits on runs of whitespace.
    pub delimiter: Option<char>,
}

impl TextLayout {
    /// Scalar and velocity field files (`temperature_0.txt`, ...).
    ///
    /// The two header lines are skipped and PETSc object headers
    /// (`Process [0]`, ...) start with `P`.
    pub const FIELD: TextLayout = TextLayout {
        skip_rows: 2,
        comment: "P",
        delimiter: None,
    };

    /// Time files (`Tempo_0.txt`), one `label: value` pair per line.
    pub const TIME: TextLayout = TextLayout {
        skip_rows: 0,
        comment: "#",
        delimiter: Some(':'),
    };

    /// Particle files (`step_0-rank_new0.txt`).
    pub const PARTICLES: TextLayout = TextLayout {
        skip_rows: 0,
        comment: "#",
        delimiter: None,
    };
}

/// Iterate the data rows of `text` as `(line_number, tokens)`.
///
/// Line numbers are 1-based and count skipped and blank lines, so they can
/// be reported back to the user as-is.
pub fn rows(text: &str, layout: TextLayout) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .skip(layout.skip_rows)
        .filter_map(move |(index, line)| {
            let data = match line.find(layout.comment) {
                Some(pos) if !layout.comment.is_empty() => &line[..pos],
                _ => line,
            };
            if data.trim().is_empty() {
                return None;
            }
            let tokens = match layout.delimiter {
                Some(delimiter) => data.split(delimiter).map(str::trim).collect(),
                None => data.split_whitespace().collect(),
            };
            Some((index + 1, tokens))
        })
}

/// Parse one token as `f64`, reporting the location on failure.
pub fn parse_f64(token: &str, path: &Path, line: usize) -> Result<f64> {
    token
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::parse(path, line, format!("invalid number '{token}'")))
}

/// Parse all tokens of `text` in row-major order.
pub fn parse_values(text: &str, layout: TextLayout, path: &Path) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for (line, tokens) in rows(text, layout) {
        for token in tokens {
            values.push(parse_f64(token, path, line)?);
        }
    }
    Ok(values)
}

/// Parse `text` as a table with exactly `ncols` columns and return it
/// column by column.
pub fn parse_columns(
    text: &str,
    layout: TextLayout,
    ncols: usize,
    path: &Path,
) -> Result<Vec<Vec<f64>>> {
    let mut columns = vec![Vec::new(); ncols];
    for (line, tokens) in rows(text, layout) {
        if tokens.len() != ncols {
            return Err(Error::parse(
                path,
                line,
                format!("expected {ncols} columns, found {}", tokens.len()),
            ));
        }
        for (column, token) in columns.iter_mut().zip(tokens) {
            column.push(parse_f64(token, path, line)?);
        }
    }
    Ok(columns)
}

/// Read a file into a string, attaching the path to any I/O error.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))
}

/// Read every value of a text file in row-major order.
pub fn read_values(path: &Path, layout: TextLayout) -> Result<Vec<f64>> {
    let text = read_text(path)?;
    parse_values(&text, layout, path)
}

/// Read a text file with a fixed number of columns, column by column.
pub fn read_columns(path: &Path, layout: TextLayout, ncols: usize) -> Result<Vec<Vec<f64>>> {
    let text = read_text(path)?;
    parse_columns(&text, layout, ncols, path)
}
