//! Time files and step ranges.
//!
//! Mandyoc writes a `Tempo_{step}.txt` file for every saved step. The model
//! time (in years) is the value after the `:` on the first line.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::ascii::{parse_f64, read_text, rows, TextLayout};

/// Prefix of the time files.
pub const TIMES_BASENAME: &str = "Tempo_";

/// Conversion from years to millions of years.
pub const YEARS_TO_MA: f64 = 1.0e-6;

/// Range of steps to read, written `MIN:MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRange {
    /// First step.
    pub min: i64,
    /// Last step, rounded up to the next multiple of `print_step` past `min`.
    pub max: i64,
}

impl StepRange {
    /// Create a range from its bounds.
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl fmt::Display for StepRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.min, self.max)
    }
}

impl FromStr for StepRange {
    type Err = Error;

    /// Parse `MIN:MAX`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidParameter {
            key: "steps".to_string(),
            message: format!("expected MIN:MAX, found '{s}'"),
        };
        let (min, max) = s.split_once(':').ok_or_else(invalid)?;
        let min = min.trim().parse().map_err(|_| invalid())?;
        let max = max.trim().parse().map_err(|_| invalid())?;
        Ok(Self { min, max })
    }
}

/// Saved steps together with their model time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    /// Step numbers, ascending.
    pub steps: Vec<i64>,
    /// Model time of each step, in Ma.
    pub times: Vec<f64>,
}

impl Timeline {
    /// Number of saved steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step was found.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate `(step, time)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.steps.iter().copied().zip(self.times.iter().copied())
    }
}

/// Candidate steps: `min, min + print_step, ...` while below
/// `max + print_step`.
///
/// When `max` is not a multiple of `print_step` past `min`, the first step
/// after it is a candidate too: Mandyoc may save it before stopping.
pub fn candidate_steps(print_step: i64, step_max: i64, range: Option<StepRange>) -> Result<Vec<i64>> {
    if print_step <= 0 {
        return Err(Error::InvalidParameter {
            key: "print_step".to_string(),
            message: format!("must be positive, found {print_step}"),
        });
    }
    let range = range.unwrap_or(StepRange::new(0, step_max));
    let end = range.max.saturating_add(print_step);
    let mut steps = Vec::new();
    let mut step = range.min;
    while step < end {
        steps.push(step);
        step = match step.checked_add(print_step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(steps)
}

/// Read the time files of a model directory.
///
/// Reading stops at the first candidate step without a time file: Mandyoc
/// may stop before `step_max` once it reaches its maximum time.
pub fn read_times(
    dir: &Path,
    print_step: i64,
    step_max: i64,
    range: Option<StepRange>,
) -> Result<Timeline> {
    let mut timeline = Timeline::default();
    for step in candidate_steps(print_step, step_max, range)? {
        let path = dir.join(format!("{TIMES_BASENAME}{step}.txt"));
        if !path.is_file() {
            tracing::debug!(step, path = %path.display(), "No time file, stopping");
            break;
        }
        let time = read_time_file(&path)?;
        timeline.steps.push(step);
        timeline.times.push(time * YEARS_TO_MA);
    }
    tracing::debug!(steps = timeline.len(), dir = %dir.display(), "Read time files");
    Ok(timeline)
}

/// Read the model time, in years, from a single time file.
pub fn read_time_file(path: &Path) -> Result<f64> {
    let text = read_text(path)?;
    let (line, tokens) = rows(&text, TextLayout::TIME)
        .next()
        .ok_or_else(|| Error::parse(path, 1, "empty time file"))?;
    let token = tokens
        .get(1)
        .ok_or_else(|| Error::parse(path, line, "expected `label: time`"))?;
    parse_f64(token, path, line)
}
