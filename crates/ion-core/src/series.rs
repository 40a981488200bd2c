//! Growable sample series for simulation inputs and outputs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;

/// Ordered, resizable sequence of f64 samples with bounds-checked access.
///
/// Used for power and ambient-temperature input profiles and for recorded
/// outputs. Indexing is explicit and fallible so that exhausted or
/// mismatched input profiles surface as errors rather than panics.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    data: Vec<Real>,
}

impl Series {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn from_vec(data: Vec<Real>) -> Self {
        Self { data }
    }

    /// Constant-valued series of length `len`.
    pub fn constant(value: Real, len: usize) -> Self {
        Self {
            data: vec![value; len],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> CoreResult<Real> {
        self.data
            .get(index)
            .copied()
            .ok_or(CoreError::IndexOob {
                what: "series get",
                index,
                len: self.data.len(),
            })
    }

    pub fn set(&mut self, index: usize, value: Real) -> CoreResult<()> {
        let len = self.data.len();
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(CoreError::IndexOob {
                what: "series set",
                index,
                len,
            }),
        }
    }

    pub fn push(&mut self, value: Real) {
        self.data.push(value);
    }

    pub fn extend_from_slice(&mut self, values: &[Real]) {
        self.data.extend_from_slice(values);
    }

    pub fn iter(&self) -> impl Iterator<Item = Real> + '_ {
        self.data.iter().copied()
    }

    pub fn as_slice(&self) -> &[Real] {
        &self.data
    }

    /// Load a series from a one-value-per-line text file.
    ///
    /// Blank lines and lines starting with `#` are skipped. A line that
    /// does not parse as a float is reported with its 1-based line number.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut data = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            // Tolerate trailing columns: only the first field is the sample
            let field = trimmed.split(',').next().unwrap_or(trimmed).trim();
            let value = field.parse::<Real>().map_err(|e| CoreError::Parse {
                line: i + 1,
                message: format!("'{field}': {e}"),
            })?;
            data.push(value);
        }
        Ok(Self { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn push_get_set() {
        let mut s = Series::new();
        s.push(1.0);
        s.push(2.0);
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(1).unwrap(), 2.0);
        s.set(1, 5.0).unwrap();
        assert_eq!(s.get(1).unwrap(), 5.0);
    }

    #[test]
    fn out_of_bounds_is_error() {
        let mut s = Series::from_vec(vec![1.0]);
        assert!(s.get(1).is_err());
        assert!(s.set(3, 0.0).is_err());
    }

    #[test]
    fn extend_and_iterate() {
        let mut s = Series::new();
        s.extend_from_slice(&[1.0, 2.0, 3.0]);
        let total: f64 = s.iter().sum();
        assert_eq!(total, 6.0);
    }

    #[test]
    fn csv_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join("ion_core_series_test.csv");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "# power profile").unwrap();
            writeln!(f, "10.0").unwrap();
            writeln!(f).unwrap();
            writeln!(f, "  -2.5, extra").unwrap();
        }
        let s = Series::from_csv_path(&path).unwrap();
        assert_eq!(s.as_slice(), &[10.0, -2.5]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn csv_bad_line_reports_number() {
        let dir = std::env::temp_dir();
        let path = dir.join("ion_core_series_bad.csv");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "1.0").unwrap();
            writeln!(f, "not-a-number").unwrap();
        }
        let err = Series::from_csv_path(&path).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("line 2"), "unexpected message: {msg}");
        std::fs::remove_file(&path).ok();
    }
}
