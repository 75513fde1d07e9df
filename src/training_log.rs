//! Training log parsing.
//!
//! The log is comma-separated text with one header line. Spaces in column
//! names are removed (`" mean-epr"` becomes `"mean-epr"`), and the `frames`
//! column is rescaled to units of 500k frames.

use std::path::Path;

use crate::error::LogError;

/// Frames per x-axis unit of the training curves.
pub const FRAMES_PER_UNIT: f64 = 500e3;

/// Parsed training log, stored column-wise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingLog {
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl TrainingLog {
    /// Parses log text.
    ///
    /// Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// `Empty` without a header, `ColumnCount` for ragged rows and
    /// `NotANumber` for unparsable cells.
    pub fn parse(text: &str) -> Result<Self, LogError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let (_, header) = lines.next().ok_or(LogError::Empty)?;
        let columns: Vec<String> = header.split(',').map(|c| c.replace(' ', "")).collect();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];

        for (line, row) in lines {
            let cells: Vec<&str> = row.split(',').collect();
            if cells.len() != columns.len() {
                return Err(LogError::ColumnCount {
                    line,
                    expected: columns.len(),
                    actual: cells.len(),
                });
            }
            for ((raw, column), out) in cells.iter().zip(&columns).zip(values.iter_mut()) {
                let value = raw.trim().parse::<f64>().map_err(|_| LogError::NotANumber {
                    line,
                    column: column.clone(),
                    raw: raw.trim().to_string(),
                })?;
                out.push(value);
            }
        }

        if let Some(idx) = columns.iter().position(|c| c == "frames") {
            for v in &mut values[idx] {
                *v /= FRAMES_PER_UNIT;
            }
        }

        Ok(Self { columns, values })
    }

    /// Reads and parses a log file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Column names, spaces removed.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].as_slice())
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(x, y)` pairs of two columns; empty if either is absent.
    #[must_use]
    pub fn series(&self, x: &str, y: &str) -> Vec<(f64, f64)> {
        match (self.column(x), self.column(y)) {
            (Some(xs), Some(ys)) => xs.iter().copied().zip(ys.iter().copied()).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "time, episodes, frames, mean-epr, run-loss\n\
                       10.0, 1, 500000, 1.5, 0.25\n\
                       \n\
                       20.0, 2, 1000000, 2.0, 0.20\n";

    #[test]
    fn test_header_spaces_removed_and_frames_rescaled() {
        let log = TrainingLog::parse(LOG).unwrap();
        assert_eq!(log.columns()[3], "mean-epr");
        assert_eq!(log.len(), 2);
        assert_eq!(log.column("frames"), Some(&[1.0, 2.0][..]));
        assert_eq!(log.series("frames", "run-loss"), vec![(1.0, 0.25), (2.0, 0.20)]);
    }

    #[test]
    fn test_missing_column_gives_empty_series() {
        let log = TrainingLog::parse(LOG).unwrap();
        assert!(log.series("frames", "nope").is_empty());
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let err = TrainingLog::parse("a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, LogError::ColumnCount { line: 3, expected: 2, actual: 1 }));
    }

    #[test]
    fn test_bad_number_names_column() {
        let err = TrainingLog::parse("a, b\n1, x\n").unwrap_err();
        match err {
            LogError::NotANumber { column, raw, .. } => {
                assert_eq!(column, "b");
                assert_eq!(raw, "x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(matches!(TrainingLog::parse("\n\n"), Err(LogError::Empty)));
        assert!(TrainingLog::parse("a,b\n").unwrap().is_empty());
    }
}
