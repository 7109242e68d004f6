use ndarray::{s, Array2, ArrayView2};
use std::ops::Range;
use std::path::{Path, PathBuf};

use super::error::MonitorFileError;

/// A monitor log: the periodic numeric sensor time series for one run.
///
/// The log is a whitespace-separated table with one row per sample. The first
/// column is the block-relative time. Operators restart the block clock when
/// they begin a new experimental block, so the file holds several blocks back
/// to back with no separator; a decrease in the time column is the boundary
/// signal. Boundaries are computed once when the file is read and the sample
/// matrix is never mutated afterwards.
#[derive(Debug, Clone)]
pub struct MonitorFile {
    file_path: PathBuf,
    samples: Array2<f64>,
    boundaries: Vec<usize>,
}

impl MonitorFile {
    /// Read and segment a monitor log.
    ///
    /// An empty or all-whitespace file is a defined state with zero blocks;
    /// no numeric parsing is attempted for it.
    pub fn new(path: &Path) -> Result<Self, MonitorFileError> {
        if !path.exists() {
            return Err(MonitorFileError::BadFilePath(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self {
                file_path: path.to_path_buf(),
                samples: Array2::zeros((0, 0)),
                boundaries: Vec::new(),
            });
        }

        let samples = parse_samples(path, &content)?;
        let time_column: Vec<f64> = samples.column(0).to_vec();
        let boundaries = find_boundaries(&time_column);

        Ok(Self {
            file_path: path.to_path_buf(),
            samples,
            boundaries,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn is_empty(&self) -> bool {
        self.samples.nrows() == 0
    }

    /// Number of blocks found in the log. Zero for an empty log.
    pub fn num_blocks(&self) -> usize {
        self.boundaries.len().saturating_sub(1)
    }

    pub fn num_samples(&self) -> usize {
        self.samples.nrows()
    }

    /// The half-open sample-index range `[start, end)` of one block
    pub fn block_range(&self, block_index: usize) -> Result<Range<usize>, MonitorFileError> {
        if block_index >= self.num_blocks() {
            return Err(MonitorFileError::IndexOutOfRange {
                path: self.file_path.clone(),
                index: block_index,
                num_blocks: self.num_blocks(),
            });
        }
        Ok(self.boundaries[block_index]..self.boundaries[block_index + 1])
    }

    /// The sample sub-matrix for one block
    pub fn block_data(&self, block_index: usize) -> Result<ArrayView2<'_, f64>, MonitorFileError> {
        let range = self.block_range(block_index)?;
        Ok(self.samples.slice(s![range.start..range.end, ..]))
    }
}

/// Parse the whitespace-separated sample table. Every row must have the same
/// number of columns as the first row.
fn parse_samples(path: &Path, content: &str) -> Result<Array2<f64>, MonitorFileError> {
    let mut rows: Vec<f64> = Vec::new();
    let mut n_rows = 0;
    let mut n_cols = 0;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut row_len = 0;
        for field in line.split_whitespace() {
            let value: f64 = field
                .parse()
                .map_err(|_| MonitorFileError::BadSample {
                    path: path.to_path_buf(),
                    line: line_no + 1,
                    value: field.to_string(),
                })?;
            rows.push(value);
            row_len += 1;
        }
        if n_rows == 0 {
            n_cols = row_len;
        } else if row_len != n_cols {
            return Err(MonitorFileError::RaggedRow {
                path: path.to_path_buf(),
                line: line_no + 1,
                found: row_len,
                expected: n_cols,
            });
        }
        n_rows += 1;
    }

    // Shape was validated row by row above
    Ok(Array2::from_shape_vec((n_rows, n_cols), rows).expect("consistent sample matrix shape"))
}

/// Find the block boundary indices of a time column.
///
/// A boundary sits immediately after any sample where the time value
/// decreases. The returned list is `[0, b_1, ..., b_k, len]`, so the number
/// of blocks is always one less than its length.
fn find_boundaries(time_column: &[f64]) -> Vec<usize> {
    let mut boundaries = vec![0];
    for idx in 1..time_column.len() {
        if time_column[idx] < time_column[idx - 1] {
            boundaries.push(idx);
        }
    }
    boundaries.push(time_column.len());
    boundaries
}
