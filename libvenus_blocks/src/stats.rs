use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::aligner::AlignedRecord;
use super::error::StatsError;

const SUMMARY_HEADER: &str = "trial index,file index,block index,\
beam_avg,beam_std,inj_avg,inj_std,ext_avg,ext_std,mid_avg,mid_std,\
bias_avg,bias_std,inj_p_avg,inj_p_std,ext_p_avg,ext_p_std";

/// Channels rolled up per block: summary column prefix and the monitor
/// channel it reads.
const SUMMARY_CHANNELS: [(&str, &str); 7] = [
    ("beam", "fcv1_i"),
    ("inj", "inj_i"),
    ("ext", "ext_i"),
    ("mid", "mid_i"),
    ("bias", "bias_i"),
    ("inj_p", "inj_mbar"),
    ("ext_p", "ext_mbar"),
];

/// Per-block mean and sample standard deviation of the beam, subsystem
/// current, bias and pressure channels. A statistic that cannot be computed
/// (empty block, single sample) is NaN and serializes as an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSummary {
    pub trial_index: u32,
    pub file_index: u32,
    pub block_index: usize,
    /// (mean, std) per entry of [`SUMMARY_CHANNELS`], in order.
    pub stats: Vec<(f64, f64)>,
}

/// Roll up every aligned record that did not time out.
///
/// A record whose block table cannot be read or lacks a channel is reported
/// and skipped; one bad block never aborts the whole summary.
pub fn summarize(records: &[AlignedRecord]) -> Vec<CurrentSummary> {
    let mut summaries = Vec::new();
    for aligned in records {
        if aligned.record.timed_out {
            continue;
        }
        match summarize_record(aligned) {
            Ok(summary) => summaries.push(summary),
            Err(e) => log::warn!(
                "Skipping summary for trial {} file {} block {}: {e}",
                aligned.trial_index,
                aligned.file_index,
                aligned.block_index
            ),
        }
    }
    summaries
}

fn summarize_record(aligned: &AlignedRecord) -> Result<CurrentSummary, StatsError> {
    let table = BlockTable::read(&aligned.monitor_block_path)?;
    let mut stats = Vec::with_capacity(SUMMARY_CHANNELS.len());
    for (_, channel) in SUMMARY_CHANNELS {
        let column = table.channel(channel)?;
        stats.push((mean(&column), sample_std(&column)));
    }
    Ok(CurrentSummary {
        trial_index: aligned.trial_index,
        file_index: aligned.file_index,
        block_index: aligned.block_index,
        stats,
    })
}

/// Write the current-summary table. NaN statistics become empty cells.
pub fn write_summary_csv(
    path: &Path,
    summaries: &[CurrentSummary],
) -> Result<(), StatsError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{SUMMARY_HEADER}")?;
    for summary in summaries {
        let mut cells = vec![
            summary.trial_index.to_string(),
            summary.file_index.to_string(),
            summary.block_index.to_string(),
        ];
        for (avg, std) in &summary.stats {
            cells.push(stat_cell(*avg));
            cells.push(stat_cell(*std));
        }
        writeln!(writer, "{}", cells.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

fn stat_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn mean(column: &Array1<f64>) -> f64 {
    column.mean().unwrap_or(f64::NAN)
}

fn sample_std(column: &Array1<f64>) -> f64 {
    if column.len() > 1 {
        column.std(1.0)
    } else {
        f64::NAN
    }
}

/// An emitted monitor block table read back for statistics.
struct BlockTable {
    path: PathBuf,
    header: Vec<String>,
    data: Array2<f64>,
}

impl BlockTable {
    fn read(path: &Path) -> Result<Self, StatsError> {
        if !path.exists() {
            return Err(StatsError::BadFilePath(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let mut lines = contents.lines().enumerate();
        let header: Vec<String> = match lines.next() {
            Some((_, line)) => line.split(',').map(|s| s.trim().to_string()).collect(),
            None => Vec::new(),
        };

        let mut values: Vec<f64> = Vec::new();
        let mut n_rows = 0;
        for (line_no, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            for field in line.split(',') {
                let value: f64 = field.trim().parse().map_err(|_| StatsError::BadValue {
                    path: path.to_path_buf(),
                    line: line_no + 1,
                    value: field.to_string(),
                })?;
                values.push(value);
            }
            n_rows += 1;
        }

        let n_cols = header.len();
        if n_rows * n_cols != values.len() {
            return Err(StatsError::BadValue {
                path: path.to_path_buf(),
                line: 0,
                value: "ragged table".to_string(),
            });
        }
        // Shape was validated against the header above
        let data = Array2::from_shape_vec((n_rows, n_cols), values)
            .expect("consistent block table shape");
        Ok(Self {
            path: path.to_path_buf(),
            header,
            data,
        })
    }

    fn channel(&self, name: &str) -> Result<Array1<f64>, StatsError> {
        let idx = self
            .header
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| StatsError::UnknownChannel {
                path: self.path.clone(),
                channel: name.to_string(),
            })?;
        Ok(self.data.column(idx).to_owned())
    }
}
