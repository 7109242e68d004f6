use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::AlignerError;
use super::extract::ExtractedRecord;
use super::manifest::RunManifestEntry;

const RECORDS_HEADER: &str = "trial index,file index,block index,creator,\
monitor block path,std block path,\
init_inow_inj,init_inow_ext,init_inow_mid,\
init_iaim_inj,init_iaim_ext,init_iaim_mid,\
init_ioff_inj,init_ioff_ext,init_ioff_mid,\
final_inow_inj,final_igoal_inj,final_inow_ext,final_igoal_ext,final_inow_mid,final_igoal_mid,\
beam current,time out,set time,monitor time";

/// One (run, block index) pairing: identifiers, the two emitted artifact
/// paths, and the fields extracted from the std block.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRecord {
    pub trial_index: u32,
    pub file_index: u32,
    pub block_index: usize,
    pub creator: String,
    pub monitor_block_path: PathBuf,
    pub std_block_path: PathBuf,
    pub record: ExtractedRecord,
}

/// Pair one run's monitor and std block artifacts by index.
///
/// The two logs of a run must segment into the same number of blocks;
/// anything else means the pair is desynchronized and must not be silently
/// aligned. The mismatch is fatal for this run only.
pub fn align_run(
    entry: &RunManifestEntry,
    monitor_block_paths: &[PathBuf],
    std_block_paths: &[PathBuf],
    records: &[ExtractedRecord],
) -> Result<Vec<AlignedRecord>, AlignerError> {
    if monitor_block_paths.len() != std_block_paths.len() {
        return Err(AlignerError::BlockCountMismatch {
            trial_index: entry.trial_index,
            file_index: entry.file_index,
            monitor_blocks: monitor_block_paths.len(),
            std_blocks: std_block_paths.len(),
        });
    }

    let mut aligned = Vec::with_capacity(records.len());
    for (block_index, record) in records.iter().enumerate() {
        aligned.push(AlignedRecord {
            trial_index: entry.trial_index,
            file_index: entry.file_index,
            block_index,
            creator: entry.creator.clone(),
            monitor_block_path: monitor_block_paths[block_index].clone(),
            std_block_path: std_block_paths[block_index].clone(),
            record: record.clone(),
        });
    }
    Ok(aligned)
}

/// Write the aligned-record table.
///
/// Absent fields are written as empty cells; 0 is a valid instrument
/// reading, so nothing is ever zero-filled.
pub fn write_records_csv(
    path: &Path,
    records: &[AlignedRecord],
) -> Result<(), AlignerError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{RECORDS_HEADER}")?;
    for aligned in records {
        let r = &aligned.record;
        let cells: Vec<String> = vec![
            aligned.trial_index.to_string(),
            aligned.file_index.to_string(),
            aligned.block_index.to_string(),
            aligned.creator.clone(),
            aligned.monitor_block_path.display().to_string(),
            aligned.std_block_path.display().to_string(),
            opt_cell(r.init_inow.map(|t| t.inj)),
            opt_cell(r.init_inow.map(|t| t.ext)),
            opt_cell(r.init_inow.map(|t| t.mid)),
            opt_cell(r.init_iaim.map(|t| t.inj)),
            opt_cell(r.init_iaim.map(|t| t.ext)),
            opt_cell(r.init_iaim.map(|t| t.mid)),
            opt_cell(r.init_ioff.map(|t| t.inj)),
            opt_cell(r.init_ioff.map(|t| t.ext)),
            opt_cell(r.init_ioff.map(|t| t.mid)),
            opt_cell(r.final_inj.map(|p| p.now)),
            opt_cell(r.final_inj.map(|p| p.goal)),
            opt_cell(r.final_ext.map(|p| p.now)),
            opt_cell(r.final_ext.map(|p| p.goal)),
            opt_cell(r.final_mid.map(|p| p.now)),
            opt_cell(r.final_mid.map(|p| p.goal)),
            r.beam_current.to_string(),
            r.timed_out.to_string(),
            opt_cell(r.set_time),
            opt_cell(r.monitor_time),
        ];
        writeln!(writer, "{}", cells.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

fn opt_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}
