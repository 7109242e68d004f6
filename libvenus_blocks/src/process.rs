use std::sync::mpsc::Sender;

use super::aligner::{align_run, AlignedRecord};
use super::config::Config;
use super::emitter::BlockEmitter;
use super::error::ProcessorError;
use super::extract::{ExtractedRecord, FieldExtractor};
use super::manifest::RunManifestEntry;
use super::monitor_file::MonitorFile;
use super::std_file::StdFile;
use super::worker_status::{BarColor, WorkerStatus};

/// Process one run: segment both logs, emit the per-block artifacts,
/// extract the std block fields and pair everything by block index.
///
/// A run missing either log contributes no blocks and is skipped. Runs are
/// independent of each other, so any failure here is fatal for this run
/// only; the caller decides whether to continue with the rest of the batch.
pub fn process_run(
    config: &Config,
    extractor: &FieldExtractor,
    entry: &RunManifestEntry,
    tx: &Sender<WorkerStatus>,
    worker_id: &usize,
) -> Result<Vec<AlignedRecord>, ProcessorError> {
    let (Some(monitor_path), Some(std_path)) = (&entry.monitor_file, &entry.std_file) else {
        log::info!(
            "Run trial {} file {} is missing a log file, skipping...",
            entry.trial_index,
            entry.file_index
        );
        return Ok(Vec::new());
    };

    tx.send(WorkerStatus::new(
        0.0,
        entry.trial_index,
        entry.file_index,
        *worker_id,
        BarColor::CYAN,
    ))?;

    let monitor = MonitorFile::new(monitor_path)?;
    let std_file = StdFile::new(std_path)?;

    let emitter = BlockEmitter::new(config);
    let monitor_block_paths = emitter.emit_monitor_blocks(&monitor)?;
    let std_block_paths = emitter.emit_std_blocks(&std_file)?;
    tx.send(WorkerStatus::new(
        0.5,
        entry.trial_index,
        entry.file_index,
        *worker_id,
        BarColor::CYAN,
    ))?;

    let mut records: Vec<ExtractedRecord> = Vec::with_capacity(std_file.num_blocks());
    for block in std_file.blocks() {
        records.push(extractor.extract(block)?);
    }

    let aligned = align_run(entry, &monitor_block_paths, &std_block_paths, &records)?;
    tx.send(WorkerStatus::new(
        1.0,
        entry.trial_index,
        entry.file_index,
        *worker_id,
        BarColor::CYAN,
    ))?;
    Ok(aligned)
}

/// Process every run in the organized manifest on a single worker.
pub fn process(
    config: Config,
    tx: Sender<WorkerStatus>,
    worker_id: usize,
) -> Result<Vec<AlignedRecord>, ProcessorError> {
    let entries = super::manifest::read_manifest(&config.manifest_path)?;
    process_subset(config, tx, worker_id, entries)
}

/// Process a subset of runs.
///
/// A failed run is reported with its identifiers and the rest of the subset
/// keeps going; only a dead status channel stops the worker.
pub fn process_subset(
    config: Config,
    tx: Sender<WorkerStatus>,
    worker_id: usize,
    subset: Vec<RunManifestEntry>,
) -> Result<Vec<AlignedRecord>, ProcessorError> {
    let extractor = FieldExtractor::new(&config)?;
    let mut records: Vec<AlignedRecord> = Vec::new();
    for entry in subset {
        log::info!(
            "Processing trial {} file {}...",
            entry.trial_index,
            entry.file_index
        );
        match process_run(&config, &extractor, &entry, &tx, &worker_id) {
            Ok(mut aligned) => {
                records.append(&mut aligned);
                log::info!(
                    "Finished processing trial {} file {}.",
                    entry.trial_index,
                    entry.file_index
                );
            }
            Err(ProcessorError::SendError(e)) => {
                return Err(ProcessorError::SendError(e));
            }
            Err(e) => {
                log::error!(
                    "Failed processing trial {} file {}: {e}",
                    entry.trial_index,
                    entry.file_index
                );
                tx.send(WorkerStatus::new(
                    1.0,
                    entry.trial_index,
                    entry.file_index,
                    worker_id,
                    BarColor::RED,
                ))?;
            }
        }
    }
    Ok(records)
}

/// Divide the manifest into a set of subsets (per thread/worker)
pub fn create_subsets(config: &Config, entries: &[RunManifestEntry]) -> Vec<Vec<RunManifestEntry>> {
    let mut subsets: Vec<Vec<RunManifestEntry>> = vec![Vec::new(); config.n_threads as usize];
    let n_subsets = subsets.len();

    for (idx, entry) in entries.iter().enumerate() {
        subsets[idx % n_subsets].push(entry.clone())
    }

    subsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc::channel;

    fn test_config(data_path: &Path) -> Config {
        Config {
            data_path: data_path.to_path_buf(),
            monitor_channels: vec![
                "block time".to_string(),
                "run time".to_string(),
                "fcv1_i".to_string(),
            ],
            ..Config::default()
        }
    }

    fn entry(monitor: PathBuf, std_log: PathBuf) -> RunManifestEntry {
        RunManifestEntry {
            trial_index: 1,
            file_index: 0,
            monitor_file: Some(monitor),
            std_file: Some(std_log),
            creator: "harvey".to_string(),
            monitor_time_step: None,
            std_time_step: None,
        }
    }

    fn two_block_std_log() -> &'static str {
        "ramp in change\naverage current for 10 s: 0.5\n\nramp in change\naverage current for 10 s: 2.5\n"
    }

    #[test]
    fn test_process_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let monitor_path = dir.path().join("monitor_file");
        let std_path = dir.path().join("std_file");
        std::fs::write(&monitor_path, "0 0 1.0\n1 1 1.1\n0 2 2.0\n1 3 2.1\n").unwrap();
        std::fs::write(&std_path, two_block_std_log()).unwrap();

        let config = test_config(dir.path());
        let extractor = FieldExtractor::new(&config).unwrap();
        let (tx, _rx) = channel();
        let aligned =
            process_run(&config, &extractor, &entry(monitor_path, std_path), &tx, &0).unwrap();

        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].record.beam_current, 500000.0);
        assert_eq!(aligned[1].record.beam_current, 2.5);
        assert!(aligned[0].monitor_block_path.exists());
        assert!(aligned[1].std_block_path.exists());
    }

    #[test]
    fn test_mismatched_counts_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let monitor_path = dir.path().join("monitor_file");
        let std_path = dir.path().join("std_file");
        // Three monitor blocks but only two valid std blocks
        std::fs::write(
            &monitor_path,
            "0 0 1.0\n1 1 1.1\n0 2 2.0\n1 3 2.1\n0 4 3.0\n",
        )
        .unwrap();
        std::fs::write(&std_path, two_block_std_log()).unwrap();

        let config = test_config(dir.path());
        let extractor = FieldExtractor::new(&config).unwrap();
        let (tx, _rx) = channel();
        match process_run(&config, &extractor, &entry(monitor_path, std_path), &tx, &0) {
            Err(ProcessorError::AlignerError(_)) => (),
            other => panic!("Expected an aligner error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_run_does_not_stop_the_subset() {
        let dir = tempfile::tempdir().unwrap();
        let bad_monitor = dir.path().join("bad_monitor");
        let bad_std = dir.path().join("bad_std");
        // One monitor block against two std blocks
        std::fs::write(&bad_monitor, "0 0 1.0\n1 1 1.1\n2 2 1.2\n").unwrap();
        std::fs::write(&bad_std, two_block_std_log()).unwrap();

        let good_monitor = dir.path().join("good_monitor");
        let good_std = dir.path().join("good_std");
        std::fs::write(&good_monitor, "0 0 1.0\n1 1 1.1\n0 2 2.0\n1 3 2.1\n").unwrap();
        std::fs::write(&good_std, two_block_std_log()).unwrap();

        let config = test_config(dir.path());
        let mut bad_entry = entry(bad_monitor, bad_std);
        bad_entry.file_index = 0;
        let mut good_entry = entry(good_monitor, good_std);
        good_entry.file_index = 1;

        let (tx, _rx) = channel();
        let records =
            process_subset(config, tx, 0, vec![bad_entry, good_entry]).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.file_index == 1));
    }

    #[test]
    fn test_runs_missing_a_log_contribute_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let monitor_path = dir.path().join("monitor_file");
        std::fs::write(&monitor_path, "0 0 1.0\n").unwrap();

        let config = test_config(dir.path());
        let extractor = FieldExtractor::new(&config).unwrap();
        let mut lone = entry(monitor_path, PathBuf::new());
        lone.std_file = None;

        let (tx, _rx) = channel();
        let aligned = process_run(&config, &extractor, &lone, &tx, &0).unwrap();
        assert!(aligned.is_empty());
    }

    #[test]
    fn test_create_subsets_deals_round_robin() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.n_threads = 2;

        let entries: Vec<RunManifestEntry> = (0..5)
            .map(|i| {
                let mut e = entry(PathBuf::new(), PathBuf::new());
                e.file_index = i;
                e
            })
            .collect();
        let subsets = create_subsets(&config, &entries);
        assert_eq!(subsets.len(), 2);
        assert_eq!(subsets[0].len(), 3);
        assert_eq!(subsets[1].len(), 2);
        assert_eq!(subsets[0][1].file_index, 2);
    }
}
