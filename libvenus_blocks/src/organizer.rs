use std::path::PathBuf;

use super::config::Config;
use super::error::OrganizerError;
use super::manifest::RunManifestEntry;

const MONITOR_FILE_NAME: &str = "monitor_file";
const STD_FILE_NAME: &str = "std_file";

/// FileOrganizer copies raw instrument files into the per-run directory
/// tree and produces the organized manifest that the processing loop
/// consumes.
///
/// Every run gets its own `trial_TT_run_RR` directory holding the monitor
/// and std logs under fixed names, so downstream block artifacts land next
/// to their source log.
pub struct FileOrganizer {
    file_stack: Vec<(PathBuf, PathBuf, u64)>,
    entries: Vec<RunManifestEntry>,
    total_data_size_bytes: u64,
}

impl FileOrganizer {
    /// Plan the copy for a set of source manifest entries.
    ///
    /// Missing log paths stay missing in the organized manifest; no file is
    /// touched until [`FileOrganizer::organize`] runs.
    pub fn new(
        config: &Config,
        source_entries: &[RunManifestEntry],
    ) -> Result<Self, OrganizerError> {
        let mut stack: Vec<(PathBuf, PathBuf, u64)> = Vec::new();
        let mut entries: Vec<RunManifestEntry> = Vec::new();
        let mut total_size: u64 = 0;

        for entry in source_entries {
            let run_dir = config.run_directory(entry.trial_index, entry.file_index);
            let mut organized = entry.clone();

            if let Some(monitor_src) = &entry.monitor_file {
                let dst = run_dir.join(MONITOR_FILE_NAME);
                let bytes = monitor_src.metadata()?.len();
                stack.push((monitor_src.clone(), dst.clone(), bytes));
                total_size += bytes;
                organized.monitor_file = Some(dst);
            }
            if let Some(std_src) = &entry.std_file {
                let dst = run_dir.join(STD_FILE_NAME);
                let bytes = std_src.metadata()?.len();
                stack.push((std_src.clone(), dst.clone(), bytes));
                total_size += bytes;
                organized.std_file = Some(dst);
            }
            entries.push(organized);
        }

        Ok(Self {
            file_stack: stack,
            entries,
            total_data_size_bytes: total_size,
        })
    }

    /// Copy every planned file into the run tree. The data root is rebuilt
    /// from scratch on each invocation.
    pub fn organize(&self, config: &Config) -> Result<(), OrganizerError> {
        if config.data_path.exists() {
            std::fs::remove_dir_all(&config.data_path)?;
        }
        std::fs::create_dir_all(&config.data_path)?;

        log::info!(
            "Organizing {} files with total size: {}",
            self.file_stack.len(),
            human_bytes::human_bytes(self.total_data_size_bytes as f64)
        );
        for (src, dst, bytes) in &self.file_stack {
            if let Some(parent) = dst.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(src, dst)?;
            log::info!(
                "Copied {} in {}",
                src.display(),
                human_bytes::human_bytes(*bytes as f64)
            );
        }
        Ok(())
    }

    /// The organized manifest entries, with paths rewritten into the run
    /// tree.
    pub fn manifest(&self) -> &[RunManifestEntry] {
        &self.entries
    }

    pub fn get_total_data_size(&self) -> u64 {
        self.total_data_size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organize_builds_run_tree() {
        let dir = tempfile::tempdir().unwrap();
        let raw_monitor = dir.path().join("monitor_1647511200");
        let raw_std = dir.path().join("dump_1647511200");
        std::fs::write(&raw_monitor, "0.0 1.0\n").unwrap();
        std::fs::write(&raw_std, "in change\n").unwrap();

        let config = Config {
            data_path: dir.path().join("VENUS_data"),
            ..Config::default()
        };
        let source = vec![RunManifestEntry {
            trial_index: 1,
            file_index: 2,
            monitor_file: Some(raw_monitor),
            std_file: Some(raw_std),
            creator: "harvey".to_string(),
            monitor_time_step: Some(1647511200),
            std_time_step: Some(1647511200),
        }];

        let organizer = FileOrganizer::new(&config, &source).unwrap();
        organizer.organize(&config).unwrap();

        let run_dir = config.data_path.join("trial_01_run_02");
        assert!(run_dir.join("monitor_file").exists());
        assert!(run_dir.join("std_file").exists());
        assert_eq!(
            organizer.manifest()[0].monitor_file,
            Some(run_dir.join("monitor_file"))
        );
        assert_eq!(organizer.get_total_data_size(), 18);
    }

    #[test]
    fn test_missing_log_stays_missing() {
        let dir = tempfile::tempdir().unwrap();
        let raw_monitor = dir.path().join("monitor_only");
        std::fs::write(&raw_monitor, "0.0 1.0\n").unwrap();

        let config = Config {
            data_path: dir.path().join("VENUS_data"),
            ..Config::default()
        };
        let source = vec![RunManifestEntry {
            trial_index: 1,
            file_index: 0,
            monitor_file: Some(raw_monitor),
            std_file: None,
            creator: String::new(),
            monitor_time_step: None,
            std_time_step: None,
        }];

        let organizer = FileOrganizer::new(&config, &source).unwrap();
        organizer.organize(&config).unwrap();

        assert_eq!(organizer.manifest()[0].std_file, None);
        assert!(config
            .data_path
            .join("trial_01_run_00")
            .join("monitor_file")
            .exists());
    }
}
