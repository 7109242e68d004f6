use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::ManifestError;

const MANIFEST_HEADER: &str =
    "trial index,file index,monitor file,std file,creator,monitor time step,std time step";
const COLUMNS_PER_ROW: usize = 7;

/// One run in the manifest: a (monitor log, std log) file pair for one
/// experimental trial/file index.
///
/// Either log path can be missing; a run missing one contributes no blocks
/// and is skipped by the processing loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RunManifestEntry {
    pub trial_index: u32,
    pub file_index: u32,
    pub monitor_file: Option<PathBuf>,
    pub std_file: Option<PathBuf>,
    pub creator: String,
    pub monitor_time_step: Option<i64>,
    pub std_time_step: Option<i64>,
}

impl RunManifestEntry {
    pub fn has_both_logs(&self) -> bool {
        self.monitor_file.is_some() && self.std_file.is_some()
    }
}

/// Read a manifest CSV. Empty path cells become None.
pub fn read_manifest(path: &Path) -> Result<Vec<RunManifestEntry>, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::BadFilePath(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    let mut lines = contents.lines().enumerate();
    lines.next(); // Skip the header
    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != COLUMNS_PER_ROW {
            return Err(ManifestError::BadFileFormat(line_no + 1));
        }
        entries.push(RunManifestEntry {
            trial_index: fields[0].trim().parse()?,
            file_index: fields[1].trim().parse()?,
            monitor_file: parse_path(fields[2]),
            std_file: parse_path(fields[3]),
            creator: fields[4].trim().to_string(),
            monitor_time_step: parse_time_step(fields[5])?,
            std_time_step: parse_time_step(fields[6])?,
        });
    }
    Ok(entries)
}

/// Write a manifest CSV. None cells are written empty.
pub fn write_manifest(path: &Path, entries: &[RunManifestEntry]) -> Result<(), ManifestError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{MANIFEST_HEADER}")?;
    for entry in entries {
        writeln!(
            writer,
            "{},{},{},{},{},{},{}",
            entry.trial_index,
            entry.file_index,
            display_path(&entry.monitor_file),
            display_path(&entry.std_file),
            entry.creator,
            display_time_step(&entry.monitor_time_step),
            display_time_step(&entry.std_time_step),
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_path(field: &str) -> Option<PathBuf> {
    let field = field.trim();
    if field.is_empty() {
        None
    } else {
        Some(PathBuf::from(field))
    }
}

fn parse_time_step(field: &str) -> Result<Option<i64>, ManifestError> {
    let field = field.trim();
    if field.is_empty() {
        Ok(None)
    } else {
        Ok(Some(field.parse()?))
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => String::new(),
    }
}

fn display_time_step(step: &Option<i64>) -> String {
    match step {
        Some(s) => s.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<RunManifestEntry> {
        vec![
            RunManifestEntry {
                trial_index: 1,
                file_index: 0,
                monitor_file: Some(PathBuf::from("raw/monitor_1647511200")),
                std_file: Some(PathBuf::from("raw/dump_1647511200")),
                creator: "harvey".to_string(),
                monitor_time_step: Some(1647511200),
                std_time_step: Some(1647511200),
            },
            RunManifestEntry {
                trial_index: 1,
                file_index: 1,
                monitor_file: Some(PathBuf::from("raw/monitor_1647514800")),
                std_file: None,
                creator: "wenhan".to_string(),
                monitor_time_step: Some(1647514800),
                std_time_step: None,
            },
        ]
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_data.csv");
        let entries = sample_entries();
        write_manifest(&path, &entries).unwrap();
        let read_back = read_manifest(&path).unwrap();
        assert_eq!(read_back, entries);
    }

    #[test]
    fn test_missing_path_cells_become_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_data.csv");
        std::fs::write(
            &path,
            format!("{MANIFEST_HEADER}\n2,3,,,harvey,,\n"),
        )
        .unwrap();
        let entries = read_manifest(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].monitor_file, None);
        assert_eq!(entries[0].std_file, None);
        assert!(!entries[0].has_both_logs());
    }

    #[test]
    fn test_wrong_column_count_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_data.csv");
        std::fs::write(&path, format!("{MANIFEST_HEADER}\n1,2,only,four\n")).unwrap();
        match read_manifest(&path) {
            Err(ManifestError::BadFileFormat(2)) => (),
            other => panic!("Expected BadFileFormat, got {other:?}"),
        }
    }
}
