use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum MonitorFileError {
    #[error("Could not open monitor log because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Monitor log failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Monitor log {path:?} has a bad sample on line {line}: {value:?} is not a number")]
    BadSample {
        path: PathBuf,
        line: usize,
        value: String,
    },
    #[error("Monitor log {path:?} has a ragged row on line {line}: found {found} columns, expected {expected}")]
    RaggedRow {
        path: PathBuf,
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("Block index {index} is out of range for monitor log {path:?} with {num_blocks} blocks")]
    IndexOutOfRange {
        path: PathBuf,
        index: usize,
        num_blocks: usize,
    },
}

#[derive(Debug, Error)]
pub enum StdFileError {
    #[error("Could not open std log because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Std log failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Failed to compile the block splitting pattern: {0}")]
    BadPattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to compile an extraction pattern: {0}")]
    BadPattern(#[from] regex::Error),
    #[error("Block is missing its beam current line")]
    MissingBeamLine,
    #[error("Block contains {0} beam current lines; expected exactly one")]
    DuplicateBeamLine(usize),
    #[error("Value {value:?} for field {field} could not be parsed as a number")]
    BadNumber { field: String, value: String },
    #[error("No numeric value found on the matched line for field {0}")]
    NoNumber(String),
}

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("Block emission failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Block emission failed reading monitor log: {0}")]
    MonitorError(#[from] MonitorFileError),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Could not load run manifest because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Run manifest failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Run manifest failed to parse an integer: {0}")]
    ParsingError(#[from] std::num::ParseIntError),
    #[error("Run manifest row {0} has the incorrect number of columns")]
    BadFileFormat(usize),
}

#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("FileOrganizer failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("FileOrganizer failed due to manifest error: {0}")]
    ManifestError(#[from] ManifestError),
}

#[derive(Debug, Error)]
pub enum AlignerError {
    #[error("Run trial {trial_index} file {file_index} has {monitor_blocks} monitor blocks but {std_blocks} std blocks")]
    BlockCountMismatch {
        trial_index: u32,
        file_index: u32,
        monitor_blocks: usize,
        std_blocks: usize,
    },
    #[error("Aligner failed to extract std block: {0}")]
    ExtractError(#[from] ExtractError),
    #[error("Aligner failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Could not open block table because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Statistics failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Block table {path:?} has no channel named {channel}")]
    UnknownChannel { path: PathBuf, channel: String },
    #[error("Block table {path:?} has a bad value on line {line}: {value:?}")]
    BadValue {
        path: PathBuf,
        line: usize,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to monitor log error: {0}")]
    MonitorError(#[from] MonitorFileError),
    #[error("Processor failed due to std log error: {0}")]
    StdError(#[from] StdFileError),
    #[error("Processor failed due to extraction error: {0}")]
    ExtractError(#[from] ExtractError),
    #[error("Processor failed due to emitter error: {0}")]
    EmitterError(#[from] EmitterError),
    #[error("Processor failed due to aligner error: {0}")]
    AlignerError(#[from] AlignerError),
    #[error("Processor failed due to manifest error: {0}")]
    ManifestError(#[from] ManifestError),
    #[error("Processor failed due to organizer error: {0}")]
    OrganizerError(#[from] OrganizerError),
    #[error("Processor failed due to statistics error: {0}")]
    StatsError(#[from] StatsError),
    #[error("Processor failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
}
