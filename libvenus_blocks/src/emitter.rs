use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use super::config::Config;
use super::error::EmitterError;
use super::monitor_file::MonitorFile;
use super::std_file::StdFile;

/// BlockEmitter serializes segmented blocks into per-block, indexed
/// artifacts.
///
/// Monitor blocks become row-labeled CSV tables with the configured channel
/// header; std blocks are written verbatim. Both use the same zero-padded
/// two-digit index naming so block `i` of each type can be associated
/// positionally. Emission never transforms values.
pub struct BlockEmitter<'a> {
    config: &'a Config,
}

impl<'a> BlockEmitter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Write each block of a monitor log as a CSV table next to the source
    /// file. Returns the emitted paths in block order.
    pub fn emit_monitor_blocks(
        &self,
        monitor: &MonitorFile,
    ) -> Result<Vec<PathBuf>, EmitterError> {
        let mut paths = Vec::with_capacity(monitor.num_blocks());
        let header = self.config.monitor_channels.join(",");
        for block_index in 0..monitor.num_blocks() {
            let data = monitor.block_data(block_index)?;
            if data.ncols() != self.config.monitor_channels.len() {
                log::warn!(
                    "Monitor log {:?} has {} columns but {} channel names are configured",
                    monitor.file_path(),
                    data.ncols(),
                    self.config.monitor_channels.len()
                );
            }
            let path = self
                .config
                .monitor_block_path(monitor.file_path(), block_index);
            let mut writer = BufWriter::new(File::create(&path)?);
            writeln!(writer, "{header}")?;
            for row in data.rows() {
                let fields: Vec<String> = row.iter().map(|value| value.to_string()).collect();
                writeln!(writer, "{}", fields.join(","))?;
            }
            writer.flush()?;
            paths.push(path);
        }
        Ok(paths)
    }

    /// Write each valid block of a std log verbatim next to the source
    /// file. Returns the emitted paths in block order.
    pub fn emit_std_blocks(&self, std_file: &StdFile) -> Result<Vec<PathBuf>, EmitterError> {
        let mut paths = Vec::with_capacity(std_file.num_blocks());
        for (block_index, block) in std_file.blocks().iter().enumerate() {
            let path = self.config.std_block_path(std_file.file_path(), block_index);
            std::fs::write(&path, block)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            monitor_channels: vec!["block time".to_string(), "fcv1_i".to_string()],
            ..Config::default()
        }
    }

    #[test]
    fn test_monitor_blocks_are_tabulated() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("monitor_file");
        std::fs::write(&log_path, "0.0 1.5\n1.0 1.6\n0.0 2.5\n1.0 2.6\n").unwrap();

        let config = test_config();
        let monitor = MonitorFile::new(&log_path).unwrap();
        let paths = BlockEmitter::new(&config)
            .emit_monitor_blocks(&monitor)
            .unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], dir.path().join("monitor_file_block_00.csv"));
        assert_eq!(paths[1], dir.path().join("monitor_file_block_01.csv"));

        let first = std::fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(first, "block time,fcv1_i\n0,1.5\n1,1.6\n");
        let second = std::fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(second, "block time,fcv1_i\n0,2.5\n1,2.6\n");
    }

    #[test]
    fn test_empty_monitor_log_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("monitor_file");
        std::fs::write(&log_path, "   \n").unwrap();

        let config = test_config();
        let monitor = MonitorFile::new(&log_path).unwrap();
        let paths = BlockEmitter::new(&config)
            .emit_monitor_blocks(&monitor)
            .unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_std_blocks_are_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("std_file");
        let block = "ramp in change\naverage current for 10 s: 1.5";
        std::fs::write(&log_path, format!("noise\n\n{block}\n\nnoise")).unwrap();

        let config = test_config();
        let std_file = StdFile::new(&log_path).unwrap();
        let paths = BlockEmitter::new(&config).emit_std_blocks(&std_file).unwrap();

        assert_eq!(paths, [dir.path().join("std_file_block_00")]);
        let emitted = std::fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(emitted, block);
    }
}
