use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// The channel layout of a monitor log, in column order.
fn default_monitor_channels() -> Vec<String> {
    [
        "block time",
        "run time",
        "fcv1_i",
        "extraction_i",
        "bias_i",
        "inj_mbar",
        "ext_mbar",
        "inj_i",
        "ext_i",
        "mid_i",
        "sext_i",
        "x_ray_source",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_beam_unit_threshold() -> f64 {
    1.0
}

fn default_beam_unit_scale() -> f64 {
    1.0e6
}

/// Structure representing the application configuration. Contains pathing and run information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source_manifest_path: PathBuf,
    pub data_path: PathBuf,
    pub manifest_path: PathBuf,
    pub output_path: PathBuf,
    pub summary_path: PathBuf,
    pub n_threads: i32,
    /// Column names of the monitor log, used as the header of emitted block tables.
    #[serde(default = "default_monitor_channels")]
    pub monitor_channels: Vec<String>,
    /// Beam currents below this value are taken to be in amperes and rescaled.
    #[serde(default = "default_beam_unit_threshold")]
    pub beam_unit_threshold: f64,
    /// Multiplier applied to sub-threshold beam currents (amperes to microamperes).
    #[serde(default = "default_beam_unit_scale")]
    pub beam_unit_scale: f64,
}

impl Default for Config {
    /// Generate a new Config object with the standard file layout
    fn default() -> Self {
        Self {
            source_manifest_path: PathBuf::from("old_file_data.csv"),
            data_path: PathBuf::from("VENUS_data"),
            manifest_path: PathBuf::from("file_data.csv"),
            output_path: PathBuf::from("VENUS_data.csv"),
            summary_path: PathBuf::from("VENUS_current_data.csv"),
            n_threads: 1,
            monitor_channels: default_monitor_channels(),
            beam_unit_threshold: default_beam_unit_threshold(),
            beam_unit_scale: default_beam_unit_scale(),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Get the directory holding one run's organized files
    pub fn run_directory(&self, trial_index: u32, file_index: u32) -> PathBuf {
        self.data_path
            .join(format!("trial_{trial_index:0>2}_run_{file_index:0>2}"))
    }

    /// Get the path of the emitted table for monitor block `block_index`
    pub fn monitor_block_path(&self, monitor_file: &Path, block_index: usize) -> PathBuf {
        PathBuf::from(format!(
            "{}_block_{block_index:0>2}.csv",
            monitor_file.display()
        ))
    }

    /// Get the path of the emitted text span for std block `block_index`
    pub fn std_block_path(&self, std_file: &Path, block_index: usize) -> PathBuf {
        PathBuf::from(format!("{}_block_{block_index:0>2}", std_file.display()))
    }

    pub fn is_n_threads_valid(&self) -> bool {
        self.n_threads >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_path_naming() {
        let config = Config::default();
        let monitor = Path::new("VENUS_data/trial_01_run_03/monitor_file");
        let std_log = Path::new("VENUS_data/trial_01_run_03/std_file");
        assert_eq!(
            config.monitor_block_path(monitor, 4),
            PathBuf::from("VENUS_data/trial_01_run_03/monitor_file_block_04.csv")
        );
        assert_eq!(
            config.std_block_path(std_log, 11),
            PathBuf::from("VENUS_data/trial_01_run_03/std_file_block_11")
        );
    }

    #[test]
    fn test_default_channels() {
        let config = Config::default();
        assert_eq!(config.monitor_channels.len(), 12);
        assert_eq!(config.monitor_channels[0], "block time");
        assert_eq!(config.monitor_channels[2], "fcv1_i");
    }
}
