//! # venus_blocks
//!
//! venus_blocks is the block segmentation and extraction engine for VENUS
//! ion-source experiment logs, written in Rust. Each experimental run
//! produces two log files: a "monitor" log (a periodic numeric sensor time
//! series) and a "std" log (the free-text operational log). Both interleave
//! several experimental blocks in a single file, with no explicit delimiter
//! in the numeric case and blank-line-delimited, partially invalid sections
//! in the text case. venus_blocks segments both logs into blocks, extracts
//! the named current/timing fields from each std block, and pairs the two
//! log types block by block into one analyzable table.
//!
//! ## Pipeline
//!
//! 1. **Organize**: raw instrument files listed in the source manifest are
//!    copied into a per-run directory tree (`trial_TT_run_RR/`), and the
//!    organized manifest is written.
//! 2. **Segment & emit**: each run's monitor log is segmented on restarts
//!    of the block-relative clock (a decrease in the first column), each
//!    std log is split on blank lines and filtered down to valid blocks,
//!    and every block is written as an indexed artifact next to its source
//!    log (`<log>_block_NN.csv` tables for monitor blocks, verbatim
//!    `<log>_block_NN` spans for std blocks).
//! 3. **Extract & align**: the named field families are extracted from each
//!    std block, block counts of the two logs are checked against each
//!    other, and one aligned record per (run, block index) is produced.
//! 4. **Summarize**: per-block mean/standard-deviation rollups of the beam,
//!    subsystem current, bias and pressure channels are computed from the
//!    emitted block tables.
//!
//! Runs are independent, so the manifest is dealt out round-robin to a
//! configurable number of worker threads; a failed run is reported with its
//! identifiers and never stops the rest of the batch.
//!
//! ## Configuration
//!
//! The CLI consumes a YAML configuration file:
//!
//! ```yml
//! source_manifest_path: old_file_data.csv
//! data_path: VENUS_data
//! manifest_path: file_data.csv
//! output_path: VENUS_data.csv
//! summary_path: VENUS_current_data.csv
//! n_threads: 2
//! ```
//!
//! The monitor channel names, and the unit-normalization threshold and
//! scale for the beam current, have sensible defaults and can be overridden
//! with the `monitor_channels`, `beam_unit_threshold` and `beam_unit_scale`
//! keys.
//!
//! ## Output
//!
//! - One CSV table per monitor block with the 12-channel header
//!   (block time, run time, fcv1_i, extraction_i, bias_i, inj_mbar,
//!   ext_mbar, inj_i, ext_i, mid_i, sext_i, x_ray_source), values in source
//!   units.
//! - One verbatim text file per valid std block.
//! - The aligned-record table (`output_path`): run/block identifiers,
//!   artifact paths, and every extracted field. Absent fields are empty
//!   cells, never zeros; the beam current is normalized to microamperes.
//! - The current-summary table (`summary_path`): per-block channel
//!   statistics for every aligned record that did not time out.
pub mod aligner;
pub mod config;
pub mod emitter;
pub mod error;
pub mod extract;
pub mod manifest;
pub mod monitor_file;
pub mod organizer;
pub mod process;
pub mod stats;
pub mod std_file;
pub mod worker_status;
