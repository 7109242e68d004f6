use regex::Regex;
use std::path::{Path, PathBuf};

use super::error::StdFileError;
use super::extract::BEAM_MARKER;

/// Substring marking a change-of-state line in a std log block.
pub const CHANGE_MARKER: &str = "in change";

/// A std log: the free-text operational log for one run.
///
/// Blocks are separated by blank lines, but blank-line splitting
/// over-segments: the file also holds headers, aborted blocks and other
/// noise. A candidate block is kept only if it carries both a
/// change-of-state line and the beam current summary line, the minimal
/// signature of a complete block. Survivors are re-indexed densely from 0
/// in source order.
#[derive(Debug, Clone)]
pub struct StdFile {
    file_path: PathBuf,
    blocks: Vec<String>,
}

impl StdFile {
    pub fn new(path: &Path) -> Result<Self, StdFileError> {
        if !path.exists() {
            return Err(StdFileError::BadFilePath(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let splitter = Regex::new(r"\n\s*\n")?;
        let blocks = splitter
            .split(&content)
            .filter(|candidate| is_valid_block(candidate))
            .map(String::from)
            .collect();

        Ok(Self {
            file_path: path.to_path_buf(),
            blocks,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The valid blocks, in source order. The position in this slice is the
    /// block index.
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }
}

/// A candidate block is valid only if it contains both markers
pub fn is_valid_block(candidate: &str) -> bool {
    candidate.contains(CHANGE_MARKER) && candidate.contains(BEAM_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn valid_block(tag: &str) -> String {
        format!(
            "{tag} in change\naverage current for 10 s: 1.5\nIdle."
        )
    }

    #[test]
    fn test_valid_blocks_survive_in_order() {
        let content = format!(
            "log header, not a block\n\n{}\n\nsome noise\n\n{}\n  \n{}\n",
            valid_block("first"),
            valid_block("second"),
            valid_block("third"),
        );
        let file = write_log(&content);
        let std_file = StdFile::new(file.path()).unwrap();
        assert_eq!(std_file.num_blocks(), 3);
        assert!(std_file.blocks()[0].starts_with("first"));
        assert!(std_file.blocks()[1].starts_with("second"));
        assert!(std_file.blocks()[2].starts_with("third"));
    }

    #[test]
    fn test_partial_blocks_are_dropped() {
        // One marker alone is not enough
        let content = "something in change\n\naverage current for 10 s: 0.3\n";
        let file = write_log(content);
        let std_file = StdFile::new(file.path()).unwrap();
        assert_eq!(std_file.num_blocks(), 0);
    }

    #[test]
    fn test_empty_log_has_zero_blocks() {
        let file = write_log("   \n \n  ");
        let std_file = StdFile::new(file.path()).unwrap();
        assert_eq!(std_file.num_blocks(), 0);
    }

    #[test]
    fn test_block_content_is_preserved() {
        let block = valid_block("only");
        let file = write_log(&format!("{block}\n\ntrailing noise\n"));
        let std_file = StdFile::new(file.path()).unwrap();
        assert_eq!(std_file.blocks(), [block]);
    }
}
