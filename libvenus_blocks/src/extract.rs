use regex::Regex;

use super::config::Config;
use super::error::ExtractError;

/// Substring marking the beam current summary line. Exactly one such line
/// must exist in a valid block.
pub const BEAM_MARKER: &str = "average current for 10 s:";
/// Substring marking that a current ramp gave up before converging.
pub const TIMEOUT_MARKER: &str = "timed out";
/// Substring marking an elapsed-time report for the superconductor ramp.
pub const SET_TIME_MARKER: &str = "seconds to set superconductors";

/// Names of the init-current families. A family is present when the block
/// has a line starting with `I<name>`.
const INIT_FAMILIES: [&str; 3] = ["now", "aim", "off"];
/// Names of the final-current subsystems. A subsystem is present when the
/// block has a line starting with `<name> to goal`.
const FINAL_FAMILIES: [&str; 3] = ["inj", "ext", "mid"];

/// Instrument-printed float: digits, optional decimal part, optional
/// exponent with optional sign (`1.2e-05` and friends).
const NUMBER_PATTERN: &str = r"\d+\.?\d*(?:[eE][+-]?\d+)?";

/// One init-current reading for the three subsystems, in the order the
/// instrument prints them inside the bracketed group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentTriplet {
    pub inj: f64,
    pub ext: f64,
    pub mid: f64,
}

/// Observed/goal current pair reported at the end of a ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalCurrent {
    pub now: f64,
    pub goal: f64,
}

/// Every field extracted from one std block.
///
/// Fields other than the beam current and the timeout flag are optional:
/// which lines a block carries depends on the experimental configuration,
/// so an absent line is an absent field, never a zero. The beam current is
/// normalized to microamperes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub init_inow: Option<CurrentTriplet>,
    pub init_iaim: Option<CurrentTriplet>,
    pub init_ioff: Option<CurrentTriplet>,
    pub final_inj: Option<FinalCurrent>,
    pub final_ext: Option<FinalCurrent>,
    pub final_mid: Option<FinalCurrent>,
    pub beam_current: f64,
    pub timed_out: bool,
    pub set_time: Option<f64>,
    pub monitor_time: Option<f64>,
}

/// FieldExtractor scans one valid std block for named line patterns and
/// produces an [`ExtractedRecord`].
///
/// Extraction is strictly line-gated: every family is located by a line
/// prefix or substring and parsed with a fixed value pattern, with no state
/// carried across lines. Patterns are compiled once at construction; the
/// unit normalization threshold and scale come from the configuration.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    triplet_pattern: Regex,
    now_pattern: Regex,
    goal_pattern: Regex,
    beam_pattern: Regex,
    number_pattern: Regex,
    beam_unit_threshold: f64,
    beam_unit_scale: f64,
}

impl FieldExtractor {
    pub fn new(config: &Config) -> Result<Self, ExtractError> {
        let num = NUMBER_PATTERN;
        Ok(Self {
            triplet_pattern: Regex::new(&format!(
                r"\[\s*({num})\s+({num})\s+({num})\s*\]"
            ))?,
            now_pattern: Regex::new(&format!(r"Inow:\s+({num})"))?,
            goal_pattern: Regex::new(&format!(r"Igoal:\s+({num})"))?,
            beam_pattern: Regex::new(&format!(r":\s+({num})"))?,
            number_pattern: Regex::new(&format!(r"({num})"))?,
            beam_unit_threshold: config.beam_unit_threshold,
            beam_unit_scale: config.beam_unit_scale,
        })
    }

    /// Extract every field family from one block.
    ///
    /// A missing or duplicated beam current line is fatal for the block.
    /// Any other family that fails to parse is reported and left absent;
    /// the rest of the record is still produced.
    pub fn extract(&self, block: &str) -> Result<ExtractedRecord, ExtractError> {
        let lines: Vec<&str> = block.lines().collect();

        let beam_current = self.extract_beam(&lines)?;
        let timed_out = lines.iter().any(|line| line.contains(TIMEOUT_MARKER));
        let (set_time, monitor_time) = match self.extract_times(&lines) {
            Ok(times) => times,
            Err(e) => {
                log::warn!("Skipping elapsed time fields: {e}");
                (None, None)
            }
        };

        let mut record = ExtractedRecord {
            init_inow: None,
            init_iaim: None,
            init_ioff: None,
            final_inj: None,
            final_ext: None,
            final_mid: None,
            beam_current,
            timed_out,
            set_time,
            monitor_time,
        };

        let init_slots = [
            &mut record.init_inow,
            &mut record.init_iaim,
            &mut record.init_ioff,
        ];
        for (name, slot) in INIT_FAMILIES.iter().zip(init_slots) {
            match self.extract_init(&lines, name) {
                Ok(triplet) => *slot = triplet,
                Err(e) => log::warn!("Skipping init I{name} family: {e}"),
            }
        }

        let final_slots = [
            &mut record.final_inj,
            &mut record.final_ext,
            &mut record.final_mid,
        ];
        for (name, slot) in FINAL_FAMILIES.iter().zip(final_slots) {
            match self.extract_final(&lines, name) {
                Ok(pair) => *slot = pair,
                Err(e) => log::warn!("Skipping final {name} family: {e}"),
            }
        }

        Ok(record)
    }

    /// Init-current triplet: the (at most one expected) line starting with
    /// `I<name>`, three floats inside a bracketed group.
    fn extract_init(
        &self,
        lines: &[&str],
        name: &str,
    ) -> Result<Option<CurrentTriplet>, ExtractError> {
        let prefix = format!("I{name}");
        let Some(line) = lines.iter().find(|line| line.starts_with(&prefix)) else {
            return Ok(None);
        };
        let caps = self
            .triplet_pattern
            .captures(line)
            .ok_or_else(|| ExtractError::NoNumber(format!("init I{name}")))?;
        Ok(Some(CurrentTriplet {
            inj: parse_float(&format!("init_i{name}_inj"), &caps[1])?,
            ext: parse_float(&format!("init_i{name}_ext"), &caps[2])?,
            mid: parse_float(&format!("init_i{name}_mid"), &caps[3])?,
        }))
    }

    /// Final-current pair: the line starting with `<name> to goal`, floats
    /// after `Inow:` and `Igoal:`.
    fn extract_final(
        &self,
        lines: &[&str],
        name: &str,
    ) -> Result<Option<FinalCurrent>, ExtractError> {
        let prefix = format!("{name} to goal");
        let Some(line) = lines.iter().find(|line| line.starts_with(&prefix)) else {
            return Ok(None);
        };
        let now_caps = self
            .now_pattern
            .captures(line)
            .ok_or_else(|| ExtractError::NoNumber(format!("final_inow_{name}")))?;
        let goal_caps = self
            .goal_pattern
            .captures(line)
            .ok_or_else(|| ExtractError::NoNumber(format!("final_igoal_{name}")))?;
        Ok(Some(FinalCurrent {
            now: parse_float(&format!("final_inow_{name}"), &now_caps[1])?,
            goal: parse_float(&format!("final_igoal_{name}"), &goal_caps[1])?,
        }))
    }

    /// Beam current from the single mandatory summary line. The instrument
    /// reports amperes below the threshold and microamperes otherwise;
    /// sub-threshold values are rescaled so the record is uniformly in
    /// microamperes.
    fn extract_beam(&self, lines: &[&str]) -> Result<f64, ExtractError> {
        let beam_lines: Vec<&&str> = lines
            .iter()
            .filter(|line| line.contains(BEAM_MARKER))
            .collect();
        match beam_lines.len() {
            0 => return Err(ExtractError::MissingBeamLine),
            1 => (),
            n => return Err(ExtractError::DuplicateBeamLine(n)),
        }
        let caps = self
            .beam_pattern
            .captures(beam_lines[0])
            .ok_or_else(|| ExtractError::NoNumber("beam current".to_string()))?;
        let beam_current = parse_float("beam current", &caps[1])?;
        if beam_current < self.beam_unit_threshold {
            Ok(beam_current * self.beam_unit_scale)
        } else {
            Ok(beam_current)
        }
    }

    /// Elapsed times: the first superconductor-ramp line supplies the set
    /// time, a second one (the monitoring ramp) supplies the monitor time.
    fn extract_times(
        &self,
        lines: &[&str],
    ) -> Result<(Option<f64>, Option<f64>), ExtractError> {
        let mut time_lines = lines.iter().filter(|line| line.contains(SET_TIME_MARKER));
        let set_time = match time_lines.next() {
            Some(line) => Some(self.first_number("set time", line)?),
            None => return Ok((None, None)),
        };
        let monitor_time = match time_lines.next() {
            Some(line) => Some(self.first_number("monitor time", line)?),
            None => None,
        };
        Ok((set_time, monitor_time))
    }

    fn first_number(&self, field: &str, line: &str) -> Result<f64, ExtractError> {
        let caps = self
            .number_pattern
            .captures(line)
            .ok_or_else(|| ExtractError::NoNumber(field.to_string()))?;
        parse_float(field, &caps[1])
    }
}

fn parse_float(field: &str, value: &str) -> Result<f64, ExtractError> {
    value.parse().map_err(|_| ExtractError::BadNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}
