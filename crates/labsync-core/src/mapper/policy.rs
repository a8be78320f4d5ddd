//! Result-value policies.
//!
//! Which remote field becomes the sub-item's result, and how qualitative
//! result text is classified, is assay-specific. Policies keep that rule out
//! of the orchestrator so variant formats can be swapped in.

use labsync_remote::AnalyteRow;

/// Derives the value to write into a sub-item from its matched remote row.
///
/// Returning `None` leaves the sub-item unchanged and marks it skipped.
pub trait ResultPolicy {
    fn result_value(&self, row: &AnalyteRow) -> Option<String>;
}

/// Copies the numeric cycle-threshold field, formatted as text.
pub struct CycleThresholdPolicy;

impl ResultPolicy for CycleThresholdPolicy {
    fn result_value(&self, row: &AnalyteRow) -> Option<String> {
        row.cycle_threshold.map(|ct| format!("{ct}"))
    }
}

/// Classifies `|`-delimited qualitative result text.
///
/// The text splits on the first `|`. A first segment equal to the sentinel
/// (ignoring case and whitespace) yields the fixed normal label; anything
/// else yields the second segment verbatim.
pub struct DetectionPolicy {
    /// Analyzer string meaning "target not detected"
    pub sentinel: String,
    /// Label written when the sentinel matches
    pub normal_label: String,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            sentinel: "MTB NOT DETECTED".into(),
            normal_label: "NORMAL".into(),
        }
    }
}

impl ResultPolicy for DetectionPolicy {
    fn result_value(&self, row: &AnalyteRow) -> Option<String> {
        let text = row.analyte_result.as_deref()?;
        let mut segments = text.splitn(2, '|');
        let verdict = segments.next()?;

        if canonical(verdict) == canonical(&self.sentinel) {
            Some(self.normal_label.clone())
        } else {
            segments.next().map(str::to_owned)
        }
    }
}

fn canonical(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}
