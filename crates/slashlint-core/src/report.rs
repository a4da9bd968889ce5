//! Run-level aggregation.
//!
//! Documents are processed independently, possibly on parallel workers;
//! these accumulators are the single fan-in point. Both `add` and `merge`
//! are commutative count/append operations, so arrival order never affects
//! the summary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fix::FixRecord;
use crate::lint::{Classification, FileReport};

/// Aggregated results of a validation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunSummary {
    /// Documents with no warnings or errors.
    pub fully_valid: usize,
    /// Documents with warnings only.
    pub valid_with_warnings: usize,
    /// Documents with at least one error.
    pub invalid: usize,
    /// Per-document breakdown.
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    /// Fold one document's report into the summary.
    pub fn add(&mut self, report: FileReport) {
        match report.classification {
            Classification::FullyValid => self.fully_valid += 1,
            Classification::ValidWithWarnings => self.valid_with_warnings += 1,
            Classification::Invalid => self.invalid += 1,
        }
        self.reports.push(report);
    }

    /// Merge another summary into this one.
    pub fn merge(&mut self, other: Self) {
        self.fully_valid += other.fully_valid;
        self.valid_with_warnings += other.valid_with_warnings;
        self.invalid += other.invalid;
        self.reports.extend(other.reports);
    }

    /// Total number of documents seen.
    pub const fn total(&self) -> usize {
        self.fully_valid + self.valid_with_warnings + self.invalid
    }

    /// Returns `true` if any document is invalid.
    ///
    /// Drives the process exit status: warnings alone never fail a run.
    pub const fn has_failures(&self) -> bool {
        self.invalid > 0
    }
}

impl FromIterator<FileReport> for RunSummary {
    fn from_iter<I: IntoIterator<Item = FileReport>>(iter: I) -> Self {
        let mut summary = Self::default();
        for report in iter {
            summary.add(report);
        }
        summary
    }
}

/// The fix outcome for one document, as aggregated across a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileFixes {
    /// The document that was fixed (or failed to parse).
    pub file: String,
    /// Fixes applied; empty only for failure entries.
    pub records: Vec<FixRecord>,
    /// Set when the document could not be processed at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated results of a fix run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FixSummary {
    /// Documents examined.
    pub checked: usize,
    /// Documents that received at least one fix.
    pub fixed: usize,
    /// Documents that could not be parsed even after repair.
    pub failed: usize,
    /// Per-document breakdown, fixed and failed documents only.
    pub entries: Vec<FileFixes>,
}

impl FixSummary {
    /// Record a document that needed no changes.
    pub const fn add_clean(&mut self) {
        self.checked += 1;
    }

    /// Record a document that received fixes.
    pub fn add_fixed(&mut self, file: impl Into<String>, records: Vec<FixRecord>) {
        self.checked += 1;
        self.fixed += 1;
        self.entries.push(FileFixes {
            file: file.into(),
            records,
            error: None,
        });
    }

    /// Record a document that could not be processed.
    pub fn add_failed(&mut self, file: impl Into<String>, message: impl Into<String>) {
        self.checked += 1;
        self.failed += 1;
        self.entries.push(FileFixes {
            file: file.into(),
            records: Vec::new(),
            error: Some(message.into()),
        });
    }

    /// Merge another summary into this one.
    pub fn merge(&mut self, other: Self) {
        self.checked += other.checked;
        self.fixed += other.fixed;
        self.failed += other.failed;
        self.entries.extend(other.entries);
    }
}
