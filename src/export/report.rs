use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
#[cfg(feature = "colorized_output")]
use console::style;

use crate::backend::PeakWindow;

/// Why a peak was left out of an export table
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The backend failed to deliver the image
    Retrieval(String),
    /// The image grid differs from the table's grid
    ShapeMismatch {
        /// Table grid `(width, height)`
        expected: (usize, usize),
        /// Image grid `(width, height)`
        found: (usize, usize),
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Retrieval(message) => write!(f, "{}", message),
            SkipReason::ShapeMismatch { expected, found } => write!(
                f,
                "image is {}x{} but the table is {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
        }
    }
}

/// Result of exporting a single peak
#[derive(Debug, Clone, PartialEq)]
pub enum PeakOutcome {
    /// Peak was added as a column
    Exported {
        /// Position in the peak list
        index: usize,
        /// Column key
        key: f64,
    },
    /// Peak was skipped
    Skipped {
        /// Position in the peak list
        index: usize,
        /// Reference window of the peak
        window: PeakWindow,
        /// Cause
        reason: SkipReason,
    },
}

impl PeakOutcome {
    /// True for [`PeakOutcome::Skipped`]
    pub fn is_skipped(&self) -> bool {
        matches!(self, PeakOutcome::Skipped { .. })
    }
}

/// A skipped peak, located by file and region
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPeak {
    /// File key
    pub file: String,
    /// Region label
    pub region: String,
    /// Position in the peak list
    pub index: usize,
    /// Reference window of the peak
    pub window: PeakWindow,
    /// Cause
    pub reason: SkipReason,
}

/// A CSV table written by the export
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenTable {
    /// File key
    pub file: String,
    /// Region label
    pub region: String,
    /// Output path
    pub path: PathBuf,
    /// Pixel rows
    pub rows: usize,
    /// Columns including `x` and `y`
    pub columns: usize,
}

impl WrittenTable {
    /// True when no peak image could be retrieved, leaving only the header
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// End-of-run summary of an export
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// When the run started
    pub started: DateTime<Local>,
    /// Tables written, in processing order
    pub written: Vec<WrittenTable>,
    /// Peaks that were skipped
    pub skipped: Vec<SkippedPeak>,
}

impl Default for ExportReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportReport {
    /// Start an empty report
    pub fn new() -> Self {
        Self {
            started: Local::now(),
            written: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Record the outcomes of one (file, region) table
    pub fn record(&mut self, table: WrittenTable, outcomes: &[PeakOutcome]) {
        for outcome in outcomes {
            if let PeakOutcome::Skipped {
                index,
                window,
                reason,
            } = outcome
            {
                self.skipped.push(SkippedPeak {
                    file: table.file.clone(),
                    region: table.region.clone(),
                    index: *index,
                    window: *window,
                    reason: reason.clone(),
                });
            }
        }
        self.written.push(table);
    }

    /// True when at least one peak was skipped
    pub fn has_skips(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Tables written without any pixel rows
    pub fn empty_tables(&self) -> impl Iterator<Item = &WrittenTable> + '_ {
        self.written.iter().filter(|t| t.is_empty())
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            let mut output = String::new();
            output.push_str(&format!("{}\n", style("Export Report").bold().cyan()));
            output.push_str(&format!("{}\n", style("=============").cyan()));
            output.push_str(&format!(
                "Started: {}\n\n",
                self.started.format("%Y-%m-%d %H:%M:%S")
            ));
            for table in &self.written {
                if table.is_empty() {
                    output.push_str(&format!(
                        "{} {} (no peak image retrieved)\n",
                        style("empty").red(),
                        table.path.display()
                    ));
                } else {
                    output.push_str(&format!(
                        "{} {} ({} rows, {} columns)\n",
                        style("wrote").green(),
                        table.path.display(),
                        table.rows,
                        table.columns
                    ));
                }
            }
            if self.has_skips() {
                output.push('\n');
                for skip in &self.skipped {
                    output.push_str(&format!(
                        "{} {}/{} peak #{} {}: {}\n",
                        style("skipped").yellow(),
                        skip.file,
                        skip.region,
                        skip.index,
                        skip.window,
                        skip.reason
                    ));
                }
            }
            output.push_str(&format!(
                "\n{}: {} tables, {} skipped peaks\n",
                style("Summary").bold(),
                self.written.len(),
                self.skipped.len()
            ));
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            self.to_string()
        }
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Export Report")?;
        writeln!(f, "=============")?;
        writeln!(f, "Started: {}", self.started.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f)?;
        for table in &self.written {
            if table.is_empty() {
                writeln!(f, "[EMPTY] {} (no peak image retrieved)", table.path.display())?;
            } else {
                writeln!(
                    f,
                    "[WROTE] {} ({} rows, {} columns)",
                    table.path.display(),
                    table.rows,
                    table.columns
                )?;
            }
        }
        if self.has_skips() {
            writeln!(f)?;
            for skip in &self.skipped {
                writeln!(
                    f,
                    "[SKIP] {}/{} peak #{} {}: {}",
                    skip.file, skip.region, skip.index, skip.window, skip.reason
                )?;
            }
        }
        writeln!(f)?;
        write!(
            f,
            "Summary: {} tables, {} skipped peaks",
            self.written.len(),
            self.skipped.len()
        )
    }
}
