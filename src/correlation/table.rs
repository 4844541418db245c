use std::fmt;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::stats::{pairwise_complete, pearson, spearman};

/// Correlation coefficient used for a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Spearman rank correlation
    Spearman,
    /// Pearson linear correlation
    Pearson,
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationMethod::Spearman => f.write_str("spearman"),
            CorrelationMethod::Pearson => f.write_str("pearson"),
        }
    }
}

/// Peaks × samples table of region means.
///
/// Rows are keyed by the peak's `mz_low`; a `None` cell means the region
/// carried no signal for that peak.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorrelationTable {
    index: Vec<f64>,
    labels: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl CorrelationTable {
    /// Create an empty table with the given column labels
    pub fn new(labels: Vec<String>) -> Self {
        let columns = vec![Vec::new(); labels.len()];
        Self {
            index: Vec::new(),
            labels,
            columns,
        }
    }

    /// Append one peak row; `cells` must hold one entry per label
    pub fn push_row(&mut self, mz_low: f64, cells: Vec<Option<f64>>) {
        debug_assert_eq!(cells.len(), self.labels.len());
        self.index.push(mz_low);
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.push(cell);
        }
    }

    /// Row keys
    pub fn index(&self) -> &[f64] {
        &self.index
    }

    /// Column labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of peak rows
    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// Cells of the column labelled `label`
    pub fn column(&self, label: &str) -> Option<&[Option<f64>]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.columns[i].as_slice())
    }

    /// Cell at `(row, column)`
    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.columns.get(column)?.get(row).copied().flatten()
    }

    /// Column-by-column correlation over pairwise-complete rows
    pub fn correlation(&self, method: CorrelationMethod) -> CorrelationMatrix {
        let n = self.labels.len();
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let (x, y) = pairwise_complete(&self.columns[i], &self.columns[j]);
                let r = match method {
                    CorrelationMethod::Spearman => spearman(&x, &y),
                    CorrelationMethod::Pearson => pearson(&x, &y),
                };
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        CorrelationMatrix {
            method,
            labels: self.labels.clone(),
            values,
        }
    }

    /// Spearman correlation matrix
    pub fn spearman(&self) -> CorrelationMatrix {
        self.correlation(CorrelationMethod::Spearman)
    }

    /// Pearson correlation matrix
    pub fn pearson(&self) -> CorrelationMatrix {
        self.correlation(CorrelationMethod::Pearson)
    }

    /// Write as CSV with an `mz_low` index column; missing cells are empty
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut header = vec!["mz_low".to_string()];
        header.extend(self.labels.iter().cloned());
        csv_writer.write_record(&header)?;

        for (row, mz_low) in self.index.iter().enumerate() {
            let mut record = vec![mz_low.to_string()];
            record.extend(self.columns.iter().map(|c| cell_text(c[row])));
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write as CSV to a file
    pub fn write_csv_file(&self, path: &Path) -> Result<(), csv::Error> {
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}

impl fmt::Display for CorrelationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = column_widths(&self.labels);
        write!(f, "{:>12}", "mz_low")?;
        for (label, width) in self.labels.iter().zip(&widths) {
            write!(f, "  {:>width$}", label, width = width)?;
        }
        for (row, mz_low) in self.index.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{:>12.4}", mz_low)?;
            for (column, width) in self.columns.iter().zip(&widths) {
                write!(f, "  {:>width$}", display_cell(column[row]), width = width)?;
            }
        }
        Ok(())
    }
}

/// Symmetric matrix of correlation coefficients between sample columns
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    /// Coefficient used
    pub method: CorrelationMethod,
    /// Row and column labels
    pub labels: Vec<String>,
    /// `values[i][j]`; `None` where fewer than two complete pairs exist or a
    /// column is constant
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Coefficient between the columns labelled `a` and `b`
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.values[i][j]
    }

    /// Write as CSV with labels on both axes
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut header = vec![String::new()];
        header.extend(self.labels.iter().cloned());
        csv_writer.write_record(&header)?;

        for (label, row) in self.labels.iter().zip(&self.values) {
            let mut record = vec![label.clone()];
            record.extend(row.iter().map(|&v| cell_text(v)));
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write as CSV to a file
    pub fn write_csv_file(&self, path: &Path) -> Result<(), csv::Error> {
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = column_widths(&self.labels);
        let first = self.labels.iter().map(String::len).max().unwrap_or(0);
        write!(f, "{:first$}", "", first = first)?;
        for (label, width) in self.labels.iter().zip(&widths) {
            write!(f, "  {:>width$}", label, width = width)?;
        }
        for (label, row) in self.labels.iter().zip(&self.values) {
            writeln!(f)?;
            write!(f, "{:<first$}", label, first = first)?;
            for (&value, width) in row.iter().zip(&widths) {
                write!(f, "  {:>width$}", display_cell(value), width = width)?;
            }
        }
        Ok(())
    }
}

fn column_widths(labels: &[String]) -> Vec<usize> {
    labels.iter().map(|l| l.len().max(8)).collect()
}

fn cell_text(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn display_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string())
}
