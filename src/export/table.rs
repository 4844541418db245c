use std::io::Write;
use std::path::Path;

use crate::image::IonImage;

/// One peak column of an export table
#[derive(Debug, Clone, PartialEq)]
pub struct ExportColumn {
    /// Window midpoint labelling the column
    pub key: f64,
    /// Per-pixel intensities in table row order
    pub values: Vec<f64>,
}

/// Per-pixel intensity table: columns `x`, `y`, then one column per peak.
///
/// Rows follow the row-major layout of the images (`y` major, `x` minor).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportTable {
    width: usize,
    height: usize,
    columns: Vec<ExportColumn>,
}

impl ExportTable {
    /// Create an empty table for a `width × height` pixel grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            columns: Vec::new(),
        }
    }

    /// Grid dimensions `(width, height)`
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of pixel rows
    pub fn row_count(&self) -> usize {
        self.width * self.height
    }

    /// Number of columns including `x` and `y`
    pub fn column_count(&self) -> usize {
        2 + self.columns.len()
    }

    /// Peak columns in insertion order
    pub fn columns(&self) -> &[ExportColumn] {
        &self.columns
    }

    /// Pixel coordinates of each row
    pub fn coordinates(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y)))
    }

    /// Add an image as a column keyed by `key`.
    ///
    /// Returns `Err((width, height))` of the image when its shape does not match
    /// the table. A column with an identical key is replaced.
    pub fn push_image(&mut self, key: f64, image: &IonImage) -> Result<(), (usize, usize)> {
        if (image.width(), image.height()) != self.shape() {
            return Err((image.width(), image.height()));
        }
        let column = ExportColumn {
            key,
            values: image.values().to_vec(),
        };
        match self.columns.iter_mut().find(|c| c.key == key) {
            Some(existing) => {
                log::warn!("Replacing duplicate column {}", format_key(key));
                *existing = column;
            }
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Header row
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["x".to_string(), "y".to_string()];
        header.extend(self.columns.iter().map(|c| format_key(c.key)));
        header
    }

    /// Write the table as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.header())?;

        for (row, (x, y)) in self.coordinates().enumerate() {
            let mut record = Vec::with_capacity(self.column_count());
            record.push(x.to_string());
            record.push(y.to_string());
            record.extend(self.columns.iter().map(|c| c.values[row].to_string()));
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table as CSV to a file
    pub fn write_csv_file(&self, path: &Path) -> Result<(), csv::Error> {
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}

/// Format a column key so whole numbers keep one decimal (`500.0`)
pub fn format_key(key: f64) -> String {
    if key.fract() == 0.0 && key.is_finite() {
        format!("{:.1}", key)
    } else {
        key.to_string()
    }
}
