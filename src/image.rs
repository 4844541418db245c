//! Ion images and per-region summary statistics.
//!
//! An [`IonImage`] is the per-pixel intensity grid returned by an imaging
//! session for one mass window. Grid cells outside the queried region carry
//! non-finite values (typically NaN), so every consumer sanitizes first.

/// Errors raised when constructing an ion image
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImageError {
    /// Value count does not match the declared grid dimensions
    #[error("image of {width}x{height} pixels needs {} values, got {len}", .width * .height)]
    ShapeMismatch {
        /// Grid width
        width: usize,
        /// Grid height
        height: usize,
        /// Number of values supplied
        len: usize,
    },

    /// Rows of unequal length were supplied
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRows {
        /// Offending row index
        row: usize,
        /// Width taken from the first row
        expected: usize,
        /// Width of the offending row
        found: usize,
    },
}

/// A 2D per-pixel intensity grid, stored row-major (`y` major, `x` minor).
#[derive(Debug, Clone, PartialEq)]
pub struct IonImage {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl IonImage {
    /// Create an image from row-major values
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Result<Self, ImageError> {
        if values.len() != width * height {
            return Err(ImageError::ShapeMismatch {
                width,
                height,
                len: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Create an image where every pixel holds `value`
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    /// Create an image from a list of rows (`rows[y][x]`)
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ImageError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(width * height);
        for (row, data) in rows.into_iter().enumerate() {
            if data.len() != width {
                return Err(ImageError::RaggedRows {
                    row,
                    expected: width,
                    found: data.len(),
                });
            }
            values.extend(data);
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Grid width (number of `x` positions)
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height (number of `y` positions)
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels in the grid
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the grid has no pixels
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row-major pixel values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `(x, y)`, if inside the grid
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x < self.width && y < self.height {
            Some(self.values[y * self.width + x])
        } else {
            None
        }
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, value: f64) {
        if x < self.width && y < self.height {
            self.values[y * self.width + x] = value;
        }
    }

    /// Copy of the image with every non-finite value replaced by zero
    pub fn sanitized(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            values: self
                .values
                .iter()
                .map(|&v| if v.is_finite() { v } else { 0.0 })
                .collect(),
        }
    }
}

/// Scalar summary of one peak's image over one region
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionSignal {
    /// Mean of `log10(intensity + 1)` over the positive pixels
    Mean {
        /// The mean log-intensity
        value: f64,
        /// Number of pixels that contributed
        pixels: usize,
    },
    /// No pixel carried a positive intensity
    NoSignal,
}

impl RegionSignal {
    /// The mean, or `None` for [`RegionSignal::NoSignal`]
    pub fn value(&self) -> Option<f64> {
        match self {
            RegionSignal::Mean { value, .. } => Some(*value),
            RegionSignal::NoSignal => None,
        }
    }
}

/// Summarize an image as the mean log-intensity of its positive pixels.
///
/// Non-finite pixels count as zero and are therefore dropped together with
/// every other non-positive pixel. An image with nothing left reports
/// [`RegionSignal::NoSignal`].
pub fn region_signal(image: &IonImage) -> RegionSignal {
    let (sum, pixels) = image
        .values()
        .iter()
        .filter(|v| v.is_finite() && **v > 0.0)
        .fold((0.0_f64, 0_usize), |(sum, n), &v| (sum + (v + 1.0).log10(), n + 1));

    if pixels == 0 {
        RegionSignal::NoSignal
    } else {
        RegionSignal::Mean {
            value: sum / pixels as f64,
            pixels,
        }
    }
}
