//! common types for lpc analysis

use serde::{Deserialize, Serialize};

use super::{LpcError, LpcResult};

/// One per-frame result as it travels back from a worker
///
/// The frame index always rides along with the payload, so results can be
/// placed correctly no matter which worker finishes first.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    /// index of the frame this result belongs to
    pub frame_index: usize,
    /// `order + 1` coefficients, or a shorter vector for a silent frame
    pub coefficients: Vec<f64>,
}

impl RawResult {
    pub fn new(frame_index: usize, coefficients: Vec<f64>) -> Self {
        RawResult {
            frame_index,
            coefficients,
        }
    }
}

/// `frame_count × (order + 1)` matrix of LPC coefficients, row per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct CoefficientMatrix {
    frame_count: usize,
    order: usize,
    /// row-major coefficients
    data: Vec<f64>,
}

/// Unchecked serialized form, validated on the way in
#[derive(Deserialize)]
struct MatrixParts {
    frame_count: usize,
    order: usize,
    data: Vec<f64>,
}

impl TryFrom<MatrixParts> for CoefficientMatrix {
    type Error = LpcError;

    fn try_from(parts: MatrixParts) -> LpcResult<Self> {
        CoefficientMatrix::from_row_major(parts.frame_count, parts.order, parts.data)
    }
}

impl CoefficientMatrix {
    /// Wrap row-major coefficients; `data` must hold exactly
    /// `frame_count · (order + 1)` values
    pub fn from_row_major(frame_count: usize, order: usize, data: Vec<f64>) -> LpcResult<Self> {
        if order == 0 {
            return Err(LpcError::invalid("model order must be at least 1"));
        }
        let expected = frame_count.checked_mul(order + 1);
        if expected != Some(data.len()) {
            return Err(LpcError::invalid(format!(
                "{} coefficients do not fill {frame_count} rows of {}",
                data.len(),
                order + 1
            )));
        }
        Ok(CoefficientMatrix {
            frame_count,
            order,
            data,
        })
    }

    /// matrix with every row set to `[1, 0, ..., 0]`
    pub fn canonical(frame_count: usize, order: usize) -> Self {
        let width = order + 1;
        let mut data = vec![0.0; frame_count * width];
        for row in data.chunks_exact_mut(width) {
            row[0] = 1.0;
        }
        CoefficientMatrix {
            frame_count,
            order,
            data,
        }
    }

    /// number of rows
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// model order `p`
    pub fn order(&self) -> usize {
        self.order
    }

    /// row length, `p + 1`
    pub fn width(&self) -> usize {
        self.order + 1
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.frame_count {
            return None;
        }
        let width = self.width();
        Some(&self.data[index * width..(index + 1) * width])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.width())
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// flat row-major view
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn set_row(&mut self, index: usize, coefficients: &[f64]) {
        let width = self.width();
        self.data[index * width..(index + 1) * width].copy_from_slice(coefficients);
    }
}
