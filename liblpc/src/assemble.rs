//! Reassembly of tagged per-frame results into the coefficient matrix

use log::trace;

use crate::core::{CoefficientMatrix, LpcError, LpcResult, RawResult};

/// Place every result into its row by frame index
///
/// Rows start as `[1, 0, ..., 0]`. A full-length result overwrites its row;
/// a shorter non-empty result is the silent-frame marker and leaves the
/// canonical row in place. Anything else is a shape error. Arrival order
/// has no effect on the output.
pub fn assemble<I>(
    frame_count: usize,
    order: usize,
    raw_results: I,
) -> LpcResult<CoefficientMatrix>
where
    I: IntoIterator<Item = RawResult>,
{
    if order == 0 {
        return Err(LpcError::invalid("model order must be at least 1"));
    }

    let width = order + 1;
    let mut matrix = CoefficientMatrix::canonical(frame_count, order);
    let mut written = vec![false; frame_count];

    for result in raw_results {
        let index = result.frame_index;
        let len = result.coefficients.len();

        let slot = written
            .get_mut(index)
            .ok_or_else(|| LpcError::ResultShapeError {
                frame_index: index,
                reason: format!("frame index out of range (frame count {frame_count})"),
            })?;
        if *slot {
            return Err(LpcError::ResultShapeError {
                frame_index: index,
                reason: "duplicate result for frame".to_string(),
            });
        }
        *slot = true;

        if len == width {
            matrix.set_row(index, &result.coefficients);
        } else if len > 0 && len < width {
            trace!("frame {index}: degenerate result of length {len}, keeping unity row");
        } else {
            return Err(LpcError::ResultShapeError {
                frame_index: index,
                reason: format!("expected {width} coefficients, got {len}"),
            });
        }
    }

    let missing: Vec<usize> = written
        .iter()
        .enumerate()
        .filter(|(_, done)| !**done)
        .map(|(i, _)| i)
        .collect();
    if !missing.is_empty() {
        return Err(LpcError::WorkerFailure {
            frames: missing,
            reason: "no result returned".to_string(),
        });
    }

    Ok(matrix)
}
