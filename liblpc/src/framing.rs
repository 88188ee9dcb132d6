//! Overlapping, windowed analysis frames
//!
//! A signal is zero-padded to a multiple of the hop `n = frame_len / 2` and
//! cut into frames `[i·n, (i+2)·n)`, so neighbours overlap by half a frame.
//! Every frame is multiplied by a symmetric Hann window.

use std::f64::consts::PI;
use std::sync::Arc;

use crate::core::{LpcError, LpcResult};

/// Symmetric Hann window, `w[k] = 0.5 - 0.5·cos(2πk/(len-1))`
pub fn hann_window(len: usize) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (len - 1) as f64;
            (0..len)
                .map(|k| 0.5 - 0.5 * (2.0 * PI * k as f64 / denom).cos())
                .collect()
        }
    }
}

/// Zero-pad `signal` up to the next multiple of `hop`
pub fn pad_to_hop(signal: &[f64], hop: usize) -> Vec<f64> {
    let mut padded = signal.to_vec();
    if hop > 0 {
        let last = signal.len() % hop;
        if last != 0 {
            padded.resize(signal.len() + hop - last, 0.0);
        }
    }
    padded
}

fn check_frame_len(frame_len: usize) -> LpcResult<usize> {
    if frame_len == 0 || frame_len % 2 != 0 {
        return Err(LpcError::invalid(format!(
            "frame length must be positive and even, got {frame_len}"
        )));
    }
    Ok(frame_len / 2)
}

/// Number of frames a signal of `signal_len` samples yields
pub fn frame_count(signal_len: usize, frame_len: usize) -> LpcResult<usize> {
    let hop = check_frame_len(frame_len)?;
    let padded_len = signal_len.div_ceil(hop) * hop;
    if padded_len < 2 * hop {
        return Err(LpcError::InsufficientSamples {
            required: hop + 1,
            actual: signal_len,
        });
    }
    Ok(padded_len / hop - 1)
}

/// Slice `signal` into windowed frames of `frame_len` samples at 50% overlap
pub fn frame_signal(signal: &[f64], frame_len: usize) -> LpcResult<Frames> {
    let count = frame_count(signal.len(), frame_len)?;
    let hop = frame_len / 2;
    let padded = pad_to_hop(signal, hop);
    let window = hann_window(frame_len);

    let mut data = Vec::with_capacity(count * frame_len);
    for i in 0..count {
        let start = i * hop;
        let raw = &padded[start..start + frame_len];
        data.extend(raw.iter().zip(&window).map(|(s, w)| s * w));
    }

    Ok(Frames {
        data: data.into(),
        frame_len,
        count,
    })
}

/// A block of equally sized analysis frames
///
/// Storage is one contiguous `count × frame_len` buffer behind an `Arc`, so
/// cloning is cheap and workers can share it read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Frames {
    data: Arc<[f64]>,
    frame_len: usize,
    count: usize,
}

impl Frames {
    /// Build from frames that are already windowed
    pub fn from_rows(rows: &[Vec<f64>]) -> LpcResult<Self> {
        let frame_len = rows.first().map_or(0, Vec::len);
        if frame_len == 0 {
            return Err(LpcError::invalid("frames must be non-empty"));
        }
        if let Some(i) = rows.iter().position(|r| r.len() != frame_len) {
            return Err(LpcError::invalid(format!(
                "frame {i} has {} samples, expected {frame_len}",
                rows[i].len()
            )));
        }
        let data: Vec<f64> = rows.iter().flatten().copied().collect();
        Ok(Frames {
            data: data.into(),
            frame_len,
            count: rows.len(),
        })
    }

    /// number of frames
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn hop(&self) -> usize {
        self.frame_len / 2
    }

    /// Frame `index`; panics when out of range, like slice indexing
    pub fn frame(&self, index: usize) -> &[f64] {
        assert!(index < self.count, "frame index {index} out of range");
        &self.data[index * self.frame_len..(index + 1) * self.frame_len]
    }

    pub fn get(&self, index: usize) -> Option<&[f64]> {
        (index < self.count).then(|| self.frame(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.frame_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_matches_numpy() {
        // np.hanning(5) == [0, 0.5, 1, 0.5, 0]
        let w = hann_window(5);
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0];
        for (a, b) in w.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pad_to_hop() {
        assert_eq!(pad_to_hop(&[1.0; 8], 4).len(), 8);
        assert_eq!(pad_to_hop(&[1.0; 9], 4).len(), 12);
        assert_eq!(pad_to_hop(&[1.0; 9], 4)[9..], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_frame_layout() {
        let signal: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let frames = frame_signal(&signal, 8).unwrap();
        assert_eq!(frames.len(), 3);
        let window = hann_window(8);
        // frame 1 starts at sample 4
        for (k, &v) in frames.frame(1).iter().enumerate() {
            assert!((v - (4 + k) as f64 * window[k]).abs() < 1e-12);
        }
    }
}
