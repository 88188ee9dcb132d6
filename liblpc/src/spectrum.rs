//! Frame spectra, overlap-add resynthesis and LPC spectral envelopes

use rustfft::num_complex::Complex;
use rustfft::{FftDirection, FftPlanner};

use crate::core::{LpcError, LpcResult};
use crate::framing::Frames;

/// FFT of every windowed frame, `frame_len` bins each
pub fn frame_spectra(frames: &Frames) -> Vec<Vec<Complex<f64>>> {
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft(frames.frame_len(), FftDirection::Forward);

    frames
        .iter()
        .map(|frame| {
            let mut buffer: Vec<Complex<f64>> =
                frame.iter().map(|&s| Complex::new(s, 0.0)).collect();
            fft.process(&mut buffer);
            buffer
        })
        .collect()
}

/// Inverse FFT of each spectrum, overlap-added at half-frame hop
///
/// Output length is `(frame_count + 1) · frame_len / 2`.
pub fn overlap_add(spectra: &[Vec<Complex<f64>>]) -> LpcResult<Vec<f64>> {
    let Some(first) = spectra.first() else {
        return Ok(Vec::new());
    };
    let frame_len = first.len();
    if frame_len == 0 || frame_len % 2 != 0 {
        return Err(LpcError::invalid(format!(
            "spectrum length must be positive and even, got {frame_len}"
        )));
    }
    if let Some(i) = spectra.iter().position(|s| s.len() != frame_len) {
        return Err(LpcError::invalid(format!(
            "spectrum {i} has {} bins, expected {frame_len}",
            spectra[i].len()
        )));
    }

    let hop = frame_len / 2;
    let mut planner = FftPlanner::<f64>::new();
    let ifft = planner.plan_fft(frame_len, FftDirection::Inverse);
    let scale = 1.0 / frame_len as f64;

    let mut output = vec![0.0; (spectra.len() + 1) * hop];
    let mut buffer = vec![Complex::new(0.0, 0.0); frame_len];
    for (i, spectrum) in spectra.iter().enumerate() {
        buffer.copy_from_slice(spectrum);
        ifft.process(&mut buffer);
        let start = i * hop;
        for (out, bin) in output[start..start + frame_len].iter_mut().zip(&buffer) {
            *out += bin.re * scale;
        }
    }

    Ok(output)
}

/// LPC spectral envelope `gain / |A(e^jω)|` on `nfft / 2 + 1` bins
pub fn lpc_envelope(coefficients: &[f64], gain: f64, nfft: usize) -> LpcResult<Vec<f64>> {
    if coefficients.is_empty() {
        return Err(LpcError::invalid("coefficient vector is empty"));
    }
    if nfft < coefficients.len() {
        return Err(LpcError::invalid(format!(
            "FFT size {nfft} is shorter than {} coefficients",
            coefficients.len()
        )));
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft(nfft, FftDirection::Forward);
    let mut buffer = vec![Complex::new(0.0, 0.0); nfft];
    for (slot, &c) in buffer.iter_mut().zip(coefficients) {
        slot.re = c;
    }
    fft.process(&mut buffer);

    Ok(buffer[..=nfft / 2]
        .iter()
        .map(|bin| gain / bin.norm())
        .collect())
}
