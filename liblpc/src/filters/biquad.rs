//! Second-order IIR sections from the RBJ Audio EQ Cookbook

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::core::{LpcError, LpcResult};

/// Band-pass gain convention
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandPassGain {
    /// constant 0 dB peak gain
    #[default]
    ZeroDbPeak,
    /// constant skirt gain, peak gain = Q
    ConstantSkirt,
}

/// Filter shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass(BandPassGain),
    AllPass,
    LowShelf,
    HighShelf,
    /// peak for positive gain, notch-like cut for negative gain
    PeakNotch,
    Notch,
}

impl FilterKind {
    /// shelf and peak filters use the gain parameter
    pub fn uses_gain(self) -> bool {
        matches!(
            self,
            FilterKind::LowShelf | FilterKind::HighShelf | FilterKind::PeakNotch
        )
    }
}

impl std::str::FromStr for FilterKind {
    type Err = LpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lowpass" | "lp" => Ok(FilterKind::LowPass),
            "highpass" | "hp" => Ok(FilterKind::HighPass),
            "bandpass" | "bp" => Ok(FilterKind::BandPass(BandPassGain::ZeroDbPeak)),
            "bandpass-skirt" | "bp-skirt" => Ok(FilterKind::BandPass(BandPassGain::ConstantSkirt)),
            "allpass" | "ap" => Ok(FilterKind::AllPass),
            "lowshelf" => Ok(FilterKind::LowShelf),
            "highshelf" => Ok(FilterKind::HighShelf),
            "peak" | "peaknotch" => Ok(FilterKind::PeakNotch),
            "notch" => Ok(FilterKind::Notch),
            _ => Err(LpcError::invalid(format!("unknown filter kind: {s}"))),
        }
    }
}

/// Normalized biquad, `a0 == 1`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

/// Design one biquad section
///
/// `gain_db` is ignored by the kinds that have no gain.
pub fn design(
    kind: FilterKind,
    f0: f64,
    q: f64,
    gain_db: f64,
    sample_rate: f64,
) -> LpcResult<Biquad> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(LpcError::invalid(format!(
            "sample rate must be positive, got {sample_rate}"
        )));
    }
    if !(f0 > 0.0 && f0 < sample_rate / 2.0) {
        return Err(LpcError::invalid(format!(
            "center frequency {f0} must lie in (0, {})",
            sample_rate / 2.0
        )));
    }
    if !(q.is_finite() && q > 0.0) {
        return Err(LpcError::invalid(format!("Q must be positive, got {q}")));
    }
    if !gain_db.is_finite() {
        return Err(LpcError::invalid("gain must be finite"));
    }

    let a = 10.0_f64.powf(gain_db / 40.0);
    let w0 = 2.0 * PI * f0 / sample_rate;
    let cos_w0 = w0.cos();
    let sin_w0 = w0.sin();
    let alpha = sin_w0 / (2.0 * q);
    let sqrt_a = a.sqrt();

    let (b0, b1, b2, a0, a1, a2) = match kind {
        FilterKind::LowPass => (
            (1.0 - cos_w0) / 2.0,
            1.0 - cos_w0,
            (1.0 - cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ),
        FilterKind::HighPass => (
            (1.0 + cos_w0) / 2.0,
            -1.0 - cos_w0,
            (1.0 + cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ),
        FilterKind::BandPass(BandPassGain::ZeroDbPeak) => (
            alpha,
            0.0,
            -alpha,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ),
        FilterKind::BandPass(BandPassGain::ConstantSkirt) => (
            sin_w0 / 2.0,
            0.0,
            -sin_w0 / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ),
        FilterKind::AllPass => (
            1.0 - alpha,
            -2.0 * cos_w0,
            1.0 + alpha,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ),
        FilterKind::LowShelf => (
            a * ((a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha),
            2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
            a * ((a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha),
            (a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha,
            -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
            (a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha,
        ),
        FilterKind::HighShelf => (
            a * ((a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
            a * ((a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha),
            (a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha,
            2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
            (a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha,
        ),
        FilterKind::PeakNotch => (
            1.0 + alpha * a,
            -2.0 * cos_w0,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_w0,
            1.0 - alpha / a,
        ),
        FilterKind::Notch => (
            1.0,
            -2.0 * cos_w0,
            1.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ),
    };

    Ok(Biquad {
        b: [b0 / a0, b1 / a0, b2 / a0],
        a: [1.0, a1 / a0, a2 / a0],
    })
}

impl Biquad {
    /// `[b0, b1, b2, a0, a1, a2]`, normalized by `a0`
    pub fn coefficients(&self) -> [f64; 6] {
        [self.b[0], self.b[1], self.b[2], self.a[0], self.a[1], self.a[2]]
    }

    /// Filter a whole signal from rest (Direct Form II Transposed)
    pub fn process(&self, signal: &[f64]) -> Vec<f64> {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let (mut z1, mut z2) = (0.0, 0.0);

        signal
            .iter()
            .map(|&x| {
                let y = b0 * x + z1;
                z1 = b1 * x - a1 * y + z2;
                z2 = b2 * x - a2 * y;
                y
            })
            .collect()
    }

    /// Magnitude response at `freq` Hz
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let eval = |c: &[f64; 3]| {
            let re = c[0] + c[1] * w.cos() + c[2] * (2.0 * w).cos();
            let im = -c[1] * w.sin() - c[2] * (2.0 * w).sin();
            (re * re + im * im).sqrt()
        };
        eval(&self.b) / eval(&self.a)
    }
}
