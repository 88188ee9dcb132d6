use crate::core::{LpcError, LpcResult};

/// Prediction error below this fraction of the frame energy is treated as
/// zero and ends the recursion.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Output of one Levinson-Durbin solve
#[derive(Debug, Clone, PartialEq)]
pub struct LpcModel {
    /// `[1, a1, ..., ap]`, the inverse filter `A(z) = 1 + Σ a_k z^-k`
    pub coefficients: Vec<f64>,
    /// reflection (PARCOR) coefficients `k1..kp`
    pub reflection: Vec<f64>,
    /// final prediction error energy
    pub prediction_error: f64,
}

impl LpcModel {
    /// model of a silent frame: `[1, 0, ..., 0]`, no error
    pub fn silent(order: usize) -> Self {
        LpcModel {
            coefficients: canonical_coefficients(order),
            reflection: vec![0.0; order],
            prediction_error: 0.0,
        }
    }
}

/// `[1, 0, ..., 0]` with `order + 1` entries
pub fn canonical_coefficients(order: usize) -> Vec<f64> {
    let mut coeffs = vec![0.0; order + 1];
    coeffs[0] = 1.0;
    coeffs
}

/// true for the unity-gain vector `[1, 0, ..., 0]` of any length
pub fn is_silent(coefficients: &[f64]) -> bool {
    match coefficients.split_first() {
        Some((&first, rest)) => first == 1.0 && rest.iter().all(|&c| c == 0.0),
        None => false,
    }
}

/// Calculate autocorrelation coefficients `r[0..=max_lag]`
pub fn autocorrelation(samples: &[f64], max_lag: usize) -> Vec<f64> {
    let n = samples.len();
    let mut autocorr = vec![0.0; max_lag + 1];

    for lag in 0..=max_lag {
        let mut sum = 0.0;
        for i in 0..(n.saturating_sub(lag)) {
            sum += samples[i] * samples[i + lag];
        }
        autocorr[lag] = sum;
    }

    autocorr
}

/// Levinson-Durbin recursion over an autocorrelation sequence
///
/// Zero energy gives the silent model. When the prediction error collapses
/// before `order` stages the remaining coefficients stay zero.
pub fn levinson_durbin(autocorr: &[f64], order: usize) -> LpcResult<LpcModel> {
    if order == 0 {
        return Err(LpcError::invalid("model order must be at least 1"));
    }
    if autocorr.len() < order + 1 {
        return Err(LpcError::invalid(format!(
            "need {} autocorrelation lags, got {}",
            order + 1,
            autocorr.len()
        )));
    }
    if autocorr[..=order].iter().any(|r| !r.is_finite()) {
        return Err(LpcError::NumericalError(
            "autocorrelation is not finite".to_string(),
        ));
    }

    let energy = autocorr[0];
    if energy == 0.0 {
        return Ok(LpcModel::silent(order));
    }
    if energy < 0.0 {
        return Err(LpcError::NumericalError(format!(
            "negative frame energy {energy}"
        )));
    }

    let mut coeffs = canonical_coefficients(order);
    let mut prev = coeffs.clone();
    let mut reflection = vec![0.0; order];
    let mut error = energy;

    for i in 1..=order {
        if error <= energy * SINGULAR_TOLERANCE {
            break;
        }

        let mut acc = autocorr[i];
        for j in 1..i {
            acc += coeffs[j] * autocorr[i - j];
        }
        let k = -acc / error;

        prev.copy_from_slice(&coeffs);
        for j in 1..i {
            coeffs[j] = prev[j] + k * prev[i - j];
        }
        coeffs[i] = k;
        reflection[i - 1] = k;

        error *= 1.0 - k * k;
    }

    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(LpcError::NumericalError(
            "coefficients diverged".to_string(),
        ));
    }

    Ok(LpcModel {
        coefficients: coeffs,
        reflection,
        prediction_error: error.max(0.0),
    })
}

/// Prediction residual `e[n] = Σ a_k x[n-k]`, samples before the frame are zero
pub fn residual(samples: &[f64], coefficients: &[f64]) -> Vec<f64> {
    let mut residuals = Vec::with_capacity(samples.len());

    for i in 0..samples.len() {
        let mut acc = 0.0;
        for (k, &a) in coefficients.iter().enumerate() {
            if i >= k {
                acc += a * samples[i - k];
            }
        }
        residuals.push(acc);
    }

    residuals
}
