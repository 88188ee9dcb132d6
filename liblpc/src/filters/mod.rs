//! IIR filter design

pub mod biquad;

pub use biquad::{design, BandPassGain, Biquad, FilterKind};
