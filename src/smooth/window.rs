//! Smoothing-window definitions.
//!
//! The tapers follow the usual symmetric definitions evaluated over
//! `k = 0..M`:
//!   • hanning  `0.5  − 0.5·cos(2πk/(M−1))`
//!   • hamming  `0.54 − 0.46·cos(2πk/(M−1))`
//!   • bartlett `1 − |2k/(M−1) − 1|`
//!   • blackman `0.42 − 0.5·cos(2πk/(M−1)) + 0.08·cos(4πk/(M−1))`
//!
//! `Flat` is a box window and turns the smoother into a moving average.
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The closed set of kernels accepted by [`smooth`](super::smooth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Flat,
    Hanning,
    Hamming,
    Bartlett,
    Blackman,
}

impl Window {
    pub const ALL: [Window; 5] = [
        Window::Flat,
        Window::Hanning,
        Window::Hamming,
        Window::Bartlett,
        Window::Blackman,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Window::Flat => "flat",
            Window::Hanning => "hanning",
            Window::Hamming => "hamming",
            Window::Bartlett => "bartlett",
            Window::Blackman => "blackman",
        }
    }

    /// Window coefficients of length `m` (not normalised).
    pub fn coefficients(self, m: usize) -> Vec<f64> {
        match self {
            Window::Flat => vec![1.0; m],
            Window::Hanning => hanning(m),
            Window::Hamming => hamming(m),
            Window::Bartlett => bartlett(m),
            Window::Blackman => blackman(m),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Window {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Window::ALL
            .into_iter()
            .find(|w| w.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Window::ALL.iter().map(|w| w.name()).collect();
                Error::InvalidArgument(format!(
                    "unknown window '{s}', expected one of {}",
                    names.join(", ")
                ))
            })
    }
}

/// Evaluate a cosine-sum taper; a single tap is always `1`.
fn cosine_taper(m: usize, f: impl Fn(f64) -> f64) -> Vec<f64> {
    if m == 1 {
        return vec![1.0];
    }
    let denom = (m - 1) as f64;
    (0..m).map(|k| f(k as f64 / denom)).collect()
}

/// Hann window of length `m`.
pub fn hanning(m: usize) -> Vec<f64> {
    cosine_taper(m, |t| 0.5 - 0.5 * (2.0 * PI * t).cos())
}

/// Hamming window of length `m`.
pub fn hamming(m: usize) -> Vec<f64> {
    cosine_taper(m, |t| 0.54 - 0.46 * (2.0 * PI * t).cos())
}

/// Triangular window with zero end points.
pub fn bartlett(m: usize) -> Vec<f64> {
    cosine_taper(m, |t| 1.0 - (2.0 * t - 1.0).abs())
}

/// Blackman window of length `m`.
pub fn blackman(m: usize) -> Vec<f64> {
    cosine_taper(m, |t| {
        0.42 - 0.5 * (2.0 * PI * t).cos() + 0.08 * (4.0 * PI * t).cos()
    })
}
