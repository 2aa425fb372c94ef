//! FIR smoothing of 1-D signals and of 2-D arrays column by column.
//!
//! - [`window`]: the closed set of smoothing windows.
//! - [`apply`]: reflect padding and FFT convolution.

pub mod apply;
pub mod window;

pub use apply::{smooth, smooth_array};
pub use window::{bartlett, blackman, hamming, hanning, Window};
