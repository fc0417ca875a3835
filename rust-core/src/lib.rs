//! Constant-Q transform core
//!
//! Logarithmically spaced spectral analysis from a bank of sparse
//! frequency-domain kernels, driven by an in-place radix-2 FFT.

pub mod filters;
pub mod math;
pub mod spectrum;

pub use filters::{WindowType, create_full_window, dba_weight, dba_weights};
pub use spectrum::{ConstQ, ConstQConfig, ConstQError, KernelTable};
