//! Constant-Q spectral analysis on top of a radix-2 FFT

pub mod fourier;
pub mod kernel;
pub mod constq;
pub mod error;

pub use fourier::Direction;
pub use kernel::{ConstQConfig, Kernel, KernelTable};
pub use constq::{ConstQ, KernelState};
pub use error::ConstQError;
