//! Error type for constant-Q analysis

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstQError {
    #[error("Sample rate must be positive and finite (found: {0} Hz)")]
    InvalidSampleRate(f64),

    #[error("Invalid frequency range: minimum {min} Hz must be positive and below the effective maximum {max} Hz")]
    InvalidFrequencyRange { min: f32, max: f32 },

    #[error("Bands per octave must be at least 1 (found: {0})")]
    InvalidBandsPerOctave(u32),

    #[error("Maximum FFT size must be a power of two of at least 2 (found: {0})")]
    InvalidMaxFftSize(usize),

    #[error("Kernels have not been created for the current configuration")]
    NotReady,

    #[error("Band index {index} out of range ({count} bands)")]
    BandOutOfRange { index: usize, count: usize },

    #[error("Input range {offset}+{length} exceeds input of {available} samples")]
    InputOutOfRange {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("Output needs {needed} values but only {available} are available")]
    OutputTooShort { needed: usize, available: usize },

    #[error("Spectrum needs {needed} values but only {available} are available")]
    SpectrumTooShort { needed: usize, available: usize },
}
