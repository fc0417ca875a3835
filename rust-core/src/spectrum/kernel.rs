//! Sparse constant-Q kernel bank
//!
//! Each band is a Hamming-windowed complex exponential whose length shrinks
//! with rising centre frequency (constant Q). The kernels are transformed
//! once into the frequency domain and truncated to the contiguous run of
//! bins whose magnitude exceeds a fixed threshold, so convolving a frame
//! costs the sum of the run lengths rather than bands × FFT size.

use std::f64::consts::PI;

use num_complex::Complex32;

use super::error::ConstQError;
use super::fourier::{complex_transform, Direction};
use crate::filters::weighting::dba_weight;
use crate::filters::windows::{create_full_window, WindowType};
use crate::math::{log2, next_power_of_two};

/// Squared magnitude threshold numerator for Hamming kernels: (0.0054 * 3)^2.
/// Lowering it adds spectral noise rather than precision.
const THRESH_SQR: f32 = 2.6244e-4;

/// Constant-Q analyser configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ConstQConfig {
    /// Lowest band centre frequency in Hz
    pub min_freq: f32,

    /// Upper frequency bound in Hz (clamped to Nyquist when building)
    pub max_freq: f32,

    /// Desired time resolution in milliseconds, for callers that derive a
    /// hop size; the kernel bank does not depend on it
    pub max_time_res: f32,

    /// Number of bands per octave
    pub bands_per_octave: u32,

    /// Upper bound for the FFT size (power of two)
    pub max_fft_size: usize,

    /// Sample rate in Hz
    pub sample_rate: f64,
}

impl Default for ConstQConfig {
    fn default() -> Self {
        // Moderate defaults: 55 Hz, 8 ms spacing, 4096 FFT
        Self {
            min_freq: 55.0,
            max_freq: 20000.0,
            max_time_res: 8.0,
            bands_per_octave: 24,
            max_fft_size: 4096,
            sample_rate: 44100.0,
        }
    }
}

/// Number of bands covering `min_freq..max_freq`
pub fn num_kernels(bands_per_octave: u32, max_freq: f32, min_freq: f32) -> usize {
    (bands_per_octave as f64 * log2((max_freq / min_freq) as f64)).ceil() as usize
}

/// One band's frequency-domain kernel
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    offset: usize,
    data: Vec<f32>,
    frequency: f32,
}

impl Kernel {
    /// Index into an interleaved spectrum where the run starts (always even)
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Interleaved re/im values of the retained run
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Centre frequency in Hz
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Number of retained complex bins
    pub fn num_bins(&self) -> usize {
        self.data.len() >> 1
    }

    /// Complex multiply-accumulate of the kernel against the matching run of
    /// `spectrum`
    ///
    /// The kernel is stored unconjugated, so this is a plain product sum,
    /// Σ X[k]·K[k], not the textbook Σ X[k]·K*[k].
    fn accumulate(&self, spectrum: &[f32]) -> Complex32 {
        let run = &spectrum[self.offset..self.offset + self.data.len()];
        run.chunks_exact(2)
            .zip(self.data.chunks_exact(2))
            .fold(Complex32::new(0.0, 0.0), |acc, (x, k)| {
                acc + Complex32::new(x[0], x[1]) * Complex32::new(k[0], k[1])
            })
    }
}

/// Immutable kernel bank derived from a [`ConstQConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct KernelTable {
    config: ConstQConfig,
    max_freq: f32,
    fft_size: usize,
    kernels: Vec<Kernel>,
}

impl KernelTable {
    /// Build the kernel bank for `config`
    ///
    /// # Errors
    /// Rejects non-positive sample rates, bands per octave or minimum
    /// frequencies, FFT size bounds that are not powers of two, and minimum
    /// frequencies at or above the effective maximum.
    pub fn build(config: &ConstQConfig) -> Result<Self, ConstQError> {
        let fs = config.sample_rate;
        if !(fs.is_finite() && fs > 0.0) {
            return Err(ConstQError::InvalidSampleRate(fs));
        }
        if config.bands_per_octave == 0 {
            return Err(ConstQError::InvalidBandsPerOctave(config.bands_per_octave));
        }
        if config.max_fft_size < 2 || !config.max_fft_size.is_power_of_two() {
            return Err(ConstQError::InvalidMaxFftSize(config.max_fft_size));
        }

        let min_freq = config.min_freq;
        let max_freq = (config.max_freq as f64).min(fs / 2.0) as f32;
        if !(min_freq.is_finite()
            && min_freq > 0.0
            && max_freq.is_finite()
            && min_freq < max_freq)
        {
            return Err(ConstQError::InvalidFrequencyRange {
                min: min_freq,
                max: max_freq,
            });
        }

        let bands_per_octave = config.bands_per_octave;
        let bpo = bands_per_octave as f64;
        let q = (1.0 / (2f64.powf(1.0 / bpo) - 1.0)) as f32;
        let num_kernels = num_kernels(bands_per_octave, max_freq, min_freq);
        let max_kernel_len = q as f64 * fs / min_freq as f64;
        // Very low minimum frequencies make the ideal length astronomically
        // large, so the bound is applied before rounding
        let fft_size = if max_kernel_len >= config.max_fft_size as f64 {
            config.max_fft_size
        } else {
            next_power_of_two(max_kernel_len.ceil() as usize)
        };
        let thresh_sqr = THRESH_SQR / (fft_size * fft_size) as f32;

        log::debug!(
            "Building {} constant-Q kernels: Q = {:.3}, max kernel length = {:.1}, FFT size = {}",
            num_kernels,
            q,
            max_kernel_len,
            fft_size
        );

        let mut buf = vec![0.0f32; fft_size << 1];
        let kernels = (0..num_kernels)
            .map(|k| {
                let theor_len = max_kernel_len * 2f64.powf(-(k as f64) / bpo) as f32 as f64;
                let kernel_len = fft_size.min(theor_len.ceil() as usize);
                let exponent = k as f32 / bands_per_octave as f32;
                let frequency = min_freq as f64 * 2f64.powf(exponent as f64);

                // Empirical weight: keeps decimated power of pink noise
                // roughly flat across bands, also when the kernel is
                // truncated to fft_size
                let weight = 6.0 / ((theor_len + kernel_len as f64) * fft_size as f64);

                fill_temporal_kernel(&mut buf, fft_size, kernel_len, frequency, fs, weight);
                complex_transform(&mut buf, fft_size, Direction::Forward);
                let (spec_start, spec_stop) = significant_run(&buf, fft_size, thresh_sqr);

                log::trace!(
                    "Kernel {}: {:.2} Hz, length {}, bins {}..{}",
                    k,
                    frequency,
                    kernel_len,
                    spec_start >> 1,
                    spec_stop >> 1
                );
                if spec_start == spec_stop {
                    log::warn!("Kernel {} at {:.2} Hz has no bins above threshold", k, frequency);
                }

                Kernel {
                    offset: spec_start,
                    data: buf[spec_start..spec_stop].to_vec(),
                    frequency: frequency as f32,
                }
            })
            .collect();

        Ok(Self {
            config: config.clone(),
            max_freq,
            fft_size,
            kernels,
        })
    }

    /// Configuration this table was built from
    pub fn config(&self) -> &ConstQConfig {
        &self.config
    }

    /// Upper frequency bound after clamping to Nyquist
    pub fn max_freq(&self) -> f32 {
        self.max_freq
    }

    /// FFT size the kernels were designed for
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bands
    pub fn num_kernels(&self) -> usize {
        self.kernels.len()
    }

    /// Kernels in ascending frequency order
    pub fn kernels(&self) -> &[Kernel] {
        &self.kernels
    }

    /// Centre frequency of band `index` in Hz
    pub fn frequency(&self, index: usize) -> Result<f32, ConstQError> {
        self.kernels
            .get(index)
            .map(Kernel::frequency)
            .ok_or(ConstQError::BandOutOfRange {
                index,
                count: self.kernels.len(),
            })
    }

    /// dB(A) weight of every band, in band order
    pub fn dba_weights(&self) -> Vec<f32> {
        self.kernels.iter().map(|k| dba_weight(k.frequency())).collect()
    }

    /// Convolve a packed real-FFT spectrum against every kernel
    ///
    /// Writes one squared magnitude per band, ascending in frequency, to
    /// `output[out_off..out_off + num_kernels]`. The square root is left to
    /// the caller so power can be accumulated across frames first.
    ///
    /// # Arguments
    /// * `spectrum` - Output of a forward real transform of `fft_size`
    ///   samples (`fft_size + 2` values)
    /// * `output` - Destination buffer
    /// * `out_off` - Index of the first band's value in `output`
    pub fn convolve(
        &self,
        spectrum: &[f32],
        output: &mut [f32],
        out_off: usize,
    ) -> Result<(), ConstQError> {
        let needed = self.fft_size + 2;
        if spectrum.len() < needed {
            return Err(ConstQError::SpectrumTooShort {
                needed,
                available: spectrum.len(),
            });
        }
        let available = output.len();
        let needed = out_off.checked_add(self.kernels.len());
        let out = needed
            .and_then(|end| output.get_mut(out_off..end))
            .ok_or(ConstQError::OutputTooShort {
                needed: needed.unwrap_or(usize::MAX),
                available,
            })?;

        for (value, kernel) in out.iter_mut().zip(self.kernels.iter()) {
            *value = kernel.accumulate(spectrum).norm_sqr();
        }

        Ok(())
    }
}

/// Write one band's windowed complex exponential into `buf` (zeroed first),
/// centred on complex index 0 with wrap-around
///
/// Sample i goes to complex index (fft_size - even_len/2 + i) mod fft_size.
/// The kernel is neither conjugated nor time reversed.
fn fill_temporal_kernel(
    buf: &mut [f32],
    fft_size: usize,
    kernel_len: usize,
    frequency: f64,
    fs: f64,
    weight: f64,
) {
    let even_len = kernel_len & !1;
    let start = fft_size - (even_len >> 1);
    let omega = frequency * -2.0 * PI / fs;
    let window = create_full_window(kernel_len, WindowType::Hamming);

    buf.fill(0.0);
    for (i, &w) in window.iter().enumerate() {
        let pos = ((start + i) % fft_size) << 1;
        let phase = omega * i as f64;
        let amp = w as f64 * weight;
        buf[pos] = (amp * phase.cos()) as f32;
        buf[pos + 1] = (amp * phase.sin()) as f32;
    }
}

/// Locate the first contiguous run of bins, scanning 0..=fft_size/2, whose
/// squared magnitude exceeds `thresh_sqr`. Returns physical `[start, stop)`.
fn significant_run(buf: &[f32], fft_size: usize, thresh_sqr: f32) -> (usize, usize) {
    let mag_sqr = |i: usize| buf[i] * buf[i] + buf[i + 1] * buf[i + 1];

    let mut start = 0;
    while start <= fft_size && mag_sqr(start) <= thresh_sqr {
        start += 2;
    }
    let mut stop = start;
    while stop <= fft_size && mag_sqr(stop) > thresh_sqr {
        stop += 2;
    }

    (start, stop)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_table() -> KernelTable {
        KernelTable::build(&ConstQConfig::default()).unwrap()
    }

    #[test]
    fn test_num_kernels() {
        assert_eq!(num_kernels(24, 20000.0, 55.0), 205);
        assert_eq!(num_kernels(12, 1000.0, 55.0), 51);
        assert_eq!(num_kernels(1, 110.0, 55.0), 1);
    }

    #[test]
    fn test_default_table_shape() {
        let table = default_table();
        let fft_size = table.fft_size();

        assert_eq!(table.num_kernels(), 205);
        assert!(fft_size.is_power_of_two());
        assert!(fft_size <= 4096);
        // The lowest band wants ~27k samples, so the bound is hit
        assert_eq!(fft_size, 4096);

        for (k, kernel) in table.kernels().iter().enumerate() {
            assert!(!kernel.data().is_empty(), "kernel {} is empty", k);
            assert_eq!(kernel.offset() % 2, 0);
            assert_eq!(kernel.data().len() % 2, 0);
            assert!(kernel.data().len() <= fft_size, "kernel {} too long", k);
            assert!(kernel.offset() + kernel.data().len() <= fft_size + 2);
        }
    }

    #[test]
    fn test_fft_size_follows_widest_kernel() {
        let config = ConstQConfig {
            min_freq: 1000.0,
            max_freq: 7000.0,
            bands_per_octave: 12,
            max_fft_size: 65536,
            sample_rate: 44100.0,
            ..ConstQConfig::default()
        };
        let table = KernelTable::build(&config).unwrap();

        // Q = 16.82, 16.82 * 44100 / 1000 = 741.9 -> 1024
        assert_eq!(table.fft_size(), 1024);
        assert_eq!(table.num_kernels(), 34);
    }

    #[test]
    fn test_tiny_min_freq_is_bounded_by_max_fft_size() {
        let config = ConstQConfig {
            min_freq: 1e-15,
            ..ConstQConfig::default()
        };
        let table = KernelTable::build(&config).unwrap();

        assert_eq!(table.fft_size(), 4096);
        assert_eq!(table.num_kernels(), num_kernels(24, 20000.0, 1e-15));
        for kernel in table.kernels() {
            assert!(kernel.offset() + kernel.data().len() <= 4096 + 2);
        }
    }

    #[test]
    fn test_frequencies_are_geometric() {
        let table = default_table();
        let mut previous = 0.0f32;

        for k in 0..table.num_kernels() {
            let f = table.frequency(k).unwrap();
            let expected = 55.0 * 2f64.powf(k as f64 / 24.0);
            assert!(f > previous);
            assert!((f as f64 - expected).abs() / expected < 1e-5);
            previous = f;
        }
    }

    #[test]
    fn test_kernel_runs_track_centre_frequency() {
        let table = default_table();
        let bin_hz = 44100.0 / table.fft_size() as f32;

        for kernel in table.kernels() {
            let lo = (kernel.offset() >> 1) as f32 * bin_hz;
            let hi = ((kernel.offset() + kernel.data().len()) >> 1) as f32 * bin_hz;
            assert!(
                lo <= kernel.frequency() && kernel.frequency() <= hi,
                "{} Hz outside {}..{}",
                kernel.frequency(),
                lo,
                hi
            );
        }
    }

    #[test]
    fn test_dba_weights_per_band() {
        let table = default_table();
        let weights = table.dba_weights();

        assert_eq!(weights.len(), table.num_kernels());
        // Band 120 sits at 55 Hz * 2^5 = 1760 Hz
        assert_eq!(weights[120], dba_weight(table.frequency(120).unwrap()));
        assert!(weights[0] < 0.05);
        assert!(weights[120] > 1.0);
    }

    #[test]
    fn test_max_freq_clamped_to_nyquist() {
        let config = ConstQConfig {
            max_freq: 30000.0,
            sample_rate: 22050.0,
            ..ConstQConfig::default()
        };
        let table = KernelTable::build(&config).unwrap();

        assert_eq!(table.max_freq(), 11025.0);
        assert_eq!(table.num_kernels(), num_kernels(24, 11025.0, 55.0));
        assert_eq!(table.config().max_freq, 30000.0);
    }

    #[test]
    fn test_configuration_errors() {
        let bad_rate = ConstQConfig {
            sample_rate: 0.0,
            ..ConstQConfig::default()
        };
        assert_eq!(
            KernelTable::build(&bad_rate),
            Err(ConstQError::InvalidSampleRate(0.0))
        );

        let inverted = ConstQConfig {
            min_freq: 5000.0,
            max_freq: 1000.0,
            ..ConstQConfig::default()
        };
        assert!(matches!(
            KernelTable::build(&inverted),
            Err(ConstQError::InvalidFrequencyRange { .. })
        ));

        // Min above Nyquist once max is clamped
        let above_nyquist = ConstQConfig {
            min_freq: 12000.0,
            max_freq: 20000.0,
            sample_rate: 22050.0,
            ..ConstQConfig::default()
        };
        assert!(matches!(
            KernelTable::build(&above_nyquist),
            Err(ConstQError::InvalidFrequencyRange { .. })
        ));

        let zero_bands = ConstQConfig {
            bands_per_octave: 0,
            ..ConstQConfig::default()
        };
        assert_eq!(
            KernelTable::build(&zero_bands),
            Err(ConstQError::InvalidBandsPerOctave(0))
        );

        let odd_fft = ConstQConfig {
            max_fft_size: 3000,
            ..ConstQConfig::default()
        };
        assert_eq!(
            KernelTable::build(&odd_fft),
            Err(ConstQError::InvalidMaxFftSize(3000))
        );
    }

    #[test]
    fn test_temporal_kernel_wraps_around_zero() {
        let fft_size = 16;
        let mut buf = vec![1.0f32; fft_size << 1];
        fill_temporal_kernel(&mut buf, fft_size, 6, 0.0, 1.0, 1.0);

        // Zero frequency: real window values, centre sample at index 0
        let window = create_full_window(6, WindowType::Hamming);
        for (i, w) in window.iter().enumerate() {
            let pos = (fft_size - 3 + i) % fft_size;
            assert_eq!(buf[pos << 1], *w);
            assert_eq!(buf[(pos << 1) + 1], 0.0);
        }
        assert_eq!(buf[0], 1.0);
        for pos in 3..fft_size - 3 {
            assert_eq!(buf[pos << 1], 0.0);
        }
    }

    #[test]
    fn test_significant_run() {
        let fft_size = 8;
        let mut buf = vec![0.0f32; fft_size << 1];
        buf[4] = 1.0;
        buf[7] = -1.0;
        buf[12] = 1.0;

        assert_eq!(significant_run(&buf, fft_size, 0.5), (4, 8));
        assert_eq!(significant_run(&[0.0; 16], fft_size, 0.5), (10, 10));
    }

    #[test]
    fn test_convolve_checks_buffers() {
        let table = default_table();
        let spectrum = vec![0.0f32; table.fft_size() + 2];
        let mut output = vec![0.0f32; table.num_kernels()];

        assert!(table.convolve(&spectrum, &mut output, 0).is_ok());
        assert_eq!(
            table.convolve(&spectrum, &mut output, 1),
            Err(ConstQError::OutputTooShort {
                needed: table.num_kernels() + 1,
                available: table.num_kernels(),
            })
        );
        assert_eq!(
            table.convolve(&spectrum, &mut output, usize::MAX),
            Err(ConstQError::OutputTooShort {
                needed: usize::MAX,
                available: table.num_kernels(),
            })
        );
        assert!(matches!(
            table.convolve(&spectrum[..10], &mut output, 0),
            Err(ConstQError::SpectrumTooShort { .. })
        ));
    }
}
