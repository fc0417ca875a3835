//! Constant-Q analyser
//!
//! Owns the configuration, the derived kernel bank and the FFT scratch
//! buffer. The kernel bank only exists after [`ConstQ::create_kernels`]; any
//! configuration change drops it again.

use super::error::ConstQError;
use super::fourier::{real_transform, Direction};
use super::kernel::{ConstQConfig, Kernel, KernelTable};

/// Derived state of a [`ConstQ`]
#[derive(Debug, Clone, PartialEq)]
pub enum KernelState {
    /// Configuration changed since the last build (or never built)
    Stale,
    /// Kernel bank matches the current configuration
    Ready(KernelTable),
}

/// Constant-Q analyser
///
/// Not meant to be shared: `transform` mutates the scratch buffer in place.
/// Clone the analyser to give each worker its own buffer.
#[derive(Debug, Clone)]
pub struct ConstQ {
    config: ConstQConfig,
    state: KernelState,
    fft_buf: Vec<f32>,
}

impl Default for ConstQ {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstQ {
    /// Create an analyser with the default configuration
    pub fn new() -> Self {
        Self::with_config(ConstQConfig::default())
    }

    /// Create an analyser; call [`create_kernels`](Self::create_kernels)
    /// before transforming
    pub fn with_config(config: ConstQConfig) -> Self {
        Self {
            config,
            state: KernelState::Stale,
            fft_buf: Vec::new(),
        }
    }

    /// Get current configuration
    pub fn config(&self) -> &ConstQConfig {
        &self.config
    }

    /// Replace the whole configuration
    pub fn set_config(&mut self, config: ConstQConfig) {
        self.config = config;
        self.invalidate();
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.config.sample_rate = sample_rate;
        self.invalidate();
    }

    pub fn min_freq(&self) -> f32 {
        self.config.min_freq
    }

    pub fn set_min_freq(&mut self, min_freq: f32) {
        self.config.min_freq = min_freq;
        self.invalidate();
    }

    /// Configured upper frequency; see [`KernelTable::max_freq`] for the
    /// value after clamping to Nyquist
    pub fn max_freq(&self) -> f32 {
        self.config.max_freq
    }

    pub fn set_max_freq(&mut self, max_freq: f32) {
        self.config.max_freq = max_freq;
        self.invalidate();
    }

    pub fn max_time_res(&self) -> f32 {
        self.config.max_time_res
    }

    pub fn set_max_time_res(&mut self, max_time_res: f32) {
        self.config.max_time_res = max_time_res;
        self.invalidate();
    }

    pub fn max_fft_size(&self) -> usize {
        self.config.max_fft_size
    }

    pub fn set_max_fft_size(&mut self, max_fft_size: usize) {
        self.config.max_fft_size = max_fft_size;
        self.invalidate();
    }

    pub fn bands_per_octave(&self) -> u32 {
        self.config.bands_per_octave
    }

    pub fn set_bands_per_octave(&mut self, bands_per_octave: u32) {
        self.config.bands_per_octave = bands_per_octave;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.state = KernelState::Stale;
    }

    /// (Re)build the kernel bank and scratch buffer for the current
    /// configuration
    ///
    /// On error the analyser stays stale.
    pub fn create_kernels(&mut self) -> Result<(), ConstQError> {
        self.invalidate();
        let table = KernelTable::build(&self.config)?;
        self.fft_buf = vec![0.0; table.fft_size() << 1];
        self.state = KernelState::Ready(table);
        Ok(())
    }

    pub fn state(&self) -> &KernelState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, KernelState::Ready(_))
    }

    /// Kernel bank for the current configuration
    pub fn table(&self) -> Result<&KernelTable, ConstQError> {
        match &self.state {
            KernelState::Ready(table) => Ok(table),
            KernelState::Stale => Err(ConstQError::NotReady),
        }
    }

    pub fn num_kernels(&self) -> Result<usize, ConstQError> {
        self.table().map(KernelTable::num_kernels)
    }

    pub fn fft_size(&self) -> Result<usize, ConstQError> {
        self.table().map(KernelTable::fft_size)
    }

    pub fn kernels(&self) -> Result<&[Kernel], ConstQError> {
        self.table().map(KernelTable::kernels)
    }

    /// Centre frequency of band `index` in Hz
    pub fn frequency(&self, index: usize) -> Result<f32, ConstQError> {
        self.table()?.frequency(index)
    }

    /// dB(A) weight of every band, for perceptually weighted power
    pub fn dba_weights(&self) -> Result<Vec<f32>, ConstQError> {
        self.table().map(KernelTable::dba_weights)
    }

    /// Raw access to the scratch buffer (`2 * fft_size` values)
    ///
    /// Callers running their own forward [`real_transform`] over the first
    /// `fft_size` samples can then call [`convolve`](Self::convolve).
    pub fn fft_buffer(&mut self) -> Result<&mut [f32], ConstQError> {
        self.table()?;
        Ok(&mut self.fft_buf)
    }

    /// Convolve the spectrum currently held in the scratch buffer with every
    /// kernel, writing one squared magnitude per band to
    /// `output[out_off..out_off + num_kernels]`
    pub fn convolve(&self, output: &mut [f32], out_off: usize) -> Result<(), ConstQError> {
        self.table()?.convolve(&self.fft_buf, output, out_off)
    }

    /// Like [`convolve`](Self::convolve), returning a new vector
    pub fn convolve_to_vec(&self) -> Result<Vec<f32>, ConstQError> {
        let mut output = vec![0.0; self.num_kernels()?];
        self.convolve(&mut output, 0)?;
        Ok(output)
    }

    /// Analyse one frame of `input[in_off..in_off + in_len]`
    ///
    /// The chunk's first half (up to `fft_size / 2` samples) is packed into
    /// the upper half of the FFT buffer and the remainder wraps to the start,
    /// so the chunk's middle lines up with time zero of the kernels. Slots not
    /// covered by the chunk are zeroed; samples beyond `fft_size` are ignored.
    ///
    /// # Arguments
    /// * `input` - Sample buffer
    /// * `in_off` - First sample of the chunk
    /// * `in_len` - Number of samples in the chunk
    /// * `output` - Receives one squared magnitude per band
    /// * `out_off` - Index of the first band's value in `output`
    pub fn transform(
        &mut self,
        input: &[f32],
        in_off: usize,
        in_len: usize,
        output: &mut [f32],
        out_off: usize,
    ) -> Result<(), ConstQError> {
        let table = match &self.state {
            KernelState::Ready(table) => table,
            KernelState::Stale => return Err(ConstQError::NotReady),
        };

        let chunk = in_off
            .checked_add(in_len)
            .and_then(|end| input.get(in_off..end))
            .ok_or(ConstQError::InputOutOfRange {
                offset: in_off,
                length: in_len,
                available: input.len(),
            })?;

        let fft_size = table.fft_size();
        pack_frame(&mut self.fft_buf[..fft_size], chunk);
        real_transform(&mut self.fft_buf, fft_size, Direction::Forward);

        table.convolve(&self.fft_buf, output, out_off)
    }

    /// Like [`transform`](Self::transform) over the whole of `input`,
    /// returning a new vector
    pub fn transform_to_vec(&mut self, input: &[f32]) -> Result<Vec<f32>, ConstQError> {
        let mut output = vec![0.0; self.num_kernels()?];
        self.transform(input, 0, input.len(), &mut output, 0)?;
        Ok(output)
    }
}

/// Split-pack `chunk` into `frame` (length fft_size) around time zero
fn pack_frame(frame: &mut [f32], chunk: &[f32]) {
    let fft_size = frame.len();
    let half = fft_size >> 1;

    let head = chunk.len().min(fft_size - half);
    frame[half..half + head].copy_from_slice(&chunk[..head]);
    frame[half + head..].fill(0.0);

    let tail = (fft_size - head).min(chunk.len() - head);
    frame[..tail].copy_from_slice(&chunk[head..head + tail]);
    if tail < half {
        frame[tail..half].fill(0.0);
    }
}
