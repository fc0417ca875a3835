//! In-place radix-2 discrete Fourier transforms and complex vector helpers
//!
//! All buffers are interleaved: real part at even indices, imaginary (or
//! phase) part at odd indices. Offsets and lengths of the vector helpers are
//! physical, i.e. counted in `f32` slots (complex count << 1).
//!
//! The forward transform uses the `+1` exponent sign,
//! X[k] = Σ x[n]·e^(+2πi·kn/N). The inverse uses `-1` and normalises by 1/N.

use std::f64::consts::PI;

const PI2: f64 = PI * 2.0;

/// Transform direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Analysis
    Forward,
    /// Synthesis, normalised by 1/N
    Inverse,
}

impl Direction {
    /// Sign of the exponent
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Inverse => -1.0,
        }
    }
}

/// One-dimensional complex DFT, in place
///
/// Replaces `a[0..2*len]` by its transform.
///
/// # Arguments
/// * `a` - Interleaved complex data, at least `2 * len` values
/// * `len` - Number of complex samples, MUST be a power of two
/// * `dir` - Transform direction
pub fn complex_transform(a: &mut [f32], len: usize, dir: Direction) {
    debug_assert!(len.is_power_of_two(), "length {} is not a power of two", len);
    debug_assert!(a.len() >= len << 1);

    let n = len << 1;
    let theta = dir.sign() * PI2;

    // Bit reversal; i and j are 1-based indices of the imaginary slots
    let mut j = 1;
    let mut i = 1;
    while i < n {
        if j > i {
            a.swap(j - 1, i - 1);
            a.swap(j, i);
        }

        let mut m = len;
        while m >= 2 && j > m {
            j -= m;
            m >>= 1;
        }
        j += m;
        i += 2;
    }

    // Danielson-Lanczos, log2(len) stages
    let mut m_max = 2;
    while n > m_max {
        let i_step = m_max << 1;

        // Trigonometric recurrence in double precision
        let temp_w = (theta / i_step as f64).sin();
        let wp_re = -2.0 * temp_w * temp_w;
        let wp_im = (theta / m_max as f64).sin();
        let mut w_re = 1.0f64;
        let mut w_im = 0.0f64;

        let mut m = 1;
        while m < m_max {
            let mut i = m;
            while i <= n {
                let j = i + m_max;
                let temp_re = (w_re * a[j - 1] as f64 - w_im * a[j] as f64) as f32;
                let temp_im = (w_re * a[j] as f64 + w_im * a[j - 1] as f64) as f32;
                a[j - 1] = a[i - 1] - temp_re;
                a[j] = a[i] - temp_im;
                a[i - 1] += temp_re;
                a[i] += temp_im;
                i += i_step;
            }

            let temp_w = w_re;
            w_re += temp_w * wp_re - w_im * wp_im;
            w_im += temp_w * wp_im + w_im * wp_re;
            m += 2;
        }

        m_max = i_step;
    }

    if dir == Direction::Inverse {
        let scale = len as f32;
        for v in a[..n].iter_mut() {
            *v /= scale;
        }
    }
}

/// One-dimensional real DFT, in place
///
/// Forward: replaces the real samples `a[0..len]` by the positive-frequency
/// half of their spectrum. Bin k occupies `a[2k]` (real) and `a[2k+1]`
/// (imaginary) for k = 0..=len/2. DC and Nyquist are real; the Nyquist real
/// part lands at `a[len]` and `a[len+1]` is zeroed.
///
/// Inverse: consumes that layout and restores `len` real samples, zeroing
/// `a[len]` and `a[len+1]`.
///
/// # Arguments
/// * `a` - Buffer of at least `len + 2` values
/// * `len` - Number of real samples, MUST be a power of two
/// * `dir` - Transform direction
pub fn real_transform(a: &mut [f32], len: usize, dir: Direction) {
    debug_assert!(len.is_power_of_two() && len >= 2);
    debug_assert!(a.len() >= len + 2);

    let c_len = len >> 1;
    let sign = dir.sign();
    let theta = sign * PI / c_len as f64;
    let c1 = 0.5f32;
    let c2 = (-sign * 0.5) as f32;
    let temp_w = (theta / 2.0).sin();
    let wp_re = -2.0 * temp_w * temp_w;
    let wp_im = theta.sin();
    let mut w_re = 1.0 + wp_re;
    let mut w_im = wp_im;

    if dir == Direction::Forward {
        complex_transform(a, c_len, dir);
    }

    // Separate the two interleaved half-length spectra and recombine.
    // Bin 0 is handled after the loop.
    let mut i = 2;
    while i < c_len {
        let i2 = i + 1;
        let i3 = len - i;
        let i4 = i3 + 1;
        let h1_re = (c1 * (a[i] + a[i3])) as f64;
        let h1_im = (c1 * (a[i2] - a[i4])) as f64;
        let h2_re = (-c2 * (a[i2] + a[i4])) as f64;
        let h2_im = (c2 * (a[i] - a[i3])) as f64;
        a[i] = (h1_re + w_re * h2_re - w_im * h2_im) as f32;
        a[i2] = (h1_im + w_re * h2_im + w_im * h2_re) as f32;
        a[i3] = (h1_re - w_re * h2_re + w_im * h2_im) as f32;
        a[i4] = (-h1_im + w_re * h2_im + w_im * h2_re) as f32;

        let temp_w = w_re;
        w_re += temp_w * wp_re - w_im * wp_im;
        w_im += temp_w * wp_im + w_im * wp_re;
        i += 2;
    }

    let h1_re = a[0];
    match dir {
        Direction::Inverse => {
            a[0] = c1 * (h1_re + a[len]);
            a[1] = c1 * (h1_re - a[len]);
            a[len] = 0.0;
            a[len + 1] = 0.0;
            complex_transform(a, c_len, dir);
        }
        Direction::Forward => {
            // Squeeze DC and Nyquist into their slots
            a[0] = h1_re + a[1];
            a[len] = h1_re - a[1];
            a[1] = 0.0;
            a[len + 1] = 0.0;
        }
    }
}

#[inline]
fn rect_to_polar_pair(re: f64, im: f64) -> (f32, f32) {
    ((re * re + im * im).sqrt() as f32, im.atan2(re) as f32)
}

#[inline]
fn polar_to_rect_pair(amp: f64, phase: f64) -> (f32, f32) {
    ((amp * phase.cos()) as f32, (amp * phase.sin()) as f32)
}

#[inline]
fn mult_pair(re1: f32, im1: f32, re2: f32, im2: f32) -> (f32, f32) {
    (re1 * re2 - im1 * im2, im1 * re2 + re1 * im2)
}

/// Converts interleaved cartesian data to interleaved amplitude/phase
///
/// `length` counts physical slots (complex length << 1).
pub fn rect_to_polar(
    src: &[f32],
    src_off: usize,
    dest: &mut [f32],
    dest_off: usize,
    length: usize,
) {
    let src = &src[src_off..src_off + length];
    let dest = &mut dest[dest_off..dest_off + length];
    for (s, d) in src.chunks_exact(2).zip(dest.chunks_exact_mut(2)) {
        let (amp, phase) = rect_to_polar_pair(s[0] as f64, s[1] as f64);
        d[0] = amp;
        d[1] = phase;
    }
}

/// In-place variant of [`rect_to_polar`] where source and destination share
/// one buffer
///
/// When `dest_off > src_off` the ranges are walked backwards so no source
/// value is overwritten before it has been read.
pub fn rect_to_polar_in_place(buf: &mut [f32], src_off: usize, dest_off: usize, length: usize) {
    map_pairs_in_place(buf, src_off, dest_off, length, |re, im| {
        rect_to_polar_pair(re as f64, im as f64)
    });
}

/// Converts interleaved amplitude/phase data to interleaved cartesian data
///
/// `length` counts physical slots (complex length << 1).
pub fn polar_to_rect(
    src: &[f32],
    src_off: usize,
    dest: &mut [f32],
    dest_off: usize,
    length: usize,
) {
    let src = &src[src_off..src_off + length];
    let dest = &mut dest[dest_off..dest_off + length];
    for (s, d) in src.chunks_exact(2).zip(dest.chunks_exact_mut(2)) {
        let (re, im) = polar_to_rect_pair(s[0] as f64, s[1] as f64);
        d[0] = re;
        d[1] = im;
    }
}

/// In-place variant of [`polar_to_rect`]; see [`rect_to_polar_in_place`]
pub fn polar_to_rect_in_place(buf: &mut [f32], src_off: usize, dest_off: usize, length: usize) {
    map_pairs_in_place(buf, src_off, dest_off, length, |amp, phase| {
        polar_to_rect_pair(amp as f64, phase as f64)
    });
}

fn map_pairs_in_place<F>(buf: &mut [f32], src_off: usize, dest_off: usize, length: usize, f: F)
where
    F: Fn(f32, f32) -> (f32, f32),
{
    let pairs = length >> 1;
    let mut apply = |p: usize| {
        let s = src_off + (p << 1);
        let d = dest_off + (p << 1);
        let (x, y) = f(buf[s], buf[s + 1]);
        buf[d] = x;
        buf[d + 1] = y;
    };

    if src_off < dest_off {
        (0..pairs).rev().for_each(&mut apply);
    } else {
        (0..pairs).for_each(&mut apply);
    }
}

/// Multiplies two interleaved complex vectors into `dest`
///
/// `length` counts physical slots (complex length << 1).
pub fn complex_mult(
    src1: &[f32],
    src_off1: usize,
    src2: &[f32],
    src_off2: usize,
    dest: &mut [f32],
    dest_off: usize,
    length: usize,
) {
    let a = &src1[src_off1..src_off1 + length];
    let b = &src2[src_off2..src_off2 + length];
    let dest = &mut dest[dest_off..dest_off + length];
    for ((x, y), d) in a
        .chunks_exact(2)
        .zip(b.chunks_exact(2))
        .zip(dest.chunks_exact_mut(2))
    {
        let (re, im) = mult_pair(x[0], x[1], y[0], y[1]);
        d[0] = re;
        d[1] = im;
    }
}

/// Multiplies the vector at `src_off` of `buf` by `other`, writing the
/// product back into `buf` at `dest_off`
///
/// Walks backwards when `dest_off > src_off`.
pub fn complex_mult_in_place(
    buf: &mut [f32],
    src_off: usize,
    other: &[f32],
    other_off: usize,
    dest_off: usize,
    length: usize,
) {
    let pairs = length >> 1;
    let mut apply = |p: usize| {
        let s = src_off + (p << 1);
        let o = other_off + (p << 1);
        let d = dest_off + (p << 1);
        let (re, im) = mult_pair(buf[s], buf[s + 1], other[o], other[o + 1]);
        buf[d] = re;
        buf[d + 1] = im;
    };

    if src_off < dest_off {
        (0..pairs).rev().for_each(&mut apply);
    } else {
        (0..pairs).for_each(&mut apply);
    }
}

/// Running fold state of a phase unwrap. Each raw phase is compared with the
/// previous raw phase, so the scan is strictly sequential.
struct Unwrapper {
    prev: f64,
    folds: i64,
}

impl Unwrapper {
    fn new() -> Self {
        Self { prev: 0.0, folds: 0 }
    }

    fn next(&mut self, phase: f64) -> f32 {
        if phase - self.prev > PI {
            self.folds -= 1;
        } else if self.prev - phase > PI {
            self.folds += 1;
        }
        self.prev = phase;
        (phase + self.folds as f64 * PI2) as f32
    }
}

/// Folds a phase into (-π, π]
///
/// The fold count is computed directly, so the cost does not grow with the
/// magnitude of the phase. Non-finite phases are returned unchanged.
fn wrap_phase(phase: f64) -> f32 {
    if !phase.is_finite() {
        return phase as f32;
    }
    let mut wrapped = phase - ((phase - PI) / PI2).ceil() * PI2;
    // Rounding can leave the result one step outside the interval
    if wrapped > PI {
        wrapped -= PI2;
    } else if wrapped <= -PI {
        wrapped += PI2;
    }
    wrapped as f32
}

/// Unwraps 2π-clipped phases of interleaved amplitude/phase data
///
/// Amplitudes are copied through unchanged.
pub fn unwrap_phases(
    src: &[f32],
    src_off: usize,
    dest: &mut [f32],
    dest_off: usize,
    length: usize,
) {
    let mut state = Unwrapper::new();
    let src = &src[src_off..src_off + length];
    let dest = &mut dest[dest_off..dest_off + length];
    for (s, d) in src.chunks_exact(2).zip(dest.chunks_exact_mut(2)) {
        d[0] = s[0];
        d[1] = state.next(s[1] as f64);
    }
}

/// In-place variant of [`unwrap_phases`]
pub fn unwrap_phases_in_place(buf: &mut [f32], off: usize, length: usize) {
    let mut state = Unwrapper::new();
    for pair in buf[off..off + length].chunks_exact_mut(2) {
        pair[1] = state.next(pair[1] as f64);
    }
}

/// Wraps the phases of interleaved amplitude/phase data into (-π, π]
///
/// Amplitudes are copied through unchanged.
pub fn wrap_phases(src: &[f32], src_off: usize, dest: &mut [f32], dest_off: usize, length: usize) {
    let src = &src[src_off..src_off + length];
    let dest = &mut dest[dest_off..dest_off + length];
    for (s, d) in src.chunks_exact(2).zip(dest.chunks_exact_mut(2)) {
        d[0] = s[0];
        d[1] = wrap_phase(s[1] as f64);
    }
}

/// In-place variant of [`wrap_phases`]
pub fn wrap_phases_in_place(buf: &mut [f32], off: usize, length: usize) {
    for pair in buf[off..off + length].chunks_exact_mut(2) {
        pair[1] = wrap_phase(pair[1] as f64);
    }
}
