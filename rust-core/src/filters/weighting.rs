//! Perceptual dB(A) weighting
//!
//! Linear power weights sampled on the third-octave grid from 1 Hz to
//! 31.5 kHz (one entry per dB of frequency, i.e. `10 * log10(f)`), and
//! interpolated linearly between neighbouring entries.

/// Weights at 10^(i/10) Hz, normalised to 1.0 at 1 kHz
const DBA_WEIGHTS: [f32; 46] = [
    // 1 Hz      1.25       1.6        2          2.5        3.15
    0.0, 1.000e-7, 2.512e-7, 6.310e-7, 1.567e-6, 3.890e-6,
    // 4         5          6.3        8          10         12.5
    9.661e-6, 2.371e-5, 5.370e-5, 1.365e-4, 3.162e-4, 7.161e-4,
    // 16        20         25         31.5       40         50
    1.531e-3, 3.126e-3, 6.026e-3, 1.096e-2, 1.905e-2, 3.090e-2,
    // 63        80         100        125        160        200
    4.955e-2, 7.586e-2, 1.109e-1, 1.585e-1, 2.163e-1, 2.884e-1,
    // 250       315        400        500        630        800
    3.715e-1, 4.677e-1, 5.754e-1, 6.918e-1, 8.035e-1, 9.120e-1,
    // 1k        1.25k      1.6k       2k         2.5k       3.15k
    1.0, 1.072, 1.122, 1.148, 1.161, 1.148,
    // 4k        5k         6.3k       8k         10k        12.5k
    1.122, 1.059, 9.886e-1, 8.810e-1, 7.499e-1, 6.095e-1,
    // 16k       20k        25k        31.5k
    4.677e-1, 3.428e-1, 2.399e-1, 0.0,
];

/// Highest frequency covered by the table (10^4.5 Hz, rounded down)
const MAX_FREQ: f32 = 31622.7;

/// dB(A) power weight for a frequency in Hz
///
/// Frequencies below 1 Hz or above ~31.6 kHz get the edge weight of 0.
pub fn dba_weight(freq: f32) -> f32 {
    if freq.is_nan() || freq < 1.0 {
        return DBA_WEIGHTS[0];
    }
    if freq > MAX_FREQ {
        return DBA_WEIGHTS[DBA_WEIGHTS.len() - 1];
    }

    let pos = 10.0 * (freq as f64).log10();
    let index = (pos as usize).min(DBA_WEIGHTS.len() - 2);
    let frac = (pos - index as f64) as f32;
    DBA_WEIGHTS[index] * (1.0 - frac) + DBA_WEIGHTS[index + 1] * frac
}

/// dB(A) weights for a list of band centre frequencies
pub fn dba_weights(freqs: &[f32]) -> Vec<f32> {
    freqs.iter().map(|&f| dba_weight(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_frequency_is_unity() {
        assert!((dba_weight(1000.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_interpolates_between_grid_points() {
        // 20 Hz lies just above the 19.95 Hz grid point
        assert!((dba_weight(20.0) - 3.1559e-3).abs() < 1e-6);
        assert!((dba_weight(440.0) - 0.62598).abs() < 1e-4);

        let w = dba_weight(1100.0);
        assert!(w > 1.0 && w < 1.072);
        assert!((w - 1.0298).abs() < 1e-3);
    }

    #[test]
    fn test_out_of_range_frequencies() {
        assert_eq!(dba_weight(0.5), 0.0);
        assert_eq!(dba_weight(0.0), 0.0);
        assert_eq!(dba_weight(-10.0), 0.0);
        assert_eq!(dba_weight(f32::NAN), 0.0);
        assert_eq!(dba_weight(40000.0), 0.0);
        assert!(dba_weight(MAX_FREQ) < 1e-4);
    }

    #[test]
    fn test_weights_follow_input_order() {
        let freqs = [1000.0, 20.0, 2500.0];
        let weights = dba_weights(&freqs);

        assert_eq!(weights.len(), 3);
        assert_eq!(weights[0], dba_weight(1000.0));
        assert!(weights[1] < weights[0]);
        assert!(weights[2] > weights[0]);
    }
}
