//! Scalar transforms from raw spectrum bins to control values.
//!
//! None of these clamp: values outside the input range extrapolate, and a
//! zero-width input range yields an infinite or NaN result.

/// Linear position of `value` inside `[lo, hi]` (0 at `lo`, 1 at `hi`)
pub fn fractionate(value: f32, lo: f32, hi: f32) -> f32 {
    (value - lo) / (hi - lo)
}

/// Remap `value` from `[lo, hi]` onto `[out_lo, out_hi]`
pub fn modulate(value: f32, lo: f32, hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let fr = fractionate(value, lo, hi);
    out_lo + fr * (out_hi - out_lo)
}

/// Arithmetic mean, or `None` for an empty slice
pub fn avg<T: Copy + Into<f32>>(samples: &[T]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    let total: f32 = samples.iter().map(|&s| s.into()).sum();
    Some(total / samples.len() as f32)
}

/// Largest sample, or `None` for an empty slice
pub fn max<T: Copy + Into<f32>>(samples: &[T]) -> Option<f32> {
    samples.iter().map(|&s| s.into()).reduce(f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractionate_endpoints() {
        for (lo, hi) in [(0.0, 1.0), (-3.0, 5.0), (10.0, 2.0), (0.25, 0.5)] {
            assert_eq!(fractionate(lo, lo, hi), 0.0);
            assert_eq!(fractionate(hi, lo, hi), 1.0);
        }
    }

    #[test]
    fn test_fractionate_extrapolates() {
        assert_eq!(fractionate(2.0, 0.0, 1.0), 2.0);
        assert_eq!(fractionate(-1.0, 0.0, 1.0), -1.0);
    }

    #[test]
    fn test_fractionate_zero_width_range() {
        assert!(fractionate(1.0, 0.5, 0.5).is_infinite());
        assert!(fractionate(0.5, 0.5, 0.5).is_nan());
    }

    #[test]
    fn test_modulate_is_affine() {
        let (a, b, c, d) = (0.0, 1.0, 0.5, 2.0);
        assert_eq!(modulate(a, a, b, c, d), c);
        assert_eq!(modulate(b, a, b, c, d), d);
        assert!((modulate(0.5, a, b, c, d) - 1.25).abs() < 1e-6);

        let (a, b, c, d) = (-4.0, 4.0, 10.0, -10.0);
        assert_eq!(modulate(a, a, b, c, d), c);
        assert_eq!(modulate(b, a, b, c, d), d);
    }

    #[test]
    fn test_modulate_unclamped_output() {
        // 1.5 of the way through 0..8 is 12
        assert_eq!(modulate(1.5, 0.0, 1.0, 0.0, 8.0), 12.0);
    }

    #[test]
    fn test_avg_and_max() {
        assert_eq!(avg(&[10u8, 20, 30]), Some(20.0));
        assert_eq!(max(&[10u8, 20, 30]), Some(30.0));
        assert_eq!(avg(&[1.5f32, 2.5]), Some(2.0));
        assert_eq!(max(&[-1.0f32, -0.5]), Some(-0.5));
    }

    #[test]
    fn test_empty_input_is_none() {
        let empty: [u8; 0] = [];
        assert_eq!(avg(&empty), None);
        assert_eq!(max(&empty), None);
    }
}
