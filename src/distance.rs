//! Cosine distance between sentence embeddings.
//!
//! Embedding magnitude carries no meaning for sentence encoders, so only
//! direction is compared. Sums run in `f64` and the result is clamped to
//! the mathematical range `[0, 2]`.

/// Distance reported when either vector has zero norm.
pub const UNDEFINED_DISTANCE: f32 = 1.0;

/// Compute `1 - (a · b) / (‖a‖ ‖b‖)`.
///
/// Identical non-zero vectors yield exactly `0.0`. If either vector is all
/// zeros the direction is undefined and [`UNDEFINED_DISTANCE`] is returned.
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return UNDEFINED_DISTANCE;
    }

    // sqrt(n * n) == n exactly, which keeps self-distance at zero.
    let similarity = dot / (norm_a * norm_b).sqrt();
    (1.0 - similarity).clamp(0.0, 2.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = [0.3, -1.7, 2.25, 0.0001];
        assert_eq!(cosine_distance(&v, &v), 0.0);
    }

    #[test]
    fn scaled_vectors_have_zero_distance() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 4.0, 6.0];
        assert!(cosine_distance(&a, &b) < 1e-6);
    }

    #[test]
    fn orthogonal_vectors() {
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors() {
        assert!((cosine_distance(&[1.0, 2.0], &[-1.0, -2.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_undefined() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), UNDEFINED_DISTANCE);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[0.0, 0.0]), UNDEFINED_DISTANCE);
    }

    mod props {
        use proptest::prelude::*;

        use super::super::cosine_distance;

        fn vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
            prop::collection::vec(-100.0f32..100.0, dim)
        }

        proptest! {
            #[test]
            fn distance_is_within_range(a in vector(8), b in vector(8)) {
                let d = cosine_distance(&a, &b);
                prop_assert!((0.0..=2.0).contains(&d));
            }

            #[test]
            fn distance_is_symmetric(a in vector(8), b in vector(8)) {
                prop_assert_eq!(cosine_distance(&a, &b), cosine_distance(&b, &a));
            }

            #[test]
            fn self_distance_is_zero(a in vector(8)) {
                prop_assume!(a.iter().any(|&x| x != 0.0));
                prop_assert_eq!(cosine_distance(&a, &a), 0.0);
            }
        }
    }
}
