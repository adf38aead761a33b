//! Inverse-square distance weighting.

/// Distances below this (km) are clamped before squaring
pub const MIN_DISTANCE_KM: f64 = 0.1;

/// Normalised weights proportional to `1 / max(d, 0.1)²`.
///
/// An empty input yields an empty weighting; callers decide where that
/// volume goes instead.
pub fn inverse_square_weights(distances_km: &[f64]) -> Vec<f64> {
    let raw: Vec<f64> = distances_km
        .iter()
        .map(|d| {
            let d = d.max(MIN_DISTANCE_KM);
            1.0 / (d * d)
        })
        .collect();

    let total: f64 = raw.iter().sum();
    if total > 0.0 {
        raw.into_iter().map(|w| w / total).collect()
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(inverse_square_weights(&[]).is_empty());
    }

    #[test]
    fn test_normalised() {
        let w = inverse_square_weights(&[0.3, 0.7, 1.4, 2.9]);
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_square_ratio() {
        let w = inverse_square_weights(&[1.0, 2.0]);
        assert!((w[0] / w[1] - 4.0).abs() < 1e-12);
        assert!((w[0] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_floor_distance() {
        // 0.0 and 0.05 both clamp to 0.1 and weigh the same
        let w = inverse_square_weights(&[0.0, 0.05, 0.1]);
        assert!((w[0] - w[1]).abs() < 1e-12);
        assert!((w[1] - w[2]).abs() < 1e-12);
        assert!(w.iter().all(|x| x.is_finite()));
    }
}
