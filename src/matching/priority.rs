// src/matching/priority.rs

pub const RELEVANCE_WEIGHT: f64 = 0.5;
pub const ENGAGEMENT_WEIGHT: f64 = 0.3;
pub const GEOGRAPHIC_WEIGHT: f64 = 0.2;

/// Engagement quality is not computed yet; every entity gets this constant.
pub const ENGAGEMENT_QUALITY_PLACEHOLDER: f64 = 75.0;
/// Geographic fit is not computed yet; every entity gets this constant.
pub const GEOGRAPHIC_FIT_PLACEHOLDER: f64 = 70.0;

/// `0.5 * relevance + 0.3 * 75 + 0.2 * 70`, with relevance clamped to [0, 100]
/// so the result always stays inside [36.5, 86.5].
pub fn calculate_priority_score(relevance_score: f64) -> f64 {
    let relevance = if relevance_score.is_finite() {
        relevance_score.clamp(0.0, 100.0)
    } else {
        0.0
    };
    RELEVANCE_WEIGHT * relevance
        + ENGAGEMENT_WEIGHT * ENGAGEMENT_QUALITY_PLACEHOLDER
        + GEOGRAPHIC_WEIGHT * GEOGRAPHIC_FIT_PLACEHOLDER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_formula_exact() {
        assert_eq!(calculate_priority_score(80.0), 76.5);
        assert_eq!(calculate_priority_score(70.0), 71.5);
    }

    #[test]
    fn test_priority_bounds() {
        assert_eq!(calculate_priority_score(0.0), 36.5);
        assert_eq!(calculate_priority_score(100.0), 86.5);
        assert_eq!(calculate_priority_score(250.0), 86.5);
        assert_eq!(calculate_priority_score(f64::NAN), 36.5);
    }
}
