/// Score returned for a skill with no recorded confidence.
pub const UNKNOWN_SKILL_SCORE: f64 = 0.5;

const PEAK_MASTERY: f64 = 0.55;
const CONFIDENCE_HORIZON: f64 = 20.0;
const DISTANCE_WEIGHT: f64 = 0.7;
const CONFIDENCE_WEIGHT: f64 = 0.3;

/// "Edge of learning" value of practising a skill, in `[0, 1]`.
///
/// Peaks at mastery 0.55 and falls off linearly to 0 at mastery 0 and 1.1.
/// Skills backed by fewer than 20 pseudo-observations get a bonus that fades
/// as confidence grows, so novelty breaks near-ties.
pub fn edge_of_learning_score(mastery_probability: f64, confidence_score: f64) -> f64 {
    if confidence_score <= 0.0 {
        return UNKNOWN_SKILL_SCORE;
    }
    let dist_from_mid = (1.0 - (mastery_probability - PEAK_MASTERY).abs() / PEAK_MASTERY).max(0.0);
    let low_confidence_bonus = (1.0 - confidence_score / CONFIDENCE_HORIZON).max(0.0);
    DISTANCE_WEIGHT * dist_from_mid + CONFIDENCE_WEIGHT * low_confidence_bonus
}
