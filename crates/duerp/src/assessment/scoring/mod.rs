mod config;

pub use config::{
    AccumulationPolicy, BaselineOverride, FactorBaseline, PlanThresholds, PriorityThresholds,
    ScoringConfig, ScoringModel,
};

use super::domain::{AssessmentContext, Risk, RiskEvaluation};

/// Scores one risk for the context's work unit.
///
/// The combined modifier `m` (request modifier plus unit modifier) raises severity,
/// probability, and frequency; a negative `m` raises the control factor instead. Every
/// factor is clipped to its scale.
pub fn evaluate(risk: &Risk, context: &AssessmentContext, scoring: &ScoringConfig) -> RiskEvaluation {
    let modifier = i64::from(context.modifier(&risk.id))
        + i64::from(scoring.unit_modifier(&context.unit_name, &risk.id));
    let base = scoring.baseline_for(&risk.id);

    let severity = clamp(i64::from(base.severity) + modifier, &scoring.severity_scale);
    let probability = clamp(
        i64::from(base.probability) + modifier,
        &scoring.probability_scale,
    );
    let control = clamp(
        i64::from(base.control) + (-modifier).max(0),
        &scoring.control_scale,
    );
    let frequency = match scoring.model {
        ScoringModel::ThreeFactor => None,
        ScoringModel::FourFactor => Some(clamp(
            i64::from(base.frequency) + modifier,
            &scoring.frequency_scale,
        )),
    };

    let score = severity
        .saturating_mul(probability)
        .saturating_mul(control)
        .saturating_mul(frequency.unwrap_or(1));
    let priority = scoring.priority_thresholds.bucket(score);

    RiskEvaluation {
        risk: risk.clone(),
        unit_name: context.unit_name.clone(),
        severity,
        probability,
        frequency,
        control,
        score,
        priority,
        priority_letter: priority.letter(),
    }
}

fn clamp(value: i64, scale: &[u32]) -> u32 {
    let (low, high) = match (scale.first(), scale.last()) {
        (Some(&low), Some(&high)) => (i64::from(low), i64::from(high)),
        _ => (0, i64::from(u32::MAX)),
    };
    let clipped = value.max(low).min(high).max(0);
    u32::try_from(clipped).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_clips_to_scale_bounds() {
        let scale = [1, 2, 3, 4, 5];
        assert_eq!(clamp(-3, &scale), 1);
        assert_eq!(clamp(3, &scale), 3);
        assert_eq!(clamp(12, &scale), 5);
    }

    #[test]
    fn accumulation_policies_combine_differently() {
        assert_eq!(AccumulationPolicy::Sum.combine(50, 50), 100);
        assert_eq!(AccumulationPolicy::Max.combine(50, 40), 50);
        assert_eq!(AccumulationPolicy::parse(" Max "), Some(AccumulationPolicy::Max));
        assert_eq!(AccumulationPolicy::parse("mean"), None);
    }
}
