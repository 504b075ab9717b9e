use super::common::*;
use crate::assessment::catalog::{CatalogError, ConfigSource};
use crate::assessment::domain::{PriorityLetter, RiskPriority};
use crate::assessment::scoring::{evaluate, AccumulationPolicy, ScoringConfig, ScoringModel};

#[test]
fn embedded_scoring_matches_classic_preset() {
    let loaded = ScoringConfig::from_source(&ConfigSource::Embedded).expect("scoring loads");
    assert_eq!(loaded, ScoringConfig::classic());
    assert_eq!(loaded.plan.accumulation, AccumulationPolicy::Sum);
}

#[test]
fn baseline_risk_scores_severity_probability_control() {
    let scoring = ScoringConfig::classic();
    let evaluation = evaluate(&risk("R-ECRAN", "Ecran"), &context("47", "Magasin"), &scoring);

    assert_eq!(evaluation.severity, 3);
    assert_eq!(evaluation.probability, 3);
    assert_eq!(evaluation.control, 2);
    assert_eq!(evaluation.frequency, None);
    assert_eq!(evaluation.score, 18);
    assert_eq!(evaluation.priority, RiskPriority::Medium);
    assert_eq!(evaluation.priority_letter, PriorityLetter::M);
    assert_eq!(evaluation.unit_name, "Magasin");
}

#[test]
fn unit_modifiers_raise_factors_and_clip_to_scale() {
    let scoring = ScoringConfig::classic();
    let incendie = risk("R-INCENDIE", "Incendie");

    let kitchen = evaluate(&incendie, &context("56", "Cuisine"), &scoring);
    assert_eq!(kitchen.severity, 5);
    assert_eq!(kitchen.probability, 4);
    assert_eq!(kitchen.control, 2);
    assert_eq!(kitchen.score, 40);
    assert_eq!(kitchen.priority, RiskPriority::High);

    let lowercase = evaluate(&incendie, &context("56", "cuisine"), &scoring);
    assert_eq!(lowercase.score, kitchen.score);
}

#[test]
fn negative_modifiers_raise_the_control_factor() {
    let scoring = ScoringConfig::classic();
    let ecran = risk("R-ECRAN", "Ecran");

    let mitigated = evaluate(&ecran, &context("47", "Magasin").with_modifier("R-ECRAN", -1), &scoring);
    assert_eq!((mitigated.severity, mitigated.probability, mitigated.control), (2, 2, 3));
    assert_eq!(mitigated.score, 12);
    assert_eq!(mitigated.priority, RiskPriority::Low);

    let floor = evaluate(&ecran, &context("47", "Magasin").with_modifier("R-ECRAN", -9), &scoring);
    assert_eq!((floor.severity, floor.probability, floor.control), (1, 1, 4));
    assert_eq!(floor.score, 4);
}

#[test]
fn score_is_monotonic_in_the_modifier() {
    let engine = engine();
    for scoring in [ScoringConfig::classic(), ScoringConfig::premium()] {
        for risk in engine.catalog().risks() {
            let mut previous = 0;
            for delta in -6..=6 {
                let ctx = context("47", "Magasin").with_modifier(risk.id.clone(), delta);
                let score = evaluate(risk, &ctx, &scoring).score;
                assert!(
                    score >= previous,
                    "{} drops from {previous} to {score} at modifier {delta}",
                    risk.id
                );
                previous = score;
            }
        }
    }
}

#[test]
fn buckets_partition_scores_with_inclusive_bounds() {
    let thresholds = ScoringConfig::classic().priority_thresholds;

    assert_eq!(thresholds.bucket(60), RiskPriority::Critical);
    assert_eq!(thresholds.bucket(59), RiskPriority::High);
    assert_eq!(thresholds.bucket(36), RiskPriority::High);
    assert_eq!(thresholds.bucket(35), RiskPriority::Medium);
    assert_eq!(thresholds.bucket(18), RiskPriority::Medium);
    assert_eq!(thresholds.bucket(17), RiskPriority::Low);

    for score in 0..=400 {
        let expected = if score >= 60 {
            RiskPriority::Critical
        } else if score >= 36 {
            RiskPriority::High
        } else if score >= 18 {
            RiskPriority::Medium
        } else {
            RiskPriority::Low
        };
        assert_eq!(thresholds.bucket(score), expected);
    }
}

#[test]
fn premium_preset_multiplies_frequency() {
    let scoring = ScoringConfig::premium();
    assert_eq!(scoring.model, ScoringModel::FourFactor);

    let evaluation = evaluate(&risk("R-ECRAN", "Ecran"), &context("47", "Magasin"), &scoring);

    assert_eq!(evaluation.frequency, Some(2));
    assert_eq!(evaluation.score, 36);
    assert_eq!(evaluation.priority, RiskPriority::Medium);
}

#[test]
fn validation_rejects_unordered_thresholds_and_scales() {
    let mut thresholds = ScoringConfig::classic();
    thresholds.priority_thresholds.high = 80;
    assert!(matches!(
        thresholds.validate(),
        Err(CatalogError::InvalidScoring(_))
    ));

    let mut scale = ScoringConfig::classic();
    scale.severity_scale = vec![1, 3, 2];
    assert!(matches!(scale.validate(), Err(CatalogError::InvalidScoring(_))));

    let mut empty = ScoringConfig::premium();
    empty.frequency_scale.clear();
    assert!(matches!(empty.validate(), Err(CatalogError::InvalidScoring(_))));

    assert!(ScoringConfig::premium().validate().is_ok());
}
