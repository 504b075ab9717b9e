use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::assessment::catalog::Catalog;
use crate::assessment::domain::{
    Action, AssessmentContext, Risk, RiskEvaluation, SectorProfile,
};
use crate::assessment::rules::RuleSet;
use crate::assessment::scoring::ScoringConfig;
use crate::assessment::RiskEngine;

pub(super) fn engine() -> RiskEngine {
    RiskEngine::embedded().expect("embedded catalog loads")
}

pub(super) fn shared_engine() -> Arc<RiskEngine> {
    Arc::new(engine())
}

pub(super) fn risk(id: &str, name: &str) -> Risk {
    Risk {
        id: id.to_string(),
        name: name.to_string(),
        category: "Test".to_string(),
        description: String::new(),
        sector_prefixes: Vec::new(),
        units: Vec::new(),
    }
}

pub(super) fn action(id: &str, risk_id: &str, title: &str) -> Action {
    Action {
        id: id.to_string(),
        risk_id: risk_id.to_string(),
        also_covers: Vec::new(),
        title: title.to_string(),
        kind: "Organisation".to_string(),
        difficulty: "Faible".to_string(),
        cost: "Faible".to_string(),
        impact: String::new(),
        sector_prefixes: Vec::new(),
    }
}

/// Evaluation with an arbitrary score, bypassing the scoring function.
pub(super) fn scored(risk: Risk, score: u32, scoring: &ScoringConfig) -> RiskEvaluation {
    let priority = scoring.priority_thresholds.bucket(score);
    RiskEvaluation {
        risk,
        unit_name: "Atelier".to_string(),
        severity: 1,
        probability: 1,
        frequency: None,
        control: 1,
        score,
        priority,
        priority_letter: priority.letter(),
    }
}

/// Three risks where `A-X` covers both `R-A` and `R-B`, and `A-Y` covers `R-C` alone.
pub(super) fn shared_action_catalog() -> Catalog {
    let mut shared = action("A-X", "R-A", "Mesure partagee");
    shared.also_covers = vec!["R-B".to_string()];

    Catalog::new(
        vec![
            risk("R-A", "Risque A"),
            risk("R-B", "Risque B"),
            risk("R-C", "Risque C"),
        ],
        vec![shared, action("A-Y", "R-C", "Mesure isolee")],
        Vec::new(),
        vec![SectorProfile {
            sector_code: "99".to_string(),
            label: "Test".to_string(),
            mandatory_risks: vec!["R-A".to_string()],
            priority_risks: vec!["R-B".to_string(), "R-C".to_string()],
            recommended_actions: Vec::new(),
        }],
    )
    .expect("fixture catalog is valid")
}

pub(super) fn context(sector: &str, unit: &str) -> AssessmentContext {
    AssessmentContext::new(sector, unit)
}

pub(super) fn ids<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    items.into_iter().map(str::to_string).collect()
}

pub(super) fn risk_ids(risks: &[Risk]) -> Vec<String> {
    ids(risks.iter().map(|risk| risk.id.as_str()))
}

pub(super) fn id_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(super) fn empty_rules() -> RuleSet {
    RuleSet::default()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
