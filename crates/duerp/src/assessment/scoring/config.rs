use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assessment::catalog::{CatalogError, CatalogFile, ConfigSource};
use crate::assessment::domain::{PlanPriority, RiskPriority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringModel {
    /// severity × probability × control
    ThreeFactor,
    /// severity × frequency × probability × control
    FourFactor,
}

/// How scores of several risks sharing one action combine into its weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationPolicy {
    #[default]
    Sum,
    Max,
}

impl AccumulationPolicy {
    pub fn combine(&self, current: u32, score: u32) -> u32 {
        match self {
            AccumulationPolicy::Sum => current.saturating_add(score),
            AccumulationPolicy::Max => current.max(score),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sum" => Some(AccumulationPolicy::Sum),
            "max" => Some(AccumulationPolicy::Max),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccumulationPolicy::Sum => "sum",
            AccumulationPolicy::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorBaseline {
    pub severity: u32,
    pub probability: u32,
    pub frequency: u32,
    pub control: u32,
}

/// Per-risk replacement of some baseline factors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<u32>,
}

impl BaselineOverride {
    fn severity(severity: u32) -> Self {
        Self {
            severity: Some(severity),
            ..Self::default()
        }
    }

    fn apply(&self, base: FactorBaseline) -> FactorBaseline {
        FactorBaseline {
            severity: self.severity.unwrap_or(base.severity),
            probability: self.probability.unwrap_or(base.probability),
            frequency: self.frequency.unwrap_or(base.frequency),
            control: self.control.unwrap_or(base.control),
        }
    }
}

/// Inclusive lower bounds of each bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityThresholds {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
}

impl PriorityThresholds {
    pub fn bucket(&self, score: u32) -> RiskPriority {
        if score >= self.critical {
            RiskPriority::Critical
        } else if score >= self.high {
            RiskPriority::High
        } else if score >= self.medium {
            RiskPriority::Medium
        } else {
            RiskPriority::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanThresholds {
    pub high: u32,
    pub medium: u32,
    #[serde(default)]
    pub accumulation: AccumulationPolicy,
}

impl PlanThresholds {
    pub fn priority(&self, weight: u32) -> PlanPriority {
        if weight >= self.high {
            PlanPriority::High
        } else if weight >= self.medium {
            PlanPriority::Medium
        } else {
            PlanPriority::Low
        }
    }
}

/// Scales, baselines, modifiers, and thresholds of the scoring function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub model: ScoringModel,
    pub severity_scale: Vec<u32>,
    pub probability_scale: Vec<u32>,
    #[serde(default)]
    pub frequency_scale: Vec<u32>,
    pub control_scale: Vec<u32>,
    pub baseline: FactorBaseline,
    #[serde(default)]
    pub risk_baselines: BTreeMap<String, BaselineOverride>,
    /// Unit name to per-risk delta.
    #[serde(default)]
    pub unit_modifiers: BTreeMap<String, BTreeMap<String, i32>>,
    pub priority_thresholds: PriorityThresholds,
    pub plan: PlanThresholds,
}

impl ScoringConfig {
    /// Three-factor preset; identical to the embedded `scoring.json`.
    pub fn classic() -> Self {
        let risk_baselines = BTreeMap::from([
            ("R-INCENDIE".to_string(), BaselineOverride::severity(5)),
            ("R-MACHINE".to_string(), BaselineOverride::severity(5)),
            ("R-HAUTEUR".to_string(), BaselineOverride::severity(5)),
            ("R-SOLVENTS".to_string(), BaselineOverride::severity(4)),
            ("R-BIO".to_string(), BaselineOverride::severity(4)),
            (
                "R-NIGHT".to_string(),
                BaselineOverride {
                    probability: Some(4),
                    ..BaselineOverride::default()
                },
            ),
        ]);

        let unit_modifiers = BTreeMap::from([
            (
                "Cuisine".to_string(),
                modifiers(&[("R-INCENDIE", 1), ("R-CHUTE", 1), ("R-BRULURE", 1)]),
            ),
            (
                "Atelier".to_string(),
                modifiers(&[("R-BRUIT", 1), ("R-MACHINE", 1)]),
            ),
            ("Bureau".to_string(), modifiers(&[("R-ECRAN", 1)])),
        ]);

        Self {
            model: ScoringModel::ThreeFactor,
            severity_scale: vec![1, 2, 3, 4, 5],
            probability_scale: vec![1, 2, 3, 4, 5],
            frequency_scale: vec![1, 2, 3, 4],
            control_scale: vec![1, 2, 3, 4],
            baseline: FactorBaseline {
                severity: 3,
                probability: 3,
                frequency: 2,
                control: 2,
            },
            risk_baselines,
            unit_modifiers,
            priority_thresholds: PriorityThresholds {
                critical: 60,
                high: 36,
                medium: 18,
            },
            plan: PlanThresholds {
                high: 100,
                medium: 50,
                accumulation: AccumulationPolicy::Sum,
            },
        }
    }

    /// Four-factor preset with the wider thresholds its larger score range needs.
    pub fn premium() -> Self {
        Self {
            model: ScoringModel::FourFactor,
            priority_thresholds: PriorityThresholds {
                critical: 240,
                high: 120,
                medium: 36,
            },
            plan: PlanThresholds {
                high: 200,
                medium: 100,
                accumulation: AccumulationPolicy::Sum,
            },
            ..Self::classic()
        }
    }

    pub fn from_source(source: &ConfigSource) -> Result<Self, CatalogError> {
        let config: Self = source.parse(CatalogFile::Scoring)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_accumulation(mut self, accumulation: AccumulationPolicy) -> Self {
        self.plan.accumulation = accumulation;
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        check_scale("severity_scale", &self.severity_scale)?;
        check_scale("probability_scale", &self.probability_scale)?;
        check_scale("control_scale", &self.control_scale)?;
        if self.model == ScoringModel::FourFactor || !self.frequency_scale.is_empty() {
            check_scale("frequency_scale", &self.frequency_scale)?;
        }

        let thresholds = &self.priority_thresholds;
        if thresholds.critical < thresholds.high || thresholds.high < thresholds.medium {
            return Err(CatalogError::InvalidScoring(format!(
                "priority thresholds must satisfy critical >= high >= medium (got {}, {}, {})",
                thresholds.critical, thresholds.high, thresholds.medium
            )));
        }
        if self.plan.high < self.plan.medium {
            return Err(CatalogError::InvalidScoring(format!(
                "plan thresholds must satisfy high >= medium (got {}, {})",
                self.plan.high, self.plan.medium
            )));
        }
        Ok(())
    }

    pub fn baseline_for(&self, risk_id: &str) -> FactorBaseline {
        match self.risk_baselines.get(risk_id) {
            Some(overrides) => overrides.apply(self.baseline),
            None => self.baseline,
        }
    }

    /// Unit names match case-insensitively.
    pub fn unit_modifier(&self, unit_name: &str, risk_id: &str) -> i32 {
        let unit = unit_name.trim();
        self.unit_modifiers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(unit))
            .and_then(|(_, deltas)| deltas.get(risk_id))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::classic()
    }
}

fn modifiers(entries: &[(&str, i32)]) -> BTreeMap<String, i32> {
    entries
        .iter()
        .map(|(risk_id, delta)| (risk_id.to_string(), *delta))
        .collect()
}

fn check_scale(name: &str, scale: &[u32]) -> Result<(), CatalogError> {
    if scale.is_empty() {
        return Err(CatalogError::InvalidScoring(format!("{name} is empty")));
    }
    if scale.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(CatalogError::InvalidScoring(format!(
            "{name} must be strictly ascending"
        )));
    }
    Ok(())
}
