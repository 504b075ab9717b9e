use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scoring::AccumulationPolicy;

/// Unit name that stands for every work unit.
const ALL_UNITS: &str = "Tous";

/// Hazard from the catalog. Empty `sector_prefixes` or `units` mean "applies everywhere".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sector_prefixes: Vec<String>,
    #[serde(default)]
    pub units: Vec<String>,
}

impl Risk {
    pub fn applies_to_sector(&self, sector_code: &str) -> bool {
        prefix_match(&self.sector_prefixes, sector_code)
    }

    /// Unit names compare case-insensitively; `Tous` on either side matches everything.
    pub fn applies_to_unit(&self, unit_name: &str) -> bool {
        let unit = unit_name.trim();
        if self.units.is_empty() || unit.eq_ignore_ascii_case(ALL_UNITS) {
            return true;
        }

        self.units.iter().any(|candidate| {
            candidate.eq_ignore_ascii_case(ALL_UNITS) || candidate.eq_ignore_ascii_case(unit)
        })
    }

    pub fn applies_to(&self, context: &AssessmentContext) -> bool {
        self.applies_to_sector(&context.sector_code) && self.applies_to_unit(&context.unit_name)
    }
}

/// Preventive measure. `risk_id` is the primary risk; `also_covers` lists other risks the
/// same measure mitigates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub risk_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_covers: Vec<String>,
    pub title: String,
    #[serde(alias = "type")]
    pub kind: String,
    pub difficulty: String,
    pub cost: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub sector_prefixes: Vec<String>,
}

impl Action {
    pub fn addresses(&self, risk_id: &str) -> bool {
        self.risk_id == risk_id || self.also_covers.iter().any(|covered| covered == risk_id)
    }

    pub fn covered_risks(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.risk_id.as_str()).chain(self.also_covers.iter().map(String::as_str))
    }

    pub fn applies_to_sector(&self, sector_code: &str) -> bool {
        prefix_match(&self.sector_prefixes, sector_code)
    }
}

/// Legal or regulatory requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub applies_to_all: bool,
    #[serde(default)]
    pub sector_prefixes: Vec<String>,
    #[serde(default)]
    pub risk_ids: Vec<String>,
}

impl Obligation {
    /// Unlike risks and actions, an obligation with no prefixes only applies when it is
    /// flagged `applies_to_all`; otherwise it can only be brought in by a rule.
    pub fn applies_to_sector(&self, sector_code: &str) -> bool {
        self.applies_to_all
            || (!self.sector_prefixes.is_empty() && prefix_match(&self.sector_prefixes, sector_code))
    }

    pub fn concerns_any<'a, I>(&self, risk_ids: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.risk_ids.is_empty() {
            return true;
        }
        risk_ids
            .into_iter()
            .any(|id| self.risk_ids.iter().any(|own| own == id))
    }
}

/// Sector-specific risk emphasis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorProfile {
    pub sector_code: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub mandatory_risks: Vec<String>,
    #[serde(default)]
    pub priority_risks: Vec<String>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

impl SectorProfile {
    pub fn recommends(&self, action_id: &str) -> Option<usize> {
        self.recommended_actions
            .iter()
            .position(|candidate| candidate == action_id)
    }
}

/// Inputs of a single compute call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentContext {
    pub sector_code: String,
    pub unit_name: String,
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    /// Per-risk adjustments, keyed by risk id.
    #[serde(default)]
    pub modifiers: BTreeMap<String, i32>,
}

impl AssessmentContext {
    pub fn new(sector_code: impl Into<String>, unit_name: impl Into<String>) -> Self {
        Self {
            sector_code: sector_code.into(),
            unit_name: unit_name.into(),
            features: BTreeMap::new(),
            modifiers: BTreeMap::new(),
        }
    }

    pub fn with_feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.features.insert(name.into(), enabled);
        self
    }

    pub fn with_modifier(mut self, risk_id: impl Into<String>, delta: i32) -> Self {
        self.modifiers.insert(risk_id.into(), delta);
        self
    }

    pub fn feature(&self, name: &str) -> Option<bool> {
        self.features.get(name).copied()
    }

    pub fn modifier(&self, risk_id: &str) -> i32 {
        self.modifiers.get(risk_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskPriority {
    pub fn label(&self) -> &'static str {
        match self {
            RiskPriority::Critical => "critical",
            RiskPriority::High => "high",
            RiskPriority::Medium => "medium",
            RiskPriority::Low => "low",
        }
    }

    pub fn letter(&self) -> PriorityLetter {
        match self {
            RiskPriority::Critical | RiskPriority::High => PriorityLetter::H,
            RiskPriority::Medium => PriorityLetter::M,
            RiskPriority::Low => PriorityLetter::B,
        }
    }
}

/// French short code printed in the document: Haute, Moyenne, Basse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityLetter {
    H,
    M,
    B,
}

impl PriorityLetter {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLetter::H => "H",
            PriorityLetter::M => "M",
            PriorityLetter::B => "B",
        }
    }
}

/// Scored instance of a risk for one work unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEvaluation {
    pub risk: Risk,
    pub unit_name: String,
    pub severity: u32,
    pub probability: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    pub control: u32,
    pub score: u32,
    pub priority: RiskPriority,
    pub priority_letter: PriorityLetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanPriority {
    High,
    Medium,
    Low,
}

impl PlanPriority {
    pub fn label(&self) -> &'static str {
        match self {
            PlanPriority::High => "Haute",
            PlanPriority::Medium => "Moyenne",
            PlanPriority::Low => "Basse",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim() {
            "Haute" => Some(PlanPriority::High),
            "Moyenne" => Some(PlanPriority::Medium),
            "Basse" => Some(PlanPriority::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlanItem {
    pub action: Action,
    pub related_risk_ids: BTreeSet<String>,
    pub weight: u32,
    pub priority: PlanPriority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub generated_at: DateTime<Utc>,
    pub accumulation: AccumulationPolicy,
    pub items: Vec<ActionPlanItem>,
}

impl ActionPlan {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, action_id: &str) -> Option<&ActionPlanItem> {
        self.items.iter().find(|item| item.action.id == action_id)
    }
}

/// Result of [`super::RiskEngine::compute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeBundle {
    pub risks: Vec<Risk>,
    pub evaluations: Vec<RiskEvaluation>,
    pub plan: ActionPlan,
    pub obligations: Vec<Obligation>,
}

fn prefix_match(prefixes: &[String], sector_code: &str) -> bool {
    if prefixes.is_empty() {
        return true;
    }
    let code = super::catalog::normalize_sector_code(sector_code);
    prefixes.iter().any(|prefix| {
        let prefix = super::catalog::normalize_sector_code(prefix);
        !prefix.is_empty() && code.starts_with(&prefix)
    })
}
