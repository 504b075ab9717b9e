//! Risk assessment for the DUERP: catalog lookup, conditional rules, G×F×P scoring, and the
//! deduplicated action plan.
//!
//! [`RiskEngine`] owns the immutable catalog, rule set, and scoring configuration. Every
//! computation allocates its own accumulators, so one engine is shared as `Arc<RiskEngine>`
//! across request handlers.

pub mod catalog;
mod compliance;
pub mod document;
pub mod domain;
mod engine;
pub mod export;
pub mod plan;
pub mod router;
pub mod rules;
pub mod schedule;
pub mod scoring;

#[cfg(test)]
mod tests;

pub use catalog::{normalize_sector_code, Catalog, CatalogError, ConfigSource};
pub use compliance::{check_missing_obligations, ComplianceReport};
pub use document::{AuditRecord, DocumentError, DocumentRequest, DuerpDocument, UnitAssessment, WorkUnit};
pub use domain::{
    Action, ActionPlan, ActionPlanItem, AssessmentContext, ComputeBundle, Obligation,
    PlanPriority, PriorityLetter, Risk, RiskEvaluation, RiskPriority, SectorProfile,
};
pub use engine::{RiskEngine, DEFAULT_RISK_IDS};
pub use export::{ExportError, PlanRow};
pub use plan::PlanBuilder;
pub use router::assessment_router;
pub use rules::{apply_rules, Condition, ConditionalRule, RuleMatches, RuleSet};
pub use scoring::{evaluate, AccumulationPolicy, ScoringConfig, ScoringModel};
