use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::catalog::{Catalog, CatalogError, ConfigSource};
use super::compliance::{check_missing_obligations, ComplianceReport};
use super::document::{DocumentError, DocumentRequest, DuerpDocument, UnitAssessment};
use super::domain::{
    ActionPlan, AssessmentContext, ComputeBundle, Obligation, Risk, RiskEvaluation,
};
use super::plan::PlanBuilder;
use super::rules::{RuleMatches, RuleSet};
use super::scoring::{self, ScoringConfig};
use crate::config::EngineConfig;

/// Risks assessed when the sector profile contributes nothing.
pub const DEFAULT_RISK_IDS: [&str; 3] = ["R-ECRAN", "R-RPS", "R-INCENDIE"];

/// Facade tying the catalog, rule set, and scoring configuration together.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    catalog: Catalog,
    rules: RuleSet,
    scoring: ScoringConfig,
}

impl RiskEngine {
    pub fn new(catalog: Catalog, rules: RuleSet, scoring: ScoringConfig) -> Self {
        Self {
            catalog,
            rules,
            scoring,
        }
    }

    pub fn embedded() -> Result<Self, CatalogError> {
        Self::load(&ConfigSource::Embedded)
    }

    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::load(&ConfigSource::Directory(dir.as_ref().to_path_buf()))
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, CatalogError> {
        let mut engine = Self::load(&config.source())?;
        if let Some(accumulation) = config.accumulation {
            engine.scoring = engine.scoring.with_accumulation(accumulation);
        }
        Ok(engine)
    }

    pub fn load(source: &ConfigSource) -> Result<Self, CatalogError> {
        let catalog = Catalog::from_source(source)?;
        let rules = RuleSet::from_source(source)?;
        let scoring = ScoringConfig::from_source(source)?;

        info!(
            source = %source.describe(),
            risks = catalog.risks().len(),
            actions = catalog.actions().len(),
            obligations = catalog.obligations().len(),
            sectors = catalog.sectors().len(),
            rules = rules.len(),
            "risk catalog loaded"
        );
        report_dangling_references(&catalog, &rules);

        Ok(Self::new(catalog, rules, scoring))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn plan_builder(&self) -> PlanBuilder<'_> {
        PlanBuilder::new(&self.catalog, &self.rules, &self.scoring)
    }

    pub fn compute(
        &self,
        sector_code: &str,
        unit_name: &str,
        features: &BTreeMap<String, bool>,
    ) -> ComputeBundle {
        let context = AssessmentContext {
            features: features.clone(),
            ..AssessmentContext::new(sector_code, unit_name)
        };
        self.compute_with(&context)
    }

    pub fn compute_with(&self, context: &AssessmentContext) -> ComputeBundle {
        self.warn_unknown_features(context);

        let matches = self.rules.apply(context);
        let risks = self.resolve_risks(context, &matches);
        let evaluations: Vec<RiskEvaluation> = risks
            .iter()
            .map(|risk| self.evaluate(risk, context))
            .collect();
        let plan = self
            .plan_builder()
            .build_with_matches(&evaluations, context, &matches);
        let obligations = self.resolve_obligations(context, &risks, &matches);

        debug!(
            sector = %context.sector_code,
            unit = %context.unit_name,
            risks = risks.len(),
            actions = plan.items.len(),
            obligations = obligations.len(),
            "assessment computed"
        );

        ComputeBundle {
            risks,
            evaluations,
            plan,
            obligations,
        }
    }

    pub fn evaluate(&self, risk: &Risk, context: &AssessmentContext) -> RiskEvaluation {
        scoring::evaluate(risk, context, &self.scoring)
    }

    pub fn build_plan(
        &self,
        evaluations: &[RiskEvaluation],
        context: &AssessmentContext,
    ) -> ActionPlan {
        self.plan_builder().build(evaluations, context)
    }

    /// Profile priority risks that fit the unit and sector, then the mandatory ones, then the
    /// rule additions by name. Falls back to [`DEFAULT_RISK_IDS`] when the profile yields
    /// nothing. Rule additions are taken as-is: the rule's own conditions already scope them.
    pub fn resolve_risks(&self, context: &AssessmentContext, matches: &RuleMatches) -> Vec<Risk> {
        let mut selected: Vec<&Risk> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        if let Some(profile) = self.catalog.sector_profile(&context.sector_code) {
            let priority = self
                .lookup_risks(&profile.priority_risks)
                .filter(|risk| risk.applies_to(context));
            let mandatory = self.lookup_risks(&profile.mandatory_risks);
            for risk in priority.chain(mandatory) {
                if seen.insert(risk.id.as_str()) {
                    selected.push(risk);
                }
            }
        }

        if selected.is_empty() {
            for risk in self.lookup_risks(DEFAULT_RISK_IDS) {
                if seen.insert(risk.id.as_str()) {
                    selected.push(risk);
                }
            }
        }

        let mut added: Vec<&Risk> = self
            .lookup_risks(&matches.risks)
            .filter(|risk| !seen.contains(risk.id.as_str()))
            .collect();
        added.sort_by(|left, right| left.name.cmp(&right.name).then_with(|| left.id.cmp(&right.id)));
        selected.extend(added);

        selected.into_iter().cloned().collect()
    }

    /// Sector-applicable obligations tied to no risk or to one of `risks`, followed by the
    /// rule additions.
    pub fn resolve_obligations(
        &self,
        context: &AssessmentContext,
        risks: &[Risk],
        matches: &RuleMatches,
    ) -> Vec<Obligation> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut resolved: Vec<Obligation> = Vec::new();

        let applicable = self.catalog.obligations().iter().filter(|obligation| {
            obligation.applies_to_sector(&context.sector_code)
                && obligation.concerns_any(risks.iter().map(|risk| risk.id.as_str()))
        });
        let added = matches.obligations.iter().filter_map(|id| {
            let obligation = self.catalog.obligation(id);
            if obligation.is_none() {
                debug!(obligation = %id, "rule adds unknown obligation");
            }
            obligation
        });

        for obligation in applicable.chain(added) {
            if seen.insert(obligation.id.as_str()) {
                resolved.push(obligation.clone());
            }
        }
        resolved
    }

    pub fn check_missing_obligations<'a, I>(&self, sector_code: &str, existing: I) -> ComplianceReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        check_missing_obligations(&self.catalog, sector_code, existing)
    }

    /// Evaluates every work unit, merges their actions into one plan, and seeds the audit
    /// trail of a new document.
    pub fn generate_document(&self, request: DocumentRequest) -> Result<DuerpDocument, DocumentError> {
        request.validate()?;

        let builder = self.plan_builder();
        let mut accumulator = builder.accumulator();
        let mut units = Vec::with_capacity(request.units.len());
        let mut risk_ids: BTreeSet<String> = BTreeSet::new();
        let mut obligations: Vec<Obligation> = Vec::new();

        for unit in &request.units {
            let context = unit.context(&request.sector_code);
            let matches = self.rules.apply(&context);
            let risks = self.resolve_risks(&context, &matches);
            let evaluations: Vec<RiskEvaluation> = risks
                .iter()
                .map(|risk| self.evaluate(risk, &context))
                .collect();

            builder.accumulate(&mut accumulator, &evaluations, &context, &matches);
            for obligation in self.resolve_obligations(&context, &risks, &matches) {
                if !obligations.iter().any(|known| known.id == obligation.id) {
                    obligations.push(obligation);
                }
            }
            risk_ids.extend(risks.iter().map(|risk| risk.id.clone()));

            units.push(UnitAssessment {
                unit: unit.clone(),
                evaluations,
            });
        }

        let plan = builder.finish(accumulator);
        let compliance = self.check_missing_obligations(
            &request.sector_code,
            obligations.iter().map(|obligation| obligation.id.as_str()),
        );

        info!(
            company = %request.company_name,
            units = units.len(),
            risks = risk_ids.len(),
            actions = plan.items.len(),
            "duerp document generated"
        );

        Ok(DuerpDocument::assemble(
            request,
            units,
            plan,
            obligations,
            compliance,
            Utc::now(),
        ))
    }

    fn lookup_risks<'a, I, S>(&'a self, ids: I) -> impl Iterator<Item = &'a Risk> + 'a
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: 'a,
        S: AsRef<str>,
    {
        ids.into_iter().filter_map(move |id| {
            let id = id.as_ref();
            let risk = self.catalog.risk(id);
            if risk.is_none() {
                debug!(risk = %id, "skipping unknown risk id");
            }
            risk
        })
    }

    fn warn_unknown_features(&self, context: &AssessmentContext) {
        if context.features.is_empty() {
            return;
        }
        let known = self.rules.known_features();
        for name in context.features.keys() {
            if !known.contains(name.as_str()) {
                warn!(feature = %name, "feature flag is not referenced by any rule");
            }
        }
    }
}

fn report_dangling_references(catalog: &Catalog, rules: &RuleSet) {
    for (index, rule) in rules.rules().iter().enumerate() {
        for id in rule.add_risks.iter().filter(|id| catalog.risk(id).is_none()) {
            debug!(rule = index, risk = %id, "rule references unknown risk");
        }
        for id in rule.add_actions.iter().filter(|id| catalog.action(id).is_none()) {
            debug!(rule = index, action = %id, "rule references unknown action");
        }
        for id in rule
            .add_obligations
            .iter()
            .filter(|id| catalog.obligation(id).is_none())
        {
            debug!(rule = index, obligation = %id, "rule references unknown obligation");
        }
    }

    for profile in catalog.sectors() {
        let referenced = profile
            .mandatory_risks
            .iter()
            .chain(profile.priority_risks.iter());
        for id in referenced.filter(|id| catalog.risk(id).is_none()) {
            debug!(sector = %profile.sector_code, risk = %id, "profile references unknown risk");
        }
        for id in profile
            .recommended_actions
            .iter()
            .filter(|id| catalog.action(id).is_none())
        {
            debug!(sector = %profile.sector_code, action = %id, "profile references unknown action");
        }
    }
}
