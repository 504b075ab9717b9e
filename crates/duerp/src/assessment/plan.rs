use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use super::catalog::Catalog;
use super::domain::{
    Action, ActionPlan, ActionPlanItem, AssessmentContext, RiskEvaluation, SectorProfile,
};
use super::rules::{RuleMatches, RuleSet};
use super::scoring::{AccumulationPolicy, ScoringConfig};

/// Turns scored risks into a deduplicated, ranked list of actions.
pub struct PlanBuilder<'a> {
    catalog: &'a Catalog,
    rules: &'a RuleSet,
    scoring: &'a ScoringConfig,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(catalog: &'a Catalog, rules: &'a RuleSet, scoring: &'a ScoringConfig) -> Self {
        Self {
            catalog,
            rules,
            scoring,
        }
    }

    pub fn build(&self, evaluations: &[RiskEvaluation], context: &AssessmentContext) -> ActionPlan {
        let matches = self.rule_matches(context);
        self.build_with_matches(evaluations, context, &matches)
    }

    pub fn rule_matches(&self, context: &AssessmentContext) -> RuleMatches {
        self.rules.apply(context)
    }

    /// Actions that would be planned for `risk_id` in `context`, in the order the plan
    /// considers them.
    pub fn actions_for(
        &self,
        risk_id: &str,
        context: &AssessmentContext,
        matches: &RuleMatches,
    ) -> Vec<&'a Action> {
        let profile = self.catalog.sector_profile(&context.sector_code);
        self.candidate_actions(risk_id, &context.sector_code, matches, profile)
    }

    pub fn build_with_matches(
        &self,
        evaluations: &[RiskEvaluation],
        context: &AssessmentContext,
        matches: &RuleMatches,
    ) -> ActionPlan {
        let mut accumulator = self.accumulator();
        self.accumulate(&mut accumulator, evaluations, context, matches);
        self.finish(accumulator)
    }

    pub fn accumulator(&self) -> PlanAccumulator {
        PlanAccumulator::new(self.scoring.plan.accumulation)
    }

    /// Folds one work unit's evaluations into `accumulator`.
    pub fn accumulate(
        &self,
        accumulator: &mut PlanAccumulator,
        evaluations: &[RiskEvaluation],
        context: &AssessmentContext,
        matches: &RuleMatches,
    ) {
        let profile = self.catalog.sector_profile(&context.sector_code);
        for evaluation in evaluations {
            for action in
                self.candidate_actions(&evaluation.risk.id, &context.sector_code, matches, profile)
            {
                accumulator.add(action, &evaluation.risk.id, evaluation.score);
            }
        }
    }

    pub fn finish(&self, accumulator: PlanAccumulator) -> ActionPlan {
        let policy = accumulator.policy;
        let mut items: Vec<ActionPlanItem> = accumulator
            .entries
            .into_values()
            .map(|entry| ActionPlanItem {
                priority: self.scoring.plan.priority(entry.weight),
                action: entry.action,
                related_risk_ids: entry.related_risk_ids,
                weight: entry.weight,
            })
            .collect();

        items.sort_by(|left, right| {
            right
                .weight
                .cmp(&left.weight)
                .then_with(|| left.action.title.cmp(&right.action.title))
                .then_with(|| left.action.id.cmp(&right.action.id))
        });

        ActionPlan {
            generated_at: Utc::now(),
            accumulation: policy,
            items,
        }
    }

    /// Catalog actions for the risk that fit the sector, plus rule-added ones regardless of
    /// sector. Recommended actions of the sector profile come first, in profile order.
    fn candidate_actions(
        &self,
        risk_id: &str,
        sector_code: &str,
        matches: &RuleMatches,
        profile: Option<&SectorProfile>,
    ) -> Vec<&'a Action> {
        let mut candidates: Vec<&Action> = self
            .catalog
            .actions_for_risk(risk_id)
            .filter(|action| {
                action.applies_to_sector(sector_code) || matches.actions.contains(&action.id)
            })
            .collect();

        if let Some(profile) = profile {
            candidates.sort_by_key(|action| profile.recommends(&action.id).unwrap_or(usize::MAX));
        }
        candidates
    }
}

struct PlanEntry {
    action: Action,
    related_risk_ids: BTreeSet<String>,
    weight: u32,
}

/// Per-computation state keyed by action id.
pub struct PlanAccumulator {
    policy: AccumulationPolicy,
    entries: HashMap<String, PlanEntry>,
}

impl PlanAccumulator {
    fn new(policy: AccumulationPolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    fn add(&mut self, action: &Action, risk_id: &str, score: u32) {
        let policy = self.policy;
        let entry = self
            .entries
            .entry(action.id.clone())
            .or_insert_with(|| PlanEntry {
                action: action.clone(),
                related_risk_ids: BTreeSet::new(),
                weight: 0,
            });
        entry.weight = policy.combine(entry.weight, score);
        entry.related_risk_ids.insert(risk_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
