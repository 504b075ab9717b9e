use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::catalog::{normalize_sector_code, CatalogError, CatalogFile, ConfigSource};
use super::domain::AssessmentContext;

const FEATURE_PREFIX: &str = "features.";

/// Single test a rule performs against the assessment context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "on", rename_all = "snake_case")]
pub enum Condition {
    Feature { name: String, equals: bool },
    Unit { equals: String },
    /// Compared against the normalized sector code.
    Sector { equals: String },
}

impl Condition {
    /// Parses one `"path": value` entry of the on-disk `if` block.
    pub fn from_path(path: &str, value: &Value) -> Result<Self, String> {
        if let Some(name) = path.strip_prefix(FEATURE_PREFIX) {
            if name.is_empty() {
                return Err(format!("'{path}' does not name a feature"));
            }
            let equals = value
                .as_bool()
                .ok_or_else(|| format!("'{path}' expects a boolean, found {value}"))?;
            return Ok(Condition::Feature {
                name: name.to_string(),
                equals,
            });
        }

        match path {
            "unit" | "unity" => {
                let equals = value
                    .as_str()
                    .ok_or_else(|| format!("'{path}' expects a string, found {value}"))?;
                Ok(Condition::Unit {
                    equals: equals.to_string(),
                })
            }
            "sector" | "sector_code" | "nafCode" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| format!("'{path}' expects a string, found {value}"))?;
                let equals = normalize_sector_code(raw);
                if equals.is_empty() {
                    return Err(format!("'{path}' has an empty sector code"));
                }
                Ok(Condition::Sector { equals })
            }
            other => Err(format!("unknown condition path '{other}'")),
        }
    }

    /// Strict equality. A feature absent from the context never matches, whatever the
    /// expected value.
    pub fn matches(&self, context: &AssessmentContext) -> bool {
        match self {
            Condition::Feature { name, equals } => context.feature(name) == Some(*equals),
            Condition::Unit { equals } => context.unit_name == *equals,
            Condition::Sector { equals } => normalize_sector_code(&context.sector_code) == *equals,
        }
    }
}

/// Adds risks, actions, and obligations when every condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub conditions: Vec<Condition>,
    pub add_risks: Vec<String>,
    pub add_actions: Vec<String>,
    pub add_obligations: Vec<String>,
}

impl ConditionalRule {
    pub fn matches(&self, context: &AssessmentContext) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(context))
    }
}

#[derive(Debug, Deserialize)]
struct RawRuleFile {
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(rename = "if", default)]
    conditions: BTreeMap<String, Value>,
    #[serde(default)]
    add_risks: Vec<String>,
    #[serde(default)]
    add_actions: Vec<String>,
    #[serde(default)]
    add_obligations: Vec<String>,
}

impl RawRule {
    fn into_rule(self, index: usize) -> Result<ConditionalRule, CatalogError> {
        let conditions = self
            .conditions
            .iter()
            .map(|(path, value)| Condition::from_path(path, value))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| CatalogError::InvalidRule { index, reason })?;

        Ok(ConditionalRule {
            conditions,
            add_risks: self.add_risks,
            add_actions: self.add_actions,
            add_obligations: self.add_obligations,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ConditionalRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<ConditionalRule>) -> Self {
        Self { rules }
    }

    pub fn from_source(source: &ConfigSource) -> Result<Self, CatalogError> {
        let raw: RawRuleFile = source.parse(CatalogFile::Rules)?;
        let rules = raw
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| rule.into_rule(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply(&self, context: &AssessmentContext) -> RuleMatches {
        apply_rules(context, self)
    }

    /// Feature names any rule tests.
    pub fn known_features(&self) -> BTreeSet<&str> {
        self.rules
            .iter()
            .flat_map(|rule| rule.conditions.iter())
            .filter_map(|condition| match condition {
                Condition::Feature { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Union of everything the matching rules add.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleMatches {
    pub risks: BTreeSet<String>,
    pub actions: BTreeSet<String>,
    pub obligations: BTreeSet<String>,
}

impl RuleMatches {
    pub fn is_empty(&self) -> bool {
        self.risks.is_empty() && self.actions.is_empty() && self.obligations.is_empty()
    }
}

pub fn apply_rules(context: &AssessmentContext, rules: &RuleSet) -> RuleMatches {
    let mut matches = RuleMatches::default();
    for rule in rules.rules.iter().filter(|rule| rule.matches(context)) {
        matches.risks.extend(rule.add_risks.iter().cloned());
        matches.actions.extend(rule.add_actions.iter().cloned());
        matches.obligations.extend(rule.add_obligations.iter().cloned());
    }
    matches
}
