use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::compliance::ComplianceReport;
use super::domain::{ActionPlan, AssessmentContext, Obligation, RiskEvaluation};

const SYSTEM_USER: &str = "system";

/// Work unit (`unite de travail`) of the company being assessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    #[serde(default)]
    pub modifiers: BTreeMap<String, i32>,
}

impl WorkUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            features: BTreeMap::new(),
            modifiers: BTreeMap::new(),
        }
    }

    pub fn with_feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.features.insert(name.into(), enabled);
        self
    }

    pub fn context(&self, sector_code: &str) -> AssessmentContext {
        AssessmentContext {
            sector_code: sector_code.to_string(),
            unit_name: self.name.clone(),
            features: self.features.clone(),
            modifiers: self.modifiers.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub company_name: String,
    pub year: i32,
    pub sector_code: String,
    pub units: Vec<WorkUnit>,
}

impl DocumentRequest {
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.company_name.trim().is_empty() {
            return Err(DocumentError::MissingCompany);
        }
        if self.units.is_empty() {
            return Err(DocumentError::NoUnits);
        }

        let mut names = HashSet::new();
        for unit in &self.units {
            if !names.insert(unit.name.trim().to_lowercase()) {
                return Err(DocumentError::DuplicateUnit(unit.name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("company name is required")]
    MissingCompany,
    #[error("at least one work unit is required")]
    NoUnits,
    #[error("work unit '{0}' is listed more than once")]
    DuplicateUnit(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAssessment {
    pub unit: WorkUnit,
    pub evaluations: Vec<RiskEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub at: DateTime<Utc>,
    pub user: String,
    pub change: String,
}

/// Consolidated assessment for every work unit of a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuerpDocument {
    pub id: String,
    pub company_name: String,
    pub year: i32,
    pub sector_code: String,
    pub units: Vec<UnitAssessment>,
    pub plan: ActionPlan,
    pub obligations: Vec<Obligation>,
    pub compliance: ComplianceReport,
    pub history: Vec<AuditRecord>,
    pub created_at: DateTime<Utc>,
}

static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_document_id() -> String {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("duerp-{id:06}")
}

impl DuerpDocument {
    pub(crate) fn assemble(
        request: DocumentRequest,
        units: Vec<UnitAssessment>,
        plan: ActionPlan,
        obligations: Vec<Obligation>,
        compliance: ComplianceReport,
        created_at: DateTime<Utc>,
    ) -> Self {
        let history = vec![AuditRecord {
            at: created_at,
            user: SYSTEM_USER.to_string(),
            change: format!("Creation du DUERP {} ({})", request.year, request.company_name),
        }];

        Self {
            id: next_document_id(),
            company_name: request.company_name,
            year: request.year,
            sector_code: request.sector_code,
            units,
            plan,
            obligations,
            compliance,
            history,
            created_at,
        }
    }

    pub fn record_change(
        &mut self,
        user: impl Into<String>,
        change: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.history.push(AuditRecord {
            at,
            user: user.into(),
            change: change.into(),
        });
    }

    /// Evaluations of every unit, in unit order.
    pub fn evaluations(&self) -> impl Iterator<Item = &RiskEvaluation> {
        self.units.iter().flat_map(|unit| unit.evaluations.iter())
    }

    pub fn last_change(&self) -> Option<&AuditRecord> {
        self.history.last()
    }
}
