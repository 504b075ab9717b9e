mod loader;
mod sector;

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use super::domain::{Action, Obligation, Risk, SectorProfile};

pub use loader::{CatalogFile, ConfigSource};
pub use sector::normalize_sector_code;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file} is malformed: {source}")]
    Parse {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("{kind} entry has an empty id")]
    MissingId { kind: &'static str },
    #[error("rule #{index} is invalid: {reason}")]
    InvalidRule { index: usize, reason: String },
    #[error("scoring configuration is invalid: {0}")]
    InvalidScoring(String),
}

/// Static risk, action, obligation, and sector tables. Read-only once built.
#[derive(Debug, Clone)]
pub struct Catalog {
    risks: Vec<Risk>,
    actions: Vec<Action>,
    obligations: Vec<Obligation>,
    sectors: Vec<SectorProfile>,
    risk_index: HashMap<String, usize>,
    action_index: HashMap<String, usize>,
    obligation_index: HashMap<String, usize>,
    sector_index: HashMap<String, usize>,
    actions_by_risk: HashMap<String, Vec<usize>>,
}

impl Catalog {
    pub fn new(
        risks: Vec<Risk>,
        actions: Vec<Action>,
        obligations: Vec<Obligation>,
        sectors: Vec<SectorProfile>,
    ) -> Result<Self, CatalogError> {
        let risk_index = index_by("risk", &risks, |risk| risk.id.clone())?;
        let action_index = index_by("action", &actions, |action| action.id.clone())?;
        let obligation_index = index_by("obligation", &obligations, |obligation| {
            obligation.id.clone()
        })?;
        let sector_index = index_by("sector", &sectors, |profile| {
            normalize_sector_code(&profile.sector_code)
        })?;

        let mut actions_by_risk: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, action) in actions.iter().enumerate() {
            for risk_id in action.covered_risks() {
                if !risk_index.contains_key(risk_id) {
                    debug!(action = %action.id, risk = %risk_id, "action references unknown risk");
                }
                let positions = actions_by_risk.entry(risk_id.to_string()).or_default();
                if !positions.contains(&position) {
                    positions.push(position);
                }
            }
        }

        Ok(Self {
            risks,
            actions,
            obligations,
            sectors,
            risk_index,
            action_index,
            obligation_index,
            sector_index,
            actions_by_risk,
        })
    }

    /// Catalog compiled into the crate.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_source(&ConfigSource::Embedded)
    }

    pub fn from_source(source: &ConfigSource) -> Result<Self, CatalogError> {
        Self::new(
            source.parse(CatalogFile::Risks)?,
            source.parse(CatalogFile::Actions)?,
            source.parse(CatalogFile::Obligations)?,
            source.parse(CatalogFile::Sectors)?,
        )
    }

    pub fn risks(&self) -> &[Risk] {
        &self.risks
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn obligations(&self) -> &[Obligation] {
        &self.obligations
    }

    pub fn sectors(&self) -> &[SectorProfile] {
        &self.sectors
    }

    pub fn risk(&self, id: &str) -> Option<&Risk> {
        self.risk_index.get(id).map(|&position| &self.risks[position])
    }

    pub fn action(&self, id: &str) -> Option<&Action> {
        self.action_index
            .get(id)
            .map(|&position| &self.actions[position])
    }

    pub fn obligation(&self, id: &str) -> Option<&Obligation> {
        self.obligation_index
            .get(id)
            .map(|&position| &self.obligations[position])
    }

    /// Catalog actions whose primary or secondary risk is `risk_id`, in catalog order.
    pub fn actions_for_risk<'a>(&'a self, risk_id: &str) -> impl Iterator<Item = &'a Action> + 'a {
        self.actions_by_risk
            .get(risk_id)
            .into_iter()
            .flatten()
            .map(move |&position| &self.actions[position])
    }

    /// Longest matching prefix of the normalized code wins, so `56.10A` finds a `5610A`
    /// profile before `5610` and `56`. Codes with a leading letter fall back to their two-digit
    /// division. Unknown codes yield `None`; callers fall back to the default risk set.
    pub fn sector_profile(&self, code: &str) -> Option<&SectorProfile> {
        let normalized = normalize_sector_code(code);
        if normalized.is_empty() {
            return None;
        }

        let longest_prefix = (1..=normalized.len())
            .rev()
            .filter_map(|end| normalized.get(..end))
            .find_map(|prefix| self.sector_index.get(prefix));
        if let Some(&position) = longest_prefix {
            return Some(&self.sectors[position]);
        }

        sector::division_of(&normalized)
            .and_then(|division| self.sector_index.get(division))
            .map(|&position| &self.sectors[position])
    }
}

fn index_by<T, F>(
    kind: &'static str,
    entries: &[T],
    key: F,
) -> Result<HashMap<String, usize>, CatalogError>
where
    F: Fn(&T) -> String,
{
    let mut index = HashMap::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let id = key(entry);
        if id.trim().is_empty() {
            return Err(CatalogError::MissingId { kind });
        }
        if index.insert(id.clone(), position).is_some() {
            return Err(CatalogError::DuplicateId { kind, id });
        }
    }
    Ok(index)
}
