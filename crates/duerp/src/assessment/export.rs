//! `;`-delimited sheets for spreadsheet users: the consolidated action plan and the per-unit
//! evaluation listing.

use std::collections::BTreeSet;
use std::io::{Read, Write};

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use super::document::DuerpDocument;
use super::domain::{ActionPlan, AssessmentContext, PlanPriority, RiskEvaluation};
use super::plan::PlanBuilder;

const DELIMITER: u8 = b';';
const RISK_SEPARATOR: &str = ",";
const NO_ACTION: &str = "Aucune action";
const PLAN_SECTION_TITLE: &str = "Plan d'action consolide";

pub const PLAN_HEADER: [&str; 4] = ["Action", "Score", "Risques couverts", "Priorite"];
pub const EVALUATION_HEADER: [&str; 6] = ["Risque", "Unite", "Score", "Priorite", "Action", "Impact"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv output is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("unknown plan priority '{0}'")]
    UnknownPriority(String),
    #[error("invalid plan score '{0}'")]
    InvalidWeight(String),
}

/// Row of the plan sheet as read back from disk. Titles are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRow {
    pub title: String,
    pub weight: u32,
    pub related_risk_ids: BTreeSet<String>,
    pub priority: Option<PlanPriority>,
}

pub fn write_plan_csv<W: Write>(plan: &ActionPlan, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(writer);
    write_plan_records(&mut csv_writer, plan)?;
    csv_writer.flush()?;
    Ok(())
}

pub fn plan_to_csv(plan: &ActionPlan) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_plan_csv(plan, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn read_plan_csv<R: Read>(reader: R) -> Result<Vec<PlanRow>, ExportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<RawPlanRow>() {
        let raw = record?;
        let weight = raw
            .weight
            .trim()
            .parse::<u32>()
            .map_err(|_| ExportError::InvalidWeight(raw.weight.clone()))?;
        let priority = match raw.priority.as_deref() {
            Some(label) => Some(
                PlanPriority::from_label(label)
                    .ok_or_else(|| ExportError::UnknownPriority(label.trim().to_string()))?,
            ),
            None => None,
        };

        rows.push(PlanRow {
            title: raw.title,
            weight,
            related_risk_ids: raw
                .related
                .split(RISK_SEPARATOR)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
            priority,
        });
    }
    Ok(rows)
}

/// One row per (evaluation, planned action); evaluations without an action get a single
/// `Aucune action` row. Actions are chosen exactly as the plan chooses them for `context`.
pub fn write_evaluations_csv<W: Write>(
    evaluations: &[RiskEvaluation],
    builder: &PlanBuilder<'_>,
    context: &AssessmentContext,
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(writer);
    csv_writer.write_record(EVALUATION_HEADER)?;
    write_evaluation_records(&mut csv_writer, evaluations, builder, context)?;
    csv_writer.flush()?;
    Ok(())
}

pub fn evaluations_to_csv(
    evaluations: &[RiskEvaluation],
    builder: &PlanBuilder<'_>,
    context: &AssessmentContext,
) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_evaluations_csv(evaluations, builder, context, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Evaluation sheet of every unit, a blank line, then the consolidated plan.
pub fn document_to_csv(
    document: &DuerpDocument,
    builder: &PlanBuilder<'_>,
) -> Result<String, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_writer(Vec::new());

    csv_writer.write_record(EVALUATION_HEADER)?;
    for unit in &document.units {
        let context = unit.unit.context(&document.sector_code);
        write_evaluation_records(&mut csv_writer, &unit.evaluations, builder, &context)?;
    }
    csv_writer.write_record([""])?;
    csv_writer.write_record([PLAN_SECTION_TITLE])?;
    write_plan_records(&mut csv_writer, &document.plan)?;

    let buffer = csv_writer.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(buffer)?)
}

fn write_plan_records<W: Write>(
    csv_writer: &mut csv::Writer<W>,
    plan: &ActionPlan,
) -> Result<(), ExportError> {
    csv_writer.write_record(PLAN_HEADER)?;
    for item in &plan.items {
        let related = item
            .related_risk_ids
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(RISK_SEPARATOR);
        csv_writer.write_record([
            item.action.title.as_str(),
            &item.weight.to_string(),
            &related,
            item.priority.label(),
        ])?;
    }
    Ok(())
}

fn write_evaluation_records<W: Write>(
    csv_writer: &mut csv::Writer<W>,
    evaluations: &[RiskEvaluation],
    builder: &PlanBuilder<'_>,
    context: &AssessmentContext,
) -> Result<(), ExportError> {
    let matches = builder.rule_matches(context);
    for evaluation in evaluations {
        let score = evaluation.score.to_string();
        let letter = evaluation.priority_letter.as_str();
        let actions = builder.actions_for(&evaluation.risk.id, context, &matches);

        if actions.is_empty() {
            csv_writer.write_record([
                evaluation.risk.name.as_str(),
                &evaluation.unit_name,
                &score,
                letter,
                NO_ACTION,
                "",
            ])?;
            continue;
        }

        for action in actions {
            csv_writer.write_record([
                evaluation.risk.name.as_str(),
                &evaluation.unit_name,
                &score,
                letter,
                &action.title,
                &action.impact,
            ])?;
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RawPlanRow {
    #[serde(rename = "Action")]
    title: String,
    #[serde(rename = "Score")]
    weight: String,
    #[serde(rename = "Risques couverts", default)]
    related: String,
    #[serde(rename = "Priorite", default, deserialize_with = "empty_string_as_none")]
    priority: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
