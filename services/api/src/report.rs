use crate::infra::{parse_date, parse_feature, parse_modifier};
use chrono::{Local, NaiveDate};
use clap::Args;
use duerp::assessment::export::write_plan_csv;
use duerp::assessment::{schedule, AssessmentContext, ComputeBundle, RiskEngine, DEFAULT_RISK_IDS};
use duerp::config::AppConfig;
use duerp::error::AppError;
use std::fs::File;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ComputeArgs {
    /// NAF code of the company (e.g. 56.10A)
    #[arg(long, default_value = "47")]
    pub(crate) sector: String,
    /// Work unit to assess
    #[arg(long, default_value = "Magasin")]
    pub(crate) unit: String,
    /// Context feature, `name` or `name=false`. Repeatable.
    #[arg(long = "feature", value_parser = parse_feature)]
    pub(crate) features: Vec<(String, bool)>,
    /// Score adjustment for one risk, `RISK-ID=delta`. Repeatable.
    #[arg(long = "modifier", value_parser = parse_modifier)]
    pub(crate) modifiers: Vec<(String, i32)>,
    /// Write the action plan to this `;`-delimited CSV file
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Print the raw JSON bundle instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
    /// Start date for follow-up reminders (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct SectorArgs {
    /// NAF code to look up
    #[arg(long)]
    pub(crate) sector: String,
}

pub(crate) fn run_compute(args: ComputeArgs) -> Result<(), AppError> {
    let ComputeArgs {
        sector,
        unit,
        features,
        modifiers,
        csv,
        json,
        start,
    } = args;

    let engine = load_engine()?;
    for name in unknown_features(&engine, &features) {
        eprintln!("warning: no rule tests feature '{name}'; it has no effect");
    }

    let mut context = AssessmentContext::new(sector, unit);
    context.features.extend(features);
    context.modifiers.extend(modifiers);
    let bundle = engine.compute_with(&context);

    if let Some(path) = csv {
        let file = File::create(&path)?;
        write_plan_csv(&bundle.plan, file)?;
        println!("Plan d'action exporte vers {}", path.display());
    }

    if json {
        let stdout = std::io::stdout();
        serde_json::to_writer_pretty(stdout.lock(), &bundle).map_err(std::io::Error::from)?;
        println!();
        return Ok(());
    }

    let start = start.unwrap_or_else(|| Local::now().date_naive());
    render_bundle(&context, &bundle, start);
    Ok(())
}

pub(crate) fn run_sector_lookup(args: SectorArgs) -> Result<(), AppError> {
    let engine = load_engine()?;
    match engine.catalog().sector_profile(&args.sector) {
        Some(profile) => {
            println!("Secteur {} - {}", profile.sector_code, profile.label);
            println!("  Risques obligatoires : {}", profile.mandatory_risks.join(", "));
            println!("  Risques prioritaires : {}", profile.priority_risks.join(", "));
            println!(
                "  Actions recommandees : {}",
                profile.recommended_actions.join(", ")
            );
        }
        None => {
            println!("Aucun profil pour le code NAF '{}'", args.sector);
            println!("  Risques par defaut : {}", DEFAULT_RISK_IDS.join(", "));
        }
    }
    Ok(())
}

/// Requested feature names that no rule of the engine looks at, in request order.
fn unknown_features<'a>(engine: &RiskEngine, features: &'a [(String, bool)]) -> Vec<&'a str> {
    let known = engine.rules().known_features();
    let mut unknown: Vec<&str> = Vec::new();
    for (name, _) in features {
        if !known.contains(name.as_str()) && !unknown.contains(&name.as_str()) {
            unknown.push(name);
        }
    }
    unknown
}

fn load_engine() -> Result<RiskEngine, AppError> {
    let config = AppConfig::load()?;
    Ok(RiskEngine::from_config(&config.engine)?)
}

fn render_bundle(context: &AssessmentContext, bundle: &ComputeBundle, start: NaiveDate) {
    println!(
        "Evaluation DUERP - secteur {} / unite {}",
        context.sector_code, context.unit_name
    );

    println!("\nRisques evalues ({})", bundle.evaluations.len());
    for evaluation in &bundle.evaluations {
        println!(
            "  [{}] {:<28} score {:>3} (G{} x P{} x M{})",
            evaluation.priority_letter.as_str(),
            evaluation.risk.name,
            evaluation.score,
            evaluation.severity,
            evaluation.probability,
            evaluation.control,
        );
    }

    println!("\nPlan d'action ({} mesures)", bundle.plan.items.len());
    for item in &bundle.plan.items {
        let related: Vec<&str> = item.related_risk_ids.iter().map(String::as_str).collect();
        println!(
            "  {:<8} {:>4}  {} [{}]",
            item.priority.label(),
            item.weight,
            item.action.title,
            related.join(", ")
        );
    }

    if !bundle.obligations.is_empty() {
        println!("\nObligations applicables");
        for obligation in &bundle.obligations {
            match &obligation.reference {
                Some(reference) => println!("  - {} ({reference})", obligation.title),
                None => println!("  - {}", obligation.title),
            }
        }
    }

    let reminders = schedule::reminders(&bundle.plan, start);
    if !reminders.is_empty() {
        println!("\nRelances");
        for reminder in reminders {
            println!("  {}  {}", reminder.due, reminder.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(names: &[&str]) -> Vec<(String, bool)> {
        names.iter().map(|name| (name.to_string(), true)).collect()
    }

    #[test]
    fn misspelled_features_are_reported() {
        let engine = RiskEngine::embedded().expect("embedded catalog loads");
        let features = flags(&["solvent", "cold_room", "solvent", "night_shift"]);

        assert_eq!(
            unknown_features(&engine, &features),
            vec!["solvent", "night_shift"]
        );
    }

    #[test]
    fn rule_features_are_accepted() {
        let engine = RiskEngine::embedded().expect("embedded catalog loads");
        let features = flags(&["solvents", "machines", "outdoor_uv"]);

        assert!(unknown_features(&engine, &features).is_empty());
    }
}
