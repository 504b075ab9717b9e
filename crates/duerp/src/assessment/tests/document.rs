use chrono::{TimeZone, Utc};

use super::common::*;
use crate::assessment::document::{DocumentError, DocumentRequest, WorkUnit};

fn request(units: Vec<WorkUnit>) -> DocumentRequest {
    DocumentRequest {
        company_name: "Brasserie du Port".to_string(),
        year: 2025,
        sector_code: "56.10B".to_string(),
        units,
    }
}

fn kitchen_and_office() -> Vec<WorkUnit> {
    vec![
        WorkUnit::new("Cuisine").with_feature("cold_room", true),
        WorkUnit::new("Bureau"),
    ]
}

#[test]
fn document_evaluates_every_unit_and_merges_the_plan() {
    let engine = engine();

    let document = engine
        .generate_document(request(kitchen_and_office()))
        .expect("document generated");

    assert!(document.id.starts_with("duerp-"));
    assert_eq!(document.units.len(), 2);
    assert_eq!(document.units[0].unit.name, "Cuisine");
    assert!(document.units[0]
        .evaluations
        .iter()
        .all(|evaluation| evaluation.unit_name == "Cuisine"));

    let fire_total: u32 = document
        .evaluations()
        .filter(|evaluation| evaluation.risk.id == "R-INCENDIE")
        .map(|evaluation| evaluation.score)
        .sum();
    let storage = document
        .plan
        .item("A-INCENDIE-STOCKAGE")
        .expect("fire storage action planned");
    assert_eq!(storage.weight, fire_total);
    assert_eq!(storage.related_risk_ids, id_set(&["R-INCENDIE"]));

    let plan_ids: Vec<&str> = document
        .plan
        .items
        .iter()
        .map(|item| item.action.id.as_str())
        .collect();
    let mut unique = plan_ids.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), plan_ids.len());
}

#[test]
fn document_attaches_obligations_and_compliance() {
    let engine = engine();

    let document = engine
        .generate_document(request(kitchen_and_office()))
        .expect("document generated");

    let obligation_ids: Vec<&str> = document
        .obligations
        .iter()
        .map(|obligation| obligation.id.as_str())
        .collect();
    assert!(obligation_ids.contains(&"OB-RESTAU-HOTTES"));
    assert!(obligation_ids.contains(&"OB-COLD-MAINT"));
    assert_eq!(document.compliance.missing, ids(["OB-ECRAN-ORGANISATION"]));
}

#[test]
fn document_history_starts_with_a_system_entry() {
    let engine = engine();

    let mut document = engine
        .generate_document(request(kitchen_and_office()))
        .expect("document generated");

    assert_eq!(document.history.len(), 1);
    assert_eq!(document.history[0].user, "system");
    assert_eq!(document.history[0].at, document.created_at);

    let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
    document.record_change("c.martin", "Ajout du risque routier", at);

    let last = document.last_change().expect("history entry");
    assert_eq!(last.user, "c.martin");
    assert_eq!(last.at, at);
    assert_eq!(document.history.len(), 2);
}

#[test]
fn document_ids_are_sequential_and_distinct() {
    let engine = engine();

    let first = engine
        .generate_document(request(vec![WorkUnit::new("Salle")]))
        .expect("first document");
    let second = engine
        .generate_document(request(vec![WorkUnit::new("Salle")]))
        .expect("second document");

    assert_ne!(first.id, second.id);
}

#[test]
fn invalid_requests_are_rejected() {
    let engine = engine();

    assert_eq!(
        engine.generate_document(request(Vec::new())).err(),
        Some(DocumentError::NoUnits)
    );
    assert_eq!(
        engine
            .generate_document(request(vec![WorkUnit::new("Cuisine"), WorkUnit::new("cuisine ")]))
            .err(),
        Some(DocumentError::DuplicateUnit("cuisine ".to_string()))
    );

    let mut anonymous = request(kitchen_and_office());
    anonymous.company_name = "  ".to_string();
    assert_eq!(
        engine.generate_document(anonymous).err(),
        Some(DocumentError::MissingCompany)
    );
}
