use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// `name` or `name=true|false`; a bare name switches the feature on.
pub(crate) fn parse_feature(raw: &str) -> Result<(String, bool), String> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (raw.trim(), None),
    };
    if name.is_empty() {
        return Err(format!("feature '{raw}' has no name"));
    }

    let enabled = match value.map(str::to_ascii_lowercase).as_deref() {
        None | Some("true") | Some("yes") | Some("1") => true,
        Some("false") | Some("no") | Some("0") => false,
        Some(other) => return Err(format!("feature '{name}' has invalid value '{other}'")),
    };
    Ok((name.to_string(), enabled))
}

/// `RISK-ID=delta`, e.g. `R-BRUIT=-1`.
pub(crate) fn parse_modifier(raw: &str) -> Result<(String, i32), String> {
    let (risk_id, delta) = raw
        .split_once('=')
        .ok_or_else(|| format!("modifier '{raw}' must look like RISK-ID=delta"))?;
    let risk_id = risk_id.trim();
    if risk_id.is_empty() {
        return Err(format!("modifier '{raw}' has no risk id"));
    }
    let delta = delta
        .trim()
        .parse::<i32>()
        .map_err(|err| format!("modifier '{raw}' has an invalid delta ({err})"))?;
    Ok((risk_id.to_string(), delta))
}
