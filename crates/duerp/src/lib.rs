//! Occupational risk assessment engine for the French DUERP (document unique d'evaluation
//! des risques professionnels).
//!
//! The [`assessment`] module holds the catalog, rule matcher, scoring function, and action
//! plan builder behind [`assessment::RiskEngine`]. Configuration, error handling, and
//! telemetry follow the same layout as the HTTP service that embeds the engine.

pub mod assessment;
pub mod config;
pub mod error;
pub mod telemetry;
