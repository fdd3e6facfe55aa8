//! Group force rules and scenario presets

pub mod matrix;
pub mod scenario;

pub use matrix::RuleMatrix;
pub use scenario::{GroupSpec, RuleSpec, Scenario, RANDOM_RULE_SPREAD};
