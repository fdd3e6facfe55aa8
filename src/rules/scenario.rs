//! Scenario presets: groups, their tunables and the rule matrix
//!
//! A scenario is construction-time data. `Engine::load_scenario` replaces the
//! population and rules with it.

use ahash::AHashSet;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{EngineError, Result};
use crate::core::types::Color;
use crate::entity::group::GroupStyle;
use crate::entity::particle::ParticleTunables;

/// Coefficient spread used by random rule matrices
pub const RANDOM_RULE_SPREAD: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub count: usize,
    #[serde(default)]
    pub style: GroupStyle,
    #[serde(default)]
    pub tunables: ParticleTunables,
}

/// `from` is pulled toward (positive) or pushed away from (negative) `to`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub from: String,
    pub to: String,
    pub coefficient: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl Scenario {
    /// Three colors chasing each other in a loop
    pub fn classic(per_group: usize) -> Self {
        let tunables = ParticleTunables::default()
            .with_force_radius(80.0)
            .with_friction(0.5);
        let group = |name: &str, color: Color| GroupSpec {
            name: name.to_string(),
            count: per_group,
            style: GroupStyle::new(color),
            tunables,
        };
        let rule = |from: &str, to: &str, coefficient: f32| RuleSpec {
            from: from.to_string(),
            to: to.to_string(),
            coefficient,
        };

        Self {
            name: "classic".to_string(),
            groups: vec![
                group("yellow", Color::from_rgb(255, 255, 0)),
                group("red", Color::from_rgb(255, 0, 0)),
                group("green", Color::from_rgb(0, 128, 0)),
            ],
            rules: vec![
                rule("green", "green", 0.32),
                rule("green", "red", 0.17),
                rule("green", "yellow", -0.34),
                rule("red", "red", 0.10),
                rule("red", "green", 0.34),
                rule("yellow", "yellow", -0.15),
                rule("yellow", "green", 0.20),
            ],
        }
    }

    /// Random colors, sizes, ranges and a full random rule matrix
    pub fn random<R: Rng>(groups: usize, per_group: usize, rng: &mut R) -> Self {
        let specs: Vec<GroupSpec> = (0..groups)
            .map(|n| GroupSpec {
                name: format!("group-{}", n),
                count: per_group,
                style: GroupStyle {
                    color: Color(rng.gen_range(0..0x1000000)),
                    opacity: rng.gen_range(0.5..=1.0),
                },
                tunables: ParticleTunables::default()
                    .with_size(rng.gen_range(0.3..0.6))
                    .with_force_radius(rng.gen_range(1.0..21.0)),
            })
            .collect();

        let mut rules = Vec::with_capacity(groups * groups);
        for from in &specs {
            for to in &specs {
                rules.push(RuleSpec {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    coefficient: rng.gen_range(-RANDOM_RULE_SPREAD..RANDOM_RULE_SPREAD),
                });
            }
        }

        Self {
            name: "random".to_string(),
            groups: specs,
            rules,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn total_particles(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = AHashSet::new();
        for group in &self.groups {
            if group.name.is_empty() || !names.insert(group.name.as_str()) {
                return Err(EngineError::InvalidConfig(format!(
                    "scenario '{}': group names must be unique and non-empty, got '{}'",
                    self.name, group.name
                )));
            }
            if !(0.0..=1.0).contains(&group.style.opacity) {
                return Err(EngineError::InvalidConfig(format!(
                    "scenario '{}': group '{}' opacity {} outside [0, 1]",
                    self.name, group.name, group.style.opacity
                )));
            }
            group.tunables.validate()?;
        }

        for rule in &self.rules {
            for name in [&rule.from, &rule.to] {
                if !names.contains(name.as_str()) {
                    return Err(EngineError::InvalidConfig(format!(
                        "scenario '{}': rule references unknown group '{}'",
                        self.name, name
                    )));
                }
            }
            if !rule.coefficient.is_finite() {
                return Err(EngineError::InvalidConfig(format!(
                    "scenario '{}': rule {} -> {} has non-finite coefficient",
                    self.name, rule.from, rule.to
                )));
            }
        }
        Ok(())
    }
}
