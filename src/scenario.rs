//! Scenario files (v0.1)
//!
//! A scenario picks a strategy, optionally overrides the harness config,
//! and scripts the external events to replay:
//!
//! ```yaml
//! strategy: transitioned
//! config:
//!   expensive_tab_ms: 100
//! steps:
//!   - click: two
//!   - wait_ms: 10
//!   - click: three
//!   - type: ab
//!   - settle: true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::HarnessConfig;
use crate::error::{CadenceError, Result};
use crate::harness::{Strategy, Tab};

/// One external event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Press a tab button
    Click(Tab),
    /// Let time pass, running whatever comes due
    Wait(Duration),
    /// Type into the input, one change event per character
    Type(String),
    /// Press the log's clear control
    ClearLog,
    /// Call the child probe's public method
    Announce,
    /// Focus the input through its handle
    Focus,
    /// Post an array to the background worker
    Post(Vec<i64>),
    /// Make the next tab switch fail with this reason
    FailNextSwitch(String),
    /// Run every queued job
    Settle,
}

/// Step as written in YAML: exactly one field set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    click: Option<Tab>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wait_ms: Option<u64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clear: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    announce: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    focus: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    settle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    post: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fail: Option<String>,
}

impl RawStep {
    fn into_step(self, index: usize) -> Result<Option<Step>> {
        let mut found = Vec::new();
        if let Some(tab) = self.click {
            found.push(Some(Step::Click(tab)));
        }
        if let Some(ms) = self.wait_ms {
            found.push(Some(Step::Wait(Duration::from_millis(ms))));
        }
        if let Some(text) = self.text {
            found.push(Some(Step::Type(text)));
        }
        if let Some(items) = self.post {
            found.push(Some(Step::Post(items)));
        }
        if let Some(reason) = self.fail {
            found.push(Some(Step::FailNextSwitch(reason)));
        }
        // Flags set to false are kept as explicit no-ops
        for (flag, step) in [
            (self.clear, Step::ClearLog),
            (self.announce, Step::Announce),
            (self.focus, Step::Focus),
            (self.settle, Step::Settle),
        ] {
            if let Some(on) = flag {
                found.push(on.then_some(step));
            }
        }

        match found.len() {
            1 => Ok(found.pop().flatten()),
            0 => Err(CadenceError::InvalidScenario {
                reason: format!("step {} is empty", index + 1),
            }),
            n => Err(CadenceError::InvalidScenario {
                reason: format!("step {} sets {} actions, expected one", index + 1, n),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScenario {
    strategy: Strategy,
    #[serde(default)]
    config: HarnessConfig,
    #[serde(default)]
    steps: Vec<RawStep>,
}

/// Validated scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub strategy: Strategy,
    pub config: HarnessConfig,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse and validate a YAML scenario
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawScenario = serde_yaml::from_str(yaml)?;
        raw.config.validate()?;
        let steps = raw
            .steps
            .into_iter()
            .enumerate()
            .map(|(idx, step)| step.into_step(idx))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        Ok(Self {
            strategy: raw.strategy,
            config: raw.config,
            steps,
        })
    }

    /// Read and parse a scenario file (async to not block runtime)
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&yaml)
    }

    /// Built-in replay: a slow switch interrupted by a fast one, then typing
    pub fn demo(strategy: Strategy, config: HarnessConfig) -> Self {
        Self {
            strategy,
            config,
            steps: vec![
                Step::Click(Tab::Two),
                Step::Wait(Duration::from_millis(10)),
                Step::Click(Tab::Three),
                Step::Type("ab".to_string()),
                Step::Settle,
            ],
        }
    }

    /// Number of tab clicks in the script
    pub fn click_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Click(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_scenario() {
        let yaml = r#"
strategy: transitioned
config:
  expensive_tab_ms: 100
  log:
    max_entries: 50
steps:
  - click: two
  - wait_ms: 10
  - click: three
  - type: ab
  - focus: true
  - announce: true
  - clear: true
  - post: [1, 3, 5]
  - fail: render crashed
  - settle: true
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.strategy, Strategy::Transitioned);
        assert_eq!(scenario.config.expensive_tab_ms, 100);
        assert_eq!(scenario.config.recompute_ms, 250);
        assert_eq!(scenario.config.log.max_entries, Some(50));
        assert_eq!(
            scenario.steps,
            vec![
                Step::Click(Tab::Two),
                Step::Wait(Duration::from_millis(10)),
                Step::Click(Tab::Three),
                Step::Type("ab".to_string()),
                Step::Focus,
                Step::Announce,
                Step::ClearLog,
                Step::Post(vec![1, 3, 5]),
                Step::FailNextSwitch("render crashed".to_string()),
                Step::Settle,
            ]
        );
        assert_eq!(scenario.click_count(), 2);
    }

    #[test]
    fn zero_log_capacity_is_rejected() {
        let err = Scenario::from_yaml("strategy: pending\nconfig:\n  log:\n    max_entries: 0\n")
            .unwrap_err();
        assert!(matches!(err, CadenceError::ConfigError { .. }));
    }

    #[test]
    fn false_flags_are_skipped() {
        let scenario = Scenario::from_yaml("strategy: timeout\nsteps:\n  - settle: false\n").unwrap();
        assert!(scenario.steps.is_empty());
    }

    #[test]
    fn step_with_two_actions_is_rejected() {
        let err = Scenario::from_yaml("strategy: pending\nsteps:\n  - click: one\n    wait_ms: 5\n")
            .unwrap_err();
        assert!(matches!(err, CadenceError::InvalidScenario { .. }));
        assert!(err.to_string().contains("step 1 sets 2 actions"));
    }

    #[test]
    fn empty_step_is_rejected() {
        let err = Scenario::from_yaml("strategy: pending\nsteps:\n  - {}\n").unwrap_err();
        assert!(err.to_string().contains("step 1 is empty"));
    }

    #[test]
    fn unknown_tab_is_a_yaml_error() {
        let err = Scenario::from_yaml("strategy: pending\nsteps:\n  - click: four\n").unwrap_err();
        assert!(matches!(err, CadenceError::YamlParse(_)));
    }

    #[test]
    fn unknown_strategy_is_a_yaml_error() {
        let err = Scenario::from_yaml("strategy: eager\n").unwrap_err();
        assert!(matches!(err, CadenceError::YamlParse(_)));
    }

    #[test]
    fn demo_interrupts_the_expensive_tab() {
        let scenario = Scenario::demo(Strategy::Pending, HarnessConfig::default());
        assert_eq!(scenario.steps[0], Step::Click(Tab::Two));
        assert_eq!(scenario.click_count(), 2);
    }
}
