use crate::borg::{Borg, STATE_KEY};
use crate::error::BorgError;
use crate::shared_state::SharedState;
use colored::Colorize;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUILTIN_SCENARIO: &str = include_str!("../scenarios/borg.toml");

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Step {step}: handle '{handle}' was never constructed")]
    UnknownHandle { handle: String, step: usize },

    #[error("Step {step}: handle '{handle}' is already constructed")]
    DuplicateHandle { handle: String, step: usize },

    #[error(transparent)]
    Attribute(#[from] BorgError),
}

// =============================================================================
// Scenario description
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Construct {
        handle: String,
        #[serde(default)]
        state: Option<String>,
    },
    Set {
        handle: String,
        #[serde(default)]
        attribute: Option<String>,
        value: String,
    },
    Expect {
        handle: String,
        #[serde(default)]
        attribute: Option<String>,
        value: String,
    },
    Distinct {
        left: String,
        right: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// rm1..rm4 sharing one state; ships inside the binary.
    pub fn builtin() -> Result<Self, ScenarioError> {
        Self::from_toml(BUILTIN_SCENARIO)
    }
}

// =============================================================================
// Running and checking
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub step: usize,
    pub subject: String,
    pub expected: String,
    pub actual: String,
}

impl Check {
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub scenario: String,
    pub checks: Vec<Check>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(Check::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|check| !check.passed())
    }

    pub fn render(&self) -> String {
        let mut output = format!("{}\n{}\n", format!("Scenario: {}", self.scenario).bold(), "=".repeat(40));

        for check in &self.checks {
            let line = format!("{}: {}", check.subject, check.actual);
            if check.passed() {
                output.push_str(&format!("  {} {}\n", "✓".green(), line.green()));
            } else {
                output.push_str(&format!(
                    "  {} {} (expected {})\n",
                    "✗".red(),
                    line.red(),
                    check.expected.yellow()
                ));
            }
        }

        let passed = self.checks.len() - self.failures().count();
        output.push_str(&format!("Summary: {passed}/{} checks passed\n", self.checks.len()));
        output
    }
}

/// Executes steps against one family, keeping every constructed handle alive
/// so later steps can observe it.
pub struct ScenarioRunner {
    family: SharedState,
    handles: HashMap<String, Borg>,
}

impl ScenarioRunner {
    pub fn new(family: &SharedState) -> Self {
        Self {
            family: family.clone(),
            handles: HashMap::new(),
        }
    }

    fn handle(&self, name: &str, step: usize) -> Result<&Borg, ScenarioError> {
        self.handles.get(name).ok_or_else(|| ScenarioError::UnknownHandle {
            handle: name.to_string(),
            step,
        })
    }

    pub fn run(&mut self, scenario: &Scenario) -> Result<Report, ScenarioError> {
        let mut checks = Vec::new();

        for (index, step) in scenario.steps.iter().enumerate() {
            let step_no = index + 1;
            match step {
                Step::Construct { handle, state } => {
                    if self.handles.contains_key(handle) {
                        return Err(ScenarioError::DuplicateHandle {
                            handle: handle.clone(),
                            step: step_no,
                        });
                    }
                    let borg = Borg::in_family(&self.family, state.as_deref());
                    self.handles.insert(handle.clone(), borg);
                }
                Step::Set {
                    handle,
                    attribute,
                    value,
                } => {
                    let borg = self.handle(handle, step_no)?;
                    match attribute {
                        Some(name) => borg.set_attr(name.as_str(), value.as_str()),
                        None => borg.set_state(value.as_str()),
                    }
                }
                Step::Expect {
                    handle,
                    attribute,
                    value,
                } => {
                    let borg = self.handle(handle, step_no)?;
                    let (subject, actual) = match attribute {
                        Some(name) if name != STATE_KEY => {
                            (format!("{handle}.{name}"), render_value(borg.get_attr(name)?))
                        }
                        _ => (handle.clone(), borg.to_string()),
                    };
                    checks.push(Check {
                        step: step_no,
                        subject,
                        expected: value.clone(),
                        actual,
                    });
                }
                Step::Distinct { left, right } => {
                    let same = self.handle(left, step_no)?.is(self.handle(right, step_no)?);
                    checks.push(Check {
                        step: step_no,
                        subject: format!("{left} is {right}"),
                        expected: "false".to_string(),
                        actual: same.to_string(),
                    });
                }
            }
        }

        Ok(Report {
            scenario: scenario.name.clone(),
            checks,
        })
    }
}

fn render_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
