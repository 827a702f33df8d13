//! Behavior graph model.
//!
//! A graph source hands the runtime a fully populated `BehaviorMap` at the
//! start of a run. The runtime never mutates it afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// All behaviors of one run, keyed by `Behavior::id`.
///
/// Insertion order is significant: it breaks ties in the topological
/// scheduler, so the same graph source always yields the same schedule.
pub type BehaviorMap = IndexMap<String, Behavior>;

/// A named, independently verifiable unit of application functionality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    /// Stable slug, unique within one run (e.g. "create-item").
    pub id: String,
    /// Human-readable name used in reports (e.g. "Create Item").
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Preconditions, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    pub scenarios: Vec<Scenario>,
    /// Optional in-app location hint used for soft navigation.
    #[serde(default)]
    pub page_path: Option<String>,
}

impl Behavior {
    /// Start a behavior with no dependencies, scenarios, or page hint.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            dependencies: Vec::new(),
            scenarios: Vec::new(),
            page_path: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a dependency that runs the dependency's first scenario.
    pub fn depends_on(mut self, behavior_id: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::new(behavior_id));
        self
    }

    /// Add a dependency that runs a specific named scenario.
    pub fn depends_on_scenario(
        mut self,
        behavior_id: impl Into<String>,
        scenario: impl Into<String>,
    ) -> Self {
        self.dependencies
            .push(Dependency::new(behavior_id).with_scenario(scenario));
        self
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    pub fn at_page(mut self, path: impl Into<String>) -> Self {
        self.page_path = Some(path.into());
        self
    }

    /// Ids of every direct dependency, in declaration order.
    pub fn dependency_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.behavior_id.as_str())
    }

    /// Select the scenario named `name`, or the first scenario when `name` is `None`.
    pub fn scenario(&self, name: Option<&str>) -> Option<&Scenario> {
        match name {
            Some(name) => self.scenarios.iter().find(|s| s.name == name),
            None => self.scenarios.first(),
        }
    }
}

/// An edge from a dependent to one of its preconditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub behavior_id: String,
    /// Scenario of the dependency to run; `None` selects its first scenario.
    #[serde(default)]
    pub scenario_name: Option<String>,
}

impl Dependency {
    pub fn new(behavior_id: impl Into<String>) -> Self {
        Self {
            behavior_id: behavior_id.into(),
            scenario_name: None,
        }
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario_name = Some(scenario.into());
        self
    }
}

/// One concrete, steppable execution path satisfying a behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn act(mut self, instruction: impl Into<String>) -> Self {
        self.steps.push(Step::Act {
            instruction: instruction.into(),
        });
        self
    }

    pub fn check(mut self, instruction: impl Into<String>) -> Self {
        self.steps.push(Step::Check {
            instruction: instruction.into(),
        });
        self
    }
}

/// A single scenario step.
///
/// `Act` is an imperative instruction carried out by the action executor.
/// `Check` is a natural-language condition evaluated by the check verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Act { instruction: String },
    Check { instruction: String },
}

impl Step {
    pub fn instruction(&self) -> &str {
        match self {
            Step::Act { instruction } | Step::Check { instruction } => instruction,
        }
    }

    pub fn is_act(&self) -> bool {
        matches!(self, Step::Act { .. })
    }
}
