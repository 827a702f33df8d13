//! Behavior graph utilities.
//!
//! - `validate_graph`:     every dependency id and scenario name resolves
//! - `topological_sort`:   Kahn's algorithm, ties broken by insertion order
//! - `resolve_chain`:      depth-first precondition chain for one target
//! - `DependentsIndex`:    transitive reverse reachability, for skip cascades

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use vigil_contracts::{
    behavior::{Behavior, BehaviorMap},
    error::{VigilError, VigilResult},
};

use crate::context::VerificationContext;

/// Check that every declared dependency refers to a known behavior and,
/// when a scenario is requested, that the dependency declares it.
pub fn validate_graph(behaviors: &BehaviorMap) -> VigilResult<()> {
    for behavior in behaviors.values() {
        for dep in &behavior.dependencies {
            let target = behaviors.get(&dep.behavior_id).ok_or_else(|| {
                VigilError::DependencyNotFound {
                    behavior: behavior.id.clone(),
                    dependency: dep.behavior_id.clone(),
                }
            })?;
            if let Some(name) = &dep.scenario_name {
                if target.scenario(Some(name)).is_none() {
                    return Err(VigilError::ScenarioNotFound {
                        behavior: target.id.clone(),
                        scenario: name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Order every behavior so each appears after all of its direct dependencies.
///
/// Nodes that become ready at the same time keep their insertion order.
///
/// # Errors
///
/// `DependencyNotFound` for an edge to an unknown id, and `CycleDetected`
/// (naming every node left unscheduled) when the graph is not acyclic.
pub fn topological_sort(behaviors: &BehaviorMap) -> VigilResult<Vec<String>> {
    let mut in_degree: IndexMap<&str, usize> =
        behaviors.keys().map(|id| (id.as_str(), 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for behavior in behaviors.values() {
        for dep_id in behavior.dependency_ids() {
            if !behaviors.contains_key(dep_id) {
                return Err(VigilError::DependencyNotFound {
                    behavior: behavior.id.clone(),
                    dependency: dep_id.to_string(),
                });
            }
            *in_degree.entry(behavior.id.as_str()).or_insert(0) += 1;
            dependents.entry(dep_id).or_default().push(behavior.id.as_str());
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(behaviors.len());

    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        for dependent in dependents.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(*dependent);
                }
            }
        }
    }

    if order.len() < behaviors.len() {
        let scheduled: HashSet<&str> = order.iter().map(String::as_str).collect();
        let unresolved = behaviors
            .keys()
            .filter(|id| !scheduled.contains(id.as_str()))
            .cloned()
            .collect();
        return Err(VigilError::CycleDetected { unresolved });
    }

    debug!(count = order.len(), "topological order computed");
    Ok(order)
}

/// One entry of a dependency chain: the behavior and the scenario to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink<'a> {
    pub behavior: &'a Behavior,
    /// Scenario requested by the dependent; `None` selects the first one.
    pub scenario_name: Option<String>,
}

/// Resolve the ordered, deduplicated chain needed to reach `target`.
///
/// Dependencies are visited depth-first in declaration order; the chain ends
/// with the target itself. When a node is reached twice, its first
/// occurrence (and scenario selection) wins.
///
/// A cycle does not fail resolution: each node appears at most once and the
/// chain may be incomplete. Every truncated back-edge is logged at `warn`.
pub fn resolve_chain<'a>(target: &str, behaviors: &'a BehaviorMap) -> VigilResult<Vec<ChainLink<'a>>> {
    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();
    let mut chain = Vec::new();
    visit_chain(
        target,
        None,
        target,
        behaviors,
        &mut visited,
        &mut in_progress,
        &mut chain,
    )?;
    Ok(chain)
}

fn visit_chain<'a>(
    id: &str,
    scenario_name: Option<String>,
    requested_by: &str,
    behaviors: &'a BehaviorMap,
    visited: &mut HashSet<String>,
    in_progress: &mut HashSet<String>,
    chain: &mut Vec<ChainLink<'a>>,
) -> VigilResult<()> {
    if !visited.insert(id.to_string()) {
        if in_progress.contains(id) {
            warn!(
                behavior_id = %id,
                requested_by = %requested_by,
                "dependency cycle truncated while resolving chain"
            );
        }
        return Ok(());
    }

    let behavior = behaviors
        .get(id)
        .ok_or_else(|| VigilError::DependencyNotFound {
            behavior: requested_by.to_string(),
            dependency: id.to_string(),
        })?;

    in_progress.insert(id.to_string());
    for dep in &behavior.dependencies {
        visit_chain(
            &dep.behavior_id,
            dep.scenario_name.clone(),
            id,
            behaviors,
            visited,
            in_progress,
            chain,
        )?;
    }
    in_progress.remove(id);

    chain.push(ChainLink {
        behavior,
        scenario_name,
    });
    Ok(())
}

/// For every behavior, the set of behaviors that transitively depend on it.
#[derive(Debug, Clone, Default)]
pub struct DependentsIndex {
    dependents: IndexMap<String, IndexSet<String>>,
}

impl DependentsIndex {
    /// Precompute the transitive dependents of every node.
    ///
    /// Acyclic graphs take one pass in reverse topological order, each node
    /// unioning the sets its direct dependents already hold, so every edge is
    /// followed once. Graphs that cannot be sorted fall back to a BFS per
    /// node. Edges to unknown ids are ignored.
    pub fn build(behaviors: &BehaviorMap) -> Self {
        let mut direct: HashMap<&str, Vec<&str>> = HashMap::new();
        for behavior in behaviors.values() {
            for dep_id in behavior.dependency_ids() {
                direct.entry(dep_id).or_default().push(behavior.id.as_str());
            }
        }

        let dependents = match topological_sort(behaviors) {
            Ok(order) => Self::union_in_reverse(&order, &direct),
            Err(e) => {
                debug!(error = %e, "graph not sortable, indexing dependents by search");
                Self::search_each(behaviors, &direct)
            }
        };

        // Keep the behavior map's key order for deterministic iteration.
        let dependents = behaviors
            .keys()
            .map(|id| (id.clone(), dependents.get(id).cloned().unwrap_or_default()))
            .collect();
        Self { dependents }
    }

    fn union_in_reverse(
        order: &[String],
        direct: &HashMap<&str, Vec<&str>>,
    ) -> HashMap<String, IndexSet<String>> {
        let mut dependents: HashMap<String, IndexSet<String>> = HashMap::with_capacity(order.len());
        for id in order.iter().rev() {
            let mut reached = IndexSet::new();
            for next in direct.get(id.as_str()).into_iter().flatten() {
                reached.insert(next.to_string());
                if let Some(further) = dependents.get(*next) {
                    reached.extend(further.iter().cloned());
                }
            }
            dependents.insert(id.clone(), reached);
        }
        dependents
    }

    fn search_each(
        behaviors: &BehaviorMap,
        direct: &HashMap<&str, Vec<&str>>,
    ) -> HashMap<String, IndexSet<String>> {
        let mut dependents = HashMap::with_capacity(behaviors.len());
        for id in behaviors.keys() {
            let mut reached: IndexSet<String> = IndexSet::new();
            let mut queue: VecDeque<&str> = VecDeque::from([id.as_str()]);
            while let Some(current) = queue.pop_front() {
                for next in direct.get(current).into_iter().flatten() {
                    if *next != id.as_str() && reached.insert(next.to_string()) {
                        queue.push_back(*next);
                    }
                }
            }
            dependents.insert(id.clone(), reached);
        }
        dependents
    }

    /// Transitive dependents of `id`; empty for leaves and unknown ids.
    pub fn dependents_of(&self, id: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Add every transitive dependent of `failed_id` to the context's skip set.
    ///
    /// Returns how many behaviors were newly marked.
    pub fn cascade_skip(&self, failed_id: &str, context: &mut VerificationContext) -> usize {
        let mut marked = 0;
        for dependent in self.dependents_of(failed_id) {
            if context.mark_skipped(dependent, failed_id) {
                marked += 1;
            }
        }
        if marked > 0 {
            debug!(behavior_id = %failed_id, skipped = marked, "cascading skip to dependents");
        }
        marked
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
