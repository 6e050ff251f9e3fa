use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::ModelError;
use crate::rule::Rule;

/// Dependency graph over rule internal IDs.
///
/// Edge semantics: if `A -> B` exists, rule A presupposes rule B.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<u32, BTreeSet<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Build the graph from every rule's `depends_on_internal` set.
    ///
    /// Every rule becomes a node, even without dependencies.
    pub fn from_rules(rules: &[Rule]) -> Result<Self, ModelError> {
        let mut edges = BTreeMap::new();
        for rule in rules {
            if edges
                .insert(rule.internal_id, rule.depends_on_internal.clone())
                .is_some()
            {
                return Err(ModelError::DuplicateInternalId(rule.internal_id));
            }
        }
        Ok(Self { edges })
    }

    pub fn contains(&self, node: u32) -> bool {
        self.edges.contains_key(&node)
    }

    /// Direct dependencies of a node.
    pub fn dependencies(&self, node: u32) -> Option<&BTreeSet<u32>> {
        self.edges.get(&node)
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|deps| deps.len()).sum()
    }

    /// Find every distinct cycle reachable by DFS, each reported in
    /// traversal order starting from the first node of the cycle met on the
    /// path. Cycles over the same node set are reported once.
    pub fn find_cycles(&self) -> Vec<Vec<u32>> {
        let mut state: HashMap<u32, Visit> = HashMap::new();
        let mut seen: BTreeSet<BTreeSet<u32>> = BTreeSet::new();
        let mut cycles = Vec::new();

        for &node in self.edges.keys() {
            if !state.contains_key(&node) {
                let mut path = Vec::new();
                self.dfs(node, &mut state, &mut path, &mut seen, &mut cycles);
            }
        }

        cycles
    }

    fn dfs(
        &self,
        node: u32,
        state: &mut HashMap<u32, Visit>,
        path: &mut Vec<u32>,
        seen: &mut BTreeSet<BTreeSet<u32>>,
        cycles: &mut Vec<Vec<u32>>,
    ) {
        state.insert(node, Visit::InProgress);
        path.push(node);

        if let Some(deps) = self.edges.get(&node) {
            for &next in deps {
                match state.get(&next) {
                    None => self.dfs(next, state, path, seen, cycles),
                    Some(Visit::InProgress) => {
                        let start = path.iter().position(|&n| n == next).unwrap_or(0);
                        let cycle = path[start..].to_vec();
                        if seen.insert(cycle.iter().copied().collect()) {
                            cycles.push(cycle);
                        }
                    }
                    Some(Visit::Done) => {}
                }
            }
        }

        path.pop();
        state.insert(node, Visit::Done);
    }
}

/// Diagnostics produced while resolving dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Each detected cycle as rule IDs in cycle order
    pub cycles: Vec<Vec<String>>,
}

impl ResolveReport {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Translate every rule's internal dependencies into assigned rule IDs and
/// report dependency cycles.
///
/// Requires IDs to be assigned already. An unknown internal reference is an
/// error; cycles are only logged and returned in the report. Running this
/// twice yields the same result.
pub fn resolve_dependencies(rules: &mut [Rule]) -> Result<ResolveReport, ModelError> {
    let graph = DependencyGraph::from_rules(rules)?;

    let mut assigned: HashMap<u32, String> = HashMap::with_capacity(rules.len());
    for rule in rules.iter() {
        let rule_id = rule
            .rule_id
            .clone()
            .ok_or(ModelError::UnassignedRuleId(rule.internal_id))?;
        assigned.insert(rule.internal_id, rule_id);
    }

    let mut resolved: Vec<BTreeSet<String>> = Vec::with_capacity(rules.len());
    for rule in rules.iter() {
        let mut ids = BTreeSet::new();
        for dependency in &rule.depends_on_internal {
            let rule_id = assigned
                .get(dependency)
                .ok_or(ModelError::UnknownDependency {
                    rule: rule.internal_id,
                    dependency: *dependency,
                })?;
            ids.insert(rule_id.clone());
        }
        resolved.push(ids);
    }

    for (rule, ids) in rules.iter_mut().zip(resolved) {
        rule.depends_on_ids = ids;
    }

    let mut report = ResolveReport::default();
    for cycle in graph.find_cycles() {
        let ids: Vec<String> = cycle
            .iter()
            .filter_map(|id| assigned.get(id).cloned())
            .collect();
        tracing::warn!("Detected dependency cycle: {}", ids.join(" -> "));
        report.cycles.push(ids);
    }

    Ok(report)
}
