//! Plot node arena and the activation rules over it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use game_rules::condition::{self, Condition, ConditionContext, ConditionEvaluator};
use game_rules::{FunctionCall, PlotNodeDef};

use super::StoryError;

/// A single story beat.
///
/// Fires at most once. Only [`MacroDAG::partial_reset`] can un-fire it,
/// and never when it is an ending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotNode {
    pub id: String,
    #[serde(default)]
    pub plot_description: String,
    #[serde(with = "condition::shared", default = "condition::shared::always")]
    pub condition: Arc<Condition>,
    #[serde(default)]
    pub calls: Vec<FunctionCall>,
    #[serde(default)]
    pub is_ending: bool,
    #[serde(default)]
    pub ending_text: Option<String>,
    #[serde(default)]
    is_fired: bool,
    #[serde(default)]
    predecessors: Vec<String>,
    #[serde(default)]
    successors: Vec<String>,
}

impl PlotNode {
    /// Compiles `condition` up front; blank means always satisfied.
    pub fn new(
        id: impl Into<String>,
        plot_description: impl Into<String>,
        condition: &str,
    ) -> Result<Self, StoryError> {
        let id = id.into();
        let compiled = Condition::compile(condition).map_err(|source| {
            StoryError::InvalidCondition {
                node_id: id.clone(),
                source,
            }
        })?;
        Ok(Self {
            id,
            plot_description: plot_description.into(),
            condition: Arc::new(compiled),
            calls: Vec::new(),
            is_ending: false,
            ending_text: None,
            is_fired: false,
            predecessors: Vec::new(),
            successors: Vec::new(),
        })
    }

    pub fn from_def(def: &PlotNodeDef) -> Result<Self, StoryError> {
        let mut node = Self::new(&def.id, &def.plot_description, &def.condition)?;
        node.calls = def.calls.clone();
        node.is_ending = def.is_ending;
        node.ending_text = def.ending_text.clone();
        Ok(node)
    }

    pub fn ending(mut self, text: impl Into<String>) -> Self {
        self.is_ending = true;
        self.ending_text = Some(text.into());
        self
    }

    pub fn with_calls(mut self, calls: Vec<FunctionCall>) -> Self {
        self.calls = calls;
        self
    }

    pub fn is_fired(&self) -> bool {
        self.is_fired
    }

    pub fn predecessors(&self) -> &[String] {
        &self.predecessors
    }

    pub fn successors(&self) -> &[String] {
        &self.successors
    }
}

/// The story graph. Nodes live in an arena keyed by ID; edges are ID
/// lists on both ends.
///
/// Cycles are not detected. A node on a cycle can never have all of its
/// predecessors fired, so it simply never activates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PlotNode>", into = "Vec<PlotNode>")]
pub struct MacroDAG {
    nodes: HashMap<String, PlotNode>,
}

impl MacroDAG {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from world definitions: all nodes, then all edges.
    pub fn from_defs(defs: &[PlotNodeDef]) -> Result<Self, StoryError> {
        let mut dag = Self::new();
        for def in defs {
            dag.add_node(PlotNode::from_def(def)?)?;
        }
        for def in defs {
            for next in &def.next_nodes {
                dag.add_edge(&def.id, next)?;
            }
        }
        for warning in dag.validate_reachability() {
            tracing::warn!(%warning, "plot graph");
        }
        Ok(dag)
    }

    pub fn add_node(&mut self, mut node: PlotNode) -> Result<(), StoryError> {
        if self.nodes.contains_key(&node.id) {
            return Err(StoryError::DuplicateId(node.id));
        }
        node.predecessors.clear();
        node.successors.clear();
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Both ends must already exist. Adding the same edge twice is a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), StoryError> {
        for id in [from, to] {
            if !self.nodes.contains_key(id) {
                return Err(StoryError::NodeNotFound(id.to_string()));
            }
        }
        if let Some(node) = self.nodes.get_mut(from) {
            if !node.successors.iter().any(|s| s == to) {
                node.successors.push(to.to_string());
            }
        }
        if let Some(node) = self.nodes.get_mut(to) {
            if !node.predecessors.iter().any(|p| p == from) {
                node.predecessors.push(from.to_string());
            }
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&PlotNode> {
        self.nodes.get(id)
    }

    /// All nodes in ascending ID order.
    pub fn nodes(&self) -> Vec<&PlotNode> {
        let mut nodes: Vec<&PlotNode> = self.nodes.values().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn fired_ids(&self) -> BTreeSet<String> {
        self.nodes
            .values()
            .filter(|n| n.is_fired)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Unfired, with every predecessor fired. Roots qualify vacuously.
    fn is_unlocked(&self, node: &PlotNode) -> bool {
        !node.is_fired
            && node
                .predecessors
                .iter()
                .all(|p| self.nodes.get(p).is_some_and(|n| n.is_fired))
    }

    /// Unlocked nodes and their compiled conditions, in ascending ID order.
    ///
    /// Nothing is evaluated, so the result can be taken under a lock and
    /// evaluated after releasing it.
    pub fn activation_candidates(&self) -> Vec<(String, Arc<Condition>)> {
        self.nodes()
            .into_iter()
            .filter(|n| self.is_unlocked(n))
            .map(|n| (n.id.clone(), Arc::clone(&n.condition)))
            .collect()
    }

    /// Whether `id` is unlocked right now.
    pub fn is_candidate(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(|n| self.is_unlocked(n))
    }

    /// Evaluates one node's condition within the evaluator's time bound.
    pub fn check_condition(
        &self,
        id: &str,
        ctx: &Arc<ConditionContext>,
        evaluator: &ConditionEvaluator,
    ) -> Result<bool, StoryError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| StoryError::NodeNotFound(id.to_string()))?;
        evaluator
            .evaluate(&node.condition, ctx)
            .map_err(|source| StoryError::Condition {
                node_id: id.to_string(),
                source,
            })
    }

    /// Every unlocked node whose condition holds, in ascending ID order.
    /// The first evaluation failure aborts the whole call.
    pub fn get_activatable_nodes(
        &self,
        ctx: &Arc<ConditionContext>,
        evaluator: &ConditionEvaluator,
    ) -> Result<Vec<&PlotNode>, StoryError> {
        let mut ready = Vec::new();
        for (id, _) in self.activation_candidates() {
            if self.check_condition(&id, ctx, evaluator)? {
                if let Some(node) = self.nodes.get(&id) {
                    ready.push(node);
                }
            }
        }
        Ok(ready)
    }

    pub fn fire_node(&mut self, id: &str) -> Result<&PlotNode, StoryError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoryError::NodeNotFound(id.to_string()))?;
        if node.is_fired {
            tracing::debug!(node_id = %id, "plot node already fired");
        } else {
            node.is_fired = true;
            tracing::info!(node_id = %id, is_ending = node.is_ending, "plot node fired");
        }
        Ok(node)
    }

    /// Un-fires every non-ending node. Returns how many were reset.
    pub fn partial_reset(&mut self) -> usize {
        let mut reset = 0;
        for node in self.nodes.values_mut() {
            if node.is_fired && !node.is_ending {
                node.is_fired = false;
                reset += 1;
            }
        }
        reset
    }

    /// The fired ending, if the story is over.
    pub fn check_ending(&self) -> Option<&PlotNode> {
        self.nodes().into_iter().find(|n| n.is_ending && n.is_fired)
    }

    /// Warnings for nodes that can never fire because every predecessor
    /// is an ending.
    pub fn validate_reachability(&self) -> Vec<String> {
        self.nodes()
            .into_iter()
            .filter(|n| !n.predecessors.is_empty())
            .filter(|n| {
                n.predecessors
                    .iter()
                    .all(|p| self.nodes.get(p).is_some_and(|pred| pred.is_ending))
            })
            .map(|n| format!("node '{}' only has ending predecessors and is unreachable", n.id))
            .collect()
    }
}

impl TryFrom<Vec<PlotNode>> for MacroDAG {
    type Error = StoryError;

    /// Rebuilds the graph from a flat node list. Successor lists are the
    /// source of truth; predecessor lists are recomputed.
    fn try_from(nodes: Vec<PlotNode>) -> Result<Self, Self::Error> {
        let edges: Vec<(String, String)> = nodes
            .iter()
            .flat_map(|n| n.successors.iter().map(move |s| (n.id.clone(), s.clone())))
            .collect();
        let fired: Vec<String> = nodes
            .iter()
            .filter(|n| n.is_fired)
            .map(|n| n.id.clone())
            .collect();

        let mut dag = MacroDAG::new();
        for node in nodes {
            dag.add_node(node)?;
        }
        for (from, to) in edges {
            dag.add_edge(&from, &to)?;
        }
        for id in fired {
            if let Some(node) = dag.nodes.get_mut(&id) {
                node.is_fired = true;
            }
        }
        Ok(dag)
    }
}

impl From<MacroDAG> for Vec<PlotNode> {
    fn from(dag: MacroDAG) -> Self {
        let mut nodes: Vec<PlotNode> = dag.nodes.into_values().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn node(id: &str, condition: &str) -> PlotNode {
        PlotNode::new(id, format!("beat {}", id), condition).unwrap()
    }

    fn ctx() -> Arc<ConditionContext> {
        Arc::new(ConditionContext::default().with_stat("gold", 10))
    }

    fn ids(nodes: &[&PlotNode]) -> Vec<String> {
        nodes.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn test_add_node_and_edge_validation() {
        let mut dag = MacroDAG::new();
        dag.add_node(node("a", "")).unwrap();
        assert!(matches!(dag.add_node(node("a", "")), Err(StoryError::DuplicateId(_))));
        assert!(matches!(dag.add_edge("a", "b"), Err(StoryError::NodeNotFound(ref id)) if id == "b"));

        let err = PlotNode::new("bad", "", "stats.gold >").unwrap_err();
        assert!(matches!(err, StoryError::InvalidCondition { .. }));
    }

    #[test]
    fn test_chain_activation_order() {
        let mut dag = MacroDAG::new();
        dag.add_node(node("a", "")).unwrap();
        dag.add_node(node("b", "")).unwrap();
        dag.add_edge("a", "b").unwrap();
        let evaluator = ConditionEvaluator::default();

        assert_eq!(ids(&dag.get_activatable_nodes(&ctx(), &evaluator).unwrap()), vec!["a"]);
        dag.fire_node("a").unwrap();
        assert_eq!(ids(&dag.get_activatable_nodes(&ctx(), &evaluator).unwrap()), vec!["b"]);
        dag.fire_node("b").unwrap();
        assert!(dag.get_activatable_nodes(&ctx(), &evaluator).unwrap().is_empty());
    }

    #[test]
    fn test_conditions_gate_activation() {
        let mut dag = MacroDAG::new();
        dag.add_node(node("rich", "stats.gold > 50")).unwrap();
        dag.add_node(node("poor", "stats.gold < 20")).unwrap();
        dag.add_node(node("any", "True")).unwrap();
        let evaluator = ConditionEvaluator::default();

        let ready = dag.get_activatable_nodes(&ctx(), &evaluator).unwrap();
        assert_eq!(ids(&ready), vec!["any", "poor"]);
    }

    #[test]
    fn test_evaluation_failure_aborts() {
        let mut dag = MacroDAG::new();
        dag.add_node(node("a", "stats.missing > 1")).unwrap();
        dag.add_node(node("b", "")).unwrap();
        let evaluator = ConditionEvaluator::default();

        let err = dag.get_activatable_nodes(&ctx(), &evaluator).unwrap_err();
        assert!(err.is_evaluation_failure());
        assert!(matches!(dag.check_condition("b", &ctx(), &evaluator), Ok(true)));
        assert!(matches!(
            dag.check_condition("zzz", &ctx(), &evaluator),
            Err(StoryError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_partial_reset_keeps_endings() {
        let mut dag = MacroDAG::new();
        dag.add_node(node("a", "")).unwrap();
        dag.add_node(node("b", "")).unwrap();
        dag.add_node(node("end", "").ending("The realm falls.")).unwrap();
        dag.add_edge("a", "end").unwrap();
        for id in ["a", "b", "end"] {
            dag.fire_node(id).unwrap();
        }

        assert_eq!(dag.partial_reset(), 2);
        let expected: BTreeSet<String> = ["end".to_string()].into_iter().collect();
        assert_eq!(dag.fired_ids(), expected);
        assert_eq!(dag.partial_reset(), 0);
        assert!(dag.node("end").unwrap().is_fired());
        assert_eq!(dag.check_ending().map(|n| n.id.as_str()), Some("end"));
    }

    #[test]
    fn test_fire_missing_node() {
        let mut dag = MacroDAG::new();
        assert!(matches!(dag.fire_node("nope"), Err(StoryError::NodeNotFound(_))));
    }

    #[test]
    fn test_reachability_warnings() {
        let mut dag = MacroDAG::new();
        dag.add_node(node("end", "").ending("Over.")).unwrap();
        dag.add_node(node("after", "")).unwrap();
        dag.add_node(node("root", "")).unwrap();
        dag.add_edge("end", "after").unwrap();
        dag.add_edge("root", "end").unwrap();

        let warnings = dag.validate_reachability();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("after"));
    }

    #[test]
    fn test_cycle_never_activates() {
        let mut dag = MacroDAG::new();
        dag.add_node(node("x", "")).unwrap();
        dag.add_node(node("y", "")).unwrap();
        dag.add_edge("x", "y").unwrap();
        dag.add_edge("y", "x").unwrap();
        assert!(dag.activation_candidates().is_empty());
    }

    #[test]
    fn test_flat_list_round_trip() {
        let mut dag = MacroDAG::new();
        dag.add_node(node("a", "'rebel' in tags")).unwrap();
        dag.add_node(node("b", "day > 3").ending("Exile.")).unwrap();
        dag.add_edge("a", "b").unwrap();
        dag.fire_node("a").unwrap();

        let json = serde_json::to_value(&dag).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["condition"], "'rebel' in tags");

        let back: MacroDAG = serde_json::from_value(json).unwrap();
        assert_eq!(back, dag);
        assert_eq!(back.node("b").unwrap().predecessors(), ["a".to_string()]);

        let broken = serde_json::json!([{"id": "a", "condition": "day >"}]);
        assert!(serde_json::from_value::<MacroDAG>(broken).is_err());
    }

    #[test]
    fn test_long_condition_evaluates() {
        let mut dag = MacroDAG::new();
        let heavy = vec!["len(tags) * 3 % 7 < 100"; 60].join(" and ");
        dag.add_node(node("slow", &heavy)).unwrap();
        let evaluator = ConditionEvaluator::new(Duration::from_secs(5));
        assert!(dag.check_condition("slow", &ctx(), &evaluator).unwrap());
    }
}
