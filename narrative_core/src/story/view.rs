//! Read-only projections of the plot graph for UIs and the writer.
//!
//! Status here is structural: a node is `Activatable` when its
//! predecessors have fired, whether or not its condition holds yet.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{MacroDAG, PlotNode};

/// Fired-node descriptions are cut to this many characters.
const FIRED_SUMMARY_LEN: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Fired,
    Activatable,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualNode {
    pub id: String,
    pub description: String,
    pub status: NodeStatus,
    pub is_ending: bool,
    pub ending_text: Option<String>,
    pub condition: String,
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSummary {
    pub id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub is_ending: bool,
}

/// What the writer needs to know about the story so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriterDagContext {
    pub fired: Vec<PlotSummary>,
    pub activatable: Vec<PlotSummary>,
    /// Children of activatable nodes that are not yet activatable.
    pub upcoming: Vec<PlotSummary>,
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

impl MacroDAG {
    pub fn status_of(&self, node: &PlotNode) -> NodeStatus {
        if node.is_fired() {
            NodeStatus::Fired
        } else if self.is_candidate(&node.id) {
            NodeStatus::Activatable
        } else {
            NodeStatus::Locked
        }
    }

    pub fn visual_graph(&self) -> VisualGraph {
        let nodes: Vec<&PlotNode> = self.nodes();
        let edges = nodes
            .iter()
            .flat_map(|n| n.successors().iter().map(|s| (n.id.clone(), s.clone())))
            .collect();
        VisualGraph {
            nodes: nodes
                .into_iter()
                .map(|n| VisualNode {
                    id: n.id.clone(),
                    description: n.plot_description.clone(),
                    status: self.status_of(n),
                    is_ending: n.is_ending,
                    ending_text: n.ending_text.clone(),
                    condition: n.condition.source().to_string(),
                    predecessors: n.predecessors().to_vec(),
                    successors: n.successors().to_vec(),
                })
                .collect(),
            edges,
        }
    }

    pub fn writer_context(&self) -> WriterDagContext {
        let mut context = WriterDagContext::default();
        let mut activatable_ids = BTreeSet::new();

        for node in self.nodes() {
            match self.status_of(node) {
                NodeStatus::Fired => context.fired.push(PlotSummary {
                    id: node.id.clone(),
                    description: truncate(&node.plot_description, FIRED_SUMMARY_LEN),
                    condition: None,
                    is_ending: node.is_ending,
                }),
                NodeStatus::Activatable => {
                    activatable_ids.insert(node.id.clone());
                    context.activatable.push(PlotSummary {
                        id: node.id.clone(),
                        description: node.plot_description.clone(),
                        condition: Some(node.condition.source().to_string()),
                        is_ending: node.is_ending,
                    });
                }
                NodeStatus::Locked => {}
            }
        }

        let mut seen = BTreeSet::new();
        for id in &activatable_ids {
            let Some(parent) = self.node(id) else { continue };
            for child_id in parent.successors() {
                if activatable_ids.contains(child_id) || !seen.insert(child_id.clone()) {
                    continue;
                }
                if let Some(child) = self.node(child_id).filter(|c| !c.is_fired()) {
                    context.upcoming.push(PlotSummary {
                        id: child.id.clone(),
                        description: child.plot_description.clone(),
                        condition: Some(child.condition.source().to_string()),
                        is_ending: child.is_ending,
                    });
                }
            }
        }
        context
    }
}
