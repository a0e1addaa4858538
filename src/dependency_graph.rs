/// Dependency graph analysis for audio node execution
///
/// Determines the order in which nodes run so every node sees its inputs
/// already computed for the current block.

use crate::audio_node::{AudioNode, NodeId};
use crate::error::{Result, SoundscapeError};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Represents the audio processing dependency graph
///
/// # Graph Structure
/// - Nodes: Audio processing nodes (sources, filters, gains, params)
/// - Edges: Dependencies (data flow from input → dependent)
///
/// Soundscape graphs contain no delay nodes, so a cycle can never be
/// resolved and is rejected when the graph is built.
pub struct DependencyGraph {
    graph: DiGraph<NodeId, ()>,
    node_map: HashMap<NodeId, NodeIndex>,
    order: Vec<NodeId>,
}

impl DependencyGraph {
    /// Build dependency graph from audio nodes
    ///
    /// # Errors
    /// - If a node references a non-existent input
    /// - If there's a cycle in dependencies
    pub fn build(nodes: &[Box<dyn AudioNode>]) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for (node_id, _) in nodes.iter().enumerate() {
            let idx = graph.add_node(node_id);
            node_map.insert(node_id, idx);
        }

        for (node_id, node) in nodes.iter().enumerate() {
            let dependent_idx = node_map[&node_id];

            for input_id in node.input_nodes() {
                match node_map.get(&input_id) {
                    Some(&input_idx) => {
                        graph.add_edge(input_idx, dependent_idx, ());
                    }
                    None => {
                        return Err(SoundscapeError::Graph(format!(
                            "Node {} ({}) references non-existent input node {}",
                            node_id,
                            node.name(),
                            input_id
                        )));
                    }
                }
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| {
                SoundscapeError::Graph(format!(
                    "Cycle detected through node {}",
                    graph[cycle.node_id()]
                ))
            })?
            .into_iter()
            .map(|idx| graph[idx])
            .collect();

        Ok(Self {
            graph,
            node_map,
            order,
        })
    }

    /// Topologically sorted execution order
    pub fn execution_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Direct dependencies of a node
    pub fn dependencies(&self, node_id: NodeId) -> Vec<NodeId> {
        match self.node_map.get(&node_id) {
            Some(&node_idx) => self
                .graph
                .neighbors_directed(node_idx, Direction::Incoming)
                .map(|dep_idx| self.graph[dep_idx])
                .collect(),
            None => vec![],
        }
    }

    /// Number of nodes in graph
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges (dependencies) in graph
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
