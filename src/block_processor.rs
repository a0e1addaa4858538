/// Block-based audio graph processor
///
/// Runs nodes in topological order, routes buffers between them, and tracks
/// each node's lifecycle (source start/stop, disconnection).

use crate::audio_node::{AudioNode, NodeId, ProcessContext};
use crate::dependency_graph::DependencyGraph;
use crate::error::{NodeError, Result, SoundscapeError};
use crate::nodes::param::ParamNode;

/// Playback state of a source node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Created, not yet started: emits silence
    Idle,
    /// Producing samples
    Playing,
    /// Stopped for good: emits silence, cannot restart
    Stopped,
}

#[derive(Debug, Clone, Copy)]
struct NodeLifecycle {
    source: Option<SourceState>,
    connected: bool,
}

impl NodeLifecycle {
    fn is_silent(&self) -> bool {
        !self.connected || matches!(self.source, Some(state) if state != SourceState::Playing)
    }
}

/// Block-based audio graph processor
///
/// # Example
/// ```ignore
/// let nodes: Vec<Box<dyn AudioNode>> = vec![
///     Box::new(ConstantNode::new(0.25)),
///     Box::new(OscillatorNode::new(0, Waveform::Sine)),
/// ];
///
/// let mut processor = BlockProcessor::new(nodes, 1, 512)?;
/// processor.start_node(1)?;
///
/// let mut output = vec![0.0; 512];
/// processor.process_block(&mut output, &context);
/// ```
pub struct BlockProcessor {
    nodes: Vec<Box<dyn AudioNode>>,
    inputs: Vec<Vec<NodeId>>,
    lifecycle: Vec<NodeLifecycle>,
    dependency_graph: DependencyGraph,
    node_outputs: Vec<Vec<f32>>,
    output_node: NodeId,
    buffer_size: usize,
}

impl BlockProcessor {
    /// Create a new block processor
    ///
    /// # Arguments
    /// * `nodes` - Vec of audio nodes
    /// * `output_node` - NodeId to use as final output
    /// * `buffer_size` - Largest block that will be processed
    ///
    /// # Errors
    /// - If output_node is invalid
    /// - If dependency graph cannot be built
    pub fn new(
        nodes: Vec<Box<dyn AudioNode>>,
        output_node: NodeId,
        buffer_size: usize,
    ) -> Result<Self> {
        if output_node >= nodes.len() {
            return Err(SoundscapeError::Graph(format!(
                "Invalid output node: {} (have {} nodes)",
                output_node,
                nodes.len()
            )));
        }

        let dependency_graph = DependencyGraph::build(&nodes)?;

        let inputs = nodes.iter().map(|node| node.input_nodes()).collect();
        let lifecycle = nodes
            .iter()
            .map(|node| NodeLifecycle {
                source: node.is_source().then_some(SourceState::Idle),
                connected: true,
            })
            .collect();
        let node_outputs = vec![vec![0.0; buffer_size]; nodes.len()];

        Ok(Self {
            nodes,
            inputs,
            lifecycle,
            dependency_graph,
            node_outputs,
            output_node,
            buffer_size,
        })
    }

    /// Process one block - graph traversed once
    ///
    /// `output.len()` may be anything up to the buffer size; partial blocks
    /// happen when the device asks for an odd number of frames.
    pub fn process_block(&mut self, output: &mut [f32], context: &ProcessContext) {
        let len = output.len();
        debug_assert!(
            len <= self.buffer_size,
            "Block of {} exceeds buffer size {}",
            len,
            self.buffer_size
        );

        for &node_id in self.dependency_graph.execution_order() {
            // Take the node's buffer out so inputs can be borrowed alongside it
            let mut node_buffer = std::mem::take(&mut self.node_outputs[node_id]);
            let block = &mut node_buffer[..len];

            if self.lifecycle[node_id].is_silent() {
                block.fill(0.0);
            } else {
                let input_buffers: Vec<&[f32]> = self.inputs[node_id]
                    .iter()
                    .map(|&id| &self.node_outputs[id][..len])
                    .collect();

                self.nodes[node_id].process_block(
                    &input_buffers,
                    block,
                    context.sample_rate,
                    context,
                );
            }

            self.node_outputs[node_id] = node_buffer;
        }

        output.copy_from_slice(&self.node_outputs[self.output_node][..len]);
    }

    /// Start a source node
    pub fn start_node(&mut self, node_id: NodeId) -> std::result::Result<(), NodeError> {
        let lifecycle = self
            .lifecycle
            .get_mut(node_id)
            .ok_or(NodeError::UnknownNode(node_id))?;

        match lifecycle.source {
            None => Err(NodeError::NotASource(node_id)),
            Some(SourceState::Idle) => {
                lifecycle.source = Some(SourceState::Playing);
                Ok(())
            }
            Some(SourceState::Playing) | Some(SourceState::Stopped) => {
                Err(NodeError::AlreadyStarted(node_id))
            }
        }
    }

    /// Stop a source node; stopped sources never restart
    pub fn stop_node(&mut self, node_id: NodeId) -> std::result::Result<(), NodeError> {
        let lifecycle = self
            .lifecycle
            .get_mut(node_id)
            .ok_or(NodeError::UnknownNode(node_id))?;

        match lifecycle.source {
            None => Err(NodeError::NotASource(node_id)),
            Some(SourceState::Idle) => Err(NodeError::NotStarted(node_id)),
            Some(SourceState::Stopped) => Err(NodeError::AlreadyStopped(node_id)),
            Some(SourceState::Playing) => {
                lifecycle.source = Some(SourceState::Stopped);
                Ok(())
            }
        }
    }

    /// Disconnect a node: it emits silence from the next block on
    pub fn disconnect_node(&mut self, node_id: NodeId) -> std::result::Result<(), NodeError> {
        let lifecycle = self
            .lifecycle
            .get_mut(node_id)
            .ok_or(NodeError::UnknownNode(node_id))?;

        if !lifecycle.connected {
            return Err(NodeError::AlreadyDisconnected(node_id));
        }
        lifecycle.connected = false;
        Ok(())
    }

    /// Source state of a node (None for non-source nodes)
    pub fn source_state(&self, node_id: NodeId) -> Option<SourceState> {
        self.lifecycle.get(node_id).and_then(|l| l.source)
    }

    /// Whether a node is still connected
    pub fn is_connected(&self, node_id: NodeId) -> bool {
        self.lifecycle.get(node_id).map_or(false, |l| l.connected)
    }

    /// Access a parameter node for automation
    pub fn param_mut(&mut self, node_id: NodeId) -> Option<&mut ParamNode> {
        self.nodes.get_mut(node_id).and_then(|node| node.as_param_mut())
    }

    /// Get number of nodes in graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get output node ID
    pub fn output_node(&self) -> NodeId {
        self.output_node
    }

    /// Largest block this processor accepts
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Get execution order (for debugging)
    pub fn execution_order(&self) -> &[NodeId] {
        self.dependency_graph.execution_order()
    }
}
