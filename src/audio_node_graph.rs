//! AudioNodeGraph - block-based audio graph for one soundscape
//!
//! Nodes are added one by one, then `build_processor` fixes the execution
//! order. After that the graph renders arbitrary-length buffers by chunking
//! them into blocks, and exposes the node lifecycle (start, stop,
//! disconnect) and parameter automation to the playback layer.

use crate::audio_node::{AudioNode, NodeId, ProcessContext};
use crate::block_processor::{BlockProcessor, SourceState};
use crate::error::{NodeError, Result, SoundscapeError};
use crate::nodes::param::ParamNode;

/// Block-based audio graph using the AudioNode trait
///
/// # Example
/// ```ignore
/// let mut graph = AudioNodeGraph::new(44100.0, 512);
///
/// let rate = graph.add_audio_node(Box::new(ConstantNode::new(4.0)));
/// let lfo = graph.add_audio_node(Box::new(OscillatorNode::new(rate, Waveform::Triangle)));
/// graph.set_output(lfo);
/// graph.build_processor()?;
/// graph.start_node(lfo)?;
///
/// let mut buffer = vec![0.0; 1000];
/// graph.render_into(&mut buffer);
/// ```
pub struct AudioNodeGraph {
    /// Nodes waiting for `build_processor`
    audio_nodes: Vec<Box<dyn AudioNode>>,

    /// Sample rate (e.g., 44100.0)
    sample_rate: f32,

    /// Frames rendered since the processor was built
    sample_count: u64,

    /// Node whose output is the graph's output
    output_node: Option<NodeId>,

    /// Block processor (created after all nodes added)
    block_processor: Option<BlockProcessor>,

    /// Largest block handed to the processor
    block_size: usize,
}

impl AudioNodeGraph {
    /// Create an empty graph
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz (e.g., 44100.0)
    /// * `block_size` - Largest block processed in one pass
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            audio_nodes: Vec::new(),
            sample_rate,
            sample_count: 0,
            output_node: None,
            block_processor: None,
            block_size: block_size.max(1),
        }
    }

    /// Add an audio node to the graph
    ///
    /// Returns the NodeId that can be used to reference this node
    pub fn add_audio_node(&mut self, node: Box<dyn AudioNode>) -> NodeId {
        let node_id = self.audio_nodes.len();
        self.audio_nodes.push(node);
        node_id
    }

    /// Set the output node
    pub fn set_output(&mut self, node_id: NodeId) {
        self.output_node = Some(node_id);
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Get the block size
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Frames rendered so far
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Build the block processor from accumulated nodes
    ///
    /// Must be called after all nodes are added and before processing.
    ///
    /// # Errors
    /// - If no output node is set
    /// - If the graph has a cycle or a dangling input
    /// - If the processor was already built
    pub fn build_processor(&mut self) -> Result<()> {
        if self.block_processor.is_some() {
            return Err(SoundscapeError::Graph("Processor already built".to_string()));
        }

        let output_node = self.output_node.ok_or_else(|| {
            SoundscapeError::Graph("No output node set (use set_output)".to_string())
        })?;

        // Nodes move into the processor; trait objects can't be cloned
        let nodes = std::mem::take(&mut self.audio_nodes);
        self.block_processor = Some(BlockProcessor::new(nodes, output_node, self.block_size)?);
        self.sample_count = 0;

        Ok(())
    }

    /// Process one block of at most `block_size` frames
    ///
    /// # Errors
    /// - If build_processor() hasn't been called
    /// - If the buffer is larger than the block size
    pub fn process_buffer(&mut self, buffer: &mut [f32]) -> Result<()> {
        if buffer.len() > self.block_size {
            return Err(SoundscapeError::Graph(format!(
                "Buffer of {} frames exceeds block size {}",
                buffer.len(),
                self.block_size
            )));
        }

        let block_processor = self.block_processor.as_mut().ok_or_else(|| {
            SoundscapeError::Graph(
                "build_processor() must be called before process_buffer()".to_string(),
            )
        })?;

        let context = ProcessContext::new(self.sample_count, buffer.len(), self.sample_rate);
        block_processor.process_block(buffer, &context);
        self.sample_count += buffer.len() as u64;

        Ok(())
    }

    /// Fill a buffer of any length, block by block
    ///
    /// An unbuilt graph renders silence. This is what the device callback
    /// calls, so it never fails.
    pub fn render_into(&mut self, buffer: &mut [f32]) {
        if self.block_processor.is_none() {
            buffer.fill(0.0);
            return;
        }

        for chunk in buffer.chunks_mut(self.block_size) {
            // Chunks never exceed block_size and the processor exists
            let result = self.process_buffer(chunk);
            debug_assert!(result.is_ok(), "chunked render failed: {:?}", result);
        }
    }

    /// Render `num_samples` frames into a new vector
    pub fn render(&mut self, num_samples: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; num_samples];
        self.render_into(&mut buffer);
        buffer
    }

    fn processor_mut(&mut self, node_id: NodeId) -> std::result::Result<&mut BlockProcessor, NodeError> {
        self.block_processor
            .as_mut()
            .ok_or(NodeError::UnknownNode(node_id))
    }

    /// Start a source node
    pub fn start_node(&mut self, node_id: NodeId) -> std::result::Result<(), NodeError> {
        self.processor_mut(node_id)?.start_node(node_id)
    }

    /// Stop a source node
    pub fn stop_node(&mut self, node_id: NodeId) -> std::result::Result<(), NodeError> {
        self.processor_mut(node_id)?.stop_node(node_id)
    }

    /// Disconnect a node from everything downstream
    pub fn disconnect_node(&mut self, node_id: NodeId) -> std::result::Result<(), NodeError> {
        self.processor_mut(node_id)?.disconnect_node(node_id)
    }

    /// Source state of a node (None for non-sources or before build)
    pub fn source_state(&self, node_id: NodeId) -> Option<SourceState> {
        self.block_processor
            .as_ref()
            .and_then(|p| p.source_state(node_id))
    }

    /// Whether a node is still connected (false before build)
    pub fn is_connected(&self, node_id: NodeId) -> bool {
        self.block_processor
            .as_ref()
            .map_or(false, |p| p.is_connected(node_id))
    }

    /// Access a parameter node for automation
    pub fn param_mut(&mut self, node_id: NodeId) -> Option<&mut ParamNode> {
        self.block_processor
            .as_mut()
            .and_then(|p| p.param_mut(node_id))
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        match &self.block_processor {
            Some(processor) => processor.node_count(),
            None => self.audio_nodes.len(),
        }
    }

    /// Check if the processor has been built
    pub fn is_ready(&self) -> bool {
        self.block_processor.is_some()
    }
}

impl Default for AudioNodeGraph {
    fn default() -> Self {
        Self::new(44100.0, 512)
    }
}
