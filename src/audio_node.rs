/// Block-based audio processing - core abstraction for the soundscape graph
///
/// This module defines the AudioNode trait. Nodes process whole buffers at
/// once; the graph hands each node the output buffers of its inputs.

use crate::nodes::param::ParamNode;

pub type NodeId = usize;

/// Context passed to all nodes during block processing
#[derive(Debug, Clone)]
pub struct ProcessContext {
    /// Frames rendered by this graph before the current block
    pub sample_offset: u64,

    /// Number of samples to process in this block (at most the configured block size)
    pub block_size: usize,

    /// Sample rate of the output device
    pub sample_rate: f32,
}

impl ProcessContext {
    /// Create a new process context
    pub fn new(sample_offset: u64, block_size: usize, sample_rate: f32) -> Self {
        Self {
            sample_offset,
            block_size,
            sample_rate,
        }
    }

    /// Graph time in seconds at a sample offset within the block
    pub fn time_at_offset(&self, offset: usize) -> f64 {
        (self.sample_offset + offset as u64) as f64 / self.sample_rate as f64
    }
}

/// Core trait for block-based audio processing
///
/// Every audio-producing entity implements this trait. The graph calls
/// `process_block` once per block in dependency order, so every buffer in
/// `inputs` is already computed for this block.
pub trait AudioNode: Send {
    /// Process an entire block of audio
    ///
    /// # Arguments
    /// * `inputs` - Input buffers, in the order returned by `input_nodes`
    /// * `output` - Output buffer to write to (length = block size)
    /// * `sample_rate` - Current sample rate
    /// * `context` - Processing context
    ///
    /// Implementations must not allocate: this runs on the device's audio thread.
    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        output: &mut [f32],
        sample_rate: f32,
        context: &ProcessContext,
    );

    /// Return list of input node IDs this node depends on
    ///
    /// Used for topological sorting and buffer routing. Empty vec for
    /// source nodes.
    fn input_nodes(&self) -> Vec<NodeId>;

    /// Get a human-readable name for this node (for debugging)
    fn name(&self) -> &str {
        "AudioNode"
    }

    /// True for nodes with a start/stop lifecycle (buffer sources, oscillators)
    ///
    /// A source emits silence until started and after being stopped.
    fn is_source(&self) -> bool {
        false
    }

    /// Downcast hook for parameter nodes that accept automation
    fn as_param_mut(&mut self) -> Option<&mut ParamNode> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_context_time_at_offset() {
        let ctx = ProcessContext::new(44100, 512, 44100.0);

        assert!((ctx.time_at_offset(0) - 1.0).abs() < 1e-9);
        assert!((ctx.time_at_offset(441) - 1.01).abs() < 1e-9);
    }
}
