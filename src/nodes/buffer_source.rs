/// Buffer source node - looping playback of a noise buffer
///
/// The only audio-rate source in a soundscape graph. Reads the shared
/// [`NoiseBuffer`] sample by sample and wraps to the start at the end, so a
/// two-second buffer plays indefinitely.

use crate::audio_node::{AudioNode, NodeId, ProcessContext};
use crate::noise_buffer::NoiseBuffer;

/// Looping buffer playback
///
/// # Example
/// ```ignore
/// let buffer = NoiseBuffer::generate(2.0, 44100);
/// let source = BufferSourceNode::new(buffer);
/// ```
pub struct BufferSourceNode {
    buffer: NoiseBuffer,
    position: usize,
}

impl BufferSourceNode {
    /// Looping source over `buffer`
    pub fn new(buffer: NoiseBuffer) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Read position within the buffer
    pub fn position(&self) -> usize {
        self.position
    }
}

impl AudioNode for BufferSourceNode {
    fn process_block(
        &mut self,
        _inputs: &[&[f32]],
        output: &mut [f32],
        _sample_rate: f32,
        _context: &ProcessContext,
    ) {
        let samples = self.buffer.samples();
        if samples.is_empty() {
            output.fill(0.0);
            return;
        }

        for out in output.iter_mut() {
            if self.position >= samples.len() {
                self.position = 0;
            }
            *out = samples[self.position];
            self.position += 1;
        }
    }

    fn input_nodes(&self) -> Vec<NodeId> {
        vec![]
    }

    fn name(&self) -> &str {
        "BufferSourceNode"
    }

    fn is_source(&self) -> bool {
        true
    }
}
