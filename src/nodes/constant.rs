/// Constant value node - outputs a fixed value
///
/// Used for fixed control inputs such as an oscillator's rate.
use crate::audio_node::{AudioNode, NodeId, ProcessContext};

/// Constant value node
///
/// # Example
/// ```ignore
/// // 4 Hz control signal for a rain flutter LFO
/// let node = ConstantNode::new(4.0);
/// ```
pub struct ConstantNode {
    value: f32,
}

impl ConstantNode {
    /// Create a new constant value node
    pub fn new(value: f32) -> Self {
        Self { value }
    }

    /// Get the constant value
    pub fn value(&self) -> f32 {
        self.value
    }
}

impl AudioNode for ConstantNode {
    fn process_block(
        &mut self,
        _inputs: &[&[f32]],
        output: &mut [f32],
        _sample_rate: f32,
        _context: &ProcessContext,
    ) {
        output.fill(self.value);
    }

    fn input_nodes(&self) -> Vec<NodeId> {
        vec![]
    }

    fn name(&self) -> &str {
        "ConstantNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_node_output() {
        let mut node = ConstantNode::new(0.1);
        let mut output = vec![0.0; 512];
        let context = ProcessContext::new(0, 512, 44100.0);

        node.process_block(&[], &mut output, 44100.0, &context);

        assert!(output.iter().all(|&s| s == 0.1));
        assert_eq!(node.value(), 0.1);
    }

    #[test]
    fn test_constant_node_no_dependencies() {
        let node = ConstantNode::new(1.0);
        assert!(node.input_nodes().is_empty());
    }
}
