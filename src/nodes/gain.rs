/// Gain node - multiplies input signal by a gain signal
///
/// Output[i] = Input[i] * Gain[i]. The gain input is usually a
/// [`ParamNode`](super::param::ParamNode), so gain stages can be automated
/// (master mute ramp) or modulated (rain flutter).
use crate::audio_node::{AudioNode, NodeId, ProcessContext};

/// Gain node: out = input * gain
///
/// # Example
/// ```ignore
/// let filtered = LowPassFilterNode::new(0, 1, 2);  // NodeId 3
/// let level = ParamNode::new(0.5);                 // NodeId 4
/// let master = GainNode::new(3, 4);                // NodeId 5
/// ```
pub struct GainNode {
    input: NodeId,
    gain_input: NodeId,
}

impl GainNode {
    /// Create a gain stage
    ///
    /// # Parameters
    /// - `input`: NodeId providing the signal
    /// - `gain_input`: NodeId providing the per-sample gain
    pub fn new(input: NodeId, gain_input: NodeId) -> Self {
        Self { input, gain_input }
    }

    /// Get the input node ID
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// Get the gain input node ID
    pub fn gain_input(&self) -> NodeId {
        self.gain_input
    }
}

impl AudioNode for GainNode {
    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        output: &mut [f32],
        _sample_rate: f32,
        _context: &ProcessContext,
    ) {
        debug_assert!(
            inputs.len() >= 2,
            "GainNode requires 2 inputs (signal + gain), got {}",
            inputs.len()
        );

        let signal = inputs[0];
        let gain = inputs[1];

        debug_assert_eq!(signal.len(), output.len(), "Signal input length mismatch");
        debug_assert_eq!(gain.len(), output.len(), "Gain input length mismatch");

        for ((out, &s), &g) in output.iter_mut().zip(signal).zip(gain) {
            *out = s * g;
        }
    }

    fn input_nodes(&self) -> Vec<NodeId> {
        vec![self.input, self.gain_input]
    }

    fn name(&self) -> &str {
        "GainNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(signal: &[f32], gain: &[f32]) -> Vec<f32> {
        let mut node = GainNode::new(0, 1);
        let mut output = vec![0.0; signal.len()];
        let context = ProcessContext::new(0, signal.len(), 44100.0);
        node.process_block(&[signal, gain], &mut output, 44100.0, &context);
        output
    }

    #[test]
    fn test_gain_node_unity() {
        let output = run(&[0.5, -0.3, 0.8, -1.0], &[1.0; 4]);
        assert_eq!(output, vec![0.5, -0.3, 0.8, -1.0]);
    }

    #[test]
    fn test_gain_node_zero_mutes() {
        let output = run(&[0.5, -0.3, 0.8, -1.0], &[0.0; 4]);
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_gain_node_follows_varying_gain() {
        // Flutter-style gain between 0.7 and 0.9
        let output = run(&[1.0, 1.0, 1.0], &[0.7, 0.8, 0.9]);
        assert!((output[0] - 0.7).abs() < 1e-6);
        assert!((output[1] - 0.8).abs() < 1e-6);
        assert!((output[2] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_gain_dependencies() {
        let node = GainNode::new(3, 4);
        assert_eq!(node.input_nodes(), vec![3, 4]);
        assert_eq!(node.input(), 3);
        assert_eq!(node.gain_input(), 4);
    }
}
