/// Parameter node - an automatable control value with modulation inputs
///
/// Mirrors how a device-graph parameter behaves: the output is the
/// parameter's intrinsic value plus the sum of every signal connected to it.
/// The intrinsic value can jump (`set_value`) or approach a target
/// exponentially (`set_target`), using the same one-pole smoothing as a lag:
///
/// ```text
/// coeff = 1 - exp(-1 / (time_constant * sample_rate))
/// value += (target - value) * coeff
/// ```
///
/// After one time constant the value has covered ~63% of the distance,
/// after five ~99.3%.

use crate::audio_node::{AudioNode, NodeId, ProcessContext};

/// Below this distance a ramp snaps to its target (keeps values out of denormal range)
const SNAP_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct Ramp {
    target: f32,
    time_constant: f32,
}

/// Automatable parameter
///
/// # Example
/// ```ignore
/// // Wind filter cutoff: 400 Hz plus an LFO scaled to ±300 Hz
/// let lfo_depth = GainNode::new(lfo, depth);        // NodeId 5
/// let cutoff = ParamNode::with_modulation(400.0, vec![5]);
/// ```
pub struct ParamNode {
    value: f32,
    ramp: Option<Ramp>,
    modulation: Vec<NodeId>,
}

impl ParamNode {
    /// Parameter with a fixed intrinsic value and no modulation
    pub fn new(value: f32) -> Self {
        Self::with_modulation(value, Vec::new())
    }

    /// Parameter whose output adds the given modulation signals to its value
    pub fn with_modulation(value: f32, modulation: Vec<NodeId>) -> Self {
        Self {
            value,
            ramp: None,
            modulation,
        }
    }

    /// Jump to a value immediately, cancelling any ramp in progress
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
        self.ramp = None;
    }

    /// Approach `target` exponentially with the given time constant (seconds)
    ///
    /// A non-positive time constant jumps straight to the target.
    pub fn set_target(&mut self, target: f32, time_constant: f32) {
        if time_constant <= 0.0 {
            self.set_value(target);
        } else {
            self.ramp = Some(Ramp {
                target,
                time_constant,
            });
        }
    }

    /// Current intrinsic value (without modulation)
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Value the parameter is heading to: the ramp target, or the current value
    pub fn target(&self) -> f32 {
        self.ramp.map_or(self.value, |r| r.target)
    }

    /// Whether a ramp is still in progress
    pub fn is_ramping(&self) -> bool {
        self.ramp.is_some()
    }

    fn advance(&mut self, coeff: f32) {
        if let Some(ramp) = self.ramp {
            self.value += (ramp.target - self.value) * coeff;
            if (ramp.target - self.value).abs() < SNAP_EPSILON {
                self.value = ramp.target;
                self.ramp = None;
            }
        }
    }
}

impl AudioNode for ParamNode {
    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        output: &mut [f32],
        sample_rate: f32,
        _context: &ProcessContext,
    ) {
        debug_assert_eq!(
            inputs.len(),
            self.modulation.len(),
            "ParamNode input count mismatch"
        );

        match self.ramp {
            Some(ramp) => {
                let coeff = 1.0 - (-1.0 / (ramp.time_constant * sample_rate)).exp();
                for out in output.iter_mut() {
                    self.advance(coeff);
                    *out = self.value;
                }
            }
            None => output.fill(self.value),
        }

        for modulation in inputs {
            for (out, &m) in output.iter_mut().zip(modulation.iter()) {
                *out += m;
            }
        }
    }

    fn input_nodes(&self) -> Vec<NodeId> {
        self.modulation.clone()
    }

    fn name(&self) -> &str {
        "ParamNode"
    }

    fn as_param_mut(&mut self) -> Option<&mut ParamNode> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(node: &mut ParamNode, inputs: &[&[f32]], len: usize) -> Vec<f32> {
        let mut output = vec![0.0; len];
        let context = ProcessContext::new(0, len, 44100.0);
        node.process_block(inputs, &mut output, 44100.0, &context);
        output
    }

    #[test]
    fn test_param_holds_value() {
        let mut param = ParamNode::new(0.8);
        let output = render(&mut param, &[], 64);
        assert!(output.iter().all(|&s| s == 0.8));
        assert!(!param.is_ramping());
    }

    #[test]
    fn test_param_adds_modulation() {
        // 400 Hz base with ±300 Hz modulation
        let mut param = ParamNode::with_modulation(400.0, vec![0]);
        let lfo = [300.0, 0.0, -300.0];
        let output = render(&mut param, &[&lfo], 3);
        assert_eq!(output, vec![700.0, 400.0, 100.0]);
        assert_eq!(param.input_nodes(), vec![0]);
    }

    #[test]
    fn test_set_target_reaches_63_percent_after_one_time_constant() {
        let mut param = ParamNode::new(0.5);
        param.set_target(0.0, 0.1);
        assert_eq!(param.target(), 0.0);

        // 0.1 s at 44.1 kHz
        let output = render(&mut param, &[], 4410);
        let expected = 0.5 * (-1.0f32).exp();
        assert!(
            (output[4409] - expected).abs() < 0.01,
            "After one time constant expected ~{}, got {}",
            expected,
            output[4409]
        );
        // Monotonic, no overshoot
        assert!(output.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_set_target_snaps_and_finishes() {
        let mut param = ParamNode::new(0.5);
        param.set_target(0.0, 0.1);

        // 3 seconds is 30 time constants
        let output = render(&mut param, &[], 44100 * 3);
        assert_eq!(*output.last().unwrap(), 0.0);
        assert!(!param.is_ramping());
        assert_eq!(param.value(), 0.0);
    }

    #[test]
    fn test_zero_time_constant_jumps() {
        let mut param = ParamNode::new(0.5);
        param.set_target(0.0, 0.0);
        assert_eq!(param.value(), 0.0);
        assert!(!param.is_ramping());
    }

    #[test]
    fn test_set_value_cancels_ramp() {
        let mut param = ParamNode::new(0.0);
        param.set_target(0.5, 0.1);
        param.set_value(0.25);
        assert!(!param.is_ramping());
        assert_eq!(param.target(), 0.25);
    }
}
