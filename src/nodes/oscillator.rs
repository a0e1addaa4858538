/// Oscillator node - periodic waveforms for low-frequency modulation
///
/// Phase is tracked in f64 and wrapped to [0, 1) every sample. With a
/// 0.1 Hz rate the per-sample increment is ~2e-6, below what an f32 phase
/// near 1.0 can resolve, so a long session would drift in rate otherwise.

use crate::audio_node::{AudioNode, NodeId, ProcessContext};
use std::f64::consts::TAU;

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

/// Oscillator node with a frequency input
///
/// Output is bipolar in [-1, 1]; scale it with a [`GainNode`](super::gain::GainNode)
/// to get a modulation depth.
///
/// # Example
/// ```ignore
/// // 0.1 Hz sine LFO
/// let rate = ConstantNode::new(0.1);               // NodeId 0
/// let lfo = OscillatorNode::new(0, Waveform::Sine); // NodeId 1
/// ```
pub struct OscillatorNode {
    freq_input: NodeId,
    waveform: Waveform,
    phase: f64,
}

impl OscillatorNode {
    /// Create an oscillator reading its frequency (Hz) from `freq_input`
    pub fn new(freq_input: NodeId, waveform: Waveform) -> Self {
        Self {
            freq_input,
            waveform,
            phase: 0.0,
        }
    }

    /// Get current phase (0.0 to 1.0)
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Get waveform type
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    fn sample_at(&self) -> f32 {
        let value = match self.waveform {
            Waveform::Sine => (self.phase * TAU).sin(),
            // Starts at 0 rising, like the sine
            Waveform::Triangle => {
                if self.phase < 0.25 {
                    4.0 * self.phase
                } else if self.phase < 0.75 {
                    2.0 - 4.0 * self.phase
                } else {
                    4.0 * self.phase - 4.0
                }
            }
        };
        value as f32
    }
}

impl AudioNode for OscillatorNode {
    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        output: &mut [f32],
        sample_rate: f32,
        _context: &ProcessContext,
    ) {
        debug_assert!(
            !inputs.is_empty(),
            "OscillatorNode requires frequency input"
        );

        let freq_buffer = inputs[0];

        debug_assert_eq!(
            freq_buffer.len(),
            output.len(),
            "Frequency buffer length mismatch"
        );

        let sample_rate = sample_rate as f64;
        for (out, &freq) in output.iter_mut().zip(freq_buffer) {
            *out = self.sample_at();

            self.phase += freq as f64 / sample_rate;
            self.phase -= self.phase.floor();
        }
    }

    fn input_nodes(&self) -> Vec<NodeId> {
        vec![self.freq_input]
    }

    fn name(&self) -> &str {
        "OscillatorNode"
    }

    fn is_source(&self) -> bool {
        true
    }
}
