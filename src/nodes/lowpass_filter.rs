/// Low-pass filter node - uses biquad IIR filtering
///
/// 2nd-order low-pass with audio-rate cutoff and Q inputs. The cutoff is the
/// parameter the wind profile sweeps with its LFO.
///
/// # Implementation Details
///
/// Uses biquad::DirectForm2Transposed. Coefficients are recomputed when the
/// cutoff moves more than 0.1 Hz or Q more than 0.01, and are swapped in with
/// `update_coefficients` so the filter memory survives the change: rebuilding
/// the filter on every sweep step would click.

use crate::audio_node::{AudioNode, NodeId, ProcessContext};
use biquad::{Biquad, Coefficients, DirectForm2Transposed, Hertz};

/// Lowest cutoff the filter accepts
const MIN_CUTOFF_HZ: f32 = 10.0;

/// Highest cutoff as a fraction of the sample rate (just under Nyquist)
const MAX_CUTOFF_RATIO: f32 = 0.49;

/// Q range accepted by the coefficient calculation
const MIN_Q: f32 = 0.01;
const MAX_Q: f32 = 20.0;

/// Convert a resonance given in decibels to a linear Q factor
///
/// Profiles specify Q the way a browser biquad does: 0 dB is a Q of 1.0.
pub fn q_from_db(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Low-pass coefficients, or `None` when no valid response exists
///
/// `ToHertz::hz` panics on non-positive input, so frequencies go through
/// `Hertz::from_hz` instead.
fn lowpass_coefficients(sample_rate: f32, cutoff: f32, q: f32) -> Option<Coefficients<f32>> {
    let fs = Hertz::<f32>::from_hz(sample_rate).ok()?;
    let f0 = Hertz::<f32>::from_hz(cutoff).ok()?;
    Coefficients::<f32>::from_params(biquad::Type::LowPass, fs, f0, q).ok()
}

fn passthrough() -> Coefficients<f32> {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

/// Low-pass filter node with signal, cutoff and Q inputs
///
/// # Example
/// ```ignore
/// let noise = BufferSourceNode::new(buffer);   // NodeId 0
/// let cutoff = ParamNode::new(800.0);          // NodeId 1
/// let q = ParamNode::new(q_from_db(0.0));      // NodeId 2
/// let lpf = LowPassFilterNode::new(0, 1, 2);   // NodeId 3
/// ```
pub struct LowPassFilterNode {
    input: NodeId,
    cutoff_input: NodeId,
    q_input: NodeId,
    filter: DirectForm2Transposed<f32>,
    /// Cutoff and Q the current coefficients were computed for
    current: Option<(f32, f32)>,
}

impl LowPassFilterNode {
    /// Create a low-pass filter
    ///
    /// # Parameters
    /// - `input`: Audio signal to filter
    /// - `cutoff_input`: Cutoff frequency in Hz
    /// - `q_input`: Linear Q factor (1/√2 for Butterworth)
    pub fn new(input: NodeId, cutoff_input: NodeId, q_input: NodeId) -> Self {
        Self {
            input,
            cutoff_input,
            q_input,
            filter: DirectForm2Transposed::<f32>::new(passthrough()),
            current: None,
        }
    }

    /// Cutoff the coefficients were last computed for
    pub fn cutoff(&self) -> Option<f32> {
        self.current.map(|(cutoff, _)| cutoff)
    }

    /// Q the coefficients were last computed for
    pub fn q(&self) -> Option<f32> {
        self.current.map(|(_, q)| q)
    }

    fn needs_update(&self, cutoff: f32, q: f32) -> bool {
        match self.current {
            None => true,
            Some((last_cutoff, last_q)) => {
                (cutoff - last_cutoff).abs() > 0.1 || (q - last_q).abs() > 0.01
            }
        }
    }
}

impl AudioNode for LowPassFilterNode {
    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        output: &mut [f32],
        sample_rate: f32,
        _context: &ProcessContext,
    ) {
        debug_assert_eq!(
            inputs.len(),
            3,
            "LowPassFilterNode requires 3 inputs: signal, cutoff, q"
        );

        let input_buffer = inputs[0];
        let cutoff_buffer = inputs[1];
        let q_buffer = inputs[2];

        debug_assert_eq!(input_buffer.len(), output.len(), "Input buffer length mismatch");
        debug_assert_eq!(cutoff_buffer.len(), output.len(), "Cutoff buffer length mismatch");
        debug_assert_eq!(q_buffer.len(), output.len(), "Q buffer length mismatch");

        // Below ~20 Hz sample rate the range would invert; keep it non-empty
        let max_cutoff = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);

        for i in 0..output.len() {
            let cutoff = cutoff_buffer[i].clamp(MIN_CUTOFF_HZ, max_cutoff);
            let q = q_buffer[i].clamp(MIN_Q, MAX_Q);

            if self.needs_update(cutoff, q) {
                // Keep the old response when no valid one exists
                if let Some(coeffs) = lowpass_coefficients(sample_rate, cutoff, q) {
                    self.filter.update_coefficients(coeffs);
                    self.current = Some((cutoff, q));
                }
            }

            output[i] = self.filter.run(input_buffer[i]);
        }
    }

    fn input_nodes(&self) -> Vec<NodeId> {
        vec![self.input, self.cutoff_input, self.q_input]
    }

    fn name(&self) -> &str {
        "LowPassFilterNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{OscillatorNode, Waveform};

    fn calculate_rms(buffer: &[f32]) -> f32 {
        let sum_squares: f32 = buffer.iter().map(|x| x * x).sum();
        (sum_squares / buffer.len() as f32).sqrt()
    }

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        let mut osc = OscillatorNode::new(0, Waveform::Sine);
        let freq_buf = vec![freq; len];
        let mut out = vec![0.0; len];
        let context = ProcessContext::new(0, len, 44100.0);
        osc.process_block(&[freq_buf.as_slice()], &mut out, 44100.0, &context);
        out
    }

    fn filter(lpf: &mut LowPassFilterNode, signal: &[f32], cutoff: &[f32], q: f32) -> Vec<f32> {
        let q_buf = vec![q; signal.len()];
        let mut output = vec![0.0; signal.len()];
        let context = ProcessContext::new(0, signal.len(), 44100.0);
        lpf.process_block(&[signal, cutoff, q_buf.as_slice()], &mut output, 44100.0, &context);
        output
    }

    #[test]
    fn test_q_from_db() {
        assert!((q_from_db(0.0) - 1.0).abs() < 1e-6);
        assert!((q_from_db(20.0) - 10.0).abs() < 1e-4);
        assert!((q_from_db(1.0) - 1.122).abs() < 1e-3);
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut lpf = LowPassFilterNode::new(0, 1, 2);
        let output = filter(&mut lpf, &vec![1.0; 4096], &vec![1000.0; 4096], 1.0);

        assert!(
            (output[4095] - 1.0).abs() < 0.01,
            "DC should settle at unity, got {}",
            output[4095]
        );
    }

    #[test]
    fn test_lowpass_high_freq_attenuation() {
        let input = sine(8000.0, 4096);
        let mut lpf = LowPassFilterNode::new(0, 1, 2);
        let output = filter(&mut lpf, &input, &vec![1000.0; 4096], 1.0);

        let ratio = calculate_rms(&output[1024..]) / calculate_rms(&input[1024..]);
        assert!(ratio < 0.1, "8 kHz not attenuated enough: ratio={}", ratio);
    }

    #[test]
    fn test_lowpass_passband() {
        let input = sine(100.0, 8820);
        let mut lpf = LowPassFilterNode::new(0, 1, 2);
        let output = filter(&mut lpf, &input, &vec![1000.0; 8820], 1.0);

        let ratio = calculate_rms(&output[4410..]) / calculate_rms(&input[4410..]);
        assert!(ratio > 0.9, "100 Hz attenuated too much: ratio={}", ratio);
    }

    #[test]
    fn test_cutoff_sweep_tracks_without_reset() {
        let mut lpf = LowPassFilterNode::new(0, 1, 2);
        let sweep: Vec<f32> = (0..4410).map(|i| 100.0 + i as f32 * 0.1).collect();
        let output = filter(&mut lpf, &vec![1.0; 4410], &sweep, 1.0);

        let last = lpf.cutoff().unwrap();
        assert!((last - 540.9).abs() < 0.25, "Cutoff didn't track sweep: {}", last);
        // Filter memory kept: DC stays settled while coefficients change
        assert!(output[4000..].iter().all(|s| (s - 1.0).abs() < 0.05));
    }

    #[test]
    fn test_lowpass_parameter_clamping() {
        let mut lpf = LowPassFilterNode::new(0, 1, 2);
        let output = filter(&mut lpf, &vec![1.0; 512], &vec![100000.0; 512], 100.0);

        assert!(lpf.cutoff().unwrap() < 22050.0);
        assert!(lpf.q().unwrap() <= 20.0);
        assert!(output.iter().all(|s| s.is_finite()));

        let mut lpf = LowPassFilterNode::new(0, 1, 2);
        filter(&mut lpf, &vec![1.0; 16], &vec![-50.0; 16], 1.0);
        assert_eq!(lpf.cutoff(), Some(MIN_CUTOFF_HZ));
    }

    #[test]
    fn test_tiny_sample_rate_does_not_panic() {
        for sample_rate in [16.0, 1.0, 0.0] {
            let mut lpf = LowPassFilterNode::new(0, 1, 2);
            let signal = vec![0.5; 64];
            let cutoff = vec![800.0; 64];
            let q = vec![1.0; 64];
            let mut output = vec![0.0; 64];
            let context = ProcessContext::new(0, 64, sample_rate);
            lpf.process_block(&[&signal, &cutoff, &q], &mut output, sample_rate, &context);

            // No valid low-pass exists this close to DC; the signal passes unchanged
            assert!(output.iter().all(|s| s.is_finite()), "sample rate {}", sample_rate);
            assert_eq!(lpf.cutoff(), None);
        }
    }

    #[test]
    fn test_nan_cutoff_keeps_previous_response() {
        let mut lpf = LowPassFilterNode::new(0, 1, 2);
        filter(&mut lpf, &vec![1.0; 64], &vec![1000.0; 64], 1.0);
        let output = filter(&mut lpf, &vec![1.0; 64], &vec![f32::NAN; 64], 1.0);

        assert_eq!(lpf.cutoff(), Some(1000.0));
        assert!(output.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_lowpass_dependencies() {
        let lpf = LowPassFilterNode::new(10, 20, 30);
        assert_eq!(lpf.input_nodes(), vec![10, 20, 30]);
        assert_eq!(lpf.cutoff(), None);
    }
}
