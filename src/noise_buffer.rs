//! Noise buffer generation
//!
//! The one raw signal in the engine: a block of independent uniform random
//! samples in [-1, 1), looped by a [`BufferSourceNode`](crate::nodes::BufferSourceNode).
//! Every graph build generates a fresh buffer; buffers are immutable once
//! created and shared read-only with the audio thread.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Immutable block of white noise at a fixed sample rate
#[derive(Debug, Clone)]
pub struct NoiseBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl NoiseBuffer {
    /// Generate `duration_seconds * sample_rate` uniform samples in [-1, 1)
    ///
    /// Uses fresh entropy on every call.
    pub fn generate(duration_seconds: f32, sample_rate: u32) -> Self {
        Self::generate_with_rng(duration_seconds, sample_rate, &mut StdRng::from_entropy())
    }

    /// Deterministic variant for tests and reproducible renders
    pub fn generate_seeded(duration_seconds: f32, sample_rate: u32, seed: u64) -> Self {
        Self::generate_with_rng(duration_seconds, sample_rate, &mut StdRng::seed_from_u64(seed))
    }

    /// Generate using a caller-supplied random source
    pub fn generate_with_rng<R: Rng>(
        duration_seconds: f32,
        sample_rate: u32,
        rng: &mut R,
    ) -> Self {
        let len = (duration_seconds.max(0.0) as f64 * sample_rate as f64) as usize;
        let samples: Arc<[f32]> = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();

        Self {
            samples,
            sample_rate,
        }
    }

    /// Sample data
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate the buffer was generated for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Buffer length in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_second_buffer_length() {
        let buffer = NoiseBuffer::generate(2.0, 44100);
        assert_eq!(buffer.len(), 88200);
        assert_eq!(buffer.sample_rate(), 44100);
        assert!((buffer.duration_seconds() - 2.0).abs() < 1e-6);

        let buffer = NoiseBuffer::generate(2.0, 48000);
        assert_eq!(buffer.len(), 96000);
    }

    #[test]
    fn test_samples_in_half_open_range() {
        let buffer = NoiseBuffer::generate_seeded(2.0, 44100, 7);
        assert!(buffer.samples().iter().all(|s| (-1.0..1.0).contains(s)));
    }

    #[test]
    fn test_mean_near_zero_and_spread() {
        let buffer = NoiseBuffer::generate_seeded(2.0, 44100, 42);
        let mean: f32 = buffer.samples().iter().sum::<f32>() / buffer.len() as f32;
        assert!(mean.abs() < 0.02, "Mean {} not close to zero", mean);

        // Uniform on [-1, 1) has variance 1/3
        let variance: f32 =
            buffer.samples().iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32;
        assert!((variance - 1.0 / 3.0).abs() < 0.02, "Variance {}", variance);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let a = NoiseBuffer::generate_seeded(0.1, 44100, 12345);
        let b = NoiseBuffer::generate_seeded(0.1, 44100, 12345);
        let c = NoiseBuffer::generate_seeded(0.1, 44100, 54321);
        assert_eq!(a.samples(), b.samples());
        assert_ne!(a.samples(), c.samples());
    }

    #[test]
    fn test_fresh_buffers_differ() {
        let a = NoiseBuffer::generate(0.1, 44100);
        let b = NoiseBuffer::generate(0.1, 44100);
        assert_ne!(a.samples(), b.samples());
    }

    #[test]
    fn test_zero_or_negative_duration_is_empty() {
        assert!(NoiseBuffer::generate(0.0, 44100).is_empty());
        assert!(NoiseBuffer::generate(-1.0, 44100).is_empty());
    }
}
