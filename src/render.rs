//! Offline rendering of a soundscape to samples or a WAV file
//!
//! Drives a regular [`PlaybackSession`] on an [`OfflineOutput`], so a render
//! goes through exactly the same graph construction as live playback.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{Result, SoundscapeError};
use crate::graph_builder::SignalGraphBuilder;
use crate::output::OfflineOutput;
use crate::playback::PlaybackSession;
use crate::sound_profile::SoundProfileId;

/// Lowest sample rate a render accepts
///
/// The profiles' filter cutoffs and LFOs need a few kHz of bandwidth to mean
/// anything.
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// What to render
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub profile: SoundProfileId,
    /// Duration in seconds
    pub seconds: f32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    pub muted: bool,
    /// Fixed noise seed for reproducible output
    pub seed: Option<u64>,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            profile: SoundProfileId::Rain,
            seconds: 10.0,
            sample_rate: 44100,
            muted: false,
            seed: None,
        }
    }
}

impl RenderRequest {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < MIN_SAMPLE_RATE {
            return Err(SoundscapeError::Config(format!(
                "sample rate must be at least {} Hz, got {}",
                MIN_SAMPLE_RATE, self.sample_rate
            )));
        }
        if !self.seconds.is_finite() || self.seconds < 0.0 {
            return Err(SoundscapeError::Config(format!(
                "duration must be a non-negative number of seconds, got {}",
                self.seconds
            )));
        }
        Ok(())
    }
}

/// Render a profile to mono samples
pub fn render_samples(request: &RenderRequest, config: &EngineConfig) -> Result<Vec<f32>> {
    request.validate()?;

    let mut builder = SignalGraphBuilder::new(config);
    if let Some(seed) = request.seed {
        builder = builder.with_seed(seed);
    }

    let output = OfflineOutput::new(request.sample_rate);
    let mut session = PlaybackSession::with_builder(output, config, builder);
    session.set_muted(request.muted);
    session.start(request.profile);

    let frames = (request.seconds as f64 * request.sample_rate as f64) as usize;
    let samples = session.output_mut().render(frames);
    session.close();
    Ok(samples)
}

/// Render a profile to a 16-bit mono WAV file
pub fn render_to_wav(
    request: &RenderRequest,
    config: &EngineConfig,
    path: &Path,
) -> Result<RenderStats> {
    let samples = render_samples(request, config)?;

    let spec = WavSpec {
        channels: 1,
        sample_rate: request.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in &samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
    }
    writer.finalize()?;

    info!("Rendered {} to {}", request.profile, path.display());
    Ok(RenderStats::from_samples(&samples, request.sample_rate))
}

/// Level statistics of a render
#[derive(Debug, Clone)]
pub struct RenderStats {
    pub duration: f32,
    pub sample_count: usize,
    pub rms: f32,
    pub peak: f32,
    pub dc_offset: f32,
    pub zero_crossings: usize,
}

impl RenderStats {
    pub fn from_samples(samples: &[f32], sample_rate: u32) -> Self {
        let sample_count = samples.len();
        if sample_count == 0 {
            return Self {
                duration: 0.0,
                sample_count,
                rms: 0.0,
                peak: 0.0,
                dc_offset: 0.0,
                zero_crossings: 0,
            };
        }

        let sum_squares: f32 = samples.iter().map(|x| x * x).sum();
        let rms = (sum_squares / sample_count as f32).sqrt();
        let peak = samples.iter().map(|x| x.abs()).fold(0.0f32, f32::max);
        let dc_offset = samples.iter().sum::<f32>() / sample_count as f32;
        let zero_crossings = samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();

        Self {
            duration: sample_count as f32 / sample_rate as f32,
            sample_count,
            rms,
            peak,
            dc_offset,
            zero_crossings,
        }
    }

    pub fn print_summary(&self) {
        println!("Render Statistics:");
        println!("  Duration:       {:.3} seconds", self.duration);
        println!("  Samples:        {}", self.sample_count);
        println!("  RMS:            {:.3}", self.rms);
        println!("  Peak:           {:.3}", self.peak);
        println!("  DC Offset:      {:.6}", self.dc_offset);
        println!("  Zero Crossings: {}", self.zero_crossings);
    }
}
