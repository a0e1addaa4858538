//! Output device abstraction
//!
//! An [`AudioOutput`] is the sink every soundscape graph feeds. It is opened
//! lazily by the playback session, resumed if suspended, and exposes a
//! [`Destination`] that graphs connect to. Two implementations:
//!
//! - [`CpalOutput`]: the default system device through cpal
//! - [`OfflineOutput`]: pull-rendered, for tests and WAV rendering

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::audio_node_graph::AudioNodeGraph;
use crate::error::{Result, SoundscapeError};

/// A graph shared between the control thread and the audio callback
pub type SharedGraph = Arc<Mutex<AudioNodeGraph>>;

/// Identifies one graph connection on a destination
pub type GraphId = u64;

/// Lock a mutex, recovering the data if a panicking thread poisoned it
///
/// Audio state stays usable after a panic elsewhere; the worst case is one
/// glitched block.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Device lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Not opened yet, or closed
    Closed,
    /// Open but not producing audio
    Suspended,
    /// Open and pulling audio from the destination
    Running,
}

#[derive(Default)]
struct DestinationInner {
    graphs: Vec<(GraphId, SharedGraph)>,
    peak: usize,
    scratch: Vec<f32>,
}

/// The device's mixing input
///
/// Every connected graph is summed into the output, so two connected graphs
/// would play at double level. The connection counters make the
/// one-graph-at-a-time rule observable.
#[derive(Clone, Default)]
pub struct Destination {
    inner: Arc<Mutex<DestinationInner>>,
}

impl Destination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a graph's output
    pub fn connect(&self, id: GraphId, graph: SharedGraph) {
        let mut inner = lock(&self.inner);
        inner.graphs.push((id, graph));
        inner.peak = inner.peak.max(inner.graphs.len());
    }

    /// Disconnect a graph; false if it was not connected
    pub fn disconnect(&self, id: GraphId) -> bool {
        let mut inner = lock(&self.inner);
        let before = inner.graphs.len();
        inner.graphs.retain(|(graph_id, _)| *graph_id != id);
        inner.graphs.len() != before
    }

    /// Number of graphs currently connected
    pub fn connection_count(&self) -> usize {
        lock(&self.inner).graphs.len()
    }

    /// Largest number of graphs ever connected at the same time
    pub fn peak_connections(&self) -> usize {
        lock(&self.inner).peak
    }

    /// Mix every connected graph into `out`, hard-limited to ±1
    pub fn render(&self, out: &mut [f32]) {
        out.fill(0.0);

        let mut inner = lock(&self.inner);
        let DestinationInner { graphs, scratch, .. } = &mut *inner;
        if scratch.len() < out.len() {
            scratch.resize(out.len(), 0.0);
        }
        let scratch = &mut scratch[..out.len()];

        for (_, graph) in graphs.iter() {
            lock(graph).render_into(scratch);
            for (o, &s) in out.iter_mut().zip(scratch.iter()) {
                *o += s;
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

/// An audio sink the playback session can open, resume, and connect to
pub trait AudioOutput {
    /// Current lifecycle state
    fn state(&self) -> DeviceState;

    /// Sample rate graphs must be built for
    fn sample_rate(&self) -> u32;

    /// Open the device; it starts out suspended
    fn open(&mut self) -> Result<()>;

    /// Start pulling audio; may be refused (autoplay policy, device busy)
    fn resume(&mut self) -> Result<()>;

    /// Stop pulling audio without closing
    fn suspend(&mut self) -> Result<()>;

    /// Release the device
    fn close(&mut self);

    /// Mixing input graphs connect to
    fn destination(&self) -> &Destination;

    /// Open the device if needed and resume it if suspended
    ///
    /// A refused resume is logged and otherwise ignored: the caller keeps
    /// going and simply hears nothing. Only a failure to open is returned.
    fn ensure_running(&mut self) -> Result<()> {
        if self.state() == DeviceState::Closed {
            self.open()?;
        }
        if self.state() == DeviceState::Suspended {
            if let Err(e) = self.resume() {
                warn!("Output device did not resume: {}", e);
            }
        }
        Ok(())
    }
}

/// Default system output device through cpal
pub struct CpalOutput {
    fallback_sample_rate: u32,
    sample_rate: Option<u32>,
    stream: Option<cpal::Stream>,
    state: DeviceState,
    destination: Destination,
}

impl CpalOutput {
    /// Unopened device; `fallback_sample_rate` is reported until it opens
    pub fn new(fallback_sample_rate: u32) -> Self {
        Self {
            fallback_sample_rate,
            sample_rate: None,
            stream: None,
            state: DeviceState::Closed,
            destination: Destination::new(),
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        destination: Destination,
        channels: usize,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let mut mono: Vec<f32> = Vec::new();

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels;
                    if mono.len() < frames {
                        mono.resize(frames, 0.0);
                    }
                    destination.render(&mut mono[..frames]);

                    // Write to all channels (mono -> stereo/multi-channel)
                    for (frame, &sample) in data.chunks_mut(channels).zip(mono.iter()) {
                        for channel in frame.iter_mut() {
                            *channel = T::from_sample(sample);
                        }
                    }
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| SoundscapeError::Stream(e.to_string()))?;

        Ok(stream)
    }
}

impl AudioOutput for CpalOutput {
    fn state(&self) -> DeviceState {
        self.state
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(self.fallback_sample_rate)
    }

    fn open(&mut self) -> Result<()> {
        if self.state != DeviceState::Closed {
            return Ok(());
        }

        let host = cpal::default_host();
        info!("Audio host: {:?}", host.id());

        let device = host
            .default_output_device()
            .ok_or_else(|| SoundscapeError::Device("No audio output device found".to_string()))?;
        if let Ok(name) = device.name() {
            info!("Audio device: {}", name);
        }

        let config = device
            .default_output_config()
            .map_err(|e| SoundscapeError::Device(e.to_string()))?;
        debug!("Audio config: {:?}", config);

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let destination = self.destination.clone();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config.into(), destination, channels)
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config.into(), destination, channels)
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config.into(), destination, channels)
            }
            other => {
                return Err(SoundscapeError::Device(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        }?;

        // Some hosts start streams on creation; hold it until resume
        if let Err(e) = stream.pause() {
            debug!("Stream could not be paused after creation: {}", e);
        }

        self.sample_rate = Some(sample_rate);
        self.stream = Some(stream);
        self.state = DeviceState::Suspended;
        info!("Audio output opened at {} Hz, {} channels", sample_rate, channels);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| SoundscapeError::Device("Device is not open".to_string()))?;
        stream
            .play()
            .map_err(|e| SoundscapeError::Stream(e.to_string()))?;
        self.state = DeviceState::Running;
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| SoundscapeError::Device("Device is not open".to_string()))?;
        stream
            .pause()
            .map_err(|e| SoundscapeError::Stream(e.to_string()))?;
        self.state = DeviceState::Suspended;
        Ok(())
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            info!("Audio output closed");
        }
        self.state = DeviceState::Closed;
    }

    fn destination(&self) -> &Destination {
        &self.destination
    }
}

/// Pull-rendered output device
///
/// Nothing happens until [`render`](OfflineOutput::render) is called, which
/// makes it deterministic for tests and usable for rendering to a file.
pub struct OfflineOutput {
    sample_rate: u32,
    state: DeviceState,
    destination: Destination,
    deny_resume: bool,
    open_count: usize,
}

impl OfflineOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: DeviceState::Closed,
            destination: Destination::new(),
            deny_resume: false,
            open_count: 0,
        }
    }

    /// Refuse every resume, like a browser blocking autoplay
    pub fn with_resume_denied(mut self) -> Self {
        self.deny_resume = true;
        self
    }

    /// How many times the device has been opened
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    /// Render `frames` samples
    ///
    /// A device that is not running produces silence and connected graphs
    /// do not advance.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        if self.state == DeviceState::Running {
            self.destination.render(&mut out);
        }
        out
    }
}

impl AudioOutput for OfflineOutput {
    fn state(&self) -> DeviceState {
        self.state
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn open(&mut self) -> Result<()> {
        if self.state == DeviceState::Closed {
            self.state = DeviceState::Suspended;
            self.open_count += 1;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        match self.state {
            DeviceState::Closed => Err(SoundscapeError::Device("Device is not open".to_string())),
            _ if self.deny_resume => Err(SoundscapeError::Device("Resume denied".to_string())),
            _ => {
                self.state = DeviceState::Running;
                Ok(())
            }
        }
    }

    fn suspend(&mut self) -> Result<()> {
        if self.state == DeviceState::Closed {
            return Err(SoundscapeError::Device("Device is not open".to_string()));
        }
        self.state = DeviceState::Suspended;
        Ok(())
    }

    fn close(&mut self) {
        self.state = DeviceState::Closed;
    }

    fn destination(&self) -> &Destination {
        &self.destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::ConstantNode;

    fn constant_graph(value: f32) -> SharedGraph {
        let mut graph = AudioNodeGraph::new(44100.0, 64);
        let id = graph.add_audio_node(Box::new(ConstantNode::new(value)));
        graph.set_output(id);
        graph.build_processor().unwrap();
        Arc::new(Mutex::new(graph))
    }

    #[test]
    fn test_destination_mixes_and_counts() {
        let destination = Destination::new();
        destination.connect(1, constant_graph(0.25));
        destination.connect(2, constant_graph(0.5));
        assert_eq!(destination.connection_count(), 2);

        let mut out = vec![0.0; 100];
        destination.render(&mut out);
        assert!(out.iter().all(|&s| (s - 0.75).abs() < 1e-6));

        assert!(destination.disconnect(1));
        assert!(!destination.disconnect(1));
        assert_eq!(destination.connection_count(), 1);
        assert_eq!(destination.peak_connections(), 2);
    }

    #[test]
    fn test_destination_limits_output() {
        let destination = Destination::new();
        destination.connect(1, constant_graph(0.75));
        destination.connect(2, constant_graph(0.75));

        let mut out = vec![0.0; 8];
        destination.render(&mut out);
        assert!(out.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_empty_destination_is_silent() {
        let mut out = vec![1.0; 8];
        Destination::new().render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_offline_lifecycle() {
        let mut output = OfflineOutput::new(48000);
        assert_eq!(output.state(), DeviceState::Closed);

        output.ensure_running().unwrap();
        assert_eq!(output.state(), DeviceState::Running);
        assert_eq!(output.open_count(), 1);

        output.suspend().unwrap();
        output.ensure_running().unwrap();
        assert_eq!(output.state(), DeviceState::Running);
        assert_eq!(output.open_count(), 1);

        output.close();
        assert!(output.resume().is_err());
    }

    #[test]
    fn test_denied_resume_is_not_an_error() {
        let mut output = OfflineOutput::new(44100).with_resume_denied();
        assert!(output.ensure_running().is_ok());
        assert_eq!(output.state(), DeviceState::Suspended);

        output.destination().connect(1, constant_graph(0.5));
        assert!(output.render(16).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_offline_render_pulls_graphs() {
        let mut output = OfflineOutput::new(44100);
        output.ensure_running().unwrap();
        output.destination().connect(7, constant_graph(0.5));
        assert!(output.render(300).iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_cpal_reports_fallback_rate_until_opened() {
        let output = CpalOutput::new(44100);
        assert_eq!(output.state(), DeviceState::Closed);
        assert_eq!(output.sample_rate(), 44100);
    }
}
