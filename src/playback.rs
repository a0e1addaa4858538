//! Playback session: owns the output device and at most one live graph
//!
//! Every operation is synchronous. Starting always disposes the current
//! graph before building the next, so two graphs never play at once.
//! Audio failures never escape: a device that cannot open is logged and
//! the session simply stays silent.

use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::graph_builder::{GraphInstance, SignalGraphBuilder};
use crate::output::AudioOutput;
use crate::sound_profile::SoundProfileId;

/// Plays one soundscape at a time on an injected output device
pub struct PlaybackSession<O: AudioOutput> {
    output: O,
    builder: SignalGraphBuilder,
    current: Option<GraphInstance>,
    profile: SoundProfileId,
    muted: bool,
    master_level: f32,
    mute_time_constant: f32,
}

impl<O: AudioOutput> PlaybackSession<O> {
    /// Session on `output`; the device is not touched until the first start
    pub fn new(output: O, config: &EngineConfig) -> Self {
        Self::with_builder(output, config, SignalGraphBuilder::new(config))
    }

    /// Session using a preconfigured builder (e.g. seeded noise)
    pub fn with_builder(output: O, config: &EngineConfig, builder: SignalGraphBuilder) -> Self {
        Self {
            output,
            builder,
            current: None,
            profile: config.default_profile,
            muted: false,
            master_level: config.master_level,
            mute_time_constant: config.mute_time_constant,
        }
    }

    /// Replace any current graph with a fresh one for `profile`
    pub fn start(&mut self, profile: SoundProfileId) {
        self.stop();
        self.profile = profile;

        if let Err(e) = self.output.ensure_running() {
            warn!("Output device unavailable, playing nothing: {}", e);
            return;
        }

        let level = self.effective_level();
        let sample_rate = self.output.sample_rate();
        match self
            .builder
            .build(profile, level, sample_rate, self.output.destination())
        {
            Ok(graph) => {
                info!("Playing {} (muted: {})", profile, self.muted);
                self.current = Some(graph);
            }
            Err(e) => error!("Could not build {} graph: {}", profile, e),
        }
    }

    /// Stop and release the current graph; no-op when nothing plays
    pub fn stop(&mut self) {
        if let Some(graph) = self.current.take() {
            info!("Stopping {}", graph.profile());
            graph.dispose();
        }
    }

    /// Change the sound; rebuilds only if something is playing
    pub fn switch_profile(&mut self, profile: SoundProfileId) {
        if self.current.is_some() {
            self.start(profile);
        } else {
            self.profile = profile;
        }
    }

    /// Ramp the master gain to 0 (muted) or the master level
    ///
    /// Without a graph only the remembered state changes; the next start
    /// uses it.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        let target = self.effective_level();
        if let Some(graph) = &self.current {
            graph.set_master_target(target, self.mute_time_constant);
        }
    }

    /// Flip the mute state
    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.muted);
    }

    /// Stop playback and release the device
    pub fn close(&mut self) {
        self.stop();
        self.output.close();
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Selected profile (playing or next to play)
    pub fn profile(&self) -> SoundProfileId {
        self.profile
    }

    /// Master level the current graph is at or heading to
    pub fn master_target(&self) -> Option<f32> {
        self.current.as_ref().map(|graph| graph.master_target())
    }

    pub fn current_graph(&self) -> Option<&GraphInstance> {
        self.current.as_ref()
    }

    /// Graphs built and not yet disposed
    pub fn live_graphs(&self) -> usize {
        self.builder.live_graphs()
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    fn effective_level(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_level
        }
    }
}

impl<O: AudioOutput> Drop for PlaybackSession<O> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{DeviceState, OfflineOutput};

    fn session() -> PlaybackSession<OfflineOutput> {
        PlaybackSession::new(OfflineOutput::new(44100), &EngineConfig::default())
    }

    #[test]
    fn test_device_opened_lazily() {
        let mut session = session();
        assert_eq!(session.output().state(), DeviceState::Closed);

        session.start(SoundProfileId::Rain);
        assert_eq!(session.output().state(), DeviceState::Running);
        assert_eq!(session.output().open_count(), 1);

        session.start(SoundProfileId::Wind);
        assert_eq!(session.output().open_count(), 1);
    }

    #[test]
    fn test_start_replaces_graph() {
        let mut session = session();
        session.start(SoundProfileId::Rain);
        session.start(SoundProfileId::Rain);
        assert_eq!(session.live_graphs(), 1);
        assert_eq!(session.output().destination().connection_count(), 1);
        assert_eq!(session.output().destination().peak_connections(), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut session = session();
        session.stop();
        session.start(SoundProfileId::White);
        session.stop();
        session.stop();
        assert!(!session.is_playing());
        assert_eq!(session.live_graphs(), 0);
    }

    #[test]
    fn test_switch_profile_when_stopped_only_remembers() {
        let mut session = session();
        session.switch_profile(SoundProfileId::Wind);
        assert!(!session.is_playing());
        assert_eq!(session.profile(), SoundProfileId::Wind);
        assert_eq!(session.output().state(), DeviceState::Closed);
    }

    #[test]
    fn test_mute_before_start_applies_to_next_graph() {
        let mut session = session();
        session.set_muted(true);
        assert_eq!(session.master_target(), None);

        session.start(SoundProfileId::Rain);
        assert_eq!(session.master_target(), Some(0.0));
    }

    #[test]
    fn test_toggle_mute() {
        let mut session = session();
        session.start(SoundProfileId::White);
        session.toggle_mute();
        assert!(session.is_muted());
        assert_eq!(session.master_target(), Some(0.0));
        session.toggle_mute();
        assert_eq!(session.master_target(), Some(0.5));
    }

    #[test]
    fn test_close_releases_device() {
        let mut session = session();
        session.start(SoundProfileId::White);
        session.close();
        assert!(!session.is_playing());
        assert_eq!(session.output().state(), DeviceState::Closed);
    }
}
