//! # Soundscape - procedural ambient noise engine
//!
//! Generates rain, wind, and filtered white noise for timed focus sessions.
//! Nothing is sampled: every sound is a looped block of random noise shaped
//! by a low-pass filter and, for rain and wind, a slow oscillator.
//!
//! ## Layers
//!
//! - **Audio graph runtime**: [`audio_node`], [`dependency_graph`],
//!   [`block_processor`], [`audio_node_graph`], and the DSP [`nodes`]
//! - **Sound data**: [`noise_buffer`] and [`sound_profile`]
//! - **Graph lifecycle**: [`graph_builder`] builds one connected graph per
//!   playback attempt and tears it down again
//! - **Session**: [`playback`] keeps at most one graph alive on an
//!   injected [`output`] device; [`session_timer`] runs the countdown
//!
//! ## Quick Start
//!
//! ```no_run
//! use soundscape::{CpalOutput, EngineConfig, SessionTimer, SoundProfileId};
//!
//! let config = EngineConfig::default();
//! let mut timer = SessionTimer::new(CpalOutput::new(config.fallback_sample_rate), &config);
//!
//! timer.change_profile(SoundProfileId::Wind);
//! timer.toggle(); // starts playback
//! for _ in 0..3 {
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//!     timer.tick();
//! }
//! timer.reset(); // stops playback
//! ```
//!
//! Tests and file rendering use [`OfflineOutput`], which renders on demand
//! instead of from a device callback.

pub mod audio_node;
pub mod audio_node_graph;
pub mod block_processor;
pub mod config;
pub mod dependency_graph;
pub mod error;
pub mod graph_builder;
pub mod noise_buffer;
pub mod nodes;
pub mod output;
pub mod playback;
pub mod render;
pub mod session_timer;
pub mod sound_profile;

pub use config::EngineConfig;
pub use error::{NodeError, Result, SoundscapeError};
pub use graph_builder::{GraphInstance, GraphNodes, SignalGraphBuilder};
pub use noise_buffer::NoiseBuffer;
pub use output::{AudioOutput, CpalOutput, Destination, DeviceState, OfflineOutput};
pub use playback::PlaybackSession;
pub use render::{render_samples, render_to_wav, RenderRequest, RenderStats, MIN_SAMPLE_RATE};
pub use session_timer::{format_time, DurationPreset, SessionTimer, TimerState};
pub use sound_profile::{Modulation, ModulationTarget, SoundProfile, SoundProfileId};
