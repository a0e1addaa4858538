//! Error types for the soundscape engine
//!
//! Audio-graph failures are absorbed inside the playback layer; these types
//! surface only where a caller can act on them (device setup, configuration,
//! WAV rendering, CLI parsing).

use std::fmt;

use crate::audio_node::NodeId;

/// Lifecycle errors raised by individual graph nodes
///
/// The playback layer treats every one of these as benign: a stale handle
/// touching a node that is already stopped or disconnected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Node id does not exist in the graph
    UnknownNode(NodeId),
    /// `start` called on a source that already started
    AlreadyStarted(NodeId),
    /// `stop` called on a source that never started
    NotStarted(NodeId),
    /// `stop` called on a source that is already stopped
    AlreadyStopped(NodeId),
    /// `disconnect` called twice on the same node
    AlreadyDisconnected(NodeId),
    /// Lifecycle operation requested on a node that is not a source
    NotASource(NodeId),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::UnknownNode(id) => write!(f, "Unknown node: {}", id),
            NodeError::AlreadyStarted(id) => write!(f, "Node {} already started", id),
            NodeError::NotStarted(id) => write!(f, "Node {} was never started", id),
            NodeError::AlreadyStopped(id) => write!(f, "Node {} already stopped", id),
            NodeError::AlreadyDisconnected(id) => write!(f, "Node {} already disconnected", id),
            NodeError::NotASource(id) => write!(f, "Node {} is not a source node", id),
        }
    }
}

impl std::error::Error for NodeError {}

/// Soundscape error types
#[derive(Debug)]
pub enum SoundscapeError {
    /// No usable output device, or the device refused a request
    Device(String),
    /// Failed to build, start, or pause the output stream
    Stream(String),
    /// Invalid graph structure (dangling input, no output node)
    Graph(String),
    /// Node lifecycle error
    Node(NodeError),
    /// Invalid engine configuration
    Config(String),
    /// Unknown sound profile name
    UnknownProfile(String),
    /// IO error
    Io(std::io::Error),
    /// WAV encoding error
    Wav(hound::Error),
}

impl fmt::Display for SoundscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundscapeError::Device(msg) => write!(f, "Audio device error: {}", msg),
            SoundscapeError::Stream(msg) => write!(f, "Audio stream error: {}", msg),
            SoundscapeError::Graph(msg) => write!(f, "Audio graph error: {}", msg),
            SoundscapeError::Node(e) => write!(f, "Audio node error: {}", e),
            SoundscapeError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SoundscapeError::UnknownProfile(name) => {
                write!(f, "Unknown sound profile '{}' (expected rain, wind or white)", name)
            }
            SoundscapeError::Io(e) => write!(f, "IO error: {}", e),
            SoundscapeError::Wav(e) => write!(f, "WAV error: {}", e),
        }
    }
}

impl std::error::Error for SoundscapeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SoundscapeError::Node(e) => Some(e),
            SoundscapeError::Io(e) => Some(e),
            SoundscapeError::Wav(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NodeError> for SoundscapeError {
    fn from(e: NodeError) -> Self {
        SoundscapeError::Node(e)
    }
}

impl From<std::io::Error> for SoundscapeError {
    fn from(e: std::io::Error) -> Self {
        SoundscapeError::Io(e)
    }
}

impl From<hound::Error> for SoundscapeError {
    fn from(e: hound::Error) -> Self {
        SoundscapeError::Wav(e)
    }
}

impl From<toml::de::Error> for SoundscapeError {
    fn from(e: toml::de::Error) -> Self {
        SoundscapeError::Config(e.to_string())
    }
}

/// Result type for soundscape operations
pub type Result<T> = std::result::Result<T, SoundscapeError>;
