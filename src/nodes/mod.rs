/// Audio node implementations for the soundscape graph
///
/// # Node Categories
///
/// ## Source Nodes (start/stop lifecycle)
/// - [`buffer_source::BufferSourceNode`] - Looping playback of a noise buffer
/// - [`oscillator::OscillatorNode`] - Low-frequency oscillator (sine, triangle)
///
/// ## Control Nodes
/// - [`constant::ConstantNode`] - Output constant value
/// - [`param::ParamNode`] - Automatable parameter (intrinsic value + modulation inputs)
///
/// ## Processing Nodes
/// - [`gain::GainNode`] - Multiply a signal by a gain signal
/// - [`lowpass_filter::LowPassFilterNode`] - 2nd-order biquad low-pass filter
pub mod buffer_source;
pub mod constant;
pub mod gain;
pub mod lowpass_filter;
pub mod oscillator;
pub mod param;

pub use buffer_source::BufferSourceNode;
pub use constant::ConstantNode;
pub use gain::GainNode;
pub use lowpass_filter::LowPassFilterNode;
pub use oscillator::{OscillatorNode, Waveform};
pub use param::ParamNode;
