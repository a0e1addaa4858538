//! Signal graph construction and teardown
//!
//! [`SignalGraphBuilder::build`] turns a sound profile into a connected,
//! playing [`GraphInstance`]:
//!
//! ```text
//! noise ──> lowpass ──> [secondary gain] ──> master gain ──> destination
//!              ^               ^
//!              └── lfo × depth ┘   (whichever the profile modulates)
//! ```
//!
//! A `GraphInstance` owns its graph. Disposing it (explicitly or on drop)
//! stops the sources, disconnects every node, and detaches it from the
//! destination. Lifecycle errors during teardown are expected when handles
//! race and are only logged.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::audio_node::NodeId;
use crate::audio_node_graph::AudioNodeGraph;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::noise_buffer::NoiseBuffer;
use crate::nodes::lowpass_filter::q_from_db;
use crate::nodes::{
    BufferSourceNode, ConstantNode, GainNode, LowPassFilterNode, OscillatorNode, ParamNode,
};
use crate::output::{lock, Destination, GraphId, SharedGraph};
use crate::sound_profile::{ModulationTarget, SoundProfile, SoundProfileId};

/// Ids of the nodes a built graph is made of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNodes {
    /// Looping noise buffer playback
    pub source: NodeId,
    pub filter: NodeId,
    /// Cutoff parameter (Hz) feeding the filter
    pub cutoff: NodeId,
    /// Q parameter (linear) feeding the filter
    pub q: NodeId,
    /// Modulation oscillator, if the profile has one
    pub lfo: Option<NodeId>,
    /// Oscillator output scaled by the modulation depth
    pub lfo_depth: Option<NodeId>,
    /// Secondary gain stage (rain) and its level parameter
    pub secondary_gain: Option<NodeId>,
    pub secondary_level: Option<NodeId>,
    pub master_gain: NodeId,
    /// Master level parameter: the mute ramp target
    pub master_level: NodeId,
}

impl GraphNodes {
    /// Nodes that have to be started and stopped
    pub fn sources(&self) -> Vec<NodeId> {
        std::iter::once(self.source).chain(self.lfo).collect()
    }
}

/// Builds one graph per playback attempt
///
/// Keeps a count of graphs built and not yet disposed, shared with every
/// instance it hands out.
pub struct SignalGraphBuilder {
    block_size: usize,
    noise_seconds: f32,
    seed: Option<u64>,
    next_id: GraphId,
    live: Arc<AtomicUsize>,
}

impl SignalGraphBuilder {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            block_size: config.block_size,
            noise_seconds: config.noise_seconds,
            seed: None,
            next_id: 1,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Derive every noise buffer from `seed` (one step per build) instead of entropy
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Graphs built and not yet disposed
    pub fn live_graphs(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Build a graph for `profile`, connect it to `destination`, and start it
    ///
    /// Sources start only after every connection exists, so nothing is
    /// audible from a partially wired graph.
    pub fn build(
        &mut self,
        profile: SoundProfileId,
        master_level: f32,
        sample_rate: u32,
        destination: &Destination,
    ) -> Result<GraphInstance> {
        let id = self.next_id;
        self.next_id += 1;

        let noise = match self.seed {
            Some(seed) => {
                NoiseBuffer::generate_seeded(self.noise_seconds, sample_rate, seed.wrapping_add(id))
            }
            None => NoiseBuffer::generate(self.noise_seconds, sample_rate),
        };

        let params = profile.resolve();
        let (graph, nodes) = self.wire(&params, noise, master_level, sample_rate)?;
        let graph: SharedGraph = Arc::new(Mutex::new(graph));

        destination.connect(id, graph.clone());
        self.live.fetch_add(1, Ordering::SeqCst);

        let instance = GraphInstance {
            id,
            profile,
            graph,
            nodes,
            destination: destination.clone(),
            live: self.live.clone(),
            disposed: false,
        };

        {
            let mut graph = lock(&instance.graph);
            for source in instance.nodes.sources() {
                graph.start_node(source)?;
            }
        }

        debug!(
            "Built graph {} for {} ({} nodes, {} Hz)",
            id,
            profile,
            instance.node_count(),
            sample_rate
        );
        Ok(instance)
    }

    fn wire(
        &self,
        params: &SoundProfile,
        noise: NoiseBuffer,
        master_level: f32,
        sample_rate: u32,
    ) -> Result<(AudioNodeGraph, GraphNodes)> {
        let mut graph = AudioNodeGraph::new(sample_rate as f32, self.block_size);

        let source = graph.add_audio_node(Box::new(BufferSourceNode::new(noise)));

        // LFO scaled by depth, routed into the targeted parameter
        let (lfo, lfo_depth, target) = match params.modulation {
            Some(modulation) => {
                let rate = graph.add_audio_node(Box::new(ConstantNode::new(modulation.rate_hz)));
                let lfo = graph.add_audio_node(Box::new(OscillatorNode::new(
                    rate,
                    modulation.waveform,
                )));
                let depth = graph.add_audio_node(Box::new(ConstantNode::new(modulation.depth)));
                let scaled = graph.add_audio_node(Box::new(GainNode::new(lfo, depth)));
                (Some(lfo), Some(scaled), Some(modulation.target))
            }
            None => (None, None, None),
        };
        let modulation_for = |wanted: ModulationTarget| -> Vec<NodeId> {
            match (lfo_depth, target) {
                (Some(scaled), Some(t)) if t == wanted => vec![scaled],
                _ => Vec::new(),
            }
        };

        let cutoff = graph.add_audio_node(Box::new(ParamNode::with_modulation(
            params.filter_cutoff_hz,
            modulation_for(ModulationTarget::FilterCutoff),
        )));
        let q = graph.add_audio_node(Box::new(ParamNode::new(q_from_db(params.filter_q_db))));
        let filter = graph.add_audio_node(Box::new(LowPassFilterNode::new(source, cutoff, q)));

        let (pre_master, secondary_gain, secondary_level) = match params.secondary_gain_base {
            Some(base) => {
                let level = graph.add_audio_node(Box::new(ParamNode::with_modulation(
                    base,
                    modulation_for(ModulationTarget::SecondaryGain),
                )));
                let gain = graph.add_audio_node(Box::new(GainNode::new(filter, level)));
                (gain, Some(gain), Some(level))
            }
            None => (filter, None, None),
        };

        let level = graph.add_audio_node(Box::new(ParamNode::new(master_level)));
        let master_gain = graph.add_audio_node(Box::new(GainNode::new(pre_master, level)));
        graph.set_output(master_gain);
        graph.build_processor()?;

        let nodes = GraphNodes {
            source,
            filter,
            cutoff,
            q,
            lfo,
            lfo_depth,
            secondary_gain,
            secondary_level,
            master_gain,
            master_level: level,
        };
        Ok((graph, nodes))
    }
}

/// A built, connected graph for one playback attempt
pub struct GraphInstance {
    id: GraphId,
    profile: SoundProfileId,
    graph: SharedGraph,
    nodes: GraphNodes,
    destination: Destination,
    live: Arc<AtomicUsize>,
    disposed: bool,
}

impl GraphInstance {
    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn profile(&self) -> SoundProfileId {
        self.profile
    }

    pub fn nodes(&self) -> &GraphNodes {
        &self.nodes
    }

    /// The shared graph (also held by the destination until disposal)
    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        lock(&self.graph).node_count()
    }

    /// Ramp the master level toward `target` with the given time constant
    pub fn set_master_target(&self, target: f32, time_constant: f32) {
        let master = self.nodes.master_level;
        if let Some(param) = lock(&self.graph).param_mut(master) {
            param.set_target(target, time_constant);
        }
    }

    /// Level the master gain is at or heading to
    pub fn master_target(&self) -> f32 {
        let master = self.nodes.master_level;
        lock(&self.graph)
            .param_mut(master)
            .map_or(0.0, |param| param.target())
    }

    /// Stop and disconnect everything
    pub fn dispose(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        {
            let mut graph = lock(&self.graph);
            for source in self.nodes.sources() {
                if let Err(e) = graph.stop_node(source) {
                    debug!("Ignoring stop error on graph {}: {}", self.id, e);
                }
            }
            for node in 0..graph.node_count() {
                if let Err(e) = graph.disconnect_node(node) {
                    debug!("Ignoring disconnect error on graph {}: {}", self.id, e);
                }
            }
        }

        self.destination.disconnect(self.id);
        self.live.fetch_sub(1, Ordering::SeqCst);
        debug!("Disposed graph {} ({})", self.id, self.profile);
    }
}

impl Drop for GraphInstance {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_node::AudioNode;
    use crate::block_processor::SourceState;

    fn builder() -> SignalGraphBuilder {
        SignalGraphBuilder::new(&EngineConfig::default()).with_seed(9)
    }

    #[test]
    fn test_white_graph_shape() {
        let destination = Destination::new();
        let graph = builder()
            .build(SoundProfileId::White, 0.5, 44100, &destination)
            .unwrap();

        let nodes = graph.nodes();
        assert!(nodes.lfo.is_none());
        assert!(nodes.secondary_gain.is_none());
        assert_eq!(nodes.sources(), vec![nodes.source]);
        assert_eq!(destination.connection_count(), 1);
    }

    #[test]
    fn test_wind_modulates_cutoff() {
        let destination = Destination::new();
        let graph = builder()
            .build(SoundProfileId::Wind, 0.5, 44100, &destination)
            .unwrap();

        let nodes = graph.nodes().clone();
        assert!(nodes.lfo.is_some());
        assert!(nodes.secondary_gain.is_none());

        let mut shared = lock(graph.graph());
        let cutoff = shared.param_mut(nodes.cutoff).unwrap();
        assert_eq!(cutoff.value(), 400.0);
        assert_eq!(cutoff.input_nodes().len(), 1);
    }

    #[test]
    fn test_rain_has_secondary_gain() {
        let destination = Destination::new();
        let graph = builder()
            .build(SoundProfileId::Rain, 0.5, 44100, &destination)
            .unwrap();

        let nodes = graph.nodes().clone();
        assert!(nodes.secondary_gain.is_some());
        let mut shared = lock(graph.graph());
        let level = shared.param_mut(nodes.secondary_level.unwrap()).unwrap();
        assert_eq!(level.value(), 0.8);
        assert_eq!(level.input_nodes().len(), 1);
        // Cutoff is not modulated for rain
        assert_eq!(shared.param_mut(nodes.cutoff).unwrap().input_nodes().len(), 0);
    }

    #[test]
    fn test_sources_started_after_build() {
        let destination = Destination::new();
        let graph = builder()
            .build(SoundProfileId::Wind, 0.5, 44100, &destination)
            .unwrap();

        let shared = lock(graph.graph());
        for source in graph.nodes().sources() {
            assert_eq!(shared.source_state(source), Some(SourceState::Playing));
        }
    }

    #[test]
    fn test_dispose_releases_everything() {
        let destination = Destination::new();
        let mut builder = builder();
        let graph = builder
            .build(SoundProfileId::Rain, 0.5, 44100, &destination)
            .unwrap();
        let shared = graph.graph().clone();
        let nodes = graph.nodes().clone();
        assert_eq!(builder.live_graphs(), 1);

        graph.dispose();

        assert_eq!(builder.live_graphs(), 0);
        assert_eq!(destination.connection_count(), 0);
        let shared = lock(&shared);
        assert_eq!(shared.source_state(nodes.source), Some(SourceState::Stopped));
        assert!((0..shared.node_count()).all(|id| !shared.is_connected(id)));
    }

    #[test]
    fn test_drop_disposes() {
        let destination = Destination::new();
        let mut builder = builder();
        {
            let _graph = builder
                .build(SoundProfileId::White, 0.5, 44100, &destination)
                .unwrap();
            assert_eq!(builder.live_graphs(), 1);
        }
        assert_eq!(builder.live_graphs(), 0);
        assert_eq!(destination.connection_count(), 0);
    }

    #[test]
    fn test_master_target() {
        let destination = Destination::new();
        let graph = builder()
            .build(SoundProfileId::White, 0.0, 44100, &destination)
            .unwrap();
        assert_eq!(graph.master_target(), 0.0);

        graph.set_master_target(0.5, 0.1);
        assert_eq!(graph.master_target(), 0.5);
    }

    #[test]
    fn test_graph_ids_are_unique() {
        let destination = Destination::new();
        let mut builder = builder();
        let a = builder.build(SoundProfileId::White, 0.5, 44100, &destination).unwrap();
        let b = builder.build(SoundProfileId::White, 0.5, 44100, &destination).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
