//! Fog queue congestion: per-node load counters that turn into queueing
//! delay, with a hard capacity past which a fixed overflow penalty applies.

use iot_lab_abstract::{ConfigError, QueueConfig};
use serde::Serialize;

use crate::error::Result;
use crate::rng::RandomStream;

/// Load after a node admits one task, given whether it finished one right after.
///
/// The admitted task always occupies a slot first; a release then frees one,
/// never going below zero.
pub fn load_transition(before: u32, released: bool) -> u32 {
    let occupied = before + 1;
    if released {
        occupied.saturating_sub(1)
    } else {
        occupied
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FogNode {
    pub id: usize,
    load: u32,
    capacity: u32,
}

impl FogNode {
    pub fn new(id: usize, capacity: u32) -> Self {
        Self {
            id,
            load: 0,
            capacity,
        }
    }

    pub fn load(&self) -> u32 {
        self.load
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.load >= self.capacity
    }
}

/// How a node handled one task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// The task queued behind `load_before` others.
    Queued {
        queue_delay: f64,
        load_before: u32,
        load_after: u32,
        released: bool,
    },
    /// The node was full; the task took the penalty and no slot.
    Overflow { penalty: f64 },
}

impl Admission {
    pub fn queue_delay(&self) -> f64 {
        match self {
            Admission::Queued { queue_delay, .. } => *queue_delay,
            Admission::Overflow { penalty } => *penalty,
        }
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, Admission::Overflow { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispatch {
    pub node: usize,
    pub admission: Admission,
}

/// The set of fog nodes of one run.
#[derive(Debug, Clone)]
pub struct FogCluster {
    nodes: Vec<FogNode>,
    queue: QueueConfig,
}

impl FogCluster {
    /// All nodes start empty. A zero capacity is accepted here and makes every
    /// task overflow; full runs reject it during config validation.
    pub fn new(node_count: usize, queue: QueueConfig) -> Result<Self> {
        if node_count == 0 {
            return Err(ConfigError::NoFogNodes.into());
        }
        let nodes = (0..node_count)
            .map(|id| FogNode::new(id, queue.capacity))
            .collect();
        Ok(Self { nodes, queue })
    }

    /// Pick a node uniformly at random and let it handle one task.
    ///
    /// Draws the node index, then the release coin only if the task was
    /// admitted.
    pub fn dispatch(&mut self, stream: &mut RandomStream) -> Dispatch {
        let node = stream.index(self.nodes.len());
        let admission = self.admit(node, stream);
        Dispatch { node, admission }
    }

    /// Let node `id` handle one task. `id` comes from `dispatch`, so it is
    /// always in range.
    fn admit(&mut self, id: usize, stream: &mut RandomStream) -> Admission {
        let queue = self.queue;
        let node = &mut self.nodes[id];

        if node.is_full() {
            return Admission::Overflow {
                penalty: queue.overflow_penalty,
            };
        }

        let load_before = node.load;
        let released = stream.chance(queue.release_probability);
        node.load = load_transition(load_before, released);

        Admission::Queued {
            queue_delay: f64::from(load_before) * queue.unit_delay,
            load_before,
            load_after: node.load,
            released,
        }
    }

    pub fn nodes(&self) -> &[FogNode] {
        &self.nodes
    }

    pub fn loads(&self) -> Vec<u32> {
        self.nodes.iter().map(FogNode::load).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(capacity: u32, release_probability: f64) -> QueueConfig {
        QueueConfig {
            capacity,
            release_probability,
            ..Default::default()
        }
    }

    #[test]
    fn transition_rule() {
        assert_eq!(load_transition(0, false), 1);
        assert_eq!(load_transition(0, true), 0);
        assert_eq!(load_transition(7, true), 7);
        assert_eq!(load_transition(7, false), 8);
    }

    #[test]
    fn zero_capacity_overflows_every_task() {
        let mut cluster = FogCluster::new(3, queue(0, 0.5)).unwrap();
        let mut stream = RandomStream::seeded(42);
        for _ in 0..200 {
            let dispatch = cluster.dispatch(&mut stream);
            assert_eq!(dispatch.admission, Admission::Overflow { penalty: 100.0 });
            assert_eq!(dispatch.admission.queue_delay(), 100.0);
        }
        assert_eq!(cluster.loads(), vec![0, 0, 0]);
        // Only the node choice is drawn on the overflow path.
        assert_eq!(stream.draws(), 200);
    }

    #[test]
    fn queue_delay_grows_with_load_until_full() {
        let mut cluster = FogCluster::new(1, queue(3, 0.0)).unwrap();
        let mut stream = RandomStream::seeded(1);

        let delays: Vec<f64> = (0..5)
            .map(|_| cluster.dispatch(&mut stream).admission.queue_delay())
            .collect();
        assert_eq!(delays, vec![0.0, 0.5, 1.0, 100.0, 100.0]);
        assert_eq!(cluster.loads(), vec![3]);
        assert!(cluster.nodes()[0].is_full());
    }

    #[test]
    fn certain_release_keeps_node_empty() {
        let mut cluster = FogCluster::new(2, queue(5, 1.0)).unwrap();
        let mut stream = RandomStream::seeded(9);
        for _ in 0..50 {
            let dispatch = cluster.dispatch(&mut stream);
            assert_eq!(
                dispatch.admission,
                Admission::Queued {
                    queue_delay: 0.0,
                    load_before: 0,
                    load_after: 0,
                    released: true,
                }
            );
        }
    }

    #[test]
    fn loads_never_exceed_capacity() {
        let mut cluster = FogCluster::new(4, queue(10, 0.3)).unwrap();
        let mut stream = RandomStream::seeded(5);
        for _ in 0..1_000 {
            let dispatch = cluster.dispatch(&mut stream);
            assert!(dispatch.node < 4);
            assert!(dispatch.admission.queue_delay() >= 0.0);
            if let Admission::Queued {
                load_before,
                load_after,
                released,
                ..
            } = dispatch.admission
            {
                assert_eq!(load_after, load_transition(load_before, released));
            }
        }
        assert!(cluster.loads().iter().all(|l| *l <= 10));
    }

    #[test]
    fn no_nodes_is_a_config_error() {
        assert!(FogCluster::new(0, QueueConfig::default()).is_err());
    }
}
