//! In-memory duplex link simulator
//!
//! Models the properties of the real device link that matter to the
//! protocol: messages can be dropped in transit, adjacent messages can swap
//! order, and the whole link can be unreachable. Seeded for deterministic
//! runs.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Link fault configuration
#[derive(Clone, Debug)]
pub struct LinkConfig {
    /// Probability a message is silently lost in transit.
    pub drop_rate: f64,
    /// Probability a message swaps places with the one queued before it.
    pub reorder_rate: f64,
}

impl LinkConfig {
    pub fn lossless() -> Self {
        LinkConfig {
            drop_rate: 0.0,
            reorder_rate: 0.0,
        }
    }

    pub fn lossy() -> Self {
        LinkConfig {
            drop_rate: 0.2,
            reorder_rate: 0.1,
        }
    }

    pub fn reordering() -> Self {
        LinkConfig {
            drop_rate: 0.0,
            reorder_rate: 1.0,
        }
    }
}

/// Counters for one simulation run
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkStats {
    pub sent: u64,
    pub dropped: u64,
    pub rejected_unreachable: u64,
}

/// Simulated phone/watch link.
pub struct LinkSimulator {
    config: LinkConfig,
    rng: StdRng,
    reachable: bool,
    to_authority: VecDeque<Vec<u8>>,
    to_mirror: VecDeque<Vec<u8>>,
    stats: LinkStats,
}

impl LinkSimulator {
    pub fn new(config: LinkConfig) -> Self {
        Self::with_seed(config, 0)
    }

    pub fn with_seed(config: LinkConfig, seed: u64) -> Self {
        LinkSimulator {
            config,
            rng: StdRng::seed_from_u64(seed),
            reachable: true,
            to_authority: VecDeque::new(),
            to_mirror: VecDeque::new(),
            stats: LinkStats::default(),
        }
    }

    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Queue a watch-originated message. Returns `false` when the link is
    /// down and the sender sees an immediate send failure; a message lost
    /// in transit still returns `true`.
    pub fn send_to_authority(&mut self, bytes: Vec<u8>) -> bool {
        Self::enqueue(
            &mut self.to_authority,
            &mut self.rng,
            &self.config,
            &mut self.stats,
            self.reachable,
            bytes,
        )
    }

    /// Queue a phone-originated message.
    pub fn send_to_mirror(&mut self, bytes: Vec<u8>) -> bool {
        Self::enqueue(
            &mut self.to_mirror,
            &mut self.rng,
            &self.config,
            &mut self.stats,
            self.reachable,
            bytes,
        )
    }

    /// Deliver everything queued toward the authority.
    pub fn drain_to_authority(&mut self) -> Vec<Vec<u8>> {
        self.to_authority.drain(..).collect()
    }

    /// Deliver everything queued toward the mirror.
    pub fn drain_to_mirror(&mut self) -> Vec<Vec<u8>> {
        self.to_mirror.drain(..).collect()
    }

    fn enqueue(
        queue: &mut VecDeque<Vec<u8>>,
        rng: &mut StdRng,
        config: &LinkConfig,
        stats: &mut LinkStats,
        reachable: bool,
        bytes: Vec<u8>,
    ) -> bool {
        if !reachable {
            stats.rejected_unreachable += 1;
            return false;
        }
        stats.sent += 1;

        if config.drop_rate > 0.0 && rng.gen_bool(config.drop_rate) {
            stats.dropped += 1;
            return true;
        }

        queue.push_back(bytes);
        if queue.len() >= 2 && config.reorder_rate > 0.0 && rng.gen_bool(config.reorder_rate) {
            let last = queue.len() - 1;
            queue.swap(last, last - 1);
        }
        true
    }
}
