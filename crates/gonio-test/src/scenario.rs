//! Two-device harness and end-to-end protocol scenarios
//!
//! Wires a full phone node and a watch mirror across the link simulator and
//! pumps messages until the system is quiescent.

use std::sync::Arc;

use parking_lot::Mutex;

use gonio_core::GonioResult;
use gonio_record::{MemoryImageStore, MemoryRepository};
use gonio_runtime::{MeasureNode, Transport};
use gonio_sync::Mirror;
use gonio_wire::{IntentMsg, Message};

use crate::{LinkConfig, LinkSimulator};

/// Transport that buffers the node's outbound messages for the harness to
/// feed through the link.
#[derive(Default)]
struct OutboundBuffer {
    queued: Mutex<Vec<Vec<u8>>>,
}

impl OutboundBuffer {
    fn drain(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.queued.lock())
    }
}

impl Transport for OutboundBuffer {
    fn send(&self, message: &Message) -> GonioResult<()> {
        self.queued.lock().push(message.encode());
        Ok(())
    }
}

/// A phone node and a watch mirror joined by a simulated link.
pub struct Harness {
    pub node: MeasureNode,
    pub mirror: Mirror,
    pub link: LinkSimulator,
    pub repo: Arc<MemoryRepository>,
    pub images: Arc<MemoryImageStore>,
    outbound: Arc<OutboundBuffer>,
}

impl Harness {
    pub fn new(config: LinkConfig) -> Self {
        Self::with_seed(config, 0)
    }

    pub fn with_seed(config: LinkConfig, seed: u64) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let images = Arc::new(MemoryImageStore::new());
        let outbound = Arc::new(OutboundBuffer::default());
        let node = MeasureNode::new(repo.clone(), images.clone(), outbound.clone());
        Harness {
            node,
            mirror: Mirror::new(),
            link: LinkSimulator::with_seed(config, seed),
            repo,
            images,
            outbound,
        }
    }

    /// Send a watch intent over the link; a down link is surfaced to the
    /// mirror as a send failure.
    pub fn watch_send(&mut self, intent: IntentMsg) {
        let bytes = Message::Intent(intent).encode();
        if !self.link.send_to_authority(bytes) {
            self.mirror.send_failed(intent.seq);
        }
    }

    /// Shuttle messages both ways until nothing is in flight.
    pub fn pump(&mut self) {
        loop {
            let mut moved = false;

            for bytes in self.outbound.drain() {
                self.link.send_to_mirror(bytes);
                moved = true;
            }
            for bytes in self.link.drain_to_authority() {
                let _ = self.node.on_message(&bytes);
                moved = true;
            }
            for bytes in self.link.drain_to_mirror() {
                if let Ok(message) = Message::parse(&bytes) {
                    self.mirror.apply(message);
                }
                moved = true;
            }

            if !moved {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonio_core::Side;
    use gonio_pose::{Joint, JointPoint, PoseFrame, Snapshot};
    use gonio_record::RecordRepository;

    fn frame_at(angle_deg: f64) -> PoseFrame {
        let rad = angle_deg.to_radians();
        let knee = (0.5, 0.5);
        let ankle = (knee.0 + 0.3 * rad.sin(), knee.1 - 0.3 * rad.cos());
        PoseFrame::new(Snapshot::new(vec![angle_deg as u8]))
            .with_point(Joint::RightHip, JointPoint::new(0.5, 0.2, 0.9))
            .with_point(Joint::RightKnee, JointPoint::new(knee.0, knee.1, 0.9))
            .with_point(Joint::RightAnkle, JointPoint::new(ankle.0, ankle.1, 0.9))
    }

    #[test]
    fn test_watch_driven_measurement_round_trip() {
        let mut h = Harness::new(LinkConfig::lossless());
        h.node.begin_camera_session();
        h.pump();
        assert!(h.mirror.camera_ready());

        let start = h.mirror.start_measuring().unwrap();
        h.watch_send(start);
        h.pump();
        assert!(h.node.is_measuring());
        assert!(h.mirror.confirmed().is_measuring);
        assert!(!h.mirror.has_pending());

        for angle in [170.0, 165.0, 100.0, 95.0, 175.0] {
            h.node.on_frame(&frame_at(angle));
        }

        let stop = h.mirror.stop_measuring().unwrap();
        h.watch_send(stop);
        h.pump();

        assert!(!h.node.is_measuring());
        assert!(!h.mirror.is_measuring());
        assert_eq!(h.repo.len(), 1);
        let record = h.repo.latest().unwrap().unwrap();
        assert!((record.rom() - 80.0).abs() < 2.0);
        assert!(record.flexion_image.is_some());
    }

    #[test]
    fn test_optimistic_start_reverted_when_camera_not_ready() {
        let mut h = Harness::new(LinkConfig::lossless());

        let start = h.mirror.start_measuring().unwrap();
        assert!(h.mirror.is_measuring());

        h.watch_send(start);
        h.pump();

        // The authority rejected; the preview reverted on the ack
        assert!(!h.node.is_measuring());
        assert!(!h.mirror.is_measuring());
        assert!(!h.mirror.has_pending());
    }

    #[test]
    fn test_reconnect_settles_then_queries_status() {
        let mut h = Harness::new(LinkConfig::lossless());
        h.link.set_reachable(false);

        // State changes while the watch is away
        h.node.begin_camera_session();
        h.node.start().unwrap();
        h.outbound.drain();
        assert!(!h.mirror.camera_ready());

        h.link.set_reachable(true);
        let settle = h.mirror.set_reachable(true);
        assert!(settle.is_some());

        // After the settle delay the watch queries and the phone re-broadcasts
        h.node.on_peer_reachable(true);
        let query = h.mirror.query_status().unwrap();
        h.watch_send(query);
        h.pump();

        assert!(h.mirror.camera_ready());
        assert!(h.mirror.is_measuring());
    }

    #[test]
    fn test_reordered_broadcasts_keep_newest_state() {
        let mut h = Harness::new(LinkConfig::reordering());
        h.node.begin_camera_session();
        h.node.start().unwrap();
        h.pump();

        // The measuring=true snapshot arrived first; the older camera-only
        // snapshot behind it must be dropped as stale
        assert!(h.mirror.camera_ready());
        assert!(h.mirror.is_measuring());
    }

    #[test]
    fn test_send_failure_on_down_link_clears_preview() {
        let mut h = Harness::new(LinkConfig::lossless());
        h.link.set_reachable(false);

        let start = h.mirror.start_measuring().unwrap();
        assert!(h.mirror.is_measuring());

        h.watch_send(start);
        assert!(!h.mirror.is_measuring());
        assert!(!h.mirror.has_pending());
    }

    #[test]
    fn test_navigate_and_start_from_watch() {
        let mut h = Harness::new(LinkConfig::lossless());

        let nav = h.mirror.navigate_and_start();
        h.watch_send(nav);
        h.pump();
        assert!(h.node.navigation_requested());
        assert!(!h.node.is_measuring());

        // The measure view opens, the camera comes up, the session starts
        h.node.begin_camera_session();
        h.pump();
        assert!(h.node.is_measuring());
        assert!(h.mirror.confirmed().is_measuring);
    }

    #[test]
    fn test_lossy_link_state_recovers_on_query() {
        let mut h = Harness::with_seed(
            LinkConfig {
                drop_rate: 1.0,
                reorder_rate: 0.0,
            },
            3,
        );
        h.node.begin_camera_session();
        h.pump();
        assert!(!h.mirror.camera_ready());

        // The query/ack path uses the same lossy link; make it reliable
        // again and recover via status
        h.link = LinkSimulator::new(LinkConfig::lossless());
        h.mirror.set_reachable(true);
        let query = h.mirror.query_status().unwrap();
        h.watch_send(query);
        h.pump();
        assert!(h.mirror.camera_ready());
    }

    #[test]
    fn test_side_selection_survives_round_trip() {
        let mut h = Harness::new(LinkConfig::lossless());
        h.node.select_side(Side::Left);
        h.node.begin_camera_session();

        let start = h.mirror.start_measuring().unwrap();
        h.watch_send(start);
        h.pump();

        // Frames only carry right-leg joints; the left-side session records
        // nothing and stop reports no samples
        h.node.on_frame(&frame_at(120.0));
        let stop = h.mirror.stop_measuring().unwrap();
        h.watch_send(stop);
        h.pump();

        assert!(h.repo.is_empty());
        assert!(!h.node.is_measuring());
    }
}
