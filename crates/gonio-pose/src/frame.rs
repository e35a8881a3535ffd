//! Per-frame pose data

use std::collections::HashMap;
use std::sync::Arc;

use crate::{Joint, JointPoint};

/// A captured still image associated with a frame.
///
/// The camera's frame buffer is single-slot and overwritten every frame, so
/// the snapshot must be copied out within the same frame-processing step
/// that consumes it. `Snapshot` owns that copy; clones share it.
#[derive(Clone, Default)]
pub struct Snapshot(Arc<Vec<u8>>);

impl Snapshot {
    pub fn new(data: Vec<u8>) -> Self {
        Snapshot(Arc::new(data))
    }

    pub fn data(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Snapshot({} bytes)", self.0.len())
    }
}

/// One camera frame's worth of pose data: the detected joint mapping plus
/// the captured image.
#[derive(Debug, Clone, Default)]
pub struct PoseFrame {
    points: HashMap<Joint, JointPoint>,
    snapshot: Snapshot,
}

impl PoseFrame {
    pub fn new(snapshot: Snapshot) -> Self {
        PoseFrame {
            points: HashMap::new(),
            snapshot,
        }
    }

    /// Get a detected point, if the detector reported this joint.
    pub fn point(&self, joint: Joint) -> Option<JointPoint> {
        self.points.get(&joint).copied()
    }

    pub fn set_point(&mut self, joint: Joint, point: JointPoint) {
        self.points.insert(joint, point);
    }

    pub fn with_point(mut self, joint: Joint, point: JointPoint) -> Self {
        self.set_point(joint, point);
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_points() {
        let frame = PoseFrame::new(Snapshot::new(vec![1, 2, 3]))
            .with_point(Joint::LeftKnee, JointPoint::new(0.5, 0.5, 0.9));

        assert!(frame.point(Joint::LeftKnee).is_some());
        assert!(frame.point(Joint::RightKnee).is_none());
        assert_eq!(frame.snapshot().len(), 3);
    }

    #[test]
    fn test_snapshot_clone_shares_data() {
        let snap = Snapshot::new(vec![0u8; 64]);
        let copy = snap.clone();
        assert_eq!(copy.data(), snap.data());
    }
}
