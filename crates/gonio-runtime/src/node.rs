//! Measurement node - single owner of mutable measurement state
//!
//! Camera frames arrive on the capture context and watch messages on the
//! link context. Both paths lock the same inner state, so detector, session
//! and authority transitions can never interleave.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use gonio_core::{GonioResult, RecordId, Side, Timestamp};
use gonio_pose::{knee_angle, PoseFrame};
use gonio_record::{ImageStore, MeasuredRecord, RecordRepository};
use gonio_session::{MeasurementOutcome, MeasurementSession, ReadyPoseDetector};
use gonio_sync::{Authority, AuthorityAction};
use gonio_wire::Message;

use crate::Transport;

struct Inner {
    side: Side,
    detector: ReadyPoseDetector,
    session: MeasurementSession,
    authority: Authority,
    display_angle: Option<f64>,
    /// Set by a NavigateAndStart intent when the camera is closed; consumed
    /// by the next `begin_camera_session`.
    navigation_requested: bool,
    next_record: u64,
}

/// Phone-side measurement node.
pub struct MeasureNode {
    inner: Mutex<Inner>,
    repository: Arc<dyn RecordRepository>,
    images: Arc<dyn ImageStore>,
    transport: Arc<dyn Transport>,
}

impl MeasureNode {
    pub fn new(
        repository: Arc<dyn RecordRepository>,
        images: Arc<dyn ImageStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        MeasureNode {
            inner: Mutex::new(Inner {
                side: Side::Right,
                detector: ReadyPoseDetector::new(),
                session: MeasurementSession::new(),
                authority: Authority::new(),
                display_angle: None,
                navigation_requested: false,
                next_record: 0,
            }),
            repository,
            images,
            transport,
        }
    }

    pub fn side(&self) -> Side {
        self.inner.lock().side
    }

    pub fn select_side(&self, side: Side) {
        self.inner.lock().side = side;
    }

    pub fn camera_ready(&self) -> bool {
        self.inner.lock().authority.camera_ready()
    }

    pub fn is_measuring(&self) -> bool {
        self.inner.lock().authority.is_measuring()
    }

    /// Latest knee angle extracted from the frame stream, if the last frame
    /// had a usable pose.
    pub fn display_angle(&self) -> Option<f64> {
        self.inner.lock().display_angle
    }

    /// Ready-pose hold progress in [0, 1].
    pub fn ready_progress(&self) -> f64 {
        self.inner.lock().detector.progress()
    }

    pub fn navigation_requested(&self) -> bool {
        self.inner.lock().navigation_requested
    }

    /// Camera became available. Broadcasts the change; a queued navigation
    /// request starts measurement immediately.
    pub fn begin_camera_session(&self) {
        let mut inner = self.inner.lock();
        let snap = inner.authority.set_camera_ready(true);
        self.dispatch(Message::Snapshot(snap));

        if inner.navigation_requested {
            inner.navigation_requested = false;
            if let Err(err) = self.start_locked(&mut inner) {
                tracing::warn!(%err, "queued navigation start failed");
            }
        }
    }

    /// Camera torn down. Clears the hold detector and broadcasts; a session
    /// in progress is left as-is and finalizes on its own stop.
    pub fn end_camera_session(&self) {
        let mut inner = self.inner.lock();
        inner.detector.reset();
        let snap = inner.authority.set_camera_ready(false);
        self.dispatch(Message::Snapshot(snap));
    }

    /// Process one camera frame.
    pub fn on_frame(&self, frame: &PoseFrame) {
        self.on_frame_at(frame, Instant::now());
    }

    /// `on_frame` with an explicit clock, for deterministic callers and
    /// tests.
    pub fn on_frame_at(&self, frame: &PoseFrame, now: Instant) {
        let mut inner = self.inner.lock();

        let Some(angle) = knee_angle(frame, inner.side) else {
            inner.display_angle = None;
            return;
        };
        inner.display_angle = Some(angle);

        if inner.session.is_active() {
            inner.session.update(angle, frame.snapshot());
        } else if inner.detector.sample_at(angle, now) {
            if let Err(err) = self.start_locked(&mut inner) {
                tracing::warn!(%err, "auto-start failed");
            }
        }
    }

    /// Start a measurement session locally.
    pub fn start(&self) -> GonioResult<()> {
        let mut inner = self.inner.lock();
        self.start_locked(&mut inner)
    }

    /// Stop the session and persist the finalized record.
    pub fn stop(&self) -> GonioResult<MeasuredRecord> {
        let mut inner = self.inner.lock();
        self.stop_locked(&mut inner)
    }

    /// Process one inbound message from the watch.
    pub fn on_message(&self, bytes: &[u8]) -> GonioResult<()> {
        let message = Message::parse(bytes)?;
        let mut inner = self.inner.lock();

        match message {
            Message::Intent(intent) => {
                let outcome = inner.authority.handle_intent(intent);
                self.dispatch(Message::Ack(outcome.ack));

                match outcome.action {
                    Some(AuthorityAction::StartSession) => {
                        if let Err(err) = self.start_locked(&mut inner) {
                            tracing::warn!(%err, "remote start failed after validation");
                        }
                    }
                    Some(AuthorityAction::StopSession) => {
                        if let Err(err) = self.stop_locked(&mut inner) {
                            tracing::warn!(%err, "remote stop produced no record");
                        }
                    }
                    Some(AuthorityAction::NavigateAndStart) => {
                        if inner.authority.camera_ready() && !inner.session.is_active() {
                            if let Err(err) = self.start_locked(&mut inner) {
                                tracing::warn!(%err, "navigate start failed");
                            }
                        } else {
                            inner.navigation_requested = true;
                        }
                    }
                    None => {}
                }
            }
            Message::Unknown(tag) => {
                tracing::warn!(tag, "unknown message tag ignored");
            }
            Message::Snapshot(_) | Message::Ack(_) => {
                tracing::debug!("authority received a mirror-bound message, ignoring");
            }
        }
        Ok(())
    }

    /// Peer reachability changed. On link-up the current state is
    /// re-broadcast under a fresh sequence.
    pub fn on_peer_reachable(&self, reachable: bool) {
        if !reachable {
            return;
        }
        let mut inner = self.inner.lock();
        let snap = inner.authority.reconnect_snapshot();
        self.dispatch(Message::Snapshot(snap));
    }

    fn start_locked(&self, inner: &mut Inner) -> GonioResult<()> {
        inner.session.start()?;
        inner.detector.reset();
        let snap = inner.authority.set_measuring(true);
        self.dispatch(Message::Snapshot(snap));
        Ok(())
    }

    fn stop_locked(&self, inner: &mut Inner) -> GonioResult<MeasuredRecord> {
        let result = inner.session.stop();
        if !matches!(result, Err(gonio_core::GonioError::NotMeasuring)) {
            // The session deactivated whether or not it produced samples
            let snap = inner.authority.set_measuring(false);
            self.dispatch(Message::Snapshot(snap));
        }
        let outcome = result?;

        let record = self.build_record(inner, &outcome);
        if let Err(err) = self
            .repository
            .insert(record.clone())
            .and_then(|_| self.repository.save())
        {
            tracing::warn!(%err, "record persistence failed, measurement lost");
        }
        Ok(record)
    }

    fn build_record(&self, inner: &mut Inner, outcome: &MeasurementOutcome) -> MeasuredRecord {
        inner.next_record += 1;
        let record = MeasuredRecord::new(
            RecordId::new(inner.next_record),
            Timestamp::now(),
            outcome.flexion.angle,
            outcome.extension.angle,
        )
        .with_measured_minutes((outcome.duration.as_secs() / 60) as u32);

        match self
            .images
            .save(&outcome.flexion.snapshot, &outcome.extension.snapshot)
        {
            Ok((flexion_id, extension_id)) => record.with_images(flexion_id, extension_id),
            Err(err) => {
                tracing::warn!(%err, "extremum snapshots not stored");
                record
            }
        }
    }

    fn dispatch(&self, message: Message) {
        if let Err(err) = self.transport.send(&message) {
            tracing::warn!(%err, "outbound send failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use gonio_core::SeqNo;
    use gonio_pose::{Joint, JointPoint, Snapshot};
    use gonio_record::{MemoryImageStore, MemoryRepository};
    use gonio_wire::{AckResult, IntentKind, IntentMsg, RejectReason};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Message>>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<Message> {
            self.sent.lock().clone()
        }

        fn last_snapshot(&self) -> Option<gonio_wire::SnapshotMsg> {
            self.sent().into_iter().rev().find_map(|m| match m {
                Message::Snapshot(s) => Some(s),
                _ => None,
            })
        }

        fn last_ack(&self) -> Option<gonio_wire::AckMsg> {
            self.sent().into_iter().rev().find_map(|m| match m {
                Message::Ack(a) => Some(a),
                _ => None,
            })
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, message: &Message) -> GonioResult<()> {
            self.sent.lock().push(*message);
            Ok(())
        }
    }

    struct Rig {
        node: MeasureNode,
        repo: Arc<MemoryRepository>,
        images: Arc<MemoryImageStore>,
        transport: Arc<RecordingTransport>,
    }

    fn rig() -> Rig {
        let repo = Arc::new(MemoryRepository::new());
        let images = Arc::new(MemoryImageStore::new());
        let transport = Arc::new(RecordingTransport::default());
        let node = MeasureNode::new(repo.clone(), images.clone(), transport.clone());
        Rig {
            node,
            repo,
            images,
            transport,
        }
    }

    /// Frame with a right leg bent to `angle_deg` at the knee.
    fn frame_at(angle_deg: f64) -> PoseFrame {
        let rad = angle_deg.to_radians();
        let knee = (0.5, 0.5);
        let hip = (0.5, 0.2);
        let ankle = (knee.0 + 0.3 * rad.sin(), knee.1 - 0.3 * rad.cos());
        PoseFrame::new(Snapshot::new(vec![angle_deg as u8]))
            .with_point(Joint::RightHip, JointPoint::new(hip.0, hip.1, 0.9))
            .with_point(Joint::RightKnee, JointPoint::new(knee.0, knee.1, 0.9))
            .with_point(Joint::RightAnkle, JointPoint::new(ankle.0, ankle.1, 0.9))
    }

    fn intent(kind: IntentKind, seq: u64) -> Vec<u8> {
        Message::Intent(IntentMsg {
            kind,
            seq: SeqNo::new(seq),
            timestamp: Timestamp::now(),
        })
        .encode()
    }

    #[test]
    fn test_frame_updates_display_angle() {
        let r = rig();
        r.node.on_frame(&frame_at(120.0));
        let angle = r.node.display_angle().unwrap();
        assert!((angle - 120.0).abs() < 1.0);

        // A frame with no usable pose clears the display
        r.node.on_frame(&PoseFrame::default());
        assert!(r.node.display_angle().is_none());
    }

    #[test]
    fn test_ready_hold_auto_starts() {
        let r = rig();
        r.node.begin_camera_session();
        let t0 = Instant::now();

        r.node.on_frame_at(&frame_at(170.0), t0);
        assert!(!r.node.is_measuring());
        r.node
            .on_frame_at(&frame_at(171.0), t0 + Duration::from_millis(1000));
        r.node
            .on_frame_at(&frame_at(170.0), t0 + Duration::from_millis(2000));

        assert!(r.node.is_measuring());
        assert!(r.transport.last_snapshot().unwrap().is_measuring);
    }

    #[test]
    fn test_full_measurement_persists_record_with_images() {
        let r = rig();
        r.node.begin_camera_session();
        r.node.start().unwrap();

        for angle in [170.0, 165.0, 100.0, 95.0, 175.0] {
            r.node.on_frame(&frame_at(angle));
        }
        let record = r.node.stop().unwrap();

        assert!((record.rom() - 80.0).abs() < 2.0);
        assert!(record.flexion_image.is_some());
        assert!(record.extension_image.is_some());
        assert_eq!(r.repo.len(), 1);
        assert_eq!(r.repo.save_count(), 1);
        assert_eq!(r.images.len(), 2);
        assert!(!r.node.is_measuring());
    }

    #[test]
    fn test_stop_without_frames_produces_no_record() {
        let r = rig();
        r.node.start().unwrap();
        assert!(r.node.stop().is_err());

        // The transition still stands and was broadcast
        assert!(!r.node.is_measuring());
        assert!(!r.transport.last_snapshot().unwrap().is_measuring);
        assert!(r.repo.is_empty());
    }

    #[test]
    fn test_stop_while_idle_does_not_broadcast() {
        let r = rig();
        let before = r.transport.sent().len();
        assert!(r.node.stop().is_err());
        assert_eq!(r.transport.sent().len(), before);
    }

    #[test]
    fn test_persistence_failure_keeps_transition() {
        let r = rig();
        r.node.start().unwrap();
        r.node.on_frame(&frame_at(120.0));
        r.repo.fail_next_save();

        let record = r.node.stop().unwrap();
        assert!(!r.node.is_measuring());
        assert_eq!(record.measured_minutes, 0);
        assert_eq!(r.repo.save_count(), 0);
    }

    #[test]
    fn test_image_failure_yields_record_without_images() {
        let r = rig();
        r.node.start().unwrap();
        r.node.on_frame(&frame_at(120.0));
        r.images.fail_next_save();

        let record = r.node.stop().unwrap();
        assert!(record.flexion_image.is_none());
        assert!(record.extension_image.is_none());
        assert_eq!(r.repo.len(), 1);
    }

    #[test]
    fn test_remote_start_requires_camera() {
        let r = rig();
        r.node
            .on_message(&intent(IntentKind::StartMeasuring, 1))
            .unwrap();

        assert!(!r.node.is_measuring());
        assert_eq!(
            r.transport.last_ack().unwrap().result,
            AckResult::Rejected(RejectReason::CameraNotReady)
        );
    }

    #[test]
    fn test_remote_start_stop_round_trip() {
        let r = rig();
        r.node.begin_camera_session();

        r.node
            .on_message(&intent(IntentKind::StartMeasuring, 1))
            .unwrap();
        assert!(r.node.is_measuring());
        assert_eq!(r.transport.last_ack().unwrap().result, AckResult::Ok);

        r.node.on_frame(&frame_at(120.0));
        r.node
            .on_message(&intent(IntentKind::StopMeasuring, 2))
            .unwrap();
        assert!(!r.node.is_measuring());
        assert_eq!(r.repo.len(), 1);
    }

    #[test]
    fn test_navigate_intent_queues_until_camera_opens() {
        let r = rig();
        r.node
            .on_message(&intent(IntentKind::NavigateAndStart, 1))
            .unwrap();

        assert!(r.node.navigation_requested());
        assert!(!r.node.is_measuring());

        r.node.begin_camera_session();
        assert!(!r.node.navigation_requested());
        assert!(r.node.is_measuring());
    }

    #[test]
    fn test_navigate_intent_starts_immediately_when_camera_ready() {
        let r = rig();
        r.node.begin_camera_session();
        r.node
            .on_message(&intent(IntentKind::NavigateAndStart, 1))
            .unwrap();
        assert!(r.node.is_measuring());
        assert!(!r.node.navigation_requested());
    }

    #[test]
    fn test_camera_teardown_keeps_session_running() {
        let r = rig();
        r.node.begin_camera_session();
        r.node.start().unwrap();
        r.node.on_frame(&frame_at(120.0));

        r.node.end_camera_session();
        assert!(!r.node.camera_ready());
        assert!(r.node.is_measuring());

        let record = r.node.stop().unwrap();
        assert!((record.flexion_angle - 120.0).abs() < 1.0);
    }

    #[test]
    fn test_reconnect_rebroadcasts_state() {
        let r = rig();
        r.node.begin_camera_session();
        let seq_before = r.transport.last_snapshot().unwrap().seq;

        r.node.on_peer_reachable(true);
        let snap = r.transport.last_snapshot().unwrap();
        assert!(snap.seq > seq_before);
        assert!(snap.camera_ready);

        // Link-down produces no broadcast
        let count = r.transport.sent().len();
        r.node.on_peer_reachable(false);
        assert_eq!(r.transport.sent().len(), count);
    }

    #[test]
    fn test_side_selection_changes_joint_set() {
        let r = rig();
        r.node.select_side(Side::Left);
        // Frame only carries right-leg joints
        r.node.on_frame(&frame_at(120.0));
        assert!(r.node.display_angle().is_none());

        r.node.select_side(Side::Right);
        r.node.on_frame(&frame_at(120.0));
        assert!(r.node.display_angle().is_some());
    }

    #[test]
    fn test_malformed_message_is_an_error() {
        let r = rig();
        assert!(r.node.on_message(&[]).is_err());
        assert!(r.node.on_message(&[99, 0x01]).is_err());
    }

    #[test]
    fn test_unknown_tag_is_ignored() {
        let r = rig();
        r.node.begin_camera_session();
        r.node.on_message(&[gonio_wire::WIRE_VERSION, 0x7F]).unwrap();
        assert!(r.node.camera_ready());
    }
}
