//! Authority role - the phone's side of the protocol
//!
//! Owns ground truth for `camera_ready` and `is_measuring`. State is
//! mutated only by local lifecycle calls; remote intents request
//! transitions, and every local change produces a broadcast snapshot with a
//! fresh sequence number.

use gonio_core::{SeqNo, Timestamp};
use gonio_wire::{AckMsg, AckResult, IntentKind, IntentMsg, RejectReason, SnapshotMsg};

/// Local action an accepted intent asks the runtime to perform.
///
/// The authority validates preconditions; the runtime owns the session and
/// performs the transition, then reports it back via `set_measuring`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorityAction {
    StartSession,
    StopSession,
    /// Navigate the UI to the measurement screen, then start.
    NavigateAndStart,
}

/// Result of handling one intent.
#[derive(Clone, Copy, Debug)]
pub struct IntentOutcome {
    pub ack: AckMsg,
    pub action: Option<AuthorityAction>,
}

/// Authority-side protocol state
#[derive(Debug, Default)]
pub struct Authority {
    camera_ready: bool,
    is_measuring: bool,
    seq: SeqNo,
}

impl Authority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera_ready(&self) -> bool {
        self.camera_ready
    }

    pub fn is_measuring(&self) -> bool {
        self.is_measuring
    }

    /// Record a camera lifecycle change and produce the broadcast for it.
    pub fn set_camera_ready(&mut self, ready: bool) -> SnapshotMsg {
        self.camera_ready = ready;
        tracing::info!(ready, "camera state changed");
        self.next_snapshot()
    }

    /// Record a session transition and produce the broadcast for it.
    pub fn set_measuring(&mut self, measuring: bool) -> SnapshotMsg {
        self.is_measuring = measuring;
        tracing::info!(measuring, "measuring state changed");
        self.next_snapshot()
    }

    /// Snapshot to send when a mirror reconnects. Re-broadcasts current
    /// state under a fresh sequence so it cannot be dropped as stale.
    pub fn reconnect_snapshot(&mut self) -> SnapshotMsg {
        self.next_snapshot()
    }

    /// Validate an intent against current state.
    ///
    /// Precondition failures are acked with an explicit rejection; the
    /// original remote-command path answered `ok` even when it no-oped,
    /// which left the mirror's optimistic state dangling.
    pub fn handle_intent(&mut self, intent: IntentMsg) -> IntentOutcome {
        tracing::debug!(kind = ?intent.kind, seq = %intent.seq, "intent received");

        let (result, action) = match intent.kind {
            IntentKind::StartMeasuring => {
                if self.is_measuring {
                    (AckResult::Rejected(RejectReason::AlreadyMeasuring), None)
                } else if !self.camera_ready {
                    (AckResult::Rejected(RejectReason::CameraNotReady), None)
                } else {
                    (AckResult::Ok, Some(AuthorityAction::StartSession))
                }
            }
            IntentKind::StopMeasuring => {
                if !self.is_measuring {
                    (AckResult::Rejected(RejectReason::NotMeasuring), None)
                } else {
                    (AckResult::Ok, Some(AuthorityAction::StopSession))
                }
            }
            IntentKind::QueryStatus => (
                AckResult::Status {
                    camera_ready: self.camera_ready,
                    is_measuring: self.is_measuring,
                },
                None,
            ),
            IntentKind::NavigateAndStart => {
                (AckResult::Ok, Some(AuthorityAction::NavigateAndStart))
            }
        };

        if let AckResult::Rejected(reason) = result {
            tracing::warn!(kind = ?intent.kind, ?reason, "intent rejected");
        }

        IntentOutcome {
            ack: AckMsg {
                seq: intent.seq,
                result,
            },
            action,
        }
    }

    fn next_snapshot(&mut self) -> SnapshotMsg {
        SnapshotMsg {
            camera_ready: self.camera_ready,
            is_measuring: self.is_measuring,
            seq: self.seq.bump(),
            timestamp: Timestamp::now(),
        }
    }
}
