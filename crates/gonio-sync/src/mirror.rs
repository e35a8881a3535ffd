//! Mirror role - the watch's side of the protocol
//!
//! Holds two layers of state: `confirmed` (the last authoritative snapshot)
//! and `pending` (the optimistic preview of an intent in flight). The
//! display resolves pending over confirmed; the next authoritative
//! broadcast at or after the request supersedes the preview, reverting it
//! if the authority rejected the transition.

use gonio_core::{GonioError, GonioResult, SeqNo, Timestamp, RECONNECT_SETTLE};
use gonio_wire::{AckResult, IntentKind, IntentMsg, Message, SnapshotMsg};

/// Optimistic preview of an intent awaiting confirmation
#[derive(Clone, Copy, Debug)]
struct PendingIntent {
    kind: IntentKind,
    seq: SeqNo,
    sent_at: Timestamp,
}

/// Confirmed replica of the authority's state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MirrorState {
    pub camera_ready: bool,
    pub is_measuring: bool,
}

/// Mirror-side protocol state
#[derive(Debug, Default)]
pub struct Mirror {
    confirmed: MirrorState,
    pending: Option<PendingIntent>,
    /// Sequence of the last applied snapshot; older broadcasts are stale.
    last_applied: SeqNo,
    next_request: SeqNo,
    reachable: bool,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reachable(&self) -> bool {
        self.reachable
    }

    pub fn camera_ready(&self) -> bool {
        self.confirmed.camera_ready
    }

    /// Displayed measuring state: the optimistic preview while an intent is
    /// in flight, the confirmed replica otherwise.
    pub fn is_measuring(&self) -> bool {
        match self.pending {
            Some(p) => match p.kind {
                IntentKind::StartMeasuring | IntentKind::NavigateAndStart => true,
                IntentKind::StopMeasuring => false,
                IntentKind::QueryStatus => self.confirmed.is_measuring,
            },
            None => self.confirmed.is_measuring,
        }
    }

    pub fn confirmed(&self) -> MirrorState {
        self.confirmed
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Build a start intent and flip the preview. Rejected locally if the
    /// displayed state is already measuring.
    pub fn start_measuring(&mut self) -> GonioResult<IntentMsg> {
        if self.is_measuring() {
            return Err(GonioError::AlreadyMeasuring);
        }
        Ok(self.send(IntentKind::StartMeasuring))
    }

    /// Build a stop intent and flip the preview. Rejected locally if the
    /// displayed state is not measuring.
    pub fn stop_measuring(&mut self) -> GonioResult<IntentMsg> {
        if !self.is_measuring() {
            return Err(GonioError::NotMeasuring);
        }
        Ok(self.send(IntentKind::StopMeasuring))
    }

    /// Start or stop depending on the displayed state.
    pub fn toggle_measuring(&mut self) -> GonioResult<IntentMsg> {
        if self.is_measuring() {
            self.stop_measuring()
        } else {
            self.start_measuring()
        }
    }

    /// Ask the phone to open the measurement screen and start. Used when
    /// the camera is not ready; previews the eventual measuring state.
    pub fn navigate_and_start(&mut self) -> IntentMsg {
        self.send(IntentKind::NavigateAndStart)
    }

    /// Build a status query. Requires a reachable link.
    pub fn query_status(&mut self) -> GonioResult<IntentMsg> {
        if !self.reachable {
            return Err(GonioError::Unreachable);
        }
        let seq = self.next_request.bump();
        Ok(IntentMsg {
            kind: IntentKind::QueryStatus,
            seq,
            timestamp: Timestamp::now(),
        })
    }

    /// Record a reachability flip. On link-up the caller should wait
    /// [`RECONNECT_SETTLE`] and then issue the returned query, so the query
    /// does not race the authority's own post-activation broadcast.
    pub fn set_reachable(&mut self, reachable: bool) -> Option<std::time::Duration> {
        let came_up = reachable && !self.reachable;
        self.reachable = reachable;
        tracing::info!(reachable, "link reachability changed");
        came_up.then_some(RECONNECT_SETTLE)
    }

    /// An intent could not be handed to the transport. Terminal for the
    /// attempt: the preview is dropped, no retry is scheduled.
    pub fn send_failed(&mut self, seq: SeqNo) {
        if self.pending.map(|p| p.seq) == Some(seq) {
            tracing::warn!(%seq, "intent send failed, dropping optimistic preview");
            self.pending = None;
        }
    }

    /// Apply an inbound message from the authority.
    pub fn apply(&mut self, message: Message) {
        match message {
            Message::Snapshot(snap) => self.apply_snapshot(snap),
            Message::Ack(ack) => match ack.result {
                AckResult::Status {
                    camera_ready,
                    is_measuring,
                } => {
                    self.confirmed = MirrorState {
                        camera_ready,
                        is_measuring,
                    };
                    tracing::debug!(?self.confirmed, "status reply applied");
                }
                AckResult::Rejected(reason) => {
                    // The authority refused the transition; stop previewing it.
                    if self.pending.map(|p| p.seq) == Some(ack.seq) {
                        tracing::warn!(?reason, "intent rejected, reverting preview");
                        self.pending = None;
                    }
                }
                AckResult::Ok => {
                    // Advisory only; the broadcast that follows is what
                    // confirms the transition.
                }
            },
            Message::Unknown(tag) => {
                tracing::warn!(tag, "unknown message tag ignored");
            }
            Message::Intent(_) => {
                tracing::warn!("mirror received an intent, ignoring");
            }
        }
    }

    fn apply_snapshot(&mut self, snap: SnapshotMsg) {
        if snap.seq <= self.last_applied {
            tracing::debug!(seq = %snap.seq, last = %self.last_applied, "stale snapshot dropped");
            return;
        }
        self.last_applied = snap.seq;
        self.confirmed = MirrorState {
            camera_ready: snap.camera_ready,
            is_measuring: snap.is_measuring,
        };

        // A broadcast issued at or after the pending request supersedes the
        // optimistic preview, whatever it says.
        if let Some(p) = self.pending {
            if snap.timestamp >= p.sent_at {
                self.pending = None;
            }
        }
        tracing::debug!(?self.confirmed, seq = %snap.seq, "snapshot applied");
    }

    fn send(&mut self, kind: IntentKind) -> IntentMsg {
        let seq = self.next_request.bump();
        let timestamp = Timestamp::now();
        self.pending = Some(PendingIntent {
            kind,
            seq,
            sent_at: timestamp,
        });
        IntentMsg {
            kind,
            seq,
            timestamp,
        }
    }
}
