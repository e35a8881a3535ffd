//! Message schema and binary codec
//!
//! Layout: `[version u8][tag u8][payload]`, all multi-byte fields
//! little-endian, length-checked on parse.

use bytes::BufMut;

use gonio_core::{GonioError, GonioResult, SeqNo, Timestamp};

/// Current wire schema version.
pub const WIRE_VERSION: u8 = 1;

/// Smallest possible message: version + tag.
pub const MIN_MESSAGE_SIZE: usize = 2;

const TAG_INTENT: u8 = 0x01;
const TAG_SNAPSHOT: u8 = 0x02;
const TAG_ACK: u8 = 0x03;

fn take8(payload: &[u8], at: usize) -> GonioResult<[u8; 8]> {
    payload
        .get(at..at + 8)
        .and_then(|s| s.try_into().ok())
        .ok_or(GonioError::BufferTooShort {
            expected: at + 8,
            actual: payload.len(),
        })
}

/// State transition requested by the mirror
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IntentKind {
    StartMeasuring = 0x01,
    StopMeasuring = 0x02,
    QueryStatus = 0x03,
    /// Navigate the phone UI to the measurement screen, then start.
    NavigateAndStart = 0x04,
}

impl IntentKind {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(IntentKind::StartMeasuring),
            0x02 => Some(IntentKind::StopMeasuring),
            0x03 => Some(IntentKind::QueryStatus),
            0x04 => Some(IntentKind::NavigateAndStart),
            _ => None,
        }
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Mirror-originated transition request
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntentMsg {
    pub kind: IntentKind,
    /// Request id, monotonic per mirror. Pairs the ack and lets the mirror
    /// resolve its optimistic pending state.
    pub seq: SeqNo,
    pub timestamp: Timestamp,
}

/// Authority-originated full state broadcast
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapshotMsg {
    pub camera_ready: bool,
    pub is_measuring: bool,
    /// Monotonic broadcast sequence; mirrors drop stale snapshots.
    pub seq: SeqNo,
    pub timestamp: Timestamp,
}

/// Why the authority refused a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RejectReason {
    AlreadyMeasuring = 0x01,
    NotMeasuring = 0x02,
    CameraNotReady = 0x03,
}

impl RejectReason {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(RejectReason::AlreadyMeasuring),
            0x02 => Some(RejectReason::NotMeasuring),
            0x03 => Some(RejectReason::CameraNotReady),
            _ => None,
        }
    }
}

/// Outcome carried by an acknowledgement
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AckResult {
    /// Transition performed.
    Ok,
    /// Precondition failed; no state change. Always reported explicitly,
    /// never as a silent `Ok`.
    Rejected(RejectReason),
    /// Reply to a status query.
    Status {
        camera_ready: bool,
        is_measuring: bool,
    },
}

/// Acknowledgement for a single intent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AckMsg {
    /// Sequence of the intent being acknowledged.
    pub seq: SeqNo,
    pub result: AckResult,
}

/// Any message that can cross the link
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Message {
    Intent(IntentMsg),
    Snapshot(SnapshotMsg),
    Ack(AckMsg),
    /// Tag from a future schema revision. Receivers log and drop.
    Unknown(u8),
}

impl Message {
    /// Serialize to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20);
        buf.put_u8(WIRE_VERSION);
        match self {
            Message::Intent(intent) => {
                buf.put_u8(TAG_INTENT);
                buf.put_u8(intent.kind.to_byte());
                buf.put_slice(&intent.seq.to_bytes());
                buf.put_slice(&intent.timestamp.to_bytes());
            }
            Message::Snapshot(snap) => {
                buf.put_u8(TAG_SNAPSHOT);
                buf.put_u8(snap.camera_ready as u8);
                buf.put_u8(snap.is_measuring as u8);
                buf.put_slice(&snap.seq.to_bytes());
                buf.put_slice(&snap.timestamp.to_bytes());
            }
            Message::Ack(ack) => {
                buf.put_u8(TAG_ACK);
                buf.put_slice(&ack.seq.to_bytes());
                match ack.result {
                    AckResult::Ok => buf.put_u8(0x00),
                    AckResult::Rejected(reason) => {
                        buf.put_u8(0x01);
                        buf.put_u8(reason as u8);
                    }
                    AckResult::Status {
                        camera_ready,
                        is_measuring,
                    } => {
                        buf.put_u8(0x02);
                        buf.put_u8(camera_ready as u8);
                        buf.put_u8(is_measuring as u8);
                    }
                }
            }
            Message::Unknown(tag) => {
                buf.put_u8(*tag);
            }
        }
        buf
    }

    /// Parse from bytes. Unknown tags succeed as `Message::Unknown`;
    /// unsupported versions and truncated payloads are errors.
    pub fn parse(buf: &[u8]) -> GonioResult<Message> {
        if buf.len() < MIN_MESSAGE_SIZE {
            return Err(GonioError::BufferTooShort {
                expected: MIN_MESSAGE_SIZE,
                actual: buf.len(),
            });
        }
        if buf[0] != WIRE_VERSION {
            return Err(GonioError::UnsupportedVersion(buf[0]));
        }

        match buf[1] {
            TAG_INTENT => Self::parse_intent(&buf[2..]),
            TAG_SNAPSHOT => Self::parse_snapshot(&buf[2..]),
            TAG_ACK => Self::parse_ack(&buf[2..]),
            tag => Ok(Message::Unknown(tag)),
        }
    }

    fn parse_intent(payload: &[u8]) -> GonioResult<Message> {
        if payload.len() < 17 {
            return Err(GonioError::BufferTooShort {
                expected: 17,
                actual: payload.len(),
            });
        }
        let kind = IntentKind::from_byte(payload[0])
            .ok_or_else(|| GonioError::InvalidWireFormat(format!("intent kind {:#04x}", payload[0])))?;
        let seq = SeqNo::from_bytes(take8(payload, 1)?);
        let timestamp = Timestamp::from_bytes(take8(payload, 9)?);
        Ok(Message::Intent(IntentMsg {
            kind,
            seq,
            timestamp,
        }))
    }

    fn parse_snapshot(payload: &[u8]) -> GonioResult<Message> {
        if payload.len() < 18 {
            return Err(GonioError::BufferTooShort {
                expected: 18,
                actual: payload.len(),
            });
        }
        let camera_ready = payload[0] != 0;
        let is_measuring = payload[1] != 0;
        let seq = SeqNo::from_bytes(take8(payload, 2)?);
        let timestamp = Timestamp::from_bytes(take8(payload, 10)?);
        Ok(Message::Snapshot(SnapshotMsg {
            camera_ready,
            is_measuring,
            seq,
            timestamp,
        }))
    }

    fn parse_ack(payload: &[u8]) -> GonioResult<Message> {
        if payload.len() < 9 {
            return Err(GonioError::BufferTooShort {
                expected: 9,
                actual: payload.len(),
            });
        }
        let seq = SeqNo::from_bytes(take8(payload, 0)?);
        let result = match payload[8] {
            0x00 => AckResult::Ok,
            0x01 => {
                let reason_byte = *payload.get(9).ok_or(GonioError::BufferTooShort {
                    expected: 10,
                    actual: payload.len(),
                })?;
                let reason = RejectReason::from_byte(reason_byte).ok_or_else(|| {
                    GonioError::InvalidWireFormat(format!("reject reason {:#04x}", reason_byte))
                })?;
                AckResult::Rejected(reason)
            }
            0x02 => {
                if payload.len() < 11 {
                    return Err(GonioError::BufferTooShort {
                        expected: 11,
                        actual: payload.len(),
                    });
                }
                AckResult::Status {
                    camera_ready: payload[9] != 0,
                    is_measuring: payload[10] != 0,
                }
            }
            other => {
                return Err(GonioError::InvalidWireFormat(format!(
                    "ack result {:#04x}",
                    other
                )))
            }
        };
        Ok(Message::Ack(AckMsg { seq, result }))
    }
}
