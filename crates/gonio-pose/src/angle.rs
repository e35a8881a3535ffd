//! Knee vertex angle extraction
//!
//! Pure vector trigonometry over three landmarks. Absence of a landmark or
//! low confidence yields `None`, never an error - a joint missing for one
//! frame is normal detector behavior.

use gonio_core::{Side, CONFIDENCE_THRESHOLD};

use crate::{Joint, JointPoint, PoseFrame};

/// Angle in degrees at the vertex formed by three landmarks.
///
/// Returns `None` when either vector has zero magnitude.
pub fn vertex_angle(proximal: JointPoint, vertex: JointPoint, distal: JointPoint) -> Option<f64> {
    let v1 = (proximal.x - vertex.x, proximal.y - vertex.y);
    let v2 = (distal.x - vertex.x, distal.y - vertex.y);

    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if mag1 == 0.0 || mag2 == 0.0 {
        return None;
    }

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let cos = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Knee angle for the chosen side, if all three landmarks are present with
/// sufficient confidence.
pub fn knee_angle(frame: &PoseFrame, side: Side) -> Option<f64> {
    let (hip, knee, ankle) = Joint::knee_triple(side);
    let hip = confident_point(frame, hip)?;
    let knee = confident_point(frame, knee)?;
    let ankle = confident_point(frame, ankle)?;
    vertex_angle(hip, knee, ankle)
}

fn confident_point(frame: &PoseFrame, joint: Joint) -> Option<JointPoint> {
    frame
        .point(joint)
        .filter(|p| p.confidence >= CONFIDENCE_THRESHOLD)
}
