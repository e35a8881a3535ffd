//! Mock record generation for demos and history-view development

use rand::Rng;

use gonio_core::{RecordId, Timestamp};

use crate::MeasuredRecord;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Generate `count` daily records ending at `end`, following a plausible
/// post-surgery recovery trajectory: extension drifts up toward straight,
/// flexion drifts down, pain eases off.
pub fn generate_recovery_records(count: usize, end: Timestamp) -> Vec<MeasuredRecord> {
    let mut rng = rand::thread_rng();
    let mut records = Vec::with_capacity(count);

    for i in 0..count {
        let progress = i as f64 / count.max(1) as f64;
        let measured_at = Timestamp::from_millis(end.as_millis() - ((count - 1 - i) as i64) * DAY_MS);

        let extension = 140.0 + progress * 35.0 + rng.gen_range(-3.0..3.0);
        let flexion = 110.0 - progress * 20.0 + rng.gen_range(-3.0..3.0);
        let pain = (7.0 - progress * 5.0 + rng.gen_range(-0.5..0.5)).clamp(0.0, 10.0);

        records.push(
            MeasuredRecord::new(
                RecordId::new(i as u64 + 1),
                measured_at,
                flexion.min(extension),
                extension.clamp(0.0, 180.0),
            )
            .with_pain_level(pain)
            .with_measured_minutes(rng.gen_range(1..5)),
        );
    }

    records
}
