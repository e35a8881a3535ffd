//! Record repository trait and in-memory implementation

use parking_lot::Mutex;

use gonio_core::{GonioError, GonioResult, RecordId};

use crate::MeasuredRecord;

/// Persistence collaborator for measurement records.
///
/// The measurement core produces at most one record per stop and manages no
/// transactions beyond insert-then-save.
pub trait RecordRepository: Send + Sync {
    fn insert(&self, record: MeasuredRecord) -> GonioResult<()>;
    fn save(&self) -> GonioResult<()>;
    fn fetch_all(&self) -> GonioResult<Vec<MeasuredRecord>>;

    /// Most recent record by measurement time.
    fn latest(&self) -> GonioResult<Option<MeasuredRecord>> {
        Ok(self.fetch_all()?.into_iter().last())
    }

    /// Second most recent record by measurement time.
    fn previous(&self) -> GonioResult<Option<MeasuredRecord>> {
        let all = self.fetch_all()?;
        Ok(all.into_iter().rev().nth(1))
    }
}

/// In-memory repository for tests and the simulator.
#[derive(Default)]
pub struct MemoryRepository {
    records: Mutex<Vec<MeasuredRecord>>,
    saves: Mutex<u64>,
    /// When set, the next `save` fails. Lets tests exercise the
    /// lost-record path.
    fail_next_save: Mutex<bool>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> u64 {
        *self.saves.lock()
    }

    pub fn fail_next_save(&self) {
        *self.fail_next_save.lock() = true;
    }

    pub fn get(&self, id: RecordId) -> Option<MeasuredRecord> {
        self.records.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl RecordRepository for MemoryRepository {
    fn insert(&self, record: MeasuredRecord) -> GonioResult<()> {
        let mut records = self.records.lock();
        records.push(record);
        records.sort_by_key(|r| r.measured_at);
        Ok(())
    }

    fn save(&self) -> GonioResult<()> {
        let mut fail = self.fail_next_save.lock();
        if *fail {
            *fail = false;
            return Err(GonioError::PersistenceError("simulated save failure".into()));
        }
        *self.saves.lock() += 1;
        Ok(())
    }

    fn fetch_all(&self) -> GonioResult<Vec<MeasuredRecord>> {
        Ok(self.records.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonio_core::Timestamp;

    fn record(id: u64, at: i64) -> MeasuredRecord {
        MeasuredRecord::new(RecordId::new(id), Timestamp::from_millis(at), 95.0, 175.0)
    }

    #[test]
    fn test_latest_and_previous_by_time() {
        let repo = MemoryRepository::new();
        repo.insert(record(2, 2000)).unwrap();
        repo.insert(record(1, 1000)).unwrap();
        repo.insert(record(3, 3000)).unwrap();

        assert_eq!(repo.latest().unwrap().unwrap().id, RecordId::new(3));
        assert_eq!(repo.previous().unwrap().unwrap().id, RecordId::new(2));
    }

    #[test]
    fn test_previous_needs_two_records() {
        let repo = MemoryRepository::new();
        assert!(repo.latest().unwrap().is_none());
        repo.insert(record(1, 1000)).unwrap();
        assert!(repo.previous().unwrap().is_none());
    }

    #[test]
    fn test_simulated_save_failure_is_one_shot() {
        let repo = MemoryRepository::new();
        repo.fail_next_save();
        assert!(repo.save().is_err());
        assert!(repo.save().is_ok());
        assert_eq!(repo.save_count(), 1);
    }
}
