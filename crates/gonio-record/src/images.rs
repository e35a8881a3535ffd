//! Snapshot image storage trait and in-memory implementation

use std::collections::HashMap;

use parking_lot::Mutex;

use gonio_core::{GonioError, GonioResult, ImageId};
use gonio_pose::Snapshot;

/// Image-store collaborator. Each finalized measurement saves exactly two
/// snapshots, one per extremum.
pub trait ImageStore: Send + Sync {
    /// Store the flexion and extension snapshots, returning their ids.
    fn save(&self, flexion: &Snapshot, extension: &Snapshot) -> GonioResult<(ImageId, ImageId)>;

    /// Load a stored snapshot; absent if never stored or since removed.
    fn load(&self, id: ImageId) -> Option<Snapshot>;
}

/// In-memory image store for tests and the simulator.
#[derive(Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<ImageId, Snapshot>>,
    next_id: Mutex<u64>,
    fail_next_save: Mutex<bool>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_save(&self) {
        *self.fail_next_save.lock() = true;
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }

    fn alloc(&self) -> ImageId {
        let mut next = self.next_id.lock();
        *next += 1;
        ImageId::new(*next)
    }
}

impl ImageStore for MemoryImageStore {
    fn save(&self, flexion: &Snapshot, extension: &Snapshot) -> GonioResult<(ImageId, ImageId)> {
        let mut fail = self.fail_next_save.lock();
        if *fail {
            *fail = false;
            return Err(GonioError::ImageStoreError("simulated save failure".into()));
        }
        drop(fail);

        let flexion_id = self.alloc();
        let extension_id = self.alloc();
        let mut images = self.images.lock();
        images.insert(flexion_id, flexion.clone());
        images.insert(extension_id, extension.clone());
        Ok((flexion_id, extension_id))
    }

    fn load(&self, id: ImageId) -> Option<Snapshot> {
        self.images.lock().get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_pair() {
        let store = MemoryImageStore::new();
        let (f, e) = store
            .save(&Snapshot::new(vec![1]), &Snapshot::new(vec![2]))
            .unwrap();

        assert_ne!(f, e);
        assert_eq!(store.load(f).unwrap().data(), &[1]);
        assert_eq!(store.load(e).unwrap().data(), &[2]);
        assert!(store.load(ImageId::new(999)).is_none());
    }

    #[test]
    fn test_simulated_failure() {
        let store = MemoryImageStore::new();
        store.fail_next_save();
        assert!(store
            .save(&Snapshot::default(), &Snapshot::default())
            .is_err());
        assert!(store.is_empty());
    }
}
