use crate::detection::{DetectionRecord, RecordStatus};
use crate::telemetry::log::LogManager;
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
struct Lists {
    main: Vec<DetectionRecord>,
    waiting: Vec<DetectionRecord>,
}

/// In-memory, append-only home of every classification record.
///
/// Accepted records go to the main list and unclassified ones to the waiting
/// list. A single lock covers both lists so readers always see whole appends.
pub struct RecordStore {
    inner: RwLock<Lists>,
    logger: LogManager,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Lists::default()),
            logger: LogManager::scoped("store"),
        }
    }

    pub fn append(&self, record: DetectionRecord) {
        let mut lists = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let (list, name) = match record.status {
            RecordStatus::Accepted => (&mut lists.main, "main"),
            RecordStatus::Unclassified => (&mut lists.waiting, "waiting"),
        };
        self.logger.debug(&format!(
            "appending {} to {} list (position {})",
            record.id,
            name,
            list.len()
        ));
        list.push(record);
    }

    pub fn main_list(&self) -> Vec<DetectionRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .main
            .clone()
    }

    pub fn waiting_list(&self) -> Vec<DetectionRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .waiting
            .clone()
    }

    /// Lengths of the main and waiting lists.
    pub fn len(&self) -> (usize, usize) {
        let lists = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (lists.main.len(), lists.waiting.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == (0, 0)
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::UploadContext;
    use std::sync::Arc;
    use std::thread;

    fn accepted(label: &str) -> DetectionRecord {
        UploadContext::new(None, None, String::new()).accepted(
            label.into(),
            0.9,
            "Model 1 (Pothole)".into(),
            0.1,
            2,
            "STREET".into(),
        )
    }

    fn unclassified() -> DetectionRecord {
        UploadContext::new(None, None, String::new()).unclassified("STREET".into())
    }

    #[test]
    fn append_routes_by_status() {
        let store = RecordStore::new();
        assert!(store.is_empty());
        store.append(accepted("pothole"));
        store.append(unclassified());
        store.append(accepted("crack"));

        assert_eq!(store.len(), (2, 1));
        assert!(store.main_list().iter().all(DetectionRecord::is_accepted));
        assert!(!store.waiting_list()[0].is_accepted());
    }

    #[test]
    fn lists_preserve_insertion_order() {
        let store = RecordStore::new();
        let records: Vec<_> = ["a", "b", "c"].iter().map(|l| accepted(l)).collect();
        for record in &records {
            store.append(record.clone());
        }
        let ids: Vec<_> = store.main_list().into_iter().map(|r| r.id).collect();
        let expected: Vec<_> = records.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn reads_are_idempotent() {
        let store = RecordStore::new();
        store.append(unclassified());
        assert_eq!(store.waiting_list(), store.waiting_list());
        assert_eq!(store.main_list(), store.main_list());
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let store = Arc::new(RecordStore::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        if worker % 2 == 0 {
                            store.append(accepted("pothole"));
                        } else {
                            store.append(unclassified());
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), (100, 100));
    }
}
