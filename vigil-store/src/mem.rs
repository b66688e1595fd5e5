use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use vigil_types::{Violation, ViolationReport, ViolationStatus};

use crate::{StoreError, ViolationStore};

/// In-memory violation store.
///
/// A single mutex guards both the id counter and the rows, so id assignment,
/// `created_at` stamping and the status check-and-set are each one critical
/// section. Rows are kept in insertion order; `list_all` reverses, which is
/// `created_at` descending because stamping happens under the same lock.
///
/// NOTE: not durable. The trait is the seam a relational backend plugs into.
pub struct InMemoryViolationStore {
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: i64,
    rows: Vec<Violation>,
}

impl InMemoryViolationStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                rows: Vec::new(),
            }),
        }
    }
}

impl Default for InMemoryViolationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ViolationStore for InMemoryViolationStore {
    async fn insert(&self, report: ViolationReport) -> Result<Violation, StoreError> {
        report.validate().map_err(StoreError::Validation)?;

        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let violation = Violation {
            id,
            video_id: report.video_id,
            violation_type: report.violation_type,
            timestamp: report.timestamp,
            confidence_score: report.confidence,
            speed_kmph: report.speed,
            vehicle_plate: report.vehicle_number,
            evidence_image_path: report.evidence_image,
            vehicle_type: report.vehicle_type,
            status: ViolationStatus::Pending,
            created_at: Utc::now(),
        };
        inner.rows.push(violation.clone());
        Ok(violation)
    }

    async fn list_all(&self) -> Result<Vec<Violation>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.iter().rev().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Violation, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .rows
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn transition_status(
        &self,
        id: i64,
        expected: ViolationStatus,
        next: ViolationStatus,
    ) -> Result<Violation, StoreError> {
        let mut inner = self.inner.lock().await;
        let row = inner
            .rows
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if row.status != expected {
            return Err(StoreError::Conflict {
                id,
                expected,
                actual: row.status,
            });
        }
        row.status = next;
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use vigil_types::ViolationType;

    fn report(video_id: &str) -> ViolationReport {
        ViolationReport {
            video_id: video_id.into(),
            violation_type: ViolationType::NoHelmet,
            timestamp: "2024-03-01T10:00:00".into(),
            confidence: 0.95,
            speed: None,
            vehicle_number: Some("KA05AB1234".into()),
            evidence_image: "cam1_1.jpg".into(),
            vehicle_type: Default::default(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_pending_status() {
        let store = InMemoryViolationStore::new();
        let a = store.insert(report("cam1")).await.unwrap();
        let b = store.insert(report("cam2")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.status, ViolationStatus::Pending);
    }

    #[tokio::test]
    async fn insert_rejects_invalid_report_without_storing() {
        let store = InMemoryViolationStore::new();
        let mut bad = report("");
        bad.video_id.clear();
        let err = store.insert(bad).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn round_trip_preserves_caller_fields() {
        let store = InMemoryViolationStore::new();
        let mut r = report("cam7");
        r.speed = Some(82.5);
        let inserted = store.insert(r.clone()).await.unwrap();
        let fetched = store.get_by_id(inserted.id).await.unwrap();
        assert_eq!(fetched.video_id, r.video_id);
        assert_eq!(fetched.violation_type, r.violation_type);
        assert_eq!(fetched.timestamp, r.timestamp);
        assert_eq!(fetched.confidence_score, r.confidence);
        assert_eq!(fetched.speed_kmph, r.speed);
        assert_eq!(fetched.vehicle_plate, r.vehicle_number);
        assert_eq!(fetched.evidence_image_path, r.evidence_image);
    }

    #[tokio::test]
    async fn get_by_id_unknown_is_not_found() {
        let store = InMemoryViolationStore::new();
        assert!(matches!(
            store.get_by_id(99).await.unwrap_err(),
            StoreError::NotFound(99)
        ));
    }

    #[tokio::test]
    async fn list_all_is_newest_first() {
        let store = InMemoryViolationStore::new();
        for i in 0..5 {
            store.insert(report(&format!("cam{i}"))).await.unwrap();
        }
        let all = store.list_all().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2, 1]);
        for pair in all.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_never_reuse_ids() {
        let store = Arc::new(InMemoryViolationStore::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert(report(&format!("cam{i}"))).await.unwrap().id
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 64);
    }

    #[tokio::test]
    async fn transition_is_one_way() {
        let store = InMemoryViolationStore::new();
        let v = store.insert(report("cam1")).await.unwrap();

        let approved = store
            .transition_status(v.id, ViolationStatus::Pending, ViolationStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, ViolationStatus::Approved);

        let err = store
            .transition_status(v.id, ViolationStatus::Pending, ViolationStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(
            store.get_by_id(v.id).await.unwrap().status,
            ViolationStatus::Approved
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_transitions_have_exactly_one_winner() {
        let store = Arc::new(InMemoryViolationStore::new());
        let v = store.insert(report("cam1")).await.unwrap();

        let a = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .transition_status(v.id, ViolationStatus::Pending, ViolationStatus::Approved)
                    .await
            })
        };
        let b = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .transition_status(v.id, ViolationStatus::Pending, ViolationStatus::Approved)
                    .await
            })
        };

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
        assert_eq!(
            store.get_by_id(v.id).await.unwrap().status,
            ViolationStatus::Approved
        );
    }
}
