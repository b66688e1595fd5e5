use std::path::PathBuf;
use std::sync::Arc;

use vigil_challan::{Challan, ChallanEngine, ChallanError};
use vigil_fines::FineSchedule;
use vigil_store::{StoreError, ViolationStore};
use vigil_types::{Violation, ViolationReport};

/// The violation service: wires the record store, the fine schedule and the
/// challan engine together behind the three operations the HTTP surface (and
/// the CLI) needs.
///
/// The store is injected as a trait object at startup; tests get isolation by
/// constructing a fresh service over a fresh store.
pub struct ViolationService {
    store: Arc<dyn ViolationStore>,
    challans: ChallanEngine,
}

impl ViolationService {
    pub fn new(
        store: Arc<dyn ViolationStore>,
        fines: FineSchedule,
        evidence_dir: impl Into<PathBuf>,
    ) -> Self {
        let challans = ChallanEngine::new(Arc::clone(&store), fines, evidence_dir);
        Self { store, challans }
    }

    /// Normalize and persist a detection report. Validation failures leave
    /// the store untouched.
    pub async fn ingest(&self, report: ViolationReport) -> Result<Violation, StoreError> {
        self.store.insert(report).await
    }

    /// Full record set for reviewers, most recent first.
    pub async fn list(&self) -> Result<Vec<Violation>, StoreError> {
        self.store.list_all().await
    }

    /// Issue the challan for a record: one-way approval, then the rendered
    /// document.
    pub async fn issue_challan(&self, id: i64) -> Result<Challan, ChallanError> {
        self.challans.issue(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_challan::ChallanError;
    use vigil_store::InMemoryViolationStore;
    use vigil_types::{ViolationStatus, ViolationType};

    fn service() -> ViolationService {
        ViolationService::new(
            Arc::new(InMemoryViolationStore::new()),
            FineSchedule::default(),
            "target/vigil-core-evidence",
        )
    }

    // The end-to-end reviewer scenario: record, list, approve, reject the
    // duplicate approval.
    #[tokio::test]
    async fn record_review_issue_scenario() {
        let svc = service();

        let report = ViolationReport {
            video_id: "cam1".into(),
            violation_type: ViolationType::from("NO HELMET".to_string()),
            vehicle_number: Some("KA05AB1234".into()),
            confidence: 0.95,
            ..Default::default()
        };
        let stored = svc.ingest(report).await.unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(stored.status, ViolationStatus::Pending);

        let listed = svc.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 1);

        let challan = svc.issue_challan(1).await.unwrap();
        assert_eq!(challan.filename, "Challan_cam1_KA05AB1234.pdf");
        assert_eq!(challan.amount, 1000);
        assert_eq!(
            svc.list().await.unwrap()[0].status,
            ViolationStatus::Approved
        );

        let err = svc.issue_challan(1).await.unwrap_err();
        assert!(matches!(
            err,
            ChallanError::Store(StoreError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn ingest_rejects_bad_report() {
        let svc = service();
        let err = svc.ingest(ViolationReport::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(svc.list().await.unwrap().is_empty());
    }
}
