use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use vigil_fines::FineSchedule;
use vigil_store::{StoreError, ViolationStore};
use vigil_types::{Violation, ViolationStatus};

mod pdf;

#[derive(Debug, Error)]
pub enum ChallanError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("challan render error: {0}")]
    Render(String),
}

/// An issued penalty document plus the record it was issued against.
#[derive(Debug)]
pub struct Challan {
    pub filename: String,
    pub amount: u32,
    pub violation: Violation,
    pub pdf: Vec<u8>,
}

/// Issues challans: resolves the fine, commits the one-way approval and
/// renders the penalty document with embedded evidence.
pub struct ChallanEngine {
    store: Arc<dyn ViolationStore>,
    fines: FineSchedule,
    evidence_dir: PathBuf,
}

impl ChallanEngine {
    pub fn new(
        store: Arc<dyn ViolationStore>,
        fines: FineSchedule,
        evidence_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            fines,
            evidence_dir: evidence_dir.into(),
        }
    }

    /// Issue the challan for a violation record.
    ///
    /// The PENDING -> APPROVED transition is committed *before* any document
    /// output exists: of two racing calls exactly one proceeds to render, the
    /// other fails with `Conflict` and produces no duplicate document. An
    /// unknown id fails with `NotFound` from the same store call.
    pub async fn issue(&self, id: i64) -> Result<Challan, ChallanError> {
        let violation = self
            .store
            .transition_status(id, ViolationStatus::Pending, ViolationStatus::Approved)
            .await?;

        let amount = self.fines.amount_for(&violation.violation_type);
        let pdf = pdf::render_challan(&violation, amount, &self.evidence_dir)
            .map_err(ChallanError::Render)?;

        Ok(Challan {
            filename: challan_filename(&violation),
            amount,
            violation,
            pdf,
        })
    }
}

/// `Challan_<video_id>_<vehicle_plate-or-UNKNOWN>.pdf`
pub fn challan_filename(violation: &Violation) -> String {
    let plate = violation
        .vehicle_plate
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("UNKNOWN");
    format!("Challan_{}_{}.pdf", violation.video_id, plate)
}
