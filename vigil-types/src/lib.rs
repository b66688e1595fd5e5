use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Approval state of a violation record.
///
/// The only legal transition is `Pending -> Approved`; `Approved` is terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationStatus {
    Pending,
    Approved,
}

impl std::fmt::Display for ViolationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationStatus::Pending => f.write_str("PENDING"),
            ViolationStatus::Approved => f.write_str("APPROVED"),
        }
    }
}

/// Category of a detected infraction.
///
/// Incoming values outside the known set are kept verbatim in `Unrecognized`
/// rather than silently defaulting; they never match the fine schedule.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViolationType {
    NoHelmet,
    TripleRiding,
    Overspeeding,
    Unrecognized(String),
}

impl ViolationType {
    /// Canonical wire label, matching the detector's spelling.
    pub fn label(&self) -> &str {
        match self {
            ViolationType::NoHelmet => "NO HELMET",
            ViolationType::TripleRiding => "TRIPLE RIDING",
            ViolationType::Overspeeding => "OVERSPEEDING",
            ViolationType::Unrecognized(s) => s,
        }
    }
}

impl Default for ViolationType {
    fn default() -> Self {
        ViolationType::Unrecognized(String::new())
    }
}

impl From<String> for ViolationType {
    fn from(raw: String) -> Self {
        // Detectors send space-separated labels; accept underscores too.
        match raw.trim().to_ascii_uppercase().replace('_', " ").as_str() {
            "NO HELMET" => ViolationType::NoHelmet,
            "TRIPLE RIDING" => ViolationType::TripleRiding,
            "OVERSPEEDING" => ViolationType::Overspeeding,
            _ => ViolationType::Unrecognized(raw),
        }
    }
}

impl From<ViolationType> for String {
    fn from(v: ViolationType) -> Self {
        v.label().to_string()
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Vehicle class reported by the detector.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Truck,
    Bus,
    Unknown,
}

impl Default for VehicleType {
    fn default() -> Self {
        VehicleType::Unknown
    }
}

impl From<String> for VehicleType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CAR" => VehicleType::Car,
            "MOTORCYCLE" => VehicleType::Motorcycle,
            "TRUCK" => VehicleType::Truck,
            "BUS" => VehicleType::Bus,
            _ => VehicleType::Unknown,
        }
    }
}

impl From<VehicleType> for String {
    fn from(v: VehicleType) -> Self {
        match v {
            VehicleType::Car => "CAR",
            VehicleType::Motorcycle => "MOTORCYCLE",
            VehicleType::Truck => "TRUCK",
            VehicleType::Bus => "BUS",
            VehicleType::Unknown => "UNKNOWN",
        }
        .to_string()
    }
}

/// The authoritative violation record.
///
/// `id`, `status` and `created_at` are store-assigned; everything else is
/// immutable after insert (there is no update-fields operation).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Violation {
    pub id: i64,
    pub video_id: String,
    pub violation_type: ViolationType,
    /// Detector-supplied moment within the source video. Opaque, unvalidated.
    pub timestamp: String,
    pub confidence_score: f64,
    pub speed_kmph: Option<f64>,
    pub vehicle_plate: Option<String>,
    /// Relative file name under the evidence directory. The store never
    /// checks that the file exists; the issuance engine degrades gracefully.
    pub evidence_image_path: String,
    pub vehicle_type: VehicleType,
    pub status: ViolationStatus,
    pub created_at: DateTime<Utc>,
}

/// Incoming detection report, as posted by the detector.
///
/// Field names follow the detector's wire format; the record-column
/// spellings are accepted as aliases. Everything is soft-defaulted so a
/// malformed body reaches `validate` instead of failing inside the JSON
/// extractor.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ViolationReport {
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub violation_type: ViolationType,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, alias = "confidence_score")]
    pub confidence: f64,
    #[serde(default, alias = "speed_kmph")]
    pub speed: Option<f64>,
    #[serde(default, alias = "vehicle_plate")]
    pub vehicle_number: Option<String>,
    #[serde(default, alias = "evidence_image_path")]
    pub evidence_image: String,
    #[serde(default)]
    pub vehicle_type: VehicleType,
}

impl ViolationReport {
    /// Required-field and range checks. Runs before any store mutation.
    pub fn validate(&self) -> Result<(), String> {
        if self.video_id.trim().is_empty() {
            return Err("video_id is required".into());
        }
        if matches!(&self.violation_type, ViolationType::Unrecognized(s) if s.trim().is_empty()) {
            return Err("violation_type is required".into());
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence_score {} outside [0, 1]",
                self.confidence
            ));
        }
        Ok(())
    }
}
