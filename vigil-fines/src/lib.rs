use std::collections::HashMap;

use vigil_types::ViolationType;

/// Fallback fine for violation categories without a scheduled amount, INR.
pub const DEFAULT_FINE: u32 = 500;

/// Static violation-category -> fine-amount table.
///
/// Built once at startup and shared immutably; this is configuration, not
/// state.
pub struct FineSchedule {
    fines: HashMap<ViolationType, u32>,
    default: u32,
}

impl FineSchedule {
    pub fn amount_for(&self, violation_type: &ViolationType) -> u32 {
        self.fines
            .get(violation_type)
            .copied()
            .unwrap_or(self.default)
    }
}

impl Default for FineSchedule {
    fn default() -> Self {
        let fines = HashMap::from([
            (ViolationType::NoHelmet, 1000),
            (ViolationType::TripleRiding, 2000),
            (ViolationType::Overspeeding, 5000),
        ]);
        Self {
            fines,
            default: DEFAULT_FINE,
        }
    }
}
