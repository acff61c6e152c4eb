pub mod credential_spray;
pub mod lateral_movement;
pub mod privileged_context;
pub mod technique_progression;

use crate::events::{Alert, BlastRadius, ReasoningSignals};

/// Run all four detectors over one incident's alerts.
/// Each worker is independent; none sees another's output.
pub fn derive_signals(alerts: &[Alert], blast: &BlastRadius) -> ReasoningSignals {
    ReasoningSignals {
        credential_spray:      credential_spray::analyze(alerts, blast),
        lateral_movement:      lateral_movement::analyze(alerts, blast),
        technique_progression: technique_progression::analyze(alerts, blast),
        privileged_context:    privileged_context::analyze(alerts, blast),
    }
}
