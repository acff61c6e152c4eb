// alertfuse/src/workers/technique_progression.rs
//
// Technique progression — the incident moved through more than one ATT&CK
// technique. Window covers only alerts that carry a technique.

use crate::events::{Alert, BlastRadius, TechniqueProgression};
use crate::state::window::span_minutes;

const MIN_TECHNIQUES: usize = 2;

pub fn analyze(alerts: &[Alert], blast: &BlastRadius) -> TechniqueProgression {
    let techniques = blast.techniques.len();
    TechniqueProgression {
        detected: techniques >= MIN_TECHNIQUES,
        techniques,
        window_minutes: span_minutes(
            alerts
                .iter()
                .filter(|a| a.technique().is_some())
                .map(|a| a.timestamp),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::blast::compute_blast_radius;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn two_techniques_progress_over_their_own_window() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        let alerts = vec![
            Alert::new(base, "Port Scan").with_technique("T1046"),
            Alert::new(base + Duration::minutes(3), "Command Exec").with_technique("T1059"),
            Alert::new(base + Duration::minutes(30), "Note"),
        ];
        let signal = analyze(&alerts, &compute_blast_radius(&alerts));
        assert!(signal.detected);
        assert_eq!(signal.techniques, 2);
        assert_eq!(signal.window_minutes, 3);
    }

    #[test]
    fn repeated_technique_does_not_progress() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        let alerts = vec![
            Alert::new(base, "Port Scan").with_technique("T1046"),
            Alert::new(base, "Port Scan").with_technique("T1046"),
        ];
        let signal = analyze(&alerts, &compute_blast_radius(&alerts));
        assert!(!signal.detected);
        assert_eq!(signal.techniques, 1);
        assert_eq!(signal.window_minutes, 1);
    }
}
