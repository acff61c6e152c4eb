// alertfuse/src/engine/confidence.rs
//
// Confidence assessor — ordered rule chain over signals + blast radius.
//
//   1. privileged context + lateral movement        → HIGH
//   2. credential spray + blast growth              → HIGH
//   3. technique progression                        → MEDIUM
//   4. ≥ 3 hosts + (lateral movement | progression) → MEDIUM
//   *  fallback                                     → LOW
//
// First matching rule writes the primary reasoning line. Every signal that
// fired then appends its own line, whichever rule decided. All lines carry
// the counts and minute windows behind them.

use crate::events::{BlastRadius, Confidence, ReasoningSignals};

const ESCALATION_MIN_HOSTS: usize = 3;

struct ConfidenceRule {
    confidence: Confidence,
    applies:    fn(&ReasoningSignals, &BlastRadius) -> bool,
    explain:    fn(&ReasoningSignals, &BlastRadius) -> String,
}

static RULES: &[ConfidenceRule] = &[
    ConfidenceRule {
        confidence: Confidence::High,
        applies:    privileged_lateral,
        explain:    explain_privileged_lateral,
    },
    ConfidenceRule {
        confidence: Confidence::High,
        applies:    spray_with_growth,
        explain:    explain_spray_with_growth,
    },
    ConfidenceRule {
        confidence: Confidence::Medium,
        applies:    progression,
        explain:    explain_progression,
    },
    ConfidenceRule {
        confidence: Confidence::Medium,
        applies:    wide_escalation,
        explain:    explain_wide_escalation,
    },
];

static FALLBACK: ConfidenceRule = ConfidenceRule {
    confidence: Confidence::Low,
    applies:    always,
    explain:    explain_low,
};

/// "1 minute" / "N minutes".
pub(crate) fn fmt_minutes(value: u64) -> String {
    if value == 1 {
        format!("{value} minute")
    } else {
        format!("{value} minutes")
    }
}

pub fn assess_confidence(
    signals: &ReasoningSignals,
    blast: &BlastRadius,
) -> (Confidence, Vec<String>) {
    let rule = RULES
        .iter()
        .find(|r| (r.applies)(signals, blast))
        .unwrap_or(&FALLBACK);

    let mut reasoning = vec![(rule.explain)(signals, blast)];
    reasoning.extend(signal_lines(signals, blast));
    (rule.confidence, reasoning)
}

// ── Predicates ────────────────────────────────────────────────────────────────

fn always(_: &ReasoningSignals, _: &BlastRadius) -> bool {
    true
}

fn privileged_lateral(s: &ReasoningSignals, _: &BlastRadius) -> bool {
    s.privileged_context.detected && s.lateral_movement.detected
}

fn spray_with_growth(s: &ReasoningSignals, b: &BlastRadius) -> bool {
    s.credential_spray.detected && b.blast_growth.detected
}

fn progression(s: &ReasoningSignals, _: &BlastRadius) -> bool {
    s.technique_progression.detected
}

fn wide_escalation(s: &ReasoningSignals, b: &BlastRadius) -> bool {
    b.unique_hosts.len() >= ESCALATION_MIN_HOSTS
        && (s.lateral_movement.detected || s.technique_progression.detected)
}

// ── Primary lines ─────────────────────────────────────────────────────────────

fn explain_privileged_lateral(s: &ReasoningSignals, b: &BlastRadius) -> String {
    let lm = &s.lateral_movement;
    format!(
        "Confidence HIGH: privileged_users={} with user '{}' across {} hosts in {}.",
        b.privileged_users.len(),
        lm.user.as_deref().unwrap_or("unknown"),
        lm.hosts,
        fmt_minutes(lm.window_minutes),
    )
}

fn explain_spray_with_growth(s: &ReasoningSignals, b: &BlastRadius) -> String {
    let cs = &s.credential_spray;
    let g = &b.blast_growth;
    format!(
        "Confidence HIGH: {} source IPs targeted {} users in {}; hosts expanded from {} to {} in {}.",
        cs.source_ips,
        cs.users,
        fmt_minutes(cs.window_minutes),
        g.start_hosts,
        g.end_hosts,
        fmt_minutes(g.window_minutes),
    )
}

fn explain_progression(s: &ReasoningSignals, _: &BlastRadius) -> String {
    let tp = &s.technique_progression;
    format!(
        "Confidence MEDIUM: {} techniques observed in {}.",
        tp.techniques,
        fmt_minutes(tp.window_minutes),
    )
}

fn explain_wide_escalation(s: &ReasoningSignals, b: &BlastRadius) -> String {
    let window = if s.lateral_movement.detected {
        s.lateral_movement.window_minutes
    } else {
        s.technique_progression.window_minutes
    };
    format!(
        "Confidence MEDIUM: {} hosts with escalation signal in {}.",
        b.unique_hosts.len(),
        fmt_minutes(window),
    )
}

fn explain_low(_: &ReasoningSignals, b: &BlastRadius) -> String {
    format!(
        "Confidence LOW: hosts={} users={} privileged_users={}.",
        b.unique_hosts.len(),
        b.unique_users.len(),
        b.privileged_users.len(),
    )
}

// ── Secondary lines ───────────────────────────────────────────────────────────

fn signal_lines(s: &ReasoningSignals, b: &BlastRadius) -> Vec<String> {
    let mut lines = Vec::new();

    let cs = &s.credential_spray;
    if cs.detected {
        lines.push(format!(
            "Credential spraying detected: {} source IPs targeted {} users within {}.",
            cs.source_ips,
            cs.users,
            fmt_minutes(cs.window_minutes),
        ));
    }

    let lm = &s.lateral_movement;
    if lm.detected {
        lines.push(format!(
            "Lateral movement suspected: user '{}' accessed {} hosts within {} (technique_T1021={}).",
            lm.user.as_deref().unwrap_or("unknown"),
            lm.hosts,
            fmt_minutes(lm.window_minutes),
            lm.technique_t1021,
        ));
    }

    let tp = &s.technique_progression;
    if tp.detected {
        lines.push(format!(
            "Technique progression observed: {} techniques within {}.",
            tp.techniques,
            fmt_minutes(tp.window_minutes),
        ));
    }

    let pc = &s.privileged_context;
    if pc.detected {
        lines.push(format!(
            "Privileged context observed: {} privileged users.",
            pc.privileged_users,
        ));
    }

    let g = &b.blast_growth;
    if g.detected {
        lines.push(format!(
            "Blast radius expanded from {} to {} hosts in {}.",
            g.start_hosts,
            g.end_hosts,
            fmt_minutes(g.window_minutes),
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BlastGrowth, CredentialSpray, LateralMovement, PrivilegedContext, TechniqueProgression};

    fn hosts(n: usize) -> BlastRadius {
        BlastRadius {
            unique_hosts: (0..n).map(|i| format!("host-{i}")).collect(),
            ..BlastRadius::default()
        }
    }

    fn lateral(hosts: usize) -> LateralMovement {
        LateralMovement {
            detected: true,
            user: Some("bob".into()),
            hosts,
            window_minutes: 2,
            technique_t1021: 1,
        }
    }

    #[test]
    fn fallback_is_low_with_counts() {
        let (confidence, reasoning) = assess_confidence(&ReasoningSignals::default(), &hosts(1));
        assert_eq!(confidence, Confidence::Low);
        assert_eq!(reasoning, vec!["Confidence LOW: hosts=1 users=0 privileged_users=0.".to_string()]);
    }

    #[test]
    fn privileged_lateral_wins_over_progression() {
        let signals = ReasoningSignals {
            lateral_movement: lateral(3),
            technique_progression: TechniqueProgression { detected: true, techniques: 2, window_minutes: 1 },
            privileged_context: PrivilegedContext { detected: true, privileged_users: 1 },
            ..ReasoningSignals::default()
        };
        let (confidence, reasoning) = assess_confidence(&signals, &hosts(3));
        assert_eq!(confidence, Confidence::High);
        assert!(reasoning[0].starts_with("Confidence HIGH: privileged_users="));
        // primary + lateral + progression + privileged
        assert_eq!(reasoning.len(), 4);
        assert!(reasoning[2].contains("1 minute."));
    }

    #[test]
    fn spray_needs_growth_for_high() {
        let spray = CredentialSpray { detected: true, source_ips: 1, users: 5, window_minutes: 4 };
        let signals = ReasoningSignals { credential_spray: spray, ..ReasoningSignals::default() };

        let (confidence, reasoning) = assess_confidence(&signals, &hosts(1));
        assert_eq!(confidence, Confidence::Low);
        assert!(reasoning.iter().any(|l| l.starts_with("Credential spraying detected: 1 source IPs")));

        let mut blast = hosts(5);
        blast.blast_growth = BlastGrowth {
            detected: true,
            window_minutes: 4,
            start_hosts: 0,
            end_hosts: 5,
            new_hosts: 5,
        };
        let (confidence, reasoning) = assess_confidence(&signals, &blast);
        assert_eq!(confidence, Confidence::High);
        assert_eq!(
            reasoning.last().map(String::as_str),
            Some("Blast radius expanded from 0 to 5 hosts in 4 minutes.")
        );
    }

    #[test]
    fn unprivileged_lateral_on_three_hosts_is_medium() {
        let signals = ReasoningSignals { lateral_movement: lateral(3), ..ReasoningSignals::default() };
        let (confidence, reasoning) = assess_confidence(&signals, &hosts(3));
        assert_eq!(confidence, Confidence::Medium);
        assert_eq!(reasoning[0], "Confidence MEDIUM: 3 hosts with escalation signal in 2 minutes.");
    }

    #[test]
    fn every_line_is_numerically_grounded() {
        let signals = ReasoningSignals {
            credential_spray: CredentialSpray { detected: true, source_ips: 2, users: 6, window_minutes: 9 },
            lateral_movement: lateral(4),
            technique_progression: TechniqueProgression { detected: true, techniques: 3, window_minutes: 7 },
            privileged_context: PrivilegedContext { detected: true, privileged_users: 2 },
        };
        let (_, reasoning) = assess_confidence(&signals, &hosts(4));
        assert_eq!(reasoning.len(), 5);
        for line in &reasoning {
            assert!(line.chars().any(|c| c.is_ascii_digit()), "{line}");
        }
    }
}
