// alertfuse/src/engine/decision.rs
//
// Decision engine — recommended response for one incident.
//
//   HIGH + privileged context → DISABLE_ACCOUNT   / IMMEDIATE
//   HIGH + blast growth       → ISOLATE_HOST      / IMMEDIATE
//   MEDIUM                    → COLLECT_FORENSICS / HIGH
//   fallback                  → MONITOR           / LOW
//
// The replay is a recommendation only: human_in_the_loop is always set and
// nothing here can clear it.

use crate::events::{ActionKind, BlastRadius, Confidence, DecisionReplay, ReasoningSignals, Urgency};

struct DecisionRule {
    action:  ActionKind,
    urgency: Urgency,
    applies: fn(&ReasoningSignals, &BlastRadius, Confidence) -> bool,
    justify: fn(&ReasoningSignals, &BlastRadius) -> String,
}

static RULES: &[DecisionRule] = &[
    DecisionRule {
        action:  ActionKind::DisableAccount,
        urgency: Urgency::Immediate,
        applies: high_privileged,
        justify: justify_privileged,
    },
    DecisionRule {
        action:  ActionKind::IsolateHost,
        urgency: Urgency::Immediate,
        applies: high_growth,
        justify: justify_growth,
    },
    DecisionRule {
        action:  ActionKind::CollectForensics,
        urgency: Urgency::High,
        applies: medium,
        justify: justify_medium,
    },
];

static FALLBACK: DecisionRule = DecisionRule {
    action:  ActionKind::Monitor,
    urgency: Urgency::Low,
    applies: always,
    justify: justify_low,
};

pub fn assess_decision(
    signals: &ReasoningSignals,
    blast: &BlastRadius,
    confidence: Confidence,
) -> DecisionReplay {
    let rule = RULES
        .iter()
        .find(|r| (r.applies)(signals, blast, confidence))
        .unwrap_or(&FALLBACK);

    let mut justification = vec![(rule.justify)(signals, blast)];
    justification.extend(signal_lines(signals, blast));

    DecisionReplay {
        action: rule.action,
        urgency: rule.urgency,
        justification,
        human_in_the_loop: true,
    }
}

// ── Predicates ────────────────────────────────────────────────────────────────

fn always(_: &ReasoningSignals, _: &BlastRadius, _: Confidence) -> bool {
    true
}

fn high_privileged(s: &ReasoningSignals, _: &BlastRadius, c: Confidence) -> bool {
    c == Confidence::High && s.privileged_context.detected
}

fn high_growth(_: &ReasoningSignals, b: &BlastRadius, c: Confidence) -> bool {
    c == Confidence::High && b.blast_growth.detected
}

fn medium(_: &ReasoningSignals, _: &BlastRadius, c: Confidence) -> bool {
    c == Confidence::Medium
}

// ── Justification lines ───────────────────────────────────────────────────────

fn justify_privileged(s: &ReasoningSignals, _: &BlastRadius) -> String {
    format!(
        "Privileged context: {} privileged users; lateral movement across {} hosts.",
        s.privileged_context.privileged_users, s.lateral_movement.hosts,
    )
}

fn justify_growth(_: &ReasoningSignals, b: &BlastRadius) -> String {
    let g = &b.blast_growth;
    format!(
        "Blast growth: hosts expanded from {} to {} in {} minutes.",
        g.start_hosts, g.end_hosts, g.window_minutes,
    )
}

fn justify_medium(_: &ReasoningSignals, b: &BlastRadius) -> String {
    format!(
        "Moderate confidence: techniques={} hosts={} users={}.",
        b.techniques.len(),
        b.unique_hosts.len(),
        b.unique_users.len(),
    )
}

fn justify_low(_: &ReasoningSignals, b: &BlastRadius) -> String {
    format!(
        "Low confidence: hosts={} users={} privileged_users={}.",
        b.unique_hosts.len(),
        b.unique_users.len(),
        b.privileged_users.len(),
    )
}

fn signal_lines(s: &ReasoningSignals, b: &BlastRadius) -> Vec<String> {
    let mut lines = Vec::new();

    let cs = &s.credential_spray;
    if cs.detected {
        lines.push(format!(
            "Credential spray signal: {} source IPs targeted {} users in {} minutes.",
            cs.source_ips, cs.users, cs.window_minutes,
        ));
    }

    let lm = &s.lateral_movement;
    if lm.detected {
        lines.push(format!(
            "Lateral movement signal: user '{}' accessed {} hosts in {} minutes.",
            lm.user.as_deref().unwrap_or("unknown"),
            lm.hosts,
            lm.window_minutes,
        ));
    }

    let g = &b.blast_growth;
    if g.detected {
        lines.push(format!(
            "Blast radius growth window: {} new hosts in {} minutes.",
            g.new_hosts, g.window_minutes,
        ));
    }

    lines
}
