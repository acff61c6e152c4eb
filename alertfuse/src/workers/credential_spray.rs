// alertfuse/src/workers/credential_spray.rs
//
// Credential spraying — many accounts, few sources.
//
// Fires when ≥ MIN_USERS distinct users were hit from ≤ MAX_SOURCE_IPS
// distinct source IPs and at least one alert looks like a password attack:
//   - MITRE technique under T1110 (Brute Force), or
//   - alert type containing "failed login" (any case).
// Alert types are scanned with an Aho-Corasick automaton so the indicator
// list can grow without a per-pattern pass.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::events::{Alert, BlastRadius, CredentialSpray};
use crate::state::window::span_minutes;

const MIN_USERS: usize = 5;
const MAX_SOURCE_IPS: usize = 2;
const BRUTE_FORCE_PREFIX: &str = "T1110";

const INDICATOR_PATTERNS: &[&str] = &["failed login"];

static INDICATOR_AC: OnceLock<AhoCorasick> = OnceLock::new();

fn indicator_automaton() -> &'static AhoCorasick {
    INDICATOR_AC.get_or_init(|| {
        AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostFirst)
            .build(INDICATOR_PATTERNS)
            .expect("credential indicator AC build failed")
    })
}

fn has_indicator(alerts: &[Alert]) -> bool {
    let ac = indicator_automaton();
    alerts.iter().any(|a| {
        a.technique().is_some_and(|t| t.starts_with(BRUTE_FORCE_PREFIX))
            || ac.is_match(a.alert_type.as_str())
    })
}

pub fn analyze(alerts: &[Alert], _blast: &BlastRadius) -> CredentialSpray {
    let users: BTreeSet<&str> = alerts.iter().filter_map(Alert::user).collect();
    let source_ips: BTreeSet<&str> = alerts.iter().filter_map(Alert::source_ip).collect();

    let detected = users.len() >= MIN_USERS
        && source_ips.len() <= MAX_SOURCE_IPS
        && has_indicator(alerts);

    CredentialSpray {
        detected,
        source_ips:     source_ips.len(),
        users:          users.len(),
        window_minutes: span_minutes(alerts.iter().map(|a| a.timestamp)),
    }
}
