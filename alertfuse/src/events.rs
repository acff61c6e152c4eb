// alertfuse/src/events.rs
//
// Shared domain types flowing through alertfuse.
//
//   Alert            — one normalized observation from an IDS / EDR / SIEM feed
//   BlastRadius      — distinct entities touched by an incident + growth burst
//   ReasoningSignals — the four attack-pattern detectors
//   DecisionReplay   — recommended response, always gated on a human
//   Incident         — the record written to the incident store
//
// Every set is a BTreeSet so serialized incidents are byte-stable across runs.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Alerts ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub source_ip: Option<String>,
    #[serde(default)]
    pub dest_ip: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    pub alert_type: String,
    #[serde(default)]
    pub mitre_technique: Option<String>,
    #[serde(default)]
    pub raw: Map<String, Value>, // original record, untouched
}

impl Alert {
    pub fn new(timestamp: DateTime<Utc>, alert_type: impl Into<String>) -> Self {
        Self {
            timestamp,
            source_ip: None,
            dest_ip: None,
            user: None,
            host: None,
            alert_type: alert_type.into(),
            mitre_technique: None,
            raw: Map::new(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = Some(ip.into());
        self
    }

    pub fn with_dest_ip(mut self, ip: impl Into<String>) -> Self {
        self.dest_ip = Some(ip.into());
        self
    }

    pub fn with_technique(mut self, technique: impl Into<String>) -> Self {
        self.mitre_technique = Some(technique.into());
        self
    }

    // Empty strings count as absent everywhere downstream.
    pub fn host(&self) -> Option<&str> {
        non_empty(&self.host)
    }

    pub fn user(&self) -> Option<&str> {
        non_empty(&self.user)
    }

    pub fn source_ip(&self) -> Option<&str> {
        non_empty(&self.source_ip)
    }

    pub fn technique(&self) -> Option<&str> {
        non_empty(&self.mitre_technique)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

// ── Blast radius ──────────────────────────────────────────────────────────────

/// Worst observed host-expansion burst for one incident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastGrowth {
    pub detected: bool,
    pub window_minutes: u64,
    pub start_hosts: usize,
    pub end_hosts: usize,
    pub new_hosts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastRadius {
    pub unique_hosts: BTreeSet<String>,
    pub unique_users: BTreeSet<String>,
    pub privileged_users: BTreeSet<String>,
    pub techniques: BTreeSet<String>,
    pub blast_growth: BlastGrowth,
}

// ── Detection types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSpray {
    pub detected: bool,
    pub source_ips: usize,
    pub users: usize,
    pub window_minutes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateralMovement {
    pub detected: bool,
    pub user: Option<String>, // user with the widest host spread
    pub hosts: usize,
    pub window_minutes: u64,
    pub technique_t1021: u8, // 1 if any T1021.* technique was observed
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueProgression {
    pub detected: bool,
    pub techniques: usize,
    pub window_minutes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegedContext {
    pub detected: bool,
    pub privileged_users: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningSignals {
    pub credential_spray: CredentialSpray,
    pub lateral_movement: LateralMovement,
    pub technique_progression: TechniqueProgression,
    pub privileged_context: PrivilegedContext,
}

// ── Confidence + decision ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Monitor,
    CollectForensics,
    IsolateHost,
    DisableAccount,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monitor => write!(f, "MONITOR"),
            Self::CollectForensics => write!(f, "COLLECT_FORENSICS"),
            Self::IsolateHost => write!(f, "ISOLATE_HOST"),
            Self::DisableAccount => write!(f, "DISABLE_ACCOUNT"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Low,
    High,
    Immediate,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
            Self::Immediate => write!(f, "IMMEDIATE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionReplay {
    pub action: ActionKind,
    pub urgency: Urgency,
    #[serde(default)]
    pub justification: Vec<String>,
    #[serde(default = "human_gate")]
    pub human_in_the_loop: bool,
}

fn human_gate() -> bool {
    true
}

// ── Incident record ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitiesSummary {
    #[serde(default)]
    pub hosts: BTreeSet<String>,
    #[serde(default)]
    pub users: BTreeSet<String>,
    #[serde(default)]
    pub ips: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: String,
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub techniques: BTreeSet<String>,
    #[serde(default)]
    pub entities: EntitiesSummary,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub reasoning: Vec<String>,
    #[serde(default)]
    pub decision_replay: Option<DecisionReplay>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_fields_read_as_absent() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let alert = Alert::new(ts, "Test")
            .with_host("")
            .with_user("alice")
            .with_dest_ip("10.0.0.9");
        assert_eq!(alert.host(), None);
        assert_eq!(alert.dest_ip.as_deref(), Some("10.0.0.9"));
        assert_eq!(alert.user(), Some("alice"));
        assert_eq!(alert.technique(), None);
    }

    #[test]
    fn enums_serialize_as_upper_labels() {
        assert_eq!(serde_json::to_string(&Confidence::Medium).unwrap(), "\"MEDIUM\"");
        assert_eq!(
            serde_json::to_string(&ActionKind::CollectForensics).unwrap(),
            "\"COLLECT_FORENSICS\""
        );
        assert_eq!(serde_json::to_string(&Urgency::Immediate).unwrap(), "\"IMMEDIATE\"");
        assert_eq!(ActionKind::DisableAccount.to_string(), "DISABLE_ACCOUNT");
    }

    #[test]
    fn decision_replay_defaults_to_human_gate() {
        let replay: DecisionReplay =
            serde_json::from_str(r#"{"action":"MONITOR","urgency":"LOW"}"#).unwrap();
        assert!(replay.human_in_the_loop);
        assert!(replay.justification.is_empty());
    }
}
