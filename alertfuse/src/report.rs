// alertfuse/src/report.rs
//
// Plain-text rendering for the CLI: cluster summary table, incident detail
// (optionally with its reasoning trail) and decision replay.
//
// Replay never recomputes: confidence, reasoning and the decision come
// straight from the stored record. Only the `--explain` blast-radius summary
// is derived again from the stored alerts.

use std::collections::BTreeSet;

use crate::engine::blast::compute_blast_radius;
use crate::engine::confidence::fmt_minutes;
use crate::events::{Alert, Incident};

pub const SAMPLE_SIZE: usize = 5;

fn join(set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        "-".to_string()
    } else {
        set.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Newline-terminated block.
fn block(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// First `SAMPLE_SIZE` alerts as pretty JSON, preceded by the total count.
pub fn alert_sample(alerts: &[Alert]) -> serde_json::Result<String> {
    let sample = &alerts[..alerts.len().min(SAMPLE_SIZE)];
    Ok(format!("alerts={}\n{}", alerts.len(), serde_json::to_string_pretty(sample)?))
}

pub fn cluster_table(incidents: &[Incident]) -> String {
    let mut lines = vec!["incident_id alerts hosts users ips techniques confidence".to_string()];
    lines.extend(incidents.iter().map(|i| {
        format!(
            "{} {} {} {} {} {} {}",
            i.incident_id,
            i.alerts.len(),
            i.entities.hosts.len(),
            i.entities.users.len(),
            i.entities.ips.len(),
            i.techniques.len(),
            i.confidence,
        )
    }));
    block(lines)
}

pub fn incident_list(incidents: &[Incident]) -> String {
    if incidents.is_empty() {
        return "No incidents found.\n".to_string();
    }
    let mut lines = vec![
        format!("{:<10} | {:>6} | {:<10} | {:<17} | Urgency", "Incident", "Alerts", "Confidence", "Action"),
        format!("{:-<10}-|-{:->6}-|-{:-<10}-|-{:-<17}-|-{:-<9}", "", "", "", "", ""),
    ];
    for i in incidents {
        let (action, urgency) = match &i.decision_replay {
            Some(d) => (d.action.to_string(), d.urgency.to_string()),
            None => ("-".to_string(), "-".to_string()),
        };
        lines.push(format!(
            "{:<10} | {:>6} | {:<10} | {:<17} | {}",
            i.incident_id,
            i.alerts.len(),
            i.confidence.to_string(),
            action,
            urgency,
        ));
    }
    block(lines)
}

pub fn show(incident: &Incident, explain: bool) -> String {
    let mut lines = vec![
        format!("Incident: {}", incident.incident_id),
        format!("Alerts: {}", incident.alerts.len()),
        format!("Hosts: {}", join(&incident.entities.hosts)),
        format!("Users: {}", join(&incident.entities.users)),
        format!("IPs: {}", join(&incident.entities.ips)),
        format!("Techniques: {}", join(&incident.techniques)),
        format!("Confidence: {}", incident.confidence),
    ];

    if explain {
        lines.push("Reasoning:".to_string());
        lines.extend(incident.reasoning.iter().map(|line| format!("  - {line}")));

        let blast = compute_blast_radius(&incident.alerts);
        lines.push(format!(
            "Blast radius: hosts={} users={} privileged_users={}",
            blast.unique_hosts.len(),
            blast.unique_users.len(),
            blast.privileged_users.len(),
        ));
        let g = &blast.blast_growth;
        if g.detected {
            lines.push(format!(
                "Blast growth: {} new hosts ({} -> {}) in {}",
                g.new_hosts,
                g.start_hosts,
                g.end_hosts,
                fmt_minutes(g.window_minutes),
            ));
        }
    }
    block(lines)
}

pub fn replay(incident: &Incident) -> String {
    let Some(decision) = &incident.decision_replay else {
        return format!("No decision replay recorded for {}.\n", incident.incident_id);
    };

    let mut lines = vec![
        format!("Incident: {}", incident.incident_id),
        format!("Confidence: {}", incident.confidence),
        format!("Action: {}", decision.action),
        format!("Urgency: {}", decision.urgency),
        "Justification:".to_string(),
    ];
    lines.extend(decision.justification.iter().map(|line| format!("  - {line}")));
    lines.push(format!("Human in the loop: {}", decision.human_in_the_loop));
    block(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cluster::cluster_alerts;
    use chrono::{Duration, TimeZone, Utc};

    fn privileged_hop() -> Vec<Incident> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        let alerts = ["host-a", "host-b", "host-c"]
            .iter()
            .enumerate()
            .map(|(i, host)| {
                Alert::new(base + Duration::minutes(i as i64), "Remote Service")
                    .with_host(*host)
                    .with_user("admin_ops")
                    .with_source_ip("10.0.0.1")
                    .with_technique("T1021")
            })
            .collect::<Vec<_>>();
        cluster_alerts(alerts, Duration::minutes(15), 5)
    }

    #[test]
    fn table_has_header_and_one_row_per_incident() {
        let table = cluster_table(&privileged_hop());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "incident_id alerts hosts users ips techniques confidence");
        assert_eq!(lines[1], "INC-0001 3 3 1 1 1 HIGH");
        assert_eq!(lines.len(), 2);
        assert!(table.ends_with('\n'));

        assert_eq!(cluster_table(&[]), "incident_id alerts hosts users ips techniques confidence\n");
    }

    #[test]
    fn list_has_one_row_per_incident() {
        let list = incident_list(&privileged_hop());
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("INC-0001"));
        assert!(lines[2].contains("DISABLE_ACCOUNT"));
        assert_eq!(incident_list(&[]), "No incidents found.\n");
    }

    #[test]
    fn explain_adds_reasoning_and_blast_summary() {
        let incidents = privileged_hop();
        let plain = show(&incidents[0], false);
        assert!(plain.contains("Confidence: HIGH"));
        assert!(!plain.contains("Reasoning:"));

        let explained = show(&incidents[0], true);
        assert!(explained.contains("Reasoning:"));
        assert!(explained.contains("Blast radius: hosts=3 users=1 privileged_users=1"));
        assert_eq!(
            explained.lines().filter(|l| l.starts_with("  - ")).count(),
            incidents[0].reasoning.len()
        );
    }

    #[test]
    fn replay_prints_stored_decision() {
        let incidents = privileged_hop();
        let text = replay(&incidents[0]);
        assert!(text.contains("Action: DISABLE_ACCOUNT"));
        assert!(text.contains("Urgency: IMMEDIATE"));
        assert!(text.ends_with("Human in the loop: true\n"));

        let mut bare = incidents[0].clone();
        bare.decision_replay = None;
        assert_eq!(replay(&bare), "No decision replay recorded for INC-0001.\n");
    }

    #[test]
    fn sample_is_capped() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let alerts: Vec<Alert> = (0..8).map(|i| Alert::new(base + Duration::seconds(i), "Test")).collect();
        let text = alert_sample(&alerts).unwrap();
        assert!(text.starts_with("alerts=8\n"));
        let body: Vec<serde_json::Value> = serde_json::from_str(text.split_once('\n').unwrap().1).unwrap();
        assert_eq!(body.len(), 5);
    }
}
