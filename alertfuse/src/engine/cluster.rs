// alertfuse/src/engine/cluster.rs
//
// Incident clusterer — greedy single-pass assignment of alerts to incidents.
//
// Alerts are stable-sorted by timestamp, then each one is scored against
// every open cluster:
//
//   host already in cluster       +2
//   user already in cluster       +2
//   source IP already in cluster  +1
//   technique already in cluster  +3
//   |Δt| to cluster's latest ≤ W  +1
//
// The strictly highest score wins (earliest cluster on ties). At or above
// min_score the alert joins; below it a new INC-#### cluster is opened.
// Clusters are never merged or closed early: the time window is only a
// bonus, so a late alert can still join on entity overlap alone.
//
// Once every alert is placed, each cluster runs through
//   blast radius → signals → confidence → decision
// and is emitted in creation order.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::config::ClusterConfig;
use crate::engine::blast::compute_blast_radius;
use crate::engine::confidence::assess_confidence;
use crate::engine::decision::assess_decision;
use crate::events::{Alert, EntitiesSummary, Incident};
use crate::workers::derive_signals;

const SCORE_HOST:      i64 = 2;
const SCORE_USER:      i64 = 2;
const SCORE_SOURCE_IP: i64 = 1;
const SCORE_TECHNIQUE: i64 = 3;
const SCORE_PROXIMITY: i64 = 1;

// ── Open cluster state ────────────────────────────────────────────────────────

#[derive(Debug)]
struct ClusterState {
    incident_id: String,
    alerts:      Vec<Alert>,
    hosts:       BTreeSet<String>,
    users:       BTreeSet<String>,
    ips:         BTreeSet<String>,
    techniques:  BTreeSet<String>,
    latest:      DateTime<Utc>,
}

impl ClusterState {
    fn open(incident_id: String, seed: Alert) -> Self {
        let mut state = Self {
            incident_id,
            alerts:     Vec::new(),
            hosts:      BTreeSet::new(),
            users:      BTreeSet::new(),
            ips:        BTreeSet::new(),
            techniques: BTreeSet::new(),
            latest:     seed.timestamp,
        };
        state.add(seed);
        state
    }

    fn add(&mut self, alert: Alert) {
        if let Some(host) = alert.host() {
            self.hosts.insert(host.to_string());
        }
        if let Some(user) = alert.user() {
            self.users.insert(user.to_string());
        }
        if let Some(ip) = alert.source_ip() {
            self.ips.insert(ip.to_string());
        }
        if let Some(technique) = alert.technique() {
            self.techniques.insert(technique.to_string());
        }
        if alert.timestamp > self.latest {
            self.latest = alert.timestamp;
        }
        self.alerts.push(alert);
    }

    fn score(&self, alert: &Alert, time_window: Duration) -> i64 {
        let mut score = 0;
        if alert.host().is_some_and(|h| self.hosts.contains(h)) {
            score += SCORE_HOST;
        }
        if alert.user().is_some_and(|u| self.users.contains(u)) {
            score += SCORE_USER;
        }
        if alert.source_ip().is_some_and(|ip| self.ips.contains(ip)) {
            score += SCORE_SOURCE_IP;
        }
        if alert.technique().is_some_and(|t| self.techniques.contains(t)) {
            score += SCORE_TECHNIQUE;
        }
        if (alert.timestamp - self.latest).abs() <= time_window {
            score += SCORE_PROXIMITY;
        }
        score
    }

    fn into_incident(self) -> Incident {
        let blast = compute_blast_radius(&self.alerts);
        let signals = derive_signals(&self.alerts, &blast);
        let (confidence, reasoning) = assess_confidence(&signals, &blast);
        let decision = assess_decision(&signals, &blast, confidence);

        info!(
            incident = %self.incident_id,
            alerts = self.alerts.len(),
            hosts = self.hosts.len(),
            %confidence,
            action = %decision.action,
            "incident assessed"
        );

        Incident {
            incident_id:     self.incident_id,
            alerts:          self.alerts,
            techniques:      self.techniques,
            entities:        EntitiesSummary { hosts: self.hosts, users: self.users, ips: self.ips },
            confidence,
            reasoning,
            decision_replay: Some(decision),
        }
    }
}

fn incident_id(seq: usize) -> String {
    format!("INC-{seq:04}")
}

// ── Clustering ────────────────────────────────────────────────────────────────

/// Group `alerts` into incidents. Input order does not matter.
pub fn cluster_alerts<I>(alerts: I, time_window: Duration, min_score: i64) -> Vec<Incident>
where
    I: IntoIterator<Item = Alert>,
{
    let mut sorted: Vec<Alert> = alerts.into_iter().collect();
    sorted.sort_by_key(|a| a.timestamp); // stable: equal timestamps keep input order

    let mut clusters: Vec<ClusterState> = Vec::new();

    for alert in sorted {
        let mut best: Option<(usize, i64)> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            let score = cluster.score(&alert, time_window);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((idx, score));
            }
        }

        match best {
            Some((idx, score)) if score >= min_score => clusters[idx].add(alert),
            _ => {
                let id = incident_id(clusters.len() + 1);
                debug!(incident = %id, ts = %alert.timestamp, "opening cluster");
                clusters.push(ClusterState::open(id, alert));
            }
        }
    }

    clusters.into_iter().map(ClusterState::into_incident).collect()
}

/// `cluster_alerts` with window and threshold taken from `config`.
pub fn cluster_with_config<I>(alerts: I, config: &ClusterConfig) -> Vec<Incident>
where
    I: IntoIterator<Item = Alert>,
{
    cluster_alerts(alerts, config.time_window, config.min_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn alert(minute: i64, host: &str, user: &str, ip: &str, technique: Option<&str>) -> Alert {
        let a = Alert::new(t0() + Duration::minutes(minute), "Test")
            .with_host(host)
            .with_user(user)
            .with_source_ip(ip);
        match technique {
            Some(t) => a.with_technique(t),
            None => a,
        }
    }

    #[test]
    fn score_adds_every_overlap() {
        let state = ClusterState::open("INC-0001".into(), alert(0, "host-a", "alice", "10.0.0.1", Some("T1000")));
        let window = Duration::minutes(15);
        assert_eq!(state.score(&alert(1, "host-a", "alice", "10.0.0.1", Some("T1000")), window), 9);
        assert_eq!(state.score(&alert(1, "host-z", "zed", "10.9.9.9", None), window), 1);
        assert_eq!(state.score(&alert(60, "host-z", "zed", "10.9.9.9", None), window), 0);
        assert_eq!(state.score(&alert(15, "host-z", "zed", "10.9.9.9", None), window), 1);
    }

    #[test]
    fn ids_are_sequential_in_creation_order() {
        let alerts = vec![
            alert(0, "host-a", "alice", "10.0.0.1", None),
            alert(1, "host-b", "bob", "10.0.0.2", None),
            alert(2, "host-c", "carol", "10.0.0.3", None),
        ];
        let incidents = cluster_alerts(alerts, Duration::minutes(15), 5);
        let ids: Vec<&str> = incidents.iter().map(|i| i.incident_id.as_str()).collect();
        assert_eq!(ids, ["INC-0001", "INC-0002", "INC-0003"]);
    }

    #[test]
    fn input_is_sorted_before_assignment() {
        let alerts = vec![
            alert(5, "host-a", "alice", "10.0.0.2", None),
            alert(0, "host-a", "alice", "10.0.0.1", Some("T1000")),
        ];
        let incidents = cluster_alerts(alerts, Duration::minutes(15), 5);
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].alerts[0].timestamp, t0());
    }

    #[test]
    fn ties_go_to_the_earliest_cluster() {
        let alerts = vec![
            alert(0, "host-a", "alice", "10.0.0.1", None),
            alert(1, "host-b", "bob", "10.0.0.2", None),
            // matches host-a (+2) and bob (+2) and is close to both (+1)
            alert(2, "host-a", "bob", "10.0.0.9", None),
        ];
        let incidents = cluster_alerts(alerts, Duration::minutes(15), 3);
        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].alerts.len(), 2);
        assert_eq!(incidents[1].alerts.len(), 1);
    }

    #[test]
    fn late_alert_joins_on_entity_overlap() {
        let alerts = vec![
            alert(0, "host-a", "alice", "10.0.0.1", Some("T1000")),
            alert(600, "host-a", "alice", "10.0.0.7", None),
        ];
        let incidents = cluster_alerts(alerts, Duration::minutes(15), 4);
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].entities.ips.len(), 2);
    }

    #[test]
    fn every_incident_carries_a_gated_decision() {
        let alerts = vec![alert(0, "host-a", "alice", "10.0.0.1", None)];
        let incidents = cluster_alerts(alerts, Duration::minutes(15), 5);
        let replay = incidents[0].decision_replay.as_ref().unwrap();
        assert!(replay.human_in_the_loop);
    }
}
