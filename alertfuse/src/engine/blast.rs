// alertfuse/src/engine/blast.rs
//
// Blast radius analyzer — distinct entities an incident touched, plus the
// worst host-expansion burst.
//
// Growth detection:
//   1. One timestamp per distinct host: the first alert seen for that host
//      in iteration order (not necessarily the earliest one).
//   2. Sort, then find the densest 10-minute span (state::window).
//   3. Detected when that burst reaches GROWTH_MIN_HOSTS, or when the
//      incident as a whole reaches GROWTH_MIN_HOSTS. In the second case the
//      reported window widens to the full incident span.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::events::{Alert, BlastGrowth, BlastRadius};
use crate::state::window::{densest_span, span_minutes, window_minutes, W_10MIN};

pub const GROWTH_MIN_HOSTS: usize = 5;
const PRIVILEGED_PREFIX: &str = "admin";

/// Case-insensitive `admin*` prefix check.
pub fn is_privileged(user: &str) -> bool {
    user.get(..PRIVILEGED_PREFIX.len())
        .map(|head| head.eq_ignore_ascii_case(PRIVILEGED_PREFIX))
        .unwrap_or(false)
}

pub fn compute_blast_radius(alerts: &[Alert]) -> BlastRadius {
    if alerts.is_empty() {
        return BlastRadius::default();
    }

    let mut unique_hosts     = BTreeSet::new();
    let mut unique_users     = BTreeSet::new();
    let mut privileged_users = BTreeSet::new();
    let mut techniques       = BTreeSet::new();
    let mut host_times: Vec<DateTime<Utc>> = Vec::new();

    for alert in alerts {
        if let Some(host) = alert.host() {
            if unique_hosts.insert(host.to_string()) {
                host_times.push(alert.timestamp);
            }
        }
        if let Some(user) = alert.user() {
            unique_users.insert(user.to_string());
            if is_privileged(user) {
                privileged_users.insert(user.to_string());
            }
        }
        if let Some(technique) = alert.technique() {
            techniques.insert(technique.to_string());
        }
    }

    let blast_growth = compute_blast_growth(alerts, host_times);

    BlastRadius {
        unique_hosts,
        unique_users,
        privileged_users,
        techniques,
        blast_growth,
    }
}

fn compute_blast_growth(alerts: &[Alert], mut host_times: Vec<DateTime<Utc>>) -> BlastGrowth {
    host_times.sort();
    let Some(burst) = densest_span(&host_times, Duration::seconds(W_10MIN)) else {
        return BlastGrowth::default();
    };

    let total_hosts = host_times.len();
    let max_new_hosts = burst.count();

    if max_new_hosts >= GROWTH_MIN_HOSTS {
        return BlastGrowth {
            detected:       true,
            window_minutes: window_minutes(host_times[burst.start], host_times[burst.end - 1]),
            start_hosts:    burst.start,
            end_hosts:      burst.end,
            new_hosts:      max_new_hosts,
        };
    }

    if total_hosts >= GROWTH_MIN_HOSTS {
        // Slow spread: no single burst qualified, report the whole incident.
        return BlastGrowth {
            detected:       true,
            window_minutes: span_minutes(alerts.iter().map(|a| a.timestamp)),
            start_hosts:    0,
            end_hosts:      total_hosts,
            new_hosts:      total_hosts,
        };
    }

    BlastGrowth::default()
}
