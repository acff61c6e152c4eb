// alertfuse/src/workers/lateral_movement.rs
//
// Lateral movement — one identity hopping across hosts.
//
// Builds user → {hosts} in first-appearance order and picks the user with
// the widest spread (earliest user wins ties). Fires when that user touched
// ≥ MIN_HOSTS hosts and either:
//   - the incident involves exactly one user, or
//   - a T1021 (Remote Services) technique was observed.
// Window is the span of the chosen user's alerts only.

use std::collections::{BTreeSet, HashMap};

use crate::events::{Alert, BlastRadius, LateralMovement};
use crate::state::window::span_minutes;

const MIN_HOSTS: usize = 3;
const REMOTE_SERVICES_PREFIX: &str = "T1021";

/// Users in first-appearance order with the hosts each one touched.
fn hosts_per_user(alerts: &[Alert]) -> Vec<(&str, BTreeSet<&str>)> {
    let mut order: Vec<(&str, BTreeSet<&str>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for alert in alerts {
        let (Some(user), Some(host)) = (alert.user(), alert.host()) else {
            continue;
        };
        let slot = *index.entry(user).or_insert_with(|| {
            order.push((user, BTreeSet::new()));
            order.len() - 1
        });
        order[slot].1.insert(host);
    }
    order
}

pub fn analyze(alerts: &[Alert], blast: &BlastRadius) -> LateralMovement {
    let mut best_user: Option<&str> = None;
    let mut best_hosts = 0usize;
    for (user, hosts) in hosts_per_user(alerts) {
        if hosts.len() > best_hosts {
            best_hosts = hosts.len();
            best_user = Some(user);
        }
    }

    let technique_t1021 = u8::from(
        blast.techniques.iter().any(|t| t.starts_with(REMOTE_SERVICES_PREFIX)),
    );

    let window_minutes = best_user
        .map(|user| {
            span_minutes(
                alerts
                    .iter()
                    .filter(|a| a.user() == Some(user))
                    .map(|a| a.timestamp),
            )
        })
        .unwrap_or(0);

    let detected = best_hosts >= MIN_HOSTS
        && (blast.unique_users.len() == 1 || technique_t1021 == 1);

    LateralMovement {
        detected,
        user: best_user.map(str::to_string),
        hosts: best_hosts,
        window_minutes,
        technique_t1021,
    }
}
