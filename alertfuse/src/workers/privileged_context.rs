// alertfuse/src/workers/privileged_context.rs
//
// Privileged context — any admin-prefixed account involved.
// The prefix rule lives in engine::blast::is_privileged.

use crate::events::{Alert, BlastRadius, PrivilegedContext};

pub fn analyze(_alerts: &[Alert], blast: &BlastRadius) -> PrivilegedContext {
    let privileged_users = blast.privileged_users.len();
    PrivilegedContext {
        detected: privileged_users > 0,
        privileged_users,
    }
}
