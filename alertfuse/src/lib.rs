// alertfuse/src/lib.rs
//
// Alert fusion: normalize raw security alerts, cluster them into incidents,
// measure blast radius, derive reasoning signals, and attach a confidence
// level plus a human-gated response recommendation to every incident.
//
//   ingest ──► engine::cluster ──► engine::blast ──► workers::* ──►
//              engine::confidence ──► engine::decision ──► store

pub mod config;
pub mod engine;
pub mod events;
pub mod ingest;
pub mod report;
pub mod state;
pub mod store;
pub mod workers;

pub use config::ClusterConfig;
pub use engine::blast::compute_blast_radius;
pub use engine::cluster::{cluster_alerts, cluster_with_config};
pub use engine::confidence::assess_confidence;
pub use engine::decision::assess_decision;
pub use events::{Alert, Confidence, DecisionReplay, Incident};
pub use store::IncidentStore;
pub use workers::derive_signals;
