// Threat Triage - Core Library
// Exposes the triage core for the dashboard binary and tests

pub mod config;
pub mod entities;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod report;
pub mod severity;
pub mod store;
pub mod view;

use chrono::Utc;

// Re-export commonly used types
pub use config::TriageConfig;
pub use entities::{AuditEntry, AuditLog, Entity, EntitySource, EntityType, TriageStatus};
pub use error::{Result, TriageError};
pub use generator::EntityGenerator;
pub use ingest::{IngestHandle, Ingestor};
pub use report::Report;
pub use severity::{summary, Severity, CRITICAL_THRESHOLD, SIGNAL_THRESHOLD};
pub use store::{is_allowed, Action, Collection, TriageStore};
pub use view::{
    derive_view, filter_by_name, sort_entities, DashboardStats, SortDirection, SortKey, SortSpec,
    View, ViewQuery,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initial store for a session: `seed_count` generated entities in
/// Unreviewed, archive policy taken from the config.
pub fn seed_store(config: &TriageConfig) -> TriageStore {
    let mut generator = EntityGenerator::from_seed(config.rng_seed);
    let entities = generator.seed_batch(config.seed_count, Utc::now());

    TriageStore::seeded(entities).archiving_deleted(config.submit_includes_deleted)
}
