// Entity Models
// "An entity lives in exactly one collection at a time"
//
// - Entity: the record under review (identity = id, never changes)
// - AuditEntry / AuditLog: append-only trail of triage actions

pub mod entity;
pub mod audit;

pub use entity::{Entity, EntitySource, EntityType, TriageStatus};
pub use audit::{AuditEntry, AuditLog};
