// 🎯 Entity - the record under review
//
// Identity: id (opaque, unique across every collection)
// Values: name, type, risk score, source, status, summary
//
// Status is overwritten by the transition engine; everything else is fixed
// at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::severity::Severity;

// ============================================================================
// ENTITY TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Person,
    Shipment,
    #[serde(rename = "IP Address")]
    IpAddress,
    Email,
    File,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Person,
        EntityType::Shipment,
        EntityType::IpAddress,
        EntityType::Email,
        EntityType::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "Person",
            EntityType::Shipment => "Shipment",
            EntityType::IpAddress => "IP Address",
            EntityType::Email => "Email",
            EntityType::File => "File",
        }
    }
}

// ============================================================================
// ENTITY SOURCE
// ============================================================================

/// Where the entity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntitySource {
    Watchlist,
    #[serde(rename = "Custom Ingest")]
    CustomIngest,
    #[serde(rename = "AI Model")]
    AiModel,
    #[serde(rename = "Manual Flag")]
    ManualFlag,
}

impl EntitySource {
    pub const ALL: [EntitySource; 4] = [
        EntitySource::Watchlist,
        EntitySource::CustomIngest,
        EntitySource::AiModel,
        EntitySource::ManualFlag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntitySource::Watchlist => "Watchlist",
            EntitySource::CustomIngest => "Custom Ingest",
            EntitySource::AiModel => "AI Model",
            EntitySource::ManualFlag => "Manual Flag",
        }
    }
}

// ============================================================================
// TRIAGE STATUS
// ============================================================================

/// Review status carried on the entity record.
///
/// Only `Flagged`, `Priority` and `Deleted` are transition targets; the
/// remaining variants are kept so records from older dashboards still
/// deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageStatus {
    Unreviewed,
    Flagged,
    Priority,
    Deleted,
    Approved,
    Escalated,
}

impl TriageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageStatus::Unreviewed => "Unreviewed",
            TriageStatus::Flagged => "Flagged",
            TriageStatus::Priority => "Priority",
            TriageStatus::Deleted => "Deleted",
            TriageStatus::Approved => "Approved",
            TriageStatus::Escalated => "Escalated",
        }
    }
}

impl fmt::Display for TriageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Stable identity - NEVER changes
    pub id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// 0 - 100
    pub risk_score: u8,

    pub source: EntitySource,

    pub status: TriageStatus,

    /// Creation time
    pub timestamp: DateTime<Utc>,

    /// Severity-banded description (see `severity::summary`)
    pub summary: String,
}

impl Entity {
    /// Create a new Unreviewed entity stamped with the current time.
    ///
    /// Risk scores above 100 are clamped.
    pub fn new(
        id: String,
        name: String,
        entity_type: EntityType,
        risk_score: u8,
        source: EntitySource,
    ) -> Self {
        Entity {
            id,
            name,
            entity_type,
            risk_score: risk_score.min(100),
            source,
            status: TriageStatus::Unreviewed,
            timestamp: Utc::now(),
            summary: String::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_summary(mut self, summary: String) -> Self {
        self.summary = summary;
        self
    }

    pub fn severity(&self) -> Severity {
        Severity::from_score(self.risk_score)
    }

    pub fn is_critical(&self) -> bool {
        self.severity() == Severity::Critical
    }

    /// Case-insensitive substring match on the name. An empty term matches
    /// everything.
    pub fn matches_name(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}

// ============================================================================
// TESTS
// ============================================================================
