// 🗂️ Triage Store + Transition Engine
//
// The store is a single value. Every mutation goes through `apply`, which
// consumes the old state and returns the new one:
//
//   store = store.apply(Action::Transition { id, target: Priority });
//
// Invariant: every entity id is held by exactly one collection.
//
// Transition policy (explicit table, see `is_allowed`):
//
//   Unreviewed ──▶ Flagged | Priority | Deleted
//   Flagged    ──▶ Priority | Deleted
//   Priority   ──▶ Flagged | Deleted
//   Deleted    ──▶ (nothing)
//
// Flagged + Priority (+ Deleted, if configured) leave the working set for
// good via `Action::SubmitBatch`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

use crate::entities::{AuditEntry, AuditLog, Entity, TriageStatus};
use crate::error::{Result, TriageError};

// ============================================================================
// COLLECTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Unreviewed,
    Flagged,
    Priority,
    Deleted,
    /// Archive of submitted batches (read-only)
    Submitted,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Unreviewed,
        Collection::Flagged,
        Collection::Priority,
        Collection::Deleted,
        Collection::Submitted,
    ];

    /// Collections an entity can be transitioned *out of*, in lookup order
    pub const SEARCH_ORDER: [Collection; 3] = [
        Collection::Unreviewed,
        Collection::Flagged,
        Collection::Priority,
    ];

    /// The active (not yet submitted) collections
    pub const WORKING_SET: [Collection; 4] = [
        Collection::Unreviewed,
        Collection::Flagged,
        Collection::Priority,
        Collection::Deleted,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Collection::Unreviewed => "Unreviewed",
            Collection::Flagged => "Flagged",
            Collection::Priority => "Priority",
            Collection::Deleted => "Deleted",
            Collection::Submitted => "Submitted",
        }
    }

    /// Destination collection for a transition target, if it is one
    pub fn for_target(target: TriageStatus) -> Option<Collection> {
        match target {
            TriageStatus::Flagged => Some(Collection::Flagged),
            TriageStatus::Priority => Some(Collection::Priority),
            TriageStatus::Deleted => Some(Collection::Deleted),
            TriageStatus::Unreviewed | TriageStatus::Approved | TriageStatus::Escalated => None,
        }
    }
}

/// Transition table: may an entity held by `from` move to `target`?
pub fn is_allowed(from: Collection, target: TriageStatus) -> bool {
    use Collection as C;
    use TriageStatus as S;

    matches!(
        (from, target),
        (C::Unreviewed | C::Flagged | C::Priority, S::Deleted)
            | (C::Unreviewed | C::Priority, S::Flagged)
            | (C::Unreviewed | C::Flagged, S::Priority)
    )
}

// ============================================================================
// ACTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Prepend a freshly generated entity to Unreviewed
    Ingest(Entity),

    /// Move an entity to Flagged / Priority / Deleted
    Transition { id: String, target: TriageStatus },

    /// Archive Flagged + Priority (+ Deleted when configured)
    SubmitBatch,
}

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageStore {
    unreviewed: VecDeque<Entity>,
    flagged: VecDeque<Entity>,
    priority: VecDeque<Entity>,
    deleted: VecDeque<Entity>,
    submitted: VecDeque<Entity>,
    audit: AuditLog,

    /// Whether SubmitBatch also archives Deleted
    archive_deleted: bool,
}

impl TriageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with Unreviewed entities, in the given order.
    ///
    /// Seeding writes no audit entries. Duplicate ids are skipped.
    pub fn seeded<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = Entity>,
    {
        let mut store = Self::new();
        let mut seen = HashSet::new();

        for mut entity in entities {
            if !seen.insert(entity.id.clone()) {
                warn!(id = %entity.id, "duplicate seed entity skipped");
                continue;
            }
            entity.status = TriageStatus::Unreviewed;
            store.unreviewed.push_back(entity);
        }

        store
    }

    pub fn archiving_deleted(mut self, archive_deleted: bool) -> Self {
        self.archive_deleted = archive_deleted;
        self
    }

    pub fn archives_deleted(&self) -> bool {
        self.archive_deleted
    }

    // ------------------------------------------------------------------------
    // Reducer
    // ------------------------------------------------------------------------

    pub fn apply(self, action: Action) -> Self {
        self.apply_at(action, Utc::now())
    }

    /// Apply an action with an explicit audit timestamp
    pub fn apply_at(self, action: Action, now: DateTime<Utc>) -> Self {
        let next = match action {
            Action::Ingest(entity) => self.ingest_at(entity, now),
            Action::Transition { id, target } => self.transition_at(&id, target, now),
            Action::SubmitBatch => self.submit_batch_at(now),
        };
        debug_assert!(next.check_partition().is_ok());
        next
    }

    pub fn ingest(self, entity: Entity) -> Self {
        self.apply(Action::Ingest(entity))
    }

    pub fn transition(self, id: &str, target: TriageStatus) -> Self {
        self.apply(Action::Transition {
            id: id.to_string(),
            target,
        })
    }

    pub fn submit_batch(self) -> Self {
        self.apply(Action::SubmitBatch)
    }

    fn ingest_at(mut self, mut entity: Entity, now: DateTime<Utc>) -> Self {
        if let Some(holder) = self.locate(&entity.id) {
            warn!(id = %entity.id, holder = holder.title(), "ingested id already present, ignoring");
            return self;
        }

        entity.status = TriageStatus::Unreviewed;
        let message = format!("Ingested {} (risk {})", entity.name, entity.risk_score);
        debug!(id = %entity.id, risk = entity.risk_score, "entity ingested");

        self.unreviewed.push_front(entity);
        self.audit.record(AuditEntry::at(now, message));
        self
    }

    /// Stale or unknown ids and disallowed moves are silent no-ops: no
    /// error, no audit entry.
    fn transition_at(mut self, id: &str, target: TriageStatus, now: DateTime<Utc>) -> Self {
        let Some(destination) = Collection::for_target(target) else {
            debug!(id, %target, "not a transition target");
            return self;
        };

        // First collection in search order holding the id wins
        let found = Collection::SEARCH_ORDER.iter().find_map(|&source| {
            self.collection(source)
                .iter()
                .position(|e| e.id == id)
                .map(|position| (source, position))
        });

        let Some((source, position)) = found else {
            debug!(id, %target, "transition target not found");
            return self;
        };

        if !is_allowed(source, target) {
            debug!(id, from = source.title(), %target, "transition not allowed");
            return self;
        }

        let Some(mut entity) = self.collection_mut(source).remove(position) else {
            return self;
        };
        entity.status = target;
        let message = format!("{} moved to {}", entity.name, target);
        debug!(id, from = source.title(), to = destination.title(), "entity moved");

        self.collection_mut(destination).push_front(entity);
        self.audit.record(AuditEntry::at(now, message));
        self
    }

    /// Always records an audit entry, even for an empty batch.
    fn submit_batch_at(mut self, now: DateTime<Utc>) -> Self {
        let flagged: Vec<Entity> = self.flagged.drain(..).collect();
        let priority: Vec<Entity> = self.priority.drain(..).collect();
        let deleted: Vec<Entity> = if self.archive_deleted {
            self.deleted.drain(..).collect()
        } else {
            Vec::new()
        };

        let mut message = format!(
            "Submitted batch: {} flagged, {} priority",
            flagged.len(),
            priority.len()
        );
        if self.archive_deleted {
            message.push_str(&format!(", {} deleted", deleted.len()));
        }
        info!(
            flagged = flagged.len(),
            priority = priority.len(),
            deleted = deleted.len(),
            "batch submitted"
        );

        // [flagged..., priority..., deleted..., previous archive...]
        let mut archive: VecDeque<Entity> = flagged
            .into_iter()
            .chain(priority)
            .chain(deleted)
            .collect();
        archive.extend(self.submitted.drain(..));
        self.submitted = archive;

        self.audit.record(AuditEntry::at(now, message));
        self
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn collection(&self, collection: Collection) -> &VecDeque<Entity> {
        match collection {
            Collection::Unreviewed => &self.unreviewed,
            Collection::Flagged => &self.flagged,
            Collection::Priority => &self.priority,
            Collection::Deleted => &self.deleted,
            Collection::Submitted => &self.submitted,
        }
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut VecDeque<Entity> {
        match collection {
            Collection::Unreviewed => &mut self.unreviewed,
            Collection::Flagged => &mut self.flagged,
            Collection::Priority => &mut self.priority,
            Collection::Deleted => &mut self.deleted,
            Collection::Submitted => &mut self.submitted,
        }
    }

    /// Which collection currently holds `id`
    pub fn locate(&self, id: &str) -> Option<Collection> {
        Collection::ALL
            .into_iter()
            .find(|&c| self.collection(c).iter().any(|e| e.id == id))
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        Collection::ALL
            .iter()
            .find_map(|&c| self.collection(c).iter().find(|e| e.id == id))
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Entities not yet submitted
    pub fn working_set(&self) -> impl Iterator<Item = &Entity> {
        Collection::WORKING_SET
            .into_iter()
            .flat_map(move |c| self.collection(c).iter())
    }

    /// Total entities across every collection, archive included
    pub fn len(&self) -> usize {
        Collection::ALL
            .iter()
            .map(|&c| self.collection(c).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verify no id is held by more than one collection
    pub fn check_partition(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for collection in Collection::ALL {
            for entity in self.collection(collection) {
                if !seen.insert(entity.id.as_str()) {
                    return Err(TriageError::DuplicateEntity(entity.id.clone()));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntitySource, EntityType};

    fn entity(id: &str, score: u8) -> Entity {
        Entity::new(
            id.to_string(),
            format!("Entity {}", id),
            EntityType::Person,
            score,
            EntitySource::Watchlist,
        )
    }

    fn ids(store: &TriageStore, collection: Collection) -> Vec<String> {
        store
            .collection(collection)
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }

    fn seeded(ids: &[&str]) -> TriageStore {
        TriageStore::seeded(ids.iter().map(|id| entity(id, 50)))
    }

    #[test]
    fn test_seeded_store_has_no_audit() {
        let store = seeded(&["A", "B", "C"]);

        assert_eq!(ids(&store, Collection::Unreviewed), vec!["A", "B", "C"]);
        assert!(store.audit().is_empty());
    }

    #[test]
    fn test_seeded_skips_duplicates() {
        let store = TriageStore::seeded(vec![entity("A", 1), entity("A", 2), entity("B", 3)]);

        assert_eq!(ids(&store, Collection::Unreviewed), vec!["A", "B"]);
        assert!(store.check_partition().is_ok());
    }

    #[test]
    fn test_transition_to_priority() {
        let store = seeded(&["A", "X", "B"]).transition("X", TriageStatus::Priority);

        assert_eq!(ids(&store, Collection::Unreviewed), vec!["A", "B"]);
        assert_eq!(ids(&store, Collection::Priority), vec!["X"]);
        assert_eq!(store.get("X").unwrap().status, TriageStatus::Priority);
        assert_eq!(store.audit().len(), 1);
        assert_eq!(store.audit().latest().unwrap().message, "Entity X moved to Priority");
    }

    #[test]
    fn test_transition_prepends_to_destination() {
        let store = seeded(&["A", "B"])
            .transition("A", TriageStatus::Flagged)
            .transition("B", TriageStatus::Flagged);

        assert_eq!(ids(&store, Collection::Flagged), vec!["B", "A"]);
    }

    #[test]
    fn test_transition_miss_is_silent_noop() {
        let before = seeded(&["A", "B"]).transition("A", TriageStatus::Flagged);
        let after = before.clone().transition("nonexistent-id", TriageStatus::Flagged);

        assert_eq!(before, after);
    }

    #[test]
    fn test_deleted_is_terminal() {
        let store = seeded(&["A"]).transition("A", TriageStatus::Deleted);
        let audit_len = store.audit().len();

        let store = store
            .transition("A", TriageStatus::Flagged)
            .transition("A", TriageStatus::Priority);

        assert_eq!(store.locate("A"), Some(Collection::Deleted));
        assert_eq!(store.audit().len(), audit_len);
    }

    #[test]
    fn test_flagged_and_priority_swap() {
        let store = seeded(&["A"])
            .transition("A", TriageStatus::Flagged)
            .transition("A", TriageStatus::Priority);
        assert_eq!(store.locate("A"), Some(Collection::Priority));

        let store = store.transition("A", TriageStatus::Flagged);
        assert_eq!(store.locate("A"), Some(Collection::Flagged));
        assert_eq!(store.audit().len(), 3);
    }

    #[test]
    fn test_same_collection_target_is_noop() {
        let store = seeded(&["A"]).transition("A", TriageStatus::Flagged);
        let again = store.clone().transition("A", TriageStatus::Flagged);

        assert_eq!(store, again);
    }

    #[test]
    fn test_non_target_statuses_are_noops() {
        let store = seeded(&["A"]);

        for target in [
            TriageStatus::Unreviewed,
            TriageStatus::Approved,
            TriageStatus::Escalated,
        ] {
            let after = store.clone().transition("A", target);
            assert_eq!(store, after);
        }
    }

    #[test]
    fn test_transition_table() {
        use Collection as C;
        use TriageStatus as S;

        assert!(is_allowed(C::Unreviewed, S::Flagged));
        assert!(is_allowed(C::Unreviewed, S::Priority));
        assert!(is_allowed(C::Unreviewed, S::Deleted));
        assert!(is_allowed(C::Flagged, S::Priority));
        assert!(is_allowed(C::Flagged, S::Deleted));
        assert!(is_allowed(C::Priority, S::Flagged));
        assert!(is_allowed(C::Priority, S::Deleted));

        assert!(!is_allowed(C::Flagged, S::Flagged));
        assert!(!is_allowed(C::Priority, S::Priority));
        assert!(!is_allowed(C::Deleted, S::Flagged));
        assert!(!is_allowed(C::Deleted, S::Priority));
        assert!(!is_allowed(C::Submitted, S::Deleted));
    }

    #[test]
    fn test_submitted_entities_cannot_move() {
        let store = seeded(&["A"])
            .transition("A", TriageStatus::Flagged)
            .submit_batch()
            .transition("A", TriageStatus::Deleted);

        assert_eq!(store.locate("A"), Some(Collection::Submitted));
    }

    #[test]
    fn test_submit_batch_order() {
        let store = seeded(&["P0", "A", "B", "C", "D"])
            .transition("P0", TriageStatus::Flagged)
            .submit_batch();
        assert_eq!(ids(&store, Collection::Submitted), vec!["P0"]);

        // Flagged = [A, B], Priority = [C]
        let store = store
            .transition("B", TriageStatus::Flagged)
            .transition("A", TriageStatus::Flagged)
            .transition("C", TriageStatus::Priority)
            .submit_batch();

        assert_eq!(ids(&store, Collection::Submitted), vec!["A", "B", "C", "P0"]);
        assert!(store.collection(Collection::Flagged).is_empty());
        assert!(store.collection(Collection::Priority).is_empty());
        assert_eq!(ids(&store, Collection::Unreviewed), vec!["D"]);
        assert_eq!(
            store.audit().latest().unwrap().message,
            "Submitted batch: 2 flagged, 1 priority"
        );
    }

    #[test]
    fn test_submit_batch_leaves_deleted_by_default() {
        let store = seeded(&["A", "B"])
            .transition("A", TriageStatus::Deleted)
            .transition("B", TriageStatus::Priority)
            .submit_batch();

        assert_eq!(ids(&store, Collection::Deleted), vec!["A"]);
        assert_eq!(ids(&store, Collection::Submitted), vec!["B"]);
    }

    #[test]
    fn test_submit_batch_archiving_deleted() {
        let store = seeded(&["A", "B", "C"])
            .archiving_deleted(true)
            .transition("A", TriageStatus::Deleted)
            .transition("B", TriageStatus::Priority)
            .transition("C", TriageStatus::Flagged)
            .submit_batch();

        assert_eq!(ids(&store, Collection::Submitted), vec!["C", "B", "A"]);
        assert!(store.collection(Collection::Deleted).is_empty());
        assert_eq!(
            store.audit().latest().unwrap().message,
            "Submitted batch: 1 flagged, 1 priority, 1 deleted"
        );
    }

    #[test]
    fn test_empty_submit_still_audited() {
        let store = seeded(&["A"]).submit_batch().submit_batch();

        assert!(store.collection(Collection::Submitted).is_empty());
        assert_eq!(store.audit().len(), 2);
        assert_eq!(
            store.audit().latest().unwrap().message,
            "Submitted batch: 0 flagged, 0 priority"
        );
    }

    #[test]
    fn test_ingest_prepends_and_audits() {
        let mut incoming = entity("N", 91);
        incoming.status = TriageStatus::Priority;

        let store = seeded(&["A"]).ingest(incoming);

        assert_eq!(ids(&store, Collection::Unreviewed), vec!["N", "A"]);
        assert_eq!(store.get("N").unwrap().status, TriageStatus::Unreviewed);
        assert_eq!(store.audit().latest().unwrap().message, "Ingested Entity N (risk 91)");
    }

    #[test]
    fn test_ingest_duplicate_id_ignored() {
        let store = seeded(&["A"]).transition("A", TriageStatus::Flagged);
        let after = store.clone().ingest(entity("A", 10));

        assert_eq!(store, after);
    }

    #[test]
    fn test_apply_at_uses_given_timestamp() {
        let at = DateTime::parse_from_rfc3339("2025-07-15T14:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let store = seeded(&["A"]).apply_at(
            Action::Transition {
                id: "A".to_string(),
                target: TriageStatus::Deleted,
            },
            at,
        );

        assert_eq!(store.audit().latest().unwrap().timestamp, at);
    }

    #[test]
    fn test_working_set_excludes_archive() {
        let store = seeded(&["A", "B", "C"])
            .transition("A", TriageStatus::Flagged)
            .transition("B", TriageStatus::Deleted)
            .submit_batch();

        let working: Vec<&str> = store.working_set().map(|e| e.id.as_str()).collect();
        assert_eq!(working, vec!["C", "B"]);
        assert_eq!(store.len(), 3);
    }
}
