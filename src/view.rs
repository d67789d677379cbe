// 🔎 Derived View - filter + sort projection of one collection
//
// Pure: reads the store, never mutates it. The UI re-derives the view on
// every frame.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use crate::entities::Entity;
use crate::store::{Collection, TriageStore};

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    Type,
    RiskScore,
    Source,
    Status,
    Timestamp,
}

impl SortKey {
    /// Column order in the dashboard table
    pub const ALL: [SortKey; 6] = [
        SortKey::Name,
        SortKey::Type,
        SortKey::RiskScore,
        SortKey::Source,
        SortKey::Status,
        SortKey::Timestamp,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::Type => "Type",
            SortKey::RiskScore => "Risk",
            SortKey::Source => "Source",
            SortKey::Status => "Status",
            SortKey::Timestamp => "Timestamp",
        }
    }

    /// Ascending comparison; text fields ignore case
    fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        match self {
            SortKey::Name => cmp_ignore_case(&a.name, &b.name),
            SortKey::Type => cmp_ignore_case(a.entity_type.as_str(), b.entity_type.as_str()),
            SortKey::RiskScore => a.risk_score.cmp(&b.risk_score),
            SortKey::Source => cmp_ignore_case(a.source.as_str(), b.source.as_str()),
            SortKey::Status => cmp_ignore_case(a.status.as_str(), b.status.as_str()),
            SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
        }
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Stable sort. Descending is the exact reverse of ascending, ties
/// included.
pub fn sort_entities(rows: &mut [&Entity], spec: SortSpec) {
    rows.sort_by(|a, b| spec.key.compare(a, b));
    if spec.direction == SortDirection::Descending {
        rows.reverse();
    }
}

// ============================================================================
// QUERY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery {
    /// Active tab
    pub tab: Collection,
    pub search: String,
    pub sort: Option<SortSpec>,
}

impl Default for ViewQuery {
    fn default() -> Self {
        ViewQuery::new(Collection::Unreviewed)
    }
}

impl ViewQuery {
    pub fn new(tab: Collection) -> Self {
        ViewQuery {
            tab,
            search: String::new(),
            sort: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Column-header click: same key flips direction, a new key starts
    /// ascending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = Some(match self.sort {
            Some(spec) if spec.key == key => SortSpec {
                key,
                direction: spec.direction.toggled(),
            },
            _ => SortSpec {
                key,
                direction: SortDirection::Ascending,
            },
        });
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }
}

// ============================================================================
// VIEW
// ============================================================================

#[derive(Debug, Clone)]
pub struct View<'a> {
    pub rows: Vec<&'a Entity>,

    /// Critical entities among the filtered rows (banner count)
    pub critical_count: usize,
}

impl<'a> View<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Entity> {
        self.rows.get(index).copied()
    }
}

/// Entities whose name contains `search`, case-insensitive, in original
/// order.
pub fn filter_by_name<'a, I>(entities: I, search: &str) -> Vec<&'a Entity>
where
    I: IntoIterator<Item = &'a Entity>,
{
    entities
        .into_iter()
        .filter(|e| e.matches_name(search))
        .collect()
}

pub fn derive_view<'a>(store: &'a TriageStore, query: &ViewQuery) -> View<'a> {
    let mut rows = filter_by_name(store.collection(query.tab), &query.search);
    let critical_count = rows.iter().filter(|e| e.is_critical()).count();

    if let Some(spec) = query.sort {
        sort_entities(&mut rows, spec);
    }

    View {
        rows,
        critical_count,
    }
}

// ============================================================================
// DASHBOARD STATS
// ============================================================================

/// Summary bar figures over the working set (archive excluded from
/// total/average, counted separately).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub unreviewed: usize,
    pub flagged: usize,
    pub priority: usize,
    pub deleted: usize,
    pub submitted: usize,
    pub average_risk: u8,
    pub last_ingest: Option<DateTime<Utc>>,
}

impl DashboardStats {
    pub fn from_store(store: &TriageStore) -> Self {
        let count = |c: Collection| store.collection(c).len();

        let mut total = 0usize;
        let mut risk_sum = 0u64;
        let mut last_ingest: Option<DateTime<Utc>> = None;

        for entity in store.working_set() {
            total += 1;
            risk_sum += entity.risk_score as u64;
            last_ingest = Some(match last_ingest {
                Some(latest) if latest >= entity.timestamp => latest,
                _ => entity.timestamp,
            });
        }

        let average_risk = if total > 0 {
            (risk_sum as f64 / total as f64).round() as u8
        } else {
            0
        };

        DashboardStats {
            total,
            unreviewed: count(Collection::Unreviewed),
            flagged: count(Collection::Flagged),
            priority: count(Collection::Priority),
            deleted: count(Collection::Deleted),
            submitted: count(Collection::Submitted),
            average_risk,
            last_ingest,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntitySource, EntityType, TriageStatus};
    use chrono::Duration;

    fn entity(id: &str, name: &str, score: u8) -> Entity {
        Entity::new(
            id.to_string(),
            name.to_string(),
            EntityType::Email,
            score,
            EntitySource::ManualFlag,
        )
    }

    fn names(view: &View) -> Vec<String> {
        view.rows.iter().map(|e| e.name.clone()).collect()
    }

    fn sample_store() -> TriageStore {
        TriageStore::seeded(vec![
            entity("1", "Entity bravo", 50),
            entity("2", "Entity Alpha", 90),
            entity("3", "Entity charlie", 50),
            entity("4", "Other delta", 85),
            entity("5", "Entity echo", 10),
        ])
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let store = sample_store();
        let query = ViewQuery::default().with_search("ENTITY");

        let view = derive_view(&store, &query);
        assert_eq!(
            names(&view),
            vec!["Entity bravo", "Entity Alpha", "Entity charlie", "Entity echo"]
        );
    }

    #[test]
    fn test_view_selects_tab() {
        let store = sample_store().transition("4", TriageStatus::Priority);

        let view = derive_view(&store, &ViewQuery::new(Collection::Priority));
        assert_eq!(names(&view), vec!["Other delta"]);

        let view = derive_view(&store, &ViewQuery::new(Collection::Flagged));
        assert!(view.is_empty());
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let store = sample_store();
        let mut query = ViewQuery::default().with_search("entity");
        query.toggle_sort(SortKey::Name);

        let view = derive_view(&store, &query);
        assert_eq!(
            names(&view),
            vec!["Entity Alpha", "Entity bravo", "Entity charlie", "Entity echo"]
        );
    }

    #[test]
    fn test_sort_toggle_is_exact_reverse() {
        let store = sample_store();
        let mut query = ViewQuery::default();

        query.toggle_sort(SortKey::RiskScore);
        let ascending = names(&derive_view(&store, &query));
        assert_eq!(
            ascending,
            vec!["Entity echo", "Entity bravo", "Entity charlie", "Other delta", "Entity Alpha"]
        );

        query.toggle_sort(SortKey::RiskScore);
        assert_eq!(query.sort.unwrap().direction, SortDirection::Descending);

        let mut descending = names(&derive_view(&store, &query));
        descending.reverse();
        assert_eq!(descending, ascending);
    }

    #[test]
    fn test_new_sort_key_resets_to_ascending() {
        let mut query = ViewQuery::default();
        query.toggle_sort(SortKey::RiskScore);
        query.toggle_sort(SortKey::RiskScore);
        query.toggle_sort(SortKey::Timestamp);

        assert_eq!(
            query.sort,
            Some(SortSpec {
                key: SortKey::Timestamp,
                direction: SortDirection::Ascending,
            })
        );
    }

    #[test]
    fn test_sort_by_timestamp() {
        let now = Utc::now();
        let store = TriageStore::seeded(vec![
            entity("1", "new", 1).with_timestamp(now),
            entity("2", "old", 1).with_timestamp(now - Duration::hours(2)),
            entity("3", "mid", 1).with_timestamp(now - Duration::hours(1)),
        ]);
        let mut query = ViewQuery::default();
        query.toggle_sort(SortKey::Timestamp);

        assert_eq!(names(&derive_view(&store, &query)), vec!["old", "mid", "new"]);
    }

    #[test]
    fn test_critical_count_uses_filtered_rows() {
        let store = sample_store();

        let all = derive_view(&store, &ViewQuery::default());
        assert_eq!(all.critical_count, 2);

        let filtered = derive_view(&store, &ViewQuery::default().with_search("entity"));
        assert_eq!(filtered.critical_count, 1);
    }

    #[test]
    fn test_view_does_not_mutate_store() {
        let store = sample_store();
        let before = store.clone();
        let mut query = ViewQuery::default().with_search("a");
        query.toggle_sort(SortKey::Name);

        let _ = derive_view(&store, &query);
        assert_eq!(store, before);
    }

    #[test]
    fn test_dashboard_stats() {
        let now = Utc::now();
        let store = TriageStore::seeded(vec![
            entity("1", "a", 10).with_timestamp(now - Duration::minutes(5)),
            entity("2", "b", 21).with_timestamp(now),
            entity("3", "c", 90).with_timestamp(now - Duration::minutes(1)),
        ])
        .transition("3", TriageStatus::Priority)
        .transition("1", TriageStatus::Flagged);

        let stats = DashboardStats::from_store(&store);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.unreviewed, 1);
        assert_eq!(stats.flagged, 1);
        assert_eq!(stats.priority, 1);
        assert_eq!(stats.average_risk, 40);
        assert_eq!(stats.last_ingest, Some(now));

        let stats = DashboardStats::from_store(&store.submit_batch());
        assert_eq!(stats.total, 1);
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.average_risk, 21);
    }

    #[test]
    fn test_dashboard_stats_empty() {
        let stats = DashboardStats::from_store(&TriageStore::new());

        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_risk, 0);
        assert!(stats.last_ingest.is_none());
    }
}
