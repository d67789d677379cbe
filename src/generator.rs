// 🎲 Entity Generator - synthetic mock data
//
// Feeds both the startup seed batch and the ingest ticks. Everything random
// (ids included) is drawn from one StdRng so a fixed seed reproduces a run.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::entities::{Entity, EntitySource, EntityType};
use crate::severity;

/// Seed entities are back-dated up to this far (~27.7 hours)
pub const MAX_SEED_AGE_MS: i64 = 100_000_000;

pub struct EntityGenerator {
    rng: StdRng,
}

impl EntityGenerator {
    pub fn new() -> Self {
        EntityGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        EntityGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        }
    }

    /// Generate one Unreviewed entity stamped "now"
    pub fn next_entity(&mut self) -> Entity {
        self.next_entity_at(Utc::now())
    }

    pub fn next_entity_at(&mut self, timestamp: DateTime<Utc>) -> Entity {
        let id = uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid();
        let code: String = id.simple().to_string()[..5].to_uppercase();

        let entity_type = *EntityType::ALL
            .choose(&mut self.rng)
            .unwrap_or(&EntityType::Person);
        let source = *EntitySource::ALL
            .choose(&mut self.rng)
            .unwrap_or(&EntitySource::Watchlist);
        let risk_score: u8 = self.rng.gen_range(0..=100);
        let summary = severity::summary(risk_score, &mut self.rng);

        Entity::new(
            id.to_string(),
            format!("Entity {}", code),
            entity_type,
            risk_score,
            source,
        )
        .with_timestamp(timestamp)
        .with_summary(summary)
    }

    /// Startup batch with creation times scattered over the past
    /// `MAX_SEED_AGE_MS` relative to `now`.
    pub fn seed_batch(&mut self, count: usize, now: DateTime<Utc>) -> Vec<Entity> {
        (0..count)
            .map(|_| {
                let age = self.rng.gen_range(0..MAX_SEED_AGE_MS);
                self.next_entity_at(now - Duration::milliseconds(age))
            })
            .collect()
    }
}

impl Default for EntityGenerator {
    fn default() -> Self {
        Self::new()
    }
}
