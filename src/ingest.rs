// 📡 Ingest - simulated live feed as a cancellable periodic task
//
// start() spawns at most one tokio task ticking every `period`; each tick
// generates one entity and sends it down a channel. The owner of the store
// calls drain() and applies what comes back, so the store itself never
// leaves the UI thread.
//
// Every tick carries the id of the run that produced it. After stop()
// returns, ticks from that run that were still in flight are discarded.
// Ticks already queued at the moment of stop() are kept.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::config::TriageConfig;
use crate::entities::Entity;
use crate::generator::EntityGenerator;

struct Tick {
    run: u64,
    entity: Entity,
}

/// Handle to one running ingest task
pub struct IngestHandle {
    run: u64,
    task: JoinHandle<()>,
}

impl IngestHandle {
    pub fn run_id(&self) -> u64 {
        self.run
    }

    fn cancel(self) {
        self.task.abort();
    }
}

pub struct Ingestor {
    period: Duration,
    seed: Option<u64>,
    next_run: u64,
    active: Option<IngestHandle>,
    tx: mpsc::UnboundedSender<Tick>,
    rx: mpsc::UnboundedReceiver<Tick>,
    /// Ticks collected by stop(), handed out on the next drain()
    pending: Vec<Entity>,
}

impl Ingestor {
    pub fn new(period: Duration, seed: Option<u64>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Ingestor {
            period,
            seed,
            next_run: 0,
            active: None,
            tx,
            rx,
            pending: Vec::new(),
        }
    }

    pub fn from_config(config: &TriageConfig) -> Self {
        // Offset so the feed does not replay the seed batch
        let seed = config.rng_seed.map(|s| s.wrapping_add(1));
        Self::new(config.ingest_interval(), seed)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_run(&self) -> Option<u64> {
        self.active.as_ref().map(IngestHandle::run_id)
    }

    /// Start ticking. Returns false (and spawns nothing) if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.active.is_some() {
            debug!("ingest already running");
            return false;
        }

        let run = self.next_run;
        self.next_run += 1;

        let period = self.period;
        let tx = self.tx.clone();
        let mut generator = EntityGenerator::from_seed(self.seed.map(|s| s.wrapping_add(run)));

        let task = tokio::spawn(async move {
            // First entity lands one full period after start
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let entity = generator.next_entity();
                trace!(run, id = %entity.id, "ingest tick");
                if tx.send(Tick { run, entity }).is_err() {
                    break;
                }
            }
        });

        info!(run, period_ms = period.as_millis() as u64, "ingest started");
        self.active = Some(IngestHandle { run, task });
        true
    }

    /// Stop ticking. Returns false if nothing was running.
    pub fn stop(&mut self) -> bool {
        let Some(handle) = self.active.take() else {
            return false;
        };
        let run = handle.run_id();
        handle.cancel();

        while let Ok(tick) = self.rx.try_recv() {
            if tick.run == run {
                self.pending.push(tick.entity);
            }
        }

        info!(run, "ingest stopped");
        true
    }

    /// Start if stopped, stop if started. Returns whether ingest is now
    /// active.
    pub fn toggle(&mut self) -> bool {
        if self.is_active() {
            self.stop();
        } else {
            self.start();
        }
        self.is_active()
    }

    /// Entities produced since the last drain, oldest first
    pub fn drain(&mut self) -> Vec<Entity> {
        let mut entities = std::mem::take(&mut self.pending);
        let live = self.active_run();

        while let Ok(tick) = self.rx.try_recv() {
            if Some(tick.run) == live {
                entities.push(tick.entity);
            } else {
                trace!(run = tick.run, "dropping tick from stopped run");
            }
        }

        entities
    }
}

impl Drop for Ingestor {
    fn drop(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }
}
