//! The research loop: claim a job, interrogate the sources, write the
//! merged result, and keep the queue topped up.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tracing::{error, info, warn};

use rootline_common::{Config, Direction, Discovery, NewPerson, Person};
use rootline_store::Store;

use crate::adapters::{self, DbpediaAdapter, SourceAdapter, WikidataAdapter, WikipediaAdapter};
use crate::merge::merge;
use crate::seeds::EXPANSION_SEEDS;
use crate::writer::GraphWriter;

pub const SEED_PRIORITY: i32 = 85;
pub const UNRESEARCHED_PRIORITY: i32 = 30;

/// One source in the research pipeline. `fallback_only` sources are
/// skipped once any relationship evidence has been accumulated.
pub struct SourceSlot {
    pub adapter: Box<dyn SourceAdapter>,
    pub offset: f32,
    pub fallback_only: bool,
}

pub struct ResearchScheduler {
    store: Arc<dyn Store>,
    writer: GraphWriter,
    sources: Vec<SourceSlot>,
    config: Config,
    expansion_index: usize,
    consecutive_failures: u32,
}

impl ResearchScheduler {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Result<Self> {
        let client = adapters::build_client(&config)?;
        let sources = vec![
            SourceSlot {
                adapter: Box::new(WikidataAdapter::new(client.clone(), &config)),
                offset: 0.0,
                fallback_only: false,
            },
            SourceSlot {
                adapter: Box::new(DbpediaAdapter::new(client.clone(), &config)),
                offset: config.dbpedia_offset,
                fallback_only: false,
            },
            SourceSlot {
                adapter: Box::new(WikipediaAdapter::new(client, &config)),
                offset: config.wikipedia_offset,
                fallback_only: true,
            },
        ];
        Ok(Self::with_sources(store, config, sources))
    }

    /// Build a scheduler with explicit sources. Tests inject fakes here.
    pub fn with_sources(store: Arc<dyn Store>, config: Config, sources: Vec<SourceSlot>) -> Self {
        Self {
            writer: GraphWriter::new(store.clone(), &config),
            store,
            sources,
            config,
            expansion_index: 0,
            consecutive_failures: 0,
        }
    }

    /// Run forever. A tick that errors out is logged and counted; the loop
    /// itself never exits.
    pub async fn run(mut self) {
        info!("Research scheduler started");
        loop {
            if let Err(e) = self.tick().await {
                error!(error = %e, "Unhandled research error");
                self.consecutive_failures += 1;
                tokio::time::sleep(Duration::from_secs(20)).await;
            }
        }
    }

    /// One scheduling step: at most one person researched.
    pub async fn tick(&mut self) -> Result<()> {
        if self.consecutive_failures >= self.config.max_consecutive_failures {
            warn!(
                failures = self.consecutive_failures,
                "Too many consecutive failures, backing off"
            );
            tokio::time::sleep(Duration::from_secs(self.config.failure_cooldown_secs)).await;
            self.consecutive_failures = 0;
        }

        let Some(job) = self.store.claim_next().await? else {
            self.refill().await?;
            tokio::time::sleep(Duration::from_secs(self.config.idle_delay_secs)).await;
            return Ok(());
        };

        let Some(person) = self.store.person(job.person_id).await? else {
            // Subject vanished; nothing to research.
            self.store.complete_job(job.id).await?;
            return Ok(());
        };

        info!(kind = %person.kind, name = %person.name, "Researching");
        let discovery = self.research(&person).await;

        if discovery.has_relationships() {
            self.writer.save(&person, &discovery).await?;
            self.store.mark_researched(person.id).await?;
            self.store.complete_job(job.id).await?;
            self.consecutive_failures = 0;
            info!(name = %person.name, "Research complete");
        } else {
            let attempts = job.attempts + 1;
            if attempts >= self.config.max_attempts {
                self.store.fail_job(job.id, attempts).await?;
                self.mark_genesis_if_rootless(&person, attempts).await?;
                self.consecutive_failures += 1;
            } else {
                self.store.release_job(job.id, attempts).await?;
                let backoff = Duration::from_secs((attempts as u64 * 8).min(60));
                let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
                tokio::time::sleep(backoff + jitter).await;
            }
        }

        tokio::time::sleep(Duration::from_secs(self.config.tick_delay_secs)).await;
        Ok(())
    }

    /// Interrogate each source in trust order, folding results into one
    /// accumulator. Source errors degrade to "nothing found".
    async fn research(&self, person: &Person) -> Discovery {
        let mut merged = Discovery {
            external_id: person.external_id.clone(),
            ..Discovery::default()
        };
        for slot in &self.sources {
            if slot.fallback_only && merged.has_relationships() {
                continue;
            }
            match slot
                .adapter
                .fetch(&person.name, merged.external_id.as_deref())
                .await
            {
                Ok(Some(found)) => merge(&mut merged, found, slot.offset),
                Ok(None) => {}
                Err(e) => {
                    warn!(source = slot.adapter.name(), name = %person.name, error = %e, "Source fetch failed");
                }
            }
        }
        merged
    }

    /// Research exhausted with no father edge: the person becomes a
    /// provisional genesis root with the next sequential code.
    async fn mark_genesis_if_rootless(&self, person: &Person, attempts: i32) -> Result<()> {
        if self.store.has_father_edge(person.id).await? {
            return Ok(());
        }
        let Some(current) = self.store.person(person.id).await? else {
            return Ok(());
        };
        if current.is_genesis {
            return Ok(());
        }
        let code = format!("G{}", self.store.genesis_count().await? + 1);
        self.store.assign_genesis(person.id, &code).await?;
        self.store
            .log_activity(
                Some(person.id),
                &person.name,
                "genesis",
                &format!("No father found after {attempts} attempts, assigned {code}"),
            )
            .await?;
        info!(name = %person.name, code, "Marked as genesis root");
        Ok(())
    }

    /// The queue ran dry. Revive failed jobs first; otherwise plant the
    /// next expansion seed; otherwise sweep unresearched persons back in;
    /// and when even that is exhausted, restart the expansion cycle.
    async fn refill(&mut self) -> Result<()> {
        let failed = self.store.failed_count().await?;
        if failed > 0 {
            let reset = self.store.reset_failed().await?;
            info!(reset, "Reset failed jobs");
            return Ok(());
        }

        if self.expansion_index < EXPANSION_SEEDS.len() {
            let (name, kind) = EXPANSION_SEEDS[self.expansion_index];
            self.expansion_index += 1;
            let person = match self.store.person_by_name(name).await? {
                Some(p) => p,
                None => {
                    let p = self
                        .store
                        .create_person(NewPerson {
                            name: name.to_string(),
                            kind,
                            external_id: None,
                        })
                        .await?;
                    info!(name, "Expansion seed planted");
                    p
                }
            };
            self.store
                .enqueue(person.id, Direction::Both, SEED_PRIORITY)
                .await?;
            return Ok(());
        }

        let unresearched = self
            .store
            .unresearched(self.config.unresearched_batch)
            .await?;
        if unresearched.is_empty() {
            self.expansion_index = 0;
            info!("Full cycle complete, restarting expansion list");
        } else {
            for p in unresearched {
                self.store
                    .enqueue(p.id, Direction::Both, UNRESEARCHED_PRIORITY)
                    .await?;
            }
        }
        Ok(())
    }
}
