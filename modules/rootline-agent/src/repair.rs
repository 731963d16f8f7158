//! Housekeeping over already-written graph data: category assignment for
//! persons that have none, and clearing genesis flags that research has
//! since disproven.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};
use uuid::Uuid;

use rootline_common::{Config, Person, PersonKind};
use rootline_store::Store;

use crate::adapters::{self, WikipediaAdapter};
use crate::categories;

const CATEGORY_BATCH: i64 = 50;
const GENESIS_BATCH: i64 = 20;

pub struct RepairScheduler {
    store: Arc<dyn Store>,
    wikipedia: WikipediaAdapter,
    config: Config,
}

impl RepairScheduler {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Result<Self> {
        let client = adapters::build_client(&config)?;
        Ok(Self {
            wikipedia: WikipediaAdapter::new(client, &config),
            store,
            config,
        })
    }

    pub async fn run(self) {
        info!("Repair scheduler started");
        loop {
            if let Err(e) = self.tick().await {
                error!(error = %e, "Unhandled repair error");
                tokio::time::sleep(Duration::from_secs(20)).await;
            }
        }
    }

    pub async fn tick(&self) -> Result<()> {
        let fixed = self.fix_missing_categories().await? + self.fix_stale_genesis().await?;
        let delay = if fixed == 0 {
            // Nothing to repair right now; check back later.
            Duration::from_secs(60)
        } else {
            Duration::from_secs(self.config.repair_delay_secs)
        };
        tokio::time::sleep(delay).await;
        Ok(())
    }

    /// Assign categories to persons that have none yet. Returns the number
    /// of assignments made.
    pub async fn fix_missing_categories(&self) -> Result<usize> {
        let persons = self.store.persons_without_categories(CATEGORY_BATCH).await?;
        if persons.is_empty() {
            return Ok(0);
        }

        let mut assigned = 0;
        for person in &persons {
            for cat in self.determine_categories(person).await {
                if self.assign_category(person.id, &cat).await? {
                    assigned += 1;
                }
            }
        }
        if assigned > 0 {
            info!(persons = persons.len(), assigned, "Filled in missing categories");
        }
        Ok(assigned)
    }

    /// Curated figures first, then the person kind, then Wikipedia text
    /// and category titles.
    async fn determine_categories(&self, person: &Person) -> Vec<String> {
        if let Some(known) = categories::known_figure(&person.name) {
            return known;
        }

        let mut cats = Vec::new();
        if person.kind == PersonKind::Mythological {
            cats.push("Mythological".to_string());
        }

        match self.wikipedia.fetch_page(&person.name).await {
            Ok(Some(page)) => {
                let tagged = format!("{} {}", page.content, page.categories.join(" "));
                for cat in categories::detect(&tagged) {
                    if !cats.contains(&cat) {
                        cats.push(cat);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(name = %person.name, error = %e, "Wikipedia category fetch failed");
            }
        }
        cats
    }

    async fn assign_category(&self, person_id: Uuid, name: &str) -> Result<bool> {
        match self.store.category_by_name(name).await? {
            Some(category_id) => {
                self.store.assign_category(person_id, category_id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Genesis roots that have since gained a father edge were flagged in
    /// error. Clear them. Returns the number repaired.
    pub async fn fix_stale_genesis(&self) -> Result<usize> {
        let stale = self.store.genesis_with_father(GENESIS_BATCH).await?;
        for person in &stale {
            let code = person.genesis_code.clone().unwrap_or_default();
            self.store.dissolve_genesis(person.id).await?;
            self.store
                .log_activity(
                    Some(person.id),
                    &person.name,
                    "repaired",
                    &format!("Cleared stale genesis flag {code}"),
                )
                .await?;
            info!(name = %person.name, code, "Cleared stale genesis flag");
        }
        Ok(stale.len())
    }
}
