//! Slow backfill of person details. Purely additive; relationships are
//! never touched here.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};

use rootline_common::{Config, EnrichmentUpdate, Era, Person, PersonKind};
use rootline_store::Store;

use crate::adapters::{self, WikidataAdapter};

pub struct EnrichmentScheduler {
    store: Arc<dyn Store>,
    wikidata: WikidataAdapter,
    config: Config,
}

impl EnrichmentScheduler {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Result<Self> {
        let client = adapters::build_client(&config)?;
        Ok(Self {
            wikidata: WikidataAdapter::new(client, &config),
            store,
            config,
        })
    }

    pub async fn run(self) {
        info!("Enrichment scheduler started");
        loop {
            if let Err(e) = self.tick().await {
                error!(error = %e, "Unhandled enrichment error");
                tokio::time::sleep(Duration::from_secs(20)).await;
            }
        }
    }

    /// Pick one person with a missing detail field and fill in whatever
    /// Wikidata knows.
    pub async fn tick(&self) -> Result<()> {
        let Some(person) = self.store.next_person_missing_details().await? else {
            tokio::time::sleep(Duration::from_secs(60)).await;
            return Ok(());
        };
        self.enrich(&person).await?;
        tokio::time::sleep(Duration::from_secs(self.config.enrichment_delay_secs)).await;
        Ok(())
    }

    async fn enrich(&self, person: &Person) -> Result<()> {
        let mut update = EnrichmentUpdate::default();

        let qid = match &person.external_id {
            Some(qid) => Some(qid.clone()),
            None => {
                let resolved = self.wikidata.resolve_qid(&person.name).await?;
                update.external_id = resolved.clone();
                resolved
            }
        };

        if let Some(qid) = qid {
            if let Some(details) = self.wikidata.fetch_details(&qid).await? {
                if person.approx_birth_year.is_none() {
                    update.birth_year = details.birth_year;
                }
                if person.approx_death_year.is_none() {
                    update.death_year = details.death_year;
                }
                if person.gender.is_none() {
                    update.gender = details.gender;
                }
                if person.wiki_slug.is_none() {
                    update.wiki_slug = details.wiki_slug;
                }
            }
        }

        if person.era.is_none() {
            let year = update.birth_year.or(person.approx_birth_year);
            update.era = classify_era(year, person.kind);
        }

        if update.is_empty() {
            return Ok(());
        }
        let fields = describe(&update);
        self.store.apply_enrichment(person.id, update).await?;
        self.store
            .log_activity(Some(person.id), &person.name, "enriched", &fields)
            .await?;
        info!(name = %person.name, fields, "Enriched");
        Ok(())
    }
}

/// Era buckets by birth year. Mythological figures sit outside the
/// timeline entirely.
pub fn classify_era(birth_year: Option<i32>, kind: PersonKind) -> Option<Era> {
    if kind == PersonKind::Mythological {
        return Some(Era::Mythological);
    }
    let year = birth_year?;
    Some(match year {
        y if y < -3000 => Era::Prehistoric,
        y if y < -500 => Era::Ancient,
        y if y < 500 => Era::Classical,
        y if y < 1400 => Era::Medieval,
        y if y < 1800 => Era::EarlyModern,
        _ => Era::Modern,
    })
}

fn describe(update: &EnrichmentUpdate) -> String {
    let mut fields = Vec::new();
    if update.external_id.is_some() {
        fields.push("external_id");
    }
    if update.birth_year.is_some() {
        fields.push("birth_year");
    }
    if update.death_year.is_some() {
        fields.push("death_year");
    }
    if update.gender.is_some() {
        fields.push("gender");
    }
    if update.era.is_some() {
        fields.push("era");
    }
    if update.wiki_slug.is_some() {
        fields.push("wiki_slug");
    }
    fields.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_thresholds() {
        let human = PersonKind::Human;
        assert_eq!(classify_era(Some(-3500), human), Some(Era::Prehistoric));
        assert_eq!(classify_era(Some(-600), human), Some(Era::Ancient));
        assert_eq!(classify_era(Some(-500), human), Some(Era::Classical));
        assert_eq!(classify_era(Some(100), human), Some(Era::Classical));
        assert_eq!(classify_era(Some(500), human), Some(Era::Medieval));
        assert_eq!(classify_era(Some(1399), human), Some(Era::Medieval));
        assert_eq!(classify_era(Some(1650), human), Some(Era::EarlyModern));
        assert_eq!(classify_era(Some(1900), human), Some(Era::Modern));
    }

    #[test]
    fn mythological_kind_overrides_year() {
        assert_eq!(
            classify_era(Some(1900), PersonKind::Mythological),
            Some(Era::Mythological)
        );
        assert_eq!(
            classify_era(None, PersonKind::Mythological),
            Some(Era::Mythological)
        );
    }

    #[test]
    fn unknown_year_has_no_era() {
        assert_eq!(classify_era(None, PersonKind::Human), None);
    }
}
