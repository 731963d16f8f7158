//! Writes merged discoveries into the graph.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use rootline_common::{
    Candidate, Config, Direction, Discovery, NewMergeLogEntry, NewPerson, NewRelationship,
    ParentType, Person, PersonKind, Relationship, SourceType,
};
use rootline_store::Store;

/// A parent discovered for someone already in the graph is likelier to
/// extend a long lineage than a child is, so parents jump the queue.
pub const PARENT_PRIORITY: i32 = 75;
pub const CHILD_PRIORITY: i32 = 55;

pub struct GraphWriter {
    store: Arc<dyn Store>,
    merge_threshold: f32,
}

impl GraphWriter {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            store,
            merge_threshold: config.merge_confidence_threshold,
        }
    }

    /// Persist one person's merged research result: identity fields first,
    /// then parent edges, child edges, categories, and an activity row.
    /// A failed link is logged and skipped; the rest of the save continues.
    pub async fn save(&self, person: &Person, d: &Discovery) -> Result<()> {
        if let Some(qid) = &d.external_id {
            if person.external_id.as_deref() != Some(qid) {
                self.store.set_external_id(person.id, qid).await?;
            }
        }
        if let Some(year) = d.birth_year {
            self.store.set_birth_year(person.id, year).await?;
        }

        if let Some(father) = &d.father {
            if let Err(e) = self
                .link_parent(person, father, ParentType::Father, d.source_url.as_deref())
                .await
            {
                warn!(person = %person.name, error = %e, "Father link failed");
            }
        }
        if let Some(mother) = &d.mother {
            if let Err(e) = self
                .link_parent(person, mother, ParentType::Mother, d.source_url.as_deref())
                .await
            {
                warn!(person = %person.name, error = %e, "Mother link failed");
            }
        }
        for child in &d.children {
            if let Err(e) = self.link_child(person, child, d.source_url.as_deref()).await {
                warn!(person = %person.name, child = %child.name, error = %e, "Child link failed");
            }
        }

        for cat in &d.categories {
            self.assign_category(person.id, cat).await?;
        }

        let detail = format!(
            "f={} m={} c={}",
            d.father.as_ref().map(|c| c.name.as_str()).unwrap_or("-"),
            d.mother.as_ref().map(|c| c.name.as_str()).unwrap_or("-"),
            d.children.len(),
        );
        self.store
            .log_activity(Some(person.id), &person.name, "researched", &detail)
            .await?;
        Ok(())
    }

    /// Link `child -> candidate` as a parent edge, then consider genesis
    /// dissolution and queue the parent for research.
    async fn link_parent(
        &self,
        child: &Person,
        candidate: &Candidate,
        parent_type: ParentType,
        source_url: Option<&str>,
    ) -> Result<()> {
        let parent = self
            .resolve_or_create(&candidate.name, candidate.external_id.as_deref())
            .await?;
        if parent.id == child.id {
            return Ok(());
        }

        let rel = self
            .upsert_edge(child.id, parent.id, parent_type, candidate.confidence, source_url)
            .await?;

        // A high-confidence parent claim dissolves the child's genesis
        // status; the root was provisional after all.
        if candidate.confidence >= self.merge_threshold {
            if let Some(subject) = self.store.person(child.id).await? {
                if subject.is_genesis {
                    let code = subject.genesis_code.clone().unwrap_or_default();
                    self.store.dissolve_genesis(child.id).await?;
                    self.store
                        .append_merge_log(NewMergeLogEntry {
                            genesis_person_id: child.id,
                            genesis_code: code.clone(),
                            merged_into_person_id: parent.id,
                            confidence_at_merge: rel.confidence,
                        })
                        .await?;
                    info!(person = %subject.name, code, parent = %parent.name, "Genesis root dissolved");
                }
            }
        }

        self.store
            .enqueue(parent.id, Direction::Both, PARENT_PRIORITY)
            .await?;
        Ok(())
    }

    /// Link `candidate -> person` as a father edge and queue the child.
    async fn link_child(
        &self,
        parent: &Person,
        candidate: &Candidate,
        source_url: Option<&str>,
    ) -> Result<()> {
        let child = self
            .resolve_or_create(&candidate.name, candidate.external_id.as_deref())
            .await?;
        if child.id == parent.id {
            return Ok(());
        }

        self.upsert_edge(
            child.id,
            parent.id,
            ParentType::Father,
            candidate.confidence,
            source_url,
        )
        .await?;

        self.store
            .enqueue(child.id, Direction::Both, CHILD_PRIORITY)
            .await?;
        Ok(())
    }

    /// Upsert one edge and keep the single-primary invariant: the first
    /// edge for a `(child, parent_type)` slot becomes primary, later ones
    /// arrive as branches, and a strictly higher-confidence claim demotes
    /// the incumbent and takes its place.
    async fn upsert_edge(
        &self,
        child_id: Uuid,
        parent_id: Uuid,
        parent_type: ParentType,
        confidence: f32,
        source_url: Option<&str>,
    ) -> Result<Relationship> {
        let incumbent = self.store.primary_relationship(child_id, parent_type).await?;
        let rel = self
            .store
            .insert_relationship(NewRelationship {
                child_id,
                parent_id,
                parent_type,
                confidence,
                is_primary: incumbent.is_none(),
                is_branch: incumbent.is_some(),
            })
            .await?;

        if let Some(primary) = incumbent {
            if primary.id != rel.id && confidence > primary.confidence {
                self.store.demote_to_branch(primary.id).await?;
                self.store.promote_to_primary(rel.id).await?;
                info!(
                    child = %child_id,
                    parent_type = %parent_type,
                    old = primary.confidence,
                    new = confidence,
                    "Primary edge replaced by higher-confidence claim"
                );
            }
        }

        if let Some(url) = source_url {
            self.store
                .add_relationship_source(rel.id, url, SourceType::from_url(url))
                .await?;
        }
        Ok(rel)
    }

    /// Resolve a candidate to an existing person by external id, then by
    /// case-insensitive name, else create a fresh non-root person.
    pub async fn resolve_or_create(
        &self,
        name: &str,
        external_id: Option<&str>,
    ) -> Result<Person> {
        if let Some(qid) = external_id {
            if let Some(p) = self.store.person_by_external_id(qid).await? {
                return Ok(p);
            }
        }
        if let Some(p) = self.store.person_by_name(name).await? {
            if let Some(qid) = external_id {
                if p.external_id.is_none() {
                    self.store.set_external_id(p.id, qid).await?;
                }
            }
            return Ok(p);
        }
        Ok(self
            .store
            .create_person(NewPerson {
                name: name.to_string(),
                kind: PersonKind::Human,
                external_id: external_id.map(str::to_string),
            })
            .await?)
    }

    async fn assign_category(&self, person_id: Uuid, name: &str) -> Result<()> {
        if let Some(category_id) = self.store.category_by_name(name).await? {
            self.store.assign_category(person_id, category_id).await?;
        }
        Ok(())
    }
}
