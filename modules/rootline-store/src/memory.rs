//! In-memory [`Store`] used by scenario tests. Shared behind an `Arc` so
//! tests can assert on its contents after driving the engine.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use rootline_common::{
    Direction, EnrichmentUpdate, JobStatus, NewMergeLogEntry, NewPerson, NewRelationship,
    ParentType, Person, QueueJob, Relationship, SourceType,
};

use crate::error::Result;
use crate::Store;

/// Category names seeded by the Postgres migration, mirrored here so
/// category assignment behaves the same in tests.
const SEED_CATEGORIES: &[&str] = &[
    "Greek Gods",
    "Norse Gods",
    "Hindu Deities",
    "Egyptian Gods",
    "Roman Gods",
    "Mesopotamian Gods",
    "Celtic Gods",
    "Aztec Gods",
    "Egyptian Pharaohs",
    "Roman Emperors",
    "Greek Kings",
    "Sumerian Kings",
    "Persian Kings",
    "Biblical Figures",
    "Quranic Figures",
    "Vedic Figures",
    "British Royals",
    "Mughal Dynasty",
    "Mongol Khans",
    "Ottoman Dynasty",
    "Americans",
    "South Asians",
    "Mythological",
    "Religion & Scripture",
    "Royalty & Dynasties",
    "Ancient",
    "Medieval",
    "Modern",
    "Europeans",
];

#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub relationship_id: Uuid,
    pub url: String,
    pub source_type: SourceType,
}

#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub person_id: Option<Uuid>,
    pub person_name: String,
    pub action: String,
    pub detail: String,
}

#[derive(Default)]
struct Inner {
    persons: Vec<Person>,
    relationships: Vec<Relationship>,
    sources: Vec<SourceRecord>,
    jobs: Vec<QueueJob>,
    merge_log: Vec<NewMergeLogEntry>,
    activity: Vec<ActivityRecord>,
    categories: Vec<(Uuid, String)>,
    person_categories: Vec<(Uuid, Uuid)>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let categories = SEED_CATEGORIES
            .iter()
            .map(|name| (Uuid::new_v4(), name.to_string()))
            .collect();
        Self {
            inner: Mutex::new(Inner {
                categories,
                ..Inner::default()
            }),
        }
    }

    // --- Inspection helpers for tests ---

    pub fn persons(&self) -> Vec<Person> {
        self.inner.lock().unwrap().persons.clone()
    }

    pub fn relationships(&self) -> Vec<Relationship> {
        self.inner.lock().unwrap().relationships.clone()
    }

    pub fn sources(&self) -> Vec<SourceRecord> {
        self.inner.lock().unwrap().sources.clone()
    }

    pub fn jobs(&self) -> Vec<QueueJob> {
        self.inner.lock().unwrap().jobs.clone()
    }

    pub fn merge_log(&self) -> Vec<NewMergeLogEntry> {
        self.inner.lock().unwrap().merge_log.clone()
    }

    pub fn activity(&self) -> Vec<ActivityRecord> {
        self.inner.lock().unwrap().activity.clone()
    }

    pub fn category_assignments(&self, person_id: Uuid) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .person_categories
            .iter()
            .filter(|(p, _)| *p == person_id)
            .filter_map(|(_, c)| {
                inner
                    .categories
                    .iter()
                    .find(|(id, _)| id == c)
                    .map(|(_, name)| name.clone())
            })
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn person(&self, id: Uuid) -> Result<Option<Person>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.persons.iter().find(|p| p.id == id).cloned())
    }

    async fn person_by_external_id(&self, external_id: &str) -> Result<Option<Person>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .persons
            .iter()
            .find(|p| p.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn person_by_name(&self, name: &str) -> Result<Option<Person>> {
        let inner = self.inner.lock().unwrap();
        let lowered = name.to_lowercase();
        Ok(inner
            .persons
            .iter()
            .find(|p| p.name.to_lowercase() == lowered)
            .cloned())
    }

    async fn create_person(&self, new: NewPerson) -> Result<Person> {
        let mut inner = self.inner.lock().unwrap();
        let person = Person {
            id: Uuid::new_v4(),
            name: new.name,
            kind: new.kind,
            external_id: new.external_id,
            approx_birth_year: None,
            approx_death_year: None,
            gender: None,
            era: None,
            wiki_slug: None,
            is_genesis: false,
            genesis_code: None,
            agent_researched: false,
            created_at: Utc::now(),
        };
        inner.persons.push(person.clone());
        Ok(person)
    }

    async fn set_external_id(&self, id: Uuid, external_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.persons.iter_mut().find(|p| p.id == id) {
            p.external_id = Some(external_id.to_string());
        }
        Ok(())
    }

    async fn set_birth_year(&self, id: Uuid, year: i32) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.persons.iter_mut().find(|p| p.id == id) {
            p.approx_birth_year = Some(year);
        }
        Ok(())
    }

    async fn mark_researched(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.persons.iter_mut().find(|p| p.id == id) {
            p.agent_researched = true;
        }
        Ok(())
    }

    async fn assign_genesis(&self, id: Uuid, code: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.persons.iter_mut().find(|p| p.id == id) {
            p.is_genesis = true;
            p.genesis_code = Some(code.to_string());
        }
        Ok(())
    }

    async fn dissolve_genesis(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.persons.iter_mut().find(|p| p.id == id) {
            p.is_genesis = false;
            p.genesis_code = None;
        }
        Ok(())
    }

    async fn genesis_count(&self) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.persons.iter().filter(|p| p.is_genesis).count() as i64)
    }

    async fn unresearched(&self, limit: i64) -> Result<Vec<Person>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .persons
            .iter()
            .filter(|p| !p.agent_researched && p.kind != rootline_common::PersonKind::Genesis)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn has_father_edge(&self, person_id: Uuid) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .relationships
            .iter()
            .any(|r| r.child_id == person_id && r.parent_type == ParentType::Father))
    }

    async fn apply_enrichment(&self, id: Uuid, update: EnrichmentUpdate) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.persons.iter_mut().find(|p| p.id == id) {
            if update.external_id.is_some() {
                p.external_id = update.external_id;
            }
            if update.birth_year.is_some() {
                p.approx_birth_year = update.birth_year;
            }
            if update.death_year.is_some() {
                p.approx_death_year = update.death_year;
            }
            if update.gender.is_some() {
                p.gender = update.gender;
            }
            if update.era.is_some() {
                p.era = update.era;
            }
            if update.wiki_slug.is_some() {
                p.wiki_slug = update.wiki_slug;
            }
        }
        Ok(())
    }

    async fn next_person_missing_details(&self) -> Result<Option<Person>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .persons
            .iter()
            .find(|p| {
                p.kind != rootline_common::PersonKind::Genesis
                    && (p.approx_birth_year.is_none()
                        || p.era.is_none()
                        || p.gender.is_none()
                        || p.wiki_slug.is_none())
            })
            .cloned())
    }

    async fn persons_without_categories(&self, limit: i64) -> Result<Vec<Person>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .persons
            .iter()
            .filter(|p| {
                p.kind != rootline_common::PersonKind::Genesis
                    && !inner.person_categories.iter().any(|(pid, _)| *pid == p.id)
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn genesis_with_father(&self, limit: i64) -> Result<Vec<Person>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .persons
            .iter()
            .filter(|p| {
                p.is_genesis
                    && inner
                        .relationships
                        .iter()
                        .any(|r| r.child_id == p.id && r.parent_type == ParentType::Father)
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn relationship(
        &self,
        child_id: Uuid,
        parent_id: Uuid,
        parent_type: ParentType,
    ) -> Result<Option<Relationship>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .relationships
            .iter()
            .find(|r| {
                r.child_id == child_id && r.parent_id == parent_id && r.parent_type == parent_type
            })
            .cloned())
    }

    async fn primary_relationship(
        &self,
        child_id: Uuid,
        parent_type: ParentType,
    ) -> Result<Option<Relationship>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .relationships
            .iter()
            .find(|r| r.child_id == child_id && r.parent_type == parent_type && r.is_primary)
            .cloned())
    }

    async fn insert_relationship(&self, new: NewRelationship) -> Result<Relationship> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.relationships.iter_mut().find(|r| {
            r.child_id == new.child_id
                && r.parent_id == new.parent_id
                && r.parent_type == new.parent_type
        }) {
            existing.confidence = new.confidence;
            return Ok(existing.clone());
        }
        let rel = Relationship {
            id: Uuid::new_v4(),
            child_id: new.child_id,
            parent_id: new.parent_id,
            parent_type: new.parent_type,
            confidence: new.confidence,
            is_primary: new.is_primary,
            is_branch: new.is_branch,
            created_at: Utc::now(),
        };
        inner.relationships.push(rel.clone());
        Ok(rel)
    }

    async fn set_confidence(&self, relationship_id: Uuid, confidence: f32) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(r) = inner
            .relationships
            .iter_mut()
            .find(|r| r.id == relationship_id)
        {
            r.confidence = confidence;
        }
        Ok(())
    }

    async fn demote_to_branch(&self, relationship_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(r) = inner
            .relationships
            .iter_mut()
            .find(|r| r.id == relationship_id)
        {
            r.is_primary = false;
            r.is_branch = true;
        }
        Ok(())
    }

    async fn promote_to_primary(&self, relationship_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(r) = inner
            .relationships
            .iter_mut()
            .find(|r| r.id == relationship_id)
        {
            r.is_primary = true;
            r.is_branch = false;
        }
        Ok(())
    }

    async fn add_relationship_source(
        &self,
        relationship_id: Uuid,
        url: &str,
        source_type: SourceType,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let exists = inner
            .sources
            .iter()
            .any(|s| s.relationship_id == relationship_id && s.url == url);
        if !exists {
            inner.sources.push(SourceRecord {
                relationship_id,
                url: url.to_string(),
                source_type,
            });
        }
        Ok(())
    }

    async fn enqueue(&self, person_id: Uuid, direction: Direction, priority: i32) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let pending_exists = inner
            .jobs
            .iter()
            .any(|j| j.person_id == person_id && j.status == JobStatus::Pending);
        if !pending_exists {
            inner.jobs.push(QueueJob {
                id: Uuid::new_v4(),
                person_id,
                direction,
                priority,
                status: JobStatus::Pending,
                attempts: 0,
                created_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn claim_next(&self) -> Result<Option<QueueJob>> {
        let mut inner = self.inner.lock().unwrap();
        // Insertion order is the created_at tiebreak.
        let best = inner
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, j)| j.status == JobStatus::Pending)
            .max_by_key(|(idx, j)| (j.priority, std::cmp::Reverse(*idx)))
            .map(|(idx, _)| idx);
        if let Some(idx) = best {
            inner.jobs[idx].status = JobStatus::Processing;
            return Ok(Some(inner.jobs[idx].clone()));
        }
        Ok(None)
    }

    async fn complete_job(&self, job_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(j) = inner.jobs.iter_mut().find(|j| j.id == job_id) {
            j.status = JobStatus::Done;
        }
        Ok(())
    }

    async fn release_job(&self, job_id: Uuid, attempts: i32) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(j) = inner.jobs.iter_mut().find(|j| j.id == job_id) {
            j.status = JobStatus::Pending;
            j.attempts = attempts;
        }
        Ok(())
    }

    async fn fail_job(&self, job_id: Uuid, attempts: i32) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(j) = inner.jobs.iter_mut().find(|j| j.id == job_id) {
            j.status = JobStatus::Failed;
            j.attempts = attempts;
        }
        Ok(())
    }

    async fn failed_count(&self) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Failed)
            .count() as i64)
    }

    async fn reset_failed(&self) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let mut reset = 0;
        for j in inner.jobs.iter_mut() {
            if j.status == JobStatus::Failed {
                j.status = JobStatus::Pending;
                j.attempts = 0;
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn append_merge_log(&self, entry: NewMergeLogEntry) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.merge_log.push(entry);
        Ok(())
    }

    async fn log_activity(
        &self,
        person_id: Option<Uuid>,
        person_name: &str,
        action: &str,
        detail: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.activity.push(ActivityRecord {
            person_id,
            person_name: person_name.to_string(),
            action: action.to_string(),
            detail: detail.to_string(),
        });
        Ok(())
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<Uuid>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .categories
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| *id))
    }

    async fn assign_category(&self, person_id: Uuid, category_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let exists = inner
            .person_categories
            .iter()
            .any(|(p, c)| *p == person_id && *c == category_id);
        if !exists {
            inner.person_categories.push((person_id, category_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rootline_common::PersonKind;

    fn new_person(name: &str) -> NewPerson {
        NewPerson {
            name: name.to_string(),
            kind: PersonKind::Human,
            external_id: None,
        }
    }

    #[tokio::test]
    async fn name_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        let created = store.create_person(new_person("Ragnar")).await.unwrap();
        let found = store.person_by_name("rAgNaR").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn enqueue_is_idempotent_per_pending_person() {
        let store = MemoryStore::new();
        let p = store.create_person(new_person("Ragnar")).await.unwrap();
        store.enqueue(p.id, Direction::Both, 50).await.unwrap();
        store.enqueue(p.id, Direction::Both, 90).await.unwrap();
        assert_eq!(store.jobs().len(), 1);

        // Once the pending job is claimed, a new one may be enqueued.
        let job = store.claim_next().await.unwrap().unwrap();
        store.complete_job(job.id).await.unwrap();
        store.enqueue(p.id, Direction::Both, 50).await.unwrap();
        assert_eq!(store.jobs().len(), 2);
    }

    #[tokio::test]
    async fn claim_prefers_priority_then_age() {
        let store = MemoryStore::new();
        let a = store.create_person(new_person("A")).await.unwrap();
        let b = store.create_person(new_person("B")).await.unwrap();
        let c = store.create_person(new_person("C")).await.unwrap();
        store.enqueue(a.id, Direction::Both, 30).await.unwrap();
        store.enqueue(b.id, Direction::Both, 85).await.unwrap();
        store.enqueue(c.id, Direction::Both, 85).await.unwrap();

        let first = store.claim_next().await.unwrap().unwrap();
        assert_eq!(first.person_id, b.id);
        let second = store.claim_next().await.unwrap().unwrap();
        assert_eq!(second.person_id, c.id);
        let third = store.claim_next().await.unwrap().unwrap();
        assert_eq!(third.person_id, a.id);
        assert!(store.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_failed_revives_jobs_with_attempts_cleared() {
        let store = MemoryStore::new();
        let p = store.create_person(new_person("Ragnar")).await.unwrap();
        store.enqueue(p.id, Direction::Both, 50).await.unwrap();
        let job = store.claim_next().await.unwrap().unwrap();
        store.fail_job(job.id, 5).await.unwrap();
        assert_eq!(store.failed_count().await.unwrap(), 1);

        let revived = store.reset_failed().await.unwrap();
        assert_eq!(revived, 1);
        assert_eq!(store.failed_count().await.unwrap(), 0);
        let job = store.claim_next().await.unwrap().unwrap();
        assert_eq!(job.attempts, 0);
    }

    #[tokio::test]
    async fn insert_relationship_updates_confidence_on_conflict() {
        let store = MemoryStore::new();
        let child = store.create_person(new_person("Child")).await.unwrap();
        let parent = store.create_person(new_person("Parent")).await.unwrap();
        let new_rel = |confidence| NewRelationship {
            child_id: child.id,
            parent_id: parent.id,
            parent_type: ParentType::Father,
            confidence,
            is_primary: true,
            is_branch: false,
        };
        let first = store.insert_relationship(new_rel(80.0)).await.unwrap();
        let second = store.insert_relationship(new_rel(90.0)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.relationships().len(), 1);
        assert_eq!(store.relationships()[0].confidence, 90.0);
    }
}
