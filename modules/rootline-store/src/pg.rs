// Postgres persistence for the genealogy graph, queue, and audit tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use rootline_common::{
    Direction, EnrichmentUpdate, Era, Gender, JobStatus, NewMergeLogEntry, NewPerson,
    NewRelationship, ParentType, Person, PersonKind, QueueJob, Relationship, SourceType,
};

use crate::error::{Result, StoreError};
use crate::Store;

pub struct PgStore {
    pool: PgPool,
}

const PERSON_COLS: &str = "id, name, kind, external_id, approx_birth_year, approx_death_year, \
     gender, era, wiki_slug, is_genesis, genesis_code, agent_researched, created_at";

#[derive(Debug, sqlx::FromRow)]
struct PersonRow {
    id: Uuid,
    name: String,
    kind: String,
    external_id: Option<String>,
    approx_birth_year: Option<i32>,
    approx_death_year: Option<i32>,
    gender: Option<String>,
    era: Option<String>,
    wiki_slug: Option<String>,
    is_genesis: bool,
    genesis_code: Option<String>,
    agent_researched: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<PersonRow> for Person {
    type Error = StoreError;

    fn try_from(r: PersonRow) -> Result<Self> {
        let kind = PersonKind::parse(&r.kind)
            .ok_or_else(|| StoreError::Decode(format!("unknown person kind {:?}", r.kind)))?;
        Ok(Person {
            id: r.id,
            name: r.name,
            kind,
            external_id: r.external_id,
            approx_birth_year: r.approx_birth_year,
            approx_death_year: r.approx_death_year,
            gender: r.gender.as_deref().and_then(Gender::parse),
            era: r.era.as_deref().and_then(Era::parse),
            wiki_slug: r.wiki_slug,
            is_genesis: r.is_genesis,
            genesis_code: r.genesis_code,
            agent_researched: r.agent_researched,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RelationshipRow {
    id: Uuid,
    child_id: Uuid,
    parent_id: Uuid,
    parent_type: String,
    confidence: f32,
    is_primary: bool,
    is_branch: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<RelationshipRow> for Relationship {
    type Error = StoreError;

    fn try_from(r: RelationshipRow) -> Result<Self> {
        let parent_type = ParentType::parse(&r.parent_type)
            .ok_or_else(|| StoreError::Decode(format!("unknown parent type {:?}", r.parent_type)))?;
        Ok(Relationship {
            id: r.id,
            child_id: r.child_id,
            parent_id: r.parent_id,
            parent_type,
            confidence: r.confidence,
            is_primary: r.is_primary,
            is_branch: r.is_branch,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QueueJobRow {
    id: Uuid,
    person_id: Uuid,
    direction: String,
    priority: i32,
    status: String,
    attempts: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<QueueJobRow> for QueueJob {
    type Error = StoreError;

    fn try_from(r: QueueJobRow) -> Result<Self> {
        let direction = Direction::parse(&r.direction)
            .ok_or_else(|| StoreError::Decode(format!("unknown direction {:?}", r.direction)))?;
        let status = JobStatus::parse(&r.status)
            .ok_or_else(|| StoreError::Decode(format!("unknown job status {:?}", r.status)))?;
        Ok(QueueJob {
            id: r.id,
            person_id: r.person_id,
            direction,
            priority: r.priority,
            status,
            attempts: r.attempts,
            created_at: r.created_at,
        })
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn fetch_person(&self, sql: &str, bind: &str) -> Result<Option<Person>> {
        let row = sqlx::query_as::<_, PersonRow>(sql)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Person::try_from).transpose()
    }

    async fn fetch_persons(&self, sql: &str, limit: i64) -> Result<Vec<Person>> {
        let rows = sqlx::query_as::<_, PersonRow>(sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Person::try_from).collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn person(&self, id: Uuid) -> Result<Option<Person>> {
        let row = sqlx::query_as::<_, PersonRow>(&format!(
            "SELECT {PERSON_COLS} FROM persons WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Person::try_from).transpose()
    }

    async fn person_by_external_id(&self, external_id: &str) -> Result<Option<Person>> {
        self.fetch_person(
            &format!("SELECT {PERSON_COLS} FROM persons WHERE external_id = $1 LIMIT 1"),
            external_id,
        )
        .await
    }

    async fn person_by_name(&self, name: &str) -> Result<Option<Person>> {
        self.fetch_person(
            &format!("SELECT {PERSON_COLS} FROM persons WHERE LOWER(name) = LOWER($1) LIMIT 1"),
            name,
        )
        .await
    }

    async fn create_person(&self, new: NewPerson) -> Result<Person> {
        let row = sqlx::query_as::<_, PersonRow>(&format!(
            "INSERT INTO persons (name, kind, external_id, is_genesis, genesis_code)
             VALUES ($1, $2, $3, FALSE, NULL)
             RETURNING {PERSON_COLS}"
        ))
        .bind(&new.name)
        .bind(new.kind.as_str())
        .bind(&new.external_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn set_external_id(&self, id: Uuid, external_id: &str) -> Result<()> {
        sqlx::query("UPDATE persons SET external_id = $2 WHERE id = $1")
            .bind(id)
            .bind(external_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_birth_year(&self, id: Uuid, year: i32) -> Result<()> {
        sqlx::query("UPDATE persons SET approx_birth_year = $2 WHERE id = $1")
            .bind(id)
            .bind(year)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_researched(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE persons SET agent_researched = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn assign_genesis(&self, id: Uuid, code: &str) -> Result<()> {
        sqlx::query("UPDATE persons SET is_genesis = TRUE, genesis_code = $2 WHERE id = $1")
            .bind(id)
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn dissolve_genesis(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE persons SET is_genesis = FALSE, genesis_code = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn genesis_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM persons WHERE is_genesis = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn unresearched(&self, limit: i64) -> Result<Vec<Person>> {
        self.fetch_persons(
            &format!(
                "SELECT {PERSON_COLS} FROM persons
                 WHERE agent_researched = FALSE AND kind != 'genesis'
                 ORDER BY created_at ASC LIMIT $1"
            ),
            limit,
        )
        .await
    }

    async fn has_father_edge(&self, person_id: Uuid) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM relationships WHERE child_id = $1 AND parent_type = 'father'",
        )
        .bind(person_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn apply_enrichment(&self, id: Uuid, update: EnrichmentUpdate) -> Result<()> {
        sqlx::query(
            "UPDATE persons SET
                external_id = COALESCE($2, external_id),
                approx_birth_year = COALESCE($3, approx_birth_year),
                approx_death_year = COALESCE($4, approx_death_year),
                gender = COALESCE($5, gender),
                era = COALESCE($6, era),
                wiki_slug = COALESCE($7, wiki_slug)
             WHERE id = $1",
        )
        .bind(id)
        .bind(&update.external_id)
        .bind(update.birth_year)
        .bind(update.death_year)
        .bind(update.gender.map(|g| g.as_str()))
        .bind(update.era.map(|e| e.as_str()))
        .bind(&update.wiki_slug)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn next_person_missing_details(&self) -> Result<Option<Person>> {
        let row = sqlx::query_as::<_, PersonRow>(&format!(
            "SELECT {PERSON_COLS} FROM persons
             WHERE kind != 'genesis'
               AND (approx_birth_year IS NULL OR era IS NULL
                    OR gender IS NULL OR wiki_slug IS NULL)
             ORDER BY created_at ASC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.map(Person::try_from).transpose()
    }

    async fn persons_without_categories(&self, limit: i64) -> Result<Vec<Person>> {
        self.fetch_persons(
            &format!(
                "SELECT {PERSON_COLS} FROM persons p
                 WHERE p.kind != 'genesis'
                   AND NOT EXISTS (
                       SELECT 1 FROM person_categories pc WHERE pc.person_id = p.id
                   )
                 ORDER BY p.created_at ASC LIMIT $1"
            ),
            limit,
        )
        .await
    }

    async fn genesis_with_father(&self, limit: i64) -> Result<Vec<Person>> {
        self.fetch_persons(
            &format!(
                "SELECT {PERSON_COLS} FROM persons p
                 WHERE p.is_genesis = TRUE
                   AND EXISTS (
                       SELECT 1 FROM relationships r
                       WHERE r.child_id = p.id AND r.parent_type = 'father'
                   )
                 LIMIT $1"
            ),
            limit,
        )
        .await
    }

    async fn relationship(
        &self,
        child_id: Uuid,
        parent_id: Uuid,
        parent_type: ParentType,
    ) -> Result<Option<Relationship>> {
        let row = sqlx::query_as::<_, RelationshipRow>(
            "SELECT * FROM relationships
             WHERE child_id = $1 AND parent_id = $2 AND parent_type = $3",
        )
        .bind(child_id)
        .bind(parent_id)
        .bind(parent_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Relationship::try_from).transpose()
    }

    async fn primary_relationship(
        &self,
        child_id: Uuid,
        parent_type: ParentType,
    ) -> Result<Option<Relationship>> {
        let row = sqlx::query_as::<_, RelationshipRow>(
            "SELECT * FROM relationships
             WHERE child_id = $1 AND parent_type = $2 AND is_primary = TRUE
             LIMIT 1",
        )
        .bind(child_id)
        .bind(parent_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Relationship::try_from).transpose()
    }

    async fn insert_relationship(&self, new: NewRelationship) -> Result<Relationship> {
        let row = sqlx::query_as::<_, RelationshipRow>(
            "INSERT INTO relationships
                 (child_id, parent_id, parent_type, confidence, is_primary, is_branch)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (child_id, parent_id, parent_type)
                 DO UPDATE SET confidence = EXCLUDED.confidence
             RETURNING *",
        )
        .bind(new.child_id)
        .bind(new.parent_id)
        .bind(new.parent_type.as_str())
        .bind(new.confidence)
        .bind(new.is_primary)
        .bind(new.is_branch)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn set_confidence(&self, relationship_id: Uuid, confidence: f32) -> Result<()> {
        sqlx::query("UPDATE relationships SET confidence = $2 WHERE id = $1")
            .bind(relationship_id)
            .bind(confidence)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn demote_to_branch(&self, relationship_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE relationships SET is_primary = FALSE, is_branch = TRUE WHERE id = $1",
        )
        .bind(relationship_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn promote_to_primary(&self, relationship_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE relationships SET is_primary = TRUE, is_branch = FALSE WHERE id = $1",
        )
        .bind(relationship_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_relationship_source(
        &self,
        relationship_id: Uuid,
        url: &str,
        source_type: SourceType,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO sources (relationship_id, url, source_type)
             VALUES ($1, $2, $3)
             ON CONFLICT (relationship_id, url) DO NOTHING",
        )
        .bind(relationship_id)
        .bind(url)
        .bind(source_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn enqueue(&self, person_id: Uuid, direction: Direction, priority: i32) -> Result<()> {
        sqlx::query(
            "INSERT INTO agent_queue (person_id, direction, priority)
             SELECT $1, $2, $3
             WHERE NOT EXISTS (
                 SELECT 1 FROM agent_queue WHERE person_id = $1 AND status = 'pending'
             )",
        )
        .bind(person_id)
        .bind(direction.as_str())
        .bind(priority)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn claim_next(&self) -> Result<Option<QueueJob>> {
        // Single conditional update with a row lock: two concurrent
        // schedulers can never claim the same job.
        let row = sqlx::query_as::<_, QueueJobRow>(
            "UPDATE agent_queue SET status = 'processing'
             WHERE id = (
                 SELECT id FROM agent_queue
                 WHERE status = 'pending'
                 ORDER BY priority DESC, created_at ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING id, person_id, direction, priority, status, attempts, created_at",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(QueueJob::try_from).transpose()
    }

    async fn complete_job(&self, job_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE agent_queue SET status = 'done' WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn release_job(&self, job_id: Uuid, attempts: i32) -> Result<()> {
        sqlx::query("UPDATE agent_queue SET status = 'pending', attempts = $2 WHERE id = $1")
            .bind(job_id)
            .bind(attempts)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fail_job(&self, job_id: Uuid, attempts: i32) -> Result<()> {
        sqlx::query("UPDATE agent_queue SET status = 'failed', attempts = $2 WHERE id = $1")
            .bind(job_id)
            .bind(attempts)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn failed_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM agent_queue WHERE status = 'failed'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn reset_failed(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE agent_queue SET status = 'pending', attempts = 0 WHERE status = 'failed'",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn append_merge_log(&self, entry: NewMergeLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO merge_log
                 (genesis_person_id, genesis_code, merged_into_person_id, confidence_at_merge)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(entry.genesis_person_id)
        .bind(&entry.genesis_code)
        .bind(entry.merged_into_person_id)
        .bind(entry.confidence_at_merge)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Logs a warning on failure rather than propagating; a failed audit
    /// write shouldn't abort the research cycle.
    async fn log_activity(
        &self,
        person_id: Option<Uuid>,
        person_name: &str,
        action: &str,
        detail: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO agent_log (person_id, person_name, action, detail)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(person_id)
        .bind(person_name)
        .bind(action)
        .bind(detail)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(person_name, action, error = %e, "Failed to write activity log");
        }
        Ok(())
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn assign_category(&self, person_id: Uuid, category_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO person_categories (person_id, category_id)
             VALUES ($1, $2)
             ON CONFLICT (person_id, category_id) DO NOTHING",
        )
        .bind(person_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
