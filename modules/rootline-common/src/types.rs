use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonKind {
    Human,
    Mythological,
    Genesis,
}

impl PersonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonKind::Human => "human",
            PersonKind::Mythological => "mythological",
            PersonKind::Genesis => "genesis",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "human" => Some(PersonKind::Human),
            "mythological" => Some(PersonKind::Mythological),
            "genesis" => Some(PersonKind::Genesis),
            _ => None,
        }
    }
}

impl std::fmt::Display for PersonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Deity,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Deity => "deity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "deity" => Some(Gender::Deity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    Prehistoric,
    Ancient,
    Classical,
    Medieval,
    EarlyModern,
    Modern,
    Mythological,
}

impl Era {
    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Prehistoric => "Prehistoric",
            Era::Ancient => "Ancient",
            Era::Classical => "Classical",
            Era::Medieval => "Medieval",
            Era::EarlyModern => "Early Modern",
            Era::Modern => "Modern",
            Era::Mythological => "Mythological",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Prehistoric" => Some(Era::Prehistoric),
            "Ancient" => Some(Era::Ancient),
            "Classical" => Some(Era::Classical),
            "Medieval" => Some(Era::Medieval),
            "Early Modern" => Some(Era::EarlyModern),
            "Modern" => Some(Era::Modern),
            "Mythological" => Some(Era::Mythological),
            _ => None,
        }
    }
}

impl std::fmt::Display for Era {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentType {
    Father,
    Mother,
}

impl ParentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentType::Father => "father",
            ParentType::Mother => "mother",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "father" => Some(ParentType::Father),
            "mother" => Some(ParentType::Mother),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Wikidata,
    Dbpedia,
    Wikipedia,
    User,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Wikidata => "wikidata",
            SourceType::Dbpedia => "dbpedia",
            SourceType::Wikipedia => "wikipedia",
            SourceType::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wikidata" => Some(SourceType::Wikidata),
            "dbpedia" => Some(SourceType::Dbpedia),
            "wikipedia" => Some(SourceType::Wikipedia),
            "user" => Some(SourceType::User),
            _ => None,
        }
    }

    /// Classify a provenance URL by its host.
    pub fn from_url(url: &str) -> Self {
        if url.contains("wikidata") {
            SourceType::Wikidata
        } else if url.contains("dbpedia") {
            SourceType::Dbpedia
        } else {
            SourceType::Wikipedia
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Both,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "both" => Some(Direction::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "done" => Some(JobStatus::Done),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

// --- Graph rows ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub kind: PersonKind,
    pub external_id: Option<String>,
    pub approx_birth_year: Option<i32>,
    pub approx_death_year: Option<i32>,
    pub gender: Option<Gender>,
    pub era: Option<Era>,
    pub wiki_slug: Option<String>,
    pub is_genesis: bool,
    pub genesis_code: Option<String>,
    pub agent_researched: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a person row. Everything else starts null/false:
/// new nodes are never assumed to be graph roots.
#[derive(Debug, Clone)]
pub struct NewPerson {
    pub name: String,
    pub kind: PersonKind,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Relationship {
    pub id: Uuid,
    pub child_id: Uuid,
    pub parent_id: Uuid,
    pub parent_type: ParentType,
    pub confidence: f32,
    pub is_primary: bool,
    pub is_branch: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRelationship {
    pub child_id: Uuid,
    pub parent_id: Uuid,
    pub parent_type: ParentType,
    pub confidence: f32,
    pub is_primary: bool,
    pub is_branch: bool,
}

#[derive(Debug, Clone)]
pub struct QueueJob {
    pub id: Uuid,
    pub person_id: Uuid,
    pub direction: Direction,
    pub priority: i32,
    pub status: JobStatus,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

/// Audit record written exactly once per genesis dissolution.
#[derive(Debug, Clone)]
pub struct NewMergeLogEntry {
    pub genesis_person_id: Uuid,
    pub genesis_code: String,
    pub merged_into_person_id: Uuid,
    pub confidence_at_merge: f32,
}

/// Sparse update applied by the enrichment loop. Only present fields are
/// written; relationships are never touched.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentUpdate {
    pub external_id: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub gender: Option<Gender>,
    pub era: Option<Era>,
    pub wiki_slug: Option<String>,
}

impl EnrichmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.external_id.is_none()
            && self.birth_year.is_none()
            && self.death_year.is_none()
            && self.gender.is_none()
            && self.era.is_none()
            && self.wiki_slug.is_none()
    }
}

// --- Discovery records ---

/// One parent or child claim from a knowledge source.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub external_id: Option<String>,
    pub confidence: f32,
}

/// Consolidated research result for one person. Adapters each produce a
/// partial Discovery; the merge engine folds them into one accumulator.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub external_id: Option<String>,
    pub father: Option<Candidate>,
    pub mother: Option<Candidate>,
    pub children: Vec<Candidate>,
    pub birth_year: Option<i32>,
    pub source_url: Option<String>,
    pub categories: Vec<String>,
}

impl Discovery {
    /// Whether any parent/child evidence has been accumulated. The
    /// free-text fallback adapter only runs while this is false.
    pub fn has_relationships(&self) -> bool {
        self.father.is_some() || self.mother.is_some() || !self.children.is_empty()
    }
}
