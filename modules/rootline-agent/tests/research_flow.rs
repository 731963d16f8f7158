//! End-to-end scenarios for the research pipeline against the in-memory
//! store: writing discoveries, queue lifecycle, genesis bookkeeping.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use rootline_agent::adapters::SourceAdapter;
use rootline_agent::scheduler::{ResearchScheduler, SourceSlot, SEED_PRIORITY};
use rootline_agent::seeds::EXPANSION_SEEDS;
use rootline_agent::writer::{GraphWriter, CHILD_PRIORITY, PARENT_PRIORITY};
use rootline_common::{
    AgentError, Candidate, Config, Direction, Discovery, JobStatus, NewPerson, ParentType,
    PersonKind, SourceType,
};
use rootline_store::{MemoryStore, Store};

/// Adapter double returning a canned result.
struct StaticSource {
    result: Option<Discovery>,
}

impl StaticSource {
    fn new(result: Option<Discovery>) -> Self {
        Self { result }
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    async fn fetch(
        &self,
        _name: &str,
        _external_id: Option<&str>,
    ) -> Result<Option<Discovery>, AgentError> {
        Ok(self.result.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

fn candidate(name: &str, confidence: f32) -> Candidate {
    Candidate {
        name: name.to_string(),
        external_id: None,
        confidence,
    }
}

fn human(name: &str) -> NewPerson {
    NewPerson {
        name: name.to_string(),
        kind: PersonKind::Human,
        external_id: None,
    }
}

async fn store_with_person(name: &str) -> (Arc<MemoryStore>, rootline_common::Person) {
    let store = Arc::new(MemoryStore::new());
    let person = store.create_person(human(name)).await.unwrap();
    (store, person)
}

// --- GraphWriter ---

#[tokio::test]
async fn save_links_parents_and_children() {
    let (store, subject) = store_with_person("Henry VIII").await;
    let writer = GraphWriter::new(store.clone(), &Config::default());

    let discovery = Discovery {
        external_id: Some("Q38370".to_string()),
        father: Some(candidate("Henry VII of England", 92.0)),
        mother: Some(candidate("Elizabeth of York", 90.0)),
        children: vec![candidate("Mary I of England", 88.0), candidate("Edward VI", 88.0)],
        birth_year: Some(1491),
        source_url: Some("https://www.wikidata.org/wiki/Q38370".to_string()),
        categories: vec!["British Royals".to_string()],
    };
    writer.save(&subject, &discovery).await.unwrap();

    let refreshed = store.person(subject.id).await.unwrap().unwrap();
    assert_eq!(refreshed.external_id.as_deref(), Some("Q38370"));
    assert_eq!(refreshed.approx_birth_year, Some(1491));

    // Four new persons, all non-genesis
    let persons = store.persons();
    assert_eq!(persons.len(), 5);
    assert!(persons.iter().all(|p| !p.is_genesis));

    let father = store.person_by_name("Henry VII of England").await.unwrap().unwrap();
    let father_edge = store
        .relationship(subject.id, father.id, ParentType::Father)
        .await
        .unwrap()
        .unwrap();
    assert!(father_edge.is_primary);
    assert_eq!(father_edge.confidence, 92.0);

    let mary = store.person_by_name("Mary I of England").await.unwrap().unwrap();
    let child_edge = store
        .relationship(mary.id, subject.id, ParentType::Father)
        .await
        .unwrap()
        .unwrap();
    assert!(child_edge.is_primary);
    assert_eq!(child_edge.confidence, 88.0);

    // Every edge carries the provenance url, classified by host
    let sources = store.sources();
    assert_eq!(sources.len(), 4);
    assert!(sources.iter().all(|s| s.source_type == SourceType::Wikidata));

    // Parents queue ahead of children
    let jobs = store.jobs();
    let father_job = jobs.iter().find(|j| j.person_id == father.id).unwrap();
    assert_eq!(father_job.priority, PARENT_PRIORITY);
    let mary_job = jobs.iter().find(|j| j.person_id == mary.id).unwrap();
    assert_eq!(mary_job.priority, CHILD_PRIORITY);

    assert_eq!(store.category_assignments(subject.id), vec!["British Royals"]);
    assert!(store.activity().iter().any(|a| a.action == "researched"));
}

#[tokio::test]
async fn higher_confidence_claim_demotes_primary() {
    let (store, subject) = store_with_person("Ragnar Lodbrok").await;
    let writer = GraphWriter::new(store.clone(), &Config::default());

    let first = Discovery {
        father: Some(candidate("Sigurd Hring", 72.0)),
        source_url: Some("https://en.wikipedia.org/wiki/Ragnar_Lodbrok".to_string()),
        ..Discovery::default()
    };
    writer.save(&subject, &first).await.unwrap();

    let second = Discovery {
        father: Some(candidate("Sigurd Ring", 92.0)),
        source_url: Some("https://www.wikidata.org/wiki/Q199955".to_string()),
        ..Discovery::default()
    };
    writer.save(&subject, &second).await.unwrap();

    let old_parent = store.person_by_name("Sigurd Hring").await.unwrap().unwrap();
    let new_parent = store.person_by_name("Sigurd Ring").await.unwrap().unwrap();
    let old_edge = store
        .relationship(subject.id, old_parent.id, ParentType::Father)
        .await
        .unwrap()
        .unwrap();
    let new_edge = store
        .relationship(subject.id, new_parent.id, ParentType::Father)
        .await
        .unwrap()
        .unwrap();
    assert!(!old_edge.is_primary);
    assert!(old_edge.is_branch);
    assert!(new_edge.is_primary);
    assert!(!new_edge.is_branch);
}

#[tokio::test]
async fn lower_confidence_claim_stays_branch() {
    let (store, subject) = store_with_person("Ragnar Lodbrok").await;
    let writer = GraphWriter::new(store.clone(), &Config::default());

    let first = Discovery {
        father: Some(candidate("Sigurd Ring", 92.0)),
        ..Discovery::default()
    };
    writer.save(&subject, &first).await.unwrap();
    let second = Discovery {
        father: Some(candidate("Sigurd Hring", 72.0)),
        ..Discovery::default()
    };
    writer.save(&subject, &second).await.unwrap();

    let incumbent = store.person_by_name("Sigurd Ring").await.unwrap().unwrap();
    let challenger = store.person_by_name("Sigurd Hring").await.unwrap().unwrap();
    assert!(store
        .relationship(subject.id, incumbent.id, ParentType::Father)
        .await
        .unwrap()
        .unwrap()
        .is_primary);
    let branch = store
        .relationship(subject.id, challenger.id, ParentType::Father)
        .await
        .unwrap()
        .unwrap();
    assert!(!branch.is_primary);
    assert!(branch.is_branch);
}

#[tokio::test]
async fn rediscovery_updates_confidence_in_place() {
    let (store, subject) = store_with_person("Harald Bluetooth").await;
    let writer = GraphWriter::new(store.clone(), &Config::default());

    let wiki = Discovery {
        father: Some(candidate("Gorm the Old", 72.0)),
        ..Discovery::default()
    };
    writer.save(&subject, &wiki).await.unwrap();
    let wikidata = Discovery {
        father: Some(candidate("Gorm the Old", 92.0)),
        ..Discovery::default()
    };
    writer.save(&subject, &wikidata).await.unwrap();

    let rels = store.relationships();
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].confidence, 92.0);
    assert!(rels[0].is_primary);
}

#[tokio::test]
async fn self_links_are_skipped() {
    let (store, subject) = store_with_person("Uranus").await;
    let writer = GraphWriter::new(store.clone(), &Config::default());

    let discovery = Discovery {
        father: Some(candidate("uranus", 88.0)),
        ..Discovery::default()
    };
    writer.save(&subject, &discovery).await.unwrap();

    assert!(store.relationships().is_empty());
    assert_eq!(store.persons().len(), 1);
}

#[tokio::test]
async fn high_confidence_parent_dissolves_genesis() {
    let (store, subject) = store_with_person("Sweyn Forkbeard").await;
    store.assign_genesis(subject.id, "G1").await.unwrap();
    let writer = GraphWriter::new(store.clone(), &Config::default());

    let discovery = Discovery {
        father: Some(candidate("Harald Bluetooth", 96.0)),
        ..Discovery::default()
    };
    writer.save(&subject, &discovery).await.unwrap();

    let refreshed = store.person(subject.id).await.unwrap().unwrap();
    assert!(!refreshed.is_genesis);
    assert!(refreshed.genesis_code.is_none());

    let log = store.merge_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].genesis_person_id, subject.id);
    assert_eq!(log[0].genesis_code, "G1");
    assert_eq!(log[0].confidence_at_merge, 96.0);
}

#[tokio::test]
async fn below_threshold_parent_keeps_genesis() {
    let (store, subject) = store_with_person("Sweyn Forkbeard").await;
    store.assign_genesis(subject.id, "G1").await.unwrap();
    let writer = GraphWriter::new(store.clone(), &Config::default());

    let discovery = Discovery {
        father: Some(candidate("Harald Bluetooth", 92.0)),
        ..Discovery::default()
    };
    writer.save(&subject, &discovery).await.unwrap();

    let refreshed = store.person(subject.id).await.unwrap().unwrap();
    assert!(refreshed.is_genesis);
    assert!(store.merge_log().is_empty());
}

// --- ResearchScheduler ---

fn scheduler_with(
    store: Arc<MemoryStore>,
    sources: Vec<SourceSlot>,
) -> ResearchScheduler {
    ResearchScheduler::with_sources(store, Config::default(), sources)
}

fn slot(source: StaticSource, offset: f32, fallback_only: bool) -> SourceSlot {
    SourceSlot {
        adapter: Box::new(source),
        offset,
        fallback_only,
    }
}

#[tokio::test(start_paused = true)]
async fn tick_researches_and_completes_job() {
    let (store, subject) = store_with_person("Harald Bluetooth").await;
    store.enqueue(subject.id, Direction::Both, 85).await.unwrap();

    let found = Discovery {
        father: Some(candidate("Gorm the Old", 92.0)),
        ..Discovery::default()
    };
    let mut scheduler = scheduler_with(
        store.clone(),
        vec![slot(StaticSource::new(Some(found)), 0.0, false)],
    );
    scheduler.tick().await.unwrap();

    let jobs = store.jobs();
    assert_eq!(jobs[0].status, JobStatus::Done);
    assert!(store.person(subject.id).await.unwrap().unwrap().agent_researched);
    assert!(store.person_by_name("Gorm the Old").await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn fallback_source_skipped_once_evidence_exists() {
    let (store, subject) = store_with_person("Harald Bluetooth").await;
    store.enqueue(subject.id, Direction::Both, 85).await.unwrap();

    let found = Discovery {
        father: Some(candidate("Gorm the Old", 92.0)),
        ..Discovery::default()
    };
    let fallback = StaticSource::new(Some(Discovery {
        father: Some(candidate("Wrong Gorm", 72.0)),
        ..Discovery::default()
    }));
    let fallback_calls = Arc::new(AtomicUsize::new(0));

    // Wrap the counter we want to observe after the scheduler takes ownership
    struct CountingSource {
        inner: StaticSource,
        calls: Arc<AtomicUsize>,
    }
    #[async_trait]
    impl SourceAdapter for CountingSource {
        async fn fetch(
            &self,
            name: &str,
            external_id: Option<&str>,
        ) -> Result<Option<Discovery>, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(name, external_id).await
        }
        fn name(&self) -> &str {
            "counting"
        }
    }

    let mut scheduler = scheduler_with(
        store.clone(),
        vec![
            slot(StaticSource::new(Some(found)), 0.0, false),
            SourceSlot {
                adapter: Box::new(CountingSource {
                    inner: fallback,
                    calls: fallback_calls.clone(),
                }),
                offset: -10.0,
                fallback_only: true,
            },
        ],
    );
    scheduler.tick().await.unwrap();

    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    assert!(store.person_by_name("Wrong Gorm").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn exhausted_job_fails_and_assigns_genesis() {
    let (store, subject) = store_with_person("Utterly Unknown").await;
    store.enqueue(subject.id, Direction::Both, 85).await.unwrap();

    let mut scheduler =
        scheduler_with(store.clone(), vec![slot(StaticSource::new(None), 0.0, false)]);
    for _ in 0..5 {
        scheduler.tick().await.unwrap();
    }

    let jobs = store.jobs();
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert_eq!(jobs[0].attempts, 5);

    let refreshed = store.person(subject.id).await.unwrap().unwrap();
    assert!(refreshed.is_genesis);
    assert_eq!(refreshed.genesis_code.as_deref(), Some("G1"));
    assert!(store.activity().iter().any(|a| a.action == "genesis"));
}

#[tokio::test(start_paused = true)]
async fn genesis_codes_are_sequential() {
    let store = Arc::new(MemoryStore::new());
    let first = store.create_person(human("Unknown One")).await.unwrap();
    let second = store.create_person(human("Unknown Two")).await.unwrap();
    store.enqueue(first.id, Direction::Both, 85).await.unwrap();

    let mut scheduler =
        scheduler_with(store.clone(), vec![slot(StaticSource::new(None), 0.0, false)]);
    for _ in 0..5 {
        scheduler.tick().await.unwrap();
    }
    store.enqueue(second.id, Direction::Both, 85).await.unwrap();
    for _ in 0..5 {
        scheduler.tick().await.unwrap();
    }

    let one = store.person(first.id).await.unwrap().unwrap();
    let two = store.person(second.id).await.unwrap().unwrap();
    assert_eq!(one.genesis_code.as_deref(), Some("G1"));
    assert_eq!(two.genesis_code.as_deref(), Some("G2"));
}

#[tokio::test(start_paused = true)]
async fn subject_with_father_is_never_marked_genesis() {
    let store = Arc::new(MemoryStore::new());
    let subject = store.create_person(human("Known Child")).await.unwrap();
    let parent = store.create_person(human("Known Parent")).await.unwrap();
    store
        .insert_relationship(rootline_common::NewRelationship {
            child_id: subject.id,
            parent_id: parent.id,
            parent_type: ParentType::Father,
            confidence: 80.0,
            is_primary: true,
            is_branch: false,
        })
        .await
        .unwrap();
    store.enqueue(subject.id, Direction::Both, 85).await.unwrap();

    let mut scheduler =
        scheduler_with(store.clone(), vec![slot(StaticSource::new(None), 0.0, false)]);
    for _ in 0..5 {
        scheduler.tick().await.unwrap();
    }

    assert!(!store.person(subject.id).await.unwrap().unwrap().is_genesis);
}

#[tokio::test(start_paused = true)]
async fn empty_queue_plants_next_expansion_seed() {
    let store = Arc::new(MemoryStore::new());
    let mut scheduler =
        scheduler_with(store.clone(), vec![slot(StaticSource::new(None), 0.0, false)]);

    scheduler.tick().await.unwrap();

    let noah = store.person_by_name("Noah").await.unwrap().unwrap();
    assert_eq!(noah.kind, PersonKind::Human);
    assert!(!noah.is_genesis);
    let jobs = store.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].person_id, noah.id);
    assert_eq!(jobs[0].priority, SEED_PRIORITY);

    // Next dry tick claims Noah's job instead of planting another seed
    scheduler.tick().await.unwrap();
    assert!(store.person_by_name("Isaac").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn expansion_list_replays_after_exhaustion() {
    let store = Arc::new(MemoryStore::new());
    let mut scheduler =
        scheduler_with(store.clone(), vec![slot(StaticSource::new(None), 0.0, false)]);

    // Walk the whole expansion list, draining each planted job so the
    // next dry tick reaches the refill path again.
    for _ in EXPANSION_SEEDS {
        scheduler.tick().await.unwrap();
        let job = store.claim_next().await.unwrap().unwrap();
        store.complete_job(job.id).await.unwrap();
        store.mark_researched(job.person_id).await.unwrap();
    }
    assert_eq!(store.persons().len(), EXPANSION_SEEDS.len());

    // List exhausted, nothing failed, nothing unresearched: this tick
    // only resets the cycle and enqueues nothing.
    scheduler.tick().await.unwrap();
    assert!(store
        .jobs()
        .iter()
        .all(|j| j.status != JobStatus::Pending));

    // The following tick starts the list over from the first seed,
    // reusing the existing person instead of creating a duplicate.
    scheduler.tick().await.unwrap();
    let noah = store.person_by_name("Noah").await.unwrap().unwrap();
    assert!(store
        .jobs()
        .iter()
        .any(|j| j.person_id == noah.id
            && j.status == JobStatus::Pending
            && j.priority == SEED_PRIORITY));
    assert_eq!(store.persons().len(), EXPANSION_SEEDS.len());
}

#[tokio::test(start_paused = true)]
async fn refill_revives_failed_jobs_before_seeding() {
    let store = Arc::new(MemoryStore::new());
    let person = store.create_person(human("Utterly Unknown")).await.unwrap();
    store.enqueue(person.id, Direction::Both, 85).await.unwrap();
    let job = store.claim_next().await.unwrap().unwrap();
    store.fail_job(job.id, 5).await.unwrap();

    let mut scheduler =
        scheduler_with(store.clone(), vec![slot(StaticSource::new(None), 0.0, false)]);
    scheduler.tick().await.unwrap();

    // The failed job is pending again and no seed was planted
    let jobs = store.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Pending);
    assert_eq!(jobs[0].attempts, 0);
    assert!(store.person_by_name("Noah").await.unwrap().is_none());
}
