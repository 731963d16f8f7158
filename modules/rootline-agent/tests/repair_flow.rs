//! Repair loop scenarios: category backfill and stale genesis flags.

use std::sync::Arc;

use rootline_agent::repair::RepairScheduler;
use rootline_common::{Config, NewPerson, NewRelationship, ParentType, PersonKind};
use rootline_store::{MemoryStore, Store};

fn person(name: &str, kind: PersonKind) -> NewPerson {
    NewPerson {
        name: name.to_string(),
        kind,
        external_id: None,
    }
}

#[tokio::test]
async fn known_figures_get_curated_categories() {
    let store = Arc::new(MemoryStore::new());
    let zeus = store
        .create_person(person("Zeus", PersonKind::Mythological))
        .await
        .unwrap();

    let repair = RepairScheduler::new(store.clone(), Config::default()).unwrap();
    let assigned = repair.fix_missing_categories().await.unwrap();

    assert_eq!(assigned, 2);
    let cats = store.category_assignments(zeus.id);
    assert!(cats.contains(&"Greek Gods".to_string()));
    assert!(cats.contains(&"Mythological".to_string()));

    // Already categorized persons are not revisited
    assert!(store
        .persons_without_categories(50)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn genesis_flag_cleared_when_father_exists() {
    let store = Arc::new(MemoryStore::new());
    let child = store
        .create_person(person("Sweyn Forkbeard", PersonKind::Human))
        .await
        .unwrap();
    let father = store
        .create_person(person("Harald Bluetooth", PersonKind::Human))
        .await
        .unwrap();
    store.assign_genesis(child.id, "G3").await.unwrap();
    store
        .insert_relationship(NewRelationship {
            child_id: child.id,
            parent_id: father.id,
            parent_type: ParentType::Father,
            confidence: 88.0,
            is_primary: true,
            is_branch: false,
        })
        .await
        .unwrap();

    let repair = RepairScheduler::new(store.clone(), Config::default()).unwrap();
    let fixed = repair.fix_stale_genesis().await.unwrap();

    assert_eq!(fixed, 1);
    let refreshed = store.person(child.id).await.unwrap().unwrap();
    assert!(!refreshed.is_genesis);
    assert!(refreshed.genesis_code.is_none());
    assert!(store.activity().iter().any(|a| a.action == "repaired"));

    // A mother-only edge does not count as having a father
    let other = store
        .create_person(person("Olaf", PersonKind::Human))
        .await
        .unwrap();
    let mother = store
        .create_person(person("Tove", PersonKind::Human))
        .await
        .unwrap();
    store.assign_genesis(other.id, "G4").await.unwrap();
    store
        .insert_relationship(NewRelationship {
            child_id: other.id,
            parent_id: mother.id,
            parent_type: ParentType::Mother,
            confidence: 88.0,
            is_primary: true,
            is_branch: false,
        })
        .await
        .unwrap();
    assert_eq!(repair.fix_stale_genesis().await.unwrap(), 0);
    assert!(store.person(other.id).await.unwrap().unwrap().is_genesis);
}
