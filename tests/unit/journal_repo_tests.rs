use std::sync::Arc;

use hablemos::models::journal::{Correction, CorrectionCategory, JournalEntry, JournalStatus};
use hablemos::persistence::db;
use hablemos::persistence::journal_repo::JournalRepo;
use hablemos::AppError;

async fn repo() -> JournalRepo {
    let pool = db::connect_memory().await.expect("db connect");
    JournalRepo::new(Arc::new(pool))
}

#[tokio::test]
async fn create_and_get_round_trips_corrections() {
    let repo = repo().await;
    let mut entry = JournalEntry::new("Lunes".into(), "Ayer yo va al cine.".into());
    entry.status = JournalStatus::Corrected;
    entry.corrected_content = Some("Ayer fui al cine.".into());
    entry.corrections = vec![Correction {
        original: "yo va".into(),
        corrected: "fui".into(),
        explanation: "Pretérito de ir en primera persona".into(),
        category: CorrectionCategory::Grammar,
    }];

    repo.create(&entry).await.expect("create");
    let loaded = repo
        .get_by_id(&entry.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(loaded, entry);
}

#[tokio::test]
async fn list_is_newest_first() {
    let repo = repo().await;
    let older = repo
        .create(&JournalEntry::new("Uno".into(), "Texto uno".into()))
        .await
        .expect("create");
    let newer = repo
        .create(&JournalEntry::new("Dos".into(), "Texto dos".into()))
        .await
        .expect("create");

    let listed = repo.list().await.expect("list");
    let ids: Vec<&str> = listed.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
}

#[tokio::test]
async fn update_persists_revision() {
    let repo = repo().await;
    let mut entry = repo
        .create(&JournalEntry::new("Martes".into(), "Hola".into()))
        .await
        .expect("create");
    entry.revise("Hola a todos".into());

    let updated = repo.update(&entry).await.expect("update");
    assert_eq!(updated.content, "Hola a todos");
    let loaded = repo
        .get_by_id(&entry.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(loaded.content, "Hola a todos");
}

#[tokio::test]
async fn update_missing_entry_is_not_found() {
    let repo = repo().await;
    let entry = JournalEntry::new("x".into(), "y".into());
    assert!(matches!(
        repo.update(&entry).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_reports_whether_a_row_was_removed() {
    let repo = repo().await;
    let entry = repo
        .create(&JournalEntry::new("x".into(), "y".into()))
        .await
        .expect("create");
    assert!(repo.delete(&entry.id).await.expect("delete"));
    assert!(!repo.delete(&entry.id).await.expect("delete again"));
    assert!(repo.get_by_id(&entry.id).await.expect("get").is_none());
}

#[tokio::test]
async fn store_corrections_requires_unchanged_content() {
    let repo = repo().await;
    let mut entry = repo
        .create(&JournalEntry::new("Martes".into(), "Yo tiene hambre.".into()))
        .await
        .expect("create");

    entry.status = JournalStatus::Corrected;
    entry.corrected_content = Some("Yo tengo hambre.".into());
    entry.content = "Yo tiene sed.".into();
    assert!(!repo.store_corrections(&entry).await.expect("store"));
    let loaded = repo.get_by_id(&entry.id).await.expect("get").expect("exists");
    assert_eq!(loaded.status, JournalStatus::Draft);
    assert_eq!(loaded.content, "Yo tiene hambre.");

    entry.content = "Yo tiene hambre.".into();
    assert!(repo.store_corrections(&entry).await.expect("store"));
    let loaded = repo.get_by_id(&entry.id).await.expect("get").expect("exists");
    assert_eq!(loaded.status, JournalStatus::Corrected);
    assert_eq!(loaded.corrected_content.as_deref(), Some("Yo tengo hambre."));
}
