//! Diary service tests: accounts, episodes and the rename cascade.

use std::sync::Arc;

use rstest::rstest;

use crate::core::diary::{AccountStatus, EpisodeDraft, Principal};
use crate::core::store::{Page, StoreError};
use crate::tests::common::{create_test_diary, episode_draft, register_user};

// =============================================================================
// Registration / Authentication
// =============================================================================

#[tokio::test]
async fn test_register_stores_hash_not_password() {
    let (diary, dir) = create_test_diary();
    let profile = diary
        .register("alice", "Alice@Example.com", "secret1")
        .await
        .unwrap();

    assert_eq!(profile.username, "alice");
    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(profile.status, AccountStatus::Registered);

    let raw = std::fs::read_to_string(dir.path().join("accounts.json")).unwrap();
    assert!(!raw.contains("secret1"));
    assert!(raw.contains("$argon2id$"));
}

#[rstest]
#[case("ALICE", "other@example.com", "username")]
#[case("bob", "ALICE@example.com", "email")]
#[tokio::test]
async fn test_register_duplicate_leaves_file_unchanged(
    #[case] username: &str,
    #[case] email: &str,
    #[case] field: &str,
) {
    let (diary, dir) = create_test_diary();
    register_user(&diary, "alice").await;
    let path = dir.path().join("accounts.json");
    let before = std::fs::read_to_string(&path).unwrap();

    let result = diary.register(username, email, "secret1").await;
    assert!(matches!(result, Err(StoreError::DuplicateKey { field: f, .. }) if f == field));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[rstest]
#[case("a", "a@example.com", "secret1")]
#[case("alice", "not-an-email", "secret1")]
#[case("alice", "alice@example.com", "123")]
#[case("al ice", "alice@example.com", "secret1")]
#[tokio::test]
async fn test_register_validation(
    #[case] username: &str,
    #[case] email: &str,
    #[case] password: &str,
) {
    let (diary, _dir) = create_test_diary();
    let result = diary.register(username, email, password).await;
    assert!(matches!(result, Err(StoreError::ValidationFailure(_))));
}

#[tokio::test]
async fn test_authenticate_by_username_or_email() {
    let (diary, _dir) = create_test_diary();
    register_user(&diary, "alice").await;

    assert!(diary.authenticate("alice", "secret1").await.is_some());
    assert!(diary.authenticate("ALICE", "secret1").await.is_some());
    assert!(diary.authenticate("alice@example.com", "secret1").await.is_some());
    assert!(diary.authenticate("alice", "wrong").await.is_none());
    assert!(diary.authenticate("nobody", "secret1").await.is_none());
}

#[tokio::test]
async fn test_authenticate_email_folds_non_ascii_case() {
    let (diary, _dir) = create_test_diary();
    let profile = diary
        .register("elise", "Élise@Exemple.fr", "secret1")
        .await
        .unwrap();
    assert_eq!(profile.email, "élise@exemple.fr");

    assert!(diary.authenticate("ÉLISE@EXEMPLE.FR", "secret1").await.is_some());

    let result = diary.register("other", "ÉLISE@exemple.fr", "secret1").await;
    assert!(matches!(result, Err(StoreError::DuplicateKey { field: "email", .. })));
}

#[tokio::test]
async fn test_register_keeps_unknown_account_fields() {
    let (diary, dir) = create_test_diary();
    register_user(&diary, "alice").await;

    let path = dir.path().join("accounts.json");
    let mut accounts: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    accounts[0]["referrer"] = serde_json::json!("newsletter");
    std::fs::write(&path, serde_json::to_string(&accounts).unwrap()).unwrap();

    register_user(&diary, "bob").await;

    let accounts: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(accounts[0]["username"], "alice");
    assert_eq!(accounts[0]["referrer"], "newsletter");
    assert!(accounts[1].get("referrer").is_none());
}

// =============================================================================
// Episodes
// =============================================================================

#[tokio::test]
async fn test_record_and_list_episodes() {
    let (diary, _dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    let bob = register_user(&diary, "bob").await;

    for i in 0..3 {
        diary
            .record_episode(&alice, &episode_draft(&format!("{i} min")))
            .await
            .unwrap();
    }
    diary.record_episode(&bob, &episode_draft("9 min")).await.unwrap();

    let listed = diary.list_episodes(&alice, Page::all()).await;
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].details.duration, "2 min");
    assert!(listed.iter().all(|e| e.owner == "alice"));

    let summary = diary.episode_summary(&alice).await;
    assert_eq!(summary.total, 3);
    assert_eq!(summary.latest.unwrap().id, listed[0].id);
}

#[tokio::test]
async fn test_record_episode_requires_account() {
    let (diary, _dir) = create_test_diary();
    let ghost = Principal::new("ghost");

    let result = diary.record_episode(&ghost, &episode_draft("1 min")).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_record_episode_rejects_future_date() {
    let (diary, _dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    let draft = EpisodeDraft {
        date: "2999-01-01".into(),
        ..episode_draft("1 min")
    };

    let result = diary.record_episode(&alice, &draft).await;
    assert!(matches!(result, Err(StoreError::ValidationFailure(_))));
    assert!(diary.list_episodes(&alice, Page::all()).await.is_empty());
}

#[tokio::test]
async fn test_record_episode_keeps_other_users_unknown_fields() {
    let (diary, dir) = create_test_diary();
    register_user(&diary, "bob").await;
    let alice = register_user(&diary, "alice").await;

    let path = dir.path().join("episodes.json");
    let seeded = serde_json::json!([{
        "id": "20250101000000000000",
        "timestamp": "2025-01-01T00:00:00.000000Z",
        "owner": "bob",
        "date": "2025-01-01",
        "time": "00:00",
        "duration": "5 min",
        "custom_note": "keep me",
    }]);
    std::fs::write(&path, seeded.to_string()).unwrap();

    diary.record_episode(&alice, &episode_draft("1 min")).await.unwrap();

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 2);
    assert_eq!(stored[0]["owner"], "bob");
    assert_eq!(stored[0]["custom_note"], "keep me");
}

#[tokio::test]
async fn test_record_episode_reports_unreadable_accounts() {
    let (diary, dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    std::fs::remove_file(dir.path().join("accounts.json")).unwrap();
    std::fs::create_dir(dir.path().join("accounts.json")).unwrap();

    let result = diary.record_episode(&alice, &episode_draft("1 min")).await;
    assert!(matches!(result, Err(StoreError::StorageRead { .. })));
    assert!(!dir.path().join("episodes.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_record_during_rename_never_orphans_episodes() {
    let (diary, _dir) = create_test_diary();
    let diary = Arc::new(diary);
    let alice = register_user(&diary, "alice").await;

    let writers: Vec<_> = (0..16)
        .map(|i| {
            let diary = Arc::clone(&diary);
            let alice = alice.clone();
            tokio::spawn(async move {
                diary
                    .record_episode(&alice, &episode_draft(&format!("{i} min")))
                    .await
            })
        })
        .collect();
    diary.rename_account(&alice, "alicia").await.unwrap();

    let mut recorded = 0;
    for writer in writers {
        match writer.await.unwrap() {
            Ok(_) => recorded += 1,
            Err(e) => assert!(matches!(e, StoreError::NotFound(_))),
        }
    }

    assert!(diary.list_episodes(&alice, Page::all()).await.is_empty());
    let alicia = Principal::new("alicia");
    assert_eq!(diary.list_episodes(&alicia, Page::all()).await.len(), recorded);
}

#[tokio::test]
async fn test_delete_episode_of_other_user() {
    let (diary, _dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    let bob = register_user(&diary, "bob").await;
    let episode = diary.record_episode(&alice, &episode_draft("1 min")).await.unwrap();

    assert!(!diary.delete_episode(&bob, &episode.id).await.unwrap());
    assert_eq!(diary.list_episodes(&alice, Page::all()).await.len(), 1);

    assert!(diary.delete_episode(&alice, &episode.id).await.unwrap());
    assert!(diary.list_episodes(&alice, Page::all()).await.is_empty());
}

// =============================================================================
// Rename Cascade
// =============================================================================

#[tokio::test]
async fn test_rename_moves_episodes() {
    let (diary, _dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    let bob = register_user(&diary, "bob").await;
    for i in 0..3 {
        diary
            .record_episode(&alice, &episode_draft(&format!("{i} min")))
            .await
            .unwrap();
    }
    diary.record_episode(&bob, &episode_draft("1 min")).await.unwrap();

    let outcome = diary.rename_account(&alice, "alicia").await.unwrap();
    assert_eq!(outcome.previous_username, "alice");
    assert_eq!(outcome.profile.username, "alicia");
    assert_eq!(outcome.episodes_moved, 3);

    let alicia = Principal::new("alicia");
    assert_eq!(diary.list_episodes(&alicia, Page::all()).await.len(), 3);
    assert!(diary.list_episodes(&alice, Page::all()).await.is_empty());
    assert_eq!(diary.list_episodes(&bob, Page::all()).await.len(), 1);
    assert!(diary.authenticate("alicia", "secret1").await.is_some());
}

#[tokio::test]
async fn test_rename_to_taken_name_changes_nothing() {
    let (diary, dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    register_user(&diary, "bob").await;
    diary.record_episode(&alice, &episode_draft("1 min")).await.unwrap();
    let accounts = std::fs::read_to_string(dir.path().join("accounts.json")).unwrap();
    let episodes = std::fs::read_to_string(dir.path().join("episodes.json")).unwrap();

    let result = diary.rename_account(&alice, "BOB").await;
    assert!(matches!(result, Err(StoreError::DuplicateKey { field: "username", .. })));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("accounts.json")).unwrap(),
        accounts
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("episodes.json")).unwrap(),
        episodes
    );
}

#[tokio::test]
async fn test_rename_case_only_change() {
    let (diary, _dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;

    let outcome = diary.rename_account(&alice, "Alice").await.unwrap();
    assert_eq!(outcome.profile.username, "Alice");
}

#[tokio::test]
async fn test_rename_refuses_corrupt_episodes() {
    let (diary, dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    std::fs::write(dir.path().join("episodes.json"), "[oops").unwrap();
    let accounts = std::fs::read_to_string(dir.path().join("accounts.json")).unwrap();

    let result = diary.rename_account(&alice, "alicia").await;
    assert!(matches!(result, Err(StoreError::CorruptDocument { .. })));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("accounts.json")).unwrap(),
        accounts
    );
}

#[tokio::test]
async fn test_rename_restores_accounts_when_episode_write_fails() {
    let (diary, dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    diary.record_episode(&alice, &episode_draft("1 min")).await.unwrap();
    let accounts = std::fs::read_to_string(dir.path().join("accounts.json")).unwrap();
    let episodes = std::fs::read_to_string(dir.path().join("episodes.json")).unwrap();

    // The temp file path is taken, so persisting episodes fails.
    std::fs::create_dir(dir.path().join("episodes.json.tmp")).unwrap();

    let result = diary.rename_account(&alice, "alicia").await;
    assert!(matches!(result, Err(StoreError::StorageWrite { .. })));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("accounts.json")).unwrap(),
        accounts
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("episodes.json")).unwrap(),
        episodes
    );
    assert!(diary.authenticate("alice", "secret1").await.is_some());
    assert!(diary.authenticate("alicia", "secret1").await.is_none());
    assert_eq!(diary.list_episodes(&alice, Page::all()).await.len(), 1);
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_touch_last_seen() {
    let (diary, _dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    assert!(diary.profile(&alice).await.unwrap().last_seen_at.is_none());

    let profile = diary.touch_last_seen(&alice).await.unwrap();
    assert!(profile.last_seen_at.is_some());
    assert_eq!(diary.profile(&alice).await.unwrap().last_seen_at, profile.last_seen_at);
}

#[tokio::test]
async fn test_premium_is_idempotent() {
    let (diary, _dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;

    let (first, activated) = diary.activate_premium(&alice).await.unwrap();
    assert!(activated);
    assert_eq!(first.status, AccountStatus::Premium);

    let (second, activated) = diary.activate_premium(&alice).await.unwrap();
    assert!(!activated);
    assert_eq!(second.premium_since, first.premium_since);
}

#[tokio::test]
async fn test_avatar_set_and_clear() {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let (diary, _dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    let payload = STANDARD.encode(b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR");

    let profile = diary.set_avatar(&alice, "image/png", &payload).await.unwrap();
    assert_eq!(
        profile.avatar.as_deref(),
        Some(format!("data:image/png;base64,{payload}").as_str())
    );

    let profile = diary.clear_avatar(&alice).await.unwrap();
    assert!(profile.avatar.is_none());
}

#[tokio::test]
async fn test_avatar_rejects_oversize() {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let (diary, _dir) = create_test_diary();
    let alice = register_user(&diary, "alice").await;
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.resize(crate::tests::common::AVATAR_MAX_BYTES + 1, 0);

    let result = diary.set_avatar(&alice, "image/png", &STANDARD.encode(&bytes)).await;
    assert!(matches!(result, Err(StoreError::ValidationFailure(_))));
    assert!(diary.profile(&alice).await.unwrap().avatar.is_none());
}
