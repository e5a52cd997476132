//! Test Fixtures
//!
//! Temp-dir backed diary services, response pickers and routers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tempfile::TempDir;

use crate::core::diary::{DiaryService, EpisodeDraft, Principal};
use crate::core::picker::ResponsePicker;
use crate::core::security::{CredentialHasher, HashCost};
use crate::server::{self, AppState, SessionRegistry};

pub const MONEY_TOKEN: &str = "{dinero}";
pub const AVATAR_MAX_BYTES: usize = 4096;

// =============================================================================
// Diary Fixtures
// =============================================================================

/// Diary over a fresh temp dir. Keep the `TempDir` alive for the test.
pub fn create_test_diary() -> (DiaryService, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let diary = diary_in(temp_dir.path());
    (diary, temp_dir)
}

/// Diary over an existing directory, with the cheapest hash cost.
pub fn diary_in(dir: &Path) -> DiaryService {
    let hasher = CredentialHasher::new(HashCost::MINIMAL).expect("Failed to build hasher");
    DiaryService::new(dir, hasher, AVATAR_MAX_BYTES)
}

/// Register `username` with a derived email and password `secret1`.
pub async fn register_user(diary: &DiaryService, username: &str) -> Principal {
    let profile = diary
        .register(username, &format!("{username}@example.com"), "secret1")
        .await
        .expect("Failed to register test user");
    Principal::new(profile.username)
}

/// A valid episode draft dated in the past.
pub fn episode_draft(duration: &str) -> EpisodeDraft {
    EpisodeDraft {
        date: "2025-03-01".to_string(),
        time: "08:30".to_string(),
        duration: duration.to_string(),
        ..EpisodeDraft::default()
    }
}

// =============================================================================
// Picker Fixtures
// =============================================================================

/// Write category documents into a temp dir: `(file stem, json body)`.
pub fn create_response_dir(documents: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    for (name, body) in documents {
        std::fs::write(temp_dir.path().join(format!("{name}.json")), body)
            .expect("Failed to write category document");
    }
    temp_dir
}

pub fn picker_in(dir: &Path) -> ResponsePicker {
    ResponsePicker::new(dir, MONEY_TOKEN, 50..=500)
}

// =============================================================================
// Server Fixtures
// =============================================================================

/// Everything an HTTP test needs; both temp dirs live as long as this.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub data_dir: TempDir,
    pub responses_dir: TempDir,
}

pub fn create_test_app(documents: &[(&str, &str)], commands: &[&str]) -> TestApp {
    let data_dir = TempDir::new().expect("Failed to create temp directory");
    let responses_dir = create_response_dir(documents);

    let state = Arc::new(AppState::new(
        picker_in(responses_dir.path()),
        diary_in(data_dir.path()),
        SessionRegistry::new(Duration::from_secs(3600)),
        commands.iter().map(|c| c.to_string()).collect(),
        2,
    ));

    TestApp {
        router: server::router(state.clone()),
        state,
        data_dir,
        responses_dir,
    }
}
