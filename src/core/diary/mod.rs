//! Personal episode diary.
//!
//! Accounts and episodes live in two JSON collections under the data
//! directory. Every operation that acts on behalf of a user takes the
//! authenticated [`Principal`] explicitly; nothing reads a logged-in user
//! from ambient state.
//!
//! ## Lock order
//! Operations touching both collections (rename, recording an episode) lock
//! accounts first, then episodes.

pub mod accounts;
pub mod avatar;
pub mod episodes;

use std::path::Path;

use serde::Serialize;

use crate::config::AppConfig;
use crate::core::input_validator::InputValidator;
use crate::core::security::CredentialHasher;
use crate::core::store::{Page, StoreError, StoreResult};

pub use accounts::{AccountProfile, AccountRecord, AccountStatus, AccountStore};
pub use episodes::{EpisodeDetails, EpisodeDraft, EpisodeRecord, EpisodeStore, EpisodeSummary};

/// The authenticated user an operation runs for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    username: String,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Result of a username change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub profile: AccountProfile,
    pub previous_username: String,
    pub episodes_moved: usize,
}

/// Account and episode operations over the two collections.
#[derive(Debug)]
pub struct DiaryService {
    accounts: AccountStore,
    episodes: EpisodeStore,
    hasher: CredentialHasher,
    validator: InputValidator,
    avatar_max_bytes: usize,
}

impl DiaryService {
    pub fn new(
        data_dir: impl AsRef<Path>,
        hasher: CredentialHasher,
        avatar_max_bytes: usize,
    ) -> Self {
        let data_dir = data_dir.as_ref();
        log::info!("Diary collections under {}", data_dir.display());
        Self {
            accounts: AccountStore::open(data_dir),
            episodes: EpisodeStore::open(data_dir),
            hasher,
            validator: InputValidator::new(),
            avatar_max_bytes,
        }
    }

    pub fn from_config(config: &AppConfig) -> StoreResult<Self> {
        let hasher = CredentialHasher::from_config(&config.accounts)?;
        Ok(Self::new(
            config.data_dir(),
            hasher,
            config.accounts.avatar_max_bytes,
        ))
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn episodes(&self) -> &EpisodeStore {
        &self.episodes
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Create an account. Username and email must be unused, ignoring case.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> StoreResult<AccountProfile> {
        let username = self.validator.validate_username(username)?;
        let email = self.validator.validate_email(email)?;
        self.validator.validate_password(password)?;

        // Fail fast before paying for a hash; insert re-checks under the lock.
        if self.accounts.find_by_username(&username).await.is_some() {
            return Err(StoreError::duplicate("username", username));
        }

        let password_hash = self.hash_password(password).await?;
        let account = self
            .accounts
            .insert(AccountRecord::draft(username, email, password_hash))
            .await?;

        log::info!("Registered account '{}'", account.username);
        Ok(account.profile())
    }

    /// Check credentials. `login` is a username or an email, ignoring case.
    pub async fn authenticate(&self, login: &str, password: &str) -> Option<AccountProfile> {
        let login = login.trim();
        let Some(account) = self.accounts.find_by_login(login).await else {
            log::info!("Login failed: no account for '{}'", login);
            return None;
        };

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let stored = account.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .unwrap_or(false);

        if verified {
            log::info!("Login succeeded for '{}'", account.username);
            Some(account.profile())
        } else {
            log::info!("Login failed: bad password for '{}'", account.username);
            None
        }
    }

    pub async fn profile(&self, principal: &Principal) -> StoreResult<AccountProfile> {
        self.account(principal).await.map(|account| account.profile())
    }

    /// Record that the user viewed their panel.
    pub async fn touch_last_seen(&self, principal: &Principal) -> StoreResult<AccountProfile> {
        self.accounts
            .touch_last_seen(principal.username())
            .await
            .map(|account| account.profile())
    }

    /// Change the username and move every episode to the new owner name.
    ///
    /// Both collections are updated under their locks. If the episode write
    /// fails the previous account file is restored.
    pub async fn rename_account(
        &self,
        principal: &Principal,
        new_username: &str,
    ) -> StoreResult<RenameOutcome> {
        let new_username = self.validator.validate_username(new_username)?;
        let old_username = principal.username().to_string();

        let accounts_guard = self.accounts.collection().lock().await;
        let original_accounts = accounts_guard.load_strict().await?;
        let mut accounts = original_accounts.clone();

        let index = accounts
            .iter()
            .position(|account| account.username == old_username)
            .ok_or_else(|| StoreError::not_found(format!("account '{old_username}'")))?;

        if accounts[index].username == new_username {
            return Ok(RenameOutcome {
                profile: accounts[index].profile(),
                previous_username: old_username,
                episodes_moved: 0,
            });
        }

        let account_id = accounts[index].id.clone();
        accounts::ensure_unique(&accounts, Some(&new_username), None, Some(&account_id))?;
        accounts[index].username = new_username.clone();

        let episodes_guard = self.episodes.collection().lock().await;
        let mut episodes = episodes_guard.load_strict().await?;
        let mut moved = 0;
        for episode in episodes.iter_mut().filter(|e| e.owner == old_username) {
            episode.owner = new_username.clone();
            moved += 1;
        }

        accounts_guard.persist(&accounts).await?;
        if let Err(e) = episodes_guard.persist(&episodes).await {
            log::error!(
                "Rename '{}' -> '{}' failed writing episodes, restoring accounts: {}",
                old_username,
                new_username,
                e
            );
            if let Err(restore_err) = accounts_guard.persist(&original_accounts).await {
                log::error!("Restoring accounts failed: {}", restore_err);
            }
            return Err(e);
        }

        log::info!(
            "Renamed account '{}' -> '{}' ({} episodes moved)",
            old_username,
            new_username,
            moved
        );
        Ok(RenameOutcome {
            profile: accounts[index].profile(),
            previous_username: old_username,
            episodes_moved: moved,
        })
    }

    pub async fn set_avatar(
        &self,
        principal: &Principal,
        content_type: &str,
        base64_payload: &str,
    ) -> StoreResult<AccountProfile> {
        let data_url = avatar::encode_avatar(content_type, base64_payload, self.avatar_max_bytes)?;
        let account = self
            .accounts
            .set_avatar(principal.username(), Some(data_url))
            .await?;
        log::info!("Updated avatar for '{}'", account.username);
        Ok(account.profile())
    }

    pub async fn clear_avatar(&self, principal: &Principal) -> StoreResult<AccountProfile> {
        let account = self.accounts.set_avatar(principal.username(), None).await?;
        log::info!("Removed avatar for '{}'", account.username);
        Ok(account.profile())
    }

    /// Upgrade to premium. Idempotent; the flag is never cleared.
    pub async fn activate_premium(
        &self,
        principal: &Principal,
    ) -> StoreResult<(AccountProfile, bool)> {
        let (account, activated) = self.accounts.activate_premium(principal.username()).await?;
        if activated {
            log::info!("Premium activated for '{}'", account.username);
        }
        Ok((account.profile(), activated))
    }

    // ========================================================================
    // Episodes
    // ========================================================================

    pub async fn record_episode(
        &self,
        principal: &Principal,
        draft: &EpisodeDraft,
    ) -> StoreResult<EpisodeRecord> {
        let today = chrono::Local::now().date_naive();
        let details = draft.validate(&self.validator, today)?;

        // The accounts lock stays held across the append so a concurrent
        // rename cannot move the owner between the check and the write.
        let accounts_guard = self.accounts.collection().lock().await;
        let accounts = accounts_guard.load_strict().await?;
        if !accounts
            .iter()
            .any(|account| account.username == principal.username())
        {
            return Err(StoreError::not_found(format!(
                "account '{}'",
                principal.username()
            )));
        }

        let record = self.episodes.append(principal.username(), details).await?;
        drop(accounts_guard);
        Ok(record)
    }

    /// The principal's episodes, newest first.
    pub async fn list_episodes(&self, principal: &Principal, page: Page) -> Vec<EpisodeRecord> {
        self.episodes.list(principal.username(), page).await
    }

    /// Delete one of the principal's episodes. Episodes owned by anyone else
    /// are never touched, whatever the id.
    pub async fn delete_episode(&self, principal: &Principal, id: &str) -> StoreResult<bool> {
        self.episodes.delete(id, principal.username()).await
    }

    pub async fn episode_summary(&self, principal: &Principal) -> EpisodeSummary {
        self.episodes.summary(principal.username()).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn account(&self, principal: &Principal) -> StoreResult<AccountRecord> {
        self.accounts
            .collection()
            .read_all()
            .await
            .into_iter()
            .find(|account| account.username == principal.username())
            .ok_or_else(|| StoreError::not_found(format!("account '{}'", principal.username())))
    }

    async fn hash_password(&self, password: &str) -> StoreResult<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| StoreError::Hashing(e.to_string()))?
    }
}
