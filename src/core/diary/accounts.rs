//! Account records and the account collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::store::{
    field_matches, now_timestamp, JsonCollection, Record, StoreError, StoreResult,
};

/// A stored account.
///
/// `password_hash` holds a one-way hash; the raw password is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    #[serde(default)]
    pub last_seen_at: Option<String>,
    /// Embedded `data:` URL, or `None`.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub premium_since: Option<String>,
    /// Fields written by other tools, kept on rewrite.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountRecord {
    /// Unsaved account; the store assigns `id` and `created_at` on append.
    pub fn draft(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: String,
    ) -> Self {
        Self {
            id: String::new(),
            username: username.into(),
            email: email.into(),
            password_hash,
            created_at: String::new(),
            last_seen_at: None,
            avatar: None,
            is_premium: false,
            premium_since: None,
            extra: Map::new(),
        }
    }

    pub fn status(&self) -> AccountStatus {
        if self.is_premium {
            AccountStatus::Premium
        } else {
            AccountStatus::Registered
        }
    }

    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at.clone(),
            last_seen_at: self.last_seen_at.clone(),
            avatar: self.avatar.clone(),
            status: self.status(),
            premium_since: self.premium_since.clone(),
        }
    }
}

impl Record for AccountRecord {
    const KIND: &'static str = "account";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "username",
        "email",
        "password_hash",
        "created_at",
        "last_seen_at",
        "avatar",
        "is_premium",
        "premium_since",
    ];
    const IMMUTABLE_FIELDS: &'static [&'static str] = &["id", "created_at"];

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> &str {
        &self.created_at
    }

    fn owner(&self) -> &str {
        &self.username
    }

    fn assign_identity(&mut self, id: String, timestamp: String) {
        self.id = id;
        self.created_at = timestamp;
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "id" => Some(&self.id),
            "username" => Some(&self.username),
            "email" => Some(&self.email),
            "created_at" => Some(&self.created_at),
            "last_seen_at" => self.last_seen_at.as_deref(),
            "premium_since" => self.premium_since.as_deref(),
            other => self.extra.get(other).and_then(Value::as_str),
        }
    }
}

/// Account lifecycle. Only moves forward: `Registered -> Premium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Registered,
    Premium,
}

/// Public view of an account (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub last_seen_at: Option<String>,
    pub avatar: Option<String>,
    pub status: AccountStatus,
    pub premium_since: Option<String>,
}

/// Reject `candidate` if its username or email is already taken,
/// ignoring case. `skip_id` exempts one account (itself, on rename).
pub fn ensure_unique(
    accounts: &[AccountRecord],
    username: Option<&str>,
    email: Option<&str>,
    skip_id: Option<&str>,
) -> StoreResult<()> {
    let others = accounts
        .iter()
        .filter(|account| skip_id.map_or(true, |id| account.id != id));

    for account in others {
        if let Some(username) = username {
            if field_matches(account, "username", username, true) {
                return Err(StoreError::duplicate("username", username));
            }
        }
        if let Some(email) = email {
            if field_matches(account, "email", email, true) {
                return Err(StoreError::duplicate("email", email));
            }
        }
    }
    Ok(())
}

/// The account collection.
#[derive(Debug)]
pub struct AccountStore {
    collection: JsonCollection<AccountRecord>,
}

impl AccountStore {
    pub const COLLECTION: &'static str = "accounts";

    pub fn open(data_dir: impl AsRef<std::path::Path>) -> Self {
        Self {
            collection: JsonCollection::open(data_dir, Self::COLLECTION),
        }
    }

    pub fn collection(&self) -> &JsonCollection<AccountRecord> {
        &self.collection
    }

    /// Append a new account after checking username and email uniqueness
    /// under the collection lock.
    pub async fn insert(&self, account: AccountRecord) -> StoreResult<AccountRecord> {
        self.collection
            .append_checked(account, |existing, candidate| {
                ensure_unique(
                    existing,
                    Some(&candidate.username),
                    Some(&candidate.email),
                    None,
                )
            })
            .await
    }

    pub async fn find_by_username(&self, username: &str) -> Option<AccountRecord> {
        self.collection.find_unique("username", username, true).await
    }

    /// Look up by username or email, ignoring case.
    pub async fn find_by_login(&self, login: &str) -> Option<AccountRecord> {
        let accounts = self.collection.read_all().await;
        accounts.into_iter().find(|account| {
            field_matches(account, "username", login, true)
                || field_matches(account, "email", login, true)
        })
    }

    pub async fn touch_last_seen(&self, username: &str) -> StoreResult<AccountRecord> {
        let now = serde_json::Value::String(now_timestamp());
        self.collection
            .update_field(
                |account| account.username == username,
                "last_seen_at",
                now,
            )
            .await?
            .ok_or_else(|| StoreError::not_found(format!("account '{username}'")))
    }

    pub async fn set_avatar(
        &self,
        username: &str,
        avatar: Option<String>,
    ) -> StoreResult<AccountRecord> {
        let value = avatar.map_or(serde_json::Value::Null, serde_json::Value::String);
        self.collection
            .update_field(|account| account.username == username, "avatar", value)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("account '{username}'")))
    }

    /// Move the account to premium. Returns the account and whether this call
    /// made the change; an already-premium account keeps its original
    /// `premium_since`.
    pub async fn activate_premium(&self, username: &str) -> StoreResult<(AccountRecord, bool)> {
        let mut activated = false;
        let account = self
            .collection
            .update_first(
                |account| account.username == username,
                |account| {
                    if !account.is_premium {
                        account.is_premium = true;
                        account.premium_since = Some(now_timestamp());
                        activated = true;
                    }
                    Ok(())
                },
            )
            .await?
            .ok_or_else(|| StoreError::not_found(format!("account '{username}'")))?;
        Ok((account, activated))
    }
}
