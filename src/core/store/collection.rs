//! Whole-file JSON collections.
//!
//! A collection is one JSON array on disk. Every operation loads the entire
//! array, works on it in memory and, for writes, persists the entire array
//! back. One async mutex per collection serializes those cycles, so two
//! concurrent writers in this process never lose each other's update.
//! Separate processes sharing a file are not coordinated.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, MutexGuard};

use super::error::{StoreError, StoreResult};
use super::ids::{IdGenerator, Identity};
use super::record::{Page, Record};

/// A named, file-backed collection of records.
#[derive(Debug)]
pub struct JsonCollection<T: Record> {
    name: String,
    path: PathBuf,
    lock: Mutex<()>,
    ids: IdGenerator,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> JsonCollection<T> {
    /// Collection `name` backed by `<dir>/<name>.json`. The file is created on
    /// first write.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Self {
        let path = dir.as_ref().join(format!("{name}.json"));
        log::debug!("Opened {} collection '{}' at {:?}", T::KIND, name, path);
        Self {
            name: name.to_string(),
            path,
            lock: Mutex::new(()),
            ids: IdGenerator::new(),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the collection lock for a multi-step or multi-collection update.
    pub async fn lock(&self) -> CollectionGuard<'_, T> {
        CollectionGuard {
            collection: self,
            _guard: self.lock.lock().await,
        }
    }

    /// All records, degrading to empty when the file is missing or corrupt.
    pub async fn read_all(&self) -> Vec<T> {
        self.lock().await.load().await
    }

    /// Assign a fresh id and timestamp, append, persist.
    pub async fn append(&self, record: T) -> StoreResult<T> {
        self.append_checked(record, |_, _| Ok(())).await
    }

    /// Like [`append`](Self::append), running `check` against the current
    /// records under the same lock first. A failing check leaves the file
    /// untouched.
    pub async fn append_checked<F>(&self, mut record: T, check: F) -> StoreResult<T>
    where
        F: FnOnce(&[T], &T) -> StoreResult<()> + Send,
    {
        let guard = self.lock().await;
        let mut records = guard.load_strict().await?;

        check(&records, &record)?;

        let identity = guard.next_identity(&records);
        record.assign_identity(identity.id, identity.timestamp);
        records.push(record.clone());

        guard.persist(&records).await?;
        log::info!(
            "Appended {} {} for '{}' to {}",
            T::KIND,
            record.id(),
            record.owner(),
            self.name
        );
        Ok(record)
    }

    /// Records owned by `owner`, newest first, windowed by `page`.
    ///
    /// Ties on timestamp keep insertion order (stable sort).
    pub async fn list_by_owner(&self, owner: &str, page: Page) -> Vec<T> {
        let mut matching: Vec<T> = self
            .read_all()
            .await
            .into_iter()
            .filter(|record| record.owner() == owner)
            .collect();

        matching.sort_by(|a, b| b.timestamp().cmp(a.timestamp()));
        page.apply(matching)
    }

    pub async fn count_by_owner(&self, owner: &str) -> usize {
        self.read_all()
            .await
            .iter()
            .filter(|record| record.owner() == owner)
            .count()
    }

    /// Remove the record matching both `id` and `owner`.
    ///
    /// Returns `false` (and writes nothing) when no such record exists, which
    /// includes a matching id owned by someone else.
    pub async fn delete(&self, id: &str, owner: &str) -> StoreResult<bool> {
        let guard = self.lock().await;
        let mut records = guard.load_strict().await?;

        let before = records.len();
        records.retain(|record| !(record.id() == id && record.owner() == owner));
        if records.len() == before {
            log::debug!("No {} {} owned by '{}' in {}", T::KIND, id, owner, self.name);
            return Ok(false);
        }

        guard.persist(&records).await?;
        log::info!("Deleted {} {} owned by '{}' from {}", T::KIND, id, owner, self.name);
        Ok(true)
    }

    /// Apply `mutate` to the first record matching `predicate` and persist.
    ///
    /// Returns the updated record, or `None` if nothing matched.
    pub async fn update_first<P, M>(&self, predicate: P, mutate: M) -> StoreResult<Option<T>>
    where
        P: Fn(&T) -> bool + Send,
        M: FnOnce(&mut T) -> StoreResult<()> + Send,
    {
        let guard = self.lock().await;
        let mut records = guard.load_strict().await?;

        let Some(record) = records.iter_mut().find(|record| predicate(record)) else {
            return Ok(None);
        };
        mutate(record)?;
        let updated = record.clone();

        guard.persist(&records).await?;
        log::debug!("Updated {} {} in {}", T::KIND, updated.id(), self.name);
        Ok(Some(updated))
    }

    /// Apply `mutate` to every record matching `predicate` and persist.
    ///
    /// Returns how many records changed; nothing is written when none match.
    pub async fn update_where<P, M>(&self, predicate: P, mut mutate: M) -> StoreResult<usize>
    where
        P: Fn(&T) -> bool + Send,
        M: FnMut(&mut T) + Send,
    {
        let guard = self.lock().await;
        let mut records = guard.load_strict().await?;

        let mut changed = 0;
        for record in records.iter_mut().filter(|record| predicate(record)) {
            mutate(record);
            changed += 1;
        }

        if changed > 0 {
            guard.persist(&records).await?;
            log::debug!("Updated {} {} records in {}", changed, T::KIND, self.name);
        }
        Ok(changed)
    }

    /// Set one top-level field on the first record matching `predicate`.
    ///
    /// Identity fields are immutable, and the value must fit the record
    /// schema; both failures are `ValidationFailure`.
    pub async fn update_field<P>(
        &self,
        predicate: P,
        field: &str,
        value: serde_json::Value,
    ) -> StoreResult<Option<T>>
    where
        P: Fn(&T) -> bool + Send,
    {
        if T::IMMUTABLE_FIELDS.contains(&field) {
            return Err(StoreError::validation(format!(
                "{} field '{}' is immutable",
                T::KIND,
                field
            )));
        }

        self.update_first(predicate, |record| set_field(record, field, value))
            .await
    }

    /// First record whose `field` equals `value`, optionally ignoring case.
    pub async fn find_unique(&self, field: &str, value: &str, case_insensitive: bool) -> Option<T> {
        self.read_all()
            .await
            .into_iter()
            .find(|record| field_matches(record, field, value, case_insensitive))
    }
}

/// Whether `record.field` equals `value` under the requested case rule.
pub fn field_matches<T: Record>(
    record: &T,
    field: &str,
    value: &str,
    case_insensitive: bool,
) -> bool {
    match record.field(field) {
        Some(current) if case_insensitive => current.to_lowercase() == value.to_lowercase(),
        Some(current) => current == value,
        None => false,
    }
}

fn set_field<T: Record>(record: &mut T, field: &str, value: serde_json::Value) -> StoreResult<()> {
    let mut object = serde_json::to_value(&*record)?;
    let map = object
        .as_object_mut()
        .ok_or_else(|| StoreError::validation(format!("{} is not a JSON object", T::KIND)))?;
    // Schema fields, plus extra fields the record already carries.
    if !T::FIELDS.contains(&field) && !map.contains_key(field) {
        return Err(StoreError::validation(format!(
            "{} has no field '{}'",
            T::KIND,
            field
        )));
    }
    map.insert(field.to_string(), value.clone());

    let updated: T = serde_json::from_value(object)
        .map_err(|e| StoreError::validation(format!("invalid value for '{field}': {e}")))?;

    // Coercions (a number into a string field, say) do not round trip.
    let stored = serde_json::to_value(&updated)?
        .get(field)
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    if stored != value {
        return Err(StoreError::validation(format!(
            "{} has no field '{}'",
            T::KIND,
            field
        )));
    }

    *record = updated;
    Ok(())
}

/// Exclusive access to a collection's backing file.
pub struct CollectionGuard<'a, T: Record> {
    collection: &'a JsonCollection<T>,
    _guard: MutexGuard<'a, ()>,
}

impl<'a, T: Record> CollectionGuard<'a, T> {
    /// Load for reading: missing or corrupt files yield an empty list.
    pub async fn load(&self) -> Vec<T> {
        match self.load_strict().await {
            Ok(records) => records,
            Err(e) => {
                log::warn!(
                    "Reading {} as empty: {}",
                    self.collection.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Load for writing: a missing or blank file is empty, a corrupt or
    /// unreadable one is an error so it is never overwritten.
    pub async fn load_strict(&self) -> StoreResult<Vec<T>> {
        let path = &self.collection.path;
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::StorageRead {
                    path: path.clone(),
                    source,
                })
            }
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&content).map_err(|e| StoreError::CorruptDocument {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    /// Replace the backing file with `records`.
    ///
    /// Writes a sibling temp file and renames it into place so readers never
    /// observe a half-written array.
    pub async fn persist(&self, records: &[T]) -> StoreResult<()> {
        let path = &self.collection.path;
        let write_err = |source| StoreError::StorageWrite {
            path: path.clone(),
            source,
        };

        let content = serde_json::to_string_pretty(records)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, content).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
        Ok(())
    }

    /// Fresh identity that no record in `records` already uses.
    pub fn next_identity(&self, records: &[T]) -> Identity {
        self.collection
            .ids
            .next_unused(|id| records.iter().any(|record| record.id() == id))
    }
}
