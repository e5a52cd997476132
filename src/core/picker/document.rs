//! Category documents: `{ "<category>": ["template", ...], ... }`.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use super::error::{PickerError, PickerResult};

/// A parsed category document. Categories keep the order they have in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CategoryDocument {
    categories: IndexMap<String, Vec<String>>,
}

impl CategoryDocument {
    /// Read and parse a document. Re-reads on every call; nothing is cached.
    pub async fn load(path: &Path) -> PickerResult<Self> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PickerError::not_found(format!(
                    "document {}",
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string())
                )));
            }
            Err(source) => {
                return Err(PickerError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        // Invalid UTF-8 surfaces here as a parse error, not an I/O one.
        serde_json::from_slice(&content).map_err(|source| PickerError::CorruptDocument {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Templates for a category; `NotFound` if the key is absent.
    pub fn templates(&self, category: &str) -> PickerResult<&[String]> {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .ok_or_else(|| PickerError::not_found(format!("category '{category}'")))
    }

    /// The first category in file order with its templates.
    pub fn first(&self) -> PickerResult<(&str, &[String])> {
        self.categories
            .first()
            .map(|(name, templates)| (name.as_str(), templates.as_slice()))
            .ok_or_else(|| PickerError::not_found("document has no categories"))
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}
