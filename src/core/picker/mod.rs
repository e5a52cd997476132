//! Response Picker
//!
//! Serves canned responses: loads a category document, draws one template
//! uniformly at random and, under the substituted policy, fills the money
//! placeholder with a random amount.
//!
//! ## Policies
//! - [`SubstitutionPolicy::Raw`]: template returned verbatim, placeholders intact
//! - [`SubstitutionPolicy::Substituted`]: every money token replaced by one
//!   integer drawn from the configured inclusive range
//!
//! Identity placeholders such as `{user}` are never touched; the caller fills them.

pub mod document;
pub mod error;

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ResponsesConfig;
use crate::core::input_validator::InputValidator;

pub use document::CategoryDocument;
pub use error::{PickerError, PickerResult};

/// How a drawn template is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionPolicy {
    #[default]
    Raw,
    Substituted,
}

impl SubstitutionPolicy {
    /// `true` selects [`SubstitutionPolicy::Substituted`].
    pub fn from_fill(fill: bool) -> Self {
        if fill {
            Self::Substituted
        } else {
            Self::Raw
        }
    }
}

/// A response drawn from the first category of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstCategoryPick {
    pub document: String,
    pub category: String,
    pub response: String,
}

/// Random response selector over a directory of category documents.
#[derive(Debug, Clone)]
pub struct ResponsePicker {
    dir: PathBuf,
    money_token: String,
    money_range: RangeInclusive<u32>,
    validator: InputValidator,
}

impl ResponsePicker {
    pub fn new(
        dir: impl Into<PathBuf>,
        money_token: impl Into<String>,
        money_range: RangeInclusive<u32>,
    ) -> Self {
        Self {
            dir: dir.into(),
            money_token: money_token.into(),
            money_range,
            validator: InputValidator::new(),
        }
    }

    pub fn from_config(config: &ResponsesConfig) -> Self {
        let (min, max) = if config.money_min <= config.money_max {
            (config.money_min, config.money_max)
        } else {
            log::warn!(
                "money_min {} exceeds money_max {}; swapping",
                config.money_min,
                config.money_max
            );
            (config.money_max, config.money_min)
        };
        Self::new(config.dir.clone(), config.money_token.clone(), min..=max)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn money_range(&self) -> &RangeInclusive<u32> {
        &self.money_range
    }

    /// Pick from `<category>.json`, key `<category>`.
    pub async fn pick(&self, category: &str, policy: SubstitutionPolicy) -> PickerResult<String> {
        self.pick_from(category, category, policy).await
    }

    /// Pick from an explicit document and category.
    pub async fn pick_from(
        &self,
        document: &str,
        category: &str,
        policy: SubstitutionPolicy,
    ) -> PickerResult<String> {
        let doc = self.load(document).await?;
        let templates = doc.templates(category)?;
        self.draw(category, templates, policy, &mut rand::thread_rng())
    }

    /// Pick from the first category of a document, in file order.
    pub async fn pick_first(
        &self,
        document: &str,
        policy: SubstitutionPolicy,
    ) -> PickerResult<FirstCategoryPick> {
        let file_name = self.validator.validate_document_name(document)?;
        let doc = CategoryDocument::load(&self.dir.join(&file_name)).await?;
        let (category, templates) = doc.first()?;
        let response = self.draw(category, templates, policy, &mut rand::thread_rng())?;

        Ok(FirstCategoryPick {
            document: file_name,
            category: category.to_string(),
            response,
        })
    }

    /// Same as [`pick_from`](Self::pick_from) with a caller-supplied RNG.
    pub async fn pick_with_rng<R: Rng>(
        &self,
        document: &str,
        category: &str,
        policy: SubstitutionPolicy,
        rng: &mut R,
    ) -> PickerResult<String> {
        let doc = self.load(document).await?;
        let templates = doc.templates(category)?;
        self.draw(category, templates, policy, rng)
    }

    async fn load(&self, document: &str) -> PickerResult<CategoryDocument> {
        let file_name = self.validator.validate_document_name(document)?;
        CategoryDocument::load(&self.dir.join(file_name)).await
    }

    /// Uniform draw plus policy application. Synchronous so no RNG is held
    /// across an await point.
    pub fn draw<R: Rng>(
        &self,
        category: &str,
        templates: &[String],
        policy: SubstitutionPolicy,
        rng: &mut R,
    ) -> PickerResult<String> {
        let template = templates
            .choose(rng)
            .ok_or_else(|| PickerError::EmptyCategory(category.to_string()))?;

        Ok(match policy {
            SubstitutionPolicy::Raw => template.clone(),
            SubstitutionPolicy::Substituted => {
                let amount = rng.gen_range(self.money_range.clone());
                template.replace(&self.money_token, &amount.to_string())
            }
        })
    }
}
