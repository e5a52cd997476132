//! Input Validator Module
//!
//! Validation for everything that reaches the stores or the filesystem from a
//! caller: usernames, emails, passwords, free text, episode dates and times,
//! and category document names.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} is required")]
    Empty(&'static str),

    #[error("{field} is too short (minimum {min} characters)")]
    TooShort { field: &'static str, min: usize },

    #[error("Invalid characters in {0}")]
    InvalidCharacters(&'static str),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Date '{0}' is in the future")]
    FutureDate(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: i64, max: i64 },

    #[error("Potential path traversal detected")]
    PathTraversal,

    #[error("Input contains null bytes")]
    NullByte,
}

pub type Result<T> = std::result::Result<T, ValidationError>;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid username regex"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
    })
}

// ============================================================================
// Input Validator
// ============================================================================

/// Field-level validation rules shared by the diary and the response picker.
#[derive(Debug, Clone)]
pub struct InputValidator {
    max_text_length: usize,
    min_username_length: usize,
    max_username_length: usize,
    min_password_length: usize,
}

impl InputValidator {
    pub fn new() -> Self {
        Self {
            max_text_length: 2_000,
            min_username_length: 3,
            max_username_length: 32,
            min_password_length: 6,
        }
    }

    /// Validate required free text; returns the trimmed value.
    pub fn validate_text(&self, field: &'static str, input: &str) -> Result<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty(field));
        }
        self.check_text(field, trimmed)?;
        Ok(trimmed.to_string())
    }

    /// Validate optional free text; blank input collapses to `None`.
    pub fn validate_optional_text(
        &self,
        field: &'static str,
        input: Option<&str>,
    ) -> Result<Option<String>> {
        match input.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => {
                self.check_text(field, value)?;
                Ok(Some(value.to_string()))
            }
        }
    }

    fn check_text(&self, field: &'static str, input: &str) -> Result<()> {
        if input.contains('\0') {
            return Err(ValidationError::NullByte);
        }
        if input.chars().count() > self.max_text_length {
            return Err(ValidationError::TooLong {
                field,
                max: self.max_text_length,
            });
        }
        Ok(())
    }

    /// Validate a username; returns the trimmed value with its case preserved.
    pub fn validate_username(&self, input: &str) -> Result<String> {
        let username = input.trim();
        if username.is_empty() {
            return Err(ValidationError::Empty("username"));
        }
        let len = username.chars().count();
        if len < self.min_username_length {
            return Err(ValidationError::TooShort {
                field: "username",
                min: self.min_username_length,
            });
        }
        if len > self.max_username_length {
            return Err(ValidationError::TooLong {
                field: "username",
                max: self.max_username_length,
            });
        }
        if !username_pattern().is_match(username) {
            return Err(ValidationError::InvalidCharacters("username"));
        }
        Ok(username.to_string())
    }

    /// Validate an email address; returns it trimmed and lowercased.
    pub fn validate_email(&self, input: &str) -> Result<String> {
        let email = input.trim();
        if email.is_empty() {
            return Err(ValidationError::Empty("email"));
        }
        if email.len() > 254 || !email_pattern().is_match(email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(email.to_lowercase())
    }

    pub fn validate_password(&self, input: &str) -> Result<()> {
        if input.is_empty() {
            return Err(ValidationError::Empty("password"));
        }
        if input.contains('\0') {
            return Err(ValidationError::NullByte);
        }
        if input.chars().count() < self.min_password_length {
            return Err(ValidationError::TooShort {
                field: "password",
                min: self.min_password_length,
            });
        }
        Ok(())
    }

    /// Validate an episode date (`YYYY-MM-DD`, not after `today`).
    pub fn validate_date(&self, input: &str, today: NaiveDate) -> Result<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty("date"));
        }
        let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))?;
        if date > today {
            return Err(ValidationError::FutureDate(trimmed.to_string()));
        }
        Ok(date.format(DATE_FORMAT).to_string())
    }

    /// Validate a time of day (`HH:MM`, 24-hour clock).
    pub fn validate_time(&self, input: &str) -> Result<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty("time"));
        }
        let time = NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
            .map_err(|_| ValidationError::InvalidTime(trimmed.to_string()))?;
        Ok(time.format(TIME_FORMAT).to_string())
    }

    pub fn validate_range(
        &self,
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    ) -> Result<()> {
        if value < min || value > max {
            return Err(ValidationError::OutOfRange { field, min, max });
        }
        Ok(())
    }

    /// Validate a category document name and normalize it to `<name>.json`.
    ///
    /// Only bare file names are accepted: no separators, no traversal.
    pub fn validate_document_name(&self, input: &str) -> Result<String> {
        let name = input.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("document"));
        }
        if name.contains('\0') {
            return Err(ValidationError::NullByte);
        }
        if self.detect_path_traversal(name) {
            return Err(ValidationError::PathTraversal);
        }
        if name.len() > 128 {
            return Err(ValidationError::TooLong {
                field: "document",
                max: 128,
            });
        }

        if name.ends_with(".json") {
            Ok(name.to_string())
        } else {
            Ok(format!("{name}.json"))
        }
    }

    /// Detect potential path traversal
    fn detect_path_traversal(&self, input: &str) -> bool {
        let patterns = ["..", "/", "\\", "%2e", "%2f", "%5c", "~"];

        let lower = input.to_lowercase();
        patterns.iter().any(|pattern| lower.contains(pattern))
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}
