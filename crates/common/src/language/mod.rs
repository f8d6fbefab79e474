//! Wikipedia language editions and run requests
//!
//! Language codes arrive either bare (`he`) or as catalog labels such as
//! `Hebrew (he)`; both forms are accepted and validated here.

use crate::errors::{AppError, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use validator::{Validate, ValidationError};

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z]{2,8}(-[a-z0-9]{1,8})*$").expect("language code pattern is valid")
    })
}

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(([^()]*)\)").expect("label pattern is valid"))
}

/// A validated Wikipedia language edition code (`en`, `he`, `zh-min-nan`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse a bare language code
    pub fn parse(code: &str) -> Result<Self> {
        let normalized = code.trim().to_ascii_lowercase();
        if code_pattern().is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(AppError::InvalidLanguage {
                code: code.to_string(),
            })
        }
    }

    /// Extract the code from a catalog label like `Hebrew (he)`.
    ///
    /// Labels without parentheses are parsed as a bare code.
    pub fn from_label(label: &str) -> Result<Self> {
        match label_pattern().captures(label) {
            Some(caps) => Self::parse(caps.get(1).map_or("", |m| m.as_str())),
            None => Self::parse(label),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Entry of the supported-language catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Language {
    /// Label in the `Name (code)` form used by the language pickers
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

/// Case-insensitive filter on name or code, preserving catalog order
pub fn filter_languages<'a>(languages: &'a [Language], query: &str) -> Vec<&'a Language> {
    let query = query.trim().to_lowercase();
    languages
        .iter()
        .filter(|lang| {
            lang.name.to_lowercase().contains(&query) || lang.code.to_lowercase().contains(&query)
        })
        .collect()
}

/// Whether `code` names an edition in the catalog
pub fn is_supported(languages: &[Language], code: &LanguageCode) -> bool {
    languages
        .iter()
        .any(|lang| lang.code.eq_ignore_ascii_case(code.as_str()))
}

fn validate_category_title(category: &str) -> std::result::Result<(), ValidationError> {
    // Characters MediaWiki never allows in a page title
    if category.chars().any(|c| "#<>[]|{}".contains(c)) {
        let mut err = ValidationError::new("illegal_title_character");
        err.message = Some("category contains characters not allowed in page titles".into());
        return Err(err);
    }
    Ok(())
}

/// One ranking run: find `category` pages of `reference_lang` missing from `target_lang`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RunRequest {
    /// Edition being checked for the articles' absence
    pub target_lang: LanguageCode,

    /// Category in the reference edition
    #[validate(
        length(min = 1, max = 255, message = "category must not be empty"),
        custom(function = "validate_category_title")
    )]
    pub category: String,

    /// Edition known to contain the articles
    pub reference_lang: LanguageCode,
}

impl RunRequest {
    /// Build and validate a request from raw inputs (bare codes or labels)
    pub fn new(target_lang: &str, category: &str, reference_lang: &str) -> Result<Self> {
        let request = Self {
            target_lang: LanguageCode::from_label(target_lang)?,
            category: category.trim().to_string(),
            reference_lang: LanguageCode::from_label(reference_lang)?,
        };
        request.check()?;
        Ok(request)
    }

    /// Validate an already-built request
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if self.target_lang == self.reference_lang {
            return Err(AppError::SameLanguage {
                code: self.target_lang.to_string(),
            });
        }
        Ok(())
    }
}
