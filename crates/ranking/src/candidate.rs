use serde::{Deserialize, Serialize};
use wikigap_common::LanguageCode;

/// An article title proposed as potentially missing from the target edition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Page title in the reference edition
    pub title: String,

    /// Edition the title was discovered in
    pub reference_lang: LanguageCode,

    /// Position in the resolver's article list; final tie-breaker when ranking
    pub discovery_index: usize,
}

impl Candidate {
    pub fn new(
        title: impl Into<String>,
        reference_lang: LanguageCode,
        discovery_index: usize,
    ) -> Self {
        Self {
            title: title.into(),
            reference_lang,
            discovery_index,
        }
    }
}
