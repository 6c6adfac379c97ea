use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

pub const DEFAULT_EMAIL_SUFFIX: &str = "gmail.com";

/// Scans page text for addresses hosted on one fixed provider suffix.
///
/// The suffix is the mail provider (e.g. `gmail.com`), not the business domain
/// used as a search keyword.
#[derive(Debug, Clone)]
pub struct EmailExtractor {
    suffix: String,
    pattern: Regex,
}

impl EmailExtractor {
    pub fn new(suffix: &str) -> Result<Self, regex::Error> {
        let suffix = suffix.trim().trim_start_matches('@').to_lowercase();
        let pattern = RegexBuilder::new(&format!(
            r"\b[A-Za-z0-9._%+-]+@{}\b",
            regex::escape(&suffix)
        ))
        .case_insensitive(true)
        .build()?;

        Ok(EmailExtractor { suffix, pattern })
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Addresses are lowercased so `A@GMAIL.com` and `a@gmail.com` collapse.
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }
}
