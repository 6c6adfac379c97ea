use serde::Deserialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no identities given in `names`")]
    NoIdentities,
    #[error("no categories given in `niche`")]
    NoCategories,
    #[error("`domain` is empty")]
    EmptyDomain,
    #[error("failed to read job file {path}: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("job file {path} is malformed: {reason}")]
    Malformed { path: String, reason: String },
}

/// The job record as written by callers: comma separated `names` and `niche`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRecord {
    pub names: String,
    pub niche: String,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub identities: Vec<String>,
    pub categories: Vec<String>,
    pub target_domain: String,
}

impl RunConfig {
    pub fn parse(names: &str, niche: &str, domain: &str) -> Result<Self, ConfigError> {
        let identities = split_terms(names);
        let categories = split_terms(niche);
        let target_domain = domain.trim().to_string();

        match (identities.is_empty(), categories.is_empty(), target_domain.is_empty()) {
            (true, _, _) => Err(ConfigError::NoIdentities),
            (_, true, _) => Err(ConfigError::NoCategories),
            (_, _, true) => Err(ConfigError::EmptyDomain),
            _ => Ok(RunConfig {
                identities,
                categories,
                target_domain,
            }),
        }
    }

    pub fn combinations(&self) -> usize {
        self.identities.len() * self.categories.len()
    }
}

impl TryFrom<&JobRecord> for RunConfig {
    type Error = ConfigError;

    fn try_from(job: &JobRecord) -> Result<Self, Self::Error> {
        RunConfig::parse(&job.names, &job.niche, &job.domain)
    }
}

fn split_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, JobRecord, RunConfig};

    #[test]
    fn parse_splits_and_trims() {
        let config = RunConfig::parse("Alice, Bob ,  Carol", "bakery, cake shop", " example.com ")
            .unwrap();

        assert_eq!(config.identities, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(config.categories, vec!["bakery", "cake shop"]);
        assert_eq!(config.target_domain, "example.com");
        assert_eq!(config.combinations(), 6);
    }

    #[test]
    fn parse_drops_empty_terms() {
        let config = RunConfig::parse("Alice,, ,Bob,", "bakery", "example.com").unwrap();

        assert_eq!(config.identities, vec!["Alice", "Bob"]);
    }

    #[test]
    fn parse_rejects_missing_parts() {
        assert_eq!(
            RunConfig::parse(" , ", "bakery", "example.com"),
            Err(ConfigError::NoIdentities)
        );
        assert_eq!(
            RunConfig::parse("Alice", "", "example.com"),
            Err(ConfigError::NoCategories)
        );
        assert_eq!(
            RunConfig::parse("Alice", "bakery", "  "),
            Err(ConfigError::EmptyDomain)
        );
    }

    #[test]
    fn job_record_from_json() {
        let job: JobRecord = serde_json::from_str(
            r#"{"names": "Alice, Bob", "niche": "bakery", "domain": "example.com"}"#,
        )
        .unwrap();
        let config = RunConfig::try_from(&job).unwrap();

        assert_eq!(config.identities, vec!["Alice", "Bob"]);
        assert_eq!(config.categories, vec!["bakery"]);
    }
}
