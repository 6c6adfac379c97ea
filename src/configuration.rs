use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::run_config::{ConfigError, JobRecord, RunConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub webdriver: WebDriverSettings,
    pub harvest: HarvestSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebDriverSettings {
    pub server_url: String,
    pub headless: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub window_width: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub window_height: u32,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarvestSettings {
    pub search_url: String,
    pub email_suffix: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_budget: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub request_delay_millis: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub consent_timeout_millis: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub results_timeout_millis: u64,
    pub output_dir: PathBuf,
    pub job_file: PathBuf,
}

impl HarvestSettings {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_millis)
    }

    pub fn consent_timeout(&self) -> Duration {
        Duration::from_millis(self.consent_timeout_millis)
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_millis(self.results_timeout_millis)
    }
}

impl Default for HarvestSettings {
    fn default() -> Self {
        HarvestSettings {
            search_url: "https://www.google.com/search".to_string(),
            email_suffix: crate::domain::email::DEFAULT_EMAIL_SUFFIX.to_string(),
            page_budget: 5,
            request_delay_millis: 2_000,
            consent_timeout_millis: 5_000,
            results_timeout_millis: 10_000,
            output_dir: PathBuf::from("."),
            job_file: PathBuf::from("config.json"),
        }
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // e.g. `APP_HARVEST__PAGE_BUDGET=3` sets `Settings.harvest.page_budget`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub fn load_job(path: &std::path::Path) -> Result<RunConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let job: JobRecord = serde_json::from_str(&raw).map_err(|e| ConfigError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    RunConfig::try_from(&job)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{load_job, Environment, HarvestSettings};
    use crate::domain::run_config::ConfigError;

    #[test]
    fn environment_parsing() {
        assert!(matches!(
            Environment::try_from("Production".to_string()),
            Ok(Environment::Production)
        ));
        assert!(Environment::try_from("staging".to_string()).is_err());
    }

    #[test]
    fn default_harvest_pacing() {
        let settings = HarvestSettings::default();

        assert_eq!(settings.page_budget, 5);
        assert_eq!(settings.request_delay().as_secs(), 2);
        assert_eq!(settings.consent_timeout().as_secs(), 5);
        assert_eq!(settings.results_timeout().as_secs(), 10);
    }

    #[test]
    fn load_job_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"names": "Alice, Bob", "niche": "bakery", "domain": "example.com"}}"#
        )
        .unwrap();

        let config = load_job(file.path()).unwrap();

        assert_eq!(config.identities, vec!["Alice", "Bob"]);
        assert_eq!(config.target_domain, "example.com");
    }

    #[test]
    fn load_job_errors() {
        let missing = load_job(std::path::Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(ConfigError::Unreadable { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"names": "Alice"}}"#).unwrap();
        assert!(matches!(
            load_job(file.path()),
            Err(ConfigError::Malformed { .. })
        ));
    }
}
