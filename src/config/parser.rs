use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use listing_sync::config::load_config;
///
/// let config = load_config(Path::new("listing-sync.toml")).unwrap();
/// println!("Page size: {}", config.enumerator.page_size);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded with every persisted cycle report so a run can be traced back to
/// the configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobPlatform;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const FULL_CONFIG: &str = r#"
[scheduler]
interval-secs = 3600
freshness-hours = 12
max-concurrent-scrapes = 4

[enumerator]
page-size = 20
max-pages = 10

[scraper]
min-content-length = 150
allowed-hosts = ["*.wanted.co.kr"]
headless = false

[[scraper.host-rule]]
host = "careers.example.com"
body = "div.posting"
title = "h1.posting-title"

[extractor]
model = "gpt-4o-mini"

[storage]
database-path = "./catalog.db"

[[source]]
id = "acme-wanted"
company = "Acme"
platform = "wanted"
list-url = "https://www.wanted.co.kr/api/v4/companies/1/jobs"

[[source]]
id = "acme-saramin"
company = "Acme"
platform = "saramin"
list-url = "https://oapi.saramin.co.kr/job-search"
active = false
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(FULL_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scheduler.interval_secs, 3600);
        assert_eq!(config.scheduler.freshness_hours, 12);
        assert_eq!(config.scheduler.max_concurrent_scrapes, 4);
        assert!(config.scheduler.run_on_start);
        assert_eq!(config.enumerator.max_pages, 10);
        assert_eq!(config.enumerator.timeout_secs, 15);
        assert_eq!(config.scraper.min_content_length, 150);
        assert_eq!(config.scraper.host_rules.len(), 1);
        assert_eq!(config.storage.database_path, "./catalog.db");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].platform, JobPlatform::Saramin);
    }

    #[test]
    fn test_inactive_sources_not_scheduled() {
        let config = parse_config(FULL_CONFIG).unwrap();
        let active = config.active_sources();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "acme-wanted");
        assert!(config.find_source("acme-saramin").is_some());
    }

    #[test]
    fn test_defaults_apply_to_missing_sections() {
        let config = parse_config(
            r#"
[storage]
database-path = "./catalog.db"
"#,
        )
        .unwrap();
        assert_eq!(config.scheduler.freshness_hours, 24);
        assert_eq!(config.enumerator.page_size, 20);
        assert_eq!(config.extractor.max_input_chars, 200_000);
        assert_eq!(config.scraper.allowed_hosts.len(), 3);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/listing-sync.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_unknown_platform_rejected() {
        let result = parse_config(
            r#"
[storage]
database-path = "./catalog.db"

[[source]]
id = "x"
company = "X"
platform = "indeed"
list-url = "https://example.com/api"
"#,
        );
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let result = parse_config(
            r#"
[enumerator]
page-size = 0

[storage]
database-path = "./catalog.db"
"#,
        );
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash_is_stable() {
        let file = create_temp_config(FULL_CONFIG);
        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);

        let other = create_temp_config("# different");
        assert_ne!(hash1, compute_config_hash(other.path()).unwrap());
    }
}
