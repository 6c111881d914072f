use crate::config::types::{
    Config, EnumeratorConfig, ExtractorConfig, HostRuleEntry, SchedulerConfig, ScraperConfig,
    SourceEntry, StorageConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_enumerator_config(&config.enumerator)?;
    validate_scraper_config(&config.scraper)?;
    validate_extractor_config(&config.extractor)?;
    validate_storage_config(&config.storage)?;
    validate_sources(&config.sources)?;
    Ok(())
}

fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(
            "interval-secs must be >= 1".to_string(),
        ));
    }

    if config.freshness_hours < 1 {
        return Err(ConfigError::Validation(
            "freshness-hours must be >= 1".to_string(),
        ));
    }

    if config.max_concurrent_scrapes < 1 || config.max_concurrent_scrapes > 16 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-scrapes must be between 1 and 16, got {}",
            config.max_concurrent_scrapes
        )));
    }

    Ok(())
}

fn validate_enumerator_config(config: &EnumeratorConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "enumerator timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 || config.render_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "scraper timeouts must be >= 1 second".to_string(),
        ));
    }

    for pattern in &config.allowed_hosts {
        validate_domain_pattern(pattern)?;
    }

    for rule in &config.host_rules {
        validate_host_rule(rule)?;
    }

    Ok(())
}

fn validate_host_rule(rule: &HostRuleEntry) -> Result<(), ConfigError> {
    if rule.host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "host-rule host cannot be empty".to_string(),
        ));
    }

    validate_selector(&rule.body)?;
    if let Some(title) = &rule.title {
        validate_selector(title)?;
    }
    if let Some(company) = &rule.company {
        validate_selector(company)?;
    }

    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map_err(|e| {
        ConfigError::Validation(format!("Invalid CSS selector '{}': {:?}", selector, e))
    })?;
    Ok(())
}

fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid extractor base-url: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "extractor model cannot be empty".to_string(),
        ));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api-key-env cannot be empty".to_string(),
        ));
    }

    if config.max_input_chars < 1000 {
        return Err(ConfigError::Validation(format!(
            "max-input-chars must be >= 1000, got {}",
            config.max_input_chars
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for source in sources {
        if source.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source id cannot be empty".to_string(),
            ));
        }

        if !seen.insert(source.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate source id '{}'",
                source.id
            )));
        }

        if source.company.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Source '{}' must name a company",
                source.id
            )));
        }

        let list_url = Url::parse(&source.list_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid list-url '{}': {}", source.list_url, e))
        })?;
        if !matches!(list_url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "list-url '{}' must use http or https",
                source.list_url
            )));
        }

        if let Some(template) = &source.listing_url_template {
            validate_listing_template(template)?;
        }
    }

    Ok(())
}

/// Validates a listing URL template
///
/// The `{id}` placeholder must sit in the path, since canonical URLs drop the
/// query string and fragment.
fn validate_listing_template(template: &str) -> Result<(), ConfigError> {
    let filled = template.replace("{id}", "0");
    let url = Url::parse(&filled).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid listing-url-template '{}': {}", template, e))
    })?;

    let path_part = template.split(['?', '#']).next().unwrap_or_default();
    if !path_part.contains("{id}") {
        return Err(ConfigError::Validation(format!(
            "listing-url-template '{}' must contain {{id}} in its path",
            template
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "listing-url-template '{}' has no host",
            template
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_domain_string(domain)
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is malformed",
            domain
        )));
    }

    // "localhost" is allowed so local test servers can be scraped directly
    if !domain.contains('.') && domain != "localhost" {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
