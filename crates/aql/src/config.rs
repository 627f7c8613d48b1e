use std::path::{Path, PathBuf};

use aql_cdx::{CaptureQuery, CdxOptions, MatchScope, parse_timestamp, parse_timestamp_upper};
use aql_fetch::SessionOptions;
use aql_memento::MementoOptions;
use aql_store::StoreOptions;
use anyhow::{Context, Result, anyhow};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};

/// Everything `aql` reads from `aql.toml` and `AQL_*` variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session:   SessionOptions,
    pub discovery: DiscoveryConfig,
    pub memento:   MementoConfig,
    pub store:     StoreOptions,
    pub backend:   BackendConfig,
    pub archive:   ArchiveConfig,
    pub sources:   Vec<SourceConfig>,
}

impl Config {
    /// Read `path` if it exists, then apply `AQL_SECTION__FIELD` overrides.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::file(path)))
            .with_context(|| format!("failed to load configuration from {}", path.display()))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment
            .merge(Env::prefixed("AQL_").split("__"))
            .extract()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub endpoint:         String,
    pub page_concurrency: Option<usize>,
    pub page_size:        Option<u32>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            endpoint:         aql_cdx::DEFAULT_ENDPOINT.to_string(),
            page_concurrency: None,
            page_size:        None,
        }
    }
}

impl DiscoveryConfig {
    pub fn options(&self) -> CdxOptions {
        let mut options = CdxOptions::new(&self.endpoint);
        if let Some(pages) = self.page_concurrency {
            options = options.page_concurrency(pages);
        }
        if let Some(size) = self.page_size {
            options = options.page_size(size);
        }
        options
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MementoConfig {
    pub base_url: String,
}

impl Default for MementoConfig {
    fn default() -> Self {
        Self {
            base_url: aql_memento::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl MementoConfig {
    pub fn options(&self) -> MementoOptions { MementoOptions::new(&self.base_url) }
}

/// Where containers are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Local {
        #[serde(default = "default_local_path")]
        path: PathBuf,
    },
    S3(S3BackendConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Local {
            path: default_local_path(),
        }
    }
}

fn default_local_path() -> PathBuf { PathBuf::from("warcs") }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3BackendConfig {
    pub bucket:       String,
    #[serde(default = "default_region")]
    pub region:       String,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub prefix:       String,
    /// Local directory containers are assembled in before upload.
    #[serde(default = "default_scratch")]
    pub scratch:      PathBuf,
}

fn default_region() -> String { "us-east-1".to_string() }

fn default_scratch() -> PathBuf { std::env::temp_dir().join("aql") }

/// What a failing source does to the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the source and carry on with the others.
    #[default]
    Skip,
    /// Stop every source and fail the run.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub on_error:   ErrorPolicy,
    /// Records buffered per source before they are handed to the store.
    pub batch_size: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            on_error:   ErrorPolicy::Skip,
            batch_size: 500,
        }
    }
}

/// One discovery pattern to archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name:  String,
    pub url:   String,
    #[serde(default)]
    pub scope: Option<MatchScope>,
    #[serde(default)]
    pub from:  Option<String>,
    #[serde(default)]
    pub to:    Option<String>,
}

impl SourceConfig {
    pub fn query(&self) -> Result<CaptureQuery> {
        query(&self.url, self.scope, self.from.as_deref(), self.to.as_deref())
    }
}

/// Build a discovery query from user-facing strings.
///
/// Partial bounds cover whole periods: `from = "2019"` starts on January 1st
/// and `to = "2019"` ends on December 31st.
pub fn query(url: &str, scope: Option<MatchScope>, from: Option<&str>, to: Option<&str>) -> Result<CaptureQuery> {
    let mut query = CaptureQuery::new(url);
    if let Some(scope) = scope {
        query = query.scope(scope);
    }
    if let Some(from) = from {
        query = query.from(parse_timestamp(from).ok_or_else(|| anyhow!("invalid --from timestamp '{from}'"))?);
    }
    if let Some(to) = to {
        query = query.to(parse_timestamp_upper(to).ok_or_else(|| anyhow!("invalid --to timestamp '{to}'"))?);
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const SAMPLE: &str = r#"
[session]
max_retries = 3
retry_backoff_ms = 250

[discovery]
page_concurrency = 2

[store]
max_container_size = 104857600
max_records_per_container = 1000

[store.warcinfo]
operator = "archive team"

[backend]
kind = "s3"
bucket = "captures"
prefix = "warcs/"

[archive]
on_error = "abort"

[[sources]]
name = "example"
url = "*.example.com"
from = "2019"
"#;

    #[test]
    fn defaults_without_file() {
        let config = Config::from_figment(Figment::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.session.max_retries, 10);
        assert_eq!(config.backend, BackendConfig::Local { path: PathBuf::from("warcs") });
        assert_eq!(config.archive.on_error, ErrorPolicy::Skip);
    }

    #[test]
    fn reads_every_section() {
        let config = Config::from_figment(Figment::new().merge(Toml::string(SAMPLE))).unwrap();

        assert_eq!(config.session.max_retries, 3);
        assert_eq!(config.session.retry_backoff, Duration::from_millis(250));
        assert_eq!(config.discovery.options().page_concurrency, Some(2));
        assert_eq!(config.store.max_container_size, 100 * 1024 * 1024);
        assert_eq!(config.store.max_records_per_container, Some(1000));
        assert_eq!(config.store.warcinfo["operator"], "archive team");
        assert_eq!(config.archive.on_error, ErrorPolicy::Abort);
        let BackendConfig::S3(s3) = &config.backend else {
            panic!("expected s3 backend");
        };
        assert_eq!((s3.bucket.as_str(), s3.prefix.as_str(), s3.region.as_str()), ("captures", "warcs/", "us-east-1"));

        let query = config.sources[0].query().unwrap();
        assert_eq!(query.pattern, "*.example.com");
        assert!(query.from.is_some());
        assert_eq!(query.resolve().unwrap().scope, MatchScope::Domain);
    }

    #[test]
    fn partial_bounds_cover_the_whole_period() {
        let resolved = query("example.com", None, Some("2019"), Some("2019"))
            .unwrap()
            .resolve()
            .unwrap();
        let params = resolved.params();

        assert!(params.contains(&("from", "20190101000000".to_string())));
        assert!(params.contains(&("to", "20191231235959".to_string())));
    }

    #[test]
    fn rejects_bad_timestamps() {
        assert!(query("example.com", None, Some("yesterday"), None).is_err());
    }
}
