use std::collections::HashMap;
use std::env;

use dynasource_core::pagination::ScanStrategy;
use dynasource_core::source::{Result, SourceError};

/// Default AWS region when `AWS_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Endpoint override, e.g. DynamoDB Local (default: none)
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
    /// How paged scans fill a page (default: buffered)
    pub scan_strategy: ScanStrategy,
    /// Key attribute names per table, used to trim item-shaped start keys
    pub key_attributes: HashMap<String, Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AWS_ENDPOINT_URL` - Endpoint override (default: none)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `DYNASOURCE_SCAN_STRATEGY` - `buffered` or `deficit` (default: "buffered")
    /// - `DYNASOURCE_KEY_ATTRIBUTES` - e.g. `traffic=uuid;orders=pk,sk` (default: empty)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let scan_strategy = match lookup("DYNASOURCE_SCAN_STRATEGY") {
            Some(value) => value.parse()?,
            None => ScanStrategy::default(),
        };
        let key_attributes = match lookup("DYNASOURCE_KEY_ATTRIBUTES") {
            Some(value) => parse_key_attributes(&value)?,
            None => HashMap::new(),
        };

        Ok(Self {
            endpoint_url: lookup("AWS_ENDPOINT_URL").filter(|v| !v.is_empty()),
            region: lookup("AWS_REGION")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            scan_strategy,
            key_attributes,
        })
    }

    pub fn with_endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        if endpoint_url.is_some() {
            self.endpoint_url = endpoint_url;
        }
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        if let Some(region) = region {
            self.region = region;
        }
        self
    }

    pub fn with_scan_strategy(mut self, scan_strategy: Option<ScanStrategy>) -> Self {
        if let Some(scan_strategy) = scan_strategy {
            self.scan_strategy = scan_strategy;
        }
        self
    }

    /// Key attributes configured for `table`, if any.
    pub fn key_attributes_for(&self, table: &str) -> Option<&[String]> {
        self.key_attributes.get(table).map(Vec::as_slice)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            region: DEFAULT_REGION.to_string(),
            scan_strategy: ScanStrategy::default(),
            key_attributes: HashMap::new(),
        }
    }
}

/// Parses `table=attr,attr;table=attr`.
pub fn parse_key_attributes(value: &str) -> Result<HashMap<String, Vec<String>>> {
    let mut tables = HashMap::new();

    for entry in value.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((table, attributes)) = entry.split_once('=') else {
            return Err(SourceError::Configuration(format!(
                "Invalid key attributes entry '{entry}', expected table=attr[,attr]"
            )));
        };

        let table = table.trim();
        let attributes: Vec<String> = attributes
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();

        if table.is_empty() || attributes.is_empty() {
            return Err(SourceError::Configuration(format!(
                "Invalid key attributes entry '{entry}', expected table=attr[,attr]"
            )));
        }

        tables.insert(table.to_string(), attributes);
    }

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.scan_strategy, ScanStrategy::Buffered);
    }

    #[test]
    fn test_values_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("AWS_ENDPOINT_URL", "http://localhost:8000"),
            ("AWS_REGION", "sa-east-1"),
            ("DYNASOURCE_SCAN_STRATEGY", "deficit"),
            ("DYNASOURCE_KEY_ATTRIBUTES", "traffic=uuid; orders = pk, sk"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.region, "sa-east-1");
        assert_eq!(config.scan_strategy, ScanStrategy::Deficit);
        assert_eq!(
            config.key_attributes_for("orders"),
            Some(&["pk".to_string(), "sk".to_string()][..])
        );
        assert_eq!(config.key_attributes_for("missing"), None);
    }

    #[test]
    fn test_invalid_strategy() {
        let err = Config::from_lookup(lookup(&[("DYNASOURCE_SCAN_STRATEGY", "offset")]))
            .unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
    }

    #[test]
    fn test_invalid_key_attributes() {
        assert!(parse_key_attributes("traffic").is_err());
        assert!(parse_key_attributes("traffic=").is_err());
        assert!(parse_key_attributes("=uuid").is_err());
        assert!(parse_key_attributes(" ; ").unwrap().is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_endpoint_url(Some("http://localhost:8000".to_string()))
            .with_region(None)
            .with_scan_strategy(Some(ScanStrategy::Deficit));

        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.scan_strategy, ScanStrategy::Deficit);
    }
}
