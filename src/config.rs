use std::collections::HashMap;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::vendor::OnParseError;

/// Settings read from `VENDORIZE_*` environment variables.
pub struct VendorizeConfig {
    pub ignore: Vec<String>,
    pub on_parse_error: Option<OnParseError>,
}

impl VendorizeConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;

        Ok(Self {
            ignore: raw_config.ignore,
            on_parse_error: raw_config.rewrite.failure,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    ignore: Vec<String>,
    #[serde(default)]
    rewrite: RewriteConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RewriteConfig {
    failure: Option<OnParseError>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("VENDORIZE")
                    .separator("_")
                    .list_separator(",")
                    .with_list_parse_key("ignore")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_empty() {
        let env = HashMap::from([]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                ignore: vec![],
                rewrite: RewriteConfig { failure: None }
            }
        )
    }

    #[test]
    fn load_environment() {
        let env = HashMap::from([
            (
                "VENDORIZE_IGNORE".to_owned(),
                "golang.org/x/,github.com/bigcorp".to_owned(),
            ),
            ("VENDORIZE_REWRITE_FAILURE".to_owned(), "skip".to_owned()),
        ]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                ignore: vec!["golang.org/x/".to_owned(), "github.com/bigcorp".to_owned()],
                rewrite: RewriteConfig {
                    failure: Some(OnParseError::Skip)
                }
            }
        )
    }

    #[test]
    fn reject_unknown_failure_policy() {
        let env = HashMap::from([("VENDORIZE_REWRITE_FAILURE".to_owned(), "retry".to_owned())]);
        assert!(RawConfig::load(Some(env)).is_err());
    }
}
