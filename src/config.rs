//! Provider block configuration.
//!
//! Every attribute is optional. The token, customer id and API URL fall back
//! to environment variables; an explicit, non-empty value always wins.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::ClientConfig;
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType, Diagnostic, Schema, Validator};

/// Primary token variable.
pub const ENV_API_TOKEN: &str = "NODEPING_API_TOKEN";
/// Token variable checked when [`ENV_API_TOKEN`] is unset.
pub const ENV_API_KEY: &str = "NODEPING_API_KEY";
/// Customer (sub-account) id variable.
pub const ENV_CUSTOMER_ID: &str = "NODEPING_CUSTOMER_ID";
/// API base URL variable.
pub const ENV_API_URL: &str = "NODEPING_API_URL";

/// Largest accepted `max_retries`.
pub const MAX_RETRIES_LIMIT: i64 = 100;

/// Schema of the `provider "nodeping"` block.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Interact with the NodePing monitoring API.")
        .with_attribute(
            "api_token",
            Attribute::optional_string()
                .sensitive()
                .with_description("NodePing API token. Falls back to NODEPING_API_TOKEN, then NODEPING_API_KEY."),
        )
        .with_attribute(
            "customer_id",
            Attribute::optional_string()
                .with_description("Sub-account id to scope requests to. Falls back to NODEPING_CUSTOMER_ID."),
        )
        .with_attribute(
            "api_url",
            Attribute::optional_string()
                .with_description("API base URL. Falls back to NODEPING_API_URL."),
        )
        .with_attribute(
            "rate_limit",
            Attribute::optional_float64()
                .with_validator(Validator::at_least(0))
                .with_description("Maximum requests per second. Defaults to 10."),
        )
        .with_attribute(
            "max_retries",
            Attribute::optional_int64()
                .with_validator(Validator::at_least(0))
                .with_description("Retries for rate-limited or failed requests. Defaults to 3."),
        )
        .with_attribute(
            "retry_wait_min",
            Attribute::optional_int64()
                .with_validator(Validator::at_least(0))
                .with_description("Minimum backoff in seconds. Defaults to 1."),
        )
        .with_attribute(
            "retry_wait_max",
            Attribute::optional_int64()
                .with_validator(Validator::at_least(0))
                .with_description("Maximum backoff in seconds. Defaults to 30."),
        )
        .with_attribute(
            "default_tags",
            Attribute::new(
                AttributeType::list(AttributeType::String),
                crate::schema::AttributeFlags::optional(),
            )
            .with_description("Tags added to every check."),
        )
}

/// The provider block as configured by the user, before environment lookup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API token.
    pub api_token: Option<String>,
    /// Customer id for sub-account requests.
    pub customer_id: Option<String>,
    /// API base URL.
    pub api_url: Option<String>,
    /// Requests per second.
    pub rate_limit: Option<f64>,
    /// Retries after the first attempt.
    pub max_retries: Option<i64>,
    /// Minimum backoff, seconds.
    pub retry_wait_min: Option<i64>,
    /// Maximum backoff, seconds.
    pub retry_wait_max: Option<i64>,
    /// Tags merged into every check.
    pub default_tags: Option<Vec<String>>,
}

impl ProviderConfig {
    /// Decode a configuration payload. `null` is an empty configuration.
    pub fn from_value(value: &Value) -> Result<Self, ProviderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Fill unset or empty token, customer id and URL from `env`.
    ///
    /// `env` is a lookup function so tests can avoid the process environment.
    pub fn with_env(mut self, env: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| env(name).filter(|v| !v.is_empty());

        if is_blank(&self.api_token) {
            self.api_token = lookup(ENV_API_TOKEN).or_else(|| lookup(ENV_API_KEY));
        }
        if is_blank(&self.customer_id) {
            self.customer_id = lookup(ENV_CUSTOMER_ID);
        }
        if is_blank(&self.api_url) {
            self.api_url = lookup(ENV_API_URL);
        }
        self
    }

    /// Range checks that do not need the environment.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let negative = |name: &str, value: Option<f64>| {
            value.filter(|v| *v < 0.0).map(|v| {
                Diagnostic::error("Invalid Attribute Value")
                    .with_detail(format!("{} must not be negative, got: {}", name, v))
                    .with_attribute(name)
            })
        };
        diagnostics.extend(negative("rate_limit", self.rate_limit));
        diagnostics.extend(negative("max_retries", self.max_retries.map(|v| v as f64)));
        diagnostics.extend(negative("retry_wait_min", self.retry_wait_min.map(|v| v as f64)));
        diagnostics.extend(negative("retry_wait_max", self.retry_wait_max.map(|v| v as f64)));

        if let Some(retries) = self.max_retries.filter(|v| *v > MAX_RETRIES_LIMIT) {
            diagnostics.push(
                Diagnostic::error("Invalid Attribute Value")
                    .with_detail(format!(
                        "max_retries must not exceed {}, got: {}",
                        MAX_RETRIES_LIMIT, retries
                    ))
                    .with_attribute("max_retries"),
            );
        }

        if let (Some(min), Some(max)) = (self.retry_wait_min, self.retry_wait_max) {
            if min > max {
                diagnostics.push(
                    Diagnostic::error("Invalid Attribute Value")
                        .with_detail(format!(
                            "retry_wait_min ({}) must not exceed retry_wait_max ({})",
                            min, max
                        ))
                        .with_attribute("retry_wait_min"),
                );
            }
        }

        diagnostics
    }

    /// Build the client configuration, or the diagnostic explaining why the
    /// token is missing.
    pub fn client_config(&self, version: &str) -> Result<ClientConfig, Diagnostic> {
        let api_token = match &self.api_token {
            Some(token) if !token.is_empty() => token.clone(),
            _ => return Err(missing_token()),
        };

        let seconds = |v: Option<i64>| Duration::from_secs(v.unwrap_or(0).max(0) as u64);

        Ok(ClientConfig {
            api_token,
            customer_id: self.customer_id.clone().filter(|v| !v.is_empty()),
            base_url: self.api_url.clone().filter(|v| !v.is_empty()),
            rate_limit: self.rate_limit.unwrap_or(0.0),
            max_retries: u32::try_from(self.max_retries.unwrap_or(0).clamp(0, MAX_RETRIES_LIMIT))
                .unwrap_or_default(),
            retry_min_wait: seconds(self.retry_wait_min),
            retry_max_wait: seconds(self.retry_wait_max),
            user_agent: Some(format!("hemmer-provider-nodeping/{}", version)),
            default_tags: self.default_tags.clone().unwrap_or_default(),
            ..Default::default()
        })
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn missing_token() -> Diagnostic {
    Diagnostic::error("Missing NodePing API Token")
        .with_detail(
            "The provider cannot create the NodePing API client as there is a missing or empty \
             value for the NodePing API token. Set the api_token value in the configuration or \
             use the NODEPING_API_TOKEN environment variable. If either is already set, ensure \
             the value is not empty.",
        )
        .with_attribute("api_token")
}

/// Configuration echoed in debug logs with the token redacted.
pub(crate) fn redacted(config: &ClientConfig) -> Value {
    json!({
        "customer_id": config.customer_id,
        "base_url": config.base_url,
        "rate_limit": config.rate_limit,
        "max_retries": config.max_retries,
        "default_tags": config.default_tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_value() {
        let config = ProviderConfig::from_value(&json!({
            "api_token": "abc",
            "rate_limit": 2.5,
            "default_tags": ["managed"]
        }))
        .unwrap();
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.rate_limit, Some(2.5));
        assert_eq!(config.default_tags, Some(vec!["managed".to_string()]));

        assert_eq!(ProviderConfig::from_value(&Value::Null).unwrap(), ProviderConfig::default());
        assert!(ProviderConfig::from_value(&json!({"max_retries": "many"})).is_err());
    }

    #[test]
    fn test_env_fallbacks() {
        let config = ProviderConfig::default().with_env(env(&[
            (ENV_API_KEY, "from-key"),
            (ENV_CUSTOMER_ID, "201205050153W2Q4C"),
            (ENV_API_URL, "http://localhost:8080"),
        ]));
        assert_eq!(config.api_token.as_deref(), Some("from-key"));
        assert_eq!(config.customer_id.as_deref(), Some("201205050153W2Q4C"));
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080"));

        let config = ProviderConfig::default()
            .with_env(env(&[(ENV_API_TOKEN, "primary"), (ENV_API_KEY, "secondary")]));
        assert_eq!(config.api_token.as_deref(), Some("primary"));
    }

    #[test]
    fn test_explicit_value_wins() {
        let config = ProviderConfig {
            api_token: Some("explicit".to_string()),
            ..Default::default()
        }
        .with_env(env(&[(ENV_API_TOKEN, "env")]));
        assert_eq!(config.api_token.as_deref(), Some("explicit"));

        let config = ProviderConfig {
            api_token: Some(String::new()),
            ..Default::default()
        }
        .with_env(env(&[(ENV_API_TOKEN, "env")]));
        assert_eq!(config.api_token.as_deref(), Some("env"));
    }

    #[test]
    fn test_missing_token() {
        let diag = ProviderConfig::default()
            .with_env(env(&[(ENV_API_TOKEN, "")]))
            .client_config("0.1.0")
            .unwrap_err();
        assert_eq!(diag.summary, "Missing NodePing API Token");
        assert_eq!(diag.attribute.as_deref(), Some("api_token"));
    }

    #[test]
    fn test_validate_ranges() {
        let config = ProviderConfig {
            rate_limit: Some(-1.0),
            retry_wait_min: Some(10),
            retry_wait_max: Some(5),
            ..Default::default()
        };
        let diagnostics = config.validate();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("rate_limit"));
        assert_eq!(diagnostics[1].attribute.as_deref(), Some("retry_wait_min"));

        assert!(ProviderConfig::default().validate().is_empty());
    }

    #[test]
    fn test_max_retries_upper_bound() {
        let config = ProviderConfig {
            api_token: Some("token".to_string()),
            max_retries: Some(i64::from(u32::MAX) + 1),
            ..Default::default()
        };
        let diagnostics = config.validate();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("max_retries"));
        assert!(diagnostics[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("must not exceed 100"));

        let client = config.client_config("1.0.0").unwrap();
        assert_eq!(client.max_retries, MAX_RETRIES_LIMIT as u32);
    }

    #[test]
    fn test_client_config() {
        let config = ProviderConfig {
            api_token: Some("abc".to_string()),
            max_retries: Some(5),
            retry_wait_min: Some(2),
            ..Default::default()
        }
        .client_config("1.2.3")
        .unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_min_wait, Duration::from_secs(2));
        // Zero means "use the client default".
        assert_eq!(config.retry_max_wait, Duration::ZERO);
        assert_eq!(config.user_agent.as_deref(), Some("hemmer-provider-nodeping/1.2.3"));
        assert!(redacted(&config).get("api_token").is_none());
    }
}
