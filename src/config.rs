//! Registration configuration
//!
//! Holds the options supplied by the host application when the plugin is
//! registered. All required fields are validated up front; a missing field
//! is a terminal registration failure, never a request-time error.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default cap on in-flight transport requests.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Options for registering the commercetools client.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommercetoolsConfig {
    /// commercetools API host, e.g. `https://api.europe-west1.gcp.commercetools.com`
    #[serde(default)]
    pub host: Option<String>,
    /// commercetools OAuth host
    #[serde(default)]
    pub oauth_host: Option<String>,
    /// project key all requests are scoped to
    #[serde(default)]
    pub project_key: Option<String>,
    /// API client ID
    #[serde(default)]
    pub client_id: Option<String>,
    /// API client secret
    #[serde(default)]
    pub client_secret: Option<String>,
    /// max parallel transport requests (default 10)
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// whether to attach the response logger (default true)
    #[serde(default)]
    pub add_logger: Option<bool>,
}

/// A configuration whose required fields are all present.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub host: String,
    pub oauth_host: String,
    pub project_key: String,
    pub client_id: String,
    pub client_secret: String,
    pub concurrency: usize,
    pub add_logger: bool,
}

impl CommercetoolsConfig {
    /// Checks required fields and resolves defaults. The first missing
    /// field is reported, in the same order the fields are documented.
    pub fn validate(&self) -> Result<ResolvedConfig> {
        let host = require(&self.host, "host")?;
        let oauth_host = require(&self.oauth_host, "oauthHost")?;
        let project_key = require(&self.project_key, "projectKey")?;
        let client_id = require(&self.client_id, "clientId")?;
        let client_secret = require(&self.client_secret, "clientSecret")?;

        Ok(ResolvedConfig {
            host,
            oauth_host,
            project_key,
            client_id,
            client_secret,
            concurrency: self.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            add_logger: self.add_logger.unwrap_or(true),
        })
    }
}

fn require(field: &Option<String>, name: &'static str) -> Result<String> {
    match field {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(Error::Config(name)),
    }
}
