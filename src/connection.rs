//! Connection
//!
//! Pairs the project key with the middleware-stacked client. One connection
//! is constructed per registration and shared by all repositories; it is
//! the exclusive owner of the underlying client.

use crate::client::{CtpClient, Request, Response};
use crate::config::ResolvedConfig;
use crate::error::Result;

pub struct Connection {
    project_key: String,
    client: CtpClient,
}

impl Connection {
    pub fn new(config: &ResolvedConfig) -> Result<Self> {
        Ok(Self {
            project_key: config.project_key.clone(),
            client: CtpClient::new(config)?,
        })
    }

    /// Project key this connection is scoped to. Immutable after
    /// construction.
    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    /// Executes the given request against the platform.
    ///
    /// Errors surface to the caller untouched; the tagged error type
    /// carries status and body but structurally no transport headers.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        self.client.execute(request).await
    }
}
