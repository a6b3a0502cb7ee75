//! Plugin bootstrap
//!
//! [`Commercetools::register`] is the single entry point: it validates the
//! configuration, builds the middleware-stacked connection and instantiates
//! the repository registry. The returned handle is cheap to share and is
//! what an application decorates its context with.

use std::sync::Arc;

use crate::client::{Request, Response};
use crate::config::CommercetoolsConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::repository::{Repositories, Repository};
use crate::request_builder::RequestBuilder;

pub struct Commercetools {
    connection: Arc<Connection>,
    repositories: Repositories,
}

impl Commercetools {
    /// Validates the configuration and wires connection and repositories.
    ///
    /// Fails fast with a `Missing commercetools.<field>` error when a
    /// required credential is absent, before any network activity.
    pub fn register(config: CommercetoolsConfig) -> Result<Self> {
        let resolved = config.validate()?;
        let connection = Arc::new(Connection::new(&resolved)?);
        let repositories = Repositories::new(Arc::clone(&connection));
        Ok(Self {
            connection,
            repositories,
        })
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    /// Looks up one repository by registry key, e.g. `cart`.
    pub fn repository(&self, key: &str) -> Result<&Repository> {
        self.repositories
            .get(key)
            .ok_or_else(|| Error::UnknownService(key.to_string()))
    }

    /// A request builder pre-scoped to the configured project.
    pub fn request_builder(&self) -> RequestBuilder {
        RequestBuilder::new(self.connection.project_key())
    }

    /// Escape hatch: executes a raw request through the shared connection.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        self.connection.execute(request).await
    }
}
