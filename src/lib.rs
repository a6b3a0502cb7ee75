//! commercetools repositories over the HTTP API
//!
//! A thin repository layer for the commercetools platform: validated
//! configuration, client-credentials authentication with token caching, a
//! concurrency-capped request queue, a project-scoped URI builder and one
//! repository per platform resource with pagination flattening.
//!
//! ```no_run
//! use ctp_repositories::{Commercetools, CommercetoolsConfig};
//!
//! # async fn example() -> ctp_repositories::Result<()> {
//! let plugin = Commercetools::register(CommercetoolsConfig {
//!     host: Some("https://api.europe-west1.gcp.commercetools.com".into()),
//!     oauth_host: Some("https://auth.europe-west1.gcp.commercetools.com".into()),
//!     project_key: Some("my-project".into()),
//!     client_id: Some("client-id".into()),
//!     client_secret: Some("client-secret".into()),
//!     ..Default::default()
//! })?;
//!
//! let carts = plugin.repository("cart")?;
//! let all = carts.find_all(None).await?;
//! println!("{} carts", all.total);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod plugin;
pub mod repository;
pub mod request_builder;

pub use client::{Method, Request, Response};
pub use config::{CommercetoolsConfig, ResolvedConfig};
pub use connection::Connection;
pub use error::{Error, Result};
pub use plugin::Commercetools;
pub use repository::{
    PagedResult, Query, Repositories, Repository, SearchQuery, SuggestQuery,
};
pub use request_builder::{
    CustomService, Feature, LocalizedText, RequestBuilder, SortClause, UriParams,
};
