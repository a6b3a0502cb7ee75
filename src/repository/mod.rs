//! Resource repositories
//!
//! One generic [`Repository`] serves every platform resource, driven by a
//! static [`ResourceDescriptor`]: service key, disallowed operations,
//! parameter extensions and the handful of resource-specific behaviors
//! (projection search, customer authentication flows, in-store
//! sub-resources, container/key custom objects).
//!
//! # Module Structure
//!
//! - [`params`] - query parameter normalization
//! - [`resources`] - the resource descriptor table and registry

pub mod params;
mod resources;

pub use params::{ParamExtension, Query, SearchQuery, SuggestQuery};
pub use resources::{descriptor, Repositories, ResourceDescriptor, RESOURCES};

use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::{Method, Request};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::request_builder::{RequestBuilder, UriParams};

/// Max number of items per request in commercetools
const MAX_PER_PAGE: u32 = 500;

/// Generic repository operations a resource may disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Get,
    Update,
    Delete,
    Find,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Get => "GET",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Find => "FIND",
        }
    }
}

/// The platform's paged query result envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PagedResult {
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub results: Vec<Value>,
}

/// Repository for one platform resource.
///
/// Stateless aside from the shared connection; constructed once per
/// connection by [`Repositories`].
pub struct Repository {
    connection: Arc<Connection>,
    descriptor: &'static ResourceDescriptor,
    builder: RequestBuilder,
}

impl Repository {
    pub fn new(connection: Arc<Connection>, descriptor: &'static ResourceDescriptor) -> Self {
        let builder = RequestBuilder::new(connection.project_key())
            .with_custom_services(descriptor.custom_services);
        Self {
            connection,
            descriptor,
            builder,
        }
    }

    /// Registry key of this resource, e.g. `cart`.
    pub fn key(&self) -> &'static str {
        self.descriptor.key
    }

    /// Display name of this resource, e.g. `Carts`.
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Request-builder service key of this resource.
    pub fn service(&self) -> &'static str {
        self.descriptor.service
    }

    fn allow(&self, operation: Operation) -> Result<()> {
        if self.descriptor.disallowed.contains(&operation) {
            return Err(Error::NotAllowed {
                resource: self.descriptor.name,
                operation: operation.as_str(),
            });
        }
        Ok(())
    }

    fn allow_flag(&self, enabled: bool, operation: &'static str) -> Result<()> {
        if !enabled {
            return Err(Error::NotAllowed {
                resource: self.descriptor.name,
                operation,
            });
        }
        Ok(())
    }

    fn get_params(&self, query: Option<&Query>) -> UriParams {
        params::get_params(query, self.descriptor.params)
    }

    async fn execute(&self, request: Request) -> Result<Value> {
        let response = self.connection.execute(&request).await?;
        Ok(response.body)
    }

    /// Creates a new resource from the given draft.
    pub async fn create(&self, draft: &Value, query: Option<&Query>) -> Result<Value> {
        self.allow(Operation::Create)?;
        let uri = self
            .builder
            .build(self.descriptor.service, &self.get_params(query))?;
        self.execute(
            Request::new(uri, Method::Post).with_body(serde_json::to_string(draft)?),
        )
        .await
    }

    /// Gets a resource by id. An id of the form `key=<key>` selects a
    /// by-key lookup, interpreted by the request builder.
    pub async fn get(&self, id: &str, query: Option<&Query>) -> Result<Value> {
        self.allow(Operation::Get)?;
        let mut params = self.get_params(query);
        params.id = Some(id.to_string());
        let uri = self.builder.build(self.descriptor.service, &params)?;
        self.execute(Request::new(uri, Method::Get)).await
    }

    /// Updates a resource with the given change actions, keyed by the
    /// optimistic-concurrency version.
    pub async fn update(
        &self,
        id: &str,
        version: u64,
        actions: &[Value],
        query: Option<&Query>,
    ) -> Result<Value> {
        self.allow(Operation::Update)?;
        let mut params = self.get_params(query);
        params.id = Some(id.to_string());
        params.version = Some(version);
        let uri = self.builder.build(self.descriptor.service, &params)?;
        let body = serde_json::to_string(&json!({ "version": version, "actions": actions }))?;
        self.execute(Request::new(uri, Method::Post).with_body(body))
            .await
    }

    /// Deletes a resource at the given version.
    pub async fn delete(&self, id: &str, version: u64, query: Option<&Query>) -> Result<Value> {
        self.allow(Operation::Delete)?;
        let mut params = self.get_params(query);
        params.id = Some(id.to_string());
        params.version = Some(version);
        let uri = self.builder.build(self.descriptor.service, &params)?;
        self.execute(Request::new(uri, Method::Delete)).await
    }

    /// Finds resources matching the query, returning one page.
    pub async fn find(&self, query: Option<&Query>) -> Result<PagedResult> {
        self.allow(Operation::Find)?;
        let params = params::query_params(query, self.descriptor.params);
        let uri = self.builder.build(self.descriptor.service, &params)?;
        let body = self.execute(Request::new(uri, Method::Get)).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Finds all resources matching the query, flattening pagination.
    ///
    /// The first request always runs with `page=1, perPage=500` (the
    /// platform maximum), overriding caller pagination. When more pages
    /// exist, the remaining `ceil(total / 500) - 1` requests are issued
    /// concurrently using the total reported by page one and joined
    /// all-or-nothing; results are concatenated in page order. A mutation
    /// racing the scan can therefore produce duplicates or gaps - this is
    /// accepted best-effort semantics.
    pub async fn find_all(&self, query: Option<&Query>) -> Result<PagedResult> {
        self.allow(Operation::Find)?;

        let mut params = query.cloned().unwrap_or_default();
        params.page = Some(1);
        params.per_page = Some(MAX_PER_PAGE);

        let first = self.find(Some(&params)).await?;
        if first.total <= u64::from(MAX_PER_PAGE) {
            return Ok(first);
        }

        let pages_left = first.total.div_ceil(u64::from(MAX_PER_PAGE)) - 1;
        let requests = (0..pages_left).map(|index| {
            let mut page_params = params.clone();
            page_params.page = Some(index as u32 + 2);
            async move { self.find(Some(&page_params)).await }
        });
        let pages = try_join_all(requests).await?;

        let mut results = first.results;
        for page in pages {
            results.extend(page.results);
        }

        Ok(PagedResult {
            total: first.total,
            limit: first.total,
            offset: 0,
            count: first.total,
            results,
        })
    }

    // =========================================================================
    // Product projection search
    // =========================================================================

    /// High performance search over product projections.
    pub async fn search(&self, query: Option<&SearchQuery>) -> Result<Value> {
        self.allow_flag(self.descriptor.search, "SEARCH")?;
        let uri = self
            .builder
            .build(self.descriptor.search_service, &params::search_params(query))?;
        self.execute(Request::new(uri, Method::Get)).await
    }

    /// Suggestions from product search keywords.
    pub async fn suggest(&self, query: Option<&SuggestQuery>) -> Result<Value> {
        self.allow_flag(self.descriptor.search, "SUGGEST")?;
        let uri = self.builder.build(
            self.descriptor.suggest_service,
            &params::suggest_params(query),
        )?;
        self.execute(Request::new(uri, Method::Get)).await
    }

    // =========================================================================
    // Customer authentication flows
    // =========================================================================

    /// Authenticates a customer (sign in). The body is passed through to
    /// the platform unchanged.
    pub async fn login(&self, credentials: &Value) -> Result<Value> {
        self.customer_post("login", "LOGIN", credentials).await
    }

    /// Changes a customer's password.
    pub async fn password_update(&self, body: &Value) -> Result<Value> {
        self.customer_post("customersPassword", "PASSWORD UPDATE", body)
            .await
    }

    /// Creates a token for resetting a customer's password.
    pub async fn password_token(&self, body: &Value) -> Result<Value> {
        self.customer_post("customersPasswordToken", "PASSWORD TOKEN", body)
            .await
    }

    /// Gets a customer by password token.
    pub async fn get_by_password_token(&self, token: &str) -> Result<Value> {
        self.customer_get_by_token("customersPasswordToken", "PASSWORD TOKEN", token)
            .await
    }

    /// Sets a new password using a password token.
    pub async fn password_reset(&self, body: &Value) -> Result<Value> {
        self.customer_post("customersPasswordReset", "PASSWORD RESET", body)
            .await
    }

    /// Creates a token for verifying a customer's e-mail.
    pub async fn email_token(&self, body: &Value) -> Result<Value> {
        self.customer_post("customersEmailVerificationToken", "EMAIL TOKEN", body)
            .await
    }

    /// Gets a customer by e-mail token.
    pub async fn get_by_email_token(&self, token: &str) -> Result<Value> {
        self.customer_get_by_token("customersEmailVerificationToken", "EMAIL TOKEN", token)
            .await
    }

    /// Verifies a customer's e-mail with the given token.
    pub async fn verify_email(&self, body: &Value) -> Result<Value> {
        self.customer_post("customersEmailVerification", "EMAIL VERIFICATION", body)
            .await
    }

    async fn customer_post(
        &self,
        service: &'static str,
        operation: &'static str,
        body: &Value,
    ) -> Result<Value> {
        self.allow_flag(self.descriptor.customer_ops, operation)?;
        let uri = self.builder.build(service, &UriParams::default())?;
        self.execute(
            Request::new(uri, Method::Post).with_body(serde_json::to_string(body)?),
        )
        .await
    }

    async fn customer_get_by_token(
        &self,
        service: &'static str,
        operation: &'static str,
        token: &str,
    ) -> Result<Value> {
        self.allow_flag(self.descriptor.customer_ops, operation)?;
        let params = UriParams {
            token: Some(token.to_string()),
            ..Default::default()
        };
        let uri = self.builder.build(service, &params)?;
        self.execute(Request::new(uri, Method::Get)).await
    }

    // =========================================================================
    // Custom objects
    // =========================================================================

    /// Creates or updates a custom object. Custom objects have no update
    /// actions; writing the same container/key pair replaces the value.
    pub async fn upsert(&self, draft: &Value) -> Result<Value> {
        self.allow_flag(self.descriptor.container_key_ops, "UPSERT")?;
        self.create(draft, None).await
    }

    /// Deletes a custom object by container and key.
    pub async fn delete_by_container_and_key(
        &self,
        container: &str,
        key: &str,
    ) -> Result<Value> {
        self.allow_flag(
            self.descriptor.container_key_ops,
            "DELETE BY CONTAINER AND KEY",
        )?;
        let uri = format!(
            "/{}/custom-objects/{}/{}",
            self.connection.project_key(),
            container,
            key
        );
        self.execute(Request::new(uri, Method::Delete)).await
    }

    // =========================================================================
    // In-store sub-resources (store-scoped carts and orders)
    // =========================================================================

    /// Gets the carts of one store.
    pub async fn get_carts(&self, store_key: &str) -> Result<Value> {
        self.allow_flag(self.descriptor.in_store_ops, "GET CARTS")?;
        let uri = self.in_store_uri(store_key, "carts");
        self.execute(Request::new(uri, Method::Get)).await
    }

    /// Creates a cart scoped to one store.
    pub async fn create_cart(&self, store_key: &str, draft: &Value) -> Result<Value> {
        self.allow_flag(self.descriptor.in_store_ops, "CREATE CART")?;
        let uri = self.in_store_uri(store_key, "carts");
        self.execute(
            Request::new(uri, Method::Post).with_body(serde_json::to_string(draft)?),
        )
        .await
    }

    /// Gets the orders of one store.
    pub async fn get_orders(&self, store_key: &str) -> Result<Value> {
        self.allow_flag(self.descriptor.in_store_ops, "GET ORDERS")?;
        let uri = self.in_store_uri(store_key, "orders");
        self.execute(Request::new(uri, Method::Get)).await
    }

    // Store-scoped sub-resources are interpolated directly; the generic
    // builder has no in-store grammar.
    fn in_store_uri(&self, store_key: &str, resource: &str) -> String {
        format!(
            "/{}/in-store/key={}/{}",
            self.connection.project_key(),
            store_key,
            resource
        )
    }
}
