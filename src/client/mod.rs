//! commercetools API client
//!
//! The client stacks the concerns the platform SDK composes as middleware,
//! in a fixed order: authentication, request queue (concurrency cap), HTTP
//! transport, user-agent tag, and an optional response logger.
//!
//! # Module Structure
//!
//! - [`auth`] - client-credentials token flow with caching
//! - [`CtpClient`] - executes a single API request

pub mod auth;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};
use auth::TokenProvider;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// HTTP methods used by the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single API request: resource-scoped URI, method and optional JSON body.
#[derive(Debug, Clone)]
pub struct Request {
    pub uri: String,
    pub method: Method,
    pub body: Option<String>,
    pub headers: Option<HashMap<String, String>>,
}

impl Request {
    pub fn new(uri: String, method: Method) -> Self {
        Self {
            uri,
            method,
            body: None,
            headers: None,
        }
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }
}

/// A successful API response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status_code: u16,
    pub body: Value,
}

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        // Back off to a char boundary; bodies carry multibyte text.
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..end],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Middleware-stacked commercetools client.
#[derive(Clone)]
pub struct CtpClient {
    http: reqwest::Client,
    auth: TokenProvider,
    queue: Arc<Semaphore>,
    host: String,
    log_responses: bool,
}

impl CtpClient {
    /// Build the client from a validated configuration. There is exactly
    /// one client per registration; repositories share it through the
    /// connection.
    pub fn new(config: &ResolvedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ctp-repositories/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let auth = TokenProvider::new(
            http.clone(),
            config.oauth_host.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );

        Ok(Self {
            http,
            auth,
            queue: Arc::new(Semaphore::new(config.concurrency)),
            host: config.host.clone(),
            log_responses: config.add_logger,
        })
    }

    /// Execute a single API request.
    ///
    /// Waits for a queue permit, attaches a bearer token, sends the request
    /// and parses the JSON body. A non-success status becomes
    /// [`Error::Api`] with the response body preserved verbatim; transport
    /// headers are never part of the error. Nothing is retried here.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        // The semaphore is owned by the client and never closed.
        let _permit = self
            .queue
            .acquire()
            .await
            .expect("request queue semaphore closed");

        let token = self.auth.token().await?;
        let url = format!("{}{}", self.host, request.uri);
        tracing::debug!("{} {}", request.method, request.uri);

        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Delete => self.http.delete(&url),
        }
        .bearer_auth(token);

        if let Some(body) = &request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        if let Some(headers) = &request.headers {
            for (name, value) in headers {
                builder = builder.header(name, value);
            }
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        // Handle empty response
        let body: Value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        if !status.is_success() {
            if self.log_responses {
                tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            }
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        if self.log_responses {
            tracing::debug!(
                "{} {} -> {} {}",
                request.method,
                request.uri,
                status,
                sanitize_for_log(&text)
            );
        }

        Ok(Response {
            status_code: status.as_u16(),
            body,
        })
    }
}
