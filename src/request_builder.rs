//! Request URI builder
//!
//! Given a project key and a flat parameter set, produces the
//! resource-scoped URI for a service. Each service is registered under a
//! key with its endpoint path and allowed feature set; custom services can
//! be added for resources the builder does not know natively.
//!
//! The builder receives a stable parameter shape: list fields are always
//! present (possibly empty), never missing.

use std::collections::HashMap;

use urlencoding::encode;

use crate::error::{Error, Result};

/// Default page size the platform applies when no limit is given.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Capabilities a service endpoint supports. Parameters belonging to a
/// feature the service lacks are not emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Create,
    Update,
    Delete,
    Query,
    QueryOne,
    QueryExpand,
    Search,
    Suggest,
    Projection,
}

/// Endpoint path and feature set registered under a service key.
#[derive(Debug, Clone, Copy)]
pub struct ServiceDef {
    pub endpoint: &'static str,
    pub features: &'static [Feature],
}

impl ServiceDef {
    fn supports(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

/// Descriptor for registering an endpoint the builder does not know
/// natively.
#[derive(Debug, Clone, Copy)]
pub struct CustomService {
    pub key: &'static str,
    pub endpoint: &'static str,
    pub features: &'static [Feature],
}

/// A single sort clause. Without a direction only the field is emitted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SortClause {
    pub by: String,
    #[serde(default)]
    pub direction: Option<String>,
}

/// A language-scoped text value, used by search and suggest.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct LocalizedText {
    pub language: String,
    pub value: String,
}

/// Flat, normalized parameter set handed to [`RequestBuilder::build`].
///
/// List fields default to empty vectors rather than being omitted, so the
/// builder always sees the same shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UriParams {
    pub id: Option<String>,
    pub version: Option<u64>,
    pub token: Option<String>,
    pub expand: Vec<String>,
    pub where_clauses: Vec<String>,
    pub where_operator: Option<String>,
    pub sort: Vec<SortClause>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub staged: Option<bool>,
    pub price_currency: Option<String>,
    pub price_country: Option<String>,
    pub price_customer_group: Option<String>,
    pub price_channel: Option<String>,
    pub mark_matching_variants: Option<bool>,
    pub text: Option<LocalizedText>,
    pub fuzzy: Option<bool>,
    pub fuzzy_level: Option<u32>,
    pub filter: Vec<String>,
    pub filter_by_query: Vec<String>,
    pub filter_by_facets: Vec<String>,
    pub facet: Vec<String>,
    pub search_keywords: Option<LocalizedText>,
}

const STANDARD: &[Feature] = &[
    Feature::Create,
    Feature::Update,
    Feature::Delete,
    Feature::Query,
    Feature::QueryOne,
    Feature::QueryExpand,
];

const READ_ONLY: &[Feature] = &[Feature::Query, Feature::QueryOne, Feature::QueryExpand];

/// Built-in service table: service key, endpoint, feature set.
const SERVICES: &[(&str, ServiceDef)] = &[
    ("cartDiscounts", ServiceDef { endpoint: "/cart-discounts", features: STANDARD }),
    ("carts", ServiceDef { endpoint: "/carts", features: STANDARD }),
    ("categories", ServiceDef { endpoint: "/categories", features: STANDARD }),
    ("channels", ServiceDef { endpoint: "/channels", features: STANDARD }),
    ("customObjects", ServiceDef { endpoint: "/custom-objects", features: STANDARD }),
    ("customerGroups", ServiceDef { endpoint: "/customer-groups", features: STANDARD }),
    ("customers", ServiceDef { endpoint: "/customers", features: STANDARD }),
    (
        "customersEmailVerification",
        ServiceDef { endpoint: "/customers/email/confirm", features: &[Feature::Create] },
    ),
    (
        "customersEmailVerificationToken",
        ServiceDef {
            endpoint: "/customers/email-token",
            features: &[Feature::Create, Feature::QueryOne],
        },
    ),
    (
        "customersPassword",
        ServiceDef { endpoint: "/customers/password", features: &[Feature::Create] },
    ),
    (
        "customersPasswordReset",
        ServiceDef { endpoint: "/customers/password/reset", features: &[Feature::Create] },
    ),
    (
        "customersPasswordToken",
        ServiceDef {
            endpoint: "/customers/password-token",
            features: &[Feature::Create, Feature::QueryOne],
        },
    ),
    ("discountCodes", ServiceDef { endpoint: "/discount-codes", features: STANDARD }),
    ("extensions", ServiceDef { endpoint: "/extensions", features: STANDARD }),
    ("inventory", ServiceDef { endpoint: "/inventory", features: STANDARD }),
    ("login", ServiceDef { endpoint: "/login", features: &[Feature::Create] }),
    ("messages", ServiceDef { endpoint: "/messages", features: READ_ONLY }),
    ("myCarts", ServiceDef { endpoint: "/me/carts", features: STANDARD }),
    (
        "myOrders",
        ServiceDef {
            endpoint: "/me/orders",
            features: &[Feature::Create, Feature::Query, Feature::QueryOne, Feature::QueryExpand],
        },
    ),
    ("orderImport", ServiceDef { endpoint: "/orders/import", features: &[Feature::Create] }),
    ("orders", ServiceDef { endpoint: "/orders", features: STANDARD }),
    ("payments", ServiceDef { endpoint: "/payments", features: STANDARD }),
    ("productDiscounts", ServiceDef { endpoint: "/product-discounts", features: STANDARD }),
    (
        "productProjections",
        ServiceDef {
            endpoint: "/product-projections",
            features: &[
                Feature::Query,
                Feature::QueryOne,
                Feature::QueryExpand,
                Feature::Projection,
            ],
        },
    ),
    (
        "productProjectionsSearch",
        ServiceDef {
            endpoint: "/product-projections/search",
            features: &[
                Feature::Search,
                Feature::Query,
                Feature::QueryExpand,
                Feature::Projection,
            ],
        },
    ),
    (
        "productProjectionsSuggest",
        ServiceDef {
            endpoint: "/product-projections/suggest",
            features: &[Feature::Suggest, Feature::Query, Feature::Projection],
        },
    ),
    ("productTypes", ServiceDef { endpoint: "/product-types", features: STANDARD }),
    ("products", ServiceDef { endpoint: "/products", features: STANDARD }),
    (
        "project",
        ServiceDef {
            endpoint: "",
            features: &[Feature::Update, Feature::QueryOne, Feature::QueryExpand],
        },
    ),
    ("reviews", ServiceDef { endpoint: "/reviews", features: STANDARD }),
    ("shippingMethods", ServiceDef { endpoint: "/shipping-methods", features: STANDARD }),
    ("shoppingLists", ServiceDef { endpoint: "/shopping-lists", features: STANDARD }),
    ("states", ServiceDef { endpoint: "/states", features: STANDARD }),
    ("subscriptions", ServiceDef { endpoint: "/subscriptions", features: STANDARD }),
    ("taxCategories", ServiceDef { endpoint: "/tax-categories", features: STANDARD }),
    ("types", ServiceDef { endpoint: "/types", features: STANDARD }),
    ("zones", ServiceDef { endpoint: "/zones", features: STANDARD }),
];

/// Project-scoped URI builder.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    project_key: String,
    custom_services: HashMap<&'static str, ServiceDef>,
}

impl RequestBuilder {
    pub fn new(project_key: &str) -> Self {
        Self {
            project_key: project_key.to_string(),
            custom_services: HashMap::new(),
        }
    }

    /// Registers additional endpoints. Custom services take precedence
    /// over built-in ones with the same key.
    pub fn with_custom_services(mut self, services: &[CustomService]) -> Self {
        for service in services {
            self.custom_services.insert(
                service.key,
                ServiceDef {
                    endpoint: service.endpoint,
                    features: service.features,
                },
            );
        }
        self
    }

    /// Looks up a service definition by key.
    pub fn service(&self, key: &str) -> Result<ServiceDef> {
        if let Some(def) = self.custom_services.get(key) {
            return Ok(*def);
        }
        SERVICES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, def)| *def)
            .ok_or_else(|| Error::UnknownService(key.to_string()))
    }

    /// Builds the resource-scoped URI for a service from a flat parameter
    /// set.
    pub fn build(&self, service: &str, params: &UriParams) -> Result<String> {
        let def = self.service(service)?;
        let mut uri = format!("/{}{}", self.project_key, def.endpoint);

        // Token lookups use a path-level `<endpoint>=<token>` form.
        if let Some(token) = &params.token {
            uri.push('=');
            uri.push_str(&encode(token));
            return Ok(uri);
        }

        if let Some(id) = params.id.as_deref().filter(|id| !id.is_empty()) {
            // An id of the form `key=<key>` selects a by-key lookup.
            match id.strip_prefix("key=") {
                Some(key) => uri.push_str(&format!("/key={}", encode(key))),
                None => uri.push_str(&format!("/{}", encode(id))),
            }
        }

        let query = self.query_string(&def, params);
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query);
        }

        Ok(uri)
    }

    fn query_string(&self, def: &ServiceDef, params: &UriParams) -> String {
        let mut parts: Vec<String> = Vec::new();

        if def.supports(Feature::Query) && !params.where_clauses.is_empty() {
            let operator = params.where_operator.as_deref().unwrap_or("and");
            let joined = params.where_clauses.join(&format!(" {} ", operator));
            parts.push(format!("where={}", encode(&joined)));
        }

        if def.supports(Feature::Search) {
            if let Some(text) = &params.text {
                parts.push(format!("text.{}={}", text.language, encode(&text.value)));
            }
        }

        if def.supports(Feature::Search) || def.supports(Feature::Suggest) {
            if let Some(fuzzy) = params.fuzzy {
                parts.push(format!("fuzzy={}", fuzzy));
            }
            if let Some(level) = params.fuzzy_level {
                parts.push(format!("fuzzyLevel={}", level));
            }
        }

        if def.supports(Feature::Search) {
            for clause in &params.filter {
                parts.push(format!("filter={}", encode(clause)));
            }
            for clause in &params.filter_by_query {
                parts.push(format!("filter.query={}", encode(clause)));
            }
            for clause in &params.filter_by_facets {
                parts.push(format!("filter.facets={}", encode(clause)));
            }
            for clause in &params.facet {
                parts.push(format!("facet={}", encode(clause)));
            }
            if let Some(mark) = params.mark_matching_variants {
                parts.push(format!("markMatchingVariants={}", mark));
            }
        }

        if def.supports(Feature::Suggest) {
            if let Some(keywords) = &params.search_keywords {
                parts.push(format!(
                    "searchKeywords.{}={}",
                    keywords.language,
                    encode(&keywords.value)
                ));
            }
        }

        if def.supports(Feature::Projection) {
            if let Some(staged) = params.staged {
                parts.push(format!("staged={}", staged));
            }
            if let Some(currency) = &params.price_currency {
                parts.push(format!("priceCurrency={}", encode(currency)));
            }
            if let Some(country) = &params.price_country {
                parts.push(format!("priceCountry={}", encode(country)));
            }
            if let Some(group) = &params.price_customer_group {
                parts.push(format!("priceCustomerGroup={}", encode(group)));
            }
            if let Some(channel) = &params.price_channel {
                parts.push(format!("priceChannel={}", encode(channel)));
            }
        }

        if def.supports(Feature::QueryExpand) {
            for expansion in &params.expand {
                parts.push(format!("expand={}", encode(expansion)));
            }
        }

        if def.supports(Feature::Query) {
            for clause in &params.sort {
                let rendered = match &clause.direction {
                    Some(direction) => format!("{} {}", clause.by, direction),
                    None => clause.by.clone(),
                };
                parts.push(format!("sort={}", encode(&rendered)));
            }

            if let Some(per_page) = params.per_page {
                parts.push(format!("limit={}", per_page));
            }
            if let Some(page) = params.page {
                // Widen before multiplying; huge caller-supplied pages must
                // not overflow the offset.
                let per_page = u64::from(params.per_page.unwrap_or(DEFAULT_PAGE_SIZE));
                let offset = u64::from(page).saturating_sub(1) * per_page;
                parts.push(format!("offset={}", offset));
            }
        }

        if let Some(version) = params.version {
            parts.push(format!("version={}", version));
        }

        parts.join("&")
    }
}
