//! Resource descriptor table and registry
//!
//! Every platform resource is described by one static entry: registry key,
//! display name, request-builder service key, disallowed operations and
//! the flags that unlock resource-specific behavior. [`Repositories`]
//! instantiates one [`Repository`] per entry over a shared connection.

use std::collections::HashMap;
use std::sync::Arc;

use crate::connection::Connection;
use crate::repository::params::ParamExtension;
use crate::repository::{Operation, Repository};
use crate::request_builder::{CustomService, Feature};

/// Static description of one platform resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
    /// Registry key, e.g. `cart`.
    pub key: &'static str,
    /// Display name used in error messages, e.g. `Carts`.
    pub name: &'static str,
    /// Request-builder service key, e.g. `carts`.
    pub service: &'static str,
    /// Generic operations this resource rejects with a 405-style error.
    pub disallowed: &'static [Operation],
    /// Parameter groups forwarded beyond the base set.
    pub params: ParamExtension,
    /// Endpoints registered on top of the builder's native table.
    pub custom_services: &'static [CustomService],
    /// Search/suggest over this resource's projection endpoints.
    pub search: bool,
    pub search_service: &'static str,
    pub suggest_service: &'static str,
    /// Customer authentication flows (login, password and e-mail tokens).
    pub customer_ops: bool,
    /// Container/key addressing (upsert, delete by container and key).
    pub container_key_ops: bool,
    /// Store-scoped cart and order sub-resources.
    pub in_store_ops: bool,
}

impl ResourceDescriptor {
    const fn new(key: &'static str, name: &'static str, service: &'static str) -> Self {
        Self {
            key,
            name,
            service,
            disallowed: &[],
            params: ParamExtension::None,
            custom_services: &[],
            search: false,
            search_service: "",
            suggest_service: "",
            customer_ops: false,
            container_key_ops: false,
            in_store_ops: false,
        }
    }

    const fn disallow(mut self, operations: &'static [Operation]) -> Self {
        self.disallowed = operations;
        self
    }

    const fn projection(mut self) -> Self {
        self.params = ParamExtension::Projection;
        self
    }

    const fn searchable(mut self, search: &'static str, suggest: &'static str) -> Self {
        self.search = true;
        self.search_service = search;
        self.suggest_service = suggest;
        self
    }

    const fn customer_ops(mut self) -> Self {
        self.customer_ops = true;
        self
    }

    const fn container_key_ops(mut self) -> Self {
        self.container_key_ops = true;
        self
    }

    const fn in_store_ops(mut self) -> Self {
        self.in_store_ops = true;
        self
    }

    const fn custom_services(mut self, services: &'static [CustomService]) -> Self {
        self.custom_services = services;
        self
    }
}

// Stores predate the builder's native table, so the endpoint is registered
// as a custom service on the store repository alone.
const STORES_SERVICE: &[CustomService] = &[CustomService {
    key: "stores",
    endpoint: "/stores",
    features: &[
        Feature::Create,
        Feature::Update,
        Feature::Delete,
        Feature::Query,
        Feature::QueryOne,
        Feature::QueryExpand,
    ],
}];

/// All resources, in registry-key order.
pub const RESOURCES: &[ResourceDescriptor] = &[
    ResourceDescriptor::new("cart-discount", "Cart Discounts", "cartDiscounts"),
    ResourceDescriptor::new("cart", "Carts", "carts"),
    ResourceDescriptor::new("category", "Categories", "categories"),
    ResourceDescriptor::new("channel", "Channels", "channels"),
    ResourceDescriptor::new("custom-object", "Custom Objects", "customObjects")
        .disallow(&[Operation::Update])
        .container_key_ops(),
    ResourceDescriptor::new("customer-group", "Customer Groups", "customerGroups"),
    ResourceDescriptor::new("customer", "Customers", "customers").customer_ops(),
    ResourceDescriptor::new("discount-code", "Discount Codes", "discountCodes"),
    ResourceDescriptor::new("extension", "Extensions", "extensions"),
    ResourceDescriptor::new("inventory", "Inventory", "inventory"),
    ResourceDescriptor::new("message", "Messages", "messages").disallow(&[
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ]),
    ResourceDescriptor::new("my-cart", "My Carts", "myCarts"),
    ResourceDescriptor::new("my-order", "My Orders", "myOrders")
        .disallow(&[Operation::Update, Operation::Delete]),
    ResourceDescriptor::new("order-import", "Order Import", "orderImport").disallow(&[
        Operation::Get,
        Operation::Update,
        Operation::Delete,
        Operation::Find,
    ]),
    ResourceDescriptor::new("order", "Orders", "orders"),
    ResourceDescriptor::new("payment", "Payments", "payments"),
    ResourceDescriptor::new("product-discount", "Product Discounts", "productDiscounts"),
    ResourceDescriptor::new("product-projection", "Product Projections", "productProjections")
        .disallow(&[Operation::Create, Operation::Update, Operation::Delete])
        .projection()
        .searchable("productProjectionsSearch", "productProjectionsSuggest"),
    ResourceDescriptor::new("product-type", "Product Types", "productTypes"),
    ResourceDescriptor::new("product", "Products", "products"),
    ResourceDescriptor::new("project", "Project", "project").disallow(&[
        Operation::Create,
        Operation::Delete,
        Operation::Find,
    ]),
    ResourceDescriptor::new("review", "Reviews", "reviews"),
    ResourceDescriptor::new("shipping-method", "Shipping Methods", "shippingMethods"),
    ResourceDescriptor::new("shopping-list", "Shopping Lists", "shoppingLists"),
    ResourceDescriptor::new("state", "States", "states"),
    ResourceDescriptor::new("store", "Stores", "stores")
        .custom_services(STORES_SERVICE)
        .in_store_ops(),
    ResourceDescriptor::new("subscription", "Subscriptions", "subscriptions"),
    ResourceDescriptor::new("tax-category", "Tax Categories", "taxCategories"),
    ResourceDescriptor::new("type", "Types", "types"),
    ResourceDescriptor::new("zone", "Zones", "zones"),
];

/// Looks up the static descriptor for a registry key.
pub fn descriptor(key: &str) -> Option<&'static ResourceDescriptor> {
    RESOURCES.iter().find(|descriptor| descriptor.key == key)
}

/// One repository per resource, sharing a connection.
pub struct Repositories {
    inner: HashMap<&'static str, Repository>,
}

impl Repositories {
    pub fn new(connection: Arc<Connection>) -> Self {
        let inner = RESOURCES
            .iter()
            .map(|descriptor| {
                (
                    descriptor.key,
                    Repository::new(Arc::clone(&connection), descriptor),
                )
            })
            .collect();
        Self { inner }
    }

    pub fn get(&self, key: &str) -> Option<&Repository> {
        self.inner.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Repository)> {
        self.inner.iter().map(|(key, repository)| (*key, repository))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
