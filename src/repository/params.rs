//! Query parameter normalization
//!
//! Callers hand repositories a loosely-shaped query descriptor; this module
//! normalizes it into the stable [`UriParams`] shape the request builder
//! expects: list fields always present (empty when absent), legacy
//! `sortBy`/`sortDirection` merged into the sort list, and numeric fields
//! parsed from either numbers or strings. Inputs are never mutated.

use serde::{Deserialize, Deserializer};

use crate::request_builder::{LocalizedText, SortClause, UriParams};

/// Which optional parameter groups a resource forwards beyond the base set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamExtension {
    /// Base behavior: unknown fields are dropped.
    None,
    /// Product-projection resources additionally forward `staged` and the
    /// price-selection fields.
    Projection,
}

/// Caller-supplied filter/sort/pagination descriptor.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Query {
    /// reference expansion paths; a scalar is accepted and normalized to a
    /// singleton list
    #[serde(deserialize_with = "string_or_list")]
    pub expand: Vec<String>,
    /// where clauses, joined by `where_operator`
    #[serde(rename = "where")]
    pub where_clauses: Vec<String>,
    /// "and" (default) or "or"
    pub where_operator: Option<String>,
    /// page to return; accepts a number or a numeric string
    #[serde(deserialize_with = "uint_or_string")]
    pub page: Option<u32>,
    /// max resources per page; accepts a number or a numeric string
    #[serde(deserialize_with = "uint_or_string")]
    pub per_page: Option<u32>,
    /// sort clauses
    pub sort: Vec<SortClause>,
    /// Deprecated: single sort field, merged into `sort`
    pub sort_by: Option<String>,
    /// Deprecated: direction for `sort_by`
    pub sort_direction: Option<String>,
    /// query current or staged projections (projection resources only)
    pub staged: Option<bool>,
    /// ISO 4217 currency code enabling price selection
    pub price_currency: Option<String>,
    /// ISO 3166-1 alpha-2 country code, used with `price_currency`
    pub price_country: Option<String>,
    pub price_customer_group: Option<String>,
    pub price_channel: Option<String>,
}

/// Query descriptor for product-projection search.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    /// text to analyze and search for
    pub text: Option<LocalizedText>,
    /// whether to apply fuzzy search
    pub fuzzy: Option<bool>,
    /// explicit fuzzy level; accepts a number or a numeric string, and
    /// zero (exact matching) is preserved
    #[serde(deserialize_with = "uint_or_string_keep_zero")]
    pub fuzzy_level: Option<u32>,
    /// filters applied after facets are calculated
    pub filter: Vec<String>,
    /// filters applied before facets are calculated
    pub filter_by_query: Vec<String>,
    /// filters applied to facet calculations only
    pub filter_by_facets: Vec<String>,
    pub facet: Vec<String>,
    /// mark product variants matching the search criteria
    pub mark_matching_variants: Option<bool>,
    #[serde(flatten)]
    pub base: Query,
}

/// Query descriptor for product-projection suggestions.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestQuery {
    pub search_keywords: Option<LocalizedText>,
    pub fuzzy: Option<bool>,
    /// max suggestions; accepts a number or a numeric string
    #[serde(deserialize_with = "uint_or_string")]
    pub limit: Option<u32>,
    pub staged: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUint {
    Int(u32),
    Str(String),
}

fn parse_uint<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawUint>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawUint::Int(n)) => Ok(Some(n)),
        Some(RawUint::Str(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Accepts either an integer or a numeric string, mirroring query-string
/// input. Zero counts as absent (pagination fields).
fn uint_or_string<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_uint(deserializer)?.filter(|n| *n != 0))
}

/// Like [`uint_or_string`], but zero is a meaningful value and is kept.
/// `fuzzyLevel: 0` selects exact matching.
fn uint_or_string_keep_zero<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    parse_uint(deserializer)
}

/// Accepts either a single string or a list of strings.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::One(value) => vec![value],
        Raw::Many(values) => values,
    })
}

/// Merges the sort list with the legacy single-field form. Both forms are
/// supported simultaneously; the legacy clause is appended.
fn merge_sort(query: &Query) -> Vec<SortClause> {
    let mut sort = query.sort.clone();
    if let Some(by) = &query.sort_by {
        sort.push(SortClause {
            by: by.clone(),
            direction: query.sort_direction.clone(),
        });
    }
    sort
}

fn apply_extension(params: &mut UriParams, query: &Query, extension: ParamExtension) {
    if extension != ParamExtension::Projection {
        return;
    }
    params.staged = query.staged;
    params.price_currency = query.price_currency.clone();
    params.price_country = query.price_country.clone();
    params.price_customer_group = query.price_customer_group.clone();
    params.price_channel = query.price_channel.clone();
}

/// Normalizes the single-resource ("query one") parameters: `expand` only,
/// plus the projection extension when the resource carries it.
pub fn get_params(query: Option<&Query>, extension: ParamExtension) -> UriParams {
    let mut params = UriParams::default();
    let Some(query) = query else {
        return params;
    };

    params.expand = query.expand.clone();
    apply_extension(&mut params, query, extension);
    params
}

/// Normalizes the collection-query parameters: where clauses, operator,
/// expansion, pagination (omitted when absent or zero) and the merged sort
/// list.
pub fn query_params(query: Option<&Query>, extension: ParamExtension) -> UriParams {
    let mut params = UriParams::default();
    let Some(query) = query else {
        return params;
    };

    params.where_clauses = query.where_clauses.clone();
    params.where_operator = query.where_operator.clone();
    params.expand = query.expand.clone();
    params.page = query.page.filter(|n| *n != 0);
    params.per_page = query.per_page.filter(|n| *n != 0);
    params.sort = merge_sort(query);
    apply_extension(&mut params, query, extension);
    params
}

/// Normalizes product-projection search parameters: the full collection
/// query plus text/fuzzy/filter/facet fields, lists defaulting to empty.
pub fn search_params(query: Option<&SearchQuery>) -> UriParams {
    let Some(query) = query else {
        return UriParams::default();
    };

    let mut params = query_params(Some(&query.base), ParamExtension::Projection);
    params.text = query.text.clone();
    params.fuzzy = query.fuzzy;
    params.fuzzy_level = query.fuzzy_level;
    params.filter = query.filter.clone();
    params.filter_by_query = query.filter_by_query.clone();
    params.filter_by_facets = query.filter_by_facets.clone();
    params.facet = query.facet.clone();
    params.mark_matching_variants = query.mark_matching_variants;
    params
}

/// Normalizes suggestion parameters; the caller's `limit` becomes the page
/// size.
pub fn suggest_params(query: Option<&SuggestQuery>) -> UriParams {
    let mut params = UriParams::default();
    let Some(query) = query else {
        return params;
    };

    params.search_keywords = query.search_keywords.clone();
    params.fuzzy = query.fuzzy;
    params.per_page = query.limit.filter(|n| *n != 0);
    params.staged = query.staged;
    params
}
