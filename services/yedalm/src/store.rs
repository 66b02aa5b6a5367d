//! Remote store adapter for the hosted data API
//!
//! Every operation is a single round-trip against one collection. There is
//! no batching and no multi-row transaction; callers that need several rows
//! changed issue several calls.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::entity::Row;
use crate::io::{HttpClient, HttpResponse};
use crate::YedalmError;

/// Equality filter on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: &str) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn id(id: i64) -> Self {
        Self::eq("id", &id.to_string())
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.column, self.value)
    }
}

/// Listing query: filters plus an optional ascending sort column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by = Some(column.to_string());
        self
    }
}

/// Row-level CRUD against named collections
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait RemoteStore: Send + Sync {
    /// Fetch rows matching the query
    async fn select(&self, collection: &str, query: &Query) -> crate::Result<Vec<Value>>;

    /// Insert one row; the store assigns the id and returns the stored row
    async fn insert(&self, collection: &str, row: &Value) -> crate::Result<Value>;

    /// Partially update the rows matching the filter, returning the first one
    async fn update(&self, collection: &str, filter: &Filter, fields: &Value)
        -> crate::Result<Value>;

    /// Hard-delete the rows matching the filter
    async fn delete(&self, collection: &str, filter: &Filter) -> crate::Result<()>;
}

/// PostgREST-flavoured implementation on top of [`HttpClient`]
pub struct PostgrestStore {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl PostgrestStore {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!("Created PostgrestStore at {}", base_url);
        Self { base_url, http }
    }

    fn url(&self, collection: &str, params: &[(String, String)]) -> crate::Result<String> {
        let raw = format!("{}/rest/v1/{}", self.base_url, collection);
        let mut url = reqwest::Url::parse(&raw)
            .map_err(|e| YedalmError::Config(format!("Invalid store URL {}: {}", raw, e)))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }

    fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
            .collect()
    }

    fn check(collection: &str, response: HttpResponse) -> crate::Result<String> {
        if response.is_success() {
            Ok(response.body)
        } else {
            Err(YedalmError::Store {
                collection: collection.to_string(),
                message: format!("status {}: {}", response.status, response.body),
            })
        }
    }

    fn first_row(collection: &str, body: &str, what: &str) -> crate::Result<Value> {
        let rows: Vec<Value> = serde_json::from_str(body)?;
        rows.into_iter().next().ok_or_else(|| {
            YedalmError::NotFound(format!("{} on '{}' returned no rows", what, collection))
        })
    }
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn select(&self, collection: &str, query: &Query) -> crate::Result<Vec<Value>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(Self::filter_params(&query.filters));
        if let Some(column) = &query.order_by {
            params.push(("order".to_string(), format!("{}.asc", column)));
        }
        let url = self.url(collection, &params)?;

        let body = Self::check(collection, self.http.get(&url).await?)?;
        let rows: Vec<Value> = serde_json::from_str(&body)?;
        tracing::debug!("Selected {} rows from '{}'", rows.len(), collection);
        Ok(rows)
    }

    async fn insert(&self, collection: &str, row: &Value) -> crate::Result<Value> {
        let url = self.url(collection, &[])?;
        let body = Self::check(collection, self.http.post_json(&url, row).await?)?;
        Self::first_row(collection, &body, "insert")
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        fields: &Value,
    ) -> crate::Result<Value> {
        let url = self.url(collection, &Self::filter_params(std::slice::from_ref(filter)))?;
        let body = Self::check(collection, self.http.patch_json(&url, fields).await?)?;
        Self::first_row(collection, &body, &format!("update where {}", filter))
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> crate::Result<()> {
        let url = self.url(collection, &Self::filter_params(std::slice::from_ref(filter)))?;
        Self::check(collection, self.http.delete(&url).await?)?;
        Ok(())
    }
}

/// Typed view of one collection
pub struct Table<T: Row> {
    store: Arc<dyn RemoteStore>,
    _row: PhantomData<fn() -> T>,
}

impl<T: Row> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.store))
    }
}

impl<T: Row> Table<T> {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            _row: PhantomData,
        }
    }

    pub async fn list(&self, query: &Query) -> crate::Result<Vec<T>> {
        let rows = self.store.select(T::COLLECTION, query).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(YedalmError::from))
            .collect()
    }

    /// First row matching the query
    pub async fn single(&self, query: &Query) -> crate::Result<T> {
        self.list(query).await?.into_iter().next().ok_or_else(|| {
            YedalmError::NotFound(format!("no row in '{}' matches the query", T::COLLECTION))
        })
    }

    pub async fn insert<D: Serialize + Sync>(&self, row: &D) -> crate::Result<T> {
        let value = serde_json::to_value(row)?;
        let stored = self.store.insert(T::COLLECTION, &value).await?;
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn update<D: Serialize + Sync>(&self, id: i64, fields: &D) -> crate::Result<T> {
        self.update_where(&Filter::id(id), fields).await
    }

    pub async fn update_where<D: Serialize + Sync>(
        &self,
        filter: &Filter,
        fields: &D,
    ) -> crate::Result<T> {
        let value = serde_json::to_value(fields)?;
        let stored = self.store.update(T::COLLECTION, filter, &value).await?;
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn delete(&self, id: i64) -> crate::Result<()> {
        self.store.delete(T::COLLECTION, &Filter::id(id)).await
    }
}
