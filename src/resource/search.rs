//! Resource Search
//!
//! Lazy, paginated searches over a resource type. Nothing is fetched until a
//! page is requested; [`SearchResult::stream`] walks pages on demand.

use super::instance::Resource;
use super::registry::ResourceType;
use crate::client::{QueryParams, Transport};
use crate::error::{Error, Result};
use crate::naming::to_camel;
use futures::{future, stream, Stream, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The API serves at most this many pages per query
pub const MAX_PAGE: u64 = 100;

/// Search parameters, keyed in snake_case or camelCase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions(BTreeMap<String, Value>);

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Look up an option by its snake or camel key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).or_else(|| self.0.get(&to_camel(key)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wire form: camelCase keys, scalar values as text, arrays comma-joined.
    /// Null options are dropped.
    ///
    /// Each wire key is sent once, sorted. When both spellings of a key are
    /// set (`genre_id` and `genreId`), the one already in camelCase wins.
    pub fn to_query(&self) -> QueryParams {
        let mut query: BTreeMap<String, (bool, String)> = BTreeMap::new();
        for (key, value) in &self.0 {
            let Some(value) = query_value(value) else {
                continue;
            };
            let camel = to_camel(key);
            let is_wire = *key == camel;
            match query.get(&camel) {
                Some((true, _)) => {},
                Some((false, _)) if !is_wire => {},
                _ => {
                    query.insert(camel, (is_wire, value));
                },
            }
        }
        query
            .into_iter()
            .map(|(key, (_, value))| (key, value))
            .collect()
    }
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

impl<K: ToString, V: Into<Value>> FromIterator<(K, V)> for SearchOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    /// The API's default relevance order
    Standard,
    Asc(String),
    Desc(String),
}

impl SortOrder {
    pub fn asc(field: &str) -> Self {
        SortOrder::Asc(field.to_string())
    }

    pub fn desc(field: &str) -> Self {
        SortOrder::Desc(field.to_string())
    }

    /// Value of the `sort` parameter
    pub fn to_param(&self) -> String {
        match self {
            SortOrder::Standard => "standard".to_string(),
            SortOrder::Asc(field) => format!("+{}", to_camel(field)),
            SortOrder::Desc(field) => format!("-{}", to_camel(field)),
        }
    }
}

/// Paging counters reported alongside a page of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Total number of matching records
    pub count: Option<u64>,
    pub page: Option<u64>,
    pub page_count: Option<u64>,
    /// Records on this page
    pub hits: Option<u64>,
}

impl PageInfo {
    /// Read the counters from a response body. Travel endpoints nest them
    /// under `pagingInfo` and call the total `recordCount`.
    pub fn from_response(response: &Value) -> Self {
        let source = response.get("pagingInfo").unwrap_or(response);
        let field = |key: &str| source.get(key).and_then(Value::as_u64);

        Self {
            count: field("count").or_else(|| field("recordCount")),
            page: field("page"),
            page_count: field("pageCount"),
            hits: field("hits"),
        }
    }

    pub fn has_next_page(&self) -> bool {
        match (self.page, self.page_count) {
            (Some(page), Some(page_count)) => page < page_count && page < MAX_PAGE,
            _ => false,
        }
    }
}

/// One fetched page
#[derive(Debug, Clone)]
pub struct Page {
    pub resources: Vec<Resource>,
    pub info: PageInfo,
}

/// A lazy search over one resource type
#[derive(Clone)]
pub struct SearchResult {
    transport: Arc<dyn Transport>,
    resource_type: Arc<ResourceType>,
    options: SearchOptions,
}

impl SearchResult {
    pub fn new(
        transport: Arc<dyn Transport>,
        resource_type: Arc<ResourceType>,
        options: SearchOptions,
    ) -> Self {
        Self {
            transport,
            resource_type,
            options,
        }
    }

    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.resource_type
    }

    pub fn params(&self) -> &SearchOptions {
        &self.options
    }

    /// Same search, starting at page `page`
    pub fn page(&self, page: u64) -> Self {
        self.with_option("page", page)
    }

    /// Same search, sorted
    pub fn order(&self, order: SortOrder) -> Self {
        self.with_option("sort", order.to_param())
    }

    fn with_option(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.options.insert(key, value);
        next
    }

    /// Page this search starts at
    pub fn current_page(&self) -> u64 {
        self.options
            .get("page")
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(1)
    }

    /// Fetch the current page
    pub async fn fetch_page(&self) -> Result<Page> {
        let endpoint = self
            .resource_type
            .endpoint()
            .ok_or_else(|| Error::MissingEndpoint(self.resource_type.name().to_string()))?;

        let response = self.transport.get(endpoint, &self.options.to_query()).await?;

        let resources: Vec<Resource> = self
            .resource_type
            .parse_response(&response)
            .into_iter()
            .map(|record| Resource::from_record(Arc::clone(&self.resource_type), record))
            .collect();
        let info = PageInfo::from_response(&response);

        tracing::debug!(
            "Fetched {} page {}: {} records (page count: {:?})",
            self.resource_type.name(),
            self.current_page(),
            resources.len(),
            info.page_count
        );

        Ok(Page { resources, info })
    }

    /// The search for the page after `info`, if there is one
    fn next_page(&self, info: &PageInfo) -> Option<Self> {
        if !info.has_next_page() {
            return None;
        }
        let page = info.page.unwrap_or_else(|| self.current_page());
        Some(self.page(page + 1))
    }

    /// First record of the current page
    pub async fn first(&self) -> Result<Option<Resource>> {
        Ok(self.fetch_page().await?.resources.into_iter().next())
    }

    /// Every record from the current page onward, fetched page by page as
    /// the stream is polled
    pub fn stream(&self) -> impl Stream<Item = Result<Resource>> + Send + 'static {
        stream::try_unfold(Some(self.clone()), fetch_next)
            .map_ok(|resources| stream::iter(resources.into_iter().map(Ok::<Resource, Error>)))
            .try_flatten()
    }

    /// Collect every record across all pages
    pub async fn collect_all(&self) -> Result<Vec<Resource>> {
        self.stream().try_collect().await
    }

    /// Invoke `on_each` for every record across all pages
    pub async fn each<F>(&self, mut on_each: F) -> Result<()>
    where
        F: FnMut(Resource),
    {
        self.stream()
            .try_for_each(|resource| {
                on_each(resource);
                future::ready(Ok(()))
            })
            .await
    }
}

async fn fetch_next(
    state: Option<SearchResult>,
) -> Result<Option<(Vec<Resource>, Option<SearchResult>)>> {
    let Some(search) = state else {
        return Ok(None);
    };

    let page = search.fetch_page().await?;
    let next = search.next_page(&page.info);
    Ok(Some((page.resources, next)))
}

/// Start a lazy search. No request is made until a page is fetched.
pub fn search(
    transport: Arc<dyn Transport>,
    resource_type: Arc<ResourceType>,
    options: SearchOptions,
) -> SearchResult {
    SearchResult::new(transport, resource_type, options)
}

/// Lazy stream of every record across all pages
pub fn all(
    transport: Arc<dyn Transport>,
    resource_type: Arc<ResourceType>,
    options: SearchOptions,
) -> impl Stream<Item = Result<Resource>> + Send + 'static {
    search(transport, resource_type, options).stream()
}

/// Invoke `on_each` for every record across all pages
pub async fn all_with<F>(
    transport: Arc<dyn Transport>,
    resource_type: Arc<ResourceType>,
    options: SearchOptions,
    on_each: F,
) -> Result<()>
where
    F: FnMut(Resource),
{
    search(transport, resource_type, options).each(on_each).await
}

impl ResourceType {
    /// Start a lazy search against this type
    pub fn search(self: &Arc<Self>, transport: Arc<dyn Transport>, options: SearchOptions) -> SearchResult {
        search(transport, Arc::clone(self), options)
    }

    /// Lazy stream of every record of this type matching `options`
    pub fn all(
        self: &Arc<Self>,
        transport: Arc<dyn Transport>,
        options: SearchOptions,
    ) -> impl Stream<Item = Result<Resource>> + Send + 'static {
        all(transport, Arc::clone(self), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves canned pages and records every query it receives
    struct PagedTransport {
        pages: Vec<Value>,
        queries: Mutex<Vec<QueryParams>>,
    }

    impl PagedTransport {
        fn new(pages: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                pages,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<QueryParams> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for PagedTransport {
        async fn get(&self, _endpoint: &str, query: &QueryParams) -> Result<Value> {
            self.queries.lock().unwrap().push(query.clone());
            let page = query
                .iter()
                .find(|(k, _)| k == "page")
                .and_then(|(_, v)| v.parse::<usize>().ok())
                .unwrap_or(1);
            Ok(self.pages.get(page - 1).cloned().unwrap_or(json!({})))
        }
    }

    fn item_type() -> Arc<ResourceType> {
        Arc::new(
            ResourceType::builder("Item")
                .endpoint("https://example.com/items")
                .attributes(["itemName"])
                .parser(|response| {
                    response["Items"]
                        .as_array()
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(|i| i.as_object().cloned())
                                .collect::<Vec<_>>()
                        })
                        .unwrap_or_default()
                })
                .build()
                .unwrap(),
        )
    }

    fn page(n: u64, page_count: u64, names: &[&str]) -> Value {
        let items: Vec<Value> = names.iter().map(|n| json!({"itemName": n})).collect();
        json!({"page": n, "pageCount": page_count, "count": 5, "Items": items})
    }

    fn three_pages() -> Vec<Value> {
        vec![
            page(1, 3, &["a", "b"]),
            page(2, 3, &["c", "d"]),
            page(3, 3, &["e"]),
        ]
    }

    fn names(resources: &[Resource]) -> Vec<String> {
        resources
            .iter()
            .map(|r| r.read("name").unwrap().unwrap().as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_options_to_query() {
        let options = SearchOptions::new()
            .with("keyword", "coffee")
            .with("genre_id", 100227)
            .with("tag_id", json!([1000, 2000]))
            .with("availability", Value::Null);
        assert_eq!(
            options.to_query(),
            vec![
                ("genreId".to_string(), "100227".to_string()),
                ("keyword".to_string(), "coffee".to_string()),
                ("tagId".to_string(), "1000,2000".to_string()),
            ]
        );
    }

    #[test]
    fn test_options_to_query_sends_each_key_once() {
        let expected = vec![("genreId".to_string(), "2".to_string())];

        let snake_first = SearchOptions::new().with("genre_id", 1).with("genreId", 2);
        assert_eq!(snake_first.to_query(), expected);

        let camel_first = SearchOptions::new().with("genreId", 2).with("genre_id", 1);
        assert_eq!(camel_first.to_query(), expected);

        // a null camel key does not hide the snake one
        let null_camel = SearchOptions::new()
            .with("genreId", Value::Null)
            .with("genre_id", 1);
        assert_eq!(
            null_camel.to_query(),
            vec![("genreId".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_options_get_by_snake_or_camel() {
        let options: SearchOptions = [("genreId", 1)].into_iter().collect();
        assert_eq!(options.get("genre_id"), Some(&json!(1)));
        assert_eq!(options.get("genreId"), Some(&json!(1)));
    }

    #[test]
    fn test_sort_order_param() {
        assert_eq!(SortOrder::Standard.to_param(), "standard");
        assert_eq!(SortOrder::asc("item_price").to_param(), "+itemPrice");
        assert_eq!(SortOrder::desc("reviewCount").to_param(), "-reviewCount");
    }

    #[test]
    fn test_page_info_from_response() {
        let info = PageInfo::from_response(&json!({"count": 30, "page": 2, "pageCount": 3, "hits": 10}));
        assert_eq!(info.count, Some(30));
        assert_eq!(info.page, Some(2));
        assert!(info.has_next_page());

        let last = PageInfo::from_response(&json!({"page": 3, "pageCount": 3}));
        assert!(!last.has_next_page());
    }

    #[test]
    fn test_page_info_travel_paging() {
        let info = PageInfo::from_response(&json!({
            "pagingInfo": {"recordCount": 42, "page": 1, "pageCount": 2}
        }));
        assert_eq!(info.count, Some(42));
        assert!(info.has_next_page());
    }

    #[test]
    fn test_page_info_stops_at_max_page() {
        let info = PageInfo::from_response(&json!({"page": 100, "pageCount": 250}));
        assert!(!info.has_next_page());
        assert!(!PageInfo::default().has_next_page());
    }

    #[test]
    fn test_search_is_lazy() {
        let transport = PagedTransport::new(three_pages());
        let result = search(transport.clone(), item_type(), SearchOptions::new());
        assert_eq!(result.current_page(), 1);
        assert!(transport.queries().is_empty());
    }

    #[test]
    fn test_page_and_order_return_new_search() {
        let transport = PagedTransport::new(vec![]);
        let base = search(transport, item_type(), SearchOptions::new().with("keyword", "tea"));
        let paged = base.page(3).order(SortOrder::desc("item_price"));

        assert_eq!(base.current_page(), 1);
        assert!(base.params().get("sort").is_none());
        assert_eq!(paged.current_page(), 3);
        assert_eq!(paged.params().get("sort"), Some(&json!("-itemPrice")));
        assert_eq!(paged.params().get("keyword"), Some(&json!("tea")));
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let transport = PagedTransport::new(three_pages());
        let page = search(transport, item_type(), SearchOptions::new())
            .page(2)
            .fetch_page()
            .await
            .unwrap();
        assert_eq!(names(&page.resources), vec!["c", "d"]);
        assert_eq!(page.info.page, Some(2));
    }

    #[tokio::test]
    async fn test_collect_all_walks_every_page() {
        let transport = PagedTransport::new(three_pages());
        let all = search(transport.clone(), item_type(), SearchOptions::new().with("keyword", "x"))
            .collect_all()
            .await
            .unwrap();

        assert_eq!(names(&all), vec!["a", "b", "c", "d", "e"]);

        let queries = transport.queries();
        assert_eq!(queries.len(), 3);
        assert!(queries[0].iter().all(|(k, _)| k != "page"));
        assert!(queries[2].contains(&("page".to_string(), "3".to_string())));
        assert!(queries[2].contains(&("keyword".to_string(), "x".to_string())));
    }

    #[tokio::test]
    async fn test_stream_fetches_pages_on_demand() {
        let transport = PagedTransport::new(three_pages());
        let stream = all(transport.clone(), item_type(), SearchOptions::new());
        futures::pin_mut!(stream);

        let first = stream.try_next().await.unwrap().unwrap();
        assert_eq!(first.read("name").unwrap(), Some(&json!("a")));
        assert_eq!(transport.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_all_with_callback() {
        let transport = PagedTransport::new(three_pages());
        let mut seen = Vec::new();
        all_with(transport, item_type(), SearchOptions::new(), |r| {
            seen.push(r.get_attribute("itemName").cloned())
        })
        .await
        .unwrap();
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_first() {
        let transport = PagedTransport::new(three_pages());
        let first = item_type()
            .search(transport, SearchOptions::new())
            .first()
            .await
            .unwrap();
        assert!(first.unwrap().read("name").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_endpoint() {
        let transport = PagedTransport::new(three_pages());
        let genre = Arc::new(ResourceType::builder("Genre").build().unwrap());
        let err = search(transport, genre, SearchOptions::new())
            .fetch_page()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingEndpoint(name) if name == "Genre"));
    }
}
