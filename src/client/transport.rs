//! Transport seam between paginated searches and the network.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Wire-form query parameters, in order
pub type QueryParams = Vec<(String, String)>;

/// Issues one GET against a resource endpoint and returns the decoded body.
///
/// Implementations own authentication and error mapping; the caller only
/// supplies the endpoint and the search parameters.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, endpoint: &str, query: &QueryParams) -> Result<Value>;
}
