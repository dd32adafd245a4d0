use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::listing::PageRequest;

/// A paginated read endpoint.
///
/// Implementations return the raw payload; shape handling is left to the
/// listing normalizer because endpoints disagree on their envelopes.
#[async_trait]
pub trait PageSource: Send + Sync + std::fmt::Debug {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn fetch_page(&self, request: PageRequest) -> Result<Value>;
}
