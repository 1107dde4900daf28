//! Order status lookup used by the interactive flow.

use async_trait::async_trait;
use std::collections::HashMap;

/// Looks up the status of an existing order by its follow-up code.
#[async_trait]
pub trait OrderStatusLookup: Send + Sync {
    /// Status text for `code`, or `None` when the order is unknown
    async fn status(&self, code: &str) -> Option<String>;
}

/// Lookup that knows no orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

#[async_trait]
impl OrderStatusLookup for NotFound {
    async fn status(&self, _code: &str) -> Option<String> {
        None
    }
}

/// Fixed table of order statuses, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrders {
    statuses: HashMap<String, String>,
}

impl InMemoryOrders {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to add an order
    #[must_use]
    pub fn with(mut self, code: impl AsRef<str>, status: impl Into<String>) -> Self {
        self.statuses.insert(code.as_ref().to_ascii_uppercase(), status.into());
        self
    }
}

#[async_trait]
impl OrderStatusLookup for InMemoryOrders {
    async fn status(&self, code: &str) -> Option<String> {
        self.statuses.get(&code.to_ascii_uppercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_not_found() {
        assert_eq!(NotFound.status("ORD-1").await, None);
    }

    #[tokio::test]
    async fn test_in_memory_is_case_insensitive() {
        let orders = InMemoryOrders::new().with("ord-4821", "Installation scheduled");
        assert_eq!(orders.status("ORD-4821").await.as_deref(), Some("Installation scheduled"));
        assert_eq!(orders.status("ORD-0000").await, None);
    }
}
