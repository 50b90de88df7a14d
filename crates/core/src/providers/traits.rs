use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::event::{EventFilter, LoppisEvent};
use crate::models::sold_item::SoldItem;

/// Remote loppis service: event discovery, cashier registration and sync.
///
/// The till works without it. Every failure is reported as a recoverable
/// `CoreError::Api` or `CoreError::Network` and never touches local state.
#[async_trait]
pub trait LoppisApi: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    /// List events matching `filter`.
    async fn filter_events(&self, filter: &EventFilter) -> Result<Vec<LoppisEvent>, CoreError>;

    /// Exchange an event id and cashier code for an API key.
    async fn fetch_api_key(&self, event_id: &str, cashier_code: &str)
        -> Result<String, CoreError>;

    /// Seller numbers approved to sell at the event.
    async fn list_approved_sellers(
        &self,
        event_id: &str,
        api_key: &str,
    ) -> Result<Vec<u32>, CoreError>;

    /// Push sold items to the server.
    async fn upload_sold_items(
        &self,
        event_id: &str,
        api_key: &str,
        items: &[SoldItem],
    ) -> Result<(), CoreError>;
}
