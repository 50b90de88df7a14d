use tracing::warn;

use crate::errors::CoreError;
use crate::models::event::{EventFilter, LoppisEvent};
use crate::models::sold_item::SoldItem;
use crate::providers::traits::LoppisApi;

/// Talks to the remote loppis service on behalf of the till.
///
/// Remote failures are recoverable: discovery falls back to a local
/// offline event, everything else returns the error for the caller to show.
pub struct EventService;

impl EventService {
    pub fn new() -> Self {
        Self
    }

    /// List events, or the single offline event if the till is offline or
    /// the service cannot be reached.
    pub async fn discover_events(
        &self,
        api: &dyn LoppisApi,
        filter: &EventFilter,
        offline: bool,
    ) -> Vec<LoppisEvent> {
        if offline {
            return vec![LoppisEvent::offline()];
        }
        match api.filter_events(filter).await {
            Ok(events) => events,
            Err(e) => {
                warn!(provider = api.name(), error = %e, "Event discovery failed, using offline event");
                vec![LoppisEvent::offline()]
            }
        }
    }

    /// Fetch the API key for `event_id`. The cashier code must not be blank.
    pub async fn fetch_api_key(
        &self,
        api: &dyn LoppisApi,
        event_id: &str,
        cashier_code: &str,
    ) -> Result<String, CoreError> {
        let code = cashier_code.trim();
        if code.is_empty() {
            return Err(CoreError::ValidationError("Cashier code is empty".into()));
        }
        api.fetch_api_key(event_id, code).await
    }

    /// Upload every item not yet synced and flag it as uploaded.
    /// Returns the number of items uploaded; nothing is flagged on failure.
    pub async fn upload_pending(
        &self,
        api: &dyn LoppisApi,
        event_id: &str,
        api_key: &str,
        items: &mut [SoldItem],
    ) -> Result<usize, CoreError> {
        let pending: Vec<SoldItem> = items.iter().filter(|i| !i.uploaded).cloned().collect();
        if pending.is_empty() {
            return Ok(0);
        }

        api.upload_sold_items(event_id, api_key, &pending).await?;

        for item in items.iter_mut().filter(|i| !i.uploaded) {
            item.uploaded = true;
        }
        Ok(pending.len())
    }
}

impl Default for EventService {
    fn default() -> Self {
        Self::new()
    }
}
