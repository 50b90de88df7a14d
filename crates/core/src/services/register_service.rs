use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::sale::Sale;
use crate::models::settings::Settings;
use crate::models::sold_item::{truncate_to_minute, PaymentMethod, SoldItem};

/// Builds up the sale in progress and turns it into ledger records at checkout.
///
/// Pure business logic, no I/O. Persisting the checked-out items is the
/// caller's job, so a failed save leaves the sale intact.
pub struct RegisterService;

impl RegisterService {
    pub fn new() -> Self {
        Self
    }

    /// Add one item per price for `seller`. Returns the new items.
    pub fn add_items(
        &self,
        sale: &mut Sale,
        settings: &Settings,
        seller: u32,
        prices: &[u32],
    ) -> Result<Vec<SoldItem>, CoreError> {
        if !settings.is_seller_approved(seller) {
            return Err(CoreError::ValidationError(format!(
                "Seller {seller} is not approved for this event"
            )));
        }
        if prices.is_empty() {
            return Err(CoreError::ValidationError("No prices entered".into()));
        }

        let added: Vec<SoldItem> = prices
            .iter()
            .map(|&price| SoldItem::new_pending(seller, price))
            .collect();
        sale.items.extend(added.iter().cloned());
        Ok(added)
    }

    /// Remove a single item from the sale by its id.
    pub fn remove_item(&self, sale: &mut Sale, item_id: &str) -> Result<SoldItem, CoreError> {
        let idx = sale
            .items
            .iter()
            .position(|i| i.item_id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        Ok(sale.items.remove(idx))
    }

    /// Bind purchase id, sold time and payment method to every item.
    ///
    /// Returns the finished records; the sale itself is left untouched.
    pub fn checkout(
        &self,
        sale: &Sale,
        method: PaymentMethod,
        now: NaiveDateTime,
    ) -> Result<Vec<SoldItem>, CoreError> {
        if sale.is_empty() {
            return Err(CoreError::ValidationError("Nothing to check out".into()));
        }

        let purchase_id = Uuid::new_v4().to_string();
        let sold_time = truncate_to_minute(now);

        Ok(sale
            .items
            .iter()
            .map(|item| SoldItem {
                purchase_id: Some(purchase_id.clone()),
                sold_time,
                payment_method: method,
                collected_by_seller_time: None,
                uploaded: false,
                ..item.clone()
            })
            .collect())
    }
}

impl Default for RegisterService {
    fn default() -> Self {
        Self::new()
    }
}
