pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use models::{
    event::{EventFilter, LoppisEvent},
    history::{HistorySummary, ImportReport, SaleFilter, SellerSettlement},
    sale::Sale,
    settings::Settings,
    sold_item::{now_minute, PaymentMethod, SoldItem},
};
use providers::{loppis_api::HttpLoppisApi, traits::LoppisApi};
use services::{
    event_service::EventService, history_service::HistoryService,
    input_service::InputService, register_service::RegisterService,
};
use std::path::{Path, PathBuf};
use storage::{codec, config::ConfigStore, file_store::FileStore};
use tracing::info;

use errors::CoreError;

/// Main entry point for the Loppiskassan core library.
/// Holds the sale in progress, the ledger and config stores, and the
/// services that operate on them. UI layers are thin adapters over this.
#[must_use]
pub struct Loppiskassan {
    store: FileStore,
    config: ConfigStore,
    settings: Settings,
    sale: Sale,
    input_service: InputService,
    register_service: RegisterService,
    history_service: HistoryService,
    event_service: EventService,
}

impl std::fmt::Debug for Loppiskassan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loppiskassan")
            .field("ledger", &self.store.path())
            .field("pending_items", &self.sale.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Loppiskassan {
    /// Open the till on `data_dir`, creating the directory if needed.
    /// Failure to create it is a configuration error.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, CoreError> {
        let dir = data_dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            CoreError::Config(format!("Cannot create data directory {}: {e}", dir.display()))
        })?;
        let store = FileStore::in_dir(dir);
        let config = ConfigStore::in_dir(dir)?;
        Ok(Self::with_stores(store, config))
    }

    /// Build the till around explicit stores.
    pub fn with_stores(store: FileStore, config: ConfigStore) -> Self {
        let settings = Settings::from_store(&config);
        Self {
            store,
            config,
            settings,
            sale: Sale::new(),
            input_service: InputService::new(),
            register_service: RegisterService::new(),
            history_service: HistoryService::new(),
            event_service: EventService::new(),
        }
    }

    // ── Till ────────────────────────────────────────────────────────

    /// Add items to the current sale from raw input: a seller number and a
    /// whitespace-separated price list.
    pub fn add_items(
        &mut self,
        seller_input: &str,
        prices_input: &str,
    ) -> Result<Vec<SoldItem>, CoreError> {
        let seller = self.input_service.parse_seller(seller_input)?;
        let prices = self.input_service.parse_prices(prices_input)?;
        self.register_service
            .add_items(&mut self.sale, &self.settings, seller, &prices)
    }

    /// Remove one item from the current sale.
    pub fn remove_pending(&mut self, item_id: &str) -> Result<SoldItem, CoreError> {
        self.register_service.remove_item(&mut self.sale, item_id)
    }

    /// Drop the current sale without saving anything.
    pub fn cancel_sale(&mut self) {
        self.sale = Sale::new();
    }

    #[must_use]
    pub fn pending_items(&self) -> &[SoldItem] {
        &self.sale.items
    }

    /// Running total of the current sale.
    #[must_use]
    pub fn pending_total(&self) -> u64 {
        self.sale.total()
    }

    /// Finalize the current sale and append it to the ledger.
    /// The sale is only cleared once the rows are on disk.
    pub fn checkout(&mut self, method: PaymentMethod) -> Result<Vec<SoldItem>, CoreError> {
        self.store.check_access()?;
        let items = self
            .register_service
            .checkout(&self.sale, method, now_minute())?;
        self.store.append(&items)?;
        self.sale = Sale::new();

        let total: u64 = items.iter().map(|i| u64::from(i.price)).sum();
        info!(items = items.len(), total, method = %method, "Checked out sale");
        Ok(items)
    }

    // ── History ─────────────────────────────────────────────────────

    /// Read the full sales history from the ledger.
    pub fn load_history(&self) -> Result<Vec<SoldItem>, CoreError> {
        self.store.load()
    }

    /// Filtered view of the history with count, sum and seller list.
    pub fn history(&self, filter: &SaleFilter) -> Result<HistorySummary, CoreError> {
        let all = self.load_history()?;
        Ok(self.history_service.summarize(&all, filter))
    }

    /// Seller/market split of the filtered takings.
    pub fn settlement(&self, filter: &SaleFilter) -> Result<SellerSettlement, CoreError> {
        let all = self.load_history()?;
        let items = self.history_service.filter(&all, filter);
        Ok(self
            .history_service
            .settlement(&items, self.settings.market_share_percent))
    }

    /// Mark the filtered, unpaid items as paid out and rewrite the ledger.
    /// A specific seller must be selected. Returns how many items were marked.
    pub fn payout(&mut self, filter: &SaleFilter) -> Result<usize, CoreError> {
        let Some(seller) = filter.seller else {
            return Err(CoreError::ValidationError(
                "Select a seller before paying out".into(),
            ));
        };
        self.store.check_access()?;

        let mut all = self.load_history()?;
        let filtered = self.history_service.filter(&all, filter);
        let marked = self.history_service.payout(&mut all, &filtered, now_minute());
        if marked > 0 {
            self.store.overwrite(&all)?;
        }

        info!(seller, marked, "Paid out seller");
        Ok(marked)
    }

    /// Remove all sales. The old ledger is kept in a backup slot.
    pub fn clear_all(&mut self) -> Result<Option<PathBuf>, CoreError> {
        self.store.check_access()?;
        let backup = self.store.clear_all()?;
        info!("Cleared sales history");
        Ok(backup)
    }

    /// Copy the ledger into the next backup slot. The live file is not
    /// rewritten, so rows the decoder would skip survive.
    pub fn backup(&mut self) -> Result<Option<PathBuf>, CoreError> {
        self.store.check_access()?;
        self.store.copy_to_backup()
    }

    /// Merge ledger text exported from another till into the local history.
    pub fn import_history(
        &mut self,
        text: &str,
        with_header: bool,
    ) -> Result<ImportReport, CoreError> {
        self.store.check_access()?;
        let imported = codec::decode(text, with_header);
        let mut all = self.load_history()?;
        let report = self.history_service.merge(&mut all, imported);
        if report.added > 0 || report.updated > 0 {
            self.store.overwrite(&all)?;
        }
        info!(added = report.added, updated = report.updated, "Imported sales history");
        Ok(report)
    }

    /// Export the full history as ledger text (header included).
    pub fn export_history(&self) -> Result<String, CoreError> {
        codec::encode(&self.load_history()?, true)
    }

    // ── Formatting ──────────────────────────────────────────────────

    /// Format an amount in the configured currency, e.g. `"12,345 SEK"`.
    #[must_use]
    pub fn format_money(&self, amount: u64) -> String {
        self.input_service
            .format_money(amount, &self.settings.currency)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn ledger_path(&self) -> &Path {
        self.store.path()
    }

    /// Replace all settings and persist them.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), CoreError> {
        if settings.market_share_percent > 100 {
            return Err(CoreError::ValidationError(format!(
                "Market share must be 0-100%, got {}%",
                settings.market_share_percent
            )));
        }
        let currency = settings.currency.trim();
        if currency.is_empty() {
            return Err(CoreError::ValidationError("Currency label is empty".into()));
        }
        self.settings = Settings {
            currency: currency.to_string(),
            ..settings
        };
        self.settings.apply_to(&mut self.config);
        self.config.save()
    }

    // ── Remote service ──────────────────────────────────────────────

    /// HTTP client for the configured (or default) service URL.
    #[must_use]
    pub fn http_api(&self) -> HttpLoppisApi {
        match &self.settings.api_base_url {
            Some(url) => HttpLoppisApi::with_base_url(url.clone()),
            None => HttpLoppisApi::new(),
        }
    }

    /// Events to choose from; falls back to the offline event.
    pub async fn discover_events(
        &self,
        api: &dyn LoppisApi,
        filter: &EventFilter,
    ) -> Vec<LoppisEvent> {
        self.event_service
            .discover_events(api, filter, self.settings.offline_mode)
            .await
    }

    /// Register this till with an event. Choosing the offline event switches
    /// to offline mode without contacting the service.
    pub async fn register_with_event(
        &mut self,
        api: &dyn LoppisApi,
        event: &LoppisEvent,
        cashier_code: &str,
    ) -> Result<(), CoreError> {
        let mut settings = self.settings.clone();
        if event.is_offline() {
            settings.event_id = Some(event.id.clone());
            settings.api_key = None;
            settings.approved_sellers.clear();
            settings.offline_mode = true;
        } else {
            let key = self
                .event_service
                .fetch_api_key(api, &event.id, cashier_code)
                .await?;
            settings.event_id = Some(event.id.clone());
            settings.api_key = Some(key);
            settings.offline_mode = false;
        }
        self.update_settings(settings)?;
        info!(event = %event.id, offline = self.settings.offline_mode, "Registered with event");
        Ok(())
    }

    /// Fetch and store the approved-seller list for the registered event.
    pub async fn refresh_approved_sellers(
        &mut self,
        api: &dyn LoppisApi,
    ) -> Result<Vec<u32>, CoreError> {
        let (event_id, api_key) = self.online_credentials()?;
        let sellers = api.list_approved_sellers(&event_id, &api_key).await?;
        let mut settings = self.settings.clone();
        settings.approved_sellers = sellers.clone();
        self.update_settings(settings)?;
        Ok(sellers)
    }

    /// Upload sales not yet synced, then record them as uploaded.
    pub async fn upload_pending(&mut self, api: &dyn LoppisApi) -> Result<usize, CoreError> {
        let (event_id, api_key) = self.online_credentials()?;
        self.store.check_access()?;

        let mut all = self.load_history()?;
        let uploaded = self
            .event_service
            .upload_pending(api, &event_id, &api_key, &mut all)
            .await?;
        if uploaded > 0 {
            self.store.overwrite(&all)?;
        }
        info!(uploaded, "Uploaded sales");
        Ok(uploaded)
    }

    fn online_credentials(&self) -> Result<(String, String), CoreError> {
        if self.settings.offline_mode {
            return Err(CoreError::ValidationError("Till is in offline mode".into()));
        }
        match (&self.settings.event_id, &self.settings.api_key) {
            (Some(event), Some(key)) => Ok((event.clone(), key.clone())),
            _ => Err(CoreError::ValidationError(
                "Till is not registered with an event".into(),
            )),
        }
    }
}
