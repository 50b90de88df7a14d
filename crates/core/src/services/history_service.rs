use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::history::{HistorySummary, ImportReport, SaleFilter, SellerSettlement};
use crate::models::sold_item::SoldItem;

/// Filtering, aggregation and payout over the loaded sales history.
///
/// Operates on in-memory lists only; loading and saving is done by the caller.
pub struct HistoryService;

impl HistoryService {
    pub fn new() -> Self {
        Self
    }

    /// Items matching every criterion of `filter`, in ledger order.
    pub fn filter(&self, all: &[SoldItem], filter: &SaleFilter) -> Vec<SoldItem> {
        all.iter().filter(|i| filter.matches(i)).cloned().collect()
    }

    /// Distinct seller numbers appearing anywhere in the history.
    pub fn distinct_sellers(&self, all: &[SoldItem]) -> BTreeSet<u32> {
        all.iter().map(|i| i.seller).collect()
    }

    /// Filtered subset plus count, sum, seller list and payout availability.
    pub fn summarize(&self, all: &[SoldItem], filter: &SaleFilter) -> HistorySummary {
        let items = self.filter(all, filter);
        let total = items.iter().map(|i| u64::from(i.price)).sum();
        let payout_enabled =
            filter.seller.is_some() && items.iter().any(|i| !i.is_collected_by_seller());

        HistorySummary {
            count: items.len(),
            total,
            sellers: self.distinct_sellers(all),
            payout_enabled,
            items,
        }
    }

    /// Mark every unpaid item of `all` that also appears in `filtered` as
    /// collected at `now`. Returns how many items were marked.
    pub fn payout(
        &self,
        all: &mut [SoldItem],
        filtered: &[SoldItem],
        now: NaiveDateTime,
    ) -> usize {
        let ids: HashSet<&str> = filtered.iter().map(|i| i.item_id.as_str()).collect();
        all.iter_mut()
            .filter(|i| ids.contains(i.item_id.as_str()))
            .map(|i| i.mark_collected(now))
            .filter(|changed| *changed)
            .count()
    }

    /// Gross takings of `items` split by the market's percentage.
    /// The market share is rounded down in the seller's favour.
    pub fn settlement(&self, items: &[SoldItem], market_share_percent: u8) -> SellerSettlement {
        let gross: u64 = items.iter().map(|i| u64::from(i.price)).sum();
        let market_share = gross * u64::from(market_share_percent.min(100)) / 100;
        SellerSettlement {
            gross,
            market_share,
            net: gross - market_share,
        }
    }

    /// Merge imported records into the local history by item id.
    ///
    /// Unknown items are appended. For known items the imported payout time
    /// is adopted if the local copy is still unpaid, and the uploaded flag
    /// is kept if either side has it.
    pub fn merge(&self, local: &mut Vec<SoldItem>, imported: Vec<SoldItem>) -> ImportReport {
        let mut index: HashMap<String, usize> = local
            .iter()
            .enumerate()
            .map(|(i, item)| (item.item_id.clone(), i))
            .collect();
        let mut report = ImportReport::default();

        for item in imported {
            match index.get(&item.item_id) {
                Some(&pos) => {
                    let existing = &mut local[pos];
                    let mut changed = false;
                    if let Some(collected) = item.collected_by_seller_time {
                        changed |= existing.mark_collected(collected);
                    }
                    if item.uploaded && !existing.uploaded {
                        existing.uploaded = true;
                        changed = true;
                    }
                    if changed {
                        report.updated += 1;
                    }
                }
                None => {
                    index.insert(item.item_id.clone(), local.len());
                    local.push(item);
                    report.added += 1;
                }
            }
        }
        report
    }
}

impl Default for HistoryService {
    fn default() -> Self {
        Self::new()
    }
}
