// ═══════════════════════════════════════════════════════════════════
// Service Tests: InputService, RegisterService, HistoryService
// ═══════════════════════════════════════════════════════════════════

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;

use loppiskassan_core::errors::CoreError;
use loppiskassan_core::models::history::SaleFilter;
use loppiskassan_core::models::sale::Sale;
use loppiskassan_core::models::settings::Settings;
use loppiskassan_core::models::sold_item::{PaymentMethod, SoldItem};
use loppiskassan_core::services::history_service::HistoryService;
use loppiskassan_core::services::input_service::InputService;
use loppiskassan_core::services::register_service::RegisterService;

fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn sold(seller: u32, price: u32, method: PaymentMethod) -> SoldItem {
    SoldItem {
        purchase_id: Some(format!("p-{seller}")),
        payment_method: method,
        sold_time: ts(2025, 5, 10, 12, 0),
        ..SoldItem::new_pending(seller, price)
    }
}

/// 100 sales across sellers 1..=10; seller 1 always pays by Swish, the rest cash.
fn hundred_sales() -> Vec<SoldItem> {
    (0..100u32)
        .map(|i| {
            let seller = i % 10 + 1;
            let method = if seller == 1 {
                PaymentMethod::Swish
            } else {
                PaymentMethod::Cash
            };
            sold(seller, 10 + i, method)
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════
// InputService
// ═══════════════════════════════════════════════════════════════════

mod input_service {
    use super::*;

    #[test]
    fn parse_seller_valid() {
        let svc = InputService::new();
        assert_eq!(svc.parse_seller("12").unwrap(), 12);
        assert_eq!(svc.parse_seller("  7 ").unwrap(), 7);
    }

    #[test]
    fn parse_seller_rejects_non_numeric() {
        let svc = InputService::new();
        for input in ["", "abc", "12a", "-3", "1.5"] {
            let err = svc.parse_seller(input).unwrap_err();
            assert!(matches!(err, CoreError::ValidationError(_)), "input {input:?}");
        }
    }

    #[test]
    fn parse_seller_rejects_zero() {
        assert!(InputService::new().parse_seller("0").is_err());
    }

    #[test]
    fn parse_prices_clean() {
        assert_eq!(InputService::new().parse_prices("10 20 30").unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn parse_prices_irregular_whitespace() {
        let svc = InputService::new();
        assert_eq!(
            svc.parse_prices("  10  20   30 ").unwrap(),
            svc.parse_prices("10 20 30").unwrap()
        );
        assert_eq!(svc.parse_prices("10\t20\n30").unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn parse_prices_rejects_bad_token() {
        let err = InputService::new().parse_prices("10a 20").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(err.to_string().contains("10a"));
    }

    #[test]
    fn parse_prices_rejects_empty() {
        let svc = InputService::new();
        assert!(svc.parse_prices("").is_err());
        assert!(svc.parse_prices("   ").is_err());
    }

    #[test]
    fn parse_prices_rejects_negative_and_decimal() {
        let svc = InputService::new();
        assert!(svc.parse_prices("-5").is_err());
        assert!(svc.parse_prices("9.50").is_err());
    }

    #[test]
    fn signed_tokens_are_rejected() {
        let svc = InputService::new();
        assert!(matches!(
            svc.parse_prices("+10 20"),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            svc.parse_seller("+5"),
            Err(CoreError::ValidationError(_))
        ));
        assert!(svc.parse_prices("20 +0").is_err());
    }

    #[test]
    fn parse_prices_accepts_zero() {
        assert_eq!(InputService::new().parse_prices("0").unwrap(), vec![0]);
    }

    #[test]
    fn format_money_groups_thousands() {
        let svc = InputService::new();
        assert_eq!(svc.format_money(12345, "SEK"), "12,345 SEK");
        assert_eq!(svc.format_money(1_234_567, "SEK"), "1,234,567 SEK");
        assert_eq!(svc.format_money(100_000, "EUR"), "100,000 EUR");
    }

    #[test]
    fn format_money_small_amounts() {
        let svc = InputService::new();
        assert_eq!(svc.format_money(0, "SEK"), "0 SEK");
        assert_eq!(svc.format_money(999, "SEK"), "999 SEK");
        assert_eq!(svc.format_money(1000, "SEK"), "1,000 SEK");
    }
}

// ═══════════════════════════════════════════════════════════════════
// RegisterService
// ═══════════════════════════════════════════════════════════════════

mod register_service {
    use super::*;

    #[test]
    fn add_items_one_per_price() {
        let svc = RegisterService::new();
        let mut sale = Sale::new();
        let added = svc
            .add_items(&mut sale, &Settings::default(), 5, &[10, 20, 30])
            .unwrap();

        assert_eq!(added.len(), 3);
        assert_eq!(sale.len(), 3);
        assert_eq!(sale.total(), 60);
        assert!(sale.items.iter().all(|i| i.seller == 5));
    }

    #[test]
    fn add_items_rejects_empty_price_list() {
        let mut sale = Sale::new();
        let err = RegisterService::new()
            .add_items(&mut sale, &Settings::default(), 5, &[])
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn add_items_rejects_unapproved_seller() {
        let settings = Settings {
            approved_sellers: vec![1, 2],
            ..Settings::default()
        };
        let mut sale = Sale::new();
        let svc = RegisterService::new();
        assert!(svc.add_items(&mut sale, &settings, 2, &[10]).is_ok());
        let err = svc.add_items(&mut sale, &settings, 3, &[10]).unwrap_err();
        assert!(err.to_string().contains("Seller 3"));
        assert_eq!(sale.len(), 1);
    }

    #[test]
    fn remove_item_by_id() {
        let svc = RegisterService::new();
        let mut sale = Sale::new();
        let added = svc
            .add_items(&mut sale, &Settings::default(), 1, &[10, 20])
            .unwrap();

        let removed = svc.remove_item(&mut sale, &added[0].item_id).unwrap();
        assert_eq!(removed.price, 10);
        assert_eq!(sale.total(), 20);
    }

    #[test]
    fn remove_unknown_item() {
        let mut sale = Sale::new();
        let err = RegisterService::new().remove_item(&mut sale, "nope").unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound(_)));
    }

    #[test]
    fn checkout_binds_purchase_fields() {
        let svc = RegisterService::new();
        let mut sale = Sale::new();
        svc.add_items(&mut sale, &Settings::default(), 1, &[10, 20]).unwrap();
        svc.add_items(&mut sale, &Settings::default(), 2, &[5]).unwrap();

        let now = NaiveDate::from_ymd_opt(2025, 5, 10)
            .unwrap()
            .and_hms_opt(14, 22, 37)
            .unwrap();
        let items = svc.checkout(&sale, PaymentMethod::Swish, now).unwrap();

        assert_eq!(items.len(), 3);
        let purchase_ids: HashSet<_> = items.iter().map(|i| i.purchase_id.clone()).collect();
        assert_eq!(purchase_ids.len(), 1);
        assert!(items[0].purchase_id.is_some());
        assert!(items.iter().all(|i| i.payment_method == PaymentMethod::Swish));
        assert!(items.iter().all(|i| i.sold_time == ts(2025, 5, 10, 14, 22)));
        assert!(items.iter().all(|i| !i.is_collected_by_seller() && !i.uploaded));
    }

    #[test]
    fn checkout_keeps_item_ids_and_sale() {
        let svc = RegisterService::new();
        let mut sale = Sale::new();
        svc.add_items(&mut sale, &Settings::default(), 1, &[10]).unwrap();
        let items = svc
            .checkout(&sale, PaymentMethod::Cash, ts(2025, 5, 10, 9, 0))
            .unwrap();
        assert_eq!(items[0].item_id, sale.items[0].item_id);
        assert_eq!(sale.len(), 1);
    }

    #[test]
    fn separate_checkouts_get_separate_purchase_ids() {
        let svc = RegisterService::new();
        let mut sale = Sale::new();
        svc.add_items(&mut sale, &Settings::default(), 1, &[10]).unwrap();
        let a = svc.checkout(&sale, PaymentMethod::Cash, ts(2025, 5, 10, 9, 0)).unwrap();
        let b = svc.checkout(&sale, PaymentMethod::Cash, ts(2025, 5, 10, 9, 0)).unwrap();
        assert_ne!(a[0].purchase_id, b[0].purchase_id);
    }

    #[test]
    fn checkout_empty_sale_fails() {
        let err = RegisterService::new()
            .checkout(&Sale::new(), PaymentMethod::Cash, ts(2025, 5, 10, 9, 0))
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// HistoryService
// ═══════════════════════════════════════════════════════════════════

mod history_service {
    use super::*;

    #[test]
    fn filter_all_returns_everything() {
        let all = hundred_sales();
        assert_eq!(HistoryService::new().filter(&all, &SaleFilter::all()).len(), 100);
    }

    #[test]
    fn filter_by_seller() {
        let all = hundred_sales();
        let items = HistoryService::new().filter(&all, &SaleFilter::for_seller(3));
        assert_eq!(items.len(), 10);
        assert!(items.iter().all(|i| i.seller == 3));
    }

    #[test]
    fn filter_seller_and_method_is_and() {
        let all = hundred_sales();
        let svc = HistoryService::new();

        let swish_1 = SaleFilter::for_seller(1).with_payment_method(PaymentMethod::Swish);
        assert_eq!(svc.filter(&all, &swish_1).len(), 10);

        let cash_1 = SaleFilter::for_seller(1).with_payment_method(PaymentMethod::Cash);
        assert!(svc.filter(&all, &cash_1).is_empty());

        let expected: Vec<&SoldItem> = all
            .iter()
            .filter(|i| i.seller == 2 && i.payment_method == PaymentMethod::Cash)
            .collect();
        let cash_2 = SaleFilter::for_seller(2).with_payment_method(PaymentMethod::Cash);
        let got = svc.filter(&all, &cash_2);
        assert_eq!(got.len(), expected.len());
    }

    #[test]
    fn filter_unconstrained_dimension() {
        let all = hundred_sales();
        let cash = SaleFilter::all().with_payment_method(PaymentMethod::Cash);
        let items = HistoryService::new().filter(&all, &cash);
        assert_eq!(items.len(), 90);
        let sellers: HashSet<u32> = items.iter().map(|i| i.seller).collect();
        assert_eq!(sellers.len(), 9);
    }

    #[test]
    fn filter_keeps_ledger_order() {
        let all = hundred_sales();
        let items = HistoryService::new().filter(&all, &SaleFilter::for_seller(4));
        let prices: Vec<u32> = items.iter().map(|i| i.price).collect();
        let mut sorted = prices.clone();
        sorted.sort_unstable();
        assert_eq!(prices, sorted);
    }

    #[test]
    fn distinct_sellers_sorted() {
        let all = vec![
            sold(5, 1, PaymentMethod::Cash),
            sold(2, 1, PaymentMethod::Cash),
            sold(5, 1, PaymentMethod::Cash),
        ];
        let sellers: Vec<u32> = HistoryService::new().distinct_sellers(&all).into_iter().collect();
        assert_eq!(sellers, vec![2, 5]);
    }

    #[test]
    fn summarize_counts_and_sums() {
        let all = vec![
            sold(1, 10, PaymentMethod::Cash),
            sold(1, 20, PaymentMethod::Swish),
            sold(2, 40, PaymentMethod::Cash),
        ];
        let summary = HistoryService::new().summarize(&all, &SaleFilter::for_seller(1));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total, 30);
        assert_eq!(summary.items.len(), 2);
        assert_eq!(summary.sellers.len(), 2);
    }

    #[test]
    fn summarize_sellers_come_from_full_history() {
        let all = hundred_sales();
        let summary = HistoryService::new().summarize(&all, &SaleFilter::for_seller(1));
        assert_eq!(summary.sellers.len(), 10);
    }

    #[test]
    fn payout_disabled_without_seller_filter() {
        let all = hundred_sales();
        let summary = HistoryService::new().summarize(&all, &SaleFilter::all());
        assert!(!summary.payout_enabled);
    }

    #[test]
    fn payout_enabled_for_seller_with_unpaid_items() {
        let all = hundred_sales();
        let summary = HistoryService::new().summarize(&all, &SaleFilter::for_seller(1));
        assert!(summary.payout_enabled);
    }

    #[test]
    fn payout_disabled_when_everything_is_paid() {
        let mut all = vec![sold(1, 10, PaymentMethod::Cash)];
        all[0].collected_by_seller_time = Some(ts(2025, 5, 10, 18, 0));
        let summary = HistoryService::new().summarize(&all, &SaleFilter::for_seller(1));
        assert!(!summary.payout_enabled);
    }

    #[test]
    fn payout_disabled_for_unknown_seller() {
        let all = hundred_sales();
        let summary = HistoryService::new().summarize(&all, &SaleFilter::for_seller(77));
        assert_eq!(summary.count, 0);
        assert!(!summary.payout_enabled);
    }

    #[test]
    fn payout_is_exclusive_to_filtered_items() {
        let svc = HistoryService::new();
        let mut all = hundred_sales();
        let filter = SaleFilter::for_seller(1).with_payment_method(PaymentMethod::Swish);
        let filtered = svc.filter(&all, &filter);

        let marked = svc.payout(&mut all, &filtered, ts(2025, 5, 10, 18, 0));
        assert_eq!(marked, 10);

        let seller_1: Vec<&SoldItem> = all
            .iter()
            .filter(|i| i.seller == 1 && i.payment_method == PaymentMethod::Swish)
            .collect();
        assert!(seller_1.iter().all(|i| i.is_collected_by_seller()));
        assert!(all
            .iter()
            .filter(|i| i.seller != 1)
            .all(|i| !i.is_collected_by_seller()));
    }

    #[test]
    fn payout_does_not_overwrite_existing_time() {
        let svc = HistoryService::new();
        let mut all = vec![sold(1, 10, PaymentMethod::Cash), sold(1, 20, PaymentMethod::Cash)];
        all[0].collected_by_seller_time = Some(ts(2025, 5, 9, 18, 0));
        let filtered = svc.filter(&all, &SaleFilter::for_seller(1));

        let marked = svc.payout(&mut all, &filtered, ts(2025, 5, 10, 18, 0));
        assert_eq!(marked, 1);
        assert_eq!(all[0].collected_by_seller_time, Some(ts(2025, 5, 9, 18, 0)));
        assert_eq!(all[1].collected_by_seller_time, Some(ts(2025, 5, 10, 18, 0)));
    }

    #[test]
    fn payout_with_empty_filtered_set() {
        let svc = HistoryService::new();
        let mut all = hundred_sales();
        assert_eq!(svc.payout(&mut all, &[], ts(2025, 5, 10, 18, 0)), 0);
        assert!(all.iter().all(|i| !i.is_collected_by_seller()));
    }

    #[test]
    fn settlement_splits_takings() {
        let items = vec![sold(1, 100, PaymentMethod::Cash), sold(1, 55, PaymentMethod::Swish)];
        let split = HistoryService::new().settlement(&items, 10);
        assert_eq!(split.gross, 155);
        assert_eq!(split.market_share, 15);
        assert_eq!(split.net, 140);
    }

    #[test]
    fn settlement_without_market_share() {
        let items = vec![sold(1, 100, PaymentMethod::Cash)];
        let split = HistoryService::new().settlement(&items, 0);
        assert_eq!(split.market_share, 0);
        assert_eq!(split.net, 100);
    }

    #[test]
    fn settlement_caps_percentage() {
        let items = vec![sold(1, 100, PaymentMethod::Cash)];
        let split = HistoryService::new().settlement(&items, 250);
        assert_eq!(split.market_share, 100);
        assert_eq!(split.net, 0);
    }

    #[test]
    fn merge_adds_unknown_items() {
        let svc = HistoryService::new();
        let mut local = vec![sold(1, 10, PaymentMethod::Cash)];
        let imported = vec![local[0].clone(), sold(2, 20, PaymentMethod::Swish)];

        let report = svc.merge(&mut local, imported);
        assert_eq!(report.added, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(local.len(), 2);
    }

    #[test]
    fn merge_adopts_payout_time() {
        let svc = HistoryService::new();
        let mut local = vec![sold(1, 10, PaymentMethod::Cash)];
        let mut remote_copy = local[0].clone();
        remote_copy.collected_by_seller_time = Some(ts(2025, 5, 10, 18, 0));

        let report = svc.merge(&mut local, vec![remote_copy]);
        assert_eq!(report.updated, 1);
        assert!(local[0].is_collected_by_seller());
    }

    #[test]
    fn merge_keeps_local_payout_time() {
        let svc = HistoryService::new();
        let mut local = vec![sold(1, 10, PaymentMethod::Cash)];
        local[0].collected_by_seller_time = Some(ts(2025, 5, 9, 18, 0));
        let mut remote_copy = local[0].clone();
        remote_copy.collected_by_seller_time = Some(ts(2025, 5, 10, 18, 0));

        let report = svc.merge(&mut local, vec![remote_copy]);
        assert_eq!(report.updated, 0);
        assert_eq!(local[0].collected_by_seller_time, Some(ts(2025, 5, 9, 18, 0)));
    }

    #[test]
    fn merge_ors_uploaded_flag() {
        let svc = HistoryService::new();
        let mut local = vec![sold(1, 10, PaymentMethod::Cash)];
        let mut remote_copy = local[0].clone();
        remote_copy.uploaded = true;

        svc.merge(&mut local, vec![remote_copy]);
        assert!(local[0].uploaded);
    }

    #[test]
    fn merge_deduplicates_within_import() {
        let svc = HistoryService::new();
        let mut local = Vec::new();
        let item = sold(1, 10, PaymentMethod::Cash);
        let report = svc.merge(&mut local, vec![item.clone(), item]);
        assert_eq!(report.added, 1);
        assert_eq!(local.len(), 1);
    }
}
