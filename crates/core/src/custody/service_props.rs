//! Property-based tests for CustodyService.
//!
//! - Accumulation: repeated adds on one key sum their quantities
//! - Validation: malformed input never writes
//! - Closing: a closed period rejects every add and close is idempotent

use std::sync::Arc;

use proptest::prelude::*;

use super::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

/// Strategy to generate canonical periods.
fn period_strategy() -> impl Strategy<Value = String> {
    (1990u32..2100, 1u32..=12).prop_map(|(y, m)| format!("{y:04}-{m:02}"))
}

/// Strategy to generate non-canonical period strings.
fn malformed_period_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (1990u32..2100, 13u32..100).prop_map(|(y, m)| format!("{y}-{m}")),
        (1990u32..2100).prop_map(|y| format!("{y}-00")),
        (1990u32..2100, 1u32..10).prop_map(|(y, m)| format!("{y}-{m}")),
        (0u32..100, 1u32..=12).prop_map(|(y, m)| format!("{y:02}-{m:02}")),
        "[a-z]{1,10}",
    ]
}

fn stock_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("AAPL".to_string()),
        Just("MSFT".to_string()),
        Just("SQM-B".to_string()),
        Just("FALABELLA".to_string()),
    ]
}

fn client_strategy() -> impl Strategy<Value = String> {
    "client-[0-9]{1,3}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* key and positive quantities, the stored quantity is their sum.
    #[test]
    fn prop_adds_accumulate(
        period in period_strategy(),
        stock in stock_strategy(),
        client in client_strategy(),
        quantities in prop::collection::vec(1i64..1_000_000, 1..20),
    ) {
        let rt = runtime();
        let repo = Arc::new(InMemoryCustodyRepository::new());
        let service = CustodyService::new(repo);

        let total = rt.block_on(async {
            for q in &quantities {
                service
                    .add_custody_stock(AddCustodyInput::new(&period, &stock, &client, *q))
                    .await
                    .unwrap();
            }
            service
                .get_custody(&CustodyFilter::new().with_period(&period).with_stock(&stock).with_client(&client))
                .await
                .unwrap()
        });

        prop_assert_eq!(total.len(), 1);
        prop_assert_eq!(total[0].quantity, quantities.iter().sum::<i64>());
    }

    /// *For any* non-positive quantity, the add fails with `InvalidArgument` and nothing is stored.
    #[test]
    fn prop_non_positive_quantity_rejected(
        period in period_strategy(),
        quantity in i64::MIN..=0,
    ) {
        let rt = runtime();
        let repo = Arc::new(InMemoryCustodyRepository::new());
        let service = CustodyService::new(repo.clone());

        let result = rt.block_on(
            service.add_custody_stock(AddCustodyInput::new(&period, "AAPL", "client-1", quantity)),
        );

        prop_assert!(matches!(result, Err(CustodyError::NonPositiveQuantity(_))));
        prop_assert!(rt.block_on(repo.is_empty()));
    }

    /// *For any* malformed period, the add fails with `InvalidArgument` and nothing is stored.
    #[test]
    fn prop_malformed_period_rejected(period in malformed_period_strategy()) {
        let rt = runtime();
        let repo = Arc::new(InMemoryCustodyRepository::new());
        let service = CustodyService::new(repo.clone());

        let result = rt.block_on(
            service.add_custody_stock(AddCustodyInput::new(&period, "AAPL", "client-1", 1)),
        );

        prop_assert!(result.is_err());
        prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
        prop_assert!(rt.block_on(repo.is_empty()));
    }

    /// *For any* closed period, every later add fails and stored quantities are unchanged.
    #[test]
    fn prop_closed_period_is_immutable(
        period in period_strategy(),
        before in 1i64..1000,
        after in prop::collection::vec(1i64..1000, 1..10),
    ) {
        let rt = runtime();
        let repo = Arc::new(InMemoryCustodyRepository::new());
        let service = CustodyService::new(repo);

        let (errors, records) = rt.block_on(async {
            service
                .add_custody_stock(AddCustodyInput::new(&period, "AAPL", "client-1", before))
                .await
                .unwrap();
            service.close_period(ClosePeriodFilter::single(&period)).await.unwrap();

            let mut errors = Vec::new();
            for q in &after {
                if let Err(e) = service
                    .add_custody_stock(AddCustodyInput::new(&period, "AAPL", "client-1", *q))
                    .await
                {
                    errors.push(e);
                }
            }
            let records = service.get_custody(&CustodyFilter::new()).await.unwrap();
            (errors, records)
        });

        prop_assert_eq!(errors.len(), after.len());
        prop_assert!(errors.iter().all(|e| e.kind() == ErrorKind::FailedPrecondition));
        prop_assert_eq!(records[0].quantity, before);
    }

    /// *For any* number of repeated closes, the closed state never changes after the first.
    #[test]
    fn prop_close_is_idempotent(period in period_strategy(), repeats in 2usize..6) {
        let rt = runtime();
        let service = CustodyService::new(Arc::new(InMemoryCustodyRepository::new()));

        let (first, rest) = rt.block_on(async {
            let first = service.close_period(ClosePeriodFilter::single(&period)).await.unwrap();
            let mut rest = Vec::new();
            for _ in 1..repeats {
                rest.push(service.close_period(ClosePeriodFilter::single(&period)).await.unwrap());
            }
            (first, rest)
        });

        prop_assert_eq!(first.closed.len(), 1);
        for outcome in rest {
            prop_assert!(outcome.closed.is_empty());
            prop_assert_eq!(&outcome.already_closed, &first.closed);
        }
    }
}
