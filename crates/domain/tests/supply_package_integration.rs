//! Integration tests for the Supply and Package aggregates.
//!
//! These tests verify the supply lifecycle, the open-supply uniqueness rule,
//! package persistence and the ledger reads used by the write path.

use std::collections::HashSet;

use common::{AggregateId, OrderId, OrderLineId, ProfileId};
use domain::{
    Aggregate, ChangeOrderStatus, CloseSupply, DomainError, Ledger, MarkPackagePrinted,
    OpenNewSupply, OpenSupply, PackOrders, PackageOrder, PackageService, PackageStatus,
    ReconcileSupplyTotal, SupplyError, SupplyService, SupplyStatus, open_supply_claim,
};
use event_store::{EventStore, InMemoryEventStore, Version};

fn services() -> (
    InMemoryEventStore,
    SupplyService<InMemoryEventStore>,
    PackageService<InMemoryEventStore>,
) {
    let store = InMemoryEventStore::new();
    (
        store.clone(),
        SupplyService::new(store.clone()),
        PackageService::new(store),
    )
}

mod supply_lifecycle {
    use super::*;

    #[tokio::test]
    async fn complete_supply_lifecycle() {
        let (_, supplies, _) = services();
        let profile = ProfileId::new();

        let result = supplies
            .open_new(OpenNewSupply::for_profile(profile))
            .await
            .unwrap();
        let supply_id = result.aggregate.id().unwrap();
        assert_eq!(result.aggregate.status(), Some(SupplyStatus::New));
        assert_eq!(result.new_version, Version::first());

        let result = supplies.open(OpenSupply::new(supply_id)).await.unwrap();
        assert_eq!(result.aggregate.status(), Some(SupplyStatus::Open));

        let result = supplies
            .reconcile_total(ReconcileSupplyTotal::new(supply_id, 4))
            .await
            .unwrap();
        assert_eq!(result.aggregate.total(), 4);

        let result = supplies.close(CloseSupply::new(supply_id)).await.unwrap();
        assert_eq!(result.aggregate.status(), Some(SupplyStatus::Close));
        assert_eq!(result.aggregate.total(), 4);
        assert_eq!(result.new_version, Version::new(4));
    }

    #[tokio::test]
    async fn second_open_supply_is_rejected_without_state_change() {
        let (store, supplies, _) = services();
        let profile = ProfileId::new();

        let first = supplies
            .open_new(OpenNewSupply::for_profile(profile))
            .await
            .unwrap();
        let events_before = store.event_count().await;

        let result = supplies
            .open_new(OpenNewSupply::for_profile(profile))
            .await;

        match result {
            Err(DomainError::Supply(SupplyError::AlreadyOpen { supply, .. })) => {
                assert_eq!(Some(supply), first.aggregate.id());
            }
            other => panic!("expected AlreadyOpen, got {other:?}"),
        }
        assert_eq!(store.event_count().await, events_before);
    }

    #[tokio::test]
    async fn profiles_have_independent_supplies() {
        let (_, supplies, _) = services();

        supplies
            .open_new(OpenNewSupply::for_profile(ProfileId::new()))
            .await
            .unwrap();
        supplies
            .open_new(OpenNewSupply::for_profile(ProfileId::new()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn closing_releases_the_profile_for_a_new_supply() {
        let (store, supplies, _) = services();
        let profile = ProfileId::new();

        let first = supplies
            .open_new(OpenNewSupply::for_profile(profile))
            .await
            .unwrap();
        let first_id = first.aggregate.id().unwrap();
        supplies.close(CloseSupply::new(first_id)).await.unwrap();
        assert_eq!(
            store.claim_holder(&open_supply_claim(profile)).await.unwrap(),
            None
        );

        let second = supplies
            .open_new(OpenNewSupply::for_profile(profile))
            .await
            .unwrap();
        assert_ne!(second.aggregate.identifier(), first.aggregate.identifier());
    }

    #[tokio::test]
    async fn concurrent_open_new_admits_exactly_one() {
        let (store, supplies, _) = services();
        let profile = ProfileId::new();

        let (a, b) = tokio::join!(
            supplies.open_new(OpenNewSupply::for_profile(profile)),
            supplies.open_new(OpenNewSupply::for_profile(profile)),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        assert!(matches!(
            a.err().or(b.err()),
            Some(DomainError::Supply(SupplyError::AlreadyOpen { .. }))
        ));
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn identifiers_are_unique_across_rapid_calls() {
        let (_, supplies, _) = services();
        let mut identifiers = HashSet::new();

        for _ in 0..50 {
            let result = supplies
                .open_new(OpenNewSupply::for_profile(ProfileId::new()))
                .await
                .unwrap();
            let identifier = result.aggregate.identifier().unwrap().to_string();
            assert!(identifiers.insert(identifier));
        }
    }

    #[tokio::test]
    async fn close_without_current_event_fails() {
        let (_, supplies, _) = services();

        let result = supplies.close(CloseSupply::new(AggregateId::new())).await;
        assert!(matches!(
            result,
            Err(DomainError::Supply(SupplyError::NoActiveEvent))
        ));
    }

    #[tokio::test]
    async fn closed_supply_cannot_be_closed_again() {
        let (_, supplies, _) = services();
        let result = supplies
            .open_new(OpenNewSupply::for_profile(ProfileId::new()))
            .await
            .unwrap();
        let supply_id = result.aggregate.id().unwrap();

        supplies.close(CloseSupply::new(supply_id)).await.unwrap();
        let result = supplies.close(CloseSupply::new(supply_id)).await;
        assert!(matches!(
            result,
            Err(DomainError::Supply(SupplyError::InvalidStateTransition {
                current: SupplyStatus::Close,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn active_for_tracks_the_claim_holder() {
        let (_, supplies, _) = services();
        let profile = ProfileId::new();
        assert!(supplies.active_for(profile).await.unwrap().is_none());

        let result = supplies
            .open_new(OpenNewSupply::for_profile(profile))
            .await
            .unwrap();
        let active = supplies.active_for(profile).await.unwrap().unwrap();
        assert_eq!(active.id(), result.aggregate.id());
    }
}

mod package_lifecycle {
    use super::*;

    #[tokio::test]
    async fn envelope_id_matches_current_event_id() {
        let (store, _, packages) = services();
        let result = packages
            .pack(PackOrders::new(
                ProfileId::new(),
                AggregateId::new(),
                vec![PackageOrder::new(OrderId::new(), OrderLineId::new())],
            ))
            .await
            .unwrap();
        let package_id = result.aggregate.id().unwrap();

        let envelopes = store.get_events_for_aggregate(package_id).await.unwrap();
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].event_type, "PackagePacked");
        assert_eq!(
            Some(envelopes[0].event_id),
            result.aggregate.current_event_id()
        );
    }

    #[tokio::test]
    async fn mark_printed_appends_once() {
        let (store, _, packages) = services();
        let result = packages
            .pack(PackOrders::new(
                ProfileId::new(),
                AggregateId::new(),
                vec![PackageOrder::new(OrderId::new(), OrderLineId::new())],
            ))
            .await
            .unwrap();
        let package_id = result.aggregate.id().unwrap();

        let printed = packages
            .mark_printed(MarkPackagePrinted::new(package_id))
            .await
            .unwrap();
        assert!(printed.aggregate.is_printed());
        assert_eq!(printed.new_version, Version::new(2));

        let again = packages
            .mark_printed(MarkPackagePrinted::new(package_id))
            .await
            .unwrap();
        assert!(again.events.is_empty());
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn error_status_frees_order_line_in_ledger() {
        let (store, _, packages) = services();
        let ledger = Ledger::new(store);
        let order = OrderId::new();
        let line = OrderLineId::new();

        let result = packages
            .pack(PackOrders::new(
                ProfileId::new(),
                AggregateId::new(),
                vec![PackageOrder::new(order, line)],
            ))
            .await
            .unwrap();
        assert!(ledger.is_order_line_packaged(order, line).await.unwrap());

        packages
            .change_order_status(
                ChangeOrderStatus::new(result.aggregate.id().unwrap(), PackageStatus::Error)
                    .for_order(order),
            )
            .await
            .unwrap();
        assert!(!ledger.is_order_line_packaged(order, line).await.unwrap());
        assert_eq!(ledger.packages_with_order(order).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn packing_an_existing_package_id_conflicts() {
        let (_, _, packages) = services();
        let cmd = PackOrders::new(
            ProfileId::new(),
            AggregateId::new(),
            vec![PackageOrder::new(OrderId::new(), OrderLineId::new())],
        );

        packages.pack(cmd.clone()).await.unwrap();
        let result = packages.pack(cmd).await;
        assert!(matches!(
            result,
            Err(DomainError::Package(domain::PackageError::AlreadyPacked))
        ));
    }
}
