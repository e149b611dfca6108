//! Macro-generated test suite for `TransactionStore` contract validation.
//!
//! # Generated Tests
//!
//! ## Insert / Get
//! - `test_insert_assigns_id_and_timestamps`
//! - `test_insert_keeps_optional_fields`
//! - `test_get_nonexistent`
//!
//! ## List
//! - `test_list_empty`
//! - `test_list_newest_first`
//! - `test_list_respects_limit`
//! - `test_list_scoped_to_host`
//!
//! ## Status updates
//! - `test_update_status_applies_change`
//! - `test_update_status_nonexistent`
//! - `test_update_status_stale_leaves_record`
//! - `test_concurrent_update_single_winner`
//! - `test_update_status_records_renter`
//!
//! ## Late ratings
//! - `test_rate_completed_record`
//! - `test_rate_requires_completed`
//! - `test_rate_nonexistent`
//! - `test_concurrent_rate_single_winner`

/// Generate a full `TransactionStore` conformance test suite.
///
/// `$factory` must evaluate to a fresh, empty store implementing
/// `TransactionStore + 'static`. It is re-evaluated for each test.
#[macro_export]
macro_rules! transaction_store_tests {
    ($factory:expr) => {
        mod transaction_store_contract_tests {
            use super::*;
            use nexus::core::store::TransactionStore;
            use nexus::core::transaction::{
                ListQuery, Rating, StatusChange, TransactionStatus,
            };
            use std::sync::Arc;
            use uuid::Uuid;

            // ==================================================================
            // Insert & Get
            // ==================================================================

            #[tokio::test]
            async fn test_insert_assigns_id_and_timestamps() {
                let store = $factory;

                let a = store.insert(draft("Prius", 200.0)).await.unwrap();
                let b = store.insert(draft("Prius", 200.0)).await.unwrap();

                assert_ne!(a.id, b.id, "Each insert must get its own id");
                assert_eq!(a.status, TransactionStatus::Locked);
                assert!(a.rating.is_none());
                assert!(a.updated_at >= a.created_at);

                let fetched = store.get(&a.id).await.unwrap().unwrap();
                assert_eq!(fetched.id, a.id);
                assert_eq!(fetched.car_name, "Prius");
                assert_eq!(fetched.status, TransactionStatus::Locked);
            }

            #[tokio::test]
            async fn test_insert_keeps_optional_fields() {
                let store = $factory;

                let tx = store
                    .insert(full_draft("host-123", "Model 3", 312.75))
                    .await
                    .unwrap();
                let fetched = store.get(&tx.id).await.unwrap().unwrap();

                assert_eq!(fetched.host_client_id.as_deref(), Some("host-123"));
                assert_eq!(fetched.host_name.as_deref(), Some("Host Taro"));
                assert!((fetched.deposit - 312.75).abs() < f64::EPSILON);
                assert_eq!(fetched.start_date, tx.start_date);
                assert_eq!(fetched.end_date, tx.end_date);
                assert!(fetched.start_date.is_some());
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let store = $factory;
                let result = store.get(&Uuid::new_v4()).await.unwrap();
                assert!(result.is_none(), "Unknown id should return None");
            }

            // ==================================================================
            // List
            // ==================================================================

            #[tokio::test]
            async fn test_list_empty() {
                let store = $factory;
                let all = store.list(&ListQuery::new(50)).await.unwrap();
                assert!(all.is_empty(), "List on empty store should return empty vec");
            }

            #[tokio::test]
            async fn test_list_newest_first() {
                let store = $factory;
                let mut ids = Vec::new();
                for car in ["Prius", "Model 3", "Fit"] {
                    ids.push(store.insert(draft(car, 100.0)).await.unwrap().id);
                    tick().await;
                }

                let all = store.list(&ListQuery::new(50)).await.unwrap();
                assert_count(&all, 3);
                assert_newest_first(&all);

                ids.reverse();
                let listed: Vec<Uuid> = all.iter().map(|tx| tx.id).collect();
                assert_eq!(listed, ids);
            }

            #[tokio::test]
            async fn test_list_respects_limit() {
                let store = $factory;
                for i in 0..5 {
                    store
                        .insert(draft(&format!("Car {}", i), 10.0))
                        .await
                        .unwrap();
                    tick().await;
                }

                let page = store.list(&ListQuery::new(2)).await.unwrap();
                assert_count(&page, 2);
                assert_eq!(page[0].car_name, "Car 4");
                assert_eq!(page[1].car_name, "Car 3");
            }

            #[tokio::test]
            async fn test_list_scoped_to_host() {
                let store = $factory;
                store.insert(full_draft("host-123", "Prius", 200.0)).await.unwrap();
                store.insert(full_draft("host-999", "Fit", 100.0)).await.unwrap();
                store.insert(draft("Anonymous", 50.0)).await.unwrap();

                let mine = store
                    .list(&ListQuery::new(50).for_host("host-123"))
                    .await
                    .unwrap();
                assert_count(&mine, 1);
                assert_eq!(mine[0].car_name, "Prius");

                let all = store.list(&ListQuery::new(50)).await.unwrap();
                assert_count(&all, 3);
            }

            // ==================================================================
            // Status updates
            // ==================================================================

            #[tokio::test]
            async fn test_update_status_applies_change() {
                let store = $factory;
                let tx = store.insert(draft("Prius", 200.0)).await.unwrap();

                let updated = store
                    .update_status(
                        &tx.id,
                        TransactionStatus::Locked,
                        StatusChange {
                            status: TransactionStatus::Completed,
                            rating: Some(Rating::Good),
                            renter_id: None,
                        },
                    )
                    .await
                    .unwrap();

                assert_eq!(updated.status, TransactionStatus::Completed);
                assert_eq!(updated.rating, Some(Rating::Good));
                assert!(updated.updated_at >= tx.updated_at);

                let fetched = store.get(&tx.id).await.unwrap().unwrap();
                assert_eq!(fetched.status, TransactionStatus::Completed);
                assert_eq!(fetched.rating, Some(Rating::Good));
                assert_eq!(fetched.created_at, tx.created_at);
            }

            #[tokio::test]
            async fn test_update_status_nonexistent() {
                let store = $factory;
                let err = store
                    .update_status(
                        &Uuid::new_v4(),
                        TransactionStatus::Locked,
                        StatusChange {
                            status: TransactionStatus::Cancelled,
                            rating: None,
                            renter_id: None,
                        },
                    )
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "TRANSACTION_NOT_FOUND");
            }

            #[tokio::test]
            async fn test_update_status_stale_leaves_record() {
                let store = $factory;
                let tx = store.insert(pending_draft("Prius", 200.0)).await.unwrap();

                let err = store
                    .update_status(
                        &tx.id,
                        TransactionStatus::Locked,
                        StatusChange {
                            status: TransactionStatus::Completed,
                            rating: None,
                            renter_id: None,
                        },
                    )
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "STALE_TRANSITION");

                let fetched = store.get(&tx.id).await.unwrap().unwrap();
                assert_eq!(fetched.status, TransactionStatus::Pending);
            }

            #[tokio::test]
            async fn test_concurrent_update_single_winner() {
                let store = Arc::new($factory);
                let tx = store.insert(draft("Prius", 200.0)).await.unwrap();

                let mut handles = Vec::new();
                for target in [TransactionStatus::Completed, TransactionStatus::Cancelled] {
                    let store = store.clone();
                    let id = tx.id;
                    handles.push(tokio::spawn(async move {
                        store
                            .update_status(
                                &id,
                                TransactionStatus::Locked,
                                StatusChange {
                                    status: target,
                                    rating: None,
                                    renter_id: None,
                                },
                            )
                            .await
                    }));
                }

                let mut winners = Vec::new();
                let mut stale = 0;
                for handle in handles {
                    match handle.await.unwrap() {
                        Ok(tx) => winners.push(tx.status),
                        Err(e) => {
                            assert_eq!(e.error_code(), "STALE_TRANSITION");
                            stale += 1;
                        }
                    }
                }
                assert_eq!(winners.len(), 1, "Exactly one racing update may commit");
                assert_eq!(stale, 1);

                let fetched = store.get(&tx.id).await.unwrap().unwrap();
                assert_eq!(fetched.status, winners[0]);
            }

            #[tokio::test]
            async fn test_update_status_records_renter() {
                let store = $factory;
                let tx = store.insert(pending_draft("Prius", 200.0)).await.unwrap();
                assert!(tx.renter_id.is_none());

                let locked = store
                    .update_status(
                        &tx.id,
                        TransactionStatus::Pending,
                        StatusChange {
                            status: TransactionStatus::Locked,
                            rating: None,
                            renter_id: Some("renter-456".to_string()),
                        },
                    )
                    .await
                    .unwrap();
                assert_eq!(locked.renter_id.as_deref(), Some("renter-456"));

                store
                    .update_status(
                        &tx.id,
                        TransactionStatus::Locked,
                        StatusChange {
                            status: TransactionStatus::Completed,
                            rating: None,
                            renter_id: None,
                        },
                    )
                    .await
                    .unwrap();
                let fetched = store.get(&tx.id).await.unwrap().unwrap();
                assert_eq!(fetched.renter_id.as_deref(), Some("renter-456"));
            }

            // ==================================================================
            // Late ratings
            // ==================================================================

            async fn completed<S: TransactionStore>(store: &S) -> Uuid {
                let tx = store.insert(draft("Prius", 200.0)).await.unwrap();
                store
                    .update_status(
                        &tx.id,
                        TransactionStatus::Locked,
                        StatusChange {
                            status: TransactionStatus::Completed,
                            rating: None,
                            renter_id: None,
                        },
                    )
                    .await
                    .unwrap();
                tx.id
            }

            #[tokio::test]
            async fn test_rate_completed_record() {
                let store = $factory;
                let id = completed(&store).await;

                let rated = store.rate(&id, Rating::Normal).await.unwrap();
                assert_eq!(rated.rating, Some(Rating::Normal));
                assert_eq!(rated.status, TransactionStatus::Completed);

                let err = store.rate(&id, Rating::Bad).await.unwrap_err();
                assert_eq!(err.error_code(), "ALREADY_RATED");
                let fetched = store.get(&id).await.unwrap().unwrap();
                assert_eq!(fetched.rating, Some(Rating::Normal));
            }

            #[tokio::test]
            async fn test_rate_requires_completed() {
                let store = $factory;
                let tx = store.insert(draft("Prius", 200.0)).await.unwrap();

                let err = store.rate(&tx.id, Rating::Good).await.unwrap_err();
                assert_eq!(err.error_code(), "RATING_NOT_ALLOWED");
                let fetched = store.get(&tx.id).await.unwrap().unwrap();
                assert!(fetched.rating.is_none());
            }

            #[tokio::test]
            async fn test_rate_nonexistent() {
                let store = $factory;
                let err = store.rate(&Uuid::new_v4(), Rating::Good).await.unwrap_err();
                assert_eq!(err.error_code(), "TRANSACTION_NOT_FOUND");
            }

            #[tokio::test]
            async fn test_concurrent_rate_single_winner() {
                let store = Arc::new($factory);
                let id = completed(&*store).await;

                let mut handles = Vec::new();
                for rating in [Rating::Good, Rating::Bad] {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move {
                        store.rate(&id, rating).await
                    }));
                }

                let mut winners = Vec::new();
                for handle in handles {
                    match handle.await.unwrap() {
                        Ok(tx) => winners.push(tx.rating),
                        Err(e) => assert_eq!(e.error_code(), "ALREADY_RATED"),
                    }
                }
                assert_eq!(winners.len(), 1, "Exactly one racing rating may commit");

                let fetched = store.get(&id).await.unwrap().unwrap();
                assert_eq!(fetched.rating, winners[0]);
            }
        }
    };
}
