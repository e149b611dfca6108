//! REST test macro for transaction store backends.
//!
//! The `rest_api_tests!` macro builds the full router over a store and checks
//! the transaction endpoints end to end:
//! JSON → HTTP request → handler → service → store → HTTP response → JSON.
//!
//! # Generated Tests
//!
//! - `test_rest_create_defaults_to_locked`, `test_rest_create_pending_legacy_spelling`
//! - `test_rest_create_validation_errors`, `test_rest_create_terminal_status_rejected`
//! - `test_rest_list_newest_first_and_scoped`, `test_rest_list_bad_limit`
//! - `test_rest_list_repeated_limit`
//! - `test_rest_get_not_found`, `test_rest_get_invalid_id`
//! - `test_rest_patch_complete_with_rating`, `test_rest_patch_empty_body`
//! - `test_rest_patch_invalid_transition`, `test_rest_patch_rating_on_cancel`
//! - `test_rest_patch_lock_records_renter`, `test_rest_patch_late_rating_once`
//! - `test_rest_preview_then_confirm`, `test_rest_confirm_twice_is_stale`
//! - `test_rest_confirm_wrong_id`, `test_rest_share_link_round_trip`

/// Generate a REST test suite for a storage backend.
///
/// `$store_factory` must produce a fresh `impl TransactionStore + 'static`.
#[macro_export]
macro_rules! rest_api_tests {
    ($store_factory:expr) => {
        mod rest_api_tests {
            use super::*;
            use axum::http::StatusCode;
            use axum_test::TestServer;
            use nexus::config::NexusConfig;
            use nexus::server::ServerBuilder;
            use serde_json::{Value, json};

            async fn make_server() -> TestServer {
                let mut config = NexusConfig::default();
                config.server.public_origin = "https://nexus.example".to_string();

                let router = ServerBuilder::new()
                    .with_config(config)
                    .with_store($store_factory)
                    .build()
                    .unwrap();
                TestServer::new(router)
            }

            async fn create(server: &TestServer, body: Value) -> Value {
                let response = server.post("/transactions").json(&body).await;
                response.assert_status(StatusCode::CREATED);
                response.json::<Value>()["transaction"].clone()
            }

            fn id_of(tx: &Value) -> String {
                tx["id"].as_str().unwrap().to_string()
            }

            // ==============================================================
            // Create
            // ==============================================================

            #[tokio::test]
            async fn test_rest_create_defaults_to_locked() {
                let server = make_server().await;

                let response = server
                    .post("/transactions")
                    .json(&json!({
                        "hostClientId": "host-123",
                        "hostName": "Host Taro",
                        "carName": "Prius",
                        "deposit": 200,
                        "startDate": "2025-11-25",
                        "endDate": "2025-11-26"
                    }))
                    .await;

                response.assert_status(StatusCode::CREATED);
                let body: Value = response.json();
                assert_eq!(body["ok"], true);
                let tx = &body["transaction"];
                assert_eq!(tx["car_name"], "Prius");
                assert_eq!(tx["deposit"], 200.0);
                assert_eq!(tx["status"], "locked");
                assert_eq!(tx["start_date"], "2025-11-25");
                assert!(tx["rating"].is_null());
                uuid::Uuid::parse_str(tx["id"].as_str().unwrap()).unwrap();
            }

            #[tokio::test]
            async fn test_rest_create_pending_legacy_spelling() {
                let server = make_server().await;
                let tx = create(
                    &server,
                    json!({ "carName": "Fit", "deposit": 50, "status": "pending_deposit" }),
                )
                .await;
                assert_eq!(tx["status"], "pending");
            }

            #[tokio::test]
            async fn test_rest_create_validation_errors() {
                let server = make_server().await;

                let response = server
                    .post("/transactions")
                    .json(&json!({ "carName": "   ", "deposit": -5 }))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["ok"], false);
                assert_eq!(body["code"], "VALIDATION_ERROR");
                let fields: Vec<&str> = body["details"]["fields"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|f| f["field"].as_str().unwrap())
                    .collect();
                assert_eq!(fields, vec!["carName", "deposit"]);
            }

            #[tokio::test]
            async fn test_rest_create_terminal_status_rejected() {
                let server = make_server().await;
                let response = server
                    .post("/transactions")
                    .json(&json!({ "carName": "Fit", "deposit": 50, "status": "completed" }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);

                let list: Value = server.get("/transactions").await.json();
                assert!(list["transactions"].as_array().unwrap().is_empty());
            }

            // ==============================================================
            // List
            // ==============================================================

            #[tokio::test]
            async fn test_rest_list_newest_first_and_scoped() {
                let server = make_server().await;
                for (host, car) in [("host-123", "Prius"), ("host-999", "Fit"), ("host-123", "Model 3")] {
                    create(
                        &server,
                        json!({ "hostClientId": host, "carName": car, "deposit": 100 }),
                    )
                    .await;
                    tick().await;
                }

                let body: Value = server
                    .get("/transactions")
                    .add_query_param("host", "host-123")
                    .await
                    .json();
                assert_eq!(body["ok"], true);
                let cars: Vec<&str> = body["transactions"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|tx| tx["car_name"].as_str().unwrap())
                    .collect();
                assert_eq!(cars, vec!["Model 3", "Prius"]);

                let body: Value = server
                    .get("/transactions")
                    .add_query_param("limit", "1")
                    .await
                    .json();
                assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
                assert_eq!(body["transactions"][0]["car_name"], "Model 3");
            }

            #[tokio::test]
            async fn test_rest_list_bad_limit() {
                let server = make_server().await;
                let response = server
                    .get("/transactions")
                    .add_query_param("limit", "many")
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
            }

            #[tokio::test]
            async fn test_rest_list_repeated_limit() {
                let server = make_server().await;
                let response = server.get("/transactions?limit=1&limit=2").await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["ok"], false);
                assert_eq!(body["code"], "VALIDATION_ERROR");
                assert!(body["error"].as_str().unwrap().contains("query"));
            }

            // ==============================================================
            // Get
            // ==============================================================

            #[tokio::test]
            async fn test_rest_get_not_found() {
                let server = make_server().await;
                let response = server
                    .get(&format!("/transactions/{}", uuid::Uuid::new_v4()))
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);
                let body: Value = response.json();
                assert_eq!(body["ok"], false);
                assert_eq!(body["code"], "TRANSACTION_NOT_FOUND");
            }

            #[tokio::test]
            async fn test_rest_get_invalid_id() {
                let server = make_server().await;
                let response = server.get("/transactions/not-a-uuid").await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
            }

            // ==============================================================
            // PATCH
            // ==============================================================

            #[tokio::test]
            async fn test_rest_patch_complete_with_rating() {
                let server = make_server().await;
                let tx = create(&server, json!({ "carName": "Prius", "deposit": 200 })).await;
                let path = format!("/transactions/{}", id_of(&tx));

                let response = server
                    .patch(&path)
                    .json(&json!({ "status": "completed", "rating": "good" }))
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["transaction"]["status"], "completed");
                assert_eq!(body["transaction"]["rating"], "good");

                let fetched: Value = server.get(&path).await.json();
                assert_eq!(fetched["transaction"]["status"], "completed");
            }

            #[tokio::test]
            async fn test_rest_patch_empty_body() {
                let server = make_server().await;
                let tx = create(&server, json!({ "carName": "Prius", "deposit": 200 })).await;

                let response = server
                    .patch(&format!("/transactions/{}", id_of(&tx)))
                    .json(&json!({}))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
            }

            #[tokio::test]
            async fn test_rest_patch_invalid_transition() {
                let server = make_server().await;
                let tx = create(&server, json!({ "carName": "Prius", "deposit": 200 })).await;
                let path = format!("/transactions/{}", id_of(&tx));

                server
                    .patch(&path)
                    .json(&json!({ "status": "cancelled" }))
                    .await
                    .assert_status_ok();

                let response = server
                    .patch(&path)
                    .json(&json!({ "status": "completed" }))
                    .await;
                response.assert_status(StatusCode::CONFLICT);
                let body: Value = response.json();
                assert_eq!(body["code"], "INVALID_TRANSITION");
                assert_eq!(body["details"]["from"], "cancelled");
            }

            #[tokio::test]
            async fn test_rest_patch_rating_on_cancel() {
                let server = make_server().await;
                let tx = create(&server, json!({ "carName": "Prius", "deposit": 200 })).await;

                let response = server
                    .patch(&format!("/transactions/{}", id_of(&tx)))
                    .json(&json!({ "status": "cancelled", "rating": "bad" }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["code"], "RATING_NOT_ALLOWED");
            }

            #[tokio::test]
            async fn test_rest_patch_lock_records_renter() {
                let server = make_server().await;
                let pending = json!({ "carName": "Prius", "deposit": 200, "status": "pending" });

                let tx = create(&server, pending.clone()).await;
                let response = server
                    .patch(&format!("/transactions/{}", id_of(&tx)))
                    .json(&json!({ "status": "locked" }))
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["transaction"]["renter_id"], "renter-456");

                let tx = create(&server, pending).await;
                let path = format!("/transactions/{}", id_of(&tx));
                server
                    .patch(&path)
                    .json(&json!({ "status": "locked", "renter_id": "renter-789" }))
                    .await
                    .assert_status_ok();
                let fetched: Value = server.get(&path).await.json();
                assert_eq!(fetched["transaction"]["renter_id"], "renter-789");
            }

            #[tokio::test]
            async fn test_rest_patch_late_rating_once() {
                let server = make_server().await;
                let tx = create(&server, json!({ "carName": "Prius", "deposit": 200 })).await;
                let path = format!("/transactions/{}", id_of(&tx));
                server
                    .patch(&path)
                    .json(&json!({ "status": "completed" }))
                    .await
                    .assert_status_ok();

                server
                    .patch(&path)
                    .json(&json!({ "rating": "good" }))
                    .await
                    .assert_status_ok();

                let response = server.patch(&path).json(&json!({ "rating": "bad" })).await;
                response.assert_status(StatusCode::CONFLICT);
                assert_eq!(response.json::<Value>()["code"], "ALREADY_RATED");

                let fetched: Value = server.get(&path).await.json();
                assert_eq!(fetched["transaction"]["rating"], "good");
            }

            // ==============================================================
            // Two-step transitions
            // ==============================================================

            #[tokio::test]
            async fn test_rest_preview_then_confirm() {
                let server = make_server().await;
                let tx = create(
                    &server,
                    json!({ "carName": "Prius", "deposit": 200, "status": "pending" }),
                )
                .await;
                let id = id_of(&tx);

                let response = server
                    .post(&format!("/transactions/{}/transitions", id))
                    .json(&json!({ "status": "locked" }))
                    .await;
                response.assert_status_ok();
                let preview = response.json::<Value>()["preview"].clone();
                assert_eq!(preview["from"], "pending");
                assert_eq!(preview["to"], "locked");
                assert_eq!(preview["actor"], "renter");
                assert!(preview["prompt"].as_str().unwrap().contains("200 USDC"));

                // Nothing written yet
                let fetched: Value = server.get(&format!("/transactions/{}", id)).await.json();
                assert_eq!(fetched["transaction"]["status"], "pending");

                let response = server
                    .post(&format!("/transactions/{}/transitions/confirm", id))
                    .json(&preview)
                    .await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["transaction"]["status"], "locked");
            }

            #[tokio::test]
            async fn test_rest_confirm_twice_is_stale() {
                let server = make_server().await;
                let tx = create(&server, json!({ "carName": "Prius", "deposit": 200 })).await;
                let id = id_of(&tx);

                let preview = server
                    .post(&format!("/transactions/{}/transitions", id))
                    .json(&json!({ "status": "completed", "rating": "normal" }))
                    .await
                    .json::<Value>()["preview"]
                    .clone();

                let confirm = format!("/transactions/{}/transitions/confirm", id);
                server.post(&confirm).json(&preview).await.assert_status_ok();

                let response = server.post(&confirm).json(&preview).await;
                response.assert_status(StatusCode::CONFLICT);
                assert_eq!(response.json::<Value>()["code"], "STALE_TRANSITION");
            }

            #[tokio::test]
            async fn test_rest_confirm_wrong_id() {
                let server = make_server().await;
                let a = create(&server, json!({ "carName": "Prius", "deposit": 200 })).await;
                let b = create(&server, json!({ "carName": "Fit", "deposit": 100 })).await;

                let preview = server
                    .post(&format!("/transactions/{}/transitions", id_of(&a)))
                    .json(&json!({ "status": "cancelled" }))
                    .await
                    .json::<Value>()["preview"]
                    .clone();

                let response = server
                    .post(&format!("/transactions/{}/transitions/confirm", id_of(&b)))
                    .json(&preview)
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);

                let fetched: Value = server
                    .get(&format!("/transactions/{}", id_of(&a)))
                    .await
                    .json();
                assert_eq!(fetched["transaction"]["status"], "locked");
            }

            // ==============================================================
            // Share link
            // ==============================================================

            #[tokio::test]
            async fn test_rest_share_link_round_trip() {
                let server = make_server().await;
                let tx = create(
                    &server,
                    json!({
                        "hostName": "Host Taro",
                        "carName": "Prius",
                        "deposit": 200,
                        "startDate": "2025-11-25",
                        "status": "pending"
                    }),
                )
                .await;

                let body: Value = server
                    .get(&format!("/transactions/{}/share-link", id_of(&tx)))
                    .await
                    .json();
                let url = body["url"].as_str().unwrap();
                assert!(url.starts_with("https://nexus.example/tx?"));

                let query = url.split_once('?').unwrap().1;
                let response = server.get(&format!("/tx?{}", query)).await;
                response.assert_status_ok();
                let view: Value = response.json();
                assert_eq!(view["state"], "review");
                assert_eq!(view["link"]["car"], "Prius");
                assert_eq!(view["link"]["host"], "Host Taro");
                assert_eq!(view["link"]["transaction_id"], tx["id"]);
                assert_eq!(view["period"], "2025-11-25 ~ unspecified");
            }
        }
    };
}
