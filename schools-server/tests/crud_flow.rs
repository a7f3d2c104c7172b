//! End-to-end dispatcher behaviour over the in-memory store

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceExt;

use schools_server::{
    build_router, DbConfig, HttpMetrics, MemoryStore, PgSchoolStore, Route, SchoolStore,
    ServerConfig,
};

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    metrics: Arc<HttpMetrics>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(HttpMetrics::new().expect("registry"));
        let config = ServerConfig {
            static_dir: None,
            ..ServerConfig::default()
        };
        let app = build_router(store.clone(), Some(metrics.clone()), &config);
        Self {
            app,
            store,
            metrics,
        }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Send a body verbatim with an optional content type.
    async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: &'static str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }

        let response = self
            .app
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn full_lifecycle_scenario() {
    let h = Harness::new();

    let (status, body) = h
        .json("POST", "/schools", Some(json!({ "name": "Vishal", "address": "Delhi" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 1, "name": "Vishal", "address": "Delhi" }));

    let (status, body) = h.json("GET", "/schools/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 1, "name": "Vishal", "address": "Delhi" }));

    let (status, body) = h
        .json("PUT", "/schools/1", Some(json!({ "name": "V", "address": "Pune" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 1, "name": "V", "address": "Pune" }));

    let (status, body) = h.json("DELETE", "/schools/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "Deleted successfully",
            "deleted": { "id": 1, "name": "V", "address": "Pune" }
        })
    );

    let (status, body) = h.json("GET", "/schools/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Not found" }));
}

#[tokio::test]
async fn list_returns_every_create_in_id_order() {
    let h = Harness::new();
    for i in 0..5 {
        let (status, _) = h
            .json("POST", "/schools", Some(json!({ "name": format!("s{i}"), "address": "x" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = h.json("GET", "/schools", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn empty_list_is_success() {
    let h = Harness::new();
    let (status, body) = h.json("GET", "/schools", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_without_address_stores_null() {
    let h = Harness::new();
    let (status, body) = h.json("POST", "/schools", Some(json!({ "name": "Solo" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 1, "name": "Solo", "address": null }));
}

#[tokio::test]
async fn missing_ids_are_404_for_every_operation() {
    let h = Harness::new();
    let not_found = json!({ "message": "Not found" });

    let (status, body) = h.json("GET", "/schools/42", None).await;
    assert_eq!((status, &body), (StatusCode::NOT_FOUND, &not_found));

    let (status, body) = h
        .json("PUT", "/schools/42", Some(json!({ "name": "a", "address": "b" })))
        .await;
    assert_eq!((status, &body), (StatusCode::NOT_FOUND, &not_found));

    let (status, body) = h.json("DELETE", "/schools/42", None).await;
    assert_eq!((status, &body), (StatusCode::NOT_FOUND, &not_found));

    let (status, body) = h.json("GET", "/schools/not-a-number", None).await;
    assert_eq!((status, &body), (StatusCode::NOT_FOUND, &not_found));
}

#[tokio::test]
async fn second_delete_is_404() {
    let h = Harness::new();
    h.json("POST", "/schools", Some(json!({ "name": "A", "address": "B" })))
        .await;

    let (status, _) = h.json("DELETE", "/schools/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.json("DELETE", "/schools/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_failure_is_bare_500() {
    let h = Harness::new();
    h.store.set_failing(true);

    for (method, uri, body) in [
        ("POST", "/schools", Some(json!({ "name": "a", "address": "b" }))),
        ("GET", "/schools", None),
        ("GET", "/schools/1", None),
        ("PUT", "/schools/1", Some(json!({ "name": "a", "address": "b" }))),
        ("DELETE", "/schools/1", None),
        ("GET", "/setup", None),
    ] {
        let (status, bytes) = h.send(method, uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert!(bytes.is_empty(), "{method} {uri} leaked a body");
    }

    assert_eq!(h.metrics.count("POST", Route::Schools, 500), 1);
    assert_eq!(h.metrics.count("GET", Route::Schools, 500), 1);
    assert_eq!(h.metrics.count("GET", Route::SchoolById, 500), 1);
    assert_eq!(h.metrics.count("PUT", Route::SchoolById, 500), 1);
    assert_eq!(h.metrics.count("DELETE", Route::SchoolById, 500), 1);
    assert_eq!(h.metrics.count("GET", Route::Setup, 500), 1);
}

#[tokio::test]
async fn malformed_body_is_400_and_counted() {
    let h = Harness::new();
    let (status, body) = h
        .send_raw("POST", "/schools", Some("application/json"), "{not json")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Malformed JSON body" }));
    assert_eq!(h.metrics.count("POST", Route::Schools, 400), 1);
    assert!(h.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_without_content_type_stores_nulls() {
    let h = Harness::new();
    let (status, body) = h
        .send_raw("POST", "/schools", None, r#"{"name":"ignored"}"#)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 1, "name": null, "address": null }));

    let (status, body) = h
        .send_raw(
            "POST",
            "/schools",
            Some("application/x-www-form-urlencoded"),
            "name=a&address=b",
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 2, "name": null, "address": null }));
    assert_eq!(h.metrics.count("POST", Route::Schools, 201), 2);
}

#[tokio::test]
async fn create_with_empty_json_body_stores_nulls() {
    let h = Harness::new();
    let (status, body) = h
        .send_raw("POST", "/schools", Some("application/json"), "")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 1, "name": null, "address": null }));
}

#[tokio::test]
async fn non_string_fields_are_stored_as_text() {
    let h = Harness::new();
    let (status, body) = h
        .send_raw(
            "POST",
            "/schools",
            Some("application/json"),
            r#"{"name":5,"address":false}"#,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 1, "name": "5", "address": "false" }));
}

#[tokio::test]
async fn update_without_body_clears_fields() {
    let h = Harness::new();
    h.json("POST", "/schools", Some(json!({ "name": "A", "address": "B" })))
        .await;

    let (status, body) = h.send_raw("PUT", "/schools/1", None, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 1, "name": null, "address": null }));
}

/// Bind a server that accepts connections and never answers.
async fn silent_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    port
}

#[tokio::test(start_paused = true)]
async fn stalled_store_is_bare_500_and_counted() {
    let port = silent_port().await;
    let config = DbConfig::from_lookup(move |k| match k {
        "DB_HOST" => Some("127.0.0.1".into()),
        "DB_PORT" => Some(port.to_string()),
        "DB_TIMEOUT_SECS" => Some("1".into()),
        _ => None,
    });
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(60))
        .connect_lazy_with(config.connect_options());
    let store = Arc::new(PgSchoolStore::new(pool, config.timeout));

    let metrics = Arc::new(HttpMetrics::new().unwrap());
    let server_config = ServerConfig {
        static_dir: None,
        ..ServerConfig::default()
    };
    let app = build_router(store, Some(metrics.clone()), &server_config);

    for uri in ["/schools", "/schools/1"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty(), "{uri} leaked a body");
    }

    assert_eq!(metrics.count("GET", Route::Schools, 500), 1);
    assert_eq!(metrics.count("GET", Route::SchoolById, 500), 1);
}

#[tokio::test]
async fn each_request_moves_exactly_one_counter() {
    let h = Harness::new();

    let requests: Vec<(&str, &str, Option<Value>, (&str, &str, &str))> = vec![
        ("POST", "/schools", Some(json!({ "name": "a", "address": "b" })), ("POST", "/schools", "201")),
        ("GET", "/schools", None, ("GET", "/schools", "200")),
        ("GET", "/schools/1", None, ("GET", "/schools/:id", "200")),
        ("GET", "/schools/9", None, ("GET", "/schools/:id", "404")),
        ("PUT", "/schools/1", Some(json!({ "name": "c", "address": "d" })), ("PUT", "/schools/:id", "200")),
        ("DELETE", "/schools/1", None, ("DELETE", "/schools/:id", "200")),
        ("DELETE", "/schools/1", None, ("DELETE", "/schools/:id", "404")),
        ("GET", "/setup", None, ("GET", "/setup", "200")),
    ];

    for (method, uri, body, (m, route, status)) in requests {
        let before = h.metrics.snapshot();
        h.send(method, uri, body).await;
        let after = h.metrics.snapshot();

        let key = (m.to_owned(), route.to_owned(), status.to_owned());
        let was = before.get(&key).copied().unwrap_or(0);
        assert_eq!(after.get(&key).copied(), Some(was + 1), "{method} {uri}");

        for (other, value) in &after {
            if other != &key {
                assert_eq!(before.get(other).copied().unwrap_or(0), *value, "{method} {uri} touched {other:?}");
            }
        }
    }
}

#[tokio::test]
async fn metrics_and_health_are_not_counted() {
    let h = Harness::new();
    let (status, _) = h.send("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, bytes) = h.send("GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(bytes).unwrap();
    assert!(!text.contains(r#"route="/metrics""#));
    assert!(h.metrics.snapshot().is_empty());
}

#[tokio::test]
async fn setup_is_idempotent() {
    let h = Harness::new();
    for _ in 0..2 {
        let (status, body) = h.json("GET", "/setup", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Table ready with some data" }));
    }

    let (_, body) = h.json("GET", "/schools", None).await;
    assert_eq!(
        body,
        json!([
            { "id": 1, "name": "Vishal", "address": "Delhi" },
            { "id": 2, "name": "Vivek", "address": "Mumbai" }
        ])
    );
}

#[tokio::test]
async fn disabled_metrics_still_serve_requests() {
    let config = ServerConfig {
        static_dir: None,
        ..ServerConfig::default()
    };
    let app = build_router(Arc::new(MemoryStore::new()), None, &config);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/schools")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"a","address":"b"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
    let h = Arc::new(Harness::new());
    let handles: Vec<_> = (0..20)
        .map(|i| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                let (status, body) = h
                    .json("POST", "/schools", Some(json!({ "name": format!("n{i}"), "address": "a" })))
                    .await;
                assert_eq!(status, StatusCode::CREATED);
                body["id"].as_i64().unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);
    assert_eq!(h.metrics.count("POST", Route::Schools, 201), 20);
}
