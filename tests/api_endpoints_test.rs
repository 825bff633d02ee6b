use aura_terminal::api;
use aura_terminal::commentary::{CommentaryProvider, MockCommentaryProvider, NewsProvider};
use aura_terminal::db::{init_db, PreferencesStore};
use aura_terminal::domain::Decimal;
use aura_terminal::engine::ScriptedFeed;
use aura_terminal::terminal::{Simulator, TerminalController, TerminalTask};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    _task: TerminalTask,
    _temp: TempDir,
}

async fn setup_test_app(provider: MockCommentaryProvider) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let prefs = Arc::new(PreferencesStore::new(pool));

    let sim = Simulator::with_defaults(
        Box::new(ScriptedFeed::new()),
        Decimal::from_str_canonical("100000").unwrap(),
    );
    let (terminal, task) = TerminalController::spawn(sim, Duration::from_secs(3600));

    let provider = Arc::new(provider);
    let commentary: Arc<dyn CommentaryProvider> = provider.clone();
    let news: Arc<dyn NewsProvider> = provider;
    let app = api::create_router(api::AppState::new(terminal, prefs, commentary, news));

    TestApp {
        app,
        _task: task,
        _temp: temp_dir,
    }
}

async fn request(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_and_ready() {
    let t = setup_test_app(MockCommentaryProvider::new()).await;

    let (status, body) = request(&t.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = request(&t.app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_instruments_listing() {
    let t = setup_test_app(MockCommentaryProvider::new()).await;

    let (status, body) = request(&t.app, "GET", "/v1/instruments", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 18);
    assert_eq!(list[0]["symbol"], "BTC");
    assert_eq!(list[0]["displayPrice"], "68432.12");
    assert_eq!(list[0]["favorite"], false);

    let (status, body) = request(&t.app, "GET", "/v1/instruments?category=forex", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 6);
    assert_eq!(list[0]["displayPrice"], "1.0845");

    let (status, _) = request(&t.app, "GET", "/v1/instruments?category=stocks", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_place_market_order_and_read_portfolio() {
    let t = setup_test_app(MockCommentaryProvider::new()).await;

    let (status, order) = request(
        &t.app,
        "POST",
        "/v1/orders",
        Some(json!({"instrumentId": "1", "side": "buy", "mode": "market", "amount": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "completed");
    assert_eq!(order["price"], 68432.12);

    let (status, portfolio) = request(&t.app, "GET", "/v1/portfolio", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(portfolio["balance"], 31567.88);
    assert_eq!(portfolio["netLiquidity"], 100000.0);
    assert_eq!(portfolio["positions"][0]["instrumentId"], "1");

    let (_, orders) = request(&t.app, "GET", "/v1/orders?status=completed", None).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_rejections() {
    let t = setup_test_app(MockCommentaryProvider::new()).await;

    let (status, body) = request(
        &t.app,
        "POST",
        "/v1/orders",
        Some(json!({"instrumentId": "1", "side": "buy", "mode": "market", "amount": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Amount"));

    let (status, _) = request(
        &t.app,
        "POST",
        "/v1/orders",
        Some(json!({"instrumentId": "1", "side": "buy", "mode": "market", "amount": 10.0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = request(
        &t.app,
        "POST",
        "/v1/orders",
        Some(json!({"instrumentId": "zzz", "side": "buy", "mode": "market", "amount": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&t.app, "GET", "/v1/orders?status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, orders) = request(&t.app, "GET", "/v1/orders", None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_and_move_stop() {
    let t = setup_test_app(MockCommentaryProvider::new()).await;

    let (_, limit) = request(
        &t.app,
        "POST",
        "/v1/orders",
        Some(json!({
            "instrumentId": "1", "side": "buy", "mode": "limit",
            "amount": 1.0, "limitPrice": 60000.0
        })),
    )
    .await;
    assert_eq!(limit["status"], "pending");
    let (_, portfolio) = request(&t.app, "GET", "/v1/portfolio", None).await;
    assert_eq!(portfolio["available"], 40000.0);

    let id = limit["id"].as_str().unwrap();
    let (status, body) = request(&t.app, "POST", &format!("/v1/orders/{}/move-stop", id), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, cancelled) = request(&t.app, "POST", &format!("/v1/orders/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    let (_, portfolio) = request(&t.app, "GET", "/v1/portfolio", None).await;
    assert_eq!(portfolio["available"], 100000.0);

    let (status, _) = request(&t.app, "POST", &format!("/v1/orders/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = request(
        &t.app,
        "POST",
        "/v1/orders/6f1c2a9e-8d1b-4d8e-9a55-0f3c9b1f2e7a/cancel",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&t.app, "POST", "/v1/orders/not-a-uuid/cancel", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, market) = request(
        &t.app,
        "POST",
        "/v1/orders",
        Some(json!({
            "instrumentId": "3", "side": "buy", "mode": "market",
            "amount": 2.0, "stopLoss": 100.0
        })),
    )
    .await;
    let id = market["id"].as_str().unwrap();
    let (status, moved) = request(&t.app, "POST", &format!("/v1/orders/{}/move-stop", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["stopLoss"], 145.88);

    let (_, trades) = request(&t.app, "GET", "/v1/trades/open", None).await;
    let trades = trades.as_array().unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0]["order"]["id"], id);
    assert_eq!(trades[0]["pnlPercent"], 0.0);
}

#[tokio::test]
async fn test_transfers() {
    let t = setup_test_app(MockCommentaryProvider::new()).await;

    let (status, record) = request(
        &t.app,
        "POST",
        "/v1/transfers/deposit",
        Some(json!({"amount": 5000.0, "method": "Bank Transfer"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["kind"], "deposit");
    assert_eq!(record["method"], "Bank Transfer");

    let (status, _) = request(
        &t.app,
        "POST",
        "/v1/transfers/withdraw",
        Some(json!({"amount": 200000.0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, transfers) = request(&t.app, "GET", "/v1/transfers", None).await;
    let transfers = transfers.as_array().unwrap();
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[1]["method"], "Institutional Wire");

    let (_, portfolio) = request(&t.app, "GET", "/v1/portfolio", None).await;
    assert_eq!(portfolio["balance"], 105000.0);
}

#[tokio::test]
async fn test_account_onboarding() {
    let t = setup_test_app(MockCommentaryProvider::new()).await;

    let (status, account) = request(&t.app, "GET", "/v1/account", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["needsSetup"], true);
    assert!(account["profile"].is_null());

    let (status, _) = request(
        &t.app,
        "POST",
        "/v1/account/setup",
        Some(json!({"name": "Ada", "brokerId": "brk-0"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, account) = request(
        &t.app,
        "POST",
        "/v1/account/setup",
        Some(json!({"name": "Ada", "brokerId": "brk-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["needsSetup"], false);
    assert_eq!(account["profile"]["level"], "Novice");
    assert_eq!(account["broker"]["name"], "Nexus Prime");
    assert_eq!(account["broker"]["status"], "Connected");

    let (_, account) = request(&t.app, "GET", "/v1/account", None).await;
    assert_eq!(account["profile"]["name"], "Ada");
}

#[tokio::test]
async fn test_favorites_and_layouts() {
    let t = setup_test_app(MockCommentaryProvider::new()).await;

    let (status, toggled) = request(&t.app, "POST", "/v1/favorites/fx-2/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["favorite"], true);

    let (_, favorites) = request(&t.app, "GET", "/v1/favorites", None).await;
    assert_eq!(favorites, json!(["fx-2"]));

    let (_, list) = request(&t.app, "GET", "/v1/instruments?category=forex", None).await;
    assert_eq!(list[1]["favorite"], true);

    let (status, _) = request(&t.app, "POST", "/v1/favorites/nope/toggle", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let layout = json!({
        "id": "ignored",
        "name": "Scalper",
        "indicators": {"sma": true, "ema": false, "rsi": true, "volume": false},
        "showFib": false,
        "theme": "neon",
        "timeFrame": "5m",
        "timestamp": 1700000000000i64
    });
    let (status, layouts) = request(&t.app, "PUT", "/v1/layouts/main", Some(layout)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(layouts[0]["id"], "main");
    assert_eq!(layouts[0]["timeFrame"], "5m");

    let (status, _) = request(&t.app, "DELETE", "/v1/layouts/main", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = request(&t.app, "DELETE", "/v1/layouts/main", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insight_and_news() {
    let t = setup_test_app(MockCommentaryProvider::new()).await;

    let (status, body) = request(&t.app, "GET", "/v1/instruments/2/insight", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["insight"]["sentiment"], "Neutral");
    assert!(body["insight"]["summary"]
        .as_str()
        .unwrap()
        .starts_with("Ethereum (ETH)"));

    let (status, _) = request(&t.app, "GET", "/v1/instruments/zzz/insight", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = request(&t.app, "GET", "/v1/news", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "crypto");
    assert!(body["articles"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_commentary_failure_degrades_to_no_data() {
    let t = setup_test_app(MockCommentaryProvider::new().failing()).await;

    let (status, body) = request(&t.app, "GET", "/v1/instruments/1/insight", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["insight"].is_null());

    let (status, body) = request(&t.app, "GET", "/v1/news?category=indices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["articles"].as_array().unwrap().is_empty());

    // Simulation state is untouched.
    let (_, portfolio) = request(&t.app, "GET", "/v1/portfolio", None).await;
    assert_eq!(portfolio["balance"], 100000.0);
}
