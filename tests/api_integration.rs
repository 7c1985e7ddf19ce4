//! Integration tests for the OKX REST dispatcher against a mock Axum server.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use okx_trade_sdk::prelude::*;
use okx_trade_sdk::shared::WireError;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

const API_KEY: &str = "test-key";
const SECRET: &str = "test-secret";
const PASSPHRASE: &str = "test-passphrase";

// =============================================================================
// Mock server
// =============================================================================

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: Method,
    path_and_query: String,
    headers: HeaderMap,
    body: String,
}

#[derive(Default)]
struct TestServerState {
    request_count: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl TestServerState {
    async fn last_request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .await
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

fn credentials() -> Credentials {
    Credentials::new(API_KEY, SECRET, PASSPHRASE)
}

fn json_response(status: StatusCode, body: Value) -> Response {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Reject requests whose signature does not match the bytes received.
fn check_signature(headers: &HeaderMap, method: &Method, path_and_query: &str, body: &str) -> bool {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let (Some(key), Some(sign), Some(ts), Some(passphrase)) = (
        header("OK-ACCESS-KEY"),
        header("OK-ACCESS-SIGN"),
        header("OK-ACCESS-TIMESTAMP"),
        header("OK-ACCESS-PASSPHRASE"),
    ) else {
        return false;
    };
    let expected = credentials()
        .sign(ts, method.as_str(), path_and_query, body)
        .unwrap();
    key == API_KEY && passphrase == PASSPHRASE && sign == expected
}

fn is_public(path: &str) -> bool {
    path.ends_with("/rsi-back-testing") || path.ends_with("/ai-param") || path.ends_with("/min-investment")
}

async fn handle_request(
    State(state): State<Arc<TestServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.request_count.fetch_add(1, Ordering::SeqCst);
    let path = uri.path().to_string();
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    state.requests.lock().await.push(RecordedRequest {
        method: method.clone(),
        path_and_query: path_and_query.clone(),
        headers: headers.clone(),
        body: body.clone(),
    });

    if !is_public(&path) && !check_signature(&headers, &method, &path_and_query, &body) {
        return json_response(
            StatusCode::UNAUTHORIZED,
            json!({"code": "50113", "msg": "Invalid Sign", "data": []}),
        );
    }

    match path.as_str() {
        "/api/v5/trade/order" => {
            let request: Value = serde_json::from_str(&body).unwrap_or_default();
            json_response(
                StatusCode::OK,
                json!({
                    "code": "0",
                    "msg": "",
                    "data": [{
                        "ordId": "312269865356374016",
                        "clOrdId": request["clOrdId"],
                        "tag": request["tag"],
                        "ts": "1695190491421",
                        "sCode": "0",
                        "sMsg": ""
                    }]
                }),
            )
        }
        "/api/v5/trade/batch-orders" => json_response(
            StatusCode::OK,
            json!({
                "code": "2",
                "msg": "Bulk operation partially succeeded.",
                "data": [
                    {"ordId": "1", "clOrdId": "a", "tag": "", "sCode": "0", "sMsg": ""},
                    {"ordId": "", "clOrdId": "b", "tag": "", "sCode": "51008", "sMsg": "Insufficient balance"}
                ]
            }),
        ),
        "/api/v5/trade/cancel-order" => json_response(
            StatusCode::OK,
            json!({"code": "51000", "msg": "Parameter ordId error", "data": []}),
        ),
        "/api/v5/trade/orders-pending" => json_response(
            StatusCode::OK,
            json!({"code": "0", "msg": "", "data": []}),
        ),
        "/api/v5/trade/orders-history" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            json_response(StatusCode::OK, json!({"code": "0", "msg": "", "data": []}))
        }
        "/api/v5/tradingBot/grid/stop-order-algo" => json_response(
            StatusCode::OK,
            json!({
                "code": "0",
                "msg": "",
                "data": [{"algoId": "448965992920907776", "algoClOrdId": "", "sCode": "0", "sMsg": "", "tag": ""}]
            }),
        ),
        "/api/v5/tradingBot/grid/rsi-back-testing" => json_response(
            StatusCode::OK,
            json!({"code": "0", "msg": "", "data": [{"triggerNum": "164"}]}),
        ),
        _ => json_response(
            StatusCode::NOT_FOUND,
            json!({"code": "50000", "msg": "unknown path", "data": []}),
        ),
    }
}

async fn start_server(state: Arc<TestServerState>) -> SocketAddr {
    let router = Router::new().fallback(handle_request).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind listener");
    let addr = listener.local_addr().expect("missing local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });

    addr
}

async fn signed_client() -> (OkxRestClient, Arc<TestServerState>) {
    let state = Arc::new(TestServerState::default());
    let addr = start_server(state.clone()).await;
    let client = OkxRestClient::builder(format!("http://{}/", addr))
        .credentials(credentials())
        .build()
        .unwrap();
    (client, state)
}

fn limit_order(cl_ord_id: &str) -> PlaceOrderRequest {
    PlaceOrderRequest::new(
        "BTC-USDT",
        TradeMode::Cash,
        OrderSide::Buy,
        OrderType::Limit,
        rust_decimal::Decimal::new(1, 2),
    )
    .with_price(rust_decimal::Decimal::new(60000, 0))
    .with_client_order_id(cl_ord_id)
}

// =============================================================================
// Tests
// =============================================================================

mod signing {
    use super::*;

    #[tokio::test]
    async fn test_place_order_is_signed_and_tagged() {
        let (client, state) = signed_client().await;

        let ack = client.place_order(&limit_order("b15")).await.unwrap();
        assert_eq!(ack.ord_id, "312269865356374016");
        assert_eq!(ack.cl_ord_id, "b15");
        assert_eq!(ack.tag, BROKER_TAG);
        assert!(ack.is_success());

        let request = state.last_request().await;
        assert_eq!(request.method, Method::POST);
        let body: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["tag"], BROKER_TAG);
        assert_eq!(body["sz"], "0.01");
        assert_eq!(body["px"], "60000");
        assert!(body.get("reduceOnly").is_none());
    }

    #[tokio::test]
    async fn test_get_signs_path_with_query() {
        let (client, state) = signed_client().await;

        let orders = client
            .get_open_orders(
                &OpenOrdersQuery::new()
                    .with_instrument_type(InstrumentType::Spot)
                    .with_cursor(PaginationCursor::after("590").with_limit(10)),
            )
            .await
            .unwrap();
        assert!(orders.is_empty());

        let request = state.last_request().await;
        assert_eq!(
            request.path_and_query,
            "/api/v5/trade/orders-pending?instType=SPOT&after=590&limit=10"
        );
        assert!(request.body.is_empty());
    }

    #[tokio::test]
    async fn test_public_endpoint_needs_no_credentials() {
        let state = Arc::new(TestServerState::default());
        let addr = start_server(state.clone()).await;
        let client = OkxRestClient::new(format!("http://{}", addr)).unwrap();

        let result = client
            .rsi_back_testing(&RsiBacktestQuery::new(
                "BTC-USDT",
                Timeframe::FifteenMinutes,
                rust_decimal::Decimal::new(30, 0),
                14,
            ))
            .await
            .unwrap();
        assert_eq!(result.trigger_num, Some(164));

        let request = state.last_request().await;
        assert!(!request.headers.contains_key("OK-ACCESS-SIGN"));
        assert!(request.path_and_query.contains("duration=1M"));
    }

    #[tokio::test]
    async fn test_signed_endpoint_without_credentials() {
        let state = Arc::new(TestServerState::default());
        let addr = start_server(state.clone()).await;
        let client = OkxRestClient::new(format!("http://{}", addr)).unwrap();

        let err = client.place_order(&limit_order("x")).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingCredentials));
        assert_eq!(state.request_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_demo_trading_header() {
        let state = Arc::new(TestServerState::default());
        let addr = start_server(state.clone()).await;
        let client = OkxRestClient::builder(format!("http://{}", addr))
            .credentials(credentials())
            .demo_trading(true)
            .build()
            .unwrap();

        client.get_open_orders(&OpenOrdersQuery::new()).await.unwrap();

        let request = state.last_request().await;
        assert_eq!(
            request.headers.get("x-simulated-trading").and_then(|v| v.to_str().ok()),
            Some("1")
        );
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn test_exchange_code_is_preserved() {
        let (client, _state) = signed_client().await;

        let err = client
            .cancel_order(&OrderRef::by_order_id("BTC-USDT", "1"))
            .await
            .unwrap_err();
        match err {
            ApiError::Exchange { code, message } => {
                assert_eq!(code, "51000");
                assert_eq!(message, "Parameter ordId error");
            }
            other => panic!("expected exchange error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partial_batch_returns_each_item() {
        let (client, state) = signed_client().await;

        let acks = client
            .place_orders(&[limit_order("a"), limit_order("b")])
            .await
            .unwrap();
        assert_eq!(acks.len(), 2);
        assert!(acks[0].is_success());
        assert!(!acks[1].is_success());
        assert_eq!(acks[1].s_code, "51008");

        let body: Value = serde_json::from_str(&state.last_request().await.body).unwrap();
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item["tag"] == BROKER_TAG));
    }

    #[tokio::test]
    async fn test_limit_rejected_before_sending() {
        let (client, state) = signed_client().await;

        let err = client
            .get_open_orders(
                &OpenOrdersQuery::new().with_cursor(PaginationCursor::new().with_limit(101)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Wire(WireError::LimitOutOfRange { got: 101, .. })
        ));
        assert_eq!(state.request_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected_before_sending() {
        let (client, state) = signed_client().await;

        let orders: Vec<PlaceOrderRequest> = (0..21).map(|i| limit_order(&i.to_string())).collect();
        let err = client.place_orders(&orders).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Wire(WireError::BatchTooLarge { len: 21, max: 20 })
        ));
        assert_eq!(state.request_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let (client, _state) = signed_client().await;
        let op = okx_trade_sdk::domain::trade::operations::get_order_history(&OrderHistoryQuery::new(
            InstrumentType::Spot,
        ))
        .unwrap();

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = client.invoke_with_cancel(&op, &token).await.unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}

mod grid {
    use super::*;

    #[tokio::test]
    async fn test_stop_grid_sends_array() {
        let (client, state) = signed_client().await;

        let acks = client
            .stop_grid_orders(&[StopGridOrderRequest::new(
                "448965992920907776",
                "BTC-USDT",
                GridAlgoOrderType::SpotGrid,
            )
            .with_stop_type(GridStopType::Spot(GridSpotStopType::SellBase))])
            .await
            .unwrap();
        assert_eq!(acks[0].algo_id, "448965992920907776");

        let body: Value = serde_json::from_str(&state.last_request().await.body).unwrap();
        assert_eq!(
            body,
            json!([{
                "algoId": "448965992920907776",
                "instId": "BTC-USDT",
                "algoOrdType": "grid",
                "stopType": "1"
            }])
        );
    }
}
