//! Integration tests for the OKX WebSocket session against a mock Axum server.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use okx_trade_sdk::domain::trade::operations::ws_place_order;
use okx_trade_sdk::prelude::*;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Mock server
// =============================================================================

#[derive(Default)]
struct TestServerState {
    connection_count: AtomicUsize,
    login_count: AtomicUsize,
    login_delay_ms: AtomicU64,
    subscriptions: Mutex<Vec<Value>>,
    unsubscriptions: Mutex<Vec<Value>>,
    orders_received: Mutex<Vec<String>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    kill: Notify,
}

impl TestServerState {
    async fn push(&self, frame: Value) {
        if let Some(tx) = self.outbound.lock().await.as_ref() {
            let _ = tx.send(Message::Text(frame.to_string()));
        }
    }
}

async fn handle_ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<TestServerState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<TestServerState>) {
    state.connection_count.fetch_add(1, Ordering::SeqCst);

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    *state.outbound.lock().await = Some(tx.clone());

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    loop {
        let message = tokio::select! {
            message = stream.next() => message,
            () = state.kill.notified() => {
                let _ = tx.send(Message::Close(None));
                break;
            }
        };
        let Some(Ok(message)) = message else { break };
        let Message::Text(text) = message else { continue };

        if text == "ping" {
            let _ = tx.send(Message::Text("pong".to_string()));
            continue;
        }
        let Ok(request) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        handle_request(&state, &tx, request).await;
    }

    // Let the close frame flush before the writer goes away.
    tokio::time::sleep(Duration::from_millis(20)).await;
    writer.abort();
}

async fn handle_request(state: &Arc<TestServerState>, tx: &mpsc::UnboundedSender<Message>, request: Value) {
    let id = request["id"].clone();
    let op = request["op"].as_str().unwrap_or_default().to_string();
    let arg = request["args"][0].clone();

    match op.as_str() {
        "login" => {
            state.login_count.fetch_add(1, Ordering::SeqCst);
            let reply = json!({"event": "login", "code": "0", "msg": "", "connId": "a4d3ae55"});
            let delay = state.login_delay_ms.load(Ordering::SeqCst);
            if delay == 0 {
                send(tx, reply);
            } else {
                let tx = tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    send(&tx, reply);
                });
            }
        }
        "subscribe" => {
            state.subscriptions.lock().await.push(arg.clone());
            if arg["channel"] == "bad-channel" {
                send(
                    tx,
                    json!({
                        "id": id,
                        "event": "error",
                        "code": "60018",
                        "msg": "Wrong URL or channel:bad-channel doesn't exist.",
                        "connId": "a4d3ae55"
                    }),
                );
            } else {
                send(tx, json!({"id": id, "event": "subscribe", "arg": arg, "connId": "a4d3ae55"}));
            }
        }
        "unsubscribe" => {
            state.unsubscriptions.lock().await.push(arg.clone());
            send(tx, json!({"id": id, "event": "unsubscribe", "arg": arg, "connId": "a4d3ae55"}));
        }
        "order" => {
            let cl_ord_id = arg["clOrdId"].as_str().unwrap_or_default().to_string();
            state.orders_received.lock().await.push(cl_ord_id.clone());
            let reply = json!({
                "id": id,
                "op": "order",
                "code": "0",
                "msg": "",
                "data": [{
                    "ordId": format!("ord-{}", cl_ord_id),
                    "clOrdId": cl_ord_id,
                    "tag": arg["tag"],
                    "ts": "1695190491421",
                    "sCode": "0",
                    "sMsg": ""
                }],
                "inTime": "1695190491421339",
                "outTime": "1695190491423240"
            });
            let delay = match cl_ord_id.as_str() {
                "hold" => return,
                "slow" => Some(Duration::from_millis(400)),
                "first" => Some(Duration::from_millis(200)),
                _ => None,
            };
            match delay {
                Some(delay) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        send(&tx, reply);
                    });
                }
                None => send(tx, reply),
            }
        }
        _ => {}
    }
}

fn send(tx: &mpsc::UnboundedSender<Message>, frame: Value) {
    let _ = tx.send(Message::Text(frame.to_string()));
}

async fn start_ws_server(state: Arc<TestServerState>) -> SocketAddr {
    let router = Router::new()
        .route("/ws/v5/private", get(handle_ws_upgrade))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind websocket listener");
    let addr = listener.local_addr().expect("missing local addr");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("websocket server failed");
    });

    addr
}

fn test_config() -> WebSocketConfig {
    WebSocketConfig {
        credentials: Some(Credentials::new("test-key", "test-secret", "test-passphrase")),
        request_timeout_ms: 2_000,
        base_delay_ms: 50,
        max_delay_ms: 200,
        ..Default::default()
    }
}

async fn connect(config: WebSocketConfig) -> (OkxWebSocketSession, Arc<TestServerState>) {
    let state = Arc::new(TestServerState::default());
    let addr = start_ws_server(state.clone()).await;
    let url = format!("ws://{}/ws/v5/private", addr);
    let session = OkxWebSocketSession::connect_with_config(&url, config)
        .await
        .expect("failed to connect");
    (session, state)
}

async fn wait_until<F, Fut>(mut condition: F, timeout: Duration)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {:?}",
            timeout
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn order(cl_ord_id: &str) -> PlaceOrderRequest {
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

fn orders_arg() -> ChannelArg {
    ChannelArg::new("orders").with_inst_type("ANY")
}

fn orders_push(ord_id: &str) -> Value {
    json!({
        "arg": {"channel": "orders", "instType": "ANY", "uid": "77982378738415879"},
        "data": [{
            "instType": "SPOT",
            "instId": "BTC-USDT",
            "ordId": ord_id,
            "clOrdId": "",
            "px": "60000",
            "sz": "0.01",
            "ordType": "limit",
            "side": "buy",
            "tdMode": "cash",
            "state": "live",
            "accFillSz": "0",
            "cTime": "1695190491421",
            "uTime": "1695190491421"
        }]
    })
}

// =============================================================================
// Queries
// =============================================================================

mod queries {
    use super::*;

    #[tokio::test]
    async fn test_login_on_connect() {
        let (session, state) = connect(test_config()).await;
        assert_eq!(session.connection_state(), ConnectionState::Connected);
        assert!(session.is_authenticated());
        assert_eq!(state.login_count.load(Ordering::SeqCst), 1);
        assert_ok!(session.disconnect().await);
    }

    #[tokio::test]
    async fn test_replies_correlate_by_id() {
        let (session, _state) = connect(test_config()).await;

        let first_order = order("first");
        let second_order = order("second");
        let (first, second) = tokio::join!(
            session.place_order(&first_order),
            session.place_order(&second_order),
        );

        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(first.cl_ord_id, "first");
        assert_eq!(first.ord_id, "ord-first");
        assert_eq!(first.tag, BROKER_TAG);
        assert_eq!(second.cl_ord_id, "second");
        assert_eq!(session.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_timeout_and_late_reply_dropped() {
        let config = WebSocketConfig {
            request_timeout_ms: 150,
            ..test_config()
        };
        let (session, _state) = connect(config).await;

        let err = session.place_order(&order("slow")).await.unwrap_err();
        assert!(matches!(err, WebSocketError::Timeout));
        assert_eq!(session.pending_requests(), 0);

        // The late reply arrives and must not disturb the next call.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let ack = session.place_order(&order("after")).await.unwrap();
        assert_eq!(ack.cl_ord_id, "after");
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_cancel_releases_pending_call() {
        let (session, state) = connect(test_config()).await;
        let op = ws_place_order(&order("hold")).unwrap();
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                wait_until(
                    || async { !state.orders_received.lock().await.is_empty() },
                    Duration::from_secs(2),
                )
                .await;
                token.cancel();
            })
        };

        let started = tokio::time::Instant::now();
        let err = assert_err!(session.query_with_cancel(&op, &token).await);
        assert!(matches!(err, WebSocketError::Cancelled));
        // Returns on cancel, well before the 2s request timeout
        assert!(started.elapsed() < Duration::from_millis(1_500));
        assert_eq!(session.pending_requests(), 0);
        canceller.await.unwrap();

        // An already-cancelled token sends nothing.
        let err = assert_err!(session.query_with_cancel(&op, &token).await);
        assert!(matches!(err, WebSocketError::Cancelled));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(state.orders_received.lock().await.len(), 1);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_signed_query_requires_login() {
        let config = WebSocketConfig {
            credentials: None,
            ..test_config()
        };
        let (session, state) = connect(config).await;

        let err = assert_err!(session.place_order(&order("x")).await);
        assert!(matches!(err, WebSocketError::AuthRequired));
        assert!(state.orders_received.lock().await.is_empty());
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

mod subscriptions {
    use super::*;

    #[tokio::test]
    async fn test_fan_out_in_arrival_order() {
        let (session, state) = connect(test_config()).await;

        let (tx_a, mut rx_a) = mpsc::unbounded_channel::<String>();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel::<String>();

        let _a = session
            .subscribe(orders_arg(), move |frame| {
                let _ = tx_a.send(frame.data[0]["ordId"].as_str().unwrap_or_default().to_string());
            })
            .await
            .unwrap();
        let _b = session
            .subscribe(orders_arg(), move |frame| {
                let _ = tx_b.send(frame.data[0]["ordId"].as_str().unwrap_or_default().to_string());
            })
            .await
            .unwrap();

        // Only the first handler subscribes on the exchange.
        assert_eq!(state.subscriptions.lock().await.len(), 1);
        assert_eq!(session.subscription_count(), 1);

        for ord_id in ["1", "2", "3"] {
            state.push(orders_push(ord_id)).await;
        }

        for rx in [&mut rx_a, &mut rx_b] {
            let mut seen = Vec::new();
            for _ in 0..3 {
                let next = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                    .await
                    .expect("push not delivered")
                    .unwrap();
                seen.push(next);
            }
            assert_eq!(seen, ["1", "2", "3"]);
        }
    }

    #[tokio::test]
    async fn test_typed_order_subscription() {
        let (session, state) = connect(test_config()).await;
        let (tx, mut rx) = mpsc::unbounded_channel::<Order>();

        let _handle = session
            .subscribe_orders(InstrumentType::Any, None, None, move |order| {
                let _ = tx.send(order);
            })
            .await
            .unwrap();

        state.push(orders_push("42")).await;
        let order = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("order not delivered")
            .unwrap();
        assert_eq!(order.ord_id, "42");
        assert_eq!(order.state, Wire::Known(OrderState::Live));
    }

    #[tokio::test]
    async fn test_unsubscribe_last_handler_sends_envelope() {
        let (session, state) = connect(test_config()).await;

        let first = session.subscribe(orders_arg(), |_| {}).await.unwrap();
        let second = session.subscribe(orders_arg(), |_| {}).await.unwrap();

        session.unsubscribe(&first).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(state.unsubscriptions.lock().await.is_empty());
        assert_eq!(session.subscription_count(), 1);

        session.unsubscribe(&second).await.unwrap();
        wait_until(
            || async { state.unsubscriptions.lock().await.len() == 1 },
            Duration::from_secs(2),
        )
        .await;
        assert_eq!(
            state.unsubscriptions.lock().await[0],
            json!({"channel": "orders", "instType": "ANY"})
        );
        assert_eq!(session.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_subscribes_share_one_ack() {
        let (session, state) = connect(test_config()).await;

        let (first, second) = tokio::join!(
            session.subscribe(orders_arg(), |_| {}),
            session.subscribe(orders_arg(), |_| {}),
        );
        assert_ok!(first);
        assert_ok!(second);
        assert_eq!(state.subscriptions.lock().await.len(), 1);
        assert_eq!(session.subscription_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_subscribes_share_rejection() {
        let (session, state) = connect(test_config()).await;

        let (first, second) = tokio::join!(
            session.subscribe(ChannelArg::new("bad-channel"), |_| {}),
            session.subscribe(ChannelArg::new("bad-channel"), |_| {}),
        );
        for result in [first, second] {
            match result {
                Err(WebSocketError::SubscriptionFailed(message)) => {
                    assert!(message.contains("60018"))
                }
                other => panic!("expected subscription failure, got {:?}", other),
            }
        }
        // One exchange subscribe, and nothing left behind locally.
        assert_eq!(state.subscriptions.lock().await.len(), 1);
        assert_eq!(session.subscription_count(), 0);

        // The key is free again for a fresh attempt.
        let err = assert_err!(session.subscribe(ChannelArg::new("bad-channel"), |_| {}).await);
        assert!(matches!(err, WebSocketError::SubscriptionFailed(_)));
        assert_eq!(state.subscriptions.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_subscription() {
        let (session, _state) = connect(test_config()).await;

        let err = session
            .subscribe(ChannelArg::new("bad-channel"), |_| {})
            .await
            .unwrap_err();
        match err {
            WebSocketError::SubscriptionFailed(message) => assert!(message.contains("60018")),
            other => panic!("expected subscription failure, got {:?}", other),
        }
        assert_eq!(session.subscription_count(), 0);
    }
}

// =============================================================================
// Reconnection
// =============================================================================

mod reconnection {
    use super::*;

    #[tokio::test]
    async fn test_reconnect_resubscribes_and_fails_pending() {
        let (session, state) = connect(test_config()).await;
        let session = Arc::new(session);

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let _handle = session
            .subscribe(orders_arg(), move |frame| {
                let _ = tx.send(frame.data[0]["ordId"].as_str().unwrap_or_default().to_string());
            })
            .await
            .unwrap();

        let in_flight = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.place_order(&order("hold")).await })
        };
        wait_until(
            || async { !state.orders_received.lock().await.is_empty() },
            Duration::from_secs(2),
        )
        .await;

        state.kill.notify_one();

        let err = in_flight.await.unwrap().unwrap_err();
        assert!(matches!(err, WebSocketError::ConnectionLost));

        wait_until(
            || async { state.subscriptions.lock().await.len() == 2 },
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(state.connection_count.load(Ordering::SeqCst), 2);
        assert_eq!(state.login_count.load(Ordering::SeqCst), 2);
        {
            let subscriptions = state.subscriptions.lock().await;
            assert_eq!(subscriptions[0], subscriptions[1]);
        }
        assert!(session.is_connected());
        assert!(session.is_authenticated());

        // Pushes on the new connection reach the original handler.
        state.push(orders_push("7")).await;
        let ord_id = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("push not delivered after reconnect")
            .unwrap();
        assert_eq!(ord_id, "7");
    }

    #[tokio::test]
    async fn test_no_reconnect_when_disabled() {
        let config = WebSocketConfig {
            auto_reconnect: false,
            ..test_config()
        };
        let (session, state) = connect(config).await;
        let _handle = session.subscribe(orders_arg(), |_| {}).await.unwrap();
        assert_eq!(session.subscription_count(), 1);

        state.kill.notify_one();
        wait_until(
            || async { session.subscription_count() == 0 },
            Duration::from_secs(2),
        )
        .await;
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);

        let err = session.place_order(&order("x")).await.unwrap_err();
        assert!(matches!(
            err,
            WebSocketError::NotConnected | WebSocketError::AuthRequired
        ));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(state.connection_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reconnect_passes_through_connecting() {
        let (session, state) = connect(test_config()).await;

        // Hold the next login reply so the handshake stays observable.
        state.login_delay_ms.store(300, Ordering::SeqCst);
        state.kill.notify_one();

        wait_until(
            || async { session.connection_state() == ConnectionState::Connecting },
            Duration::from_secs(2),
        )
        .await;
        assert!(!session.is_connected());

        wait_until(|| async { session.is_connected() }, Duration::from_secs(2)).await;
        assert_eq!(state.login_count.load(Ordering::SeqCst), 2);
    }
}
