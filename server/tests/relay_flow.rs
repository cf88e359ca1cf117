//! End-to-end tests: real server on an ephemeral port, HTTP via reqwest,
//! WebSocket via tokio-tungstenite, backend responses published on the bus.

use std::time::Duration;

use chat_relay_lib::modules::chat::{ChatResponseRecord, SessionId};
use chat_relay_lib::modules::config::AppConfig;
use chat_relay_lib::{start, ServerHandle};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn boot(loopback: bool) -> ServerHandle {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.bus.loopback_responder = loopback;
    start(config).await.unwrap()
}

fn http(handle: &ServerHandle, path: &str) -> String {
    format!("http://127.0.0.1:{}{}", handle.port, path)
}

async fn create_session(handle: &ServerHandle) -> String {
    let body: Value = reqwest::Client::new()
        .post(http(handle, "/api/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["session_id"].as_str().unwrap().to_string()
}

async fn connect(handle: &ServerHandle, session_id: &str) -> Ws {
    let url = format!("ws://127.0.0.1:{}/ws/{}", handle.port, session_id);
    let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    ws
}

async fn next_frame(ws: &mut Ws) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_message(ws: &mut Ws, text: &str) {
    let payload = serde_json::json!({ "message": text }).to_string();
    ws.send(Message::Text(payload.into())).await.unwrap();
}

async fn publish(handle: &ServerHandle, record: ChatResponseRecord) {
    let payload = serde_json::to_vec(&record).unwrap();
    handle
        .bus()
        .publish("chat-responses", Some(record.session_id.as_str()), payload)
        .await
        .unwrap();
}

async fn messages(handle: &ServerHandle, session_id: &str) -> Vec<Value> {
    let body: Value = reqwest::get(http(handle, &format!("/api/sessions/{}/messages", session_id)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["messages"].as_array().unwrap().clone()
}

async fn wait_for_messages(handle: &ServerHandle, session_id: &str, count: usize) -> Vec<Value> {
    for _ in 0..100 {
        let current = messages(handle, session_id).await;
        if current.len() >= count {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session {} never reached {} messages", session_id, count);
}

#[tokio::test]
async fn streaming_response_is_relayed_and_committed() {
    let handle = boot(false).await;
    let mut requests = handle.bus().subscribe("chat-requests").await.unwrap();
    let session_id = create_session(&handle).await;
    let id = SessionId::parse(&session_id).unwrap();

    let mut ws = connect(&handle, &session_id).await;
    send_message(&mut ws, "Hi").await;

    let ack = next_frame(&mut ws).await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["message"], "Message received");

    let request: Value = serde_json::from_slice(&requests.recv().await.unwrap().payload).unwrap();
    assert_eq!(request["session_id"], session_id);
    assert_eq!(request["message"], "Hi");

    publish(&handle, ChatResponseRecord::chunk(id, "Hello")).await;
    publish(&handle, ChatResponseRecord::chunk(id, " world")).await;
    publish(&handle, ChatResponseRecord::done(id)).await;

    let first = next_frame(&mut ws).await;
    assert_eq!(first, serde_json::json!({"type": "assistant_chunk", "chunk": "Hello"}));
    let second = next_frame(&mut ws).await;
    assert_eq!(second, serde_json::json!({"type": "assistant_chunk", "chunk": " world"}));
    let done = next_frame(&mut ws).await;
    assert_eq!(done, serde_json::json!({"type": "assistant_done"}));

    let history = wait_for_messages(&handle, &session_id, 2).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["content"], "Hi");
    assert_eq!(history[1]["role"], "assistant");
    assert_eq!(history[1]["content"], "Hello world");

    handle.shutdown().await;
}

#[tokio::test]
async fn direct_response_is_delivered_whole() {
    let handle = boot(false).await;
    let session_id = create_session(&handle).await;
    let id = SessionId::parse(&session_id).unwrap();

    let mut ws = connect(&handle, &session_id).await;
    send_message(&mut ws, "Hello").await;
    assert_eq!(next_frame(&mut ws).await["type"], "ack");

    publish(&handle, ChatResponseRecord::direct(id, "Hi")).await;

    let frame = next_frame(&mut ws).await;
    assert_eq!(frame, serde_json::json!({"type": "assistant", "message": "Hi"}));

    let history = wait_for_messages(&handle, &session_id, 2).await;
    assert_eq!(history[1]["content"], "Hi");

    handle.shutdown().await;
}

#[tokio::test]
async fn response_after_disconnect_is_still_committed() {
    let handle = boot(false).await;
    let session_id = create_session(&handle).await;
    let id = SessionId::parse(&session_id).unwrap();

    let mut ws = connect(&handle, &session_id).await;
    send_message(&mut ws, "Hello").await;
    assert_eq!(next_frame(&mut ws).await["type"], "ack");
    ws.close(None).await.unwrap();
    drop(ws);

    // 等待连接注销
    for _ in 0..100 {
        if handle.state().connection_registry.lookup(id).is_none() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(handle.state().connection_registry.lookup(id).is_none());

    publish(&handle, ChatResponseRecord::chunk(id, "too ")).await;
    publish(&handle, ChatResponseRecord::chunk(id, "late")).await;
    publish(&handle, ChatResponseRecord::done(id)).await;

    let history = wait_for_messages(&handle, &session_id, 2).await;
    assert_eq!(history[1]["content"], "too late");

    handle.shutdown().await;
}

#[tokio::test]
async fn interleaved_sessions_stay_separate() {
    let handle = boot(false).await;
    let a = create_session(&handle).await;
    let b = create_session(&handle).await;
    let id_a = SessionId::parse(&a).unwrap();
    let id_b = SessionId::parse(&b).unwrap();

    let mut ws_a = connect(&handle, &a).await;
    let mut ws_b = connect(&handle, &b).await;
    send_message(&mut ws_a, "to a").await;
    send_message(&mut ws_b, "to b").await;
    assert_eq!(next_frame(&mut ws_a).await["type"], "ack");
    assert_eq!(next_frame(&mut ws_b).await["type"], "ack");

    publish(&handle, ChatResponseRecord::chunk(id_a, "A1")).await;
    publish(&handle, ChatResponseRecord::chunk(id_b, "B1")).await;
    publish(&handle, ChatResponseRecord::chunk(id_a, "A2")).await;
    publish(&handle, ChatResponseRecord::done(id_b)).await;
    publish(&handle, ChatResponseRecord::done(id_a)).await;

    assert_eq!(next_frame(&mut ws_a).await["chunk"], "A1");
    assert_eq!(next_frame(&mut ws_a).await["chunk"], "A2");
    assert_eq!(next_frame(&mut ws_a).await["type"], "assistant_done");
    assert_eq!(next_frame(&mut ws_b).await["chunk"], "B1");
    assert_eq!(next_frame(&mut ws_b).await["type"], "assistant_done");

    assert_eq!(wait_for_messages(&handle, &a, 2).await[1]["content"], "A1A2");
    assert_eq!(wait_for_messages(&handle, &b, 2).await[1]["content"], "B1");

    handle.shutdown().await;
}

#[tokio::test]
async fn loopback_responder_echoes_in_chunks() {
    let handle = boot(true).await;
    let session_id = create_session(&handle).await;

    let mut ws = connect(&handle, &session_id).await;
    send_message(&mut ws, "ping").await;

    let mut streamed = String::new();
    loop {
        let frame = next_frame(&mut ws).await;
        match frame["type"].as_str().unwrap() {
            "ack" => continue,
            "assistant_chunk" => streamed.push_str(frame["chunk"].as_str().unwrap()),
            "assistant_done" => break,
            other => panic!("unexpected frame {}", other),
        }
    }
    assert_eq!(streamed, "Echo: ping");

    let history = wait_for_messages(&handle, &session_id, 2).await;
    assert_eq!(history[1]["content"], "Echo: ping");

    handle.shutdown().await;
}

#[tokio::test]
async fn unknown_sessions_are_not_found() {
    let handle = boot(false).await;
    let client = reqwest::Client::new();
    let unknown = SessionId::new().to_string();

    let resp = client
        .get(http(&handle, &format!("/api/sessions/{}", unknown)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(http(&handle, "/api/sessions/not-a-uuid/messages"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(http(&handle, &format!("/api/sessions/{}", unknown)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let mut ws = connect(&handle, &unknown).await;
    let frame = next_frame(&mut ws).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["code"], "not_found");

    handle.shutdown().await;
}

#[tokio::test]
async fn session_lifecycle_over_http() {
    let handle = boot(false).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&handle).await;

    let list: Value = client
        .get(http(&handle, "/api/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["session_id"], session_id);
    assert_eq!(list[0]["message_count"], 0);

    let health: Value = client
        .get(http(&handle, "/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["sessions"], 1);

    let resp = client
        .delete(http(&handle, &format!("/api/sessions/{}", session_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], format!("Session {} cleared", session_id));

    let resp = client
        .get(http(&handle, &format!("/api/sessions/{}", session_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    handle.shutdown().await;
}
