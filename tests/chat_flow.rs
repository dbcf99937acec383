use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message as AxumWsMessage, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::Response;
use axum::{Json, Router};
use serde_json::{Value, json};
use uuid::Uuid;

use storefront_client::config::StoreConfig;
use storefront_client::dto::chat::{ChatContent, Sender};
use storefront_client::error::ClientError;
use storefront_client::http::ApiClient;
use storefront_client::services::chat::{ChatThread, GREETING};
use storefront_client::services::chat_live::ChatLiveFeed;
use storefront_client::session::SessionService;
use storefront_client::storage::KvStore;

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Reply,
    SlowReply,
    ReplyWithProducts,
    Fail,
}

struct Backend {
    mode: Mutex<Mode>,
    chat_requests: AtomicUsize,
    last_body: Mutex<Option<Value>>,
}

async fn chat(
    State(backend): State<Arc<Backend>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    backend.chat_requests.fetch_add(1, Ordering::SeqCst);
    *backend.last_body.lock().unwrap() = Some(body.clone());

    let mode = *backend.mode.lock().unwrap();
    match mode {
        Mode::Reply => Ok(Json(json!({
            "response": format!("You said: {}", body["message"].as_str().unwrap()),
        }))),
        Mode::SlowReply => {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            Ok(Json(json!({
                "response": format!("You said: {}", body["message"].as_str().unwrap()),
            })))
        }
        Mode::ReplyWithProducts => Ok(Json(json!({
            "response": "Here are two lamps you might like.",
            "products": [
                {"id": Uuid::new_v4(), "name": "Arc Lamp", "price": 4200, "link": "/products/arc-lamp"},
                {"id": Uuid::new_v4(), "name": "Clip Lamp", "price": 1100, "link": null},
            ],
        }))),
        Mode::Fail => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "assistant is overloaded"})),
        )),
    }
}

async fn ws_chat(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(stream_two_messages)
}

async fn stream_two_messages(mut socket: WebSocket) {
    let frames = [
        json!({"sender": "admin", "kind": "text", "text": "An agent joined the chat.", "sent_at": chrono::Utc::now()}),
        json!({"sender": "bot", "kind": "text", "text": "Back online.", "sent_at": chrono::Utc::now()}),
    ];
    for frame in frames {
        if socket
            .send(AxumWsMessage::Text(frame.to_string().into()))
            .await
            .is_err()
        {
            return;
        }
    }
    let _ = socket.send(AxumWsMessage::Close(None)).await;
}

async fn spawn_backend() -> (SocketAddr, Arc<Backend>) {
    let backend = Arc::new(Backend {
        mode: Mutex::new(Mode::Reply),
        chat_requests: AtomicUsize::new(0),
        last_body: Mutex::new(None),
    });
    let app = Router::new()
        .route("/chat/", axum::routing::post(chat))
        .route("/ws/chat/{user_id}", axum::routing::any(ws_chat))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (addr, backend)
}

fn config_for(addr: SocketAddr, dir: &tempfile::TempDir) -> StoreConfig {
    StoreConfig {
        api_base_url: format!("http://{addr}"),
        ws_base_url: format!("ws://{addr}"),
        storage_path: dir.path().join("state.json"),
        page_size: 12,
        request_timeout_secs: 5,
    }
}

fn make_client(addr: SocketAddr, dir: &tempfile::TempDir) -> ApiClient {
    let config = config_for(addr, dir);
    let store = KvStore::open(&config.storage_path).unwrap();
    let session = Arc::new(SessionService::new(store));
    ApiClient::new(&config, session).unwrap()
}

fn text_of(content: &ChatContent) -> &str {
    match content {
        ChatContent::Text { text } => text,
        ChatContent::Products { .. } => panic!("expected a text entry"),
    }
}

#[tokio::test]
async fn reply_and_product_list_append_in_order() -> anyhow::Result<()> {
    let (addr, backend) = spawn_backend().await;
    let dir = tempfile::tempdir()?;
    *backend.mode.lock().unwrap() = Mode::ReplyWithProducts;

    let thread = ChatThread::new(make_client(addr, &dir), Some(7));
    thread.send_message("any lamps?").await?;

    let messages = thread.messages();
    assert_eq!(messages.len(), 4); // greeting, user, bot text, bot products
    assert_eq!(messages[1].sender, Sender::User);
    assert_eq!(text_of(&messages[1].content), "any lamps?");
    assert_eq!(messages[2].sender, Sender::Bot);
    assert_eq!(text_of(&messages[2].content), "Here are two lamps you might like.");
    match &messages[3].content {
        ChatContent::Products { products } => {
            assert_eq!(products.len(), 2);
            assert_eq!(products[0].name, "Arc Lamp");
        }
        other => panic!("expected product list, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn backend_failure_renders_one_bot_error_entry() -> anyhow::Result<()> {
    let (addr, backend) = spawn_backend().await;
    let dir = tempfile::tempdir()?;
    *backend.mode.lock().unwrap() = Mode::Fail;

    let thread = ChatThread::new(make_client(addr, &dir), Some(7));
    thread.send_message("hello?").await?;

    let messages = thread.messages();
    assert_eq!(messages.len(), 3); // greeting, user, bot error
    assert_eq!(messages[2].sender, Sender::Bot);
    assert!(text_of(&messages[2].content).contains("assistant is overloaded"));
    assert_eq!(backend.chat_requests.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn blank_input_never_sends() -> anyhow::Result<()> {
    let (addr, backend) = spawn_backend().await;
    let dir = tempfile::tempdir()?;

    let thread = ChatThread::new(make_client(addr, &dir), Some(7));
    for input in ["", "   ", "\n\t"] {
        match thread.send_message(input).await {
            Err(ClientError::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
    assert_eq!(backend.chat_requests.load(Ordering::SeqCst), 0);
    assert_eq!(thread.messages().len(), 1);
    Ok(())
}

#[tokio::test]
async fn second_send_while_first_is_in_flight_is_rejected() -> anyhow::Result<()> {
    let (addr, backend) = spawn_backend().await;
    let dir = tempfile::tempdir()?;
    *backend.mode.lock().unwrap() = Mode::SlowReply;

    let thread = Arc::new(ChatThread::new(make_client(addr, &dir), Some(7)));
    let first = {
        let thread = thread.clone();
        tokio::spawn(async move { thread.send_message("hello").await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    match thread.send_message("hello").await {
        Err(ClientError::SendInFlight) => {}
        other => panic!("expected SendInFlight, got {other:?}"),
    }
    first.await.unwrap()?;

    // One request, one user bubble: greeting, user, bot reply.
    assert_eq!(backend.chat_requests.load(Ordering::SeqCst), 1);
    let messages = thread.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].sender, Sender::User);
    assert_eq!(text_of(&messages[1].content), "hello");
    assert_eq!(messages[2].sender, Sender::Bot);
    Ok(())
}

#[tokio::test]
async fn anonymous_send_omits_customer_id() -> anyhow::Result<()> {
    let (addr, backend) = spawn_backend().await;
    let dir = tempfile::tempdir()?;

    let anonymous = ChatThread::new(make_client(addr, &dir), None);
    anonymous.send_message("hi").await?;
    let body = backend.last_body.lock().unwrap().clone().unwrap();
    assert!(body.get("customer_id").is_none());

    let signed_in = ChatThread::new(make_client(addr, &dir), Some(7));
    signed_in.send_message("hi").await?;
    let body = backend.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["customer_id"], 7);
    Ok(())
}

#[tokio::test]
async fn customer_change_resets_to_single_greeting() -> anyhow::Result<()> {
    let (addr, _backend) = spawn_backend().await;
    let dir = tempfile::tempdir()?;

    let thread = ChatThread::new(make_client(addr, &dir), Some(7));
    thread.send_message("first question").await?;
    thread.set_draft("half-typed follow-up");
    assert!(thread.messages().len() > 1);

    thread.on_customer_changed(Some(8));
    let messages = thread.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(text_of(&messages[0].content), GREETING);
    assert_eq!(thread.draft(), "");
    Ok(())
}

#[tokio::test]
async fn live_feed_streams_messages_then_ends() -> anyhow::Result<()> {
    let (addr, _backend) = spawn_backend().await;
    let dir = tempfile::tempdir()?;
    let config = config_for(addr, &dir);

    let mut feed = ChatLiveFeed::connect(&config, 7).await?;
    let first = feed.next_message().await.unwrap();
    assert_eq!(first.sender, Sender::Admin);
    assert_eq!(text_of(&first.content), "An agent joined the chat.");

    let second = feed.next_message().await.unwrap();
    assert_eq!(text_of(&second.content), "Back online.");

    assert!(feed.next_message().await.is_none());
    Ok(())
}

#[tokio::test]
async fn live_messages_merge_through_reconcile() -> anyhow::Result<()> {
    let (addr, _backend) = spawn_backend().await;
    let dir = tempfile::tempdir()?;

    let thread = ChatThread::new(make_client(addr, &dir), Some(7));
    thread.send_message("is this in stock?").await?;
    let before = thread.messages().len();

    // The bot reply ended the trailing run, so a server echo of the user
    // message appends once; a second identical echo is suppressed.
    let echo = storefront_client::dto::chat::ChatMessage::text(Sender::User, "is this in stock?");
    thread.apply_incoming(echo.clone());
    assert_eq!(thread.messages().len(), before + 1);

    thread.apply_incoming(echo);
    assert_eq!(thread.messages().len(), before + 1);
    Ok(())
}
