use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::dto::chat::{ChatMessage, ChatRequest, ChatResponse, Sender};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

pub const GREETING: &str = "Hi! Ask me anything about our products.";

/// Append `incoming` to the thread, collapsing duplicate user echoes.
///
/// A user message is dropped when the tail of the thread is already a run of
/// user messages with the same text, so a round-trip that echoes the just-sent
/// message never renders it twice. Bot and admin messages always append.
pub fn reconcile(mut thread: Vec<ChatMessage>, incoming: ChatMessage) -> Vec<ChatMessage> {
    if incoming.sender == Sender::User {
        if let Some(text) = incoming.as_text() {
            let trailing_same = thread
                .iter()
                .rev()
                .take_while(|m| m.sender == Sender::User && m.as_text() == Some(text))
                .count();
            if trailing_same >= 1 {
                return thread;
            }
        }
    }
    thread.push(incoming);
    thread
}

#[derive(Debug, Default)]
struct ThreadState {
    customer_id: Option<i64>,
    messages: Vec<ChatMessage>,
    draft: String,
}

/// One chat conversation with the service backend, scoped by customer id.
///
/// At most one send is in flight per instance; further sends are rejected
/// rather than queued, mirroring an input field disabled while waiting.
#[derive(Debug)]
pub struct ChatThread {
    api: ApiClient,
    state: Mutex<ThreadState>,
    sending: AtomicBool,
}

impl ChatThread {
    pub fn new(api: ApiClient, customer_id: Option<i64>) -> Self {
        Self {
            api,
            state: Mutex::new(ThreadState {
                customer_id,
                messages: vec![ChatMessage::text(Sender::Bot, GREETING)],
                draft: String::new(),
            }),
            sending: AtomicBool::new(false),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_state().messages.clone()
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        self.lock_state().draft = draft.into();
    }

    pub fn draft(&self) -> String {
        self.lock_state().draft.clone()
    }

    /// Hard reset on login/logout: one greeting, no pending input.
    pub fn on_customer_changed(&self, customer_id: Option<i64>) {
        let mut state = self.lock_state();
        state.customer_id = customer_id;
        state.messages = vec![ChatMessage::text(Sender::Bot, GREETING)];
        state.draft.clear();
    }

    /// Merge a message arriving over the live channel.
    pub fn apply_incoming(&self, incoming: ChatMessage) {
        let mut state = self.lock_state();
        let thread = std::mem::take(&mut state.messages);
        state.messages = reconcile(thread, incoming);
    }

    /// Send one message. Empty input and concurrent sends are rejected before
    /// any request is made. A failed round trip is rendered in-thread as a
    /// bot-tagged error entry and not retried.
    pub async fn send_message(&self, text: &str) -> ClientResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::InvalidInput("message is empty".into()));
        }
        if self.sending.swap(true, Ordering::SeqCst) {
            return Err(ClientError::SendInFlight);
        }
        let _guard = SendGuard(&self.sending);

        let customer_id = {
            let mut state = self.lock_state();
            state.draft.clear();
            let thread = std::mem::take(&mut state.messages);
            state.messages = reconcile(thread, ChatMessage::text(Sender::User, text));
            state.customer_id
        };

        let result = self
            .api
            .post_json::<ChatResponse, _>(
                "/chat/",
                &ChatRequest {
                    message: text.to_string(),
                    customer_id,
                },
            )
            .await;

        let mut state = self.lock_state();
        match result {
            Ok(reply) => {
                if let Some(response) = reply.response {
                    state.messages.push(ChatMessage::text(Sender::Bot, response));
                }
                if let Some(products) = reply.products {
                    if !products.is_empty() {
                        state
                            .messages
                            .push(ChatMessage::products(Sender::Bot, products));
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat send failed");
                state
                    .messages
                    .push(ChatMessage::text(Sender::Bot, err.user_message()));
            }
        }
        Ok(())
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ThreadState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct SendGuard<'a>(&'a AtomicBool);

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
