use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
    Admin,
}

/// A product the bot references in a reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatContent {
    Text { text: String },
    Products { products: Vec<ProductRef> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    #[serde(flatten)]
    pub content: ChatContent,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn text(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            content: ChatContent::Text { text: text.into() },
            sent_at: Utc::now(),
        }
    }

    pub fn products(sender: Sender, products: Vec<ProductRef>) -> Self {
        Self {
            sender,
            content: ChatContent::Products { products },
            sent_at: Utc::now(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            ChatContent::Text { text } => Some(text),
            ChatContent::Products { .. } => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
    /// Absent for anonymous visitors; the backend scopes the thread to the
    /// connection instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub response: Option<String>,
    pub products: Option<Vec<ProductRef>>,
}
