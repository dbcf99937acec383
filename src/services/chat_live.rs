use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::config::StoreConfig;
use crate::dto::chat::ChatMessage;
use crate::error::ClientResult;

/// Best-effort live message feed over `/ws/chat/{user_id}`.
///
/// Frames are JSON message objects. The feed never reconnects; when the
/// server closes the socket the stream simply ends.
#[derive(Debug)]
pub struct ChatLiveFeed {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl ChatLiveFeed {
    pub async fn connect(config: &StoreConfig, user_id: i64) -> ClientResult<Self> {
        let url = format!("{}/ws/chat/{user_id}", config.ws_base_url);
        let (ws, _) = connect_async(&url).await?;
        tracing::debug!(%url, "chat live feed connected");
        Ok(Self { ws })
    }

    /// Next streamed message, or `None` once the server closes the channel.
    /// Frames that do not parse as a message object are skipped.
    pub async fn next_message(&mut self) -> Option<ChatMessage> {
        loop {
            let frame = self.ws.next().await?;
            match frame {
                Ok(Message::Text(raw)) => match serde_json::from_str::<ChatMessage>(&raw) {
                    Ok(message) => return Some(message),
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping unparseable chat frame");
                    }
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "chat live feed ended");
                    return None;
                }
            }
        }
    }
}
